//! Contrast-limited adaptive histogram equalization on one 8-bit plane.
//!
//! The plane is split into a grid of tiles. Each tile gets its own
//! equalization curve built from a clipped histogram: any bin above the
//! clip limit is cut down and the excess is spread evenly over all bins, so
//! flat regions (sky, walls) cannot have their noise stretched. Pixels are
//! then mapped by bilinear interpolation between the curves of the four
//! nearest tile centers, which hides tile seams.
//!
//! When a side is not a multiple of the grid, the plane is extended past its
//! right and bottom edges with mirrored pixels (reflect-101) so that every
//! tile covers the same area.

use super::filters::reflect_101;
use super::params::ClaheParams;
use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Tile geometry for a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileGrid {
    tiles_x: u32,
    tiles_y: u32,
    tile_w: u32,
    tile_h: u32,
}

impl TileGrid {
    /// Fit the requested grid to the plane. Tiles are equal-sized; the grid
    /// may cover a few mirrored pixels past the right and bottom edges.
    fn fit(width: u32, height: u32, grid: (u32, u32)) -> Self {
        let tiles_x = grid.0.max(1);
        let tiles_y = grid.1.max(1);
        Self {
            tiles_x,
            tiles_y,
            tile_w: width.div_ceil(tiles_x),
            tile_h: height.div_ceil(tiles_y),
        }
    }

    fn area(&self) -> u32 {
        self.tile_w * self.tile_h
    }
}

/// Build the clipped-equalization curve for one tile histogram.
fn tile_lut(hist: &mut [u32; BINS], area: u32, clip_limit: f32) -> [u8; BINS] {
    let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);

    let mut clipped = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }

    let batch = clipped / BINS as u32;
    let residual = clipped as usize - batch as usize * BINS;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0u32;
    for (out, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count;
        *out = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Equalize `plane` with the given grid and clip limit.
///
/// An empty plane is returned as-is.
pub fn equalize(plane: &GrayImage, params: &ClaheParams) -> GrayImage {
    let (width, height) = plane.dimensions();
    if width == 0 || height == 0 {
        return plane.clone();
    }
    let grid = TileGrid::fit(width, height, params.grid);

    let src_x: Vec<u32> = (0..grid.tiles_x * grid.tile_w)
        .map(|x| reflect_101(x as i64, width as i64) as u32)
        .collect();
    let src_y: Vec<u32> = (0..grid.tiles_y * grid.tile_h)
        .map(|y| reflect_101(y as i64, height as i64) as u32)
        .collect();

    let mut luts = Vec::with_capacity((grid.tiles_x * grid.tiles_y) as usize);
    for ty in 0..grid.tiles_y {
        for tx in 0..grid.tiles_x {
            let rows = &src_y[(ty * grid.tile_h) as usize..((ty + 1) * grid.tile_h) as usize];
            let cols = &src_x[(tx * grid.tile_w) as usize..((tx + 1) * grid.tile_w) as usize];

            let mut hist = [0u32; BINS];
            for &y in rows {
                for &x in cols {
                    hist[plane.get_pixel(x, y).0[0] as usize] += 1;
                }
            }
            luts.push(tile_lut(&mut hist, grid.area(), params.clip_limit));
        }
    }
    let lut_at = |tx: usize, ty: usize| &luts[ty * grid.tiles_x as usize + tx];

    // Neighbor tiles and blend weight along one axis, per coordinate.
    let axis = |pos: u32, tile: u32, tiles: u32| -> (usize, usize, f32) {
        let t = (pos as f32 + 0.5) / tile as f32 - 0.5;
        let lo = t.floor();
        let frac = t - lo;
        let lo = lo as i64;
        let last = tiles as i64 - 1;
        (
            lo.clamp(0, last) as usize,
            (lo + 1).clamp(0, last) as usize,
            frac,
        )
    };
    let cols: Vec<_> = (0..width)
        .map(|x| axis(x, grid.tile_w, grid.tiles_x))
        .collect();

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let (ty1, ty2, ya) = axis(y, grid.tile_h, grid.tiles_y);
        for x in 0..width {
            let (tx1, tx2, xa) = cols[x as usize];
            let v = plane.get_pixel(x, y).0[0] as usize;

            let top = lut_at(tx1, ty1)[v] as f32 * (1.0 - xa) + lut_at(tx2, ty1)[v] as f32 * xa;
            let bottom =
                lut_at(tx1, ty2)[v] as f32 * (1.0 - xa) + lut_at(tx2, ty2)[v] as f32 * xa;
            let mapped = top * (1.0 - ya) + bottom * ya;
            out.put_pixel(x, y, Luma([mapped.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}
