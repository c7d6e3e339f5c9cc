//! sRGB ⇄ CIE L*a*b* conversion, 8-bit encoded.
//!
//! Only adaptive contrast needs a luminance/chroma split, so the whole
//! module is exposed through one function, [`remap_lightness`]. The rest of
//! the pipeline only ever sees RGB8.
//!
//! 8-bit encoding: `L8 = L * 255/100`, `a8 = a + 128`, `b8 = b + 128`, each
//! rounded and clamped to 0..=255. White point is D65.

use image::{GrayImage, RgbImage};
use std::sync::LazyLock;

const D65_X: f32 = 0.95047;
const D65_Z: f32 = 1.08883;

const SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.412_456_4, 0.357_576_1, 0.180_437_5],
    [0.212_672_9, 0.715_152_2, 0.072_175],
    [0.019_333_9, 0.119_192, 0.950_304_1],
];

const XYZ_TO_SRGB: [[f32; 3]; 3] = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266, 1.876_010_8, 0.041_556],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

/// CIE constants: (6/29)^3 and (29/3)^3.
const EPSILON: f32 = 0.008_856;
const KAPPA: f32 = 903.3;

static SRGB_TO_LINEAR: LazyLock<[f32; 256]> = LazyLock::new(|| {
    let mut lut = [0.0f32; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        let c = i as f32 / 255.0;
        *v = if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    lut
});

fn linear_to_srgb8(l: f32) -> u8 {
    let l = l.clamp(0.0, 1.0);
    let c = if l <= 0.003_130_8 {
        12.92 * l
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    };
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let t = f * f * f;
    if t > EPSILON {
        t
    } else {
        (116.0 * f - 16.0) / KAPPA
    }
}

fn mat_mul(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn to_lab8(rgb: [u8; 3]) -> [u8; 3] {
    let lin = &*SRGB_TO_LINEAR;
    let [x, y, z] = mat_mul(
        &SRGB_TO_XYZ,
        [
            lin[rgb[0] as usize],
            lin[rgb[1] as usize],
            lin[rgb[2] as usize],
        ],
    );
    let fx = lab_f(x / D65_X);
    let fy = lab_f(y);
    let fz = lab_f(z / D65_Z);

    let l = if y > EPSILON { 116.0 * fy - 16.0 } else { KAPPA * y };
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    [
        (l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8,
        (a + 128.0).round().clamp(0.0, 255.0) as u8,
        (b + 128.0).round().clamp(0.0, 255.0) as u8,
    ]
}

fn from_lab8(lab: [u8; 3]) -> [u8; 3] {
    let l = lab[0] as f32 * 100.0 / 255.0;
    let a = lab[1] as f32 - 128.0;
    let b = lab[2] as f32 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let y = if l > KAPPA * EPSILON {
        fy * fy * fy
    } else {
        l / KAPPA
    };
    let xyz = [lab_f_inv(fx) * D65_X, y, lab_f_inv(fz) * D65_Z];
    let [r, g, b] = mat_mul(&XYZ_TO_SRGB, xyz);
    [linear_to_srgb8(r), linear_to_srgb8(g), linear_to_srgb8(b)]
}

/// Split into Lab, hand the lightness plane to `f`, recombine with the
/// untouched chroma and convert back to RGB.
///
/// `f` must return a plane of the same dimensions it was given.
pub fn remap_lightness<F>(image: &RgbImage, f: F) -> RgbImage
where
    F: FnOnce(&GrayImage) -> GrayImage,
{
    let (width, height) = image.dimensions();
    let mut lightness = GrayImage::new(width, height);
    let mut chroma = Vec::with_capacity((width as usize) * (height as usize));

    for (src, dst) in image.pixels().zip(lightness.pixels_mut()) {
        let [l, a, b] = to_lab8(src.0);
        dst.0[0] = l;
        chroma.push([a, b]);
    }

    let remapped = f(&lightness);
    debug_assert_eq!(remapped.dimensions(), (width, height));

    let mut out = RgbImage::new(width, height);
    for ((dst, l), [a, b]) in out.pixels_mut().zip(remapped.pixels()).zip(chroma) {
        dst.0 = from_lab8([l.0[0], a, b]);
    }
    out
}
