use clap::{Parser, Subcommand, ValueEnum};
use photoprep::batch::{self, BatchItem, BatchResult};
use photoprep::config::{self, AppConfig, ConfigError};
use photoprep::imaging::codec::{self, OutputEncoding};
use photoprep::imaging::{OperatorConfig, Pipeline};
use photoprep::{logging, output, preview};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "photoprep")]
#[command(about = "Enhance photos for photogrammetry and report quality metrics")]
#[command(long_about = "\
Enhance photos for photogrammetry and report quality metrics

Each image runs through a fixed operator sequence:

  adaptive contrast (CLAHE on lightness, optional)
    -> gamma correction
    -> edge-preserving denoise (bilateral, optional)
    -> unsharp sharpening (strength 0 disables)

Sharpness (variance of the Laplacian) and brightness (mean gray level) are
measured before and after, so the effect of each setting can be compared.

Batch runs write one enhanced file per input into the output directory,
under the input's file name, and package them into <output-dir>.zip.

Settings come from photoprep.toml in the working directory (or --config),
overridden by command-line flags. Run 'photoprep gen-config' to generate a
documented photoprep.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./photoprep.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter spec, e.g. "debug" (default: $RUST_LOG, then info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Enhancement flags shared by `enhance` and `batch`.
#[derive(clap::Args, Clone)]
struct EnhanceArgs {
    /// Disable adaptive contrast
    #[arg(long)]
    no_clahe: bool,

    /// Gamma exponent, 0.5-2.5
    #[arg(long)]
    gamma: Option<f32>,

    /// Disable bilateral denoise
    #[arg(long)]
    no_denoise: bool,

    /// Unsharp mask strength, 0.0-3.0
    #[arg(long)]
    sharpen: Option<f32>,
}

impl EnhanceArgs {
    /// Flags as a sparse `[enhance]` overlay.
    fn overlay(&self) -> toml::Table {
        let mut table = toml::Table::new();
        if self.no_clahe {
            table.insert("clahe".into(), false.into());
        }
        if let Some(gamma) = self.gamma {
            table.insert("gamma".into(), (gamma as f64).into());
        }
        if self.no_denoise {
            table.insert("denoise".into(), false.into());
        }
        if let Some(strength) = self.sharpen {
            table.insert("sharpen_strength".into(), (strength as f64).into());
        }
        table
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OnError {
    Abort,
    Skip,
}

#[derive(Subcommand)]
enum Command {
    /// Enhance one image and print its before/after metrics
    Enhance {
        /// Input image
        input: PathBuf,

        /// Output JPEG (default: <input-stem>-enhanced.jpg next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        enhance: EnhanceArgs,
    },
    /// Enhance many images, write them to a directory, and archive it
    Batch {
        /// Image files and/or directories of images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for enhanced images; the archive is written next to it
        #[arg(long)]
        output_dir: PathBuf,

        /// Also write the statistics report (.csv for CSV, JSON otherwise)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Descend into subdirectories of directory inputs
        #[arg(long)]
        recursive: bool,

        /// What to do when one image fails
        #[arg(long, value_enum)]
        on_error: Option<OnError>,

        /// Maximum parallel workers (default: sequential)
        #[arg(long)]
        workers: Option<usize>,

        /// JPEG quality for .jpg/.jpeg outputs, 1-100
        #[arg(long)]
        jpeg_quality: Option<u8>,

        #[command(flatten)]
        enhance: EnhanceArgs,
    },
    /// Print a stock photoprep.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _logger = logging::setup_logging(cli.log_level.as_deref())?;

    match &cli.command {
        Command::Enhance {
            input,
            output: output_arg,
            enhance,
        } => {
            let mut overlay = toml::Table::new();
            overlay.insert("enhance".into(), toml::Value::Table(enhance.overlay()));
            let app = resolve_app_config(cli.config.as_deref(), overlay)?;

            let out_path = output_arg
                .clone()
                .unwrap_or_else(|| default_enhance_output(input));
            let name = out_path.display().to_string();
            if !matches!(
                OutputEncoding::for_name(&name, app.batch.jpeg_quality)?,
                OutputEncoding::Jpeg { .. }
            ) {
                return Err(format!("{name}: single-image output must be .jpg or .jpeg").into());
            }

            let bytes = std::fs::read(input)?;
            let pipeline = Pipeline::from_config(&app.operator_config()?);
            let result = preview::enhance_bytes_with(
                &pipeline,
                &input.display().to_string(),
                &bytes,
                app.batch.jpeg_quality,
            )?;
            std::fs::write(&out_path, &result.jpeg)?;
            output::print_enhance_output(
                input,
                &out_path,
                (result.width, result.height),
                &result.before,
                &result.after,
            );
        }
        Command::Batch {
            inputs,
            output_dir,
            report,
            recursive,
            on_error,
            workers,
            jpeg_quality,
            enhance,
        } => {
            let mut batch_overlay = toml::Table::new();
            if let Some(policy) = on_error {
                let text = match policy {
                    OnError::Abort => "abort",
                    OnError::Skip => "skip",
                };
                batch_overlay.insert("on_error".into(), text.into());
            }
            if let Some(n) = workers {
                batch_overlay.insert("max_workers".into(), (*n as i64).into());
            }
            if let Some(q) = jpeg_quality {
                batch_overlay.insert("jpeg_quality".into(), (*q as i64).into());
            }
            let mut overlay = toml::Table::new();
            overlay.insert("enhance".into(), toml::Value::Table(enhance.overlay()));
            overlay.insert("batch".into(), toml::Value::Table(batch_overlay));
            let app = resolve_app_config(cli.config.as_deref(), overlay)?;
            let operator_config: OperatorConfig = app.operator_config()?;

            let items: Vec<BatchItem> = expand_inputs(inputs, *recursive)?
                .into_iter()
                .map(BatchItem::from_path)
                .collect();

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::run_batch(
                &items,
                output_dir,
                operator_config,
                &app.batch_options(),
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;

            println!();
            output::print_batch_summary(&result);
            if let Some(path) = report {
                write_report(path, &result)?;
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Stock defaults, then the config file, then command-line `overrides`.
fn resolve_app_config(
    config_path: Option<&Path>,
    overrides: toml::Table,
) -> Result<AppConfig, ConfigError> {
    let file = match config_path {
        Some(path) => Some(toml::from_str::<toml::Value>(&std::fs::read_to_string(
            path,
        )?)?),
        None => config::load_raw_config(Path::new(config::CONFIG_FILE_NAME))?,
    };
    let overrides = toml::Value::Table(overrides);
    let overlay = match file {
        Some(file) => config::merge_toml(file, overrides),
        None => overrides,
    };
    config::resolve_config(config::stock_defaults_value(), Some(overlay))
}

/// CSV when `path` ends in `.csv`, pretty JSON of the whole result otherwise.
fn write_report(path: &Path, result: &BatchResult) -> Result<(), Box<dyn std::error::Error>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let text = if is_csv {
        let mut lines = output::format_stats_csv(&result.records);
        lines.push(String::new());
        lines.join("\n")
    } else {
        serde_json::to_string_pretty(result)?
    };
    std::fs::write(path, text)?;
    Ok(())
}

/// `photos/dawn.png` → `photos/dawn-enhanced.jpg`
fn default_enhance_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}-enhanced.jpg"))
}

/// Files are kept as given; directories are expanded to the supported image
/// files inside them, sorted by name.
fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let walker = WalkDir::new(input)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && codec::is_supported_input(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}
