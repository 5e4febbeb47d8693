use clap::{Parser, Subcommand, ValueEnum};
use retouch::config::{self, EditorConfig};
use retouch::imaging::{
    CropRect, ExportFormat, ExportSettings, FileSizeUnit, FilterKind, Quality, ResizeSettings,
    ResizeUnit, TransformOperation,
};
use retouch::output::{self, EditReport, ExportSummary};
use retouch::presets::SOCIAL_MEDIA_PRESETS;
use retouch::session::EditSession;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Non-destructive single-image editor")]
#[command(long_about = "\
Non-destructive single-image editor

Edits are applied to the untouched original in a fixed order:

  filters → transforms → crop → resize/preset → export

Filters take values from 0 to 100, 50 is neutral. Crop coordinates refer to
the image after transforms. A target size makes lossy formats search for the
quality that lands closest to it.

Set RUST_LOG=retouch=debug to see what the engine is doing.

Run 'retouch gen-config' to generate a documented retouch.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = "retouch.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Edit one image and export the result
    Edit(EditArgs),
    /// List the social media presets
    Presets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock retouch.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct EditArgs {
    /// Image to edit (png, jpeg, webp, tiff)
    input: PathBuf,

    /// Where to write the result
    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    brightness: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    contrast: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    saturation: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    hue: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    warmth: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    sharpness: Option<u8>,

    /// Rotation or flip, repeatable, applied in order
    #[arg(long = "transform", value_enum)]
    transforms: Vec<TransformArg>,

    /// Crop rectangle as X,Y,WIDTH,HEIGHT
    #[arg(long, value_parser = parse_crop)]
    crop: Option<CropRect>,

    /// Resize to WIDTHxHEIGHT (aspect ratio kept unless --stretch)
    #[arg(long, value_parser = parse_dimensions, conflicts_with = "preset")]
    resize: Option<(u32, u32)>,

    /// Read --resize values as percentages
    #[arg(long, requires = "resize")]
    percent: bool,

    /// Resize to exactly WIDTHxHEIGHT, ignoring the aspect ratio
    #[arg(long, requires = "resize")]
    stretch: bool,

    /// Fit to a social media preset, see `retouch presets`
    #[arg(long)]
    preset: Option<String>,

    /// Output format (default: from the output extension, then config)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Quality for lossy formats, 1-100
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Desired output size
    #[arg(long)]
    target_size: Option<f64>,

    /// Unit of --target-size
    #[arg(long, value_enum, default_value = "kb")]
    unit: UnitArg,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TransformArg {
    RotateLeft,
    RotateRight,
    FlipHorizontal,
    FlipVertical,
}

impl From<TransformArg> for TransformOperation {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::RotateLeft => Self::RotateLeft,
            TransformArg::RotateRight => Self::RotateRight,
            TransformArg::FlipHorizontal => Self::FlipHorizontal,
            TransformArg::FlipVertical => Self::FlipVertical,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
    Avif,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Jpeg => Self::Jpeg,
            FormatArg::Webp => Self::Webp,
            FormatArg::Avif => Self::Avif,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Kb,
    Mb,
}

impl From<UnitArg> for FileSizeUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Kb => Self::Kb,
            UnitArg::Mb => Self::Mb,
        }
    }
}

fn parse_crop(s: &str) -> Result<CropRect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop '{s}': {e}"))?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(CropRect::new(*x, *y, *w, *h)),
        _ => Err(format!("crop must be X,Y,WIDTH,HEIGHT, got '{s}'")),
    }
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension '{v}': {e}"))
    };
    Ok((parse(w)?, parse(h)?))
}

/// Declared MIME type for an input file, from its extension.
fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Command::Edit(args) => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let report = run_edit(&config, &args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_edit_output(&report);
            }
        }
        Command::Presets { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(SOCIAL_MEDIA_PRESETS)?);
            } else {
                output::print_presets(SOCIAL_MEDIA_PRESETS);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_edit(
    config: &EditorConfig,
    args: &EditArgs,
) -> Result<EditReport, Box<dyn std::error::Error>> {
    let mime_type = mime_for_path(&args.input)
        .ok_or_else(|| format!("unsupported input type: {}", args.input.display()))?;
    let bytes = std::fs::read(&args.input)?;

    let mut session = EditSession::new(config);
    let loaded = session.load_image(bytes, mime_type)?;
    let (source_width, source_height) = (
        loaded.width.unwrap_or_default(),
        loaded.height.unwrap_or_default(),
    );
    let mut steps = Vec::new();

    let filters = [
        (FilterKind::Brightness, args.brightness),
        (FilterKind::Contrast, args.contrast),
        (FilterKind::Saturation, args.saturation),
        (FilterKind::Hue, args.hue),
        (FilterKind::Warmth, args.warmth),
        (FilterKind::Sharpness, args.sharpness),
    ];
    for (kind, value) in filters {
        if let Some(value) = value {
            session.set_filter(kind, value)?;
            steps.push(format!("{kind} {value}"));
        }
    }

    for arg in &args.transforms {
        let op = TransformOperation::from(*arg);
        session.apply_transform(op)?;
        steps.push(op.label().to_string());
    }

    if let Some(rect) = args.crop {
        session.apply_crop(rect)?;
        steps.push(format!(
            "crop {}x{} at {},{}",
            rect.width, rect.height, rect.x, rect.y
        ));
    }

    if let Some((width, height)) = args.resize {
        let settings = ResizeSettings {
            width,
            height,
            maintain_aspect_ratio: !args.stretch,
            unit: if args.percent {
                ResizeUnit::Percent
            } else {
                ResizeUnit::Pixel
            },
            crop_to_fill: false,
        };
        session.apply_resize(settings)?;
        let suffix = if args.percent { "%" } else { "" };
        steps.push(format!("resize {width}{suffix}x{height}{suffix}"));
    }

    if let Some(name) = &args.preset {
        session.apply_social_media_preset(name)?;
        steps.push(format!("preset {name}"));
    }

    let format = args
        .format
        .map(ExportFormat::from)
        .or_else(|| {
            args.output
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ExportFormat::from_extension)
        })
        .unwrap_or(config.export.format);
    let defaults = config.default_export_settings();
    session.set_export_settings(ExportSettings {
        format,
        quality: args.quality.map(Quality::new).unwrap_or(defaults.quality),
        target_file_size: args.target_size,
        file_size_unit: args.unit.into(),
    })?;

    let outcome = session.export()?;
    std::fs::write(&args.output, &outcome.bytes)?;

    let status = session.status();
    Ok(EditReport {
        input: args.input.display().to_string(),
        source_width,
        source_height,
        steps,
        width: status.width.unwrap_or_default(),
        height: status.height.unwrap_or_default(),
        export: ExportSummary::from(&outcome),
        output: args.output.display().to_string(),
    })
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
