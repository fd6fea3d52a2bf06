use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use image::{GrayImage, RgbaImage};
use mw_core::ColorImage;
use mw_sdf::{DistanceField, FillMode, GeneratorConfig, SdfGenerator};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mw_gallery")]
#[command(about = "Run mask distance field generation on image files")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite an RGBA distance field from a mask image
    #[command(name = "sdf")]
    Sdf(SdfArgs),
    /// Visualize the raw distance transform of a mask's alpha
    #[command(name = "distance")]
    Distance(DistanceArgs),
    /// Write the default generator config as JSON
    #[command(name = "init_config")]
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct SdfArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// JSON generator config; flags given explicitly override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    max_inside: Option<f32>,
    #[arg(long)]
    max_outside: Option<f32>,
    #[arg(long)]
    post_process: Option<f32>,
    /// white, black, distance or source
    #[arg(long)]
    fill_mode: Option<FillMode>,
}

#[derive(Args, Debug, Clone)]
struct DistanceArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Measure distance into the mask instead of away from it
    #[arg(long, default_value_t = false)]
    invert: bool,
    #[arg(long, default_value_t = 0.0)]
    post_process: f32,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "sdf_config.json")]
    path: PathBuf,
}

/// On-disk form of [`GeneratorConfig`]. Missing keys take the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct ConfigDto {
    max_inside: f32,
    max_outside: f32,
    post_process_distance: f32,
    fill_mode: String,
}

impl Default for ConfigDto {
    fn default() -> Self {
        Self::from(&GeneratorConfig::default())
    }
}

impl From<&GeneratorConfig> for ConfigDto {
    fn from(cfg: &GeneratorConfig) -> Self {
        Self {
            max_inside: cfg.max_inside,
            max_outside: cfg.max_outside,
            post_process_distance: cfg.post_process_distance,
            fill_mode: cfg.fill_mode.to_string(),
        }
    }
}

impl TryFrom<ConfigDto> for GeneratorConfig {
    type Error = anyhow::Error;

    fn try_from(dto: ConfigDto) -> Result<Self> {
        let fill_mode = dto.fill_mode.parse::<FillMode>().map_err(|e| anyhow!(e))?;
        Ok(Self {
            max_inside: dto.max_inside,
            max_outside: dto.max_outside,
            post_process_distance: dto.post_process_distance,
            fill_mode,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct MetaSdf {
    width: usize,
    height: usize,
    config: ConfigDto,
    elapsed_ms: f64,
    alpha_min: f32,
    alpha_max: f32,
}

#[derive(Debug, Clone, Serialize)]
struct MetaDistance {
    width: usize,
    height: usize,
    inverted: bool,
    post_process_distance: f32,
    edge_pixels: usize,
    unresolved_pixels: usize,
    min_distance: Option<f32>,
    max_distance: Option<f32>,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Sdf(args) => run_sdf(args),
        Command::Distance(args) => run_distance(args),
        Command::InitConfig(args) => run_init_config(args),
    }
}

fn run_sdf(args: SdfArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "sdf")?;
    let img = load_input_rgba(&args.common.input)?;
    let config = resolve_config(&args)?;

    let generator = SdfGenerator::new(config);
    let t0 = Instant::now();
    let out = generator
        .generate(&img)
        .with_context(|| format!("generating field for {}", args.common.input.display()))?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    save_rgba_image(case_dir.join("sdf.png"), &out)?;

    let (alpha_min, alpha_max) = out
        .pixels()
        .map(|px| px[3])
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), a| {
            (lo.min(a), hi.max(a))
        });

    write_json(
        case_dir.join("meta.json"),
        &MetaSdf {
            width: img.width(),
            height: img.height(),
            config: ConfigDto::from(generator.config()),
            elapsed_ms,
            alpha_min,
            alpha_max,
        },
    )?;

    info!(
        "sdf {}x{} in {:.2} ms -> {}",
        img.width(),
        img.height(),
        elapsed_ms,
        case_dir.display()
    );
    Ok(())
}

fn run_distance(args: DistanceArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "distance")?;
    let img = load_input_rgba(&args.common.input)?;

    let alpha = img
        .alpha_channel()
        .context("extracting alpha channel")?
        .into_vec();
    let alpha = if args.invert {
        alpha.into_iter().map(|a| 1.0 - a).collect()
    } else {
        alpha
    };

    let t0 = Instant::now();
    let field = DistanceField::compute(&alpha, img.width(), img.height(), args.post_process)
        .context("computing distance field")?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    let distances: Vec<f32> = field.distances().collect();
    let finite: Vec<f32> = distances.iter().copied().filter(|d| d.is_finite()).collect();
    let unresolved = distances.len() - finite.len();
    if unresolved > 0 {
        warn!("{unresolved} pixels have no reachable edge and render black");
    }

    let vis = f32_to_u8_vis(&distances);
    save_luma_raw(case_dir.join("distance.png"), img.width(), img.height(), vis)?;

    write_json(
        case_dir.join("meta.json"),
        &MetaDistance {
            width: img.width(),
            height: img.height(),
            inverted: args.invert,
            post_process_distance: args.post_process,
            edge_pixels: field.edge_pixel_count(),
            unresolved_pixels: unresolved,
            min_distance: finite.iter().copied().reduce(f32::min),
            max_distance: finite.iter().copied().reduce(f32::max),
            elapsed_ms,
        },
    )?;

    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    write_json(args.path.clone(), &ConfigDto::default())?;
    info!("default config written to {}", args.path.display());
    Ok(())
}

fn resolve_config(args: &SdfArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            ensure_file_exists(path, "config")?;
            let dto: ConfigDto = read_json(path)?;
            GeneratorConfig::try_from(dto)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(v) = args.max_inside {
        config.max_inside = v;
    }
    if let Some(v) = args.max_outside {
        config.max_outside = v;
    }
    if let Some(v) = args.post_process {
        config.post_process_distance = v;
    }
    if let Some(m) = args.fill_mode {
        config.fill_mode = m;
    }

    if config.validate().is_err() {
        bail!(
            "max_inside ({}) and max_outside ({}) are both disabled; set at least one above 0.",
            config.max_inside,
            config.max_outside
        );
    }
    Ok(config)
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;

    Ok(case_dir)
}

fn load_input_rgba(path: &Path) -> Result<ColorImage> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let rgba = dyn_img.to_rgba32f();
    let (w, h) = rgba.dimensions();
    let data = rgba.into_raw();

    ColorImage::from_vec(w as usize, h as usize, 4, data)
        .with_context(|| format!("constructing RGBA buffer from {}", path.display()))
}

fn save_rgba_image(path: PathBuf, img: &ColorImage) -> Result<()> {
    let rgba = RgbaImage::from_raw(img.width() as u32, img.height() as u32, img.to_u8())
        .context("constructing RgbaImage from raw bytes")?;
    rgba.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn save_luma_raw(path: PathBuf, width: usize, height: usize, data: Vec<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(width as u32, height as u32, data)
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

/// Min-max stretch of finite values to `0..=255`; non-finite values map to 0.
fn f32_to_u8_vis(data: &[f32]) -> Vec<u8> {
    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    for &v in data.iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    if !min_v.is_finite() || (max_v - min_v).abs() < 1e-12 {
        return vec![0u8; data.len()];
    }

    let scale = 255.0 / (max_v - min_v);
    data.iter()
        .map(|&v| {
            if v.is_finite() {
                ((v - min_v) * scale).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
