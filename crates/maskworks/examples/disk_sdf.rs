//! Example: distance field of a synthetic anti-aliased disk.
//!
//! Rasterizes a disk with supersampled coverage into an RGBA mask, runs the
//! generator once per fill mode and writes one PNG per mode next to the mask.
//!
//! Run from the workspace root:
//!   cargo run -p maskworks --example disk_sdf -- --help
//!   RUST_LOG=debug cargo run -p maskworks --example disk_sdf

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use image::RgbaImage;
use maskworks::{ColorImage, FillMode, GeneratorConfig, SdfGenerator};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Generate distance fields for a synthetic disk mask")]
struct Args {
    /// Canvas width in pixels
    #[arg(long, default_value_t = 512)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 424)]
    height: u32,

    /// Disk radius in pixels
    #[arg(long, default_value_t = 120.0)]
    radius: f32,

    /// Inside normalization radius (0 disables the inside pass)
    #[arg(long, default_value_t = 50.0)]
    max_inside: f32,

    /// Outside normalization radius (0 disables the outside pass)
    #[arg(long, default_value_t = 25.0)]
    max_outside: f32,

    /// Refinement cutoff distance (0 disables refinement)
    #[arg(long, default_value_t = 4.0)]
    post_process: f32,

    /// Output directory
    #[arg(long, default_value = "target/disk_sdf")]
    out: PathBuf,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// White disk with 4x4 supersampled edge coverage in the alpha channel.
fn disk_mask(width: usize, height: usize, radius: f32) -> Result<ColorImage> {
    let cx = 0.5 * width as f32;
    let cy = 0.5 * height as f32;
    let r2 = radius * radius;

    let mut data = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let mut hits = 0u32;
            for sy in 0..4 {
                for sx in 0..4 {
                    let px = x as f32 + (sx as f32 + 0.5) / 4.0 - cx;
                    let py = y as f32 + (sy as f32 + 0.5) / 4.0 - cy;
                    if px * px + py * py <= r2 {
                        hits += 1;
                    }
                }
            }
            data.extend_from_slice(&[1.0, 1.0, 1.0, hits as f32 / 16.0]);
        }
    }

    ColorImage::from_vec(width, height, 4, data).context("building disk mask")
}

fn save_png(path: &Path, img: &ColorImage) -> Result<()> {
    let rgba = RgbaImage::from_raw(img.width() as u32, img.height() as u32, img.to_u8())
        .context("RGBA buffer size does not match dimensions")?;
    rgba.save(path)
        .with_context(|| format!("writing {}", path.display()))
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let mask = disk_mask(args.width as usize, args.height as usize, args.radius)?;
    save_png(&args.out.join("mask.png"), &mask)?;
    info!(
        "mask {}x{}, radius {:.1}",
        args.width, args.height, args.radius
    );

    let mut generator = SdfGenerator::new(GeneratorConfig {
        max_inside: args.max_inside,
        max_outside: args.max_outside,
        post_process_distance: args.post_process,
        fill_mode: FillMode::White,
    });

    for mode in FillMode::ALL {
        generator.config_mut().fill_mode = mode;

        let t0 = Instant::now();
        let field = generator
            .generate(&mask)
            .with_context(|| format!("generating {mode} field"))?;
        let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

        let path = args.out.join(format!("sdf_{mode}.png"));
        save_png(&path, &field)?;
        info!("{mode}: {elapsed_ms:.2} ms -> {}", path.display());
    }

    Ok(())
}
