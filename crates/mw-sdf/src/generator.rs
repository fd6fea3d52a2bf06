//! Composition of inside/outside distance passes into an RGBA field.
//!
//! The inside pass measures distance into the mask (alpha inverted), the
//! outside pass distance away from it. Each is normalized by its radius and
//! clamped to `[0, 1]`. With both passes the result is a signed field centered
//! at `0.5` on the boundary; with one pass it is a one-sided falloff.

use core::fmt;
use core::str::FromStr;

use mw_core::{ALPHA_CHANNEL, ColorImage, RGBA_CHANNELS};
use tracing::debug;

use crate::distance_field::DistanceField;
use crate::error::{SdfError, SdfResult};

/// How the RGB channels of the output are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    White,
    Black,
    /// RGB mirrors the field value.
    Distance,
    /// RGB is copied from the source image.
    Source,
}

impl FillMode {
    pub const ALL: [FillMode; 4] = [
        FillMode::White,
        FillMode::Black,
        FillMode::Distance,
        FillMode::Source,
    ];

    /// Integer encoding used by parameter stores.
    pub fn index(self) -> i32 {
        match self {
            Self::White => 0,
            Self::Black => 1,
            Self::Distance => 2,
            Self::Source => 3,
        }
    }

    pub fn from_index(i: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.index() == i)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Distance => "distance",
            Self::Source => "source",
        }
    }

    fn solid(self) -> f32 {
        match self {
            Self::White => 1.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown fill mode '{s}' (expected white, black, distance or source)")
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Inside normalization radius in pixels; `<= 0` disables the inside pass.
    pub max_inside: f32,
    /// Outside normalization radius in pixels; `<= 0` disables the outside pass.
    pub max_outside: f32,
    /// Refinement cutoff in pixels; `<= 0` disables refinement.
    pub post_process_distance: f32,
    pub fill_mode: FillMode,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_inside: 50.0,
            max_outside: 0.0,
            post_process_distance: 0.0,
            fill_mode: FillMode::White,
        }
    }
}

impl GeneratorConfig {
    pub fn inside_enabled(&self) -> bool {
        self.max_inside > 0.0
    }

    pub fn outside_enabled(&self) -> bool {
        self.max_outside > 0.0
    }

    /// At least one pass must be enabled, and no radius may be infinite.
    pub fn validate(&self) -> SdfResult<()> {
        if !self.inside_enabled() && !self.outside_enabled() {
            return Err(SdfError::DegenerateConfig);
        }
        if self.max_inside.is_infinite() || self.max_outside.is_infinite() {
            return Err(SdfError::DegenerateConfig);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SdfGenerator {
    config: GeneratorConfig,
}

impl SdfGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GeneratorConfig {
        &mut self.config
    }

    /// Generates the field of `source` into a new RGBA buffer.
    pub fn generate(&self, source: &ColorImage) -> SdfResult<ColorImage> {
        if source.channels() != RGBA_CHANNELS {
            return Err(SdfError::UnsupportedChannelLayout {
                channels: source.channels(),
            });
        }
        let mut dst = ColorImage::new_rgba(source.width(), source.height())?;
        self.generate_into(source, &mut dst)?;
        Ok(dst)
    }

    /// Generates the field of `source` into `dst`.
    ///
    /// All checks run before any work; on error `dst` is left untouched. On
    /// success every channel of every pixel of `dst` is overwritten.
    pub fn generate_into(&self, source: &ColorImage, dst: &mut ColorImage) -> SdfResult<()> {
        let (w, h) = check_buffers(source, dst)?;
        self.config.validate()?;
        let cfg = &self.config;

        let src_alpha = source.alpha_channel()?;
        let mut field = vec![0.0f32; w * h];

        if cfg.inside_enabled() {
            let inverted: Vec<f32> = src_alpha.data().iter().map(|&a| 1.0 - a).collect();
            let inside = DistanceField::compute(&inverted, w, h, cfg.post_process_distance)?;

            for (out, d) in field.iter_mut().zip(inside.distances()) {
                *out = (d / cfg.max_inside).clamp(0.0, 1.0);
            }
            debug!("Inside pass done (radius {})", cfg.max_inside);
        }

        if cfg.outside_enabled() {
            let outside =
                DistanceField::compute(src_alpha.data(), w, h, cfg.post_process_distance)?;

            let blend = cfg.inside_enabled();
            for (out, d) in field.iter_mut().zip(outside.distances()) {
                let o = (d / cfg.max_outside).clamp(0.0, 1.0);
                *out = if blend {
                    0.5 + (*out - o) * 0.5
                } else {
                    (1.0 - o).clamp(0.0, 1.0)
                };
            }
            debug!("Outside pass done (radius {})", cfg.max_outside);
        }

        let solid = cfg.fill_mode.solid();
        for ((px, src_px), &a) in dst
            .data_mut()
            .chunks_exact_mut(RGBA_CHANNELS)
            .zip(source.pixels())
            .zip(&field)
        {
            let rgb = match cfg.fill_mode {
                FillMode::White | FillMode::Black => [solid; 3],
                FillMode::Distance => [a; 3],
                FillMode::Source => [src_px[0], src_px[1], src_px[2]],
            };
            px[..ALPHA_CHANNEL].copy_from_slice(&rgb);
            px[ALPHA_CHANNEL] = a;
        }

        debug!("Generated {}x{} field (fill mode {})", w, h, cfg.fill_mode);
        Ok(())
    }
}

fn check_buffers(source: &ColorImage, dst: &ColorImage) -> SdfResult<(usize, usize)> {
    let expected = (source.width(), source.height(), source.channels());
    let actual = (dst.width(), dst.height(), dst.channels());
    if expected != actual {
        return Err(SdfError::DimensionMismatch { expected, actual });
    }
    if source.channels() != RGBA_CHANNELS {
        return Err(SdfError::UnsupportedChannelLayout {
            channels: source.channels(),
        });
    }
    if source.width() == 0 || source.height() == 0 {
        return Err(SdfError::EmptyImage);
    }
    Ok((source.width(), source.height()))
}

#[cfg(test)]
mod tests {
    use mw_core::ColorImage;

    use super::{FillMode, GeneratorConfig, SdfGenerator};
    use crate::error::SdfError;

    /// `w x h` RGBA image with alpha 1 inside `[x0, x1) x [y0, y1)`.
    fn rect_mask(w: usize, h: usize, x0: usize, x1: usize, y0: usize, y1: usize) -> ColorImage {
        let mut data = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                let on = x >= x0 && x < x1 && y >= y0 && y < y1;
                let a = if on { 1.0 } else { 0.0 };
                data.extend_from_slice(&[0.2, 0.4 + x as f32 * 0.01, 0.6, a]);
            }
        }
        ColorImage::from_vec(w, h, 4, data).expect("valid image")
    }

    #[test]
    fn fill_mode_encodings() {
        for m in FillMode::ALL {
            assert_eq!(FillMode::from_index(m.index()), Some(m));
            assert_eq!(m.to_string().parse::<FillMode>(), Ok(m));
        }
        assert_eq!(" Distance ".parse::<FillMode>(), Ok(FillMode::Distance));
        assert!("grey".parse::<FillMode>().is_err());
        assert_eq!(FillMode::from_index(4), None);
    }

    #[test]
    fn default_config_matches_parameter_defaults() {
        let cfg = GeneratorConfig::default();
        assert_eq!(cfg.max_inside, 50.0);
        assert_eq!(cfg.max_outside, 0.0);
        assert_eq!(cfg.post_process_distance, 0.0);
        assert_eq!(cfg.fill_mode, FillMode::White);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn five_by_five_square_distance_mode() {
        let src = rect_mask(7, 7, 1, 6, 1, 6);
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 2.0,
            max_outside: 0.0,
            post_process_distance: 0.0,
            fill_mode: FillMode::Distance,
        });

        let out = generator.generate(&src).expect("generate");
        for px in out.pixels() {
            assert_eq!(px[0], px[3]);
            assert_eq!(px[1], px[3]);
            assert_eq!(px[2], px[3]);
        }

        let alpha = |x: usize, y: usize| out.pixel(x, y).expect("in bounds")[3];
        // Border ring is outside the mask.
        assert_eq!(alpha(0, 0), 0.0);
        assert_eq!(alpha(6, 3), 0.0);
        // One pixel in: 1 - 0.5 = 0.5 px, normalized by 2.
        assert!((alpha(1, 3) - 0.25).abs() < 1e-6);
        assert!((alpha(3, 1) - 0.25).abs() < 1e-6);
        // Two pixels in: 1.5 px.
        assert!((alpha(2, 3) - 0.75).abs() < 1e-6);
        // Center: 2.5 px, clamped.
        assert_eq!(alpha(3, 3), 1.0);
    }

    #[test]
    fn source_mode_keeps_rgb() {
        let src = rect_mask(12, 9, 3, 9, 2, 7);
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 4.0,
            max_outside: 4.0,
            post_process_distance: 2.0,
            fill_mode: FillMode::Source,
        });

        let out = generator.generate(&src).expect("generate");
        for (o, s) in out.pixels().zip(src.pixels()) {
            assert_eq!(&o[..3], &s[..3]);
        }
        assert_ne!(out.alpha_channel().unwrap(), src.alpha_channel().unwrap());
    }

    #[test]
    fn solid_fill_modes() {
        let src = rect_mask(8, 8, 2, 6, 2, 6);
        for (mode, value) in [(FillMode::White, 1.0), (FillMode::Black, 0.0)] {
            let generator = SdfGenerator::new(GeneratorConfig {
                fill_mode: mode,
                ..GeneratorConfig::default()
            });
            let out = generator.generate(&src).expect("generate");
            assert!(out.pixels().all(|px| px[..3] == [value; 3]));
        }
    }

    #[test]
    fn signed_field_is_centered_on_boundary() {
        let src = rect_mask(16, 16, 4, 12, 4, 12);
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 4.0,
            max_outside: 4.0,
            post_process_distance: 0.0,
            fill_mode: FillMode::White,
        });
        let out = generator.generate(&src).expect("generate");
        let alpha = |x: usize, y: usize| out.pixel(x, y).expect("in bounds")[3];

        // Inside pixels sit above 0.5, outside pixels below.
        assert!(alpha(8, 8) > 0.5);
        assert!(alpha(4, 8) > 0.5);
        assert!(alpha(3, 8) < 0.5);
        assert!(alpha(0, 8) < 0.5);
        assert!((alpha(4, 8) - 0.5625).abs() < 1e-6);
        assert!((alpha(3, 8) - 0.4375).abs() < 1e-6);
        assert!(out.pixels().all(|px| (0.0..=1.0).contains(&px[3])));
    }

    #[test]
    fn outside_only_falls_off_from_mask() {
        let src = rect_mask(16, 16, 6, 10, 6, 10);
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 0.0,
            max_outside: 4.0,
            post_process_distance: 0.0,
            fill_mode: FillMode::White,
        });
        let out = generator.generate(&src).expect("generate");
        let alpha = |x: usize, y: usize| out.pixel(x, y).expect("in bounds")[3];

        assert_eq!(alpha(8, 8), 1.0);
        assert!((alpha(5, 8) - 0.875).abs() < 1e-6);
        assert!(alpha(4, 8) < alpha(5, 8));
        assert_eq!(alpha(0, 8), 0.0);
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let src = rect_mask(20, 14, 5, 15, 3, 11);
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 6.0,
            max_outside: 3.0,
            post_process_distance: 3.0,
            fill_mode: FillMode::Distance,
        });
        let a = generator.generate(&src).expect("generate");
        let b = generator.generate(&src).expect("generate");
        let bits = |img: &ColorImage| img.data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn degenerate_config_writes_nothing() {
        let src = rect_mask(6, 6, 1, 5, 1, 5);
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 0.0,
            max_outside: -1.0,
            ..GeneratorConfig::default()
        });

        let mut dst = ColorImage::from_vec(6, 6, 4, vec![0.3; 144]).expect("valid image");
        assert_eq!(
            generator.generate_into(&src, &mut dst),
            Err(SdfError::DegenerateConfig)
        );
        assert!(dst.data().iter().all(|&v| v == 0.3));

        let nan = SdfGenerator::new(GeneratorConfig {
            max_inside: f32::NAN,
            max_outside: f32::NAN,
            ..GeneratorConfig::default()
        });
        assert_eq!(nan.generate(&src).unwrap_err(), SdfError::DegenerateConfig);
    }

    #[test]
    fn infinite_radius_is_rejected() {
        // An empty mask leaves the outside pass unresolved at +inf everywhere.
        let src = rect_mask(6, 6, 0, 0, 0, 0);
        for (max_inside, max_outside) in [
            (f32::INFINITY, 0.0),
            (0.0, f32::INFINITY),
            (4.0, f32::INFINITY),
            (f32::INFINITY, f32::INFINITY),
        ] {
            let generator = SdfGenerator::new(GeneratorConfig {
                max_inside,
                max_outside,
                ..GeneratorConfig::default()
            });
            let mut dst = ColorImage::from_vec(6, 6, 4, vec![0.3; 144]).expect("valid image");
            assert_eq!(
                generator.generate_into(&src, &mut dst),
                Err(SdfError::DegenerateConfig),
                "radii ({max_inside}, {max_outside})"
            );
            assert!(dst.data().iter().all(|&v| v == 0.3));
        }

        // Finite radii on the same mask keep alpha in range.
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 4.0,
            max_outside: 1.0e30,
            ..GeneratorConfig::default()
        });
        let out = generator.generate(&src).expect("generate");
        assert!(out.pixels().all(|px| (0.0..=1.0).contains(&px[3])));
    }

    #[test]
    fn buffer_checks_leave_destination_untouched() {
        let generator = SdfGenerator::default();
        let src = rect_mask(6, 6, 1, 5, 1, 5);

        let mut small = ColorImage::from_vec(5, 6, 4, vec![0.7; 120]).expect("valid image");
        assert_eq!(
            generator.generate_into(&src, &mut small),
            Err(SdfError::DimensionMismatch {
                expected: (6, 6, 4),
                actual: (5, 6, 4)
            })
        );
        assert!(small.data().iter().all(|&v| v == 0.7));

        let rgb = ColorImage::from_vec(2, 2, 3, vec![1.0; 12]).expect("valid image");
        let mut rgb_dst = rgb.clone();
        assert_eq!(
            generator.generate_into(&rgb, &mut rgb_dst),
            Err(SdfError::UnsupportedChannelLayout { channels: 3 })
        );
        assert_eq!(
            generator.generate(&rgb).unwrap_err(),
            SdfError::UnsupportedChannelLayout { channels: 3 }
        );

        let empty = ColorImage::from_vec(0, 3, 4, vec![]).expect("valid image");
        assert_eq!(generator.generate(&empty).unwrap_err(), SdfError::EmptyImage);
    }

    #[test]
    fn output_overwrites_previous_contents() {
        let src = rect_mask(10, 10, 3, 7, 3, 7);
        let generator = SdfGenerator::new(GeneratorConfig {
            max_inside: 0.0,
            max_outside: 5.0,
            ..GeneratorConfig::default()
        });
        let fresh = generator.generate(&src).expect("generate");
        let mut reused = ColorImage::from_vec(10, 10, 4, vec![9.0; 400]).expect("valid image");
        generator.generate_into(&src, &mut reused).expect("generate");
        assert_eq!(fresh, reused);
    }
}
