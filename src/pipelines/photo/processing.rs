// SPDX-License-Identifier: MPL-2.0

//! Film filter presets
//!
//! Each preset is a pure per-pixel (or position-dependent) transform over
//! RGBA images. The same input always produces the same output and alpha
//! is passed through untouched.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Film filter preset applied to finished captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilmFilter {
    /// No filter applied
    #[default]
    Standard,
    /// Black & white / monochrome
    Mono,
    /// Sepia tone (warm brownish tint)
    Sepia,
    /// High contrast black & white
    Noir,
    /// Boosted saturation and contrast
    Vivid,
    /// Blue color temperature shift
    Cool,
    /// Orange/amber color temperature
    Warm,
    /// Lifted blacks with muted colors
    Fade,
    /// Two-color gradient mapping
    Duotone,
    /// Darkened edges
    Vignette,
    /// Inverted colors
    Negative,
    /// Reduced color levels (pop-art)
    Posterize,
    /// Partially inverted tones
    Solarize,
}

impl FilmFilter {
    /// All presets for iteration
    pub const ALL: [FilmFilter; 13] = [
        FilmFilter::Standard,
        FilmFilter::Mono,
        FilmFilter::Sepia,
        FilmFilter::Noir,
        FilmFilter::Vivid,
        FilmFilter::Cool,
        FilmFilter::Warm,
        FilmFilter::Fade,
        FilmFilter::Duotone,
        FilmFilter::Vignette,
        FilmFilter::Negative,
        FilmFilter::Posterize,
        FilmFilter::Solarize,
    ];

    /// Lowercase name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            FilmFilter::Standard => "standard",
            FilmFilter::Mono => "mono",
            FilmFilter::Sepia => "sepia",
            FilmFilter::Noir => "noir",
            FilmFilter::Vivid => "vivid",
            FilmFilter::Cool => "cool",
            FilmFilter::Warm => "warm",
            FilmFilter::Fade => "fade",
            FilmFilter::Duotone => "duotone",
            FilmFilter::Vignette => "vignette",
            FilmFilter::Negative => "negative",
            FilmFilter::Posterize => "posterize",
            FilmFilter::Solarize => "solarize",
        }
    }
}

impl std::fmt::Display for FilmFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilmFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FilmFilter::ALL
            .into_iter()
            .find(|filter| filter.name() == wanted)
            .ok_or_else(|| format!("unknown film filter '{}'", s))
    }
}

/// Apply a film filter preset, returning a new image
pub fn apply(preset: FilmFilter, image: &RgbaImage) -> RgbaImage {
    let mut output = image.clone();
    if preset == FilmFilter::Standard {
        return output;
    }

    let (width, height) = output.dimensions();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let mut r = pixel[0] as f32 / 255.0;
        let mut g = pixel[1] as f32 / 255.0;
        let mut b = pixel[2] as f32 / 255.0;

        apply_filter_rgb(&mut r, &mut g, &mut b, preset, x, y, width, height);

        pixel[0] = to_u8(r);
        pixel[1] = to_u8(g);
        pixel[2] = to_u8(b);
    }

    output
}

#[inline]
fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Apply filter effect to normalized RGB values in-place
#[inline]
#[allow(clippy::too_many_arguments)]
fn apply_filter_rgb(
    r: &mut f32,
    g: &mut f32,
    b: &mut f32,
    filter: FilmFilter,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) {
    match filter {
        FilmFilter::Standard => {}

        FilmFilter::Mono => {
            let gray = luminance(*r, *g, *b);
            *r = gray;
            *g = gray;
            *b = gray;
        }

        FilmFilter::Sepia => {
            let lum = luminance(*r, *g, *b);
            *r = (lum * 1.2 + 0.1).clamp(0.0, 1.0);
            *g = (lum * 0.9 + 0.05).clamp(0.0, 1.0);
            *b = (lum * 0.7).clamp(0.0, 1.0);
        }

        FilmFilter::Noir => {
            let lum = luminance(*r, *g, *b);
            let adjusted = ((lum - 0.5) * 2.0 + 0.5).clamp(0.0, 1.0);
            *r = adjusted;
            *g = adjusted;
            *b = adjusted;
        }

        FilmFilter::Vivid => {
            let lum = luminance(*r, *g, *b);
            for c in [&mut *r, &mut *g, &mut *b] {
                let saturated = (lum + (*c - lum) * 1.4).clamp(0.0, 1.0);
                *c = ((saturated - 0.5) * 1.15 + 0.5).clamp(0.0, 1.0);
            }
        }

        FilmFilter::Cool => {
            *r = (*r * 0.9).clamp(0.0, 1.0);
            *g = (*g * 0.95).clamp(0.0, 1.0);
            *b = (*b * 1.1).clamp(0.0, 1.0);
        }

        FilmFilter::Warm => {
            *r = (*r * 1.1).clamp(0.0, 1.0);
            *b = (*b * 0.85).clamp(0.0, 1.0);
        }

        FilmFilter::Fade => {
            for c in [&mut *r, &mut *g, &mut *b] {
                *c = (*c * 0.85 + 0.1).clamp(0.0, 1.0);
            }
            let lum = luminance(*r, *g, *b);
            for c in [&mut *r, &mut *g, &mut *b] {
                *c = (lum + (*c - lum) * 0.7).clamp(0.0, 1.0);
            }
        }

        FilmFilter::Duotone => {
            let lum = luminance(*r, *g, *b);
            let dark = (0.1, 0.1, 0.4);
            let light = (1.0, 0.9, 0.5);
            *r = dark.0 + lum * (light.0 - dark.0);
            *g = dark.1 + lum * (light.1 - dark.1);
            *b = dark.2 + lum * (light.2 - dark.2);
        }

        FilmFilter::Vignette => {
            let tex_x = (x as f32 + 0.5) / width.max(1) as f32;
            let tex_y = (y as f32 + 0.5) / height.max(1) as f32;
            let dx = tex_x - 0.5;
            let dy = tex_y - 0.5;
            let dist = (dx * dx + dy * dy).sqrt();
            let vignette = 1.0 - smoothstep(0.3, 0.9, dist);
            *r *= vignette;
            *g *= vignette;
            *b *= vignette;
        }

        FilmFilter::Negative => {
            *r = 1.0 - *r;
            *g = 1.0 - *g;
            *b = 1.0 - *b;
        }

        FilmFilter::Posterize => {
            let levels = 4.0;
            for c in [&mut *r, &mut *g, &mut *b] {
                *c = ((*c * levels).floor() / levels).min(1.0);
            }
        }

        FilmFilter::Solarize => {
            for c in [&mut *r, &mut *g, &mut *b] {
                if *c > 0.5 {
                    *c = 1.0 - *c;
                }
            }
        }
    }
}

/// Smoothstep function for vignette
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
