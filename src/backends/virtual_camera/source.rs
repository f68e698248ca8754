// SPDX-License-Identifier: MPL-2.0

//! Synthetic scene for the virtual camera
//!
//! Renders a gradient scene whose brightness follows the simulated light
//! gathered by the sensor (exposure time × ISO), with per-frame sensor noise
//! so averaging many frames visibly smooths the result.

/// Exposure that maps the scene to its nominal brightness (1/30 s at ISO 100)
const REFERENCE_EXPOSURE: f64 = (1.0 / 30.0) * 100.0;

/// Noise amplitude in 8-bit levels
const NOISE_AMPLITUDE: f32 = 24.0;

/// Relative light gathered for an exposure time (seconds) and ISO
pub fn exposure_gain(exposure_secs: f64, iso: f32) -> f32 {
    ((exposure_secs * iso as f64) / REFERENCE_EXPOSURE) as f32
}

/// Render one RGBA frame of the synthetic scene
///
/// `sequence` seeds the noise so consecutive frames differ while a given
/// sequence number always renders the same pixels.
pub fn render_frame(width: u32, height: u32, sequence: u64, gain: f32) -> Vec<u8> {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    // Dark scene: a well exposed pixel needs several times the reference light
    let scene_scale = 0.15 * gain;

    for y in 0..height {
        let fy = y as f32 / height.max(1) as f32;
        for x in 0..width {
            let fx = x as f32 / width.max(1) as f32;

            let base_r = 40.0 + 180.0 * fx;
            let base_g = 60.0 + 140.0 * fy;
            let base_b = 200.0 - 120.0 * fx * fy;

            let noise = (hash(x, y, sequence) - 0.5) * 2.0 * NOISE_AMPLITUDE;

            data.push(to_u8(base_r * scene_scale + noise));
            data.push(to_u8(base_g * scene_scale + noise));
            data.push(to_u8(base_b * scene_scale + noise));
            data.push(255);
        }
    }

    data
}

#[inline]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Pseudo-random value in [0, 1) for a pixel and frame
#[inline]
fn hash(x: u32, y: u32, sequence: u64) -> f32 {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ sequence.wrapping_mul(0x1656_67B1_9E37_79F9);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    (h >> 40) as f32 / (1u64 << 24) as f32
}
