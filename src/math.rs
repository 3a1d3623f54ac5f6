//! Scalar helpers shared by the per-frame updaters.

use glam::Vec3;

/// Reference frame rate the per-call smoothing factors were tuned at.
pub const REFERENCE_FPS: f32 = 60.0;

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rescale a per-frame smoothing factor tuned at 60 fps to an arbitrary delta,
/// so that `n` small steps converge like one step of the same total length.
#[inline]
pub fn frame_factor(factor: f32, delta_seconds: f32) -> f32 {
    let frames = (delta_seconds * REFERENCE_FPS).max(0.0);
    1.0 - (1.0 - factor.clamp(0.0, 1.0)).powf(frames)
}

/// Exponential approach factor for a rate expressed per second.
#[inline]
pub fn damp_factor(rate: f32, delta_seconds: f32) -> f32 {
    1.0 - (-rate * delta_seconds.max(0.0)).exp()
}

/// Convert 0xRRGGBB into linear-ish RGB in [0, 1].
pub fn rgb_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_factor_matches_reference_rate() {
        let one_frame = frame_factor(0.06, 1.0 / 60.0);
        assert!((one_frame - 0.06).abs() < 1e-5);

        // Two half frames land where one full frame does
        let half = frame_factor(0.06, 1.0 / 120.0);
        let mut v = 0.0;
        v += (1.0 - v) * half;
        v += (1.0 - v) * half;
        assert!((v - one_frame).abs() < 1e-5);
    }

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(rgb_from_hex(0xff0000), Vec3::new(1.0, 0.0, 0.0));
        let c = rgb_from_hex(0x336699);
        assert!((c.y - 0.4).abs() < 1e-6);
    }
}
