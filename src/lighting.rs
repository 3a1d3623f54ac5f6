//! Lighting system
//!
//! Key light follows the emotion colour and intensity. Talking overrides the
//! colour with an accent and pulses; idle breathes slowly.

use std::f32::consts::TAU;

use glam::Vec3;
use static_assertions::const_assert_eq;

use crate::config::LightingConfig;
use crate::emotion::EmotionState;
use crate::math::{damp_factor, rgb_from_hex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
}

/// Lights to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub key: Light,
    pub fill: Light,
}

/// GPU layout of [`LightRig`]: rgb + intensity per light.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub key: [f32; 4],
    pub fill: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<LightUniform>(), 32);

impl From<LightRig> for LightUniform {
    fn from(rig: LightRig) -> Self {
        Self {
            key: rig.key.color.extend(rig.key.intensity).to_array(),
            fill: rig.fill.color.extend(rig.fill.intensity).to_array(),
        }
    }
}

#[derive(Debug)]
pub struct Lighting {
    config: LightingConfig,
    /// Interpolated emotion colour
    color: Vec3,
    /// Interpolated emotion intensity, before pulse/breathing
    intensity: f32,
    elapsed: f32,
}

impl Lighting {
    pub fn new(config: LightingConfig, initial: &EmotionState) -> Self {
        Self {
            config,
            color: rgb_from_hex(initial.light_color),
            intensity: initial.light_intensity,
            elapsed: 0.0,
        }
    }

    pub fn base_intensity(&self) -> f32 {
        self.intensity
    }

    pub fn update(&mut self, delta: f32, target: &EmotionState, talking: bool) -> LightRig {
        let cfg = &self.config;
        self.elapsed += delta;

        let t = damp_factor(cfg.follow_rate, delta);
        self.color = self.color.lerp(rgb_from_hex(target.light_color), t);
        self.intensity += (target.light_intensity - self.intensity) * t;

        let (color, intensity) = if talking {
            let fast = (self.elapsed * cfg.pulse_fast_hz * TAU).sin();
            let slow = (self.elapsed * cfg.pulse_slow_hz * TAU).sin();
            let pulse = (fast + slow) * 0.5 * cfg.pulse_depth;
            (rgb_from_hex(cfg.talking_accent), self.intensity * (1.0 + pulse))
        } else {
            let breath = (self.elapsed * cfg.breathing_hz * TAU).sin() * cfg.breathing_depth;
            (self.color, self.intensity * (1.0 + breath))
        };

        LightRig {
            key: Light {
                color,
                intensity: intensity.max(0.0),
            },
            fill: Light {
                color,
                intensity: (intensity * cfg.fill_ratio).max(0.0),
            },
        }
    }
}
