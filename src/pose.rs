//! Pose controller
//!
//! Runs once per frame on whichever model is visible. Head tracking follows
//! the pointer with exponential smoothing; the emotion adds a tilt/turn bias
//! and a vertical bob.

use glam::Vec2;

use crate::config::PoseConfig;
use crate::emotion::EmotionState;
use crate::math::{frame_factor, lerp};
use crate::scene::Model;

/// Emotion-driven pose, eased toward the active emotion every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseTargets {
    pub tilt: f32,
    pub turn: f32,
    pub bob: f32,
}

#[derive(Debug)]
pub struct PoseController {
    config: PoseConfig,
    /// Raw pointer influence (x = turn, y = tilt)
    pointer_target: Vec2,
    /// Smoothed and clamped pointer influence
    influence: Vec2,
    targets: PoseTargets,
    elapsed: f32,
}

impl PoseController {
    pub fn new(config: PoseConfig) -> Self {
        Self {
            config,
            pointer_target: Vec2::ZERO,
            influence: Vec2::ZERO,
            targets: PoseTargets::default(),
            elapsed: 0.0,
        }
    }

    /// Pointer position normalized to the viewport, (0, 0) top-left.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        self.pointer_target = Vec2::new(
            (x - 0.5) * 2.0 * self.config.pointer_turn_range,
            (y - 0.5) * 2.0 * self.config.pointer_tilt_range,
        );
    }

    pub fn influence(&self) -> Vec2 {
        self.influence
    }

    pub fn targets(&self) -> PoseTargets {
        self.targets
    }

    /// Advance smoothing and write the pose into `model`, if any.
    pub fn update(&mut self, delta: f32, emotion: &EmotionState, model: Option<&mut Model>) {
        let cfg = &self.config;
        self.elapsed += delta;

        let smoothing = frame_factor(cfg.pointer_smoothing, delta);
        self.influence += (self.pointer_target - self.influence) * smoothing;
        self.influence.x = self
            .influence
            .x
            .clamp(-cfg.max_pointer_turn, cfg.max_pointer_turn);
        self.influence.y = self
            .influence
            .y
            .clamp(-cfg.max_pointer_tilt, cfg.max_pointer_tilt);

        let ease = frame_factor(cfg.target_lerp, delta);
        self.targets.tilt = lerp(self.targets.tilt, emotion.pose_tilt, ease);
        self.targets.turn = lerp(self.targets.turn, emotion.pose_turn, ease);
        self.targets.bob = lerp(self.targets.bob, emotion.pose_bob, ease);

        let Some(model) = model else {
            return;
        };

        let desired_turn = self.targets.turn + self.influence.x;
        let desired_tilt = self.targets.tilt + self.influence.y;
        let follow = frame_factor(cfg.rotation_lerp, delta);
        let rotation = &mut model.transform.rotation;
        rotation.y = lerp(rotation.y, cfg.base_rotation + desired_turn, follow);
        rotation.x = lerp(rotation.x, desired_tilt, follow);

        // Set directly; lerping position alongside rotation drifts
        model.transform.position.y =
            model.anchor.y + (self.elapsed * cfg.bob_frequency).sin() * self.targets.bob;
    }
}
