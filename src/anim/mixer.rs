//! Animation mixer
//!
//! Plays clip actions against one skeleton. Each mounted model owns its own
//! mixer; nothing here is shared between models.

use std::sync::Arc;

use super::clip::AnimationClip;
use crate::scene::Skeleton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    Once,
    #[default]
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaySettings {
    pub loop_mode: LoopMode,
    /// Hold the last frame after a `Once` action ends
    pub clamp_when_finished: bool,
    /// Seconds to ramp the weight from 0 to 1
    pub fade_in: f32,
    pub time_scale: f32,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            loop_mode: LoopMode::Repeat,
            clamp_when_finished: false,
            fade_in: 0.0,
            time_scale: 1.0,
        }
    }
}

impl PlaySettings {
    /// Loop forever with a fade-in.
    pub fn looping(fade_in: f32) -> Self {
        Self {
            fade_in,
            ..Self::default()
        }
    }

    /// Play once and hold the final pose.
    pub fn one_shot(fade_in: f32) -> Self {
        Self {
            loop_mode: LoopMode::Once,
            clamp_when_finished: true,
            fade_in,
            ..Self::default()
        }
    }
}

/// A clip scheduled on a mixer.
#[derive(Debug, Clone)]
pub struct ClipAction {
    id: ActionId,
    clip: Arc<AnimationClip>,
    settings: PlaySettings,
    time: f32,
    fade_elapsed: f32,
    /// Time advances only while running
    running: bool,
    /// Contributes to the pose
    enabled: bool,
    finished: bool,
}

impl ClipAction {
    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn weight(&self) -> f32 {
        if self.settings.fade_in <= 0.0 {
            1.0
        } else {
            (self.fade_elapsed / self.settings.fade_in).min(1.0)
        }
    }

    fn sample_time(&self) -> f32 {
        match self.settings.loop_mode {
            LoopMode::Repeat if self.clip.duration > 0.0 => {
                self.time.rem_euclid(self.clip.duration)
            }
            _ => self.time.min(self.clip.duration),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MixerEvent {
    /// A `Once` action reached the end of its clip
    Finished { action: ActionId, clip: String },
}

#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<ClipAction>,
    next_id: u64,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `clip` and start it immediately.
    pub fn play(&mut self, clip: Arc<AnimationClip>, settings: PlaySettings) -> ActionId {
        self.next_id += 1;
        let id = ActionId(self.next_id);
        self.actions.push(ClipAction {
            id,
            clip,
            settings,
            time: 0.0,
            fade_elapsed: 0.0,
            running: true,
            enabled: true,
            finished: false,
        });
        id
    }

    pub fn action(&self, id: ActionId) -> Option<&ClipAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    /// Rewind an action to its start and run it again.
    pub fn reset(&mut self, id: ActionId) -> bool {
        let Some(action) = self.actions.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        action.time = 0.0;
        action.fade_elapsed = 0.0;
        action.running = true;
        action.enabled = true;
        action.finished = false;
        true
    }

    pub fn stop(&mut self, id: ActionId) {
        self.actions.retain(|a| a.id != id);
    }

    pub fn stop_all_action(&mut self) {
        self.actions.clear();
    }

    /// Whether any action still contributes to the pose.
    pub fn is_active(&self) -> bool {
        self.actions.iter().any(|a| a.enabled)
    }

    /// Advance every running action by `delta` seconds.
    pub fn update(&mut self, delta: f32) -> Vec<MixerEvent> {
        let mut events = Vec::new();
        for action in self.actions.iter_mut().filter(|a| a.running) {
            action.fade_elapsed += delta;
            action.time += delta * action.settings.time_scale;

            if action.settings.loop_mode == LoopMode::Once && action.time >= action.clip.duration {
                action.time = action.clip.duration;
                action.running = false;
                action.finished = true;
                action.enabled = action.settings.clamp_when_finished;
                events.push(MixerEvent::Finished {
                    action: action.id,
                    clip: action.clip.name.clone(),
                });
            }
        }
        events
    }

    /// Write the mixed pose into `skeleton`, starting from its rest pose.
    pub fn apply(&self, skeleton: &mut Skeleton) {
        skeleton.reset_to_rest();
        for action in self.actions.iter().filter(|a| a.enabled) {
            let weight = action.weight();
            for (bone, channel, sample) in action.clip.sample(action.sample_time()) {
                skeleton.blend(bone, channel, sample, weight);
            }
        }
    }
}
