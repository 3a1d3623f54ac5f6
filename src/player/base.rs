use std::sync::Arc;

use crate::anim::{AnimationClip, AnimationMixer, PlaySettings};
use crate::emotion::EmotionState;
use crate::error::ClipResolutionMiss;
use crate::scene::{ModelId, Scene};

/// Find `wanted` in `clips`: exact name, then case-insensitive name, then
/// case-insensitive substring.
pub fn resolve_clip<'a>(
    clips: &'a [Arc<AnimationClip>],
    wanted: &str,
) -> Result<&'a Arc<AnimationClip>, ClipResolutionMiss> {
    let lower = wanted.to_lowercase();
    clips
        .iter()
        .find(|c| c.name == wanted)
        .or_else(|| clips.iter().find(|c| c.name.eq_ignore_ascii_case(wanted)))
        .or_else(|| {
            clips
                .iter()
                .find(|c| c.name.to_lowercase().contains(&lower))
        })
        .ok_or_else(|| ClipResolutionMiss {
            wanted: wanted.to_string(),
            available: clips.iter().map(|c| c.name.clone()).collect(),
        })
}

/// Plays emotion clips on the persistent avatar.
#[derive(Debug)]
pub struct BasePlayer {
    model: ModelId,
    mixer: AnimationMixer,
    clips: Vec<Arc<AnimationClip>>,
    fade_in: f32,
    current_clip: Option<String>,
}

impl BasePlayer {
    pub fn new(model: ModelId, clips: Vec<Arc<AnimationClip>>, fade_in: f32) -> Self {
        Self {
            model,
            mixer: AnimationMixer::new(),
            clips,
            fade_in,
            current_clip: None,
        }
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current_clip.as_deref()
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Switch to the emotion's base clip.
    ///
    /// On a miss nothing is stopped, so the avatar keeps its current motion.
    pub fn play_emotion(&mut self, state: &EmotionState) -> Result<(), ClipResolutionMiss> {
        let clip = Arc::clone(resolve_clip(&self.clips, state.base_clip)?);
        let settings = if state.one_shot {
            PlaySettings::one_shot(self.fade_in)
        } else {
            PlaySettings::looping(self.fade_in)
        };

        self.mixer.stop_all_action();
        log::debug!("Base clip `{}` for {}", clip.name, state.label);
        self.current_clip = Some(clip.name.clone());
        self.mixer.play(clip, settings);
        Ok(())
    }

    /// Advance the mixer, but only while the base model is on screen.
    pub fn update(&mut self, delta: f32, scene: &mut Scene) {
        let Some(model) = scene.get_mut(self.model) else {
            return;
        };
        if !model.visible {
            return;
        }
        self.mixer.update(delta);
        self.mixer.apply(&mut model.skeleton);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::fixtures;
    use crate::emotion::Emotion;
    use wasm_bindgen_test::*;

    fn clips(names: &[&str]) -> Vec<Arc<AnimationClip>> {
        names
            .iter()
            .map(|n| Arc::new(AnimationClip::new(*n, vec![])))
            .collect()
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_resolution_order() {
        let set = clips(&["idle_loop", "IDLE", "Idle"]);
        assert_eq!(resolve_clip(&set, "Idle").unwrap().name, "Idle");
        assert_eq!(resolve_clip(&set, "idle").unwrap().name, "IDLE");

        let set = clips(&["Armature|Happy Dance", "Sad"]);
        assert_eq!(
            resolve_clip(&set, "happy").unwrap().name,
            "Armature|Happy Dance"
        );

        let miss = resolve_clip(&set, "Thinking").unwrap_err();
        assert_eq!(miss.available.len(), 2);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_miss_keeps_current_clip() {
        let mut scene = Scene::new();
        let asset = fixtures::base_asset();
        let model = scene.instantiate(&asset.scene, "base");
        let id = scene.add(model);

        let mut player = BasePlayer::new(id, clips(&["Idle"]), 0.2);
        player.play_emotion(Emotion::Neutral.state()).unwrap();
        assert!(player.play_emotion(Emotion::Sad.state()).is_err());
        assert_eq!(player.current_clip(), Some("Idle"));
        assert!(player.mixer().is_active());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_one_shot_emotions_do_not_loop() {
        let mut scene = Scene::new();
        let asset = fixtures::base_asset();
        let model = scene.instantiate(&asset.scene, "base");
        let id = scene.add(model);

        let mut player = BasePlayer::new(id, asset.clips.clone(), 0.2);
        player.play_emotion(Emotion::Hi.state()).unwrap();
        for _ in 0..300 {
            player.update(1.0 / 60.0, &mut scene);
        }
        let action = &player.mixer().actions()[0];
        assert!(action.is_finished());

        player.play_emotion(Emotion::Happy.state()).unwrap();
        for _ in 0..300 {
            player.update(1.0 / 60.0, &mut scene);
        }
        assert_eq!(player.mixer().actions().len(), 1);
        assert!(!player.mixer().actions()[0].is_finished());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_hidden_base_does_not_advance() {
        let mut scene = Scene::new();
        let asset = fixtures::base_asset();
        let model = scene.instantiate(&asset.scene, "base");
        let id = scene.add(model);
        let mut player = BasePlayer::new(id, asset.clips.clone(), 0.0);
        player.play_emotion(Emotion::Neutral.state()).unwrap();

        scene.set_visible(id, false);
        player.update(0.5, &mut scene);
        assert_eq!(player.mixer().actions()[0].time(), 0.0);
    }
}
