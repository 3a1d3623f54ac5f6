//! External animation runner
//!
//! Owns the current playback session and the transient external model it
//! mounted. The base model and the external model are swapped in one call so
//! no frame ever sees both or neither.

use std::sync::Arc;

use super::{CompletionCallback, PlayOptions, PlayOrigin, PlaybackOutcome, RenderState, RequestId};
use crate::anim::{ActionId, AnimationClip, AnimationMixer, MixerEvent, PlaySettings};
use crate::config::ModelTransform;
use crate::emotion::Emotion;
use crate::scene::{ModelId, Scene, SceneTemplate};
use crate::schedule::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the asset
    Loading,
    Playing { action: ActionId },
    /// Finished but its model is still held (talking loop gap)
    Completed,
}

/// One `play_external` request.
pub struct PlaybackSession {
    pub request: RequestId,
    pub key: String,
    pub fallback: Emotion,
    pub origin: PlayOrigin,
    pub clip: Option<String>,
    pub phase: SessionPhase,
    pub backstop: Option<TimerId>,
    on_complete: Option<CompletionCallback>,
}

impl PlaybackSession {
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// Invoke the completion callback, at most once.
    pub fn notify(&mut self, outcome: PlaybackOutcome) {
        if let Some(callback) = self.on_complete.take() {
            callback(outcome);
        }
    }

    /// Drop the callback without calling it.
    pub fn cancel(&mut self) {
        self.on_complete = None;
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("request", &self.request)
            .field("key", &self.key)
            .field("fallback", &self.fallback)
            .field("origin", &self.origin)
            .field("phase", &self.phase)
            .finish()
    }
}

/// The external model currently in the scene and its private mixer.
#[derive(Debug)]
pub struct MountedExternal {
    pub model: ModelId,
    pub mixer: AnimationMixer,
    pub key: String,
    pub family: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExternalRunner {
    next_request: u64,
    session: Option<PlaybackSession>,
    mounted: Option<MountedExternal>,
}

impl ExternalRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session. Returns its id and the session it replaced.
    pub fn begin(
        &mut self,
        key: &str,
        fallback: Emotion,
        origin: PlayOrigin,
        options: PlayOptions,
    ) -> (RequestId, Option<PlaybackSession>) {
        self.next_request += 1;
        let request = RequestId(self.next_request);
        let previous = self.session.replace(PlaybackSession {
            request,
            key: key.to_string(),
            fallback,
            origin,
            clip: options.clip,
            phase: SessionPhase::Loading,
            backstop: None,
            on_complete: options.on_complete,
        });
        (request, previous)
    }

    pub fn is_current(&self, request: RequestId) -> bool {
        self.session.as_ref().is_some_and(|s| s.request == request)
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut PlaybackSession> {
        self.session.as_mut()
    }

    pub fn take_session(&mut self) -> Option<PlaybackSession> {
        self.session.take()
    }

    pub fn mounted(&self) -> Option<&MountedExternal> {
        self.mounted.as_ref()
    }

    /// Whether a clip of `family` can be replayed on the mounted model.
    pub fn can_reuse(&self, family: Option<&str>) -> bool {
        match (family, &self.mounted) {
            (Some(family), Some(mounted)) => mounted.family.as_deref() == Some(family),
            _ => false,
        }
    }

    pub fn render_state(&self) -> RenderState {
        match (&self.session, &self.mounted) {
            (Some(session), _) if session.is_loading() => RenderState::ExternalLoading,
            (_, Some(_)) => RenderState::ExternalVisible,
            _ => RenderState::BaseVisible,
        }
    }

    /// Mount a fresh instance of `template` playing `clip`, replacing any
    /// held external model, and hide the base model.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_in(
        &mut self,
        scene: &mut Scene,
        base: ModelId,
        template: &SceneTemplate,
        key: &str,
        family: Option<String>,
        transform: ModelTransform,
        clip: Arc<AnimationClip>,
    ) -> ActionId {
        let mut model = scene.instantiate(template, key);
        model.place(transform);

        let mut mixer = AnimationMixer::new();
        let action = mixer.play(clip, PlaySettings::one_shot(0.0));
        // First frame is posed before it is ever shown
        mixer.apply(&mut model.skeleton);

        if let Some(old) = self.mounted.take() {
            scene.remove_and_dispose(old.model);
        }
        let id = scene.add(model);
        scene.set_visible(base, false);

        log::info!("External `{}` mounted as {:?}", key, id);
        self.mounted = Some(MountedExternal {
            model: id,
            mixer,
            key: key.to_string(),
            family,
        });
        action
    }

    /// Play `clip` on the already mounted model.
    pub fn replay(&mut self, key: &str, clip: Arc<AnimationClip>) -> Option<ActionId> {
        let mounted = self.mounted.as_mut()?;
        mounted.mixer.stop_all_action();
        mounted.key = key.to_string();
        log::debug!("Replaying `{}` on mounted {:?}", clip.name, mounted.model);
        Some(mounted.mixer.play(clip, PlaySettings::one_shot(0.0)))
    }

    /// Stop and dispose the external model, then show the base model.
    pub fn unmount(&mut self, scene: &mut Scene, base: Option<ModelId>) {
        if let Some(mut mounted) = self.mounted.take() {
            mounted.mixer.stop_all_action();
            scene.remove_and_dispose(mounted.model);
        }
        if let Some(base) = base {
            scene.set_visible(base, true);
        }
    }

    /// Advance the mounted model's mixer.
    pub fn update(&mut self, delta: f32, scene: &mut Scene) -> Vec<MixerEvent> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Vec::new();
        };
        let Some(model) = scene.get_mut(mounted.model) else {
            return Vec::new();
        };
        let events = mounted.mixer.update(delta);
        mounted.mixer.apply(&mut model.skeleton);
        events
    }
}
