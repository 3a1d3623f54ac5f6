//! Avatar controller
//!
//! One instance per avatar. Owns the scene, both players, the schedulers and
//! a virtual clock. The host drives it:
//!
//! 1. call [`AvatarController::tick`] once per rendered frame,
//! 2. fetch whatever [`AvatarController::take_load_requests`] returns and hand
//!    the result to [`AvatarController::complete_load`],
//! 3. forward speech engine events to [`AvatarController::on_speech_event`],
//! 4. drain [`AvatarController::take_events`] for UI callbacks.
//!
//! Every asynchronous continuation (load result, timer, speech event) is
//! checked against the current request id, loop generation or utterance id
//! before it touches any state, so results may arrive in any order.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use glam::Mat4;
use url::Url;

use crate::anim::{MixerEvent, TrackFilter};
use crate::asset::{AssetManifest, ClipCache, LoadedAsset};
use crate::camera::Camera;
use crate::config::AvatarConfig;
use crate::emotion::Emotion;
use crate::error::{
    AssetLoadError, AvatarError, CapabilityUnavailable, ClipResolutionMiss, ConfigError,
};
use crate::lighting::{LightRig, LightUniform, Lighting};
use crate::player::{
    resolve_clip, BasePlayer, ExternalRunner, PlayOptions, PlayOrigin, PlaybackOutcome,
    PlaybackSession, RenderState, RequestId, SessionPhase,
};
use crate::pose::PoseController;
use crate::scene::{ModelId, Scene};
use crate::schedule::{GapStep, InactivityScheduler, LoopStep, TalkingLoop, Timer, TimerQueue};
use crate::speech::{
    SpeechCoordinator, SpeechEngine, SpeechEvent, SpeechTransition, UtteranceId, Voice,
    VoiceOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Base,
    External,
}

/// A GLB the host should fetch and pass back through `complete_load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub key: String,
    pub url: String,
    pub kind: LoadKind,
}

/// Notifications for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum AvatarEvent {
    LoadingProgress {
        key: String,
        percent: f32,
        stage: String,
    },
    ModelLoaded {
        key: String,
    },
    /// Only failures the core cannot recover from itself
    Error(AvatarError),
    PlaybackStarted {
        request: RequestId,
        key: String,
    },
    PlaybackFinished {
        request: RequestId,
        key: String,
        outcome: PlaybackOutcome,
    },
    EmotionChanged(Emotion),
}

/// What the renderer needs for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub render_state: RenderState,
    pub visible_model: Option<ModelId>,
    pub emotion: Emotion,
    pub lights: LightRig,
    pub light_uniform: LightUniform,
    pub view: Mat4,
    pub projection: Mat4,
}

pub struct AvatarController {
    config: AvatarConfig,
    manifest: AssetManifest,
    base_url: Url,
    filter: TrackFilter,

    scene: Scene,
    cache: ClipCache,
    base: Option<BasePlayer>,
    base_loading: bool,
    external: ExternalRunner,

    talking: TalkingLoop,
    inactivity: InactivityScheduler,
    speech: SpeechCoordinator,
    timers: TimerQueue<Timer>,

    pose: PoseController,
    lighting: Lighting,
    rig: LightRig,
    camera: Camera,

    emotion: Emotion,
    frame: u64,
    load_requests: Vec<LoadRequest>,
    events: Vec<AvatarEvent>,
}

impl AvatarController {
    /// Controller using the embedded asset manifest.
    pub fn new(config: AvatarConfig) -> Result<Self, ConfigError> {
        Self::with_manifest(config, AssetManifest::embedded()?)
    }

    pub fn with_manifest(
        config: AvatarConfig,
        manifest: AssetManifest,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let filter = TrackFilter::new(&config.filter)?;
        let base_url = config.assets.base_url()?;

        let emotion = Emotion::default();
        let mut lighting = Lighting::new(config.lighting.clone(), emotion.state());
        let rig = lighting.update(0.0, emotion.state(), false);

        Ok(Self {
            manifest,
            base_url,
            filter,
            scene: Scene::new(),
            cache: ClipCache::new(),
            base: None,
            base_loading: false,
            external: ExternalRunner::new(),
            talking: TalkingLoop::new(config.talking_keys.clone()),
            inactivity: InactivityScheduler::new(config.timing.inactivity_ms),
            speech: SpeechCoordinator::new(config.speech.clone(), config.timing.speech_settle_ms),
            timers: TimerQueue::new(),
            pose: PoseController::new(config.pose.clone()),
            lighting,
            rig,
            camera: Camera::default(),
            emotion,
            frame: 0,
            load_requests: Vec::new(),
            events: Vec::new(),
            config,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn cache(&self) -> &ClipCache {
        &self.cache
    }

    pub fn external(&self) -> &ExternalRunner {
        &self.external
    }

    pub fn talking_loop(&self) -> &TalkingLoop {
        &self.talking
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn current_emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn render_state(&self) -> RenderState {
        self.external.render_state()
    }

    pub fn base_model(&self) -> Option<ModelId> {
        self.base.as_ref().map(BasePlayer::model)
    }

    pub fn is_base_loaded(&self) -> bool {
        self.base.is_some()
    }

    /// Speech or the talking loop is driving the avatar.
    pub fn is_talking(&self) -> bool {
        self.talking.is_active() || self.speech.is_speaking()
    }

    /// The model the pose controller writes to this frame.
    pub fn visible_model(&self) -> Option<ModelId> {
        match self.external.mounted() {
            Some(mounted) => Some(mounted.model),
            None => self.base_model(),
        }
    }

    /// Virtual clock in milliseconds since the controller was created.
    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            render_state: self.render_state(),
            visible_model: self.visible_model(),
            emotion: self.emotion,
            lights: self.rig,
            light_uniform: self.rig.into(),
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(),
        }
    }

    pub fn take_events(&mut self) -> Vec<AvatarEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.load_requests)
    }

    fn push_event(&mut self, event: AvatarEvent) {
        self.events.push(event);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Request the base avatar. No-op once it is loaded or in flight.
    pub fn load_base(&mut self) {
        if self.base.is_some() || self.base_loading {
            return;
        }
        let key = self.config.assets.base_model_key.clone();
        match self.manifest.url(&self.base_url, &key) {
            Ok(url) => {
                log::info!("Loading base avatar from {}", url);
                self.base_loading = true;
                self.push_event(AvatarEvent::LoadingProgress {
                    key: key.clone(),
                    percent: 0.0,
                    stage: "Downloading avatar".to_string(),
                });
                self.load_requests.push(LoadRequest {
                    key,
                    url: url.into(),
                    kind: LoadKind::Base,
                });
            }
            Err(err) => self.fail_base(err),
        }
    }

    /// Byte progress of an outstanding load.
    pub fn report_progress(&mut self, key: &str, loaded: u64, total: Option<u64>) {
        let percent = match total {
            Some(total) if total > 0 => (loaded as f64 / total as f64 * 100.0).min(100.0) as f32,
            _ => 0.0,
        };
        let stage = if key == self.config.assets.base_model_key {
            "Downloading avatar".to_string()
        } else {
            format!("Downloading {key}")
        };
        self.push_event(AvatarEvent::LoadingProgress {
            key: key.to_string(),
            percent,
            stage,
        });
    }

    /// No 3D context could be created; the host should show its fallback.
    pub fn report_capability_unavailable(&mut self, reason: &str) {
        log::error!("3D rendering unavailable: {}", reason);
        self.push_event(AvatarEvent::Error(
            CapabilityUnavailable(reason.to_string()).into(),
        ));
    }

    /// Deliver the result of a [`LoadRequest`].
    pub fn complete_load(&mut self, key: &str, result: Result<LoadedAsset, AssetLoadError>) {
        if self.base_loading && key == self.config.assets.base_model_key {
            self.base_loading = false;
            match result {
                Ok(asset) => self.mount_base(asset),
                Err(err) => self.fail_base(err),
            }
            return;
        }

        let asset = match result {
            Ok(asset) => Ok(self.cache.put(key, asset)),
            Err(err) => {
                self.cache.abandon(key);
                Err(err)
            }
        };

        let waiting = self
            .external
            .session()
            .is_some_and(|s| s.is_loading() && s.key == key);
        if !waiting {
            log::debug!("Load of `{}` arrived for a superseded request", key);
            return;
        }

        match asset {
            Ok(asset) => self.mount_session(asset),
            Err(err) => {
                log::warn!("External `{}` failed to load: {}", key, err);
                self.finish_session(PlaybackOutcome::LoadFailed(err), None);
            }
        }
    }

    fn mount_base(&mut self, asset: LoadedAsset) {
        let mut model = self.scene.instantiate(&asset.scene, asset.key.as_str());
        model.place(self.config.base_transform);
        let id = self.scene.add(model);

        let mut base = BasePlayer::new(id, asset.clips, self.config.timing.base_fade_in_seconds);
        if let Err(miss) = base.play_emotion(self.emotion.state()) {
            log::warn!("{}", miss);
        }
        self.base = Some(base);
        log::info!("Base avatar `{}` ready as {:?}", asset.key, id);

        self.push_event(AvatarEvent::LoadingProgress {
            key: asset.key.clone(),
            percent: 100.0,
            stage: "Ready".to_string(),
        });
        self.push_event(AvatarEvent::ModelLoaded { key: asset.key });
        self.inactivity.reset(&mut self.timers);
    }

    fn fail_base(&mut self, err: AssetLoadError) {
        log::error!("Base avatar failed to load: {}", err);
        self.push_event(AvatarEvent::Error(err.into()));
    }

    // ========================================================================
    // Emotion
    // ========================================================================

    /// Switch the base animation; unknown ids fall back to neutral.
    pub fn set_emotion(&mut self, id: &str) {
        self.apply_emotion(Emotion::parse(id));
    }

    fn apply_emotion(&mut self, emotion: Emotion) {
        let changed = emotion != self.emotion;
        self.emotion = emotion;
        if let Some(base) = self.base.as_mut() {
            if let Err(miss) = base.play_emotion(emotion.state()) {
                log::warn!("{}", miss);
            }
        }
        if changed {
            self.push_event(AvatarEvent::EmotionChanged(emotion));
        }
    }

    /// Emotion to come back to after talking.
    fn resting_emotion(&self) -> Emotion {
        match self.emotion {
            Emotion::Talking => Emotion::Neutral,
            other => other,
        }
    }

    // ========================================================================
    // External playback
    // ========================================================================

    /// Play a one-shot external animation, superseding any current one.
    ///
    /// Interrupts the talking loop: the loop cannot continue once its
    /// session is replaced.
    pub fn play_external(
        &mut self,
        key: &str,
        fallback: Emotion,
        options: PlayOptions,
    ) -> RequestId {
        if self.talking.is_active() {
            log::info!("Playback of `{}` interrupts the talking loop", key);
            self.talking.stop();
        }
        self.play(key, fallback, options, PlayOrigin::Host)
    }

    fn play(
        &mut self,
        key: &str,
        fallback: Emotion,
        options: PlayOptions,
        origin: PlayOrigin,
    ) -> RequestId {
        let (request, previous) = self.external.begin(key, fallback, origin, options);
        if let Some(previous) = previous {
            self.retire(previous);
        }
        log::info!("Playing `{}` as {:?} ({:?})", key, request, origin);

        if self.base.is_none() {
            log::warn!("Cannot play `{}` before the base avatar is loaded", key);
            self.finish_session(PlaybackOutcome::BaseNotLoaded, None);
            return request;
        }

        if let Some(asset) = self.cache.get(key) {
            self.mount_session(asset);
        } else if self.cache.begin_load(key) {
            match self.manifest.url(&self.base_url, key) {
                Ok(url) => self.load_requests.push(LoadRequest {
                    key: key.to_string(),
                    url: url.into(),
                    kind: LoadKind::External,
                }),
                Err(err) => {
                    self.cache.abandon(key);
                    self.finish_session(PlaybackOutcome::LoadFailed(err), None);
                }
            }
        } else {
            log::debug!("`{}` is already loading", key);
        }
        request
    }

    /// A newer request replaced `session`. Its model stays mounted until the
    /// replacement is ready.
    fn retire(&mut self, mut session: PlaybackSession) {
        if let Some(timer) = session.backstop.take() {
            self.timers.cancel(timer);
        }
        let outcome = if session.is_completed() {
            PlaybackOutcome::Completed
        } else {
            PlaybackOutcome::Superseded
        };
        log::debug!("{:?} `{}` retired ({})", session.request, session.key, outcome.label());

        if outcome == PlaybackOutcome::Completed {
            session.notify(outcome.clone());
        } else {
            session.cancel();
        }
        self.push_event(AvatarEvent::PlaybackFinished {
            request: session.request,
            key: session.key,
            outcome,
        });
    }

    /// Snap the current session's asset onto the screen.
    fn mount_session(&mut self, asset: Arc<LoadedAsset>) {
        let Some(session) = self.external.session() else {
            return;
        };
        let request = session.request;
        let key = session.key.clone();

        let raw = match session.clip.as_deref() {
            Some(name) => resolve_clip(&asset.clips, name).map(Arc::clone),
            None => asset.clip(None).cloned().ok_or_else(|| ClipResolutionMiss {
                wanted: key.clone(),
                available: asset.clip_names(),
            }),
        };
        let raw = match raw {
            Ok(clip) => clip,
            Err(miss) => {
                log::warn!("{}", miss);
                self.finish_session(PlaybackOutcome::ClipMissing(miss), None);
                return;
            }
        };
        let Some(base) = self.base_model() else {
            self.finish_session(PlaybackOutcome::BaseNotLoaded, None);
            return;
        };

        let clip = Arc::new(self.filter.filter(&raw));
        let duration = clip.duration;
        let family = self.manifest.family(&key).map(str::to_string);

        let reuse = self.config.reuse_same_family && self.external.can_reuse(family.as_deref());
        let replayed = if reuse {
            self.external.replay(&key, Arc::clone(&clip))
        } else {
            None
        };
        let action = match replayed {
            Some(action) => action,
            None => self.external.swap_in(
                &mut self.scene,
                base,
                &asset.scene,
                &key,
                family,
                self.config.external_transform,
                clip,
            ),
        };

        let clip_ms = (f64::from(duration.max(0.0)) * 1000.0)
            .ceil()
            .min(f64::from(u32::MAX)) as u32;
        let backstop_ms = clip_ms.saturating_add(self.config.timing.safety_buffer_ms);
        let backstop = self.timers.schedule(backstop_ms, Timer::Backstop { request });
        if let Some(session) = self.external.session_mut() {
            session.phase = SessionPhase::Playing { action };
            session.backstop = Some(backstop);
        }
        self.push_event(AvatarEvent::PlaybackStarted { request, key });
    }

    /// The current clip ended, by mixer event or backstop, whichever came first.
    fn complete_current(&mut self) {
        let Some(session) = self.external.session_mut() else {
            return;
        };
        if !matches!(session.phase, SessionPhase::Playing { .. }) {
            return;
        }
        session.phase = SessionPhase::Completed;
        let backstop = session.backstop.take();
        let origin = session.origin;
        let request = session.request;
        if let Some(timer) = backstop {
            self.timers.cancel(timer);
        }
        log::debug!("{:?} completed", request);

        if let PlayOrigin::TalkingLoop { generation } = origin {
            if generation == self.talking.generation() {
                match self.talking.on_complete() {
                    LoopStep::Continue { generation } => {
                        let gap = self.config.timing.talking_gap_ms;
                        self.timers.schedule(gap, Timer::TalkingGap { generation });
                    }
                    LoopStep::Finish(fallback) => {
                        self.finish_session(PlaybackOutcome::Completed, Some(fallback));
                    }
                }
                return;
            }
        }
        self.finish_session(PlaybackOutcome::Completed, None);
    }

    /// Tear down the current session and return to the base avatar.
    fn finish_session(&mut self, outcome: PlaybackOutcome, fallback: Option<Emotion>) {
        let Some(mut session) = self.external.take_session() else {
            return;
        };
        if let Some(timer) = session.backstop.take() {
            self.timers.cancel(timer);
        }
        if let PlayOrigin::TalkingLoop { generation } = session.origin {
            if outcome != PlaybackOutcome::Completed && generation == self.talking.generation() {
                log::warn!("Talking loop stopped: `{}` {}", session.key, outcome.label());
                self.talking.stop();
            }
        }

        let base = self.base_model();
        self.external.unmount(&mut self.scene, base);

        let fallback = fallback.unwrap_or(session.fallback);
        log::info!(
            "{:?} `{}` {}, back to base ({})",
            session.request,
            session.key,
            outcome.label(),
            fallback.as_str()
        );
        self.apply_emotion(fallback);

        self.push_event(AvatarEvent::PlaybackFinished {
            request: session.request,
            key: session.key.clone(),
            outcome: outcome.clone(),
        });
        session.notify(outcome);
    }

    // ========================================================================
    // Talking loop
    // ========================================================================

    /// Start cycling talking clips, returning to the current emotion after.
    pub fn start_talking_loop(&mut self) -> Option<RequestId> {
        let fallback = self.resting_emotion();
        self.start_talking_loop_with(fallback)
    }

    /// Start cycling talking clips. No-op while the loop is active.
    pub fn start_talking_loop_with(&mut self, fallback: Emotion) -> Option<RequestId> {
        let key = self.talking.start(fallback)?;
        let generation = self.talking.generation();
        Some(self.play(
            &key,
            fallback,
            PlayOptions::default(),
            PlayOrigin::TalkingLoop { generation },
        ))
    }

    /// Let the clip in flight finish, then return to the base avatar.
    pub fn stop_talking_loop(&mut self) {
        self.talking.stop();
    }

    /// Mirror of the host's `isTalking` input.
    pub fn set_talking(&mut self, talking: bool) {
        if talking {
            self.start_talking_loop();
        } else {
            self.stop_talking_loop();
        }
    }

    // ========================================================================
    // Speech
    // ========================================================================

    pub fn set_speech_engine(&mut self, engine: Option<Box<dyn SpeechEngine>>) {
        self.speech.set_engine(engine);
    }

    pub fn set_voice(&mut self, voice: VoiceOptions) {
        self.speech.set_voice(voice);
    }

    pub fn list_voices(&self) -> Vec<Voice> {
        self.speech.list_voices()
    }

    /// Speak `text`, then settle on `baseline`.
    pub fn speak(&mut self, text: &str, baseline: Emotion) -> UtteranceId {
        if self.speech.cancel(&mut self.timers) {
            self.talking.stop();
        }
        let (id, transition) = self.speech.speak(text, baseline, &mut self.timers);
        if let Some(transition) = transition {
            self.apply_speech(transition);
        }
        id
    }

    pub fn cancel_speech(&mut self) {
        if self.speech.cancel(&mut self.timers) {
            self.talking.stop();
        }
    }

    pub fn on_speech_event(&mut self, utterance: UtteranceId, event: SpeechEvent) {
        if let Some(transition) = self.speech.on_event(utterance, event, &mut self.timers) {
            self.apply_speech(transition);
        }
    }

    fn apply_speech(&mut self, transition: SpeechTransition) {
        match transition {
            SpeechTransition::Started { baseline } => {
                self.apply_emotion(Emotion::Talking);
                self.start_talking_loop_with(baseline);
            }
            SpeechTransition::Ended { baseline } => {
                self.talking.set_fallback(baseline);
                self.talking.stop();
            }
        }
    }

    // ========================================================================
    // Host input
    // ========================================================================

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pose.set_pointer(x, y);
    }

    /// Pointer down, key down or any explicit activity.
    pub fn notify_interaction(&mut self) {
        if self.base.is_some() {
            self.inactivity.reset(&mut self.timers);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Advance one rendered frame.
    pub fn tick(&mut self, delta_seconds: f32) {
        let delta = if delta_seconds.is_finite() {
            delta_seconds.clamp(0.0, self.config.timing.max_delta_seconds)
        } else {
            0.0
        };

        self.timers.advance(f64::from(delta) * 1000.0);
        while let Some((_, timer)) = self.timers.pop_due() {
            self.handle_timer(timer);
        }

        for event in self.external.update(delta, &mut self.scene) {
            let MixerEvent::Finished { action, .. } = event;
            let current = self
                .external
                .session()
                .is_some_and(|s| s.phase == SessionPhase::Playing { action });
            if current {
                self.complete_current();
            }
        }
        if let Some(base) = self.base.as_mut() {
            base.update(delta, &mut self.scene);
        }

        let model = self.visible_model().and_then(|id| self.scene.get_mut(id));
        self.pose.update(delta, self.emotion.state(), model);

        let talking = self.is_talking();
        self.rig = self.lighting.update(delta, self.emotion.state(), talking);
        self.frame += 1;
    }

    fn handle_timer(&mut self, timer: Timer) {
        match timer {
            Timer::Backstop { request } => {
                if self.external.is_current(request) {
                    log::debug!("Backstop fired for {:?}", request);
                    self.complete_current();
                }
            }
            Timer::TalkingGap { generation } => match self.talking.on_gap(generation) {
                GapStep::Play(key) => {
                    let fallback = self.talking.fallback();
                    self.play(
                        &key,
                        fallback,
                        PlayOptions::default(),
                        PlayOrigin::TalkingLoop { generation },
                    );
                }
                GapStep::Finish(fallback) => {
                    let held = self.external.session().is_some_and(|s| {
                        s.is_completed() && s.origin == PlayOrigin::TalkingLoop { generation }
                    });
                    if held {
                        self.finish_session(PlaybackOutcome::Completed, Some(fallback));
                    }
                }
                GapStep::Stale => {}
            },
            Timer::SpeechEnd { utterance } => {
                if let Some(transition) = self.speech.on_end_timer(utterance, &mut self.timers) {
                    self.apply_speech(transition);
                }
            }
            Timer::SpeechSettle { utterance } => {
                if let Some(baseline) = self.speech.on_settle(utterance) {
                    self.apply_emotion(baseline);
                }
            }
            Timer::Inactivity { generation } => {
                if !self.inactivity.fire(generation) {
                    return;
                }
                let idle = self.base.is_some()
                    && !self.talking.is_active()
                    && !self.speech.is_speaking()
                    && self.render_state() == RenderState::BaseVisible;
                if idle {
                    let key = self.config.rest_key.clone();
                    let fallback = self.emotion;
                    log::info!("Idle timeout, playing `{}`", key);
                    self.play(&key, fallback, PlayOptions::default(), PlayOrigin::Rest);
                } else {
                    log::debug!("Idle timeout while busy, rescheduling");
                }
                self.inactivity.reset(&mut self.timers);
            }
        }
    }
}

impl std::fmt::Debug for AvatarController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarController")
            .field("render_state", &self.render_state())
            .field("emotion", &self.emotion)
            .field("session", &self.external.session())
            .field("talking", &self.talking)
            .field("speech", &self.speech)
            .field("frame", &self.frame)
            .finish()
    }
}
