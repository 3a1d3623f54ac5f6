//! Browser bindings
//!
//! [`App`] owns one [`AvatarController`] and performs everything the core
//! leaves to its host: fetching GLB files, driving the browser speech engine,
//! rendering and forwarding events to JS callbacks.
//!
//! The controller is only borrowed for the duration of a single call. JS
//! callbacks run afterwards from [`Inner::pump`], so they may call back into
//! the `App` freely.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Uint8Array};
use serde::Serialize;
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::asset::glb;
use crate::config::AvatarConfig;
use crate::controller::{AvatarController, AvatarEvent, LoadRequest};
use crate::emotion::Emotion;
use crate::error::{AssetLoadError, SpeechSynthesisError};
use crate::gpu::{self, GpuContext};
use crate::player::{PlayOptions, PlaybackOutcome, RenderState};
use crate::speech::{SpeechEngine, SpeechEvent, UtteranceId, Voice, VoiceOptions};

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

// ============================================================================
// Host-facing DTOs
// ============================================================================

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum EventDto {
    LoadingProgress { key: String, percent: f32, stage: String },
    ModelLoaded { key: String },
    Error { message: String },
    PlaybackStarted { request: u64, key: String },
    PlaybackFinished { request: u64, key: String, outcome: &'static str },
    EmotionChanged { emotion: Emotion },
}

impl From<&AvatarEvent> for EventDto {
    fn from(event: &AvatarEvent) -> Self {
        match event {
            AvatarEvent::LoadingProgress { key, percent, stage } => EventDto::LoadingProgress {
                key: key.clone(),
                percent: *percent,
                stage: stage.clone(),
            },
            AvatarEvent::ModelLoaded { key } => EventDto::ModelLoaded { key: key.clone() },
            AvatarEvent::Error(err) => EventDto::Error {
                message: err.to_string(),
            },
            AvatarEvent::PlaybackStarted { request, key } => EventDto::PlaybackStarted {
                request: request.0,
                key: key.clone(),
            },
            AvatarEvent::PlaybackFinished { request, key, outcome } => EventDto::PlaybackFinished {
                request: request.0,
                key: key.clone(),
                outcome: outcome.label(),
            },
            AvatarEvent::EmotionChanged(emotion) => EventDto::EmotionChanged { emotion: *emotion },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDto {
    frame: u64,
    render_state: RenderState,
    visible_model: Option<u64>,
    emotion: Emotion,
    light_uniform: [f32; 8],
    view: [f32; 16],
    projection: [f32; 16],
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Default, Clone)]
struct Callbacks {
    on_progress: Option<Function>,
    on_loaded: Option<Function>,
    on_error: Option<Function>,
    on_event: Option<Function>,
}

type Completions = Rc<RefCell<Vec<(Function, PlaybackOutcome)>>>;

struct Inner {
    controller: RefCell<AvatarController>,
    callbacks: RefCell<Callbacks>,
    /// JS completion callbacks waiting for the controller borrow to end
    completions: Completions,
    gpu: RefCell<Option<GpuContext>>,
}

impl Inner {
    /// Start requested loads and deliver queued events and callbacks.
    fn pump(self: &Rc<Self>) {
        let (requests, events) = {
            let mut controller = self.controller.borrow_mut();
            (controller.take_load_requests(), controller.take_events())
        };

        for request in requests {
            let inner = Rc::clone(self);
            spawn_local(async move { inner.load(request).await });
        }

        let callbacks = self.callbacks.borrow().clone();
        for event in &events {
            dispatch(&callbacks, event);
        }

        let done = std::mem::take(&mut *self.completions.borrow_mut());
        for (callback, outcome) in done {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(outcome.label())) {
                log::warn!("Completion callback threw: {}", describe(&err));
            }
        }
    }

    async fn load(self: Rc<Self>, request: LoadRequest) {
        let result = match fetch_bytes(&self, &request).await {
            Ok(bytes) => glb::decode(&request.key, &bytes),
            Err(err) => Err(err),
        };
        self.controller
            .borrow_mut()
            .complete_load(&request.key, result);
        self.pump();
    }

    fn speech_event(self: &Rc<Self>, utterance: UtteranceId, event: SpeechEvent) {
        self.controller
            .borrow_mut()
            .on_speech_event(utterance, event);
        self.pump();
    }
}

fn call(callback: &Option<Function>, args: &[JsValue]) {
    let Some(callback) = callback else {
        return;
    };
    let result = match args {
        [a] => callback.call1(&JsValue::NULL, a),
        [a, b] => callback.call2(&JsValue::NULL, a, b),
        _ => callback.call0(&JsValue::NULL),
    };
    if let Err(err) = result {
        log::warn!("Host callback threw: {}", describe(&err));
    }
}

fn dispatch(callbacks: &Callbacks, event: &AvatarEvent) {
    match event {
        AvatarEvent::LoadingProgress { percent, stage, .. } => call(
            &callbacks.on_progress,
            &[JsValue::from_f64(f64::from(*percent)), JsValue::from_str(stage)],
        ),
        AvatarEvent::ModelLoaded { key } => call(&callbacks.on_loaded, &[JsValue::from_str(key)]),
        AvatarEvent::Error(err) => call(&callbacks.on_error, &[to_js(err)]),
        _ => {}
    }
    if callbacks.on_event.is_some() {
        match serde_wasm_bindgen::to_value(&EventDto::from(event)) {
            Ok(value) => call(&callbacks.on_event, &[value]),
            Err(err) => log::warn!("Could not serialize {:?}: {}", event, err),
        }
    }
}

async fn fetch_bytes(inner: &Rc<Inner>, request: &LoadRequest) -> Result<Vec<u8>, AssetLoadError> {
    let network = |reason: String| AssetLoadError::Network {
        url: request.url.clone(),
        reason,
    };
    let window = web_sys::window().ok_or_else(|| network("no window".to_string()))?;

    let response = JsFuture::from(window.fetch_with_str(&request.url))
        .await
        .map_err(|e| network(describe(&e)))?
        .dyn_into::<web_sys::Response>()
        .map_err(|e| network(describe(&e)))?;
    if !response.ok() {
        return Err(AssetLoadError::Http {
            url: request.url.clone(),
            status: response.status(),
        });
    }

    let total = response
        .headers()
        .get("content-length")
        .ok()
        .flatten()
        .and_then(|v| v.parse::<u64>().ok());
    inner
        .controller
        .borrow_mut()
        .report_progress(&request.key, 0, total);
    inner.pump();

    let buffer = JsFuture::from(response.array_buffer().map_err(|e| network(describe(&e)))?)
        .await
        .map_err(|e| network(describe(&e)))?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    log::debug!("Fetched {} bytes for `{}`", bytes.len(), request.key);

    let loaded = bytes.len() as u64;
    inner
        .controller
        .borrow_mut()
        .report_progress(&request.key, loaded, Some(total.unwrap_or(loaded)));
    Ok(bytes)
}

// ============================================================================
// Browser speech engine
// ============================================================================

struct WebSpeech {
    synth: web_sys::SpeechSynthesis,
    app: Weak<Inner>,
}

impl WebSpeech {
    fn voices(&self) -> Vec<web_sys::SpeechSynthesisVoice> {
        self.synth
            .get_voices()
            .iter()
            .filter_map(|v| v.dyn_into::<web_sys::SpeechSynthesisVoice>().ok())
            .collect()
    }

    /// One-shot JS handler feeding `event` back into the controller.
    ///
    /// Delivery is deferred to a microtask since browsers may fire events
    /// while `speak` is still on the stack.
    fn handler(&self, utterance: UtteranceId, event: SpeechEvent) -> JsValue {
        let app = self.app.clone();
        Closure::once_into_js(move || {
            spawn_local(async move {
                if let Some(app) = app.upgrade() {
                    app.speech_event(utterance, event);
                }
            });
        })
    }

    fn error_handler(&self, utterance: UtteranceId) -> JsValue {
        let app = self.app.clone();
        Closure::once_into_js(move |event: web_sys::SpeechSynthesisErrorEvent| {
            let reason = format!("{:?}", event.error());
            spawn_local(async move {
                if let Some(app) = app.upgrade() {
                    app.speech_event(utterance, SpeechEvent::Error(reason));
                }
            });
        })
    }
}

impl SpeechEngine for WebSpeech {
    fn speak(
        &mut self,
        utterance: UtteranceId,
        text: &str,
        voice: &VoiceOptions,
    ) -> Result<(), SpeechSynthesisError> {
        let request = web_sys::SpeechSynthesisUtterance::new_with_text(text)
            .map_err(|e| SpeechSynthesisError::Engine(describe(&e)))?;
        request.set_rate(voice.rate);
        request.set_pitch(voice.pitch);
        request.set_volume(voice.volume);
        if let Some(lang) = &voice.lang {
            request.set_lang(lang);
        }
        if let Some(name) = &voice.name {
            match self.voices().into_iter().find(|v| &v.name() == name) {
                Some(found) => request.set_voice(Some(&found)),
                None => log::warn!("Voice `{}` not available, using default", name),
            }
        }

        let on_start = self.handler(utterance, SpeechEvent::Start);
        let on_end = self.handler(utterance, SpeechEvent::End);
        let on_error = self.error_handler(utterance);
        request.set_onstart(Some(on_start.unchecked_ref()));
        request.set_onend(Some(on_end.unchecked_ref()));
        request.set_onerror(Some(on_error.unchecked_ref()));

        self.synth.speak(&request);
        Ok(())
    }

    fn cancel(&mut self) {
        self.synth.cancel();
    }

    fn list_voices(&self) -> Vec<Voice> {
        self.voices()
            .into_iter()
            .map(|v| Voice {
                name: v.name(),
                lang: v.lang(),
                default: v.default(),
            })
            .collect()
    }
}

// ============================================================================
// App
// ============================================================================

#[wasm_bindgen]
pub struct App {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl App {
    /// Create the avatar from an optional config object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<App, JsValue> {
        console_error_panic_hook::set_once();

        let mut config: AvatarConfig = if config.is_undefined() || config.is_null() {
            AvatarConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js)?
        };
        console_log::init_with_level(config.log_level()).ok();

        if let Some(href) = web_sys::window().and_then(|w| w.location().href().ok()) {
            let page = Url::parse(&href).map_err(to_js)?;
            let base = config.assets.resolve_base_url(Some(&page)).map_err(to_js)?;
            log::debug!("Asset base resolved to {}", base);
            config.assets.base_url = base.into();
        }

        let controller = AvatarController::new(config).map_err(to_js)?;
        let inner = Rc::new(Inner {
            controller: RefCell::new(controller),
            callbacks: RefCell::new(Callbacks::default()),
            completions: Rc::new(RefCell::new(Vec::new())),
            gpu: RefCell::new(None),
        });

        match web_sys::window().map(|w| w.speech_synthesis()) {
            Some(Ok(synth)) => {
                let engine = WebSpeech {
                    synth,
                    app: Rc::downgrade(&inner),
                };
                inner
                    .controller
                    .borrow_mut()
                    .set_speech_engine(Some(Box::new(engine)));
            }
            _ => log::warn!("SpeechSynthesis unavailable, speech timing is simulated"),
        }

        Ok(App { inner })
    }

    pub fn set_on_progress(&self, callback: Option<Function>) {
        self.inner.callbacks.borrow_mut().on_progress = callback;
    }

    pub fn set_on_loaded(&self, callback: Option<Function>) {
        self.inner.callbacks.borrow_mut().on_loaded = callback;
    }

    pub fn set_on_error(&self, callback: Option<Function>) {
        self.inner.callbacks.borrow_mut().on_error = callback;
    }

    /// Receives every controller event as a tagged object.
    pub fn set_on_event(&self, callback: Option<Function>) {
        self.inner.callbacks.borrow_mut().on_event = callback;
    }

    /// Set up rendering on the canvas, then start loading the base avatar.
    pub fn attach_canvas(&self, canvas_id: &str) {
        let inner = Rc::clone(&self.inner);
        let canvas = gpu::find_canvas(canvas_id);
        spawn_local(async move {
            let probed = match canvas {
                Ok(canvas) => GpuContext::probe(canvas).await,
                Err(err) => Err(err),
            };
            match probed {
                Ok(gpu) => {
                    log::info!("Rendering initialized");
                    *inner.gpu.borrow_mut() = Some(gpu);
                    inner.controller.borrow_mut().load_base();
                }
                Err(err) => inner
                    .controller
                    .borrow_mut()
                    .report_capability_unavailable(&err.0),
            }
            inner.pump();
        });
    }

    /// Load the base avatar without rendering, for headless hosts.
    pub fn load_base(&self) {
        self.inner.controller.borrow_mut().load_base();
        self.inner.pump();
    }

    pub fn tick(&self, delta_seconds: f32) {
        let lights = {
            let mut controller = self.inner.controller.borrow_mut();
            controller.tick(delta_seconds);
            controller.snapshot().lights
        };
        if let Some(gpu) = self.inner.gpu.borrow().as_ref() {
            gpu.render(&lights);
        }
        self.inner.pump();
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot = self.inner.controller.borrow().snapshot();
        let dto = SnapshotDto {
            frame: snapshot.frame,
            render_state: snapshot.render_state,
            visible_model: snapshot.visible_model.map(|id| id.0),
            emotion: snapshot.emotion,
            light_uniform: bytemuck::cast(snapshot.light_uniform),
            view: snapshot.view.to_cols_array(),
            projection: snapshot.projection.to_cols_array(),
        };
        serde_wasm_bindgen::to_value(&dto).map_err(to_js)
    }

    pub fn render_state(&self) -> Result<JsValue, JsValue> {
        let state = self.inner.controller.borrow().render_state();
        serde_wasm_bindgen::to_value(&state).map_err(to_js)
    }

    pub fn current_emotion(&self) -> String {
        self.inner.controller.borrow().current_emotion().as_str().to_string()
    }

    pub fn set_emotion(&self, id: &str) {
        self.inner.controller.borrow_mut().set_emotion(id);
        self.inner.pump();
    }

    /// Play an external animation. Returns the request id.
    pub fn play_external(
        &self,
        key: &str,
        fallback: &str,
        clip: Option<String>,
        on_complete: Option<Function>,
    ) -> f64 {
        let mut options = PlayOptions {
            clip,
            on_complete: None,
        };
        if let Some(callback) = on_complete {
            let completions = Rc::clone(&self.inner.completions);
            options = options.on_complete(move |outcome| {
                completions.borrow_mut().push((callback, outcome));
            });
        }
        let request = self
            .inner
            .controller
            .borrow_mut()
            .play_external(key, Emotion::parse(fallback), options);
        self.inner.pump();
        request.0 as f64
    }

    pub fn start_talking_loop(&self) {
        self.inner.controller.borrow_mut().start_talking_loop();
        self.inner.pump();
    }

    pub fn stop_talking_loop(&self) {
        self.inner.controller.borrow_mut().stop_talking_loop();
        self.inner.pump();
    }

    pub fn set_talking(&self, talking: bool) {
        self.inner.controller.borrow_mut().set_talking(talking);
        self.inner.pump();
    }

    /// Speak `text` and settle on `baseline` afterwards.
    pub fn speak(&self, text: &str, baseline: &str) -> f64 {
        let utterance = self
            .inner
            .controller
            .borrow_mut()
            .speak(text, Emotion::parse(baseline));
        self.inner.pump();
        utterance.0 as f64
    }

    pub fn cancel_speech(&self) {
        self.inner.controller.borrow_mut().cancel_speech();
        self.inner.pump();
    }

    pub fn set_voice(&self, voice: JsValue) -> Result<(), JsValue> {
        let voice: VoiceOptions = serde_wasm_bindgen::from_value(voice).map_err(to_js)?;
        self.inner.controller.borrow_mut().set_voice(voice);
        Ok(())
    }

    pub fn list_voices(&self) -> Result<JsValue, JsValue> {
        let voices = self.inner.controller.borrow().list_voices();
        serde_wasm_bindgen::to_value(&voices).map_err(to_js)
    }

    pub fn set_pointer(&self, x: f32, y: f32) {
        self.inner.controller.borrow_mut().set_pointer(x, y);
    }

    pub fn notify_interaction(&self) {
        self.inner.controller.borrow_mut().notify_interaction();
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.inner.controller.borrow_mut().resize(width, height);
        if let Some(gpu) = self.inner.gpu.borrow_mut().as_mut() {
            gpu.resize(width, height);
        }
    }
}
