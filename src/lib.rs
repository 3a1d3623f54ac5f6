//! Avatar Animation Engine - Wasm Core
//!
//! Orchestrates a persistent base avatar and transient external animation
//! models so exactly one of them is on screen at any time. The core is
//! platform-neutral and deterministic; the browser layer in `web` fetches
//! assets, bridges speech synthesis and renders through wgpu.

pub mod anim;
pub mod asset;
pub mod camera;
pub mod config;
pub mod controller;
pub mod emotion;
pub mod error;
pub mod lighting;
mod math;
pub mod player;
pub mod pose;
pub mod scene;
pub mod schedule;
pub mod speech;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub mod gpu;
        mod web;

        pub use web::App;
    }
}

pub use config::AvatarConfig;
pub use controller::{AvatarController, AvatarEvent, FrameSnapshot, LoadKind, LoadRequest};
pub use emotion::{Emotion, EmotionState};
pub use error::{
    AssetLoadError, AvatarError, CapabilityUnavailable, ClipResolutionMiss, ConfigError,
    SpeechSynthesisError,
};
pub use player::{PlayOptions, PlaybackOutcome, RenderState, RequestId};
pub use speech::{SpeechEngine, SpeechEvent, UtteranceId, Voice, VoiceOptions};
