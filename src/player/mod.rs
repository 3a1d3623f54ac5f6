//! Base and external animation players.

mod base;
mod external;

use std::fmt;

use serde::Serialize;

pub use base::{resolve_clip, BasePlayer};
pub use external::{ExternalRunner, MountedExternal, PlaybackSession, SessionPhase};

use crate::error::{AssetLoadError, ClipResolutionMiss};

/// Identifies one `play_external` request. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

/// Which model the avatar is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    BaseVisible,
    ExternalLoading,
    ExternalVisible,
}

/// How an external playback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    /// A newer request took over; the completion callback is not invoked
    Superseded,
    LoadFailed(AssetLoadError),
    ClipMissing(ClipResolutionMiss),
    BaseNotLoaded,
}

impl PlaybackOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackOutcome::Completed => "completed",
            PlaybackOutcome::Superseded => "superseded",
            PlaybackOutcome::LoadFailed(_) => "load_failed",
            PlaybackOutcome::ClipMissing(_) => "clip_missing",
            PlaybackOutcome::BaseNotLoaded => "base_not_loaded",
        }
    }
}

/// Who asked for an external playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOrigin {
    Host,
    TalkingLoop { generation: u64 },
    Rest,
}

pub type CompletionCallback = Box<dyn FnOnce(PlaybackOutcome)>;

/// Options for `play_external`.
#[derive(Default)]
pub struct PlayOptions {
    /// Clip to play from the asset; the first clip when unset
    pub clip: Option<String>,
    pub on_complete: Option<CompletionCallback>,
}

impl PlayOptions {
    pub fn with_clip(mut self, clip: impl Into<String>) -> Self {
        self.clip = Some(clip.into());
        self
    }

    pub fn on_complete(mut self, callback: impl FnOnce(PlaybackOutcome) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for PlayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayOptions")
            .field("clip", &self.clip)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
