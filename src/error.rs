//! Error taxonomy for the avatar core.
//!
//! Only [`CapabilityUnavailable`] and base-model load failures reach the host
//! as errors. Everything else is recovered locally and logged.

use thiserror::Error;

/// A GLB could not be fetched or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLoadError {
    #[error("request for `{url}` failed: {reason}")]
    Network { url: String, reason: String },
    #[error("`{url}` answered with HTTP {status}")]
    Http { url: String, status: u16 },
    #[error("could not decode `{key}`: {reason}")]
    Decode { key: String, reason: String },
    #[error("no asset available for `{0}`")]
    NotFound(String),
}

/// A named clip was not present in a loaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no clip matching `{wanted}` (available: {available:?})")]
pub struct ClipResolutionMiss {
    pub wanted: String,
    pub available: Vec<String>,
}

/// No 3D rendering context could be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("3D rendering is unavailable: {0}")]
pub struct CapabilityUnavailable(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechSynthesisError {
    #[error("speech synthesis is not available")]
    Unavailable,
    #[error("speech engine error: {0}")]
    Engine(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid bone pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid asset base URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Invalid(String),
}

/// Errors surfaced to the host through [`crate::AvatarEvent::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvatarError {
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),
    #[error(transparent)]
    Capability(#[from] CapabilityUnavailable),
    #[error(transparent)]
    ClipResolution(#[from] ClipResolutionMiss),
    #[error(transparent)]
    Speech(#[from] SpeechSynthesisError),
    #[error("base avatar is not loaded yet")]
    BaseNotLoaded,
}
