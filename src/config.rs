//! Runtime configuration
//!
//! Every tunable of the avatar lives here. All fields default, so a host can
//! pass `{}` or only the values it wants to override.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub timing: TimingConfig,
    pub filter: FilterPolicy,
    pub pose: PoseConfig,
    pub lighting: LightingConfig,
    pub speech: SpeechConfig,
    pub assets: AssetConfig,
    /// External animation keys cycled while speaking
    pub talking_keys: Vec<String>,
    /// External animation played after the inactivity timeout
    pub rest_key: String,
    /// Root transform given to every external model on mount
    pub external_transform: ModelTransform,
    /// Root transform of the base avatar
    pub base_transform: ModelTransform,
    /// Replay on the mounted model when the next key shares its family
    pub reuse_same_family: bool,
    /// `log` level for the console backend
    pub log_level: String,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            filter: FilterPolicy::default(),
            pose: PoseConfig::default(),
            lighting: LightingConfig::default(),
            speech: SpeechConfig::default(),
            assets: AssetConfig::default(),
            talking_keys: vec!["talking 1".to_string(), "talking 2".to_string()],
            rest_key: "rest".to_string(),
            external_transform: ModelTransform::default(),
            base_transform: ModelTransform::default(),
            reuse_same_family: true,
            log_level: "info".to_string(),
        }
    }
}

impl AvatarConfig {
    /// Parse from a JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AvatarConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.talking_keys.is_empty() {
            return Err(ConfigError::Invalid(
                "talking_keys must name at least one animation".to_string(),
            ));
        }
        if self.timing.max_delta_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "timing.max_delta_seconds must be positive".to_string(),
            ));
        }
        if self.speech.min_estimate_ms > self.speech.max_estimate_ms {
            return Err(ConfigError::Invalid(
                "speech.min_estimate_ms exceeds speech.max_estimate_ms".to_string(),
            ));
        }
        crate::anim::TrackFilter::new(&self.filter)?;
        // Relative bases are resolved against the page later
        let page = Url::parse("http://localhost/")?;
        self.assets.resolve_base_url(Some(&page))?;
        Ok(())
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Added to a clip's duration before the completion backstop fires
    pub safety_buffer_ms: u32,
    /// Pause between consecutive talking clips
    pub talking_gap_ms: u32,
    /// Delay before the baseline emotion returns after speech ends
    pub speech_settle_ms: u32,
    /// Idle time before the rest animation; 0 disables it
    pub inactivity_ms: u32,
    /// Upper bound on a single frame's delta
    pub max_delta_seconds: f32,
    /// Fade-in of base emotion clips
    pub base_fade_in_seconds: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            safety_buffer_ms: 300,
            talking_gap_ms: 100,
            speech_settle_ms: 600,
            inactivity_ms: 60_000,
            max_delta_seconds: 0.1,
            base_fade_in_seconds: 0.2,
        }
    }
}

/// Which tracks the filter removes from external clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    /// Case-insensitive pattern naming root bones
    pub root_pattern: String,
    /// Also strip lower-body and stabilizer bones
    pub strip_stabilizers: bool,
    /// Case-insensitive pattern used when `strip_stabilizers` is set
    pub stabilizer_pattern: String,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            root_pattern: r"^(?:mixamorig[:_]?)?(?:hips|root)$|^character".to_string(),
            strip_stabilizers: false,
            stabilizer_pattern: "leg|knee|foot|toe|hip|spine|clavicle|shoulder".to_string(),
        }
    }
}

impl FilterPolicy {
    pub fn strict() -> Self {
        Self {
            strip_stabilizers: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Per-frame pointer smoothing at 60 fps
    pub pointer_smoothing: f32,
    /// Per-frame rotation lerp at 60 fps
    pub rotation_lerp: f32,
    /// Per-frame approach of pose targets toward the emotion at 60 fps
    pub target_lerp: f32,
    pub max_pointer_turn: f32,
    pub max_pointer_tilt: f32,
    /// Raw pointer turn at the viewport edge (before clamping)
    pub pointer_turn_range: f32,
    /// Raw pointer tilt at the viewport edge (before clamping)
    pub pointer_tilt_range: f32,
    /// Bob angular frequency (rad/s)
    pub bob_frequency: f32,
    /// Y rotation that makes the model face the camera
    pub base_rotation: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            pointer_smoothing: 0.06,
            rotation_lerp: 0.08,
            target_lerp: 0.08,
            max_pointer_turn: 0.35,
            max_pointer_tilt: 0.25,
            pointer_turn_range: 0.5,
            pointer_tilt_range: 0.3,
            bob_frequency: 2.2,
            base_rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Approach rate toward the emotion light (per second)
    pub follow_rate: f32,
    /// Accent colour while talking, 0xRRGGBB
    pub talking_accent: u32,
    /// Relative depth of the talking pulse
    pub pulse_depth: f32,
    pub pulse_fast_hz: f32,
    pub pulse_slow_hz: f32,
    /// Relative depth of the idle breathing
    pub breathing_depth: f32,
    pub breathing_hz: f32,
    /// Fill light intensity relative to the key light
    pub fill_ratio: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            follow_rate: 4.0,
            talking_accent: 0x4fd1c5,
            pulse_depth: 0.25,
            pulse_fast_hz: 2.0,
            pulse_slow_hz: 0.5,
            breathing_depth: 0.1,
            breathing_hz: 0.2,
            fill_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Simulated utterance length per character
    pub ms_per_char: u32,
    pub min_estimate_ms: u32,
    pub max_estimate_ms: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            ms_per_char: 40,
            min_estimate_ms: 1500,
            max_estimate_ms: 4000,
        }
    }
}

impl SpeechConfig {
    /// Estimated duration of `text` when no engine reports real timing.
    pub fn estimate_ms(&self, text: &str) -> u32 {
        let chars = text.chars().count() as u32;
        chars
            .saturating_mul(self.ms_per_char)
            .clamp(self.min_estimate_ms, self.max_estimate_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Absolute URL of the directory holding the GLB files
    pub base_url: String,
    /// Manifest key of the base avatar
    pub base_model_key: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/models/".to_string(),
            base_model_key: "avatar".to_string(),
        }
    }
}

impl AssetConfig {
    /// Absolute base URL. Relative bases such as `/models/` need a page URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        self.resolve_base_url(None)
    }

    /// Base URL resolved against `page` when it is relative.
    pub fn resolve_base_url(&self, page: Option<&Url>) -> Result<Url, ConfigError> {
        let mut url = match (Url::parse(&self.base_url), page) {
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(page)) => {
                page.join(&self.base_url)?
            }
            (parsed, _) => parsed?,
        };
        // Url::join replaces the last segment unless the path ends in '/'
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

/// Fixed root transform applied to a model when it enters the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTransform {
    pub position: Vec3,
    /// Euler XYZ in radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -1.0, 0.0),
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}
