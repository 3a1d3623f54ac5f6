//! Clip data, track filtering and playback.

mod clip;
mod filter;
mod mixer;

pub use clip::{AnimationClip, Channel, Track, TrackSample, TrackValues};
pub use filter::TrackFilter;
pub use mixer::{ActionId, AnimationMixer, ClipAction, LoopMode, MixerEvent, PlaySettings};
