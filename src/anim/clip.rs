use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// Track-based animation clips
// ============================================================================

/// Which part of a bone's local transform a track drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Position,
    Rotation,
    Scale,
}

/// Keyframe values, one entry per keyframe time.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    /// Position or scale keys
    Vec3(Vec<Vec3>),
    /// Rotation keys
    Quat(Vec<Quat>),
}

impl TrackValues {
    pub fn len(&self) -> usize {
        match self {
            TrackValues::Vec3(v) => v.len(),
            TrackValues::Quat(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A sampled track value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackSample {
    Vec3(Vec3),
    Quat(Quat),
}

/// Keyframes for one channel of one bone.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Target bone (scene node) name
    pub bone: String,
    pub channel: Channel,
    /// Keyframe times in seconds, ascending
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl Track {
    pub fn position(bone: impl Into<String>, times: Vec<f32>, values: Vec<Vec3>) -> Self {
        Self {
            bone: bone.into(),
            channel: Channel::Position,
            times,
            values: TrackValues::Vec3(values),
        }
    }

    pub fn rotation(bone: impl Into<String>, times: Vec<f32>, values: Vec<Quat>) -> Self {
        Self {
            bone: bone.into(),
            channel: Channel::Rotation,
            times,
            values: TrackValues::Quat(values),
        }
    }

    pub fn scale(bone: impl Into<String>, times: Vec<f32>, values: Vec<Vec3>) -> Self {
        Self {
            bone: bone.into(),
            channel: Channel::Scale,
            times,
            values: TrackValues::Vec3(values),
        }
    }

    /// Time of the last keyframe
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Sample at `time` (seconds, not looped), holding the first and last keys.
    pub fn sample(&self, time: f32) -> Option<TrackSample> {
        let count = self.times.len().min(self.values.len());
        if count == 0 {
            return None;
        }

        // Binary search for keyframe (using partition_point for efficiency)
        let next_idx = self.times[..count].partition_point(|t| *t <= time);

        let (a, b, t) = if next_idx == 0 {
            (0, 0, 0.0)
        } else if next_idx >= count {
            (count - 1, count - 1, 0.0)
        } else {
            let prev = next_idx - 1;
            let segment = self.times[next_idx] - self.times[prev];
            let t = if segment > 0.0 {
                (time - self.times[prev]) / segment
            } else {
                0.0
            };
            (prev, next_idx, t)
        };

        Some(match &self.values {
            TrackValues::Vec3(v) => TrackSample::Vec3(v[a].lerp(v[b], t)),
            TrackValues::Quat(q) => TrackSample::Quat(q[a].slerp(q[b], t).normalize()),
        })
    }
}

/// A named animation: an ordered list of per-bone tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Build a clip whose duration is the latest keyframe of any track.
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::end_time).fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.tracks.iter().any(|t| t.channel == channel)
    }

    /// Sample every track at `time`.
    pub fn sample(&self, time: f32) -> impl Iterator<Item = (&str, Channel, TrackSample)> + '_ {
        self.tracks.iter().filter_map(move |track| {
            Some((track.bone.as_str(), track.channel, track.sample(time)?))
        })
    }
}
