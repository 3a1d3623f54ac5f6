//! Emotion registry
//!
//! Static table mapping each emotion to its pose target, light and base clip.
//! Indexed by enum like the clip library, so lookups never hash.

use serde::{Deserialize, Serialize};

/// Emotion identifiers understood by the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Emotion {
    #[default]
    Neutral = 0,
    Happy = 1,
    Sad = 2,
    Thinking = 3,
    Talking = 4,
    Listening = 5,
    Hi = 6,
    Yes = 7,
    No = 8,
    Rest = 9,
}

impl Emotion {
    pub const COUNT: usize = 10;

    pub const ALL: [Emotion; Self::COUNT] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Thinking,
        Emotion::Talking,
        Emotion::Listening,
        Emotion::Hi,
        Emotion::Yes,
        Emotion::No,
        Emotion::Rest,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse an identifier, falling back to `Neutral` for anything unknown.
    pub fn parse(id: &str) -> Emotion {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(id))
            .unwrap_or_else(|| {
                if !id.is_empty() {
                    log::debug!("Unknown emotion `{}`, using neutral", id);
                }
                Emotion::Neutral
            })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Thinking => "thinking",
            Emotion::Talking => "talking",
            Emotion::Listening => "listening",
            Emotion::Hi => "hi",
            Emotion::Yes => "yes",
            Emotion::No => "no",
            Emotion::Rest => "rest",
        }
    }

    #[inline]
    pub fn state(self) -> &'static EmotionState {
        &EMOTIONS[self.index()]
    }
}

/// Everything the avatar derives from an emotion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionState {
    pub id: Emotion,
    pub label: &'static str,
    /// Point light colour, 0xRRGGBB
    pub light_color: u32,
    pub light_intensity: f32,
    /// Head tilt target (radians, positive looks down)
    pub pose_tilt: f32,
    /// Head turn target (radians, positive turns left)
    pub pose_turn: f32,
    /// Vertical bob amplitude (scene units)
    pub pose_bob: f32,
    /// Clip name looked up in the base avatar's clip list
    pub base_clip: &'static str,
    /// Plays once and clamps instead of looping
    pub one_shot: bool,
}

pub const EMOTIONS: [EmotionState; Emotion::COUNT] = [
    EmotionState {
        id: Emotion::Neutral,
        label: "Neutral",
        light_color: 0x88ccff,
        light_intensity: 1.0,
        pose_tilt: 0.0,
        pose_turn: 0.0,
        pose_bob: 0.02,
        base_clip: "Idle",
        one_shot: false,
    },
    EmotionState {
        id: Emotion::Happy,
        label: "Happy",
        light_color: 0xffd166,
        light_intensity: 1.4,
        pose_tilt: -0.05,
        pose_turn: 0.0,
        pose_bob: 0.04,
        base_clip: "Happy",
        one_shot: false,
    },
    EmotionState {
        id: Emotion::Sad,
        label: "Sad",
        light_color: 0x6c7a96,
        light_intensity: 0.7,
        pose_tilt: 0.15,
        pose_turn: 0.0,
        pose_bob: 0.01,
        base_clip: "Sad",
        one_shot: false,
    },
    EmotionState {
        id: Emotion::Thinking,
        label: "Thinking",
        light_color: 0xb39ddb,
        light_intensity: 0.9,
        pose_tilt: 0.08,
        pose_turn: 0.2,
        pose_bob: 0.015,
        base_clip: "Thinking",
        one_shot: false,
    },
    EmotionState {
        id: Emotion::Talking,
        label: "Talking",
        light_color: 0x4fd1c5,
        light_intensity: 1.2,
        pose_tilt: 0.0,
        pose_turn: 0.0,
        pose_bob: 0.03,
        base_clip: "Talking",
        one_shot: false,
    },
    EmotionState {
        id: Emotion::Listening,
        label: "Listening",
        light_color: 0x90cdf4,
        light_intensity: 1.0,
        pose_tilt: 0.06,
        pose_turn: -0.1,
        pose_bob: 0.02,
        base_clip: "Listening",
        one_shot: false,
    },
    EmotionState {
        id: Emotion::Hi,
        label: "Hi",
        light_color: 0xf6ad55,
        light_intensity: 1.3,
        pose_tilt: -0.04,
        pose_turn: 0.0,
        pose_bob: 0.03,
        base_clip: "Hi",
        one_shot: true,
    },
    EmotionState {
        id: Emotion::Yes,
        label: "Yes",
        light_color: 0x68d391,
        light_intensity: 1.2,
        pose_tilt: 0.0,
        pose_turn: 0.0,
        pose_bob: 0.02,
        base_clip: "Yes",
        one_shot: true,
    },
    EmotionState {
        id: Emotion::No,
        label: "No",
        light_color: 0xfc8181,
        light_intensity: 1.1,
        pose_tilt: 0.0,
        pose_turn: 0.0,
        pose_bob: 0.02,
        base_clip: "No",
        one_shot: true,
    },
    EmotionState {
        id: Emotion::Rest,
        label: "Rest",
        light_color: 0x7f9cf5,
        light_intensity: 0.8,
        pose_tilt: 0.1,
        pose_turn: 0.0,
        pose_bob: 0.01,
        base_clip: "Rest",
        one_shot: false,
    },
];

/// Resolve an identifier to its state; unknown identifiers resolve to neutral.
pub fn resolve(id: &str) -> &'static EmotionState {
    Emotion::parse(id).state()
}
