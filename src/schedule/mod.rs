//! Timers and the schedulers built on them.

mod inactivity;
mod talking;
mod timers;

pub use inactivity::InactivityScheduler;
pub use talking::{GapStep, LoopStep, TalkingLoop};
pub use timers::{TimerId, TimerQueue};

use crate::player::RequestId;
use crate::speech::UtteranceId;

/// Everything the controller schedules on its clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Completion backstop for an external clip
    Backstop { request: RequestId },
    /// Pause between two talking clips
    TalkingGap { generation: u64 },
    /// Simulated end of an utterance when no engine is attached
    SpeechEnd { utterance: UtteranceId },
    /// Return to the baseline emotion after speech
    SpeechSettle { utterance: UtteranceId },
    Inactivity { generation: u64 },
}
