//! Speech coordinator
//!
//! Tracks the current utterance and turns engine lifecycle events into
//! avatar transitions. Without an engine the lifecycle is simulated from
//! the text length so the animation behaves the same without audio.

use serde::{Deserialize, Serialize};

use crate::config::SpeechConfig;
use crate::emotion::Emotion;
use crate::error::SpeechSynthesisError;
use crate::schedule::{Timer, TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Start,
    End,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceOptions {
    /// Preferred voice name; the engine default when unset
    pub name: Option<String>,
    pub lang: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            name: None,
            lang: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    pub default: bool,
}

/// A text-to-speech backend.
///
/// `speak` only queues output; lifecycle events come back later through
/// the controller's `on_speech_event` tagged with the same utterance id.
pub trait SpeechEngine {
    fn speak(
        &mut self,
        utterance: UtteranceId,
        text: &str,
        voice: &VoiceOptions,
    ) -> Result<(), SpeechSynthesisError>;

    fn cancel(&mut self);

    fn list_voices(&self) -> Vec<Voice>;
}

/// What the avatar must do in response to speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechTransition {
    /// Switch to talking and start the talking loop
    Started { baseline: Emotion },
    /// Stop the talking loop; the baseline returns after the settle delay
    Ended { baseline: Emotion },
}

#[derive(Debug, Clone, Copy)]
struct Utterance {
    id: UtteranceId,
    baseline: Emotion,
    started: bool,
    end_timer: Option<TimerId>,
}

pub struct SpeechCoordinator {
    engine: Option<Box<dyn SpeechEngine>>,
    voice: VoiceOptions,
    config: SpeechConfig,
    settle_ms: u32,
    next_id: u64,
    current: Option<Utterance>,
    settle: Option<(UtteranceId, Emotion, TimerId)>,
}

impl SpeechCoordinator {
    pub fn new(config: SpeechConfig, settle_ms: u32) -> Self {
        Self {
            engine: None,
            voice: VoiceOptions::default(),
            config,
            settle_ms,
            next_id: 0,
            current: None,
            settle: None,
        }
    }

    pub fn set_engine(&mut self, engine: Option<Box<dyn SpeechEngine>>) {
        self.engine = engine;
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn set_voice(&mut self, voice: VoiceOptions) {
        self.voice = voice;
    }

    pub fn voice(&self) -> &VoiceOptions {
        &self.voice
    }

    pub fn list_voices(&self) -> Vec<Voice> {
        self.engine
            .as_ref()
            .map(|e| e.list_voices())
            .unwrap_or_default()
    }

    /// An utterance has started and not yet ended.
    pub fn is_speaking(&self) -> bool {
        self.current.is_some_and(|u| u.started)
    }

    pub fn current(&self) -> Option<UtteranceId> {
        self.current.map(|u| u.id)
    }

    /// Stop any output and forget the current utterance and settle timer.
    ///
    /// Returns true when the cancelled utterance had already started, so
    /// the caller knows a talking loop may be running.
    pub fn cancel(&mut self, timers: &mut TimerQueue<Timer>) -> bool {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
        if let Some((_, _, timer)) = self.settle.take() {
            timers.cancel(timer);
        }
        match self.current.take() {
            Some(utterance) => {
                if let Some(timer) = utterance.end_timer {
                    timers.cancel(timer);
                }
                log::debug!("Cancelled utterance {:?}", utterance.id);
                utterance.started
            }
            None => false,
        }
    }

    /// Queue `text`. Any in-flight utterance must be cancelled first.
    pub fn speak(
        &mut self,
        text: &str,
        baseline: Emotion,
        timers: &mut TimerQueue<Timer>,
    ) -> (UtteranceId, Option<SpeechTransition>) {
        self.next_id += 1;
        let id = UtteranceId(self.next_id);
        self.current = Some(Utterance {
            id,
            baseline,
            started: false,
            end_timer: None,
        });

        let Some(engine) = self.engine.as_mut() else {
            let estimate = self.config.estimate_ms(text);
            log::debug!("No speech engine, simulating {} ms for {:?}", estimate, id);
            let end_timer = timers.schedule(estimate, Timer::SpeechEnd { utterance: id });
            self.current = Some(Utterance {
                id,
                baseline,
                started: true,
                end_timer: Some(end_timer),
            });
            return (id, Some(SpeechTransition::Started { baseline }));
        };

        match engine.speak(id, text, &self.voice) {
            Ok(()) => (id, None),
            Err(err) => {
                log::warn!("Speech engine rejected utterance: {}", err);
                (id, self.on_event(id, SpeechEvent::Error(err.to_string()), timers))
            }
        }
    }

    /// Apply an engine event. Events for any other utterance are ignored.
    pub fn on_event(
        &mut self,
        id: UtteranceId,
        event: SpeechEvent,
        timers: &mut TimerQueue<Timer>,
    ) -> Option<SpeechTransition> {
        let utterance = self.current.as_mut().filter(|u| u.id == id)?;
        match event {
            SpeechEvent::Start => {
                if utterance.started {
                    return None;
                }
                utterance.started = true;
                Some(SpeechTransition::Started {
                    baseline: utterance.baseline,
                })
            }
            SpeechEvent::End | SpeechEvent::Error(_) => {
                if let SpeechEvent::Error(reason) = &event {
                    log::warn!("Speech error on {:?}: {}", id, reason);
                }
                let utterance = self.current.take()?;
                if let Some(timer) = utterance.end_timer {
                    timers.cancel(timer);
                }
                if let Some((_, _, timer)) = self.settle.take() {
                    timers.cancel(timer);
                }
                let settle = timers.schedule(self.settle_ms, Timer::SpeechSettle { utterance: id });
                self.settle = Some((id, utterance.baseline, settle));
                Some(SpeechTransition::Ended {
                    baseline: utterance.baseline,
                })
            }
        }
    }

    /// The simulated utterance ran its estimated length.
    pub fn on_end_timer(
        &mut self,
        id: UtteranceId,
        timers: &mut TimerQueue<Timer>,
    ) -> Option<SpeechTransition> {
        if let Some(utterance) = self.current.as_mut().filter(|u| u.id == id) {
            // Already fired; nothing to cancel
            utterance.end_timer = None;
        }
        self.on_event(id, SpeechEvent::End, timers)
    }

    /// Settle delay elapsed; returns the baseline emotion to restore.
    pub fn on_settle(&mut self, id: UtteranceId) -> Option<Emotion> {
        match self.settle {
            Some((settle_id, baseline, _)) if settle_id == id => {
                self.settle = None;
                Some(baseline)
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for SpeechCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCoordinator")
            .field("engine", &self.engine.is_some())
            .field("voice", &self.voice)
            .field("current", &self.current)
            .finish()
    }
}
