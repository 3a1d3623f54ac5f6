use crate::emotion::Emotion;

/// What the loop wants after the current talking clip completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStep {
    /// Hold the model and play the next key after the gap
    Continue { generation: u64 },
    /// Return to the base avatar with this emotion
    Finish(Emotion),
}

/// Result of the inter-clip gap elapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapStep {
    Play(String),
    Finish(Emotion),
    /// The loop was restarted since the gap was scheduled
    Stale,
}

/// Cycles the talking keys while speech is active.
///
/// Never drives two plays at once: the next key is only requested from the
/// completion of the previous one.
#[derive(Debug)]
pub struct TalkingLoop {
    keys: Vec<String>,
    active: bool,
    index: usize,
    generation: u64,
    fallback: Emotion,
}

impl TalkingLoop {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            active: false,
            index: 0,
            generation: 0,
            fallback: Emotion::Neutral,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn fallback(&self) -> Emotion {
        self.fallback
    }

    fn current_key(&self) -> Option<String> {
        self.keys.get(self.index).cloned()
    }

    /// Activate the loop. Returns the first key, or None if already active.
    pub fn start(&mut self, fallback: Emotion) -> Option<String> {
        if self.active {
            return None;
        }
        let key = self.keys.first().cloned()?;
        self.active = true;
        self.index = 0;
        self.generation += 1;
        self.fallback = fallback;
        log::info!("Talking loop started (generation {})", self.generation);
        Some(key)
    }

    /// Mark inactive; the in-flight clip's completion performs cleanup.
    pub fn stop(&mut self) {
        if self.active {
            log::info!("Talking loop stopping (generation {})", self.generation);
        }
        self.active = false;
    }

    /// Update the emotion restored when the loop finishes.
    pub fn set_fallback(&mut self, fallback: Emotion) {
        self.fallback = fallback;
    }

    pub fn on_complete(&mut self) -> LoopStep {
        if !self.active || self.keys.is_empty() {
            return LoopStep::Finish(self.fallback);
        }
        self.index = (self.index + 1) % self.keys.len();
        LoopStep::Continue {
            generation: self.generation,
        }
    }

    pub fn on_gap(&self, generation: u64) -> GapStep {
        if generation != self.generation {
            return GapStep::Stale;
        }
        match (self.active, self.current_key()) {
            (true, Some(key)) => GapStep::Play(key),
            _ => GapStep::Finish(self.fallback),
        }
    }
}
