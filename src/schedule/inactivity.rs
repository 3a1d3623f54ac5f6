use super::{Timer, TimerId, TimerQueue};

/// Resettable idle timer that triggers the rest animation.
#[derive(Debug)]
pub struct InactivityScheduler {
    timeout_ms: u32,
    generation: u64,
    pending: Option<TimerId>,
}

impl InactivityScheduler {
    /// A zero timeout disables the scheduler.
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            generation: 0,
            pending: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timeout_ms > 0
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Restart the countdown from now.
    pub fn reset(&mut self, timers: &mut TimerQueue<Timer>) {
        if let Some(id) = self.pending.take() {
            timers.cancel(id);
        }
        self.generation += 1;
        if self.is_enabled() {
            self.pending = Some(timers.schedule(
                self.timeout_ms,
                Timer::Inactivity {
                    generation: self.generation,
                },
            ));
        }
    }

    /// Accept an expiry. Stale generations are rejected.
    pub fn fire(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[test]
    #[wasm_bindgen_test]
    fn test_reset_replaces_pending_timer() {
        let mut timers = TimerQueue::new();
        let mut idle = InactivityScheduler::new(1000);
        idle.reset(&mut timers);
        timers.advance(900.0);
        idle.reset(&mut timers);
        assert_eq!(timers.len(), 1);

        timers.advance(900.0);
        assert!(timers.pop_due().is_none());
        timers.advance(100.0);
        let Some((_, Timer::Inactivity { generation })) = timers.pop_due() else {
            panic!("inactivity timer should be due");
        };
        assert!(idle.fire(generation));
        assert!(!idle.is_armed());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_zero_timeout_disables() {
        let mut timers = TimerQueue::new();
        let mut idle = InactivityScheduler::new(0);
        idle.reset(&mut timers);
        assert!(timers.is_empty());
        assert!(!idle.fire(0));
    }
}
