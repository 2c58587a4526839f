// Reconnect backoff schedule for the realtime link
use std::time::Duration;

/// Fixed ladder of reconnect delays.
///
/// The index advances one step per consecutive failure and saturates at the
/// final entry, so a long outage keeps retrying at the largest delay rather
/// than giving up. Any success resets the ladder to the first step.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    steps: Vec<Duration>,
    index: usize,
}

/// Default ladder: 1s, 5s, 5s, 10s, 10s, 30s.
pub fn default_steps() -> Vec<Duration> {
    [1, 5, 5, 10, 10, 30]
        .iter()
        .map(|s| Duration::from_secs(*s))
        .collect()
}

impl BackoffSchedule {
    /// An empty ladder falls back to the default one.
    pub fn new(steps: Vec<Duration>) -> Self {
        let steps = if steps.is_empty() { default_steps() } else { steps };
        Self { steps, index: 0 }
    }

    /// Delay to use for the next reconnect attempt. Advances the index,
    /// saturating at the last step.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.steps[self.index];
        self.index = (self.index + 1).min(self.steps.len() - 1);
        delay
    }

    /// Reset to the first step. Called on every successful connection.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn attempt_index(&self) -> usize {
        self.index
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::new(default_steps())
    }
}
