use chrono::{DateTime, Utc};

/// Wall-clock tracker for a conversation session
///
/// Pure utility: `elapsed` is a function of the supplied instant, and
/// formatting never wraps; minutes keep widening past 99.
#[derive(Debug, Clone)]
pub struct SessionClock {
    started_at: DateTime<Utc>,
}

impl SessionClock {
    /// Start a clock at the current instant
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }

    /// Reset the start instant, discarding any prior start
    pub fn reset(&mut self) {
        self.started_at = Utc::now();
    }

    /// When this clock was started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole elapsed seconds at `now`, clamped at zero
    pub fn elapsed(&self, now: DateTime<Utc>) -> u64 {
        let secs = now.signed_duration_since(self.started_at).num_seconds();
        secs.max(0) as u64
    }

    /// Zero-padded `MM:SS`; the minutes field widens beyond two digits
    pub fn format(seconds: u64) -> String {
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }
}
