use std::time::{Duration, Instant};
use tracing::info;

/// Nobody tracked for this long turns the user filter off.
pub const ABSENCE_TIMEOUT: Duration = Duration::from_secs(5);
/// Someone tracked within this window turns it back on.
pub const PRESENCE_WINDOW: Duration = Duration::from_secs(3);

/// Switches the depth camera's user-only filter by who is in front of it,
/// while the auto pilot runs. With nobody there the full camera image feeds
/// the fluid; once someone steps in, only tracked people do.
#[derive(Debug, Clone)]
pub struct PresenceFilter {
    timeout: Duration,
    window: Duration,
    last_seen: Option<Instant>,
}

impl Default for PresenceFilter {
    fn default() -> Self {
        Self::new(ABSENCE_TIMEOUT, PRESENCE_WINDOW)
    }
}

impl PresenceFilter {
    pub fn new(timeout: Duration, window: Duration) -> Self {
        Self {
            timeout,
            window,
            last_seen: None,
        }
    }

    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    /// Time since someone was last tracked; `None` if nobody ever was.
    pub fn absent_for(&self, now: Instant) -> Option<Duration> {
        self.last_seen.map(|t| now.saturating_duration_since(t))
    }

    /// Records this frame's tracked count and returns the filter value to
    /// write, if it should change. Sightings are recorded in every mode; the
    /// filter only moves while `auto` holds.
    pub fn update(
        &mut self,
        now: Instant,
        tracked: usize,
        filter_on: bool,
        auto: bool,
    ) -> Option<bool> {
        if tracked > 0 {
            self.last_seen = Some(now);
        }
        if !auto {
            return None;
        }

        let absent = self.absent_for(now);
        let gone = absent.is_none_or(|d| d >= self.timeout);
        let here = absent.is_some_and(|d| d < self.window);

        if filter_on && gone {
            info!("nobody in frame; showing the full camera image");
            return Some(false);
        }
        if !filter_on && here {
            info!("person in frame; filtering to tracked users");
            return Some(true);
        }
        None
    }
}
