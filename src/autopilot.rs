use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotMode {
    Manual,
    Auto,
}

impl PilotMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto pilot",
        }
    }
}

/// What the caller should do after [`AutopilotController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotEvent {
    None,
    /// Idle threshold reached; start cycling now.
    EnteredAuto,
    /// Cycle interval elapsed while in auto.
    Cycle,
}

/// Manual/Auto state machine driven by the time since the last external
/// command. Times are monotonic `Instant`s supplied by the caller.
#[derive(Debug, Clone)]
pub struct AutopilotController {
    mode: PilotMode,
    last_activity: Instant,
    idle_threshold: Duration,
    cycle_interval: Option<Duration>,
    cycle_started: Instant,
}

impl AutopilotController {
    /// A zero `cycle_interval` disables periodic cycling.
    pub fn new(idle_threshold: Duration, cycle_interval: Duration, now: Instant) -> Self {
        Self {
            mode: PilotMode::Manual,
            last_activity: now,
            idle_threshold,
            cycle_interval: (!cycle_interval.is_zero()).then_some(cycle_interval),
            cycle_started: now,
        }
    }

    pub fn mode(&self) -> PilotMode {
        self.mode
    }

    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }

    pub fn cycle_interval(&self) -> Option<Duration> {
        self.cycle_interval
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Time until the next automatic step: entering auto when manual, the
    /// next cycle when auto. `None` when auto has cycling disabled.
    pub fn next_event_in(&self, now: Instant) -> Option<Duration> {
        match self.mode {
            PilotMode::Manual => Some(self.idle_threshold.saturating_sub(self.idle_for(now))),
            PilotMode::Auto => self
                .cycle_interval
                .map(|i| i.saturating_sub(now.saturating_duration_since(self.cycle_started))),
        }
    }

    /// Records external activity and forces Manual. Returns true when this
    /// took control away from the autopilot.
    pub fn on_external_command(&mut self, now: Instant) -> bool {
        self.last_activity = now;
        if self.mode == PilotMode::Auto {
            self.mode = PilotMode::Manual;
            info!("user took control");
            return true;
        }
        false
    }

    /// Switches to auto immediately, as if the idle threshold had elapsed.
    pub fn engage(&mut self, now: Instant) -> PilotEvent {
        if self.mode == PilotMode::Auto {
            return PilotEvent::None;
        }
        self.enter_auto(now)
    }

    /// Values that are zero, negative or not finite disable cycling.
    pub fn set_cycle_interval_secs(&mut self, secs: f32) {
        let interval = duration_from_secs(secs);
        self.cycle_interval = (!interval.is_zero()).then_some(interval);
    }

    pub fn tick(&mut self, now: Instant) -> PilotEvent {
        match self.mode {
            PilotMode::Manual => {
                if self.idle_for(now) >= self.idle_threshold {
                    self.enter_auto(now)
                } else {
                    PilotEvent::None
                }
            }
            PilotMode::Auto => match self.cycle_interval {
                Some(interval) if now.saturating_duration_since(self.cycle_started) >= interval => {
                    self.cycle_started = now;
                    PilotEvent::Cycle
                }
                _ => PilotEvent::None,
            },
        }
    }

    fn enter_auto(&mut self, now: Instant) -> PilotEvent {
        self.mode = PilotMode::Auto;
        self.last_activity = now;
        self.cycle_started = now;
        info!("moving to auto pilot");
        PilotEvent::EnteredAuto
    }
}

/// Seconds from the store or the command line; negative or NaN is zero.
pub fn duration_from_secs(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}
