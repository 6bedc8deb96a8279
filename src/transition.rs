use crate::blend_list::{BlendKind, BlendList};
use crate::command::OutboundMessage;
use crate::params::{ParameterStore, Scalar};
use crate::snapshot::{ApplyReport, SettingsSnapshot};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct ActiveTransition {
    from: Option<SettingsSnapshot>,
    to: SettingsSnapshot,
    started: Instant,
    duration: Duration,
}

/// What a single [`TransitionEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionStep {
    Idle,
    Blending { amount: f32 },
    Committed { report: ApplyReport },
}

/// Timed blend between two snapshots.
///
/// While active, every tick writes the blend-list keys at the current
/// amount. Once the duration has elapsed the whole `to` snapshot is applied
/// verbatim and the engine goes idle. A missing `from` skips the blend and
/// commits on the next tick.
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    blend: BlendList,
    active: Option<ActiveTransition>,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(BlendList::builtin())
    }
}

impl TransitionEngine {
    pub fn new(blend: BlendList) -> Self {
        Self {
            blend,
            active: None,
        }
    }

    pub fn blend(&self) -> &BlendList {
        &self.blend
    }

    /// Starts a new transition, abandoning any in-flight one. Without a `to`
    /// snapshot there is nothing to reach: an in-flight transition keeps
    /// running to its own commit, otherwise the engine stays idle.
    pub fn start(
        &mut self,
        from: Option<SettingsSnapshot>,
        to: Option<SettingsSnapshot>,
        duration: Duration,
        now: Instant,
    ) {
        let Some(to) = to else {
            match &self.active {
                Some(active) => warn!(
                    keeping = %active.to.source(),
                    "transition target missing; finishing the current transition"
                ),
                None => warn!("transition target missing; staying on current settings"),
            }
            return;
        };
        if self.active.is_some() {
            debug!("abandoning in-flight transition");
        }
        if from.is_none() {
            warn!(to = %to.source(), "transition source missing; cutting straight to target");
        }
        info!(
            from = from.as_ref().map(|s| s.source()).unwrap_or("<none>"),
            to = %to.source(),
            secs = duration.as_secs_f32(),
            "starting transition"
        );
        self.active = Some(ActiveTransition {
            from,
            to,
            started: now,
            duration,
        });
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Blend amount in `[0, 1]`, or `None` when idle.
    pub fn progress(&self, now: Instant) -> Option<f32> {
        self.active.as_ref().map(|a| blend_amount(a, now) as f32)
    }

    pub fn target_source(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.to.source())
    }

    pub fn tick(
        &mut self,
        now: Instant,
        store: &mut ParameterStore,
        outbox: &mut Vec<OutboundMessage>,
    ) -> TransitionStep {
        let Some(active) = &self.active else {
            return TransitionStep::Idle;
        };

        let elapsed = now.saturating_duration_since(active.started);
        let Some(from) = active.from.as_ref().filter(|_| elapsed < active.duration) else {
            return self.commit(store, outbox);
        };

        let amount = blend_amount(active, now);
        for entry in self.blend.entries() {
            let (Some(a), Some(b)) = (from.get(&entry.key), active.to.get(&entry.key)) else {
                continue;
            };
            let written = match entry.kind {
                BlendKind::Continuous => match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                    (Ok(a), Ok(b)) => {
                        let v = a + (b - a) * amount;
                        store.set(&entry.key, Scalar::Float(v as f32))
                    }
                    _ => {
                        debug!(key = %entry.key, a, b, "non-numeric blend values; skipping");
                        false
                    }
                },
                BlendKind::Step => {
                    let raw = if amount > 0.5 { b } else { a };
                    store.set_raw(&entry.key, raw).is_ok()
                }
            };
            if written {
                push_echo(store, &entry.key, entry.echo.as_deref(), outbox);
            }
        }

        TransitionStep::Blending {
            amount: amount as f32,
        }
    }

    fn commit(
        &mut self,
        store: &mut ParameterStore,
        outbox: &mut Vec<OutboundMessage>,
    ) -> TransitionStep {
        let Some(active) = self.active.take() else {
            return TransitionStep::Idle;
        };
        let report = active.to.apply_to(store);
        for entry in self.blend.entries() {
            if active.to.get(&entry.key).is_some() {
                push_echo(store, &entry.key, entry.echo.as_deref(), outbox);
            }
        }
        info!(
            to = %active.to.source(),
            applied = report.applied,
            "transition finished"
        );
        TransitionStep::Committed { report }
    }
}

fn blend_amount(active: &ActiveTransition, now: Instant) -> f64 {
    let total = active.duration.as_secs_f64();
    if total <= 0.0 {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(active.started).as_secs_f64();
    (elapsed / total).clamp(0.0, 1.0)
}

fn push_echo(
    store: &ParameterStore,
    key: &str,
    address: Option<&str>,
    outbox: &mut Vec<OutboundMessage>,
) {
    let (Some(address), Ok(value)) = (address, store.get(key)) else {
        return;
    };
    outbox.push(OutboundMessage {
        address: address.to_string(),
        value: value.scalar(),
    });
}
