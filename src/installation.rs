use crate::autopilot::{AutopilotController, PilotEvent, PilotMode, duration_from_secs};
use crate::catalog::SnapshotCatalog;
use crate::command::{self, Command, InboundMessage, OutboundMessage};
use crate::params::{ParameterStore, Scalar};
use crate::presence::PresenceFilter;
use crate::registry::{self, DrawMode, SourceMode};
use crate::sim::{CameraControl, Simulation};
use crate::snapshot::{ApplyReport, SettingsSnapshot, SnapshotError};
use crate::transition::{TransitionEngine, TransitionStep};
use std::net::IpAddr;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How one inbound message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Applied,
    Heartbeat,
    Unrecognized,
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub applied: usize,
    pub heartbeats: usize,
    pub unrecognized: usize,
    pub malformed: usize,
    pub pilot: PilotEvent,
    pub transition: TransitionStep,
}

impl Default for TickReport {
    fn default() -> Self {
        Self {
            applied: 0,
            heartbeats: 0,
            unrecognized: 0,
            malformed: 0,
            pilot: PilotEvent::None,
            transition: TransitionStep::Idle,
        }
    }
}

/// Everything the control layer owns: the live store, the snapshot catalog,
/// the transition engine and the autopilot, plus the simulation seam.
///
/// Single-threaded; [`Installation::tick`] is called once per frame.
pub struct Installation {
    store: ParameterStore,
    catalog: SnapshotCatalog,
    transition: TransitionEngine,
    autopilot: AutopilotController,
    simulation: Box<dyn Simulation>,
    presence: PresenceFilter,
    current_index: usize,
    outbox: Vec<OutboundMessage>,
    peer: Option<IpAddr>,
}

impl Installation {
    pub fn new(
        store: ParameterStore,
        catalog: SnapshotCatalog,
        transition: TransitionEngine,
        autopilot: AutopilotController,
        simulation: Box<dyn Simulation>,
    ) -> Self {
        Self {
            store,
            catalog,
            transition,
            autopilot,
            simulation,
            presence: PresenceFilter::default(),
            current_index: 1,
            outbox: Vec::new(),
            peer: None,
        }
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    pub fn catalog(&self) -> &SnapshotCatalog {
        &self.catalog
    }

    pub fn transition(&self) -> &TransitionEngine {
        &self.transition
    }

    pub fn autopilot(&self) -> &AutopilotController {
        &self.autopilot
    }

    pub fn mode(&self) -> PilotMode {
        self.autopilot.mode()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Remote host learned from the first inbound message that had one.
    pub fn peer(&self) -> Option<IpAddr> {
        self.peer
    }

    pub fn take_outbox(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Applies snapshot `index` directly, without a transition, and makes it
    /// current. The index becomes current even when the file is missing.
    pub fn load_initial(&mut self, index: usize) -> Result<ApplyReport, SnapshotError> {
        self.current_index = index.max(1);
        let snap = self.catalog.load(self.current_index)?;
        let report = snap.apply_to(&mut self.store);
        info!(index = self.current_index, applied = report.applied, "loaded start-up snapshot");
        Ok(report)
    }

    /// One frame: drain messages, run the autopilot, step the transition,
    /// then let presence drive the user filter.
    pub fn tick(
        &mut self,
        now: Instant,
        messages: impl IntoIterator<Item = InboundMessage>,
    ) -> TickReport {
        let mut report = TickReport::default();

        for msg in messages {
            match self.process_message(msg, now) {
                MessageOutcome::Applied => report.applied += 1,
                MessageOutcome::Heartbeat => report.heartbeats += 1,
                MessageOutcome::Unrecognized => report.unrecognized += 1,
                MessageOutcome::Malformed => report.malformed += 1,
            }
        }

        if let Some(secs) = self.store.get_f32(registry::JUMP_INTERVAL) {
            self.autopilot.set_cycle_interval_secs(secs);
        }
        report.pilot = self.autopilot.tick(now);
        if matches!(report.pilot, PilotEvent::EnteredAuto | PilotEvent::Cycle) {
            self.cycle_to_next(now);
        }

        report.transition = self.transition.tick(now, &mut self.store, &mut self.outbox);
        self.update_presence(now);
        report
    }

    pub fn presence(&self) -> &PresenceFilter {
        &self.presence
    }

    pub fn process_message(&mut self, msg: InboundMessage, now: Instant) -> MessageOutcome {
        if self.peer.is_none() {
            if let Some(origin) = msg.origin {
                info!(peer = %origin, "learned remote peer");
                self.peer = Some(origin);
            }
        }

        match command::decode(&msg) {
            Ok(Some(cmd)) => {
                let activity = cmd.is_activity();
                self.handle_command(cmd, now);
                if activity {
                    MessageOutcome::Applied
                } else {
                    MessageOutcome::Heartbeat
                }
            }
            Ok(None) => {
                debug!(address = %msg.address, "ignoring unrecognized message");
                MessageOutcome::Unrecognized
            }
            Err(err) => {
                warn!(%err, "dropping malformed message");
                MessageOutcome::Malformed
            }
        }
    }

    /// Applies a decoded command, then records it as activity exactly once.
    pub fn handle_command(&mut self, cmd: Command, now: Instant) {
        let activity = cmd.is_activity();
        self.apply(cmd, now);
        if activity {
            self.autopilot.on_external_command(now);
        }
    }

    /// Keyboard step of a numeric parameter; counts as activity.
    pub fn nudge(&mut self, key: &str, delta: f32, now: Instant) {
        if self.store.nudge(key, delta) {
            self.echo(key);
        }
        self.autopilot.on_external_command(now);
    }

    /// Zeroes the transition time and moves to the next snapshot, so the
    /// next tick lands on it in one step.
    pub fn cut_to_next(&mut self, now: Instant) {
        self.store.set(registry::TRANSITION_TIME, Scalar::Float(0.0));
        self.handle_command(Command::NextSnapshot, now);
    }

    /// Enters auto straight away instead of waiting for the idle threshold.
    pub fn engage_autopilot(&mut self, now: Instant) {
        if self.autopilot.engage(now) == PilotEvent::EnteredAuto {
            self.cycle_to_next(now);
        }
    }

    pub fn save_new_snapshot(&mut self, now: Instant) -> Result<usize, SnapshotError> {
        self.autopilot.on_external_command(now);
        let index = self.catalog.save_new(&self.store)?;
        self.current_index = index;
        Ok(index)
    }

    pub fn save_base(&mut self, now: Instant) -> Result<(), SnapshotError> {
        self.autopilot.on_external_command(now);
        self.catalog.save_base(&self.store)?;
        info!(path = %self.catalog.base_path().display(), "saved live settings");
        Ok(())
    }

    /// Round-robin step to the successor of the current snapshot.
    pub fn cycle_to_next(&mut self, now: Instant) {
        let next = self.catalog.next_index_after(self.current_index);
        self.jump_to(next, now);
    }

    /// Starts a transition from the current snapshot to `index`. The index
    /// becomes current right away so back-to-back jumps chain; a target that
    /// cannot be loaded leaves the current index and any running transition
    /// alone.
    pub fn jump_to(&mut self, index: usize, now: Instant) {
        let from = self.load_logged(self.current_index);
        let to = self.load_logged(index);
        let secs = self.store.get_f32(registry::TRANSITION_TIME).unwrap_or(0.0);
        let found = to.is_some();
        self.transition.start(from, to, duration_from_secs(secs), now);
        if found {
            self.current_index = index;
        }
    }

    fn apply(&mut self, cmd: Command, now: Instant) {
        match cmd {
            Command::Heartbeat | Command::NoEffect => {}
            Command::Set { key, value } => self.set_param(key, value),
            Command::SetMany(pairs) => {
                for (key, value) in pairs {
                    self.set_param(key, value);
                }
            }
            Command::Toggle(key) => {
                self.store.toggle(key);
            }
            Command::Cycle(key) => {
                self.store.cycle(key);
            }
            Command::SelectDrawMode(mode) => self.select_draw_mode(mode),
            Command::NextSnapshot => self.cycle_to_next(now),
            Command::JumpToSnapshot(index) => self.jump_to(index, now),
            Command::AutopilotRequest(on) => {
                debug!(on, "autopilot request counts as activity; idle timer decides");
            }
            Command::IrJump => self.ir_jump(),
            Command::IrAutogain(on) => {
                self.store.set(registry::IR_AUTOGAIN, Scalar::Bool(on));
                self.simulation.camera(CameraControl::AutoGain(on));
            }
            Command::Simulation(request) => self.simulation.handle(request),
        }
    }

    fn set_param(&mut self, key: &str, value: Scalar) {
        if self.store.set(key, value) {
            self.echo(key);
        }
    }

    /// Depth-camera user filter follows who is in frame, on the Kinect
    /// source only.
    fn update_presence(&mut self, now: Instant) {
        if self.store.get_i32(registry::SOURCE_MODE) != Some(SourceMode::Kinect.index()) {
            return;
        }
        let tracked = self.simulation.tracked_people();
        let filter_on = self.store.get_bool(registry::KINECT_FILTER_USERS).unwrap_or(false);
        let auto = self.autopilot.mode() == PilotMode::Auto;
        if let Some(on) = self.presence.update(now, tracked, filter_on, auto) {
            self.store.set(registry::KINECT_FILTER_USERS, Scalar::Bool(on));
        }
    }

    fn select_draw_mode(&mut self, mode: DrawMode) {
        self.store
            .set(registry::DRAW_MODE, Scalar::Int(mode.index()));
    }

    fn ir_jump(&mut self) {
        let on_eye = self.store.get_i32(registry::SOURCE_MODE) == Some(SourceMode::Ps3Eye.index());
        if on_eye {
            self.store.cycle(registry::PS_EYE_CAMERA);
        } else {
            self.store
                .set(registry::SOURCE_MODE, Scalar::Int(SourceMode::Ps3Eye.index()));
        }
    }

    fn echo(&mut self, key: &str) {
        let (Some(address), Ok(value)) = (command::echo_address_for(key), self.store.get(key)) else {
            return;
        };
        self.outbox.push(OutboundMessage {
            address: address.to_string(),
            value: value.scalar(),
        });
    }

    fn load_logged(&self, index: usize) -> Option<SettingsSnapshot> {
        match self.catalog.load(index) {
            Ok(snap) => Some(snap),
            Err(err) => {
                warn!(index, %err, "could not load snapshot");
                None
            }
        }
    }
}
