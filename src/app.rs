use crate::autopilot::{AutopilotController, PilotMode, duration_from_secs};
use crate::blend_list::BlendList;
use crate::catalog::SnapshotCatalog;
use crate::config::Config;
use crate::installation::{Installation, TickReport};
use crate::keyboard::{self, KeyAction};
use crate::osc::{OscEcho, OscReceiver};
use crate::params::Scalar;
use crate::registry::{self, DrawMode, SourceMode};
use crate::sim::LoggingSimulation;
use crate::snapshot::SnapshotError;
use crate::terminal::HudScreen;
use crate::transition::TransitionEngine;
use anyhow::Context;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let mut installation = build_installation(&cfg, Instant::now())?;
    let mut receiver = OscReceiver::bind(cfg.osc_port, cfg.port_probe, cfg.queue_capacity)?;
    let echo = if cfg.echo {
        Some(OscEcho::new(cfg.echo_port)?)
    } else {
        None
    };

    if cfg.headless {
        run_headless(&cfg, &mut installation, &mut receiver, echo.as_ref())
    } else {
        run_hud(&cfg, &mut installation, &mut receiver, echo.as_ref())
    }
}

/// Live store from the registry and the base file, CLI timing overrides,
/// then the start-up snapshot on top.
pub fn build_installation(cfg: &Config, now: Instant) -> anyhow::Result<Installation> {
    let catalog = SnapshotCatalog::new(&cfg.settings_dir);
    let mut store = registry::default_store();

    match catalog.load_base() {
        Ok(base) => {
            let report = base.apply_to(&mut store);
            info!(path = %catalog.base_path().display(), applied = report.applied, "loaded base settings");
        }
        Err(SnapshotError::NotFound(path)) => {
            catalog
                .save_base(&store)
                .with_context(|| format!("write default settings to {}", path.display()))?;
            info!(path = %path.display(), "created base settings with defaults");
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("load base settings {}", catalog.base_path().display())
            });
        }
    }

    if let Some(secs) = cfg.transition_secs {
        store.set(registry::TRANSITION_TIME, Scalar::Float(secs));
    }
    if let Some(secs) = cfg.jump_interval_secs {
        store.set(registry::JUMP_INTERVAL, Scalar::Float(secs));
    }

    let blend = match &cfg.blend_list {
        Some(path) => BlendList::load(path)
            .with_context(|| format!("load blend list {}", path.display()))?,
        None => BlendList::builtin(),
    };

    let interval = store.get_f32(registry::JUMP_INTERVAL).unwrap_or(0.0);
    let autopilot = AutopilotController::new(
        duration_from_secs(cfg.idle_secs),
        duration_from_secs(interval),
        now,
    );

    let mut installation = Installation::new(
        store,
        catalog,
        TransitionEngine::new(blend),
        autopilot,
        Box::new(LoggingSimulation::default()),
    );
    if let Err(err) = installation.load_initial(cfg.start_index) {
        warn!(index = cfg.start_index, %err, "start-up snapshot unavailable; running on base settings");
    }
    Ok(installation)
}

fn run_headless(
    cfg: &Config,
    installation: &mut Installation,
    receiver: &mut OscReceiver,
    echo: Option<&OscEcho>,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let deadline = cfg.run_secs.map(|s| start + duration_from_secs(s));
    let frame = cfg.frame_interval();
    info!(fps = cfg.fps, "running headless");

    loop {
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            info!("run time elapsed; stopping");
            return Ok(());
        }
        step(installation, receiver, echo, now);
        pace(now, frame);
    }
}

fn run_hud(
    cfg: &Config,
    installation: &mut Installation,
    receiver: &mut OscReceiver,
    echo: Option<&OscEcho>,
) -> anyhow::Result<()> {
    let mut screen = HudScreen::open()?;
    let frame = cfg.frame_interval();

    let mut hud = HudState {
        show_details: true,
        status: String::from("ready"),
        messages: 0,
        echo_on: echo.is_some(),
    };

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking).
        while event::poll(Duration::ZERO)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Release {
                    continue;
                }
                match keyboard::map_key(k.code, k.modifiers) {
                    Some(KeyAction::Quit) => return Ok(()),
                    Some(KeyAction::ToggleHud) => hud.show_details = !hud.show_details,
                    Some(action) => {
                        if let Some(status) = apply_key_action(installation, action, now) {
                            hud.status = status;
                        }
                    }
                    None => {}
                }
            }
        }

        let report = step(installation, receiver, echo, now);
        hud.messages += report.applied + report.heartbeats;

        screen.draw(&status_lines(installation, receiver, &hud, now))?;

        pace(now, frame);
    }
}

/// Runs a keyboard action; returns a status line when there is news.
pub fn apply_key_action(
    installation: &mut Installation,
    action: KeyAction,
    now: Instant,
) -> Option<String> {
    match action {
        KeyAction::Quit | KeyAction::ToggleHud => None,
        KeyAction::EngageAutopilot => {
            installation.engage_autopilot(now);
            Some("auto pilot engaged".to_string())
        }
        KeyAction::Command(cmd) => {
            installation.handle_command(cmd, now);
            None
        }
        KeyAction::Nudge { key, delta } => {
            installation.nudge(key, delta, now);
            None
        }
        KeyAction::CutToNext => {
            installation.cut_to_next(now);
            Some(format!("cut to snapshot {}", installation.current_index()))
        }
        KeyAction::SaveSnapshot => match installation.save_new_snapshot(now) {
            Ok(index) => Some(format!("saved snapshot {index}")),
            Err(err) => {
                warn!(%err, "saving snapshot failed");
                Some(format!("save failed: {err}"))
            }
        },
        KeyAction::SaveBase => match installation.save_base(now) {
            Ok(()) => Some("saved live settings".to_string()),
            Err(err) => {
                warn!(%err, "saving live settings failed");
                Some(format!("save failed: {err}"))
            }
        },
    }
}

fn step(
    installation: &mut Installation,
    receiver: &mut OscReceiver,
    echo: Option<&OscEcho>,
    now: Instant,
) -> TickReport {
    let report = installation.tick(now, receiver.drain());
    let outbox = installation.take_outbox();
    if let (Some(echo), Some(peer)) = (echo, installation.peer()) {
        if !outbox.is_empty() {
            echo.send(peer, &outbox);
        }
    }
    report
}

fn pace(frame_start: Instant, target: Duration) {
    let elapsed = frame_start.elapsed();
    if elapsed < target {
        std::thread::sleep(target - elapsed);
    }
}

struct HudState {
    show_details: bool,
    status: String,
    messages: usize,
    echo_on: bool,
}

fn status_lines(
    installation: &Installation,
    receiver: &OscReceiver,
    hud: &HudState,
    now: Instant,
) -> Vec<String> {
    let store = installation.store();
    let autopilot = installation.autopilot();
    let transition = installation.transition();

    let transition_label = match (transition.progress(now), transition.target_source()) {
        (Some(p), Some(target)) => format!("{:>3.0}% -> {target}", p * 100.0),
        _ => "idle".to_string(),
    };
    let next_label = match autopilot.next_event_in(now) {
        Some(d) if autopilot.mode() == PilotMode::Manual => format!("auto in {:.1}s", d.as_secs_f32()),
        Some(d) => format!("next in {:.1}s", d.as_secs_f32()),
        None => "cycling off".to_string(),
    };

    let mut lines = vec![format!(
        "fluid_pilot | {} | snapshot {}/{} | transition {} | {}",
        autopilot.mode().label(),
        installation.current_index(),
        installation.catalog().count(),
        transition_label,
        next_label,
    )];
    if !hud.show_details {
        return lines;
    }

    let draw = store
        .get_i32(registry::DRAW_MODE)
        .and_then(DrawMode::from_index)
        .map_or("?", DrawMode::label);
    let source = store
        .get_i32(registry::SOURCE_MODE)
        .and_then(SourceMode::from_index)
        .map_or("?", SourceMode::label);
    let f = |key: &str| store.get_f32(key).unwrap_or(0.0);

    lines.push(format!(
        "osc {} | peer {} | echo {} | msgs {} | dropped {}",
        receiver.local_addr(),
        installation
            .peer()
            .map_or_else(|| "-".to_string(), |p| p.to_string()),
        if hud.echo_on { "on" } else { "off" },
        hud.messages,
        receiver.dropped(),
    ));
    lines.push(format!(
        "draw {draw} | source {source} | speed {:.3} | strength {:.3} | cutoff {:.4} | spawn hue {:.3} | size {:.2}",
        f(registry::FLUID_SPEED),
        f(registry::OPTICAL_FLOW_STRENGTH),
        f(registry::RECOLOR_CUTOFF),
        f(registry::PARTICLE_SPAWN_HUE),
        f(registry::PARTICLE_SIZE),
    ));
    lines.push(format!(
        "transition time {:.1}s | jump interval {:.1}s | idle {:.1}s",
        f(registry::TRANSITION_TIME),
        f(registry::JUMP_INTERVAL),
        autopilot.idle_for(now).as_secs_f32(),
    ));
    lines.push(format!("> {}", hud.status));
    lines.push(
        "k next  l cut  m save new  w save base  p auto  0-6 draw  h hud  q quit".to_string(),
    );
    lines
}
