use crate::command::Command;
use crate::registry::{self, DrawMode};
use crate::sim::SimulationRequest;
use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Quit,
    ToggleHud,
    EngageAutopilot,
    Command(Command),
    Nudge { key: &'static str, delta: f32 },
    CutToNext,
    SaveSnapshot,
    SaveBase,
}

impl KeyAction {
    /// Quit, HUD and autopilot keys do not count as someone at the controls.
    pub fn is_activity(&self) -> bool {
        !matches!(self, Self::Quit | Self::ToggleHud | Self::EngageAutopilot)
    }
}

fn nudge(key: &'static str, delta: f32) -> Option<KeyAction> {
    Some(KeyAction::Nudge { key, delta })
}

fn draw(mode: DrawMode) -> Option<KeyAction> {
    Some(KeyAction::Command(Command::SelectDrawMode(mode)))
}

pub fn map_key(code: KeyCode, mods: KeyModifiers) -> Option<KeyAction> {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return Some(KeyAction::Quit);
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(KeyAction::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Tab => Some(KeyAction::ToggleHud),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(KeyAction::EngageAutopilot),

        KeyCode::Char('0') | KeyCode::Char('1') => draw(DrawMode::Composite),
        KeyCode::Char('2') => draw(DrawMode::FluidDensity),
        KeyCode::Char('3') => draw(DrawMode::Particles),
        KeyCode::Char('4') => draw(DrawMode::VelocityDots),
        KeyCode::Char('5') => draw(DrawMode::FluidVelocity),
        KeyCode::Char('6') => draw(DrawMode::Displacement),

        KeyCode::Up => nudge(registry::FLUID_SPEED, 0.2),
        KeyCode::Down => nudge(registry::FLUID_SPEED, -0.2),
        KeyCode::Right => nudge(registry::OPTICAL_FLOW_STRENGTH, 1.0),
        KeyCode::Left => nudge(registry::OPTICAL_FLOW_STRENGTH, -1.0),
        KeyCode::Char('o') | KeyCode::Char('O') => nudge(registry::VELOCITY_MASK_HUE_OFFSET, 0.01),
        KeyCode::Char('i') | KeyCode::Char('I') => {
            nudge(registry::VELOCITY_MASK_HUE_OFFSET, -0.01)
        }
        KeyCode::Char('s') => nudge(registry::RECOLOR_CUTOFF, 0.0001),
        KeyCode::Char('S') => nudge(registry::RECOLOR_CUTOFF, 0.001),
        KeyCode::Char('a') => nudge(registry::RECOLOR_CUTOFF, -0.0001),
        KeyCode::Char('A') => nudge(registry::RECOLOR_CUTOFF, -0.001),
        KeyCode::Char('v') => nudge(registry::PARTICLE_SPAWN_HUE, 0.001),
        KeyCode::Char('V') => nudge(registry::PARTICLE_SPAWN_HUE, 0.01),
        KeyCode::Char('b') => nudge(registry::PARTICLE_SPAWN_HUE, -0.001),
        KeyCode::Char('B') => nudge(registry::PARTICLE_SPAWN_HUE, -0.01),
        KeyCode::Char('.') | KeyCode::Char('>') => nudge(registry::PARTICLE_SIZE, 0.1),
        KeyCode::Char(',') | KeyCode::Char('<') => nudge(registry::PARTICLE_SIZE, -0.1),

        KeyCode::Char('c') | KeyCode::Char('C') => Some(KeyAction::Command(Command::Toggle(
            registry::DRAW_CAMERA_BACKGROUND,
        ))),
        KeyCode::Char('z') | KeyCode::Char('Z') => {
            Some(KeyAction::Command(Command::Cycle(registry::SOURCE_MODE)))
        }
        KeyCode::Char('x') | KeyCode::Char('X') => {
            Some(KeyAction::Command(Command::Cycle(registry::PS_EYE_CAMERA)))
        }
        KeyCode::Char('r') | KeyCode::Char('R') => Some(KeyAction::Command(Command::Simulation(
            SimulationRequest::Reset,
        ))),
        KeyCode::Char('k') | KeyCode::Char('K') => {
            Some(KeyAction::Command(Command::NextSnapshot))
        }
        KeyCode::Char('l') | KeyCode::Char('L') => Some(KeyAction::CutToNext),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(KeyAction::SaveSnapshot),
        KeyCode::Char('w') | KeyCode::Char('W') => Some(KeyAction::SaveBase),
        _ => None,
    }
}
