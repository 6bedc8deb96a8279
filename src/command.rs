use crate::catalog::index_for_cell;
use crate::params::{Scalar, parse_bool};
use crate::registry::{self, DrawMode};
use crate::sim::{CameraControl, SimulationRequest};
use std::fmt;
use std::net::IpAddr;

/// One typed argument of an inbound control message.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    Float(f32),
    Int(i32),
    Bool(bool),
    Str(String),
}

impl CommandArg {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            Self::Bool(v) => Some(f32::from(u8::from(*v))),
            Self::Str(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Float(v) => Some(*v != 0.0),
            Self::Int(v) => Some(*v != 0),
            Self::Bool(v) => Some(*v),
            Self::Str(s) => parse_bool(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub address: String,
    pub args: Vec<CommandArg>,
    /// Sender host, when the message came off the network.
    pub origin: Option<IpAddr>,
}

impl InboundMessage {
    pub fn new(address: impl Into<String>, args: Vec<CommandArg>) -> Self {
        Self {
            address: address.into(),
            args,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: IpAddr) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// Value pushed back to the remote so its controls follow the installation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub address: String,
    pub value: Scalar,
}

/// A decoded control message, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Heartbeat,
    Set { key: &'static str, value: Scalar },
    SetMany(Vec<(&'static str, Scalar)>),
    Toggle(&'static str),
    Cycle(&'static str),
    SelectDrawMode(DrawMode),
    NextSnapshot,
    JumpToSnapshot(usize),
    AutopilotRequest(bool),
    IrJump,
    IrAutogain(bool),
    Simulation(SimulationRequest),
    /// Recognized, but gated off by a false argument or out of range.
    NoEffect,
}

impl Command {
    /// Everything except the heartbeat counts as someone at the controls.
    pub fn is_activity(&self) -> bool {
        !matches!(self, Self::Heartbeat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    MissingArgument { address: String },
    BadArgument { address: String },
    BadIndex { address: String, segment: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument { address } => write!(f, "{address}: missing argument"),
            Self::BadArgument { address } => write!(f, "{address}: argument has the wrong type"),
            Self::BadIndex { address, segment } => {
                write!(f, "{address}: bad index segment '{segment}'")
            }
        }
    }
}

impl std::error::Error for CommandError {}

pub const HEARTBEAT: &str = "helo";
const EFFECTS_PREFIX: &str = "/1/effects/";
const JUMP_PREFIX: &str = "/settings/jump_to_setting/";

const FLOAT_ROUTES: &[(&str, &str)] = &[
    ("/1/strength", registry::OPTICAL_FLOW_STRENGTH),
    ("/1/speed", registry::FLUID_SPEED),
    ("/1/cutoff", registry::RECOLOR_CUTOFF),
    ("/1/spawn_hue", registry::PARTICLE_SPAWN_HUE),
    ("/1/over_color", registry::VELOCITY_MASK_HUE_OFFSET),
    ("/1/particle_size", registry::PARTICLE_SIZE),
    ("/1/gravity_y", registry::FLUID_GRAVITY_Y),
    ("/1/dissipation", registry::FLUID_DISSIPATION),
    ("/settings/jump_between_states_time", registry::JUMP_INTERVAL),
];

const BOOL_ROUTES: &[(&str, &str)] = &[
    ("/1/kinect_filter_users", registry::KINECT_FILTER_USERS),
    ("/1/ps_eye_raw_optical_flow", registry::PS_EYE_RAW_OPTICAL_FLOW),
];

const TOGGLE_ROUTES: &[(&str, &str)] = &[
    ("/1/draw_camera", registry::DRAW_CAMERA_BACKGROUND),
    ("/1/stretch", registry::PARTICLE_STRETCH),
];

const CYCLE_ROUTES: &[(&str, &str)] = &[("/1/source", registry::SOURCE_MODE)];

/// Address the remote listens on for `key`, for keys it has a control for.
pub fn echo_address_for(key: &str) -> Option<&'static str> {
    FLOAT_ROUTES
        .iter()
        .find(|(address, k)| *k == key && address.starts_with("/1/"))
        .map(|(address, _)| *address)
}

/// Remote effect buttons map onto a subset of the draw modes.
pub fn draw_mode_for_effect(n: usize) -> Option<DrawMode> {
    match n {
        0 | 1 => Some(DrawMode::Composite),
        2 => Some(DrawMode::FluidDensity),
        3 => Some(DrawMode::Particles),
        4 => Some(DrawMode::Displacement),
        _ => None,
    }
}

/// Decodes one message. `Ok(None)` means the address is not part of the
/// protocol; the caller drops it.
pub fn decode(msg: &InboundMessage) -> Result<Option<Command>, CommandError> {
    let address = msg.address.as_str();

    if address == HEARTBEAT {
        return Ok(Some(Command::Heartbeat));
    }
    if let Some(key) = lookup(FLOAT_ROUTES, address) {
        let value = float_arg(msg)?;
        return Ok(Some(Command::Set {
            key,
            value: Scalar::Float(value),
        }));
    }
    if let Some(key) = lookup(BOOL_ROUTES, address) {
        let value = bool_arg(msg)?;
        return Ok(Some(Command::Set {
            key,
            value: Scalar::Bool(value),
        }));
    }
    if let Some(key) = lookup(TOGGLE_ROUTES, address) {
        return gated(msg, || Ok(Command::Toggle(key)));
    }
    if let Some(key) = lookup(CYCLE_ROUTES, address) {
        return gated(msg, || Ok(Command::Cycle(key)));
    }

    match address {
        "/1/animate_scale" => {
            let on = Scalar::Bool(bool_arg(msg)?);
            Ok(Some(Command::SetMany(vec![
                (registry::RECOLOR_ANIMATE_SCALE, on),
                (registry::RECOLOR_ANIMATE_OFFSET, on),
            ])))
        }
        "/settings/transition_time" => gated(msg, || {
            Ok(Command::Set {
                key: registry::TRANSITION_TIME,
                value: Scalar::Float(float_arg(msg)?),
            })
        }),
        "/settings/ir_autogain" => Ok(Some(Command::IrAutogain(bool_arg(msg)?))),
        "/settings/animate" => Ok(Some(Command::AutopilotRequest(bool_arg(msg)?))),
        "/1/next_effect" => gated(msg, || Ok(Command::NextSnapshot)),
        "/1/reset" => gated(msg, || Ok(Command::Simulation(SimulationRequest::Reset))),
        "/1/ir_jump" => gated(msg, || Ok(Command::IrJump)),
        "/1/ir_exposure" => camera(msg, CameraControl::Exposure),
        "/1/ir_gain" => camera(msg, CameraControl::Gain),
        "/1/ir_hue" => camera(msg, CameraControl::Hue),
        _ => decode_indexed(msg),
    }
}

fn decode_indexed(msg: &InboundMessage) -> Result<Option<Command>, CommandError> {
    let address = msg.address.as_str();

    if let Some(rest) = address.strip_prefix(EFFECTS_PREFIX) {
        return gated(msg, || {
            let segment = rest.rsplit('/').next().unwrap_or(rest);
            let n = parse_index(address, segment)?;
            Ok(draw_mode_for_effect(n).map_or(Command::NoEffect, Command::SelectDrawMode))
        });
    }

    if let Some(rest) = address.strip_prefix(JUMP_PREFIX) {
        return gated(msg, || {
            let Some((row, col)) = rest.split_once('/') else {
                return Err(CommandError::BadIndex {
                    address: address.to_string(),
                    segment: rest.to_string(),
                });
            };
            let row = parse_index(address, row)?;
            let col = parse_index(address, col)?;
            index_for_cell(row, col)
                .map(Command::JumpToSnapshot)
                .ok_or_else(|| CommandError::BadIndex {
                    address: address.to_string(),
                    segment: rest.to_string(),
                })
        });
    }

    Ok(None)
}

fn lookup(table: &[(&str, &'static str)], address: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(route, _)| *route == address)
        .map(|(_, key)| *key)
}

/// Fires `make` only when the first argument is true; false is a no-op.
fn gated(
    msg: &InboundMessage,
    make: impl FnOnce() -> Result<Command, CommandError>,
) -> Result<Option<Command>, CommandError> {
    if bool_arg(msg)? {
        make().map(Some)
    } else {
        Ok(Some(Command::NoEffect))
    }
}

fn camera(
    msg: &InboundMessage,
    control: impl FnOnce(f32) -> CameraControl,
) -> Result<Option<Command>, CommandError> {
    let value = float_arg(msg)?;
    Ok(Some(Command::Simulation(SimulationRequest::Camera(control(value)))))
}

fn first_arg(msg: &InboundMessage) -> Result<&CommandArg, CommandError> {
    msg.args.first().ok_or_else(|| CommandError::MissingArgument {
        address: msg.address.clone(),
    })
}

fn float_arg(msg: &InboundMessage) -> Result<f32, CommandError> {
    first_arg(msg)?
        .as_f32()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::BadArgument {
            address: msg.address.clone(),
        })
}

fn bool_arg(msg: &InboundMessage) -> Result<bool, CommandError> {
    first_arg(msg)?
        .as_bool()
        .ok_or_else(|| CommandError::BadArgument {
            address: msg.address.clone(),
        })
}

fn parse_index(address: &str, segment: &str) -> Result<usize, CommandError> {
    segment
        .trim()
        .parse::<usize>()
        .map_err(|_| CommandError::BadIndex {
            address: address.to_string(),
            segment: segment.to_string(),
        })
}
