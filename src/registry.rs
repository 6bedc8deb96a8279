use crate::params::{ParameterStore, ParameterValue};

pub const OPTICAL_FLOW_STRENGTH: &str = "settings:optical_flow:strength";
pub const OPTICAL_FLOW_THRESHOLD: &str = "settings:optical_flow:threshold";
pub const VELOCITY_MASK_STRENGTH: &str = "settings:velocity_mask:strength";
pub const VELOCITY_MASK_HUE_OFFSET: &str = "settings:velocity_mask:hue_offset";
pub const RECOLOR_CUTOFF: &str = "settings:recolor:cutoff";
pub const RECOLOR_ANIMATE_SCALE: &str = "settings:recolor:animate_scale";
pub const RECOLOR_ANIMATE_OFFSET: &str = "settings:recolor:animate_offset";
pub const FLUID_SPEED: &str = "settings:fluid_solver:speed";
pub const FLUID_CELL_SIZE: &str = "settings:fluid_solver:cell_size";
pub const FLUID_VISCOSITY: &str = "settings:fluid_solver:viscosity";
pub const FLUID_VORTICITY: &str = "settings:fluid_solver:vorticity";
pub const FLUID_DISSIPATION: &str = "settings:fluid_solver:dissipation";
pub const FLUID_GRAVITY_X: &str = "settings:fluid_solver:gravity_x";
pub const FLUID_GRAVITY_Y: &str = "settings:fluid_solver:gravity_y";
pub const PARTICLE_SPAWN_HUE: &str = "settings:particle_flow:spawn_hue";
pub const PARTICLE_SIZE: &str = "settings:particle_flow:size";
pub const PARTICLE_MASS: &str = "settings:particle_flow:mass";
pub const PARTICLE_MASS_SPREAD: &str = "settings:particle_flow:mass_spread";
pub const PARTICLE_LIFESPAN: &str = "settings:particle_flow:lifespan";
pub const PARTICLE_CELL_SIZE: &str = "settings:particle_flow:cell_size";
pub const PARTICLE_STRETCH: &str = "settings:particle_flow:stretch";
pub const DRAW_MODE: &str = "settings:draw:mode";
pub const DRAW_CAMERA_BACKGROUND: &str = "settings:draw:camera_background";
pub const SOURCE_MODE: &str = "settings:source:mode";
pub const PS_EYE_CAMERA: &str = "settings:source:ps_eye_camera";
pub const KINECT_FILTER_USERS: &str = "settings:source:kinect_filter_users";
pub const PS_EYE_RAW_OPTICAL_FLOW: &str = "settings:source:ps_eye_raw_optical_flow";
pub const IR_AUTOGAIN: &str = "settings:source:ir_autogain";
pub const TRANSITION_GROUP: &str = "settings:settings_transition";
pub const TRANSITION_TIME: &str = "settings:settings_transition:transition_time";
pub const JUMP_INTERVAL: &str = "settings:settings_transition:jump_between_interval";

pub const PS_EYE_CAMERA_SLOTS: i32 = 3;
pub const MAX_TRANSITION_SECS: f32 = 720.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Composite,
    FluidDensity,
    Particles,
    VelocityDots,
    FluidFields,
    FluidVelocity,
    FluidPressure,
    FluidTemperature,
    FluidDivergence,
    FluidVorticity,
    FluidBuoyancy,
    FluidObstacle,
    FlowMask,
    OpticalFlow,
    Source,
    Mouse,
    Displacement,
}

impl DrawMode {
    pub const COUNT: usize = 17;

    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Composite,
            Self::FluidDensity,
            Self::Particles,
            Self::VelocityDots,
            Self::FluidFields,
            Self::FluidVelocity,
            Self::FluidPressure,
            Self::FluidTemperature,
            Self::FluidDivergence,
            Self::FluidVorticity,
            Self::FluidBuoyancy,
            Self::FluidObstacle,
            Self::FlowMask,
            Self::OpticalFlow,
            Self::Source,
            Self::Mouse,
            Self::Displacement,
        ]
    }

    pub fn index(self) -> i32 {
        Self::all().iter().position(|m| *m == self).unwrap_or(0) as i32
    }

    pub fn from_index(idx: i32) -> Option<Self> {
        usize::try_from(idx).ok().and_then(|i| Self::all().get(i).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Composite => "Composite",
            Self::FluidDensity => "Fluid Density",
            Self::Particles => "Particles",
            Self::VelocityDots => "VelDots",
            Self::FluidFields => "Fluid Fields",
            Self::FluidVelocity => "Fluid Velocity",
            Self::FluidPressure => "Fluid Pressure",
            Self::FluidTemperature => "Fluid Temperature",
            Self::FluidDivergence => "Fluid Divergence",
            Self::FluidVorticity => "Fluid Vorticity",
            Self::FluidBuoyancy => "Fluid Buoyancy",
            Self::FluidObstacle => "Fluid Obstacle",
            Self::FlowMask => "Flow Mask",
            Self::OpticalFlow => "Optical Flow",
            Self::Source => "Source",
            Self::Mouse => "Left Mouse",
            Self::Displacement => "Displacement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Kinect,
    Ps3Eye,
}

impl SourceMode {
    pub const COUNT: usize = 2;

    pub fn index(self) -> i32 {
        match self {
            Self::Kinect => 0,
            Self::Ps3Eye => 1,
        }
    }

    pub fn from_index(idx: i32) -> Option<Self> {
        match idx {
            0 => Some(Self::Kinect),
            1 => Some(Self::Ps3Eye),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Kinect => "Kinect",
            Self::Ps3Eye => "PS3 Eye",
        }
    }
}

/// Keys that describe the running session rather than a look; numbered
/// snapshots never carry them.
pub fn is_volatile_key(key: &str) -> bool {
    crate::params::key_in_group(key, TRANSITION_GROUP) || key == SOURCE_MODE
}

pub fn default_store() -> ParameterStore {
    let mut s = ParameterStore::new();

    s.declare(OPTICAL_FLOW_STRENGTH, ParameterValue::float(1.0, 0.0, 100.0));
    s.declare(OPTICAL_FLOW_THRESHOLD, ParameterValue::float(0.02, 0.0, 0.2));

    s.declare(VELOCITY_MASK_STRENGTH, ParameterValue::float(1.0, 0.0, 10.0));
    s.declare(VELOCITY_MASK_HUE_OFFSET, ParameterValue::float(0.0, 0.0, 1.0));

    s.declare(RECOLOR_CUTOFF, ParameterValue::float(0.5, 0.0, 1.0));
    s.declare(RECOLOR_ANIMATE_SCALE, ParameterValue::Bool(false));
    s.declare(RECOLOR_ANIMATE_OFFSET, ParameterValue::Bool(false));

    s.declare(FLUID_SPEED, ParameterValue::float(10.0, 0.0, 100.0));
    s.declare(FLUID_CELL_SIZE, ParameterValue::float(1.25, 0.0, 2.0));
    s.declare(FLUID_VISCOSITY, ParameterValue::float(0.0, 0.0, 1.0));
    s.declare(FLUID_VORTICITY, ParameterValue::float(0.1, 0.0, 1.0));
    s.declare(FLUID_DISSIPATION, ParameterValue::float(0.002, 0.0, 1.0));
    s.declare(FLUID_GRAVITY_X, ParameterValue::float(0.0, -10.0, 10.0));
    s.declare(FLUID_GRAVITY_Y, ParameterValue::float(0.0, -10.0, 10.0));

    s.declare(PARTICLE_SPAWN_HUE, ParameterValue::float(0.5, 0.0, 1.0));
    s.declare(PARTICLE_SIZE, ParameterValue::float(2.0, 0.0, 10.0));
    s.declare(PARTICLE_MASS, ParameterValue::float(0.4, 0.0, 1.0));
    s.declare(PARTICLE_MASS_SPREAD, ParameterValue::float(0.2, 0.0, 1.0));
    s.declare(PARTICLE_LIFESPAN, ParameterValue::float(4.0, 0.0, 10.0));
    s.declare(PARTICLE_CELL_SIZE, ParameterValue::float(1.25, 0.0, 2.0));
    s.declare(PARTICLE_STRETCH, ParameterValue::Bool(false));

    s.declare(
        DRAW_MODE,
        ParameterValue::int(0, 0, DrawMode::COUNT as i32 - 1),
    );
    s.declare(DRAW_CAMERA_BACKGROUND, ParameterValue::Bool(false));

    s.declare(
        SOURCE_MODE,
        ParameterValue::int(0, 0, SourceMode::COUNT as i32 - 1),
    );
    s.declare(
        PS_EYE_CAMERA,
        ParameterValue::int(0, 0, PS_EYE_CAMERA_SLOTS - 1),
    );
    s.declare(KINECT_FILTER_USERS, ParameterValue::Bool(false));
    s.declare(PS_EYE_RAW_OPTICAL_FLOW, ParameterValue::Bool(false));
    s.declare(IR_AUTOGAIN, ParameterValue::Bool(false));

    s.declare(
        TRANSITION_TIME,
        ParameterValue::float(4.0, 0.0, MAX_TRANSITION_SECS),
    );
    s.declare(
        JUMP_INTERVAL,
        ParameterValue::float(20.0, 0.0, MAX_TRANSITION_SECS),
    );

    s
}
