use tracing::info;

/// Settings forwarded to the infrared camera driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraControl {
    Exposure(f32),
    Gain(f32),
    Hue(f32),
    AutoGain(bool),
}

/// Requests the control layer cannot satisfy itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationRequest {
    Reset,
    Camera(CameraControl),
}

/// The fluid/particle simulation and capture devices behind the installation.
pub trait Simulation {
    fn reset(&mut self);

    fn camera(&mut self, control: CameraControl);

    /// People the depth camera is tracking this frame.
    fn tracked_people(&self) -> usize {
        0
    }

    fn handle(&mut self, request: SimulationRequest) {
        match request {
            SimulationRequest::Reset => self.reset(),
            SimulationRequest::Camera(control) => self.camera(control),
        }
    }
}

/// Stand-in simulation that only logs and counts what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct LoggingSimulation {
    resets: u64,
    last_camera: Option<CameraControl>,
}

impl LoggingSimulation {
    pub fn resets(&self) -> u64 {
        self.resets
    }

    pub fn last_camera(&self) -> Option<CameraControl> {
        self.last_camera
    }
}

impl Simulation for LoggingSimulation {
    fn reset(&mut self) {
        self.resets += 1;
        info!(count = self.resets, "simulation reset");
    }

    fn camera(&mut self, control: CameraControl) {
        self.last_camera = Some(control);
        info!(?control, "camera control");
    }
}
