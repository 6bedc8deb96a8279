use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fluid_pilot",
    version,
    about = "Settings transitions, auto pilot and OSC remote control for a fluid installation"
)]
pub struct Config {
    #[arg(long, default_value = "data/settings")]
    pub settings_dir: PathBuf,

    #[arg(long, default_value_t = 10001)]
    pub osc_port: u16,

    /// Extra ports to try after --osc-port when it is taken.
    #[arg(long, default_value_t = 0)]
    pub port_probe: u16,

    #[arg(long, default_value_t = false)]
    pub echo: bool,

    #[arg(long, default_value_t = 20001)]
    pub echo_port: u16,

    #[arg(long, default_value_t = 10.0)]
    pub idle_secs: f32,

    /// Overrides the saved auto pilot interval; 0 disables cycling.
    #[arg(long)]
    pub jump_interval_secs: Option<f32>,

    /// Overrides the saved transition duration.
    #[arg(long)]
    pub transition_secs: Option<f32>,

    #[arg(long, default_value_t = 1)]
    pub start_index: usize,

    #[arg(long)]
    pub blend_list: Option<PathBuf>,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = 1024)]
    pub queue_capacity: usize,

    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Stop after this many seconds (headless only).
    #[arg(long)]
    pub run_secs: Option<f32>,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Strip session-only keys from every numbered snapshot, then exit.
    #[arg(long, default_value_t = false)]
    pub clean_settings: bool,
}

impl Config {
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.fps.clamp(1, 1000)))
    }
}
