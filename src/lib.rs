pub mod app;
pub mod autopilot;
pub mod blend_list;
pub mod catalog;
pub mod command;
pub mod config;
pub mod installation;
pub mod keyboard;
pub mod osc;
pub mod params;
pub mod presence;
pub mod registry;
pub mod sim;
pub mod snapshot;
pub mod terminal;
pub mod transition;
