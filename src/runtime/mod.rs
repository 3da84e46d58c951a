//! Application lifecycle: startup wiring, server mode, shutdown

pub mod lifetime;
pub mod modes;

pub use lifetime::{AppServices, build_services, prepare_server_startup};
pub use modes::{configure_routes, run_server};
