pub mod shutdown;
pub mod startup;

pub use startup::{AppServices, build_services, prepare_server_startup};
