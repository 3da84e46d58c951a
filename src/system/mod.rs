//! System-level modules
//!
//! Process-wide concerns shared by every command: logging setup.

pub mod logging;

pub use logging::init_logging;
