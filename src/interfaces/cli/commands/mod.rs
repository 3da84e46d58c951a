//! CLI command implementations

mod config_gen;
mod rate_limits;
mod tenant;

pub use config_gen::config_generate;
pub use rate_limits::sweep_rate_limits;
pub use tenant::create_tenant;
