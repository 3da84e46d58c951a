mod r#impl;
mod structs;
pub mod validators;

pub use r#impl::{get_config, init_config, replace_config};
pub use structs::*;
pub use validators::validate_static_config;
