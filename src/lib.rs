//! compactlink - multi-tenant URL shortener core
//!
//! Short-code minting with collision retry, `/{header}/{code}` resolution,
//! visit accounting, sliding-window rate limiting and per-tier quotas.
//!
//! # Architecture
//! - `storage`: SeaORM backend and the store traits
//! - `services`: creation, resolution, rate limiting, quotas, visit recording
//! - `api`: HTTP handlers and middleware
//! - `interfaces`: command-line tools
//! - `config`: static configuration
//! - `runtime`: startup wiring, server mode and shutdown
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
