//! HTTP surface: middleware and handlers

pub mod middleware;
pub mod services;
