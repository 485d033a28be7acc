//! Sandbox module containing the JavaScript execution components.

pub mod capture;
pub mod config;
pub mod detector;
mod engine;
pub mod executor;
pub mod limits;
