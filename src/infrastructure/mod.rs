//! Ambient concerns: configuration loading and logging setup. Nothing here
//! implements a domain port: `adapters` does that.

pub mod config;
pub mod logging;

pub use config::{ConfigLoader, EngineConfig};
