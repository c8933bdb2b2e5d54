//! # Configuration
//!
//! Console configuration: backend projects, login route, session storage and
//! logging. See [`console::Config::load_config`] for the resolution order.

pub mod console;


pub use console::{BackendConfig, Config, ConfigError};
