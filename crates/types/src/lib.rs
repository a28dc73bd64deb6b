//! Shared types for the mapconf system
//!
//! This crate contains the configuration mapping type, the error types, the
//! mapping and routing definitions, and the [`Manager`] capability contract
//! shared by the loader and concrete managers.

pub mod error;
pub mod manager;
pub mod mapping;
pub mod routing;
pub mod utils;

use serde_json::{Map, Value};

/// Parsed key/value structure describing desired manager settings
pub type ConfigurationMapping = Map<String, Value>;

// Re-export commonly used types
pub use error::{
    ApplyError, ConfigurationError, ErrorCategory, LoadError, ManagerError, OptionError, Result,
};
pub use manager::{Manager, ManagerResult};
pub use mapping::*;
pub use routing::*;
