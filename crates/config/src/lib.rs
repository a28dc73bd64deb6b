//! Configuration loading and application for object managers
//!
//! This crate reads configuration mappings from files, remote resources and
//! environment variables, resolves them against a fixed option vocabulary,
//! and applies them to any [`types::Manager`].

pub mod applier;
pub mod loader;
pub mod options;
pub mod validation;

pub use applier::*;
pub use loader::{ConfigurationLoader, Format};
pub use options::*;
pub use validation::*;
