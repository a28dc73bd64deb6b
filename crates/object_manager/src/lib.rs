//! Object manager for mapping-driven HTTP APIs
//!
//! This crate provides [`ObjectManager`], the concrete [`types::Manager`]
//! that configurations are applied to: base URL, headers, timeout, object
//! mappings, routes and request/response descriptors.

pub mod client;
pub mod manager;
pub mod registry;

pub use client::*;
pub use manager::*;
pub use registry::*;
