//! Capability contract for configurable object managers

use crate::error::ManagerError;
use crate::mapping::ObjectMapping;
use crate::routing::{RequestDescriptor, ResponseDescriptor, Route};
use std::time::Duration;

/// Result type for manager setters
pub type ManagerResult<T = ()> = std::result::Result<T, ManagerError>;

/// Trait for object managers that a configuration can be applied to.
///
/// Each setter validates its input and returns a [`ManagerError`] when the
/// value is refused. `Clone` lets a configuration stage changes on a copy
/// and commit them only when every option succeeds.
pub trait Manager: Clone {
    /// Set the base address every request path is resolved against
    fn set_base_url(&mut self, url: &str) -> ManagerResult;

    /// Set the MIME type used to serialize request bodies
    fn set_request_serialization_mime_type(&mut self, mime_type: &str) -> ManagerResult;

    /// Set the MIME type sent in the Accept header
    fn set_accept_header(&mut self, mime_type: &str) -> ManagerResult;

    /// Add or replace a header sent with every request
    fn set_default_header(&mut self, name: &str, value: &str) -> ManagerResult;

    /// Set the request timeout
    fn set_timeout(&mut self, timeout: Duration) -> ManagerResult;

    /// Set the User-Agent header
    fn set_user_agent(&mut self, user_agent: &str) -> ManagerResult;

    /// Register an object mapping under a name
    fn register_mapping(&mut self, name: &str, mapping: ObjectMapping) -> ManagerResult;

    /// Whether a mapping with this name is registered
    fn has_mapping(&self, name: &str) -> bool;

    /// Add a named or class route
    fn add_route(&mut self, route: Route) -> ManagerResult;

    /// Add a request descriptor
    fn add_request_descriptor(&mut self, descriptor: RequestDescriptor) -> ManagerResult;

    /// Add a response descriptor
    fn add_response_descriptor(&mut self, descriptor: ResponseDescriptor) -> ManagerResult;
}
