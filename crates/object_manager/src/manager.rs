//! Object manager holding client settings and mapping registrations

use crate::MappingRegistry;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;
use types::utils::{is_valid_mime_type, parse_http_url, reserved_header_option};
use types::{
    Manager, ManagerError, ManagerResult, ObjectMapping, RequestDescriptor, RequestMethod,
    ResponseDescriptor, Route,
};
use url::Url;

/// MIME type used for request bodies until configured otherwise
pub const DEFAULT_SERIALIZATION_MIME_TYPE: &str = "application/x-www-form-urlencoded";

/// MIME type sent in the Accept header until configured otherwise
pub const DEFAULT_ACCEPT_MIME_TYPE: &str = "application/json";

/// A configurable object-mapping client.
///
/// Holds the network settings and mapping registrations; the HTTP client
/// itself is built on demand from them by [`ObjectManager::http_client`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectManager {
    pub(crate) base_url: Option<Url>,
    pub(crate) request_serialization_mime_type: String,
    /// Lower-cased header name to value, including `accept`
    pub(crate) default_headers: BTreeMap<String, String>,
    #[serde(serialize_with = "serialize_timeout")]
    pub(crate) timeout: Option<Duration>,
    pub(crate) user_agent: Option<String>,
    pub(crate) mappings: MappingRegistry,
    pub(crate) routes: Vec<Route>,
    pub(crate) request_descriptors: Vec<RequestDescriptor>,
    pub(crate) response_descriptors: Vec<ResponseDescriptor>,
}

fn serialize_timeout<S: Serializer>(timeout: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    timeout.map(|t| t.as_secs_f64()).serialize(s)
}

impl Default for ObjectManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectManager {
    /// Create a manager with no base URL and default MIME types
    pub fn new() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert(ACCEPT.as_str().to_string(), DEFAULT_ACCEPT_MIME_TYPE.to_string());

        Self {
            base_url: None,
            request_serialization_mime_type: DEFAULT_SERIALIZATION_MIME_TYPE.to_string(),
            default_headers,
            timeout: None,
            user_agent: None,
            mappings: MappingRegistry::new(),
            routes: Vec::new(),
            request_descriptors: Vec::new(),
            response_descriptors: Vec::new(),
        }
    }

    /// Create a manager with a base URL
    pub fn with_base_url(url: &str) -> ManagerResult<Self> {
        let mut manager = Self::new();
        manager.set_base_url(url)?;
        Ok(manager)
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn request_serialization_mime_type(&self) -> &str {
        &self.request_serialization_mime_type
    }

    pub fn accept_header(&self) -> Option<&str> {
        self.default_header(ACCEPT.as_str())
    }

    /// Value of a default header, looked up case-insensitively
    pub fn default_header(&self, name: &str) -> Option<&str> {
        self.default_headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn mappings(&self) -> &MappingRegistry {
        &self.mappings
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn request_descriptors(&self) -> &[RequestDescriptor] {
        &self.request_descriptors
    }

    pub fn response_descriptors(&self) -> &[ResponseDescriptor] {
        &self.response_descriptors
    }

    /// Find a named route
    pub fn named_route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name.as_deref() == Some(name))
    }

    /// Find the route for an object class and method, falling back to an
    /// `ANY` route for the class
    pub fn class_route(&self, object_class: &str, method: RequestMethod) -> Option<&Route> {
        let for_class = || {
            self.routes
                .iter()
                .filter(move |r| r.object_class.as_deref() == Some(object_class))
        };

        for_class()
            .find(|r| r.method == method)
            .or_else(|| for_class().find(|r| r.method == RequestMethod::Any))
    }

    /// Response descriptors applicable to a method and path
    pub fn response_descriptors_for(&self, method: RequestMethod, path: &str) -> Vec<&ResponseDescriptor> {
        self.response_descriptors
            .iter()
            .filter(|d| d.method.matches(method))
            .filter(|d| {
                d.path_pattern
                    .as_deref()
                    .map_or(true, |pattern| types::path_matches(pattern, path))
            })
            .collect()
    }

    fn insert_header(&mut self, name: &str, value: &str) -> ManagerResult {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ManagerError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        HeaderValue::from_str(value).map_err(|e| ManagerError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(header = %header_name, "Default header set");
        self.default_headers
            .insert(header_name.as_str().to_string(), value.to_string());
        Ok(())
    }

    fn check_mapping_registered(&self, name: &str) -> ManagerResult {
        if self.mappings.contains(name) {
            Ok(())
        } else {
            Err(ManagerError::UnknownMapping {
                name: name.to_string(),
            })
        }
    }
}

fn check_path_pattern(pattern: &str) -> ManagerResult {
    if pattern.starts_with('/') {
        Ok(())
    } else {
        Err(ManagerError::InvalidValue {
            field: "pathPattern".to_string(),
            message: format!("Path pattern must start with '/': {}", pattern),
        })
    }
}

impl Manager for ObjectManager {
    fn set_base_url(&mut self, url: &str) -> ManagerResult {
        let parsed = parse_http_url(url).map_err(|reason| ManagerError::InvalidBaseUrl {
            url: url.to_string(),
            reason,
        })?;

        tracing::debug!(base_url = %parsed, "Base URL set");
        self.base_url = Some(parsed);
        Ok(())
    }

    fn set_request_serialization_mime_type(&mut self, mime_type: &str) -> ManagerResult {
        if !is_valid_mime_type(mime_type) {
            return Err(ManagerError::InvalidMimeType(mime_type.to_string()));
        }

        self.request_serialization_mime_type = mime_type.to_string();
        Ok(())
    }

    fn set_accept_header(&mut self, mime_type: &str) -> ManagerResult {
        if !is_valid_mime_type(mime_type) {
            return Err(ManagerError::InvalidMimeType(mime_type.to_string()));
        }

        self.insert_header(ACCEPT.as_str(), mime_type)
    }

    /// Set a default header; `Accept` and `User-Agent` belong to their own
    /// setters and are refused here
    fn set_default_header(&mut self, name: &str, value: &str) -> ManagerResult {
        if let Some(option) = reserved_header_option(name) {
            return Err(ManagerError::ReservedHeader {
                name: name.to_string(),
                option: option.to_string(),
            });
        }

        self.insert_header(name, value)
    }

    fn set_timeout(&mut self, timeout: Duration) -> ManagerResult {
        if timeout.is_zero() {
            return Err(ManagerError::InvalidValue {
                field: "timeout".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            });
        }

        self.timeout = Some(timeout);
        Ok(())
    }

    fn set_user_agent(&mut self, user_agent: &str) -> ManagerResult {
        HeaderValue::from_str(user_agent).map_err(|e| ManagerError::InvalidHeader {
            name: "User-Agent".to_string(),
            reason: e.to_string(),
        })?;

        self.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    fn register_mapping(&mut self, name: &str, mapping: ObjectMapping) -> ManagerResult {
        self.mappings.register(name, mapping)?;
        tracing::debug!(mapping = name, "Object mapping registered");
        Ok(())
    }

    fn has_mapping(&self, name: &str) -> bool {
        self.mappings.contains(name)
    }

    fn add_route(&mut self, route: Route) -> ManagerResult {
        check_path_pattern(&route.path_pattern)?;

        match (&route.name, &route.object_class) {
            (Some(name), None) => {
                if self.named_route(name).is_some() {
                    return Err(ManagerError::DuplicateRoute { name: name.clone() });
                }
            }
            (None, Some(object_class)) => {
                let exists = self.routes.iter().any(|r| {
                    r.object_class.as_deref() == Some(object_class.as_str()) && r.method == route.method
                });
                if exists {
                    return Err(ManagerError::DuplicateRoute {
                        name: format!("{} {}", route.method, object_class),
                    });
                }
            }
            _ => {
                return Err(ManagerError::InvalidValue {
                    field: "route".to_string(),
                    message: "Route needs exactly one of name or objectClass".to_string(),
                });
            }
        }

        tracing::debug!(path_pattern = %route.path_pattern, method = %route.method, "Route added");
        self.routes.push(route);
        Ok(())
    }

    fn add_request_descriptor(&mut self, descriptor: RequestDescriptor) -> ManagerResult {
        self.check_mapping_registered(&descriptor.mapping)?;

        if descriptor.object_class.is_empty() {
            return Err(ManagerError::InvalidValue {
                field: "objectClass".to_string(),
                message: "Request descriptor object class cannot be empty".to_string(),
            });
        }

        self.request_descriptors.push(descriptor);
        Ok(())
    }

    fn add_response_descriptor(&mut self, descriptor: ResponseDescriptor) -> ManagerResult {
        self.check_mapping_registered(&descriptor.mapping)?;

        if let Some(pattern) = &descriptor.path_pattern {
            check_path_pattern(pattern)?;
        }

        self.response_descriptors.push(descriptor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::StatusCodes;

    fn mapping(object_class: &str) -> ObjectMapping {
        ObjectMapping {
            object_class: object_class.to_string(),
            attributes: Default::default(),
            relationships: Default::default(),
            identification_attributes: vec![],
        }
    }

    fn response_descriptor(mapping: &str, pattern: Option<&str>) -> ResponseDescriptor {
        ResponseDescriptor {
            mapping: mapping.to_string(),
            method: RequestMethod::Get,
            path_pattern: pattern.map(str::to_string),
            key_path: None,
            status_codes: StatusCodes::default(),
        }
    }

    #[test]
    fn test_defaults() {
        let manager = ObjectManager::new();
        assert!(manager.base_url().is_none());
        assert_eq!(manager.accept_header(), Some(DEFAULT_ACCEPT_MIME_TYPE));
        assert_eq!(manager.request_serialization_mime_type(), DEFAULT_SERIALIZATION_MIME_TYPE);
        assert!(manager.timeout().is_none());
    }

    #[test]
    fn test_set_base_url() {
        let mut manager = ObjectManager::new();
        manager.set_base_url("https://api.example.com").unwrap();
        assert_eq!(manager.base_url().unwrap().as_str(), "https://api.example.com/");

        let err = manager.set_base_url("not a url").unwrap_err();
        assert!(matches!(err, ManagerError::InvalidBaseUrl { .. }));
        // Rejected value leaves the previous one in place
        assert_eq!(manager.base_url().unwrap().host_str(), Some("api.example.com"));
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut manager = ObjectManager::new();
        manager.set_default_header("X-Api-Key", "secret").unwrap();
        assert_eq!(manager.default_header("x-api-key"), Some("secret"));

        manager.set_accept_header("application/vnd.api+json").unwrap();
        assert_eq!(manager.default_header("Accept"), Some("application/vnd.api+json"));

        assert!(manager.set_default_header("bad header", "x").is_err());
        assert!(manager.set_default_header("X-Ok", "line\nbreak").is_err());
        assert!(manager.set_accept_header("json").is_err());
    }

    #[test]
    fn test_reserved_headers_need_their_own_setters() {
        let mut manager = ObjectManager::new();
        manager.set_accept_header("application/xml").unwrap();

        let err = manager.set_default_header("Accept", "text/plain").unwrap_err();
        assert_eq!(
            err,
            ManagerError::ReservedHeader {
                name: "Accept".to_string(),
                option: "acceptHeader".to_string(),
            }
        );
        assert_eq!(manager.accept_header(), Some("application/xml"));

        let err = manager.set_default_header("user-agent", "custom/9").unwrap_err();
        assert!(matches!(err, ManagerError::ReservedHeader { ref option, .. } if option == "userAgent"));
        assert!(manager.default_header("user-agent").is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut manager = ObjectManager::new();
        assert!(manager.set_timeout(Duration::ZERO).is_err());
        manager.set_timeout(Duration::from_millis(2500)).unwrap();
        assert_eq!(manager.timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_routes() {
        let mut manager = ObjectManager::new();
        manager
            .add_route(Route {
                name: Some("article".to_string()),
                object_class: None,
                path_pattern: "/articles/:articleID".to_string(),
                method: RequestMethod::Get,
            })
            .unwrap();
        manager
            .add_route(Route {
                name: None,
                object_class: Some("Article".to_string()),
                path_pattern: "/articles".to_string(),
                method: RequestMethod::Any,
            })
            .unwrap();

        assert!(manager.named_route("article").is_some());
        assert_eq!(
            manager.class_route("Article", RequestMethod::Post).unwrap().path_pattern,
            "/articles"
        );

        let duplicate = manager.add_route(Route {
            name: Some("article".to_string()),
            object_class: None,
            path_pattern: "/other".to_string(),
            method: RequestMethod::Get,
        });
        assert!(matches!(duplicate, Err(ManagerError::DuplicateRoute { .. })));

        let ambiguous = manager.add_route(Route {
            name: Some("both".to_string()),
            object_class: Some("Article".to_string()),
            path_pattern: "/both".to_string(),
            method: RequestMethod::Get,
        });
        assert!(ambiguous.is_err());

        let relative = manager.add_route(Route {
            name: Some("relative".to_string()),
            object_class: None,
            path_pattern: "articles".to_string(),
            method: RequestMethod::Get,
        });
        assert!(relative.is_err());
    }

    #[test]
    fn test_descriptor_requires_registered_mapping() {
        let mut manager = ObjectManager::new();
        let err = manager
            .add_response_descriptor(response_descriptor("article", Some("/articles")))
            .unwrap_err();
        assert_eq!(
            err,
            ManagerError::UnknownMapping {
                name: "article".to_string()
            }
        );

        manager.register_mapping("article", mapping("Article")).unwrap();
        manager
            .add_response_descriptor(response_descriptor("article", Some("/articles/:id")))
            .unwrap();
        manager
            .add_response_descriptor(response_descriptor("article", None))
            .unwrap();

        assert_eq!(manager.response_descriptors_for(RequestMethod::Get, "/articles/7").len(), 2);
        assert_eq!(manager.response_descriptors_for(RequestMethod::Get, "/users").len(), 1);
        assert_eq!(manager.response_descriptors_for(RequestMethod::Delete, "/articles/7").len(), 0);
    }

    #[test]
    fn test_request_descriptor() {
        let mut manager = ObjectManager::new();
        manager.register_mapping("article", mapping("Article")).unwrap();

        manager
            .add_request_descriptor(RequestDescriptor {
                mapping: "article".to_string(),
                object_class: "Article".to_string(),
                root_key_path: Some("article".to_string()),
                method: RequestMethod::Any,
            })
            .unwrap();

        assert_eq!(manager.request_descriptors().len(), 1);
    }
}
