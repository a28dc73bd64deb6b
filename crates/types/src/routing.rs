//! Routes and request/response descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP request method a route or descriptor applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Matches every method
    #[default]
    Any,
}

impl RequestMethod {
    /// Whether a descriptor registered for `self` applies to `method`
    pub fn matches(self, method: RequestMethod) -> bool {
        self == RequestMethod::Any || method == RequestMethod::Any || self == method
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Head => "HEAD",
            RequestMethod::Options => "OPTIONS",
            RequestMethod::Any => "ANY",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path pattern bound either to a name or to an object class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Route {
    /// Route name, for named routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Object class, for class routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
    /// Path pattern such as `/articles/:articleID`
    pub path_pattern: String,
    #[serde(default)]
    pub method: RequestMethod,
}

/// Associates an object mapping with outgoing request bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequestDescriptor {
    /// Name of a registered object mapping
    pub mapping: String,
    /// Class of the objects being serialized
    pub object_class: String,
    /// Key path to nest the serialized object under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_key_path: Option<String>,
    #[serde(default)]
    pub method: RequestMethod,
}

/// Associates an object mapping with incoming responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponseDescriptor {
    /// Name of a registered object mapping
    pub mapping: String,
    #[serde(default)]
    pub method: RequestMethod,
    /// Path pattern the response must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    /// Key path of the mappable content in the response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    #[serde(default)]
    pub status_codes: StatusCodes,
}

/// HTTP status code classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusCodeClass {
    Informational,
    Successful,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusCodeClass {
    pub fn contains(self, code: u16) -> bool {
        let range = match self {
            StatusCodeClass::Informational => 100..200,
            StatusCodeClass::Successful => 200..300,
            StatusCodeClass::Redirection => 300..400,
            StatusCodeClass::ClientError => 400..500,
            StatusCodeClass::ServerError => 500..600,
        };
        range.contains(&code)
    }
}

/// Status codes a response descriptor applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCodes {
    Class(StatusCodeClass),
    Codes(Vec<u16>),
}

impl Default for StatusCodes {
    fn default() -> Self {
        StatusCodes::Class(StatusCodeClass::Successful)
    }
}

impl StatusCodes {
    pub fn contains(&self, code: u16) -> bool {
        match self {
            StatusCodes::Class(class) => class.contains(code),
            StatusCodes::Codes(codes) => codes.contains(&code),
        }
    }
}

/// Match a concrete path against a pattern with `:param` segments
pub fn path_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    pattern_segments.len() == path_segments.len()
        && pattern_segments
            .iter()
            .zip(&path_segments)
            .all(|(p, s)| p.starts_with(':') || p == s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_descriptor_defaults() {
        let descriptor: ResponseDescriptor = serde_json::from_value(json!({
            "mapping": "article"
        }))
        .unwrap();

        assert_eq!(descriptor.method, RequestMethod::Any);
        assert!(descriptor.status_codes.contains(204));
        assert!(!descriptor.status_codes.contains(404));
    }

    #[test]
    fn test_status_codes_forms() {
        let class: StatusCodes = serde_json::from_value(json!("clientError")).unwrap();
        assert!(class.contains(422));

        let codes: StatusCodes = serde_json::from_value(json!([200, 201])).unwrap();
        assert!(codes.contains(201));
        assert!(!codes.contains(202));
    }

    #[test]
    fn test_method_matching() {
        assert!(RequestMethod::Any.matches(RequestMethod::Post));
        assert!(RequestMethod::Get.matches(RequestMethod::Get));
        assert!(!RequestMethod::Get.matches(RequestMethod::Delete));
        assert_eq!(
            serde_json::from_value::<RequestMethod>(json!("PATCH")).unwrap(),
            RequestMethod::Patch
        );
    }

    #[test]
    fn test_path_matches() {
        assert!(path_matches("/articles/:articleID", "/articles/42"));
        assert!(!path_matches("/articles/:articleID", "/articles"));
        assert!(!path_matches("/articles/:articleID", "/users/42"));
    }
}
