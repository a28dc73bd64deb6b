//! Option vocabulary: the fixed table of recognised configuration keys

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use types::utils::shape_name;
use types::{
    Manager, ManagerError, ManagerResult, ObjectMapping, OptionError, RequestDescriptor,
    ResponseDescriptor, Route,
};

/// A recognised configuration option.
///
/// Declaration order is application order: mappings are registered before
/// the descriptors that refer to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    BaseUrl,
    RequestSerializationMimeType,
    AcceptHeader,
    DefaultHeaders,
    TimeoutInterval,
    UserAgent,
    ObjectMappings,
    Routes,
    RequestDescriptors,
    ResponseDescriptors,
}

impl OptionKey {
    /// Every option, in application order
    pub const ALL: [OptionKey; 10] = [
        OptionKey::BaseUrl,
        OptionKey::RequestSerializationMimeType,
        OptionKey::AcceptHeader,
        OptionKey::DefaultHeaders,
        OptionKey::TimeoutInterval,
        OptionKey::UserAgent,
        OptionKey::ObjectMappings,
        OptionKey::Routes,
        OptionKey::RequestDescriptors,
        OptionKey::ResponseDescriptors,
    ];

    /// Canonical option name
    pub fn name(self) -> &'static str {
        match self {
            OptionKey::BaseUrl => "baseURL",
            OptionKey::RequestSerializationMimeType => "requestSerializationMIMEType",
            OptionKey::AcceptHeader => "acceptHeader",
            OptionKey::DefaultHeaders => "defaultHeaders",
            OptionKey::TimeoutInterval => "timeoutInterval",
            OptionKey::UserAgent => "userAgent",
            OptionKey::ObjectMappings => "objectMappings",
            OptionKey::Routes => "routes",
            OptionKey::RequestDescriptors => "requestDescriptors",
            OptionKey::ResponseDescriptors => "responseDescriptors",
        }
    }

    /// snake_case alias, also the form environment overrides arrive in
    pub fn alias(self) -> &'static str {
        match self {
            OptionKey::BaseUrl => "base_url",
            OptionKey::RequestSerializationMimeType => "request_serialization_mime_type",
            OptionKey::AcceptHeader => "accept_header",
            OptionKey::DefaultHeaders => "default_headers",
            OptionKey::TimeoutInterval => "timeout_interval",
            OptionKey::UserAgent => "user_agent",
            OptionKey::ObjectMappings => "object_mappings",
            OptionKey::Routes => "routes",
            OptionKey::RequestDescriptors => "request_descriptors",
            OptionKey::ResponseDescriptors => "response_descriptors",
        }
    }

    /// Description of the value shape this option accepts
    pub fn expected_shape(self) -> &'static str {
        match self {
            OptionKey::BaseUrl
            | OptionKey::RequestSerializationMimeType
            | OptionKey::AcceptHeader
            | OptionKey::UserAgent => "text",
            OptionKey::DefaultHeaders => "mapping of header names to text",
            OptionKey::TimeoutInterval => "positive number of seconds",
            OptionKey::ObjectMappings => "mapping of names to object mappings",
            OptionKey::Routes => "list of routes",
            OptionKey::RequestDescriptors => "list of request descriptors",
            OptionKey::ResponseDescriptors => "list of response descriptors",
        }
    }

    /// Look up an option by canonical name or alias
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == name || key.alias() == name)
    }

    /// Decode a loosely-typed value into a typed option
    pub fn decode(self, key: &str, value: &Value) -> Result<ConfigOption, OptionError> {
        let option = match self {
            OptionKey::BaseUrl => ConfigOption::BaseUrl(self.text(key, value)?),
            OptionKey::RequestSerializationMimeType => {
                ConfigOption::RequestSerializationMimeType(self.text(key, value)?)
            }
            OptionKey::AcceptHeader => ConfigOption::AcceptHeader(self.text(key, value)?),
            OptionKey::UserAgent => ConfigOption::UserAgent(self.text(key, value)?),
            OptionKey::DefaultHeaders => {
                ConfigOption::DefaultHeaders(self.structured(key, value, Value::is_object)?)
            }
            OptionKey::TimeoutInterval => ConfigOption::TimeoutInterval(self.seconds(key, value)?),
            OptionKey::ObjectMappings => {
                ConfigOption::ObjectMappings(self.structured(key, value, Value::is_object)?)
            }
            OptionKey::Routes => ConfigOption::Routes(self.structured(key, value, Value::is_array)?),
            OptionKey::RequestDescriptors => {
                ConfigOption::RequestDescriptors(self.structured(key, value, Value::is_array)?)
            }
            OptionKey::ResponseDescriptors => {
                ConfigOption::ResponseDescriptors(self.structured(key, value, Value::is_array)?)
            }
        };

        Ok(option)
    }

    fn wrong_shape(self, key: &str, found: String) -> OptionError {
        OptionError::WrongShape {
            key: key.to_string(),
            expected: self.expected_shape().to_string(),
            found,
        }
    }

    fn text(self, key: &str, value: &Value) -> Result<String, OptionError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong_shape(key, shape_name(value).to_string()))
    }

    fn seconds(self, key: &str, value: &Value) -> Result<Duration, OptionError> {
        value
            .as_f64()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or_else(|| self.wrong_shape(key, value.to_string()))
    }

    fn structured<T: DeserializeOwned>(
        self,
        key: &str,
        value: &Value,
        outer_shape: fn(&Value) -> bool,
    ) -> Result<T, OptionError> {
        if !outer_shape(value) {
            return Err(self.wrong_shape(key, shape_name(value).to_string()));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| self.wrong_shape(key, format!("{} ({})", shape_name(value), e)))
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded, typed configuration option
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOption {
    BaseUrl(String),
    RequestSerializationMimeType(String),
    AcceptHeader(String),
    DefaultHeaders(BTreeMap<String, String>),
    TimeoutInterval(Duration),
    UserAgent(String),
    ObjectMappings(BTreeMap<String, ObjectMapping>),
    Routes(Vec<Route>),
    RequestDescriptors(Vec<RequestDescriptor>),
    ResponseDescriptors(Vec<ResponseDescriptor>),
}

impl ConfigOption {
    /// The vocabulary entry this option belongs to
    pub fn key(&self) -> OptionKey {
        match self {
            ConfigOption::BaseUrl(_) => OptionKey::BaseUrl,
            ConfigOption::RequestSerializationMimeType(_) => OptionKey::RequestSerializationMimeType,
            ConfigOption::AcceptHeader(_) => OptionKey::AcceptHeader,
            ConfigOption::DefaultHeaders(_) => OptionKey::DefaultHeaders,
            ConfigOption::TimeoutInterval(_) => OptionKey::TimeoutInterval,
            ConfigOption::UserAgent(_) => OptionKey::UserAgent,
            ConfigOption::ObjectMappings(_) => OptionKey::ObjectMappings,
            ConfigOption::Routes(_) => OptionKey::Routes,
            ConfigOption::RequestDescriptors(_) => OptionKey::RequestDescriptors,
            ConfigOption::ResponseDescriptors(_) => OptionKey::ResponseDescriptors,
        }
    }

    /// Apply this option through the manager's setters
    pub fn apply_to<M: Manager>(&self, manager: &mut M) -> ManagerResult {
        match self {
            ConfigOption::BaseUrl(url) => manager.set_base_url(url),
            ConfigOption::RequestSerializationMimeType(mime) => {
                manager.set_request_serialization_mime_type(mime)
            }
            ConfigOption::AcceptHeader(mime) => manager.set_accept_header(mime),
            ConfigOption::DefaultHeaders(headers) => headers
                .iter()
                .try_for_each(|(name, value)| manager.set_default_header(name, value)),
            ConfigOption::TimeoutInterval(timeout) => manager.set_timeout(*timeout),
            ConfigOption::UserAgent(user_agent) => manager.set_user_agent(user_agent),
            ConfigOption::ObjectMappings(mappings) => {
                let defined: BTreeSet<&str> = mappings.keys().map(String::as_str).collect();
                for target in mappings.values().flat_map(ObjectMapping::referenced_mappings) {
                    if !defined.contains(target) && !manager.has_mapping(target) {
                        return Err(ManagerError::UnknownMapping {
                            name: target.to_string(),
                        });
                    }
                }

                mappings
                    .iter()
                    .try_for_each(|(name, mapping)| manager.register_mapping(name, mapping.clone()))
            }
            ConfigOption::Routes(routes) => routes
                .iter()
                .try_for_each(|route| manager.add_route(route.clone())),
            ConfigOption::RequestDescriptors(descriptors) => descriptors
                .iter()
                .try_for_each(|d| manager.add_request_descriptor(d.clone())),
            ConfigOption::ResponseDescriptors(descriptors) => descriptors
                .iter()
                .try_for_each(|d| manager.add_response_descriptor(d.clone())),
        }
    }
}
