//! Configuration validation utilities

use crate::applier::{Configuration, ResolvedOption};
use crate::options::{ConfigOption, OptionKey};
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeSet;
use std::time::Duration;
use types::utils::{is_valid_mime_type, parse_http_url, reserved_header_option};

/// Timeouts above this are flagged as suspicious
const LONG_TIMEOUT: Duration = Duration::from_secs(300);

/// Dry-run validator: checks a configuration without touching a manager
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Configuration) -> ValidationReport {
        let mut report = ValidationReport::new();
        let resolution = config.resolve();

        for failure in &resolution.failures {
            report.add_error(failure.key(), &failure.to_string());
        }

        Self::validate_network(&resolution.options, &mut report);
        Self::validate_mime_types(&resolution.options, &mut report);
        Self::validate_headers(&resolution.options, &mut report);
        Self::validate_object_classes(&resolution.options, &mut report);
        Self::validate_references(&resolution.options, &mut report);
        Self::validate_routes(&resolution.options, &mut report);

        report
    }

    fn validate_network(options: &[ResolvedOption], report: &mut ValidationReport) {
        let has_base_url = options.iter().any(|o| o.option.key() == OptionKey::BaseUrl);
        if !has_base_url {
            report.add_warning(OptionKey::BaseUrl.name(), "No base URL configured, requests need absolute URLs");
        }

        for resolved in options {
            match &resolved.option {
                ConfigOption::BaseUrl(url) => match parse_http_url(url) {
                    Ok(parsed) if parsed.scheme() == "http" => {
                        report.add_warning(&resolved.key, "Base URL should use HTTPS");
                    }
                    Ok(_) => {}
                    Err(reason) => {
                        report.add_error(&resolved.key, &format!("Invalid base URL {}: {}", url, reason));
                    }
                },
                ConfigOption::TimeoutInterval(timeout) => {
                    if timeout.is_zero() {
                        report.add_error(&resolved.key, "Timeout must be greater than 0");
                    } else if *timeout > LONG_TIMEOUT {
                        report.add_warning(
                            &resolved.key,
                            &format!("Timeout is very high ({}s)", timeout.as_secs_f64()),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn validate_mime_types(options: &[ResolvedOption], report: &mut ValidationReport) {
        for resolved in options {
            let mime_type = match &resolved.option {
                ConfigOption::RequestSerializationMimeType(mime) | ConfigOption::AcceptHeader(mime) => mime,
                _ => continue,
            };

            if !is_valid_mime_type(mime_type) {
                report.add_error(&resolved.key, &format!("Invalid MIME type: {}", mime_type));
            }
        }
    }

    fn validate_headers(options: &[ResolvedOption], report: &mut ValidationReport) {
        for resolved in options {
            match &resolved.option {
                ConfigOption::DefaultHeaders(headers) => {
                    for (name, value) in headers {
                        if let Some(option) = reserved_header_option(name) {
                            report.add_error(
                                &resolved.key,
                                &format!("Header {} cannot be set as a default header, use {}", name, option),
                            );
                        } else if let Err(e) = HeaderName::from_bytes(name.as_bytes()) {
                            report.add_error(&resolved.key, &format!("Invalid header {}: {}", name, e));
                        } else if let Err(e) = HeaderValue::from_str(value) {
                            report.add_error(&resolved.key, &format!("Invalid header {}: {}", name, e));
                        }
                    }
                }
                ConfigOption::UserAgent(user_agent) => {
                    if let Err(e) = HeaderValue::from_str(user_agent) {
                        report.add_error(&resolved.key, &format!("Invalid user agent: {}", e));
                    }
                }
                _ => {}
            }
        }
    }

    fn validate_object_classes(options: &[ResolvedOption], report: &mut ValidationReport) {
        for resolved in options {
            match &resolved.option {
                ConfigOption::ObjectMappings(mappings) => {
                    for (name, mapping) in mappings {
                        if name.is_empty() {
                            report.add_error(&resolved.key, "Mapping name cannot be empty");
                        }
                        if mapping.object_class.is_empty() {
                            report.add_error(
                                &resolved.key,
                                &format!("Object class of mapping {} cannot be empty", name),
                            );
                        }
                    }
                }
                ConfigOption::RequestDescriptors(descriptors) => {
                    if descriptors.iter().any(|d| d.object_class.is_empty()) {
                        report.add_error(&resolved.key, "Request descriptor object class cannot be empty");
                    }
                }
                _ => {}
            }
        }
    }

    fn validate_references(options: &[ResolvedOption], report: &mut ValidationReport) {
        let defined: BTreeSet<&str> = options
            .iter()
            .filter_map(|o| match &o.option {
                ConfigOption::ObjectMappings(mappings) => Some(mappings.keys().map(String::as_str)),
                _ => None,
            })
            .flatten()
            .collect();

        let mut check = |key: &str, name: &str, context: &str| {
            if !defined.contains(name) {
                report.add_error(key, &format!("{} references undefined mapping: {}", context, name));
            }
        };

        for resolved in options {
            match &resolved.option {
                ConfigOption::ObjectMappings(mappings) => {
                    for (name, mapping) in mappings {
                        for target in mapping.referenced_mappings() {
                            check(&resolved.key, target, &format!("Relationship of {}", name));
                        }
                    }
                }
                ConfigOption::RequestDescriptors(descriptors) => {
                    for descriptor in descriptors {
                        check(&resolved.key, &descriptor.mapping, "Request descriptor");
                    }
                }
                ConfigOption::ResponseDescriptors(descriptors) => {
                    for descriptor in descriptors {
                        check(&resolved.key, &descriptor.mapping, "Response descriptor");
                    }
                }
                _ => {}
            }
        }

        for resolved in options {
            if let ConfigOption::ResponseDescriptors(descriptors) = &resolved.option {
                if descriptors
                    .iter()
                    .any(|d| d.path_pattern.is_none() && d.key_path.is_none())
                {
                    report.add_warning(
                        &resolved.key,
                        "Response descriptor without pathPattern or keyPath matches every response",
                    );
                }
            }
        }
    }

    fn validate_routes(options: &[ResolvedOption], report: &mut ValidationReport) {
        for resolved in options {
            let ConfigOption::Routes(routes) = &resolved.option else {
                continue;
            };

            let mut names = BTreeSet::new();
            let mut class_routes = BTreeSet::new();
            for route in routes {
                if !route.path_pattern.starts_with('/') {
                    report.add_error(
                        &resolved.key,
                        &format!("Path pattern must start with '/': {}", route.path_pattern),
                    );
                }

                match (&route.name, &route.object_class) {
                    (Some(name), None) => {
                        if !names.insert(name.as_str()) {
                            report.add_error(&resolved.key, &format!("Duplicate route name: {}", name));
                        }
                    }
                    (None, Some(object_class)) => {
                        if !class_routes.insert((object_class.as_str(), route.method)) {
                            report.add_error(
                                &resolved.key,
                                &format!("Duplicate route: {} {}", route.method, object_class),
                            );
                        }
                    }
                    _ => report.add_error(
                        &resolved.key,
                        &format!("Route {} needs exactly one of name or objectClass", route.path_pattern),
                    ),
                }
            }
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
