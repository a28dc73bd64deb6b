//! Error types for the mapconf system

use serde::Serialize;
use thiserror::Error;

/// Broad category of a configuration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The configuration resource could not be read or parsed
    Load,
    /// The configuration could not be applied to a manager
    Apply,
}

/// Main error type for configuration operations
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Loading errors
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Application errors
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl ConfigurationError {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigurationError::Load(_) => ErrorCategory::Load,
            ConfigurationError::Apply(_) => ErrorCategory::Apply,
        }
    }

    /// Offending option key, if the failure is tied to one
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigurationError::Load(_) => None,
            ConfigurationError::Apply(err) => err.key(),
        }
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// Failures while turning a URL into a configuration mapping
#[derive(Error, Debug)]
pub enum LoadError {
    /// Local file does not exist
    #[error("Configuration resource not found: {url}")]
    NotFound { url: String },

    /// Local file exists but cannot be read
    #[error("Configuration resource unreadable: {url}: {message}")]
    Unreadable { url: String, message: String },

    /// Remote host could not be reached
    #[error("Configuration resource unreachable: {url}: {message}")]
    Unreachable { url: String, message: String },

    /// Remote host answered with a non-success status
    #[error("HTTP error {status} fetching configuration: {url}")]
    Http { url: String, status: u16 },

    /// URL scheme is neither file nor http(s)
    #[error("Unsupported configuration URL scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// Content format could not be determined
    #[error("Cannot determine configuration format of {url}")]
    UnsupportedFormat { url: String },

    /// Content did not parse into a mapping of option names to values
    #[error("Malformed configuration in {url}: {message}")]
    Malformed { url: String, message: String },
}

impl LoadError {
    /// URL of the resource that failed to load, when known
    pub fn url(&self) -> Option<&str> {
        match self {
            LoadError::NotFound { url }
            | LoadError::Unreadable { url, .. }
            | LoadError::Unreachable { url, .. }
            | LoadError::Http { url, .. }
            | LoadError::UnsupportedFormat { url }
            | LoadError::Malformed { url, .. } => Some(url),
            LoadError::UnsupportedScheme { .. } => None,
        }
    }
}

/// A single option that could not be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// Key is not part of the option vocabulary
    #[error("Unknown configuration option: {key}")]
    Unknown { key: String },

    /// Same option given more than once through aliases
    #[error("Configuration option {key} duplicates {canonical}")]
    Duplicate { key: String, canonical: String },

    /// Value has the wrong shape for the option
    #[error("Invalid value for {key}: expected {expected}, found {found}")]
    WrongShape {
        key: String,
        expected: String,
        found: String,
    },

    /// Manager refused the decoded value
    #[error("Manager rejected {key}: {source}")]
    Rejected {
        key: String,
        #[source]
        source: ManagerError,
    },
}

impl OptionError {
    /// Offending option key
    pub fn key(&self) -> &str {
        match self {
            OptionError::Unknown { key }
            | OptionError::Duplicate { key, .. }
            | OptionError::WrongShape { key, .. }
            | OptionError::Rejected { key, .. } => key,
        }
    }
}

/// Failure to apply a configuration mapping, carrying every failed option
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe(.failures))]
pub struct ApplyError {
    failures: Vec<OptionError>,
}

fn describe(failures: &[OptionError]) -> String {
    match failures {
        [] => "Configuration could not be applied".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

impl ApplyError {
    /// Create an error from collected failures
    pub fn new(failures: Vec<OptionError>) -> Self {
        Self { failures }
    }

    /// Key of the first failing option, `None` when no failure was recorded
    pub fn key(&self) -> Option<&str> {
        self.failures.first().map(OptionError::key)
    }

    /// All failures, in the order they were encountered
    pub fn failures(&self) -> &[OptionError] {
        &self.failures
    }

    /// Keys of all failing options
    pub fn keys(&self) -> Vec<&str> {
        self.failures.iter().map(OptionError::key).collect()
    }
}

impl From<OptionError> for ApplyError {
    fn from(err: OptionError) -> Self {
        ApplyError::new(vec![err])
    }
}

/// Errors raised by a manager when it refuses a setting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// Base URL is relative or uses an unsupported scheme
    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// MIME type is not of the form type/subtype
    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),

    /// Header name or value cannot be sent over HTTP
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Generic out-of-range or malformed value
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A mapping with this name is already registered
    #[error("Object mapping already registered: {name}")]
    DuplicateMapping { name: String },

    /// A descriptor or relationship references an unregistered mapping
    #[error("Unknown object mapping: {name}")]
    UnknownMapping { name: String },

    /// A named route with this name already exists
    #[error("Route already registered: {name}")]
    DuplicateRoute { name: String },

    /// No route with this name exists
    #[error("Route not found: {name}")]
    RouteNotFound { name: String },

    /// Header is owned by a dedicated option and cannot be set directly
    #[error("Header {name} cannot be set as a default header, use {option}")]
    ReservedHeader { name: String, option: String },

    /// Underlying HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}
