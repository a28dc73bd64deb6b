//! Configuration loader implementation

use crate::options::OptionKey;
use anyhow::Context;
use figment::{
    providers::{Env, Format as _, Json, Yaml},
    Figment,
};
use serde_json::json;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use types::utils::DEFAULT_USER_AGENT;
use types::{ConfigurationMapping, LoadError};
use url::Url;

/// Timeout for fetching remote configuration resources
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Serialization format of a configuration resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Guess the format from a path's extension
    pub fn from_extension(path: &str) -> Option<Self> {
        let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Guess the format from an HTTP Content-Type value
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" | "text/json" => Some(Format::Json),
            "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => {
                Some(Format::Yaml)
            }
            _ if essence.ends_with("+json") => Some(Format::Json),
            _ => None,
        }
    }
}

/// Loads configuration mappings from files, remote resources and the
/// environment
#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    env_prefix: Option<String>,
    http_timeout: Duration,
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationLoader {
    /// Create a loader without environment overrides
    pub fn new() -> Self {
        Self {
            env_prefix: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Override options with environment variables carrying this prefix
    /// (e.g. `MAPCONF_BASE_URL` for prefix `MAPCONF_`)
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Timeout for remote fetches
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Load a configuration mapping from a `file`, `http` or `https` URL
    pub fn load_url(&self, url: &Url) -> Result<ConfigurationMapping, LoadError> {
        let (content, format) = match url.scheme() {
            "file" => self.read_file(url)?,
            "http" | "https" => self.fetch(url)?,
            other => {
                return Err(LoadError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        };

        let mut mapping = parse(url.as_str(), &content, format)?;
        self.apply_env_overrides(&mut mapping)?;

        tracing::info!(url = %url, options = mapping.len(), "Configuration loaded");
        Ok(mapping)
    }

    /// Load a configuration mapping from a local path
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<ConfigurationMapping, LoadError> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|e| LoadError::Unreadable {
            url: path.display().to_string(),
            message: e.to_string(),
        })?;

        let url = Url::from_file_path(&absolute).map_err(|_| LoadError::Unreadable {
            url: absolute.display().to_string(),
            message: "Path cannot be expressed as a file URL".to_string(),
        })?;

        self.load_url(&url)
    }

    /// Load a configuration mapping from in-memory content
    pub fn load_str(&self, content: &str, format: Format) -> Result<ConfigurationMapping, LoadError> {
        let mut mapping = parse("<inline>", content, format)?;
        self.apply_env_overrides(&mut mapping)?;
        Ok(mapping)
    }

    fn read_file(&self, url: &Url) -> Result<(String, Format), LoadError> {
        let path = url.to_file_path().map_err(|_| LoadError::Unreadable {
            url: url.to_string(),
            message: "URL does not name a local file".to_string(),
        })?;

        let format = Format::from_extension(url.path()).ok_or_else(|| LoadError::UnsupportedFormat {
            url: url.to_string(),
        })?;

        // The file handle is closed before parsing starts
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                url: url.to_string(),
            },
            _ => LoadError::Unreadable {
                url: url.to_string(),
                message: e.to_string(),
            },
        })?;

        Ok((content, format))
    }

    fn fetch(&self, url: &Url) -> Result<(String, Format), LoadError> {
        let unreachable = |e: reqwest::Error| LoadError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.http_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(unreachable)?;

        tracing::debug!(url = %url, "Fetching remote configuration");
        let response = client.get(url.clone()).send().map_err(unreachable)?;

        if !response.status().is_success() {
            return Err(LoadError::Http {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let format = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(Format::from_content_type)
            .or_else(|| Format::from_extension(url.path()))
            .ok_or_else(|| LoadError::UnsupportedFormat {
                url: url.to_string(),
            })?;

        let content = response.text().map_err(|e| LoadError::Unreadable {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok((content, format))
    }

    fn apply_env_overrides(&self, mapping: &mut ConfigurationMapping) -> Result<(), LoadError> {
        let Some(prefix) = &self.env_prefix else {
            return Ok(());
        };

        // Only variables naming an option count; others sharing the prefix
        // (such as the CLI's own MAPCONF_ENV_PREFIX) are ignored
        let env = Env::prefixed(prefix)
            .filter(|key| OptionKey::from_name(&key.as_str().to_ascii_lowercase()).is_some());

        let overrides: ConfigurationMapping = Figment::from(env)
            .extract()
            .map_err(|e| LoadError::Malformed {
                url: format!("env:{}*", prefix),
                message: e.to_string(),
            })?;

        for (key, value) in overrides {
            // Drop whichever spelling the file used so the override wins
            if let Some(option) = OptionKey::from_name(&key) {
                mapping.retain(|existing, _| OptionKey::from_name(existing) != Some(option));
            }

            tracing::debug!(option = %key, "Configuration option overridden from environment");
            mapping.insert(key, value);
        }

        Ok(())
    }

    /// Example configuration covering every option
    pub fn example() -> ConfigurationMapping {
        let example = json!({
            "baseURL": "https://api.example.com/v1",
            "requestSerializationMIMEType": "application/json",
            "acceptHeader": "application/json",
            "defaultHeaders": { "X-Api-Version": "2" },
            "timeoutInterval": 30,
            "userAgent": "mapconf-example/1.0",
            "objectMappings": {
                "user": {
                    "objectClass": "User",
                    "attributes": ["name", "email"],
                    "identificationAttributes": ["email"]
                },
                "article": {
                    "objectClass": "Article",
                    "attributes": { "id": "articleID", "title": "title", "body": "body" },
                    "relationships": { "author": { "mapping": "user" } },
                    "identificationAttributes": ["articleID"]
                }
            },
            "routes": [
                { "name": "article", "pathPattern": "/articles/:articleID", "method": "GET" },
                { "objectClass": "Article", "pathPattern": "/articles", "method": "POST" }
            ],
            "requestDescriptors": [
                { "mapping": "article", "objectClass": "Article", "rootKeyPath": "article" }
            ],
            "responseDescriptors": [
                { "mapping": "article", "method": "GET", "pathPattern": "/articles/:articleID", "keyPath": "article" },
                { "mapping": "article", "method": "GET", "pathPattern": "/articles", "keyPath": "articles" }
            ]
        });

        match example {
            serde_json::Value::Object(mapping) => mapping,
            _ => ConfigurationMapping::new(),
        }
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
        let yaml_content = serde_yaml::to_string(&Self::example())
            .context("Failed to serialize example configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}

fn parse(origin: &str, content: &str, format: Format) -> Result<ConfigurationMapping, LoadError> {
    let figment = match format {
        Format::Json => Figment::from(Json::string(content)),
        Format::Yaml => Figment::from(Yaml::string(content)),
    };

    figment.extract().map_err(|e| LoadError::Malformed {
        url: origin.to_string(),
        message: e.to_string(),
    })
}
