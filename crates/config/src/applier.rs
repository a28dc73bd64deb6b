//! Binding a configuration mapping onto a manager

use crate::loader::{ConfigurationLoader, Format};
use crate::options::{ConfigOption, OptionKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use types::{ApplyError, ConfigurationMapping, LoadError, Manager, OptionError};
use url::Url;

/// What `configure_manager` does once an option fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyPolicy {
    /// Stop at the first failure; earlier options stay applied
    FailFast,
    /// Apply every valid option and report all failures
    BestEffort,
    /// Apply to a staged copy and commit only if every option succeeds
    #[default]
    AllOrNothing,
}

impl ApplyPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyPolicy::FailFast => "fail-fast",
            ApplyPolicy::BestEffort => "best-effort",
            ApplyPolicy::AllOrNothing => "all-or-nothing",
        }
    }
}

impl fmt::Display for ApplyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail-fast" => Ok(ApplyPolicy::FailFast),
            "best-effort" => Ok(ApplyPolicy::BestEffort),
            "all-or-nothing" => Ok(ApplyPolicy::AllOrNothing),
            other => Err(format!(
                "Unknown apply policy: {}. Valid policies: fail-fast, best-effort, all-or-nothing",
                other
            )),
        }
    }
}

/// An option resolved against the vocabulary, with the key it was given under
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOption {
    pub key: String,
    pub option: ConfigOption,
}

/// Outcome of resolving every key of a mapping
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Decoded options, in application order
    pub options: Vec<ResolvedOption>,
    /// Unknown, duplicated or malformed options
    pub failures: Vec<OptionError>,
}

/// A configuration mapping ready to be applied to managers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    mapping: ConfigurationMapping,
    policy: ApplyPolicy,
}

impl From<ConfigurationMapping> for Configuration {
    fn from(mapping: ConfigurationMapping) -> Self {
        Self::from_mapping(mapping)
    }
}

impl Configuration {
    /// Wrap an in-memory mapping
    pub fn from_mapping(mapping: ConfigurationMapping) -> Self {
        Self {
            mapping,
            policy: ApplyPolicy::default(),
        }
    }

    /// Load a configuration from a `file`, `http` or `https` URL
    pub fn from_url(url: &Url) -> Result<Self, LoadError> {
        ConfigurationLoader::new().load_url(url).map(Self::from_mapping)
    }

    /// Load a configuration from a local path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        ConfigurationLoader::new().load_path(path).map(Self::from_mapping)
    }

    /// Parse a configuration from in-memory content
    pub fn from_content(content: &str, format: Format) -> Result<Self, LoadError> {
        ConfigurationLoader::new()
            .load_str(content, format)
            .map(Self::from_mapping)
    }

    /// Choose how failures are handled
    pub fn with_policy(mut self, policy: ApplyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ApplyPolicy {
        self.policy
    }

    pub fn mapping(&self) -> &ConfigurationMapping {
        &self.mapping
    }

    /// Resolve every key against the vocabulary and decode its value
    pub fn resolve(&self) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = BTreeSet::new();

        for (key, value) in &self.mapping {
            let Some(option_key) = OptionKey::from_name(key) else {
                resolution.failures.push(OptionError::Unknown { key: key.clone() });
                continue;
            };

            if !seen.insert(option_key) {
                resolution.failures.push(OptionError::Duplicate {
                    key: key.clone(),
                    canonical: option_key.name().to_string(),
                });
                continue;
            }

            match option_key.decode(key, value) {
                Ok(option) => resolution.options.push(ResolvedOption {
                    key: key.clone(),
                    option,
                }),
                Err(err) => resolution.failures.push(err),
            }
        }

        resolution.options.sort_by_key(|resolved| resolved.option.key());
        resolution
    }

    /// Apply every option onto `manager` according to the policy
    pub fn configure_manager<M: Manager>(&self, manager: &mut M) -> Result<(), ApplyError> {
        let Resolution { options, mut failures } = self.resolve();

        tracing::info!(
            options = options.len(),
            policy = %self.policy,
            "Configuring manager"
        );

        let result = match self.policy {
            ApplyPolicy::FailFast => {
                if let Some(first) = failures.into_iter().next() {
                    return Err(log_failure(first.into()));
                }
                options
                    .iter()
                    .try_for_each(|resolved| apply_one(resolved, manager))
                    .map_err(ApplyError::from)
            }
            ApplyPolicy::BestEffort => {
                failures.extend(
                    options
                        .iter()
                        .filter_map(|resolved| apply_one(resolved, manager).err()),
                );
                into_result(failures)
            }
            ApplyPolicy::AllOrNothing => {
                if !failures.is_empty() {
                    return Err(log_failure(ApplyError::new(failures)));
                }

                let mut staged = manager.clone();
                let failures: Vec<_> = options
                    .iter()
                    .filter_map(|resolved| apply_one(resolved, &mut staged).err())
                    .collect();

                into_result(failures).map(|()| *manager = staged)
            }
        };

        result.map_err(log_failure)
    }
}

fn apply_one<M: Manager>(resolved: &ResolvedOption, manager: &mut M) -> Result<(), OptionError> {
    tracing::debug!(option = %resolved.key, "Applying configuration option");

    resolved
        .option
        .apply_to(manager)
        .map_err(|source| OptionError::Rejected {
            key: resolved.key.clone(),
            source,
        })
}

fn into_result(failures: Vec<OptionError>) -> Result<(), ApplyError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ApplyError::new(failures))
    }
}

fn log_failure(err: ApplyError) -> ApplyError {
    tracing::warn!(keys = ?err.keys(), "Configuration could not be applied: {}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_manager::ObjectManager;
    use serde_json::{json, Value};
    use std::io::Write;
    use std::time::Duration;
    use types::ManagerError;

    fn mapping(value: Value) -> ConfigurationMapping {
        match value {
            Value::Object(map) => map,
            other => panic!("not a mapping: {}", other),
        }
    }

    fn full_mapping() -> ConfigurationMapping {
        ConfigurationLoader::example()
    }

    #[test]
    fn test_base_url_scenario() {
        let config = Configuration::from_mapping(mapping(json!({
            "baseURL": "https://api.example.com"
        })));
        let mut manager = ObjectManager::new();

        assert!(config.configure_manager(&mut manager).is_ok());
        assert_eq!(
            manager.base_url().map(|u| u.as_str().trim_end_matches('/')),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn test_unknown_option_scenario() {
        let config = Configuration::from_mapping(mapping(json!({ "unknownOption": 42 })));
        let mut manager = ObjectManager::new();

        let err = config.configure_manager(&mut manager).unwrap_err();
        assert_eq!(err.key(), Some("unknownOption"));
        assert_eq!(manager, ObjectManager::new());
    }

    #[test]
    fn test_every_supplied_value_is_reflected() {
        let config = Configuration::from_mapping(full_mapping());
        let mut manager = ObjectManager::new();
        config.configure_manager(&mut manager).unwrap();

        assert_eq!(manager.base_url().unwrap().as_str(), "https://api.example.com/v1");
        assert_eq!(manager.request_serialization_mime_type(), "application/json");
        assert_eq!(manager.accept_header(), Some("application/json"));
        assert_eq!(manager.default_header("X-Api-Version"), Some("2"));
        assert_eq!(manager.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(manager.user_agent(), Some("mapconf-example/1.0"));
        assert_eq!(manager.mappings().names(), vec!["article", "user"]);
        assert_eq!(manager.routes().len(), 2);
        assert_eq!(manager.request_descriptors().len(), 1);
        assert_eq!(manager.response_descriptors().len(), 2);
    }

    #[test]
    fn test_apply_does_not_mutate_mapping() {
        let config = Configuration::from_mapping(full_mapping());
        let before = config.mapping().clone();
        config.configure_manager(&mut ObjectManager::new()).unwrap();
        assert_eq!(config.mapping(), &before);
    }

    #[test]
    fn test_round_trip_file_and_memory_agree() {
        let yaml = serde_yaml::to_string(&full_mapping()).unwrap();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let from_file = Configuration::from_path(file.path()).unwrap();
        let from_memory = Configuration::from_mapping(full_mapping());

        let mut first = ObjectManager::new();
        let mut second = ObjectManager::new();
        from_file.configure_manager(&mut first).unwrap();
        from_memory.configure_manager(&mut second).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_deterministic_across_managers() {
        let config = Configuration::from_mapping(full_mapping());

        let mut first = ObjectManager::new();
        let mut second = ObjectManager::new();
        config.configure_manager(&mut first).unwrap();
        config.configure_manager(&mut second).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_missing_url_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("absent.json")).unwrap();
        assert!(matches!(
            Configuration::from_url(&url),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_descriptors_applied_after_mappings() {
        // Sorted key order would put responseDescriptors before objectMappings
        // were it not for vocabulary ordering.
        let config = Configuration::from_mapping(mapping(json!({
            "responseDescriptors": [{ "mapping": "user", "pathPattern": "/users" }],
            "objectMappings": { "user": { "objectClass": "User", "attributes": ["name"] } }
        })));

        let mut manager = ObjectManager::new();
        config.configure_manager(&mut manager).unwrap();
        assert_eq!(manager.response_descriptors().len(), 1);
    }

    #[test]
    fn test_alias_duplicate_rejected() {
        let config = Configuration::from_mapping(mapping(json!({
            "baseURL": "https://a.example.com",
            "base_url": "https://b.example.com"
        })));

        let err = config.configure_manager(&mut ObjectManager::new()).unwrap_err();
        assert!(matches!(
            &err.failures()[0],
            OptionError::Duplicate { key, canonical } if key == "base_url" && canonical == "baseURL"
        ));
    }

    #[test]
    fn test_unknown_relationship_target_rejected() {
        let config = Configuration::from_mapping(mapping(json!({
            "objectMappings": {
                "article": {
                    "objectClass": "Article",
                    "relationships": { "author": { "mapping": "user" } }
                }
            }
        })));

        let err = config.configure_manager(&mut ObjectManager::new()).unwrap_err();
        assert_eq!(
            err.failures(),
            &[OptionError::Rejected {
                key: "objectMappings".to_string(),
                source: ManagerError::UnknownMapping {
                    name: "user".to_string()
                },
            }]
        );
    }

    #[test]
    fn test_accept_in_default_headers_rejected() {
        let config = Configuration::from_mapping(mapping(json!({
            "acceptHeader": "application/xml",
            "defaultHeaders": { "Accept": "text/plain" }
        })));
        let mut manager = ObjectManager::new();

        let err = config.configure_manager(&mut manager).unwrap_err();
        assert_eq!(
            err.failures(),
            &[OptionError::Rejected {
                key: "defaultHeaders".to_string(),
                source: ManagerError::ReservedHeader {
                    name: "Accept".to_string(),
                    option: "acceptHeader".to_string(),
                },
            }]
        );
        assert_eq!(manager, ObjectManager::new());

        let mut manager = ObjectManager::new();
        let config = config.with_policy(ApplyPolicy::BestEffort);
        assert!(config.configure_manager(&mut manager).is_err());
        assert_eq!(manager.accept_header(), Some("application/xml"));
    }

    fn mixed_mapping() -> ConfigurationMapping {
        mapping(json!({
            "baseURL": "ftp://files.example.com",
            "timeoutInterval": 10,
            "userAgent": "agent/1.0"
        }))
    }

    #[test]
    fn test_all_or_nothing_leaves_manager_untouched() {
        let config = Configuration::from_mapping(mixed_mapping());
        let mut manager = ObjectManager::new();

        let err = config.configure_manager(&mut manager).unwrap_err();
        assert_eq!(err.key(), Some("baseURL"));
        assert_eq!(manager, ObjectManager::new());
    }

    #[test]
    fn test_best_effort_applies_valid_options() {
        let config = Configuration::from_mapping(mixed_mapping()).with_policy(ApplyPolicy::BestEffort);
        let mut manager = ObjectManager::new();

        let err = config.configure_manager(&mut manager).unwrap_err();
        assert_eq!(err.keys(), vec!["baseURL"]);
        assert!(manager.base_url().is_none());
        assert_eq!(manager.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(manager.user_agent(), Some("agent/1.0"));
    }

    #[test]
    fn test_best_effort_collects_all_failures() {
        let config = Configuration::from_mapping(mapping(json!({
            "acceptHeader": "json",
            "bogus": true,
            "timeoutInterval": "soon",
            "userAgent": "agent/1.0"
        })))
        .with_policy(ApplyPolicy::BestEffort);
        let mut manager = ObjectManager::new();

        let err = config.configure_manager(&mut manager).unwrap_err();
        let mut keys = err.keys();
        keys.sort();
        assert_eq!(keys, vec!["acceptHeader", "bogus", "timeoutInterval"]);
        assert_eq!(manager.user_agent(), Some("agent/1.0"));
    }

    #[test]
    fn test_fail_fast_stops_at_first_failure() {
        let config = Configuration::from_mapping(mixed_mapping()).with_policy(ApplyPolicy::FailFast);
        let mut manager = ObjectManager::new();

        let err = config.configure_manager(&mut manager).unwrap_err();
        assert_eq!(err.failures().len(), 1);
        // baseURL is applied first, so nothing after it was reached
        assert!(manager.timeout().is_none());
        assert!(manager.user_agent().is_none());
    }

    #[test]
    fn test_fail_fast_keeps_earlier_options() {
        let config = Configuration::from_mapping(mapping(json!({
            "baseURL": "https://api.example.com",
            "timeoutInterval": 0
        })))
        .with_policy(ApplyPolicy::FailFast);
        let mut manager = ObjectManager::new();

        let err = config.configure_manager(&mut manager).unwrap_err();
        assert_eq!(err.key(), Some("timeoutInterval"));
        assert!(manager.base_url().is_some());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("best-effort".parse::<ApplyPolicy>(), Ok(ApplyPolicy::BestEffort));
        assert_eq!(ApplyPolicy::default(), ApplyPolicy::AllOrNothing);
        assert!("sometimes".parse::<ApplyPolicy>().is_err());
    }
}
