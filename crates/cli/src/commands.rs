//! Subcommand implementations

use anyhow::{bail, Context, Result};
use config::{ApplyPolicy, ConfigValidator, Configuration, ConfigurationLoader};
use object_manager::ObjectManager;
use types::LoadError;
use url::Url;

/// Build the loader shared by every subcommand
pub fn loader(env_prefix: Option<&str>) -> ConfigurationLoader {
    match env_prefix {
        Some(prefix) => ConfigurationLoader::new().env_prefix(prefix),
        None => ConfigurationLoader::new(),
    }
}

/// Load from a URL when `source` has a scheme, otherwise from a local path
fn load(loader: &ConfigurationLoader, source: &str) -> Result<Configuration, LoadError> {
    let mapping = match Url::parse(source) {
        // Single-letter schemes are Windows drive letters
        Ok(url) if url.scheme().len() > 1 => loader.load_url(&url)?,
        _ => loader.load_path(source)?,
    };

    Ok(Configuration::from_mapping(mapping))
}

pub fn check(loader: &ConfigurationLoader, source: &str) -> Result<()> {
    let configuration = load(loader, source)
        .with_context(|| format!("Failed to load configuration from {}", source))?;

    let report = ConfigValidator::validate(&configuration);

    for issue in &report.errors {
        println!("error: {}: {}", issue.field, issue.message);
    }
    for issue in &report.warnings {
        println!("warning: {}: {}", issue.field, issue.message);
    }
    println!("{}", report.summary());

    if report.has_errors() {
        bail!("Configuration {} is invalid", source);
    }

    Ok(())
}

pub fn apply(loader: &ConfigurationLoader, source: &str, policy: ApplyPolicy) -> Result<()> {
    let configuration = load(loader, source)
        .with_context(|| format!("Failed to load configuration from {}", source))?
        .with_policy(policy);

    let mut manager = ObjectManager::new();
    let outcome = configuration.configure_manager(&mut manager);

    println!(
        "{}",
        serde_json::to_string_pretty(&manager).context("Failed to serialize manager state")?
    );

    if let Err(err) = outcome {
        for failure in err.failures() {
            eprintln!("error: {}", failure);
        }
        bail!("Configuration {} could not be applied ({} policy)", source, policy);
    }

    Ok(())
}
