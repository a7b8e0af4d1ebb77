use super::types::*;
use crate::config::expand_env_vars;
use regex::Regex;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate config from YAML text, expanding `$env{VAR}` first.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml)?;

    // An empty document means "all defaults".
    let config: Config = if yaml.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml)?
    };

    validate_config(&config)?;
    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");
    let mut unexpanded: Vec<&str> = re
        .captures_iter(yaml_string)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect();

    if unexpanded.is_empty() {
        return Ok(());
    }

    unexpanded.sort();
    unexpanded.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}\n\
         Set them (e.g. export {}=...) or replace them in the config file",
        unexpanded.join(", "),
        unexpanded[0]
    )))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_endpoint(&config.endpoint, &mut errors);
    validate_population(&config.population, &mut errors);

    let aggregation = &config.aggregation;
    if aggregation.batch_size == 0 {
        errors.push("aggregation.batch_size must be greater than zero".to_string());
    } else if aggregation.batch_size > config.mock.max_batch_size {
        errors.push(format!(
            "aggregation.batch_size ({}) exceeds the endpoint batch ceiling ({})",
            aggregation.batch_size, config.mock.max_batch_size
        ));
    }

    if config.mock.max_batch_size == 0 {
        errors.push("mock.max_batch_size must be greater than zero".to_string());
    }

    if config.mock.rate_limit_tolerance > aggregation.request_interval {
        errors.push(format!(
            "mock.rate_limit_tolerance ({:?}) exceeds aggregation.request_interval ({:?}); every batch would be rate limited",
            config.mock.rate_limit_tolerance, aggregation.request_interval
        ));
    }

    for (field, listen) in [
        ("server.listen", &config.server.listen),
        ("mock.listen", &config.mock.listen),
    ] {
        if listen.parse::<SocketAddr>().is_err() {
            errors.push(format!("{}: '{}' is not a valid socket address", field, listen));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_endpoint(endpoint: &EndpointConfig, errors: &mut Vec<String>) {
    if endpoint.host.trim().is_empty() {
        errors.push("endpoint.host cannot be empty".to_string());
    }
    if endpoint.port == 0 {
        errors.push("endpoint.port cannot be zero".to_string());
    }
    if !endpoint.path.starts_with('/') {
        errors.push(format!(
            "endpoint.path must start with '/', got '{}'",
            endpoint.path
        ));
    }
    if endpoint.secret.is_empty() {
        errors.push("endpoint.secret cannot be empty".to_string());
    }
    if endpoint.timeout.is_zero() {
        errors.push("endpoint.timeout must be greater than zero".to_string());
    }
}

fn validate_population(population: &PopulationConfig, errors: &mut Vec<String>) {
    if population.count == 0 {
        return;
    }

    // Identifiers stay unique only while the largest index fits the padding.
    let digits = (population.count - 1).to_string().len();
    if population.width < digits {
        errors.push(format!(
            "population.width ({}) is too small for {} devices (need at least {})",
            population.width, population.count, digits
        ));
    }
}
