//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value {:?} for environment variable {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Resolve the effective configuration: file (or defaults), then process
/// environment overrides, then validation.
pub fn resolve_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    resolve_config_with(path, |var| std::env::var(var).ok())
}

fn resolve_config_with<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the deployment environment variables on top of `config`.
///
/// `HOST` and `PORT` rewrite the bind address, `CORS_ORIGIN` is a
/// comma-separated origin list, and the `COMMON_RATE_LIMIT_*` pair sets the
/// limiter (the window is given in milliseconds and rounded up to seconds).
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("HOST");
    let port = lookup("PORT");
    if host.is_some() || port.is_some() {
        let (current_host, current_port) = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(h, p)| (h.to_string(), p.to_string()))
            .unwrap_or_else(|| (config.listener.bind_address.clone(), "8080".to_string()));

        if let Some(port) = &port {
            port.parse::<u16>().map_err(|_| ConfigError::Env {
                var: "PORT",
                value: port.clone(),
            })?;
        }

        config.listener.bind_address = format!(
            "{}:{}",
            host.unwrap_or(current_host),
            port.unwrap_or(current_port)
        );
    }

    if let Some(origins) = lookup("CORS_ORIGIN") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "*")
            .map(str::to_string)
            .collect();
    }

    if let Some(value) = lookup("COMMON_RATE_LIMIT_MAX_REQUESTS") {
        config.rate_limit.max_requests = value.parse().map_err(|_| ConfigError::Env {
            var: "COMMON_RATE_LIMIT_MAX_REQUESTS",
            value: value.clone(),
        })?;
    }

    if let Some(value) = lookup("COMMON_RATE_LIMIT_WINDOW_MS") {
        let millis: u64 = value.parse().map_err(|_| ConfigError::Env {
            var: "COMMON_RATE_LIMIT_WINDOW_MS",
            value: value.clone(),
        })?;
        config.rate_limit.window_secs = millis.div_ceil(1000);
    }

    Ok(())
}
