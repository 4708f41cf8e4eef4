#![forbid(unsafe_code)]

//! Startup configuration. Values come from command line overrides, then the
//! process environment, then an optional `.env` file.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    env,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::youtube::DEFAULT_API_BASE_URL;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub port: u16,
    pub host: String,
    /// `None` keeps the server up but makes every video request fail.
    pub youtube_api_key: Option<String>,
    pub api_base_url: String,
    pub upstream_timeout: Duration,
}

impl RuntimeSettings {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let host = self.host.parse::<IpAddr>().with_context(|| {
            format!(
                "expected a valid IPv4 or IPv6 address for HOST, got {}",
                self.host
            )
        })?;
        Ok(SocketAddr::new(host, self.port))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime_settings(overrides: RuntimeOverrides) -> Result<RuntimeSettings> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    Ok(build_runtime_settings_with_overrides(
        &file_vars,
        env_var_string,
        overrides,
    ))
}

#[cfg(test)]
fn build_runtime_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> RuntimeSettings {
    build_runtime_settings_with_overrides(file_vars, env_lookup, RuntimeOverrides::default())
}

fn build_runtime_settings_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> RuntimeSettings {
    let port = overrides
        .port
        .or_else(|| {
            lookup_value("PORT", file_vars, &env_lookup).and_then(|value| value.parse::<u16>().ok())
        })
        .unwrap_or(DEFAULT_PORT);
    let host = overrides
        .host
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| lookup_value("HOST", file_vars, &env_lookup))
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let youtube_api_key = lookup_value(API_KEY_VAR, file_vars, &env_lookup)
        .filter(|value| !value.trim().is_empty());
    let api_base_url = lookup_value("YOUTUBE_API_BASE_URL", file_vars, &env_lookup)
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let timeout_secs = lookup_value("UPSTREAM_TIMEOUT_SECS", file_vars, &env_lookup)
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

    RuntimeSettings {
        port,
        host,
        youtube_api_key,
        api_base_url,
        upstream_timeout: Duration::from_secs(timeout_secs),
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| file_vars.get(key).cloned())
}

/// Reads `KEY=value` pairs without touching the process environment. A
/// missing file yields no variables.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let entries =
        dotenvy::from_path_iter(path).with_context(|| format!("Reading {}", path.display()))?;
    entries
        .map(|entry| entry.with_context(|| format!("Parsing {}", path.display())))
        .collect()
}
