//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `PS_*`
//! environment variables, and merging file configurations with proper
//! precedence rules.

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// concurrency = 10
/// timeout = "15s"
/// max_retries = 2
/// backoff = "500ms"
/// platforms = ["GitHub", "GitLab"]
/// json = false
///
/// [transport]
/// proxies = ["http://127.0.0.1:8080"]
/// user_agents = ["Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Proxy and user-agent rotation pools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-request timeout (as string, e.g., "5s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Attempts per probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Linear backoff step (as string, e.g., "1s", "250ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<String>,

    /// Platforms to probe (empty or absent means all)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,

    /// Default JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

/// Rotation pools for the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxies: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agents: Option<Vec<String>>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ProbeError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ProbeError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ProbeError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)
            .map_err(|e| ProbeError::config(format!("Failed to parse TOML configuration: {}", e)))?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is the lowest precedence, then the home directory file,
    /// then a file in the current directory. A discovered file that fails to
    /// load or validate is an error, not skipped.
    pub fn discover_and_load(&self) -> Result<FileConfig, ProbeError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(path);
        }

        if self.verbose {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "loaded config file");
            }
            if loaded_files.len() > 1 {
                tracing::info!("multiple config files found, later files take precedence");
            }
        }

        Ok(merged_config)
    }

    /// Configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./profile-search.toml", "./.profile-search.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".profile-search.toml", "profile-search.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Configuration file following the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("profile-search").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.max_retries.is_some() {
                        lower_defaults.max_retries = higher_defaults.max_retries;
                    }
                    if higher_defaults.backoff.is_some() {
                        lower_defaults.backoff = higher_defaults.backoff;
                    }
                    if higher_defaults.platforms.is_some() {
                        lower_defaults.platforms = higher_defaults.platforms;
                    }
                    if higher_defaults.json.is_some() {
                        lower_defaults.json = higher_defaults.json;
                    }
                    Some(lower_defaults)
                }
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            transport: match (lower.transport, higher.transport) {
                (Some(mut lower_transport), Some(higher_transport)) => {
                    if higher_transport.proxies.is_some() {
                        lower_transport.proxies = higher_transport.proxies;
                    }
                    if higher_transport.user_agents.is_some() {
                        lower_transport.user_agents = higher_transport.user_agents;
                    }
                    Some(lower_transport)
                }
                (lower_transport, higher_transport) => higher_transport.or(lower_transport),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ProbeError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(ProbeError::config("Concurrency must be between 1 and 100"));
                }
            }

            if let Some(max_retries) = defaults.max_retries {
                if max_retries == 0 || max_retries > 10 {
                    return Err(ProbeError::config("max_retries must be between 1 and 10"));
                }
            }

            for (key, value) in [("timeout", &defaults.timeout), ("backoff", &defaults.backoff)] {
                if let Some(value) = value {
                    if parse_duration(value).is_none() {
                        return Err(ProbeError::config(format!(
                            "Invalid {} format '{}'. Use format like '500ms', '5s', '2m'",
                            key, value
                        )));
                    }
                }
            }
        }

        if let Some(transport) = &config.transport {
            if let Some(user_agents) = &transport.user_agents {
                if user_agents.iter().all(|ua| ua.trim().is_empty()) {
                    return Err(ProbeError::config("user_agents cannot be empty"));
                }
            }

            if let Some(proxies) = &transport.proxies {
                validate_proxies(proxies)?;
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `PS_*` variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
    pub proxies: Option<Vec<String>>,
    pub platforms: Option<Vec<String>>,
    pub json: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    EnvConfig::from_vars(env::vars(), verbose)
}

impl EnvConfig {
    /// Parse `PS_*` variables out of an arbitrary key/value source.
    pub fn from_vars<I>(vars: I, verbose: bool) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with("PS_"))
            .collect();
        let mut env_config = EnvConfig::default();

        let used = |key: &str, value: &str| {
            if verbose {
                tracing::info!("Using {}={}", key, value);
            }
        };
        let invalid = |key: &str, value: &str, hint: &str| {
            tracing::warn!("Invalid {}='{}', {}", key, value, hint);
        };

        if let Some(val) = vars.get("PS_CONCURRENCY") {
            match val.trim().parse::<usize>() {
                Ok(concurrency) if (1..=100).contains(&concurrency) => {
                    env_config.concurrency = Some(concurrency);
                    used("PS_CONCURRENCY", val);
                }
                _ => invalid("PS_CONCURRENCY", val, "must be 1-100"),
            }
        }

        if let Some(val) = vars.get("PS_TIMEOUT") {
            match parse_duration(val) {
                Some(timeout) => {
                    env_config.timeout = Some(timeout);
                    used("PS_TIMEOUT", val);
                }
                None => invalid("PS_TIMEOUT", val, "use format like '5s', '30s', '2m'"),
            }
        }

        if let Some(val) = vars.get("PS_MAX_RETRIES") {
            match val.trim().parse::<u32>() {
                Ok(retries) if (1..=10).contains(&retries) => {
                    env_config.max_retries = Some(retries);
                    used("PS_MAX_RETRIES", val);
                }
                _ => invalid("PS_MAX_RETRIES", val, "must be 1-10"),
            }
        }

        if let Some(val) = vars.get("PS_PROXIES") {
            let proxies = split_list(val);
            if !proxies.is_empty() {
                env_config.proxies = Some(proxies);
                used("PS_PROXIES", val);
            }
        }

        if let Some(val) = vars.get("PS_PLATFORMS") {
            let platforms = split_list(val);
            if !platforms.is_empty() {
                env_config.platforms = Some(platforms);
                used("PS_PLATFORMS", val);
            }
        }

        if let Some(val) = vars.get("PS_JSON") {
            match parse_bool(val) {
                Some(json) => {
                    env_config.json = Some(json);
                    used("PS_JSON", val);
                }
                None => invalid("PS_JSON", val, "use true/false"),
            }
        }

        if let Some(val) = vars.get("PS_CONFIG") {
            if !val.trim().is_empty() {
                env_config.config = Some(val.clone());
                used("PS_CONFIG", val);
            }
        }

        env_config
    }
}

/// Check that every proxy URL is one the HTTP client will accept.
///
/// Applies to proxies from every source: a rejected proxy must stop the run
/// rather than let requests go out directly.
pub fn validate_proxies(proxies: &[String]) -> Result<(), ProbeError> {
    for proxy in proxies {
        reqwest::Url::parse(proxy)
            .map_err(|e| ProbeError::config(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
        reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| ProbeError::config(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
    }
    Ok(())
}

/// Parse a duration string like "250ms", "5s", "2m", or a bare number of seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(millis) = value.strip_suffix("ms") {
        millis.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60))
    } else {
        // Assume seconds if no unit
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
