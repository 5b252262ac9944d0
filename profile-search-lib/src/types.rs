//! Core data types for profile probing.
//!
//! This module defines the outcome records produced by the engine, the
//! optional profile fields extracted from found profiles, and the shared
//! run configuration.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// Browser user agents rotated across requests by default.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Edge/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// Result of probing one platform for one username.
///
/// Exactly one `Outcome` is produced per probe, whatever happened on the
/// wire. Consumers should branch on [`exists`](Outcome::exists) first and
/// treat `error_message` as the explanation for an unknown state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// Platform name from the catalog (e.g., "GitHub")
    pub platform: String,

    /// The URL that was requested, with the username substituted
    pub url: String,

    /// Whether the profile exists.
    /// - `Some(true)`: the predicate confirmed the profile
    /// - `Some(false)`: the predicate confirmed there is no such profile
    /// - `None`: no attempt could be validated, see `error_message`
    pub exists: Option<bool>,

    /// Description of the last error when no attempt validated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Time from the first attempt until the outcome was settled
    #[serde(
        rename = "response_time_ms",
        serialize_with = "serialize_millis",
        deserialize_with = "deserialize_millis"
    )]
    pub response_time: Duration,

    /// How many attempts were made (1 when the first attempt validated)
    pub attempts: u32,

    /// Profile fields, only for found profiles whose extractor succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ProfileInfo>,
}

impl Outcome {
    /// Build an outcome for a probe that never got to run its attempts.
    pub fn failed<P: Into<String>, U: Into<String>>(
        platform: P,
        url: U,
        error: &crate::ProbeError,
    ) -> Self {
        Self {
            platform: platform.into(),
            url: url.into(),
            exists: None,
            error_message: Some(error.to_string()),
            response_time: Duration::ZERO,
            attempts: 0,
            info: None,
        }
    }

    /// True only when the profile was confirmed to exist.
    pub fn is_found(&self) -> bool {
        self.exists == Some(true)
    }

    /// True when the existence could not be determined.
    pub fn is_unknown(&self) -> bool {
        self.exists.is_none()
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Structured profile fields extracted from a found profile page.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ProfileInfo {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.bio.is_none()
            && self.followers.is_none()
            && self.following.is_none()
            && self.join_date.is_none()
            && self.website.is_none()
    }
}

/// Configuration shared read-only by every probe in a run.
///
/// Build it once, then hand it to the [`DispatchEngine`](crate::DispatchEngine),
/// which wraps it in an `Arc` for the spawned tasks.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Timeout for each individual HTTP request
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Attempts per probe, including the first one
    /// Default: 3, Range: 1-10
    pub max_retries: u32,

    /// Maximum number of probes in flight at once
    /// Default: 20, Range: 1-100
    pub concurrency: usize,

    /// Linear backoff step: the sleep after attempt `n` is `n * backoff_unit`
    /// Default: 1 second
    pub backoff_unit: Duration,

    /// User agents picked at random per request
    pub user_agents: Vec<String>,

    /// Proxy URLs picked at random per client; empty disables proxying
    pub proxies: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            concurrency: 20,
            backoff_unit: Duration::from_secs(1),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            proxies: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Set the concurrency cap.
    ///
    /// Automatically clamps concurrency to 1-100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of attempts per probe (clamped to 1-10).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.clamp(1, 10);
        self
    }

    /// Set the linear backoff step.
    pub fn with_backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    /// Replace the user agent pool. An empty list keeps the current pool.
    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        if !user_agents.is_empty() {
            self.user_agents = user_agents;
        }
        self
    }

    /// Replace the proxy pool.
    pub fn with_proxies(mut self, proxies: Vec<String>) -> Self {
        self.proxies = proxies;
        self
    }

    /// Pick a user agent uniformly at random.
    pub fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    /// Pick a proxy uniformly at random, if any are configured.
    pub fn pick_proxy(&self) -> Option<&str> {
        self.proxies
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config() {
        let config = RunConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.concurrency, 20);
        assert_eq!(config.user_agents.len(), DEFAULT_USER_AGENTS.len());
        assert!(config.proxies.is_empty());
        assert!(config.pick_proxy().is_none());
    }

    #[test]
    fn test_builders_clamp() {
        let config = RunConfig::default()
            .with_concurrency(0)
            .with_max_retries(50);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_retries, 10);

        let config = RunConfig::default().with_concurrency(500);
        assert_eq!(config.concurrency, 100);
    }

    #[test]
    fn test_empty_user_agent_pool_is_ignored() {
        let config = RunConfig::default().with_user_agents(vec![]);
        assert_eq!(config.user_agents.len(), DEFAULT_USER_AGENTS.len());
    }

    #[test]
    fn test_pick_from_pools() {
        let config = RunConfig::default()
            .with_user_agents(vec!["agent-a".to_string()])
            .with_proxies(vec!["http://127.0.0.1:8080".to_string()]);
        assert_eq!(config.pick_user_agent(), "agent-a");
        assert_eq!(config.pick_proxy(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_outcome_serializes_millis() {
        let outcome = Outcome {
            platform: "GitHub".to_string(),
            url: "https://github.com/alice".to_string(),
            exists: Some(true),
            error_message: None,
            response_time: Duration::from_millis(1250),
            attempts: 1,
            info: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["response_time_ms"], 1250);
        assert_eq!(json["exists"], true);
        assert!(json.get("error_message").is_none());
        assert!(json.get("info").is_none());
    }

    #[test]
    fn test_profile_info_is_empty() {
        assert!(ProfileInfo::default().is_empty());
        let info = ProfileInfo {
            bio: Some("hello".to_string()),
            ..Default::default()
        };
        assert!(!info.is_empty());
    }
}
