//! # Profile Search Library
//!
//! A concurrent engine for checking whether a username has a public profile
//! on a set of web platforms.
//!
//! Each platform is described by a [`Probe`]: a URL template plus a predicate
//! that decides existence from the HTTP response. The [`DispatchEngine`] runs
//! every probe under a concurrency cap, retrying transient failures with a
//! linear backoff, and streams back one [`Outcome`] per platform.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use profile_search_lib::{get_platforms, DispatchEngine, ReqwestTransport, RunConfig, RunSummary};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = DispatchEngine::new(ReqwestTransport::new(), RunConfig::default());
//!     let mut summary = RunSummary::new();
//!
//!     let mut outcomes = engine.run(get_platforms(), "alice");
//!     while let Some(outcome) = outcomes.next().await {
//!         println!("{} - exists: {:?}", outcome.platform, outcome.exists);
//!         summary.record(&outcome);
//!     }
//!
//!     println!("{}", summary);
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded concurrency**: a semaphore caps in-flight probes
//! - **Retries**: linear backoff for network errors and timeouts
//! - **Rotation**: random user agent and proxy per attempt
//! - **Pluggable transport**: swap HTTP for anything implementing [`Transport`]

// Re-export main public API types and functions
pub use catalog::{
    extract_github_info, find_platform, get_platforms, platform_names, select_platforms,
};
pub use config::{
    load_env_config, parse_duration, validate_proxies, ConfigManager, DefaultsConfig, EnvConfig,
    FileConfig, TransportConfig,
};
pub use dispatch::{DispatchEngine, OutcomeStream};
pub use error::ProbeError;
pub use executor::{backoff_delay, ProbeExecutor};
pub use probe::{
    contains_any, exists_unless_404, exists_unless_marked, Extractor, Probe, Validator,
    USERNAME_SLOT,
};
pub use report::{render_json, RunSummary};
pub use transport::{
    HttpClient, ProbeClient, ProbeRequest, ProbeResponse, ReqwestTransport, Transport, ACCEPT,
    ACCEPT_LANGUAGE,
};
pub use types::{Outcome, ProfileInfo, RunConfig, DEFAULT_USER_AGENTS};
pub use utils::validate_username;

// Internal modules - these are not part of the public API
mod catalog;
mod config;
mod dispatch;
mod error;
mod executor;
mod probe;
mod report;
mod transport;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ProbeError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
