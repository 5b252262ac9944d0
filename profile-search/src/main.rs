//! Profile Search CLI Application
//!
//! A command-line interface for checking whether a username has a profile on
//! popular web platforms. This CLI application provides a user-friendly
//! interface to the profile-search-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use futures::StreamExt;
use profile_search_lib::{
    load_env_config, parse_duration, platform_names, render_json, select_platforms,
    validate_proxies, validate_username, ConfigManager, DispatchEngine, EnvConfig, FileConfig,
    ReqwestTransport, RunConfig, RunSummary,
};
use std::process;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for profile-search
#[derive(Parser, Debug)]
#[command(name = "profile-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check whether a username exists across popular web platforms")]
#[command(
    long_about = "Check whether a username exists across popular web platforms.\n\nProbes run concurrently with retries, rotating user agents and optional proxies."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Username to search for
    #[arg(
        short = 'u',
        long = "username",
        value_name = "NAME",
        help_heading = "Search"
    )]
    pub username: Option<String>,

    /// Platforms to check (comma-separated, case-insensitive; default: all)
    #[arg(short = 'p', long = "platform", value_name = "NAME", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Search")]
    pub platforms: Option<Vec<String>>,

    /// List all supported platforms and exit
    #[arg(long = "list-platforms", help_heading = "Search")]
    pub list_platforms: bool,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Max concurrent probes (default: 20, max: 100)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Per-request timeout, e.g. "10s", "1m", "5" (default: 10s)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Attempts per platform (default: 3, max: 10)
    #[arg(short = 'r', long = "retries", help_heading = "Performance")]
    pub retries: Option<u32>,

    /// Proxy URLs to rotate through (comma-separated)
    #[arg(long = "proxy", value_name = "URL", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Transport")]
    pub proxies: Option<Vec<String>>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logs and per-platform timing details
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, Default)]
struct Settings {
    run: RunConfig,
    platforms: Vec<String>,
    json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(&args);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    // Handle --list-platforms early
    if args.list_platforms {
        ui::print_platforms(&platform_names());
        return;
    }

    let Some(username) = args.username.as_deref() else {
        ui::print_usage_hint();
        return;
    };

    tracing::info!(
        "profile-search CLI v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run_search(&args, username).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,profile_search={},profile_search_lib={}",
            level, level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // --list-platforms is self-contained, skip other validation
    if args.list_platforms {
        return Ok(());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(retries) = args.retries {
        if retries == 0 || retries > 10 {
            return Err("Retries must be between 1 and 10".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_duration(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    if let Some(proxies) = &args.proxies {
        validate_proxies(proxies).map_err(|e| e.to_string())?;
    }

    Ok(())
}

async fn run_search(args: &Args, username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let username = validate_username(username)?;
    let settings = build_config(args)?;
    let probes = select_platforms(&settings.platforms)?;
    let platform_count = probes.len();

    let engine = DispatchEngine::new(ReqwestTransport::new(), settings.run);

    if settings.json {
        let outcomes = engine.run_collect(probes, username).await;
        println!("{}", render_json(username, &outcomes)?);
        return Ok(());
    }

    ui::print_header(username, platform_count, engine.config().concurrency);

    let mut summary = RunSummary::new();
    let mut outcomes = engine.run(probes, username);
    while let Some(outcome) = outcomes.next().await {
        ui::print_outcome(&outcome, args.debug);
        summary.record(&outcome);
    }

    ui::print_summary(&summary);
    Ok(())
}

/// Resolve settings: built-in defaults, then config file, then `PS_*`
/// environment variables, then CLI flags.
fn build_config(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::default();
    let env_config = load_env_config(args.verbose);

    // Create config manager for file discovery
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: Explicit config file (CLI --config, then PS_CONFIG) or discovery
    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    if let Some(path) = explicit_path {
        tracing::info!(path = %path, "using explicit config file");

        let file_config = config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;

        settings = merge_file_config(settings, file_config);
    } else {
        let file_config = config_manager.discover_and_load()?;
        settings = merge_file_config(settings, file_config);
    }

    // Step 2: Apply environment variables (PS_*)
    settings = apply_environment_config(settings, env_config);

    // Step 3: Apply CLI arguments (highest precedence)
    settings = apply_cli_args(settings, args);

    // Whatever the source, a proxy the client would reject stops the run
    validate_proxies(&settings.run.proxies)?;

    Ok(settings)
}

/// Merge a loaded file configuration into the settings.
fn merge_file_config(mut settings: Settings, file_config: FileConfig) -> Settings {
    if let Some(defaults) = file_config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            settings.run = settings.run.with_concurrency(concurrency);
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration) {
            settings.run = settings.run.with_timeout(timeout);
        }
        if let Some(max_retries) = defaults.max_retries {
            settings.run = settings.run.with_max_retries(max_retries);
        }
        if let Some(backoff) = defaults.backoff.as_deref().and_then(parse_duration) {
            settings.run = settings.run.with_backoff_unit(backoff);
        }
        if let Some(platforms) = defaults.platforms {
            settings.platforms = platforms;
        }
        if let Some(json) = defaults.json {
            settings.json = json;
        }
    }

    if let Some(transport) = file_config.transport {
        if let Some(proxies) = transport.proxies {
            settings.run = settings.run.with_proxies(proxies);
        }
        if let Some(user_agents) = transport.user_agents {
            settings.run = settings.run.with_user_agents(user_agents);
        }
    }

    settings
}

/// Apply `PS_*` environment values to the settings.
fn apply_environment_config(mut settings: Settings, env_config: EnvConfig) -> Settings {
    if let Some(concurrency) = env_config.concurrency {
        settings.run = settings.run.with_concurrency(concurrency);
    }
    if let Some(timeout) = env_config.timeout {
        settings.run = settings.run.with_timeout(timeout);
    }
    if let Some(max_retries) = env_config.max_retries {
        settings.run = settings.run.with_max_retries(max_retries);
    }
    if let Some(proxies) = env_config.proxies {
        settings.run = settings.run.with_proxies(proxies);
    }
    if let Some(platforms) = env_config.platforms {
        settings.platforms = platforms;
    }
    if let Some(json) = env_config.json {
        settings.json = json;
    }

    settings
}

/// Apply CLI arguments to the settings (highest precedence).
fn apply_cli_args(mut settings: Settings, args: &Args) -> Settings {
    if let Some(concurrency) = args.concurrency {
        settings.run = settings.run.with_concurrency(concurrency);
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration) {
        settings.run = settings.run.with_timeout(timeout);
    }
    if let Some(retries) = args.retries {
        settings.run = settings.run.with_max_retries(retries);
    }
    if let Some(proxies) = &args.proxies {
        settings.run = settings.run.with_proxies(proxies.clone());
    }
    if let Some(platforms) = &args.platforms {
        settings.platforms = platforms.clone();
    }
    // Only override when the flag is passed, so config/env json = true survives
    if args.json {
        settings.json = true;
    }

    settings
}
