//! Console display logic for the profile-search CLI.
//!
//! Result lines are printed as outcomes stream in, followed by a summary.
//! Uses only the `console` crate for styling.

use console::{pad_str, style, Alignment};
use profile_search_lib::{Outcome, ProfileInfo, RunSummary};

const PLATFORM_WIDTH: usize = 14;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print the run header before any outcome arrives.
pub fn print_header(username: &str, platform_count: usize, concurrency: usize) {
    println!(
        "{} {} {}",
        style("profile-search").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Searching for '{}' on {} platform{}",
            username,
            platform_count,
            plural(platform_count)
        ))
        .dim(),
    );
    println!("{}", style(format!("Concurrency: {}", concurrency)).dim());
    println!();
}

/// Printed when no username was given.
pub fn print_usage_hint() {
    println!("Please provide a username with --username <NAME>");
    println!();
    println!("Example: profile-search --username alice");
    println!("Run with --help for all options.");
}

// ── Single outcome ───────────────────────────────────────────────────────────

/// Print one outcome line, with profile fields indented under found lines.
pub fn print_outcome(outcome: &Outcome, debug: bool) {
    for line in format_outcome(outcome) {
        println!("{}", line);
    }

    if debug {
        println!(
            "    {} {} attempt{} in {}ms",
            style("└─").dim(),
            outcome.attempts,
            plural(outcome.attempts as usize),
            outcome.response_time.as_millis(),
        );
    }
}

/// Render an outcome as display lines.
pub fn format_outcome(outcome: &Outcome) -> Vec<String> {
    let padded = pad_str(&outcome.platform, PLATFORM_WIDTH, Alignment::Left, Some(".."));
    let secs = outcome.response_time.as_secs_f64();

    match outcome.exists {
        Some(true) => {
            let mut lines = vec![format!(
                "  {}  {}  {} ({:.2}s)",
                style(&padded).white(),
                style("FOUND").green().bold(),
                outcome.url,
                secs,
            )];
            if let Some(info) = &outcome.info {
                lines.extend(format_profile_info(info));
            }
            lines
        }
        Some(false) => vec![format!(
            "  {}  {} ({:.2}s)",
            style(&padded).white(),
            style("NOT FOUND").red(),
            secs,
        )],
        None => vec![format!(
            "  {}  {}  {} ({:.2}s)",
            style(&padded).white(),
            style("ERROR").yellow(),
            style(outcome.error_message.as_deref().unwrap_or("unknown error")).dim(),
            secs,
        )],
    }
}

fn format_profile_info(info: &ProfileInfo) -> Vec<String> {
    let fields = [
        ("Name", &info.name),
        ("Location", &info.location),
        ("Bio", &info.bio),
        ("Followers", &info.followers),
        ("Following", &info.following),
        ("Joined", &info.join_date),
        ("Website", &info.website),
    ];

    fields
        .iter()
        .filter_map(|(label, value)| {
            value
                .as_ref()
                .map(|v| format!("      {} {}", style(format!("{}:", label)).dim(), v))
        })
        .collect()
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final totals.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    for line in summary.to_string().lines() {
        println!("  {}", line);
    }
}

// ── Platform list ────────────────────────────────────────────────────────────

/// Print every platform in the built-in catalog.
pub fn print_platforms(names: &[String]) {
    println!(
        "{}",
        style(format!("{} supported platforms:", names.len()))
            .yellow()
            .bold()
    );
    for name in names {
        println!("  {}", name);
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
