//! Run summary statistics.
//!
//! [`RunSummary`] is fed outcomes one at a time as they stream in, so the
//! console can print each line immediately and the totals at the end.

use crate::error::ProbeError;
use crate::types::Outcome;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Totals accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub checked: usize,
    pub found: usize,
    pub not_found: usize,
    pub unknown: usize,
    #[serde(skip)]
    pub total_response_time: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a summary from a finished set of outcomes.
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a Outcome>,
    {
        let mut summary = Self::new();
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }

    /// Account for one more outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        self.checked += 1;
        self.total_response_time += outcome.response_time;
        match outcome.exists {
            Some(true) => self.found += 1,
            Some(false) => self.not_found += 1,
            None => self.unknown += 1,
        }
    }

    /// Mean response time over every checked probe, `None` when nothing ran.
    pub fn average_response_time(&self) -> Option<Duration> {
        if self.checked == 0 {
            return None;
        }
        Some(self.total_response_time / self.checked as u32)
    }

    /// The average as display text: seconds with two decimals, or `no data`.
    pub fn average_display(&self) -> String {
        match self.average_response_time() {
            Some(avg) => format!("{:.2}s", avg.as_secs_f64()),
            None => "no data".to_string(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "checked: {}", self.checked)?;
        writeln!(f, "found: {}", self.found)?;
        writeln!(f, "not found: {}", self.not_found)?;
        writeln!(f, "unknown: {}", self.unknown)?;
        write!(f, "average response time: {}", self.average_display())
    }
}

/// Machine-readable report: every outcome plus the totals.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    username: &'a str,
    results: &'a [Outcome],
    summary: &'a RunSummary,
}

/// Render a finished run as pretty-printed JSON.
pub fn render_json(username: &str, outcomes: &[Outcome]) -> Result<String, ProbeError> {
    let summary = RunSummary::from_outcomes(outcomes);
    let report = JsonReport {
        username,
        results: outcomes,
        summary: &summary,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| ProbeError::internal(format!("Failed to serialize report: {}", e)))
}
