//! Per-platform probe definitions.
//!
//! A [`Probe`] is a plain record: a platform name, a URL template with one
//! `{}` slot for the username, an existence predicate and an optional profile
//! extractor. Both behaviors are function pointers so the catalog stays a
//! declarative table.

use crate::error::ProbeError;
use crate::transport::ProbeResponse;
use crate::types::ProfileInfo;
use reqwest::Url;
use std::borrow::Cow;
use std::fmt;

/// Placeholder replaced by the username in a URL template.
pub const USERNAME_SLOT: &str = "{}";

/// Decides from a response whether the profile exists.
pub type Validator = fn(&ProbeResponse) -> Result<bool, ProbeError>;

/// Pulls structured profile fields out of a found profile's response.
pub type Extractor = fn(&ProbeResponse) -> Result<ProfileInfo, ProbeError>;

/// One platform-specific existence check.
#[derive(Clone)]
pub struct Probe {
    name: Cow<'static, str>,
    url_template: Cow<'static, str>,
    validator: Validator,
    extractor: Option<Extractor>,
}

impl Probe {
    pub fn new<N, T>(name: N, url_template: T, validator: Validator) -> Self
    where
        N: Into<Cow<'static, str>>,
        T: Into<Cow<'static, str>>,
    {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            validator,
            extractor: None,
        }
    }

    /// Attach a profile extractor.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn has_extractor(&self) -> bool {
        self.extractor.is_some()
    }

    /// Substitute the username into the template's first slot.
    pub fn resolve_url(&self, username: &str) -> String {
        self.url_template.replacen(USERNAME_SLOT, username, 1)
    }

    /// Check that a resolved URL still targets the template's host.
    ///
    /// Returns a request-build error when the username moved the request to
    /// another host. Templates without a `scheme://` prefix are not checked.
    pub fn check_host(&self, username: &str, resolved: &Url) -> Result<(), ProbeError> {
        let Some(authority) = template_authority(&self.url_template) else {
            return Ok(());
        };

        let expected = authority
            .replacen(USERNAME_SLOT, username, 1)
            .to_ascii_lowercase();
        let expected_host = strip_port(&expected);
        let actual_host = resolved.host_str().unwrap_or_default();

        if actual_host == expected_host {
            Ok(())
        } else {
            Err(ProbeError::request_build(
                resolved.as_str(),
                format!(
                    "username moves the request to host '{}' instead of '{}'",
                    actual_host, expected_host
                ),
            ))
        }
    }

    /// Run the existence predicate.
    ///
    /// Validation errors are tagged with this probe's platform name.
    pub fn validate(&self, response: &ProbeResponse) -> Result<bool, ProbeError> {
        (self.validator)(response).map_err(|e| self.tag(e))
    }

    /// Run the extractor, if any.
    ///
    /// Returns `None` when there is no extractor, when it fails, or when it
    /// found nothing; failures are logged and otherwise swallowed.
    pub fn extract(&self, response: &ProbeResponse) -> Option<ProfileInfo> {
        let extractor = self.extractor?;
        match extractor(response) {
            Ok(info) if !info.is_empty() => Some(info),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(platform = %self.name, error = %e, "profile extraction failed");
                None
            }
        }
    }

    fn tag(&self, err: ProbeError) -> ProbeError {
        match err {
            ProbeError::Validation { message, .. } => {
                ProbeError::validation(self.name.clone(), message)
            }
            other => other,
        }
    }
}

/// The `host[:port]` part of a URL template, before any path.
fn template_authority(template: &str) -> Option<&str> {
    let (_, rest) = template.split_once("://")?;
    rest.split(['/', '?', '#']).next()
}

fn strip_port(authority: &str) -> &str {
    match authority.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => authority,
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("url_template", &self.url_template)
            .field("has_extractor", &self.extractor.is_some())
            .finish()
    }
}

/// Existence rule for platforms whose not-found page is a reliable 404.
pub fn exists_unless_404(response: &ProbeResponse) -> Result<bool, ProbeError> {
    Ok(!response.is_not_found())
}

/// True when `body` contains any of `markers`.
pub fn contains_any(body: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| body.contains(marker))
}

/// Existence rule for platforms that render a not-found marker in the body.
///
/// The profile exists unless the body carries one of `markers`.
pub fn exists_unless_marked(
    response: &ProbeResponse,
    markers: &[&str],
) -> Result<bool, ProbeError> {
    let body = response.text()?;
    Ok(!contains_any(body, markers))
}
