//! Built-in platform catalog.
//!
//! Each entry encodes one platform's existence heuristic. Many platforms
//! answer 200 for missing profiles too, so most rules look for a not-found
//! marker in the body rather than trusting the status code.

use crate::error::ProbeError;
use crate::probe::{contains_any, exists_unless_404, exists_unless_marked, Probe};
use crate::transport::ProbeResponse;
use crate::types::ProfileInfo;
use regex::Regex;

lazy_static::lazy_static! {
    static ref GITHUB_NAME: Regex = Regex::new(r#"itemprop="name">([^<]+)</span>"#).unwrap();
    static ref GITHUB_LOCATION: Regex =
        Regex::new(r#"itemprop="homeLocation">([^<]+)</span>"#).unwrap();
    static ref GITHUB_BIO: Regex = Regex::new(r#"itemprop="description">([^<]+)</div>"#).unwrap();
    static ref GITHUB_WEBSITE: Regex =
        Regex::new(r#"itemprop="url"[^>]*>\s*<a[^>]*href="([^"]+)""#).unwrap();
    static ref GITHUB_FOLLOWERS: Regex =
        Regex::new(r#"<span class="text-bold[^"]*">([^<]+)</span>\s*followers"#).unwrap();
    static ref GITHUB_FOLLOWING: Regex =
        Regex::new(r#"<span class="text-bold[^"]*">([^<]+)</span>\s*following"#).unwrap();
}

/// Get every built-in platform probe, in catalog order.
pub fn get_platforms() -> Vec<Probe> {
    vec![
        Probe::new("Instagram", "https://www.instagram.com/{}", instagram),
        Probe::new("Twitter/X", "https://twitter.com/{}", twitter),
        Probe::new("Facebook", "https://www.facebook.com/{}", facebook),
        Probe::new("LinkedIn", "https://www.linkedin.com/in/{}", linkedin),
        Probe::new("TikTok", "https://www.tiktok.com/@{}", tiktok),
        Probe::new("GitHub", "https://github.com/{}", github).with_extractor(extract_github_info),
        Probe::new("GitLab", "https://gitlab.com/{}", exists_unless_404),
        Probe::new("Reddit", "https://www.reddit.com/user/{}", reddit),
        Probe::new("Pinterest", "https://www.pinterest.com/{}/", exists_unless_404),
        Probe::new("Steam", "https://steamcommunity.com/id/{}", steam),
        Probe::new("Twitch", "https://www.twitch.tv/{}", twitch),
        Probe::new("DeviantArt", "https://www.deviantart.com/{}", exists_unless_404),
        Probe::new("Behance", "https://www.behance.net/{}", exists_unless_404),
        Probe::new("Medium", "https://medium.com/@{}", medium),
        Probe::new("Tumblr", "https://{}.tumblr.com", exists_unless_404),
        Probe::new("SoundCloud", "https://soundcloud.com/{}", exists_unless_404),
        Probe::new("Spotify", "https://open.spotify.com/user/{}", exists_unless_404),
        Probe::new("Telegram", "https://t.me/{}", telegram),
        Probe::new("VK", "https://vk.com/{}", vk),
        Probe::new("Patreon", "https://www.patreon.com/{}", exists_unless_404),
        Probe::new("BitBucket", "https://bitbucket.org/{}/", exists_unless_404),
        Probe::new("WordPress", "https://{}.wordpress.com", exists_unless_404),
    ]
}

/// Names of every built-in platform, in catalog order.
pub fn platform_names() -> Vec<String> {
    get_platforms()
        .iter()
        .map(|probe| probe.name().to_string())
        .collect()
}

/// Find a platform by name, ignoring case.
pub fn find_platform(name: &str) -> Option<Probe> {
    let wanted = name.trim();
    get_platforms()
        .into_iter()
        .find(|probe| probe.name().eq_ignore_ascii_case(wanted))
}

/// Resolve a list of platform names into probes.
///
/// An empty list selects the whole catalog. Duplicates are dropped and the
/// first unknown name is reported as [`ProbeError::UnknownPlatform`].
pub fn select_platforms(names: &[String]) -> Result<Vec<Probe>, ProbeError> {
    if names.is_empty() {
        return Ok(get_platforms());
    }

    let mut selected: Vec<Probe> = Vec::new();
    for name in names {
        let probe = find_platform(name).ok_or_else(|| ProbeError::unknown_platform(name.trim()))?;
        if !selected.iter().any(|p| p.name() == probe.name()) {
            selected.push(probe);
        }
    }

    Ok(selected)
}

fn instagram(response: &ProbeResponse) -> Result<bool, ProbeError> {
    if response.is_not_found() {
        return Ok(false);
    }
    let body = response.text()?;
    Ok(!contains_any(
        body,
        &[
            "Esta página não está disponível",
            "page isn't available",
            "Sorry, this page",
        ],
    ) && body.contains("\"@type\":\"ProfilePage\""))
}

fn twitter(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(
        response,
        &["This account doesn't exist", "Esta conta não existe"],
    )
}

fn facebook(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(response, &["Página não encontrada", "Page not found"])
}

fn linkedin(response: &ProbeResponse) -> Result<bool, ProbeError> {
    // 999 is LinkedIn's bot wall, treated like a missing profile.
    if response.status == 404 || response.status == 999 {
        return Ok(false);
    }
    exists_unless_marked(response, &["Page not found", "this page doesn't exist"])
}

fn tiktok(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(
        response,
        &[
            "Não foi possível localizar esta conta",
            "Couldn't find this account",
        ],
    )
}

fn github(response: &ProbeResponse) -> Result<bool, ProbeError> {
    if response.is_not_found() {
        return Ok(false);
    }
    exists_unless_marked(response, &["Not Found", "404"])
}

fn reddit(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(response, &["Sorry, nobody on Reddit goes by that name"])
}

fn steam(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(response, &["The specified profile could not be found"])
}

fn twitch(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(
        response,
        &["esse conteúdo está indisponível", "content is unavailable"],
    )
}

fn medium(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(response, &["PAGE NOT FOUND", "404"])
}

fn telegram(response: &ProbeResponse) -> Result<bool, ProbeError> {
    let body = response.text()?;
    Ok(!body.contains("If you have Telegram, you can view and join") && !response.is_not_found())
}

fn vk(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(response, &["Page not found", "404"])
}

/// Extract name, location, bio, website and follower counts from a GitHub
/// profile page.
pub fn extract_github_info(response: &ProbeResponse) -> Result<ProfileInfo, ProbeError> {
    let body = response
        .text()
        .map_err(|e| ProbeError::extraction("GitHub", e.to_string()))?;

    Ok(ProfileInfo {
        name: capture(&GITHUB_NAME, body),
        location: capture(&GITHUB_LOCATION, body),
        bio: capture(&GITHUB_BIO, body),
        website: capture(&GITHUB_WEBSITE, body),
        followers: capture(&GITHUB_FOLLOWERS, body),
        following: capture(&GITHUB_FOLLOWING, body),
        ..Default::default()
    })
}

fn capture(pattern: &Regex, body: &str) -> Option<String> {
    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
