//! Platform registry: the ordered table of platforms a check probes.
//!
//! The built-in table is constructed once on first use and never mutated.
//! A [`PlatformRegistry`] wraps a validated, ordered list of specs behind an
//! `Arc` so every concurrent probe can read it without synchronization.

use crate::error::HandleCheckError;
use crate::types::{PlatformSpec, USERNAME_PLACEHOLDER};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use std::collections::HashSet;
use std::sync::Arc;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

lazy_static::lazy_static! {
    static ref BUILTIN_PLATFORMS: Vec<PlatformSpec> = builtin_platforms();
}

/// Build the built-in platform table.
///
/// Order matters: it is the order results are reported in.
fn builtin_platforms() -> Vec<PlatformSpec> {
    vec![
        PlatformSpec::new("GitHub", "https://github.com/{username}"),
        PlatformSpec::new("Reddit", "https://www.reddit.com/user/{username}")
            .with_check_url("https://www.reddit.com/user/{username}/about.json")
            .with_header(
                "User-Agent",
                "Mozilla/5.0 (compatible; HandleScout/1.0; +https://example.com)",
            ),
        // TikTok and X render profiles client-side and answer 200 for
        // almost everything, so only markers can tell.
        PlatformSpec::new("TikTok", "https://www.tiktok.com/@{username}")
            .with_unknown_markers(&[
                "verify you are human",
                "captcha",
                "unusual traffic",
                "something went wrong",
            ])
            .with_available_markers(&[
                "couldn't find this account",
                "couldn't find this user",
                "user not found",
            ])
            .with_taken_markers(&["\"uniqueId\":\"{username}\""])
            .ambiguous_on_200()
            .with_header("User-Agent", BROWSER_USER_AGENT)
            .with_header("Accept-Language", "en-US,en;q=0.9"),
        PlatformSpec::new("X", "https://x.com/{username}")
            .with_unknown_markers(&[
                "something went wrong",
                "unusual activity",
                "retry",
                "access denied",
            ])
            .with_available_markers(&["this account doesn't exist", "account doesn't exist"])
            .ambiguous_on_200()
            .with_header("User-Agent", BROWSER_USER_AGENT)
            .with_header("Accept-Language", "en-US,en;q=0.9"),
        PlatformSpec::new("GitLab", "https://gitlab.com/{username}"),
        PlatformSpec::new("Bitbucket", "https://bitbucket.org/{username}"),
        PlatformSpec::new("Dev.to", "https://dev.to/{username}"),
        PlatformSpec::new("CodePen", "https://codepen.io/{username}"),
        PlatformSpec::new("Dribbble", "https://dribbble.com/{username}"),
        PlatformSpec::new("Behance", "https://www.behance.net/{username}"),
    ]
}

/// Get the built-in platform definitions, in report order.
pub fn get_builtin_platforms() -> &'static [PlatformSpec] {
    &BUILTIN_PLATFORMS
}

/// Get the names of the built-in platforms, in report order.
pub fn get_builtin_platform_names() -> Vec<&'static str> {
    BUILTIN_PLATFORMS.iter().map(|p| p.name.as_str()).collect()
}

/// Validated, ordered, read-only collection of platform specs.
///
/// Cloning is cheap: clones share the same underlying table.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    platforms: Arc<[PlatformSpec]>,
}

impl PlatformRegistry {
    /// Registry of the built-in platforms.
    pub fn builtin() -> Self {
        Self {
            platforms: Arc::from(get_builtin_platforms().to_vec()),
        }
    }

    /// Build a registry from arbitrary specs.
    ///
    /// Every spec is validated up front so nothing about the table itself
    /// can fail during a check. No I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns `HandleCheckError::InvalidPlatform` for empty or duplicate
    /// names, templates without a `{username}` placeholder, unknown HTTP
    /// methods, malformed headers, or a status code in more than one bucket.
    pub fn new(platforms: Vec<PlatformSpec>) -> Result<Self, HandleCheckError> {
        let mut seen = HashSet::new();
        for spec in &platforms {
            validate_platform(spec)?;
            if !seen.insert(spec.name.to_lowercase()) {
                return Err(HandleCheckError::invalid_platform(
                    &spec.name,
                    "duplicate platform name",
                ));
            }
        }

        Ok(Self {
            platforms: Arc::from(platforms),
        })
    }

    /// Number of platforms.
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Platforms in report order.
    pub fn platforms(&self) -> &[PlatformSpec] {
        &self.platforms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlatformSpec> {
        self.platforms.iter()
    }

    /// Look up a platform by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&PlatformSpec> {
        self.platforms
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Platform names in report order.
    pub fn names(&self) -> Vec<&str> {
        self.platforms.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a PlatformRegistry {
    type Item = &'a PlatformSpec;
    type IntoIter = std::slice::Iter<'a, PlatformSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.platforms.iter()
    }
}

/// Check a single spec for problems that would otherwise surface mid-check.
pub(crate) fn validate_platform(spec: &PlatformSpec) -> Result<(), HandleCheckError> {
    let invalid = |reason: String| HandleCheckError::invalid_platform(&spec.name, reason);

    if spec.name.trim().is_empty() {
        return Err(invalid("platform name cannot be empty".to_string()));
    }

    if !spec.profile_url_template.contains(USERNAME_PLACEHOLDER) {
        return Err(invalid(format!(
            "profile URL template must contain {}",
            USERNAME_PLACEHOLDER
        )));
    }

    if let Some(check_url) = &spec.check_url_template {
        if !check_url.contains(USERNAME_PLACEHOLDER) {
            return Err(invalid(format!(
                "check URL template must contain {}",
                USERNAME_PLACEHOLDER
            )));
        }
    }

    Method::from_bytes(spec.method.to_uppercase().as_bytes())
        .map_err(|_| invalid(format!("unsupported HTTP method '{}'", spec.method)))?;

    for (name, value) in &spec.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| invalid(format!("invalid header name '{}'", name)))?;
        HeaderValue::from_str(value)
            .map_err(|_| invalid(format!("invalid value for header '{}'", name)))?;
    }

    for code in &spec.available_statuses {
        if spec.taken_statuses.contains(code) || spec.unknown_statuses.contains(code) {
            return Err(invalid(format!("status {} is in more than one bucket", code)));
        }
    }
    for code in &spec.taken_statuses {
        if spec.unknown_statuses.contains(code) {
            return Err(invalid(format!("status {} is in more than one bucket", code)));
        }
    }

    Ok(())
}
