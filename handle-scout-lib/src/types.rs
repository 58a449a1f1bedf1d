//! Core data types for handle availability checking.
//!
//! This module defines the main data structures used throughout the library:
//! platform probe definitions, per-platform results, check batches and the
//! configuration that drives a checker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Placeholder substituted with the username in URL templates and markers.
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Definition of how to probe a single platform.
///
/// Specs are immutable once a registry is built and are shared read-only
/// between all concurrent probes of a check. Everything that depends on the
/// username (URLs, taken markers) is formatted per check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformSpec {
    /// Display name, unique within a registry (e.g., "GitHub")
    pub name: String,

    /// Public profile URL shown to the user, with a `{username}` placeholder
    pub profile_url_template: String,

    /// URL actually requested, if different from the profile page
    /// (e.g., a JSON API endpoint). Defaults to the profile template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_url_template: Option<String>,

    /// HTTP method used for the probe
    #[serde(default = "default_method")]
    pub method: String,

    /// Status codes meaning "no such account"
    #[serde(default = "default_available_statuses")]
    pub available_statuses: Vec<u16>,

    /// Status codes meaning "account exists", subject to marker checks
    #[serde(default = "default_taken_statuses")]
    pub taken_statuses: Vec<u16>,

    /// Status codes meaning the platform refused to answer (blocked, rate-limited)
    #[serde(default = "default_unknown_statuses")]
    pub unknown_statuses: Vec<u16>,

    /// Body substrings proving the account does not exist
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_markers: Vec<String>,

    /// Body substrings showing a captcha, block page or error shell
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_markers: Vec<String>,

    /// Body substrings proving the account exists; may contain `{username}`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taken_markers: Vec<String>,

    /// Report `unknown` instead of `taken` when a taken status has no matching marker
    #[serde(default)]
    pub ambiguous_on_200: bool,

    /// Extra request headers, merged over the checker's defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Never probe this platform; always report `unknown`
    #[serde(default)]
    pub skip_check: bool,

    /// Reason reported for skipped platforms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_available_statuses() -> Vec<u16> {
    vec![404]
}

fn default_taken_statuses() -> Vec<u16> {
    vec![200]
}

fn default_unknown_statuses() -> Vec<u16> {
    vec![429, 403, 401]
}

impl PlatformSpec {
    /// Create a spec probing `profile_url_template` with GET and the usual
    /// 404 / 200 / 429-403-401 status buckets.
    pub fn new<N: Into<String>, U: Into<String>>(name: N, profile_url_template: U) -> Self {
        Self {
            name: name.into(),
            profile_url_template: profile_url_template.into(),
            check_url_template: None,
            method: default_method(),
            available_statuses: default_available_statuses(),
            taken_statuses: default_taken_statuses(),
            unknown_statuses: default_unknown_statuses(),
            available_markers: Vec::new(),
            unknown_markers: Vec::new(),
            taken_markers: Vec::new(),
            ambiguous_on_200: false,
            headers: BTreeMap::new(),
            skip_check: false,
            reason: None,
        }
    }

    /// Probe a different URL than the one shown to the user.
    pub fn with_check_url<U: Into<String>>(mut self, template: U) -> Self {
        self.check_url_template = Some(template.into());
        self
    }

    /// Use a different HTTP method.
    pub fn with_method<M: Into<String>>(mut self, method: M) -> Self {
        self.method = method.into();
        self
    }

    /// Replace all three status buckets.
    pub fn with_statuses(mut self, available: &[u16], taken: &[u16], unknown: &[u16]) -> Self {
        self.available_statuses = available.to_vec();
        self.taken_statuses = taken.to_vec();
        self.unknown_statuses = unknown.to_vec();
        self
    }

    pub fn with_available_markers(mut self, markers: &[&str]) -> Self {
        self.available_markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_unknown_markers(mut self, markers: &[&str]) -> Self {
        self.unknown_markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_taken_markers(mut self, markers: &[&str]) -> Self {
        self.taken_markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Downgrade unmarked taken responses to `unknown`.
    pub fn ambiguous_on_200(mut self) -> Self {
        self.ambiguous_on_200 = true;
        self
    }

    /// Add or replace a request header for this platform.
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Mark the platform as not checkable.
    pub fn skipped<R: Into<String>>(mut self, reason: R) -> Self {
        self.skip_check = true;
        self.reason = Some(reason.into());
        self
    }

    /// The template actually requested.
    pub fn check_template(&self) -> &str {
        self.check_url_template
            .as_deref()
            .unwrap_or(&self.profile_url_template)
    }

    /// Reason reported when the platform is skipped.
    pub fn skip_reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("Not checkable")
    }
}

/// Verdict for one platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// The handle appears to be free
    Available,

    /// The handle appears to be registered
    Taken,

    /// The platform answered but the answer was inconclusive, or the
    /// platform was skipped
    Unknown,

    /// The request never produced a usable response
    Error,
}

/// Result of probing one platform.
///
/// Exactly one result is produced per registry entry per check, whatever
/// happened to the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResult {
    /// Name of the platform this result belongs to
    pub platform: String,

    /// Profile URL shown to the user; `None` for skipped platforms
    pub url: Option<String>,

    /// The verdict
    pub status: ProbeStatus,

    /// Observed HTTP status code; `None` if the request never completed or
    /// was skipped
    pub http_status: Option<u16>,

    /// Short human-readable explanation of the verdict
    pub reason: String,

    /// How long the probe took, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl ProbeResult {
    /// Result for a platform that is never probed.
    pub fn skipped(spec: &PlatformSpec) -> Self {
        Self {
            platform: spec.name.clone(),
            url: None,
            status: ProbeStatus::Unknown,
            http_status: None,
            reason: spec.skip_reason().to_string(),
            elapsed_ms: None,
        }
    }

    /// Result for a request that failed before a usable response arrived.
    pub fn failed<P: Into<String>, R: Into<String>>(
        platform: P,
        url: Option<String>,
        http_status: Option<u16>,
        reason: R,
    ) -> Self {
        Self {
            platform: platform.into(),
            url,
            status: ProbeStatus::Error,
            http_status,
            reason: reason.into(),
            elapsed_ms: None,
        }
    }

    /// Whether the platform reported the handle as free.
    pub fn is_available(&self) -> bool {
        self.status == ProbeStatus::Available
    }
}

/// All results of one username check, plus derived suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckBatch {
    /// The username that was checked
    pub username: String,

    /// When the check finished
    #[serde(rename = "timestamp")]
    pub checked_at: DateTime<Utc>,

    /// One result per platform, in registry order
    pub results: Vec<ProbeResult>,

    /// Alternate handles worth checking
    pub suggestions: Vec<String>,
}

impl CheckBatch {
    /// Number of results with the given verdict.
    pub fn count(&self, status: ProbeStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Whether every platform reported the handle as free.
    pub fn all_available(&self) -> bool {
        self.results.iter().all(ProbeResult::is_available)
    }
}

/// When alternate handles should be suggested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionPolicy {
    /// Suggest when any platform is not `available`.
    AnyUnavailable,

    /// Suggest only when one of the named platforms is not `available`.
    KeyPlatforms(Vec<String>),
}

/// Settings for the suggestion generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionConfig {
    /// Whether suggestions are produced at all
    pub enabled: bool,

    /// Maximum number of suggestions returned
    pub cap: usize,

    /// When to produce suggestions
    pub policy: SuggestionPolicy,

    /// Words appended to the username, in priority order
    pub suffixes: Vec<String>,

    /// Separators placed between the username and a suffix or number
    pub separators: Vec<String>,

    /// Numbers appended to the username, in priority order
    pub numbers: Vec<String>,

    /// Words prepended to the username
    pub prefixes: Vec<String>,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            enabled: true,
            cap: 18,
            policy: SuggestionPolicy::AnyUnavailable,
            suffixes: owned(&["hq", "dev", "app", "io", "official", "real"]),
            separators: owned(&["_", ".", "-"]),
            numbers: owned(&["01", "1", "2", "3"]),
            prefixes: owned(&["its", "the"]),
        }
    }
}

impl SuggestionConfig {
    /// Set the maximum number of suggestions.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Set the trigger policy.
    pub fn with_policy(mut self, policy: SuggestionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable suggestions.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Configuration options for a [`crate::HandleChecker`].
///
/// This struct allows fine-tuning of timeouts, concurrency, request headers
/// and the suggestion step.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Timeout for each individual platform request
    /// Default: 6 seconds
    pub timeout: Duration,

    /// Maximum number of probes in flight at once
    /// Default: 32 (above the built-in registry size, so all probes start together)
    pub concurrency: usize,

    /// Maximum number of redirects followed per request
    /// Default: 10
    pub max_redirects: usize,

    /// Headers sent with every request unless a platform overrides them
    pub default_headers: BTreeMap<String, String>,

    /// Suggestion generator settings
    pub suggestions: SuggestionConfig,
}

impl Default for CheckConfig {
    /// Create a sensible default configuration.
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("User-Agent".to_string(), "HandleScout/1.0".to_string());
        default_headers.insert(
            "Accept-Language".to_string(),
            "en-US,en;q=0.9".to_string(),
        );

        Self {
            timeout: Duration::from_secs(6),
            concurrency: 32,
            max_redirects: 10,
            default_headers,
            suggestions: SuggestionConfig::default(),
        }
    }
}

impl CheckConfig {
    /// Set custom concurrency.
    ///
    /// Automatically caps concurrency at 100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set custom per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the default User-Agent header.
    pub fn with_user_agent<U: Into<String>>(mut self, user_agent: U) -> Self {
        self.default_headers
            .insert("User-Agent".to_string(), user_agent.into());
        self
    }

    /// Replace the suggestion settings.
    pub fn with_suggestions(mut self, suggestions: SuggestionConfig) -> Self {
        self.suggestions = suggestions;
        self
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Available => write!(f, "available"),
            ProbeStatus::Taken => write!(f, "taken"),
            ProbeStatus::Unknown => write!(f, "unknown"),
            ProbeStatus::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for SuggestionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionPolicy::AnyUnavailable => write!(f, "any"),
            SuggestionPolicy::KeyPlatforms(names) => write!(f, "key ({})", names.join(", ")),
        }
    }
}
