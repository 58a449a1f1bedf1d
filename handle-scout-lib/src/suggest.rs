//! Alternate handle suggestions.
//!
//! When a handle is not free everywhere, the checker proposes variants built
//! from fixed suffix, separator, number and prefix lists. Every candidate
//! passes the same validation as a username; duplicates are dropped and the
//! list is capped after generation so earlier variants win.
//!
//! # Examples
//!
//! ```
//! use handle_scout_lib::suggest::build_candidates;
//! use handle_scout_lib::SuggestionConfig;
//!
//! let candidates = build_candidates("cloud", &SuggestionConfig::default());
//! assert_eq!(&candidates[..3], &["cloudhq", "cloud_hq", "cloud.hq"]);
//! assert!(!candidates.contains(&"cloud-hq".to_string())); // '-' is not a username character
//! ```

use crate::types::{ProbeResult, SuggestionConfig, SuggestionPolicy};
use crate::utils::is_valid_username;
use std::collections::HashSet;

/// Ordered, deduplicated list of valid candidates.
struct CandidateList<'a> {
    username: &'a str,
    seen: HashSet<String>,
    items: Vec<String>,
}

impl<'a> CandidateList<'a> {
    fn new(username: &'a str) -> Self {
        Self {
            username,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    /// Keep `candidate` if it is a valid, new, different handle.
    fn push(&mut self, candidate: String) {
        if candidate == self.username || !is_valid_username(&candidate) {
            return;
        }
        if self.seen.insert(candidate.clone()) {
            self.items.push(candidate);
        }
    }

    /// `{username}{tail}` followed by `{username}{sep}{tail}` for each separator.
    fn push_with_separators(&mut self, tail: &str, separators: &[String]) {
        self.push(format!("{}{}", self.username, tail));
        for sep in separators {
            self.push(format!("{}{}{}", self.username, sep, tail));
        }
    }
}

/// Decide whether results warrant suggestions under `policy`.
///
/// Never true when every result is `available`.
pub fn needs_suggestions(results: &[ProbeResult], policy: &SuggestionPolicy) -> bool {
    match policy {
        SuggestionPolicy::AnyUnavailable => results.iter().any(|r| !r.is_available()),
        SuggestionPolicy::KeyPlatforms(keys) => results.iter().any(|r| {
            !r.is_available() && keys.iter().any(|k| k.eq_ignore_ascii_case(&r.platform))
        }),
    }
}

/// Build the capped candidate list for `username`, regardless of results.
///
/// Order: each suffix (bare, then with each separator), each number (bare,
/// then with each separator), then each prefix.
pub fn build_candidates(username: &str, config: &SuggestionConfig) -> Vec<String> {
    let mut list = CandidateList::new(username);

    for suffix in &config.suffixes {
        list.push_with_separators(suffix, &config.separators);
    }

    for number in &config.numbers {
        list.push_with_separators(number, &config.separators);
    }

    for prefix in &config.prefixes {
        list.push(format!("{}{}", prefix, username));
    }

    let mut candidates = list.items;
    candidates.truncate(config.cap);
    candidates
}

/// Suggestions for `username` given the results of a check.
///
/// Empty when suggestions are disabled or the policy is not triggered.
pub fn generate_suggestions(
    username: &str,
    results: &[ProbeResult],
    config: &SuggestionConfig,
) -> Vec<String> {
    if !config.enabled || !needs_suggestions(results, &config.policy) {
        return Vec::new();
    }
    build_candidates(username, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProbeStatus;

    fn result(platform: &str, status: ProbeStatus) -> ProbeResult {
        ProbeResult {
            platform: platform.to_string(),
            url: None,
            status,
            http_status: None,
            reason: String::new(),
            elapsed_ms: None,
        }
    }

    // ── Trigger policy ──────────────────────────────────────────────

    #[test]
    fn test_all_available_means_no_suggestions() {
        let results = vec![
            result("GitHub", ProbeStatus::Available),
            result("GitLab", ProbeStatus::Available),
        ];
        let config = SuggestionConfig::default();
        assert!(generate_suggestions("alice", &results, &config).is_empty());

        let key = config.with_policy(SuggestionPolicy::KeyPlatforms(vec!["GitHub".into()]));
        assert!(generate_suggestions("alice", &results, &key).is_empty());
    }

    #[test]
    fn test_any_unavailable_policy() {
        let policy = SuggestionPolicy::AnyUnavailable;
        assert!(needs_suggestions(
            &[
                result("GitHub", ProbeStatus::Available),
                result("X", ProbeStatus::Error)
            ],
            &policy
        ));
        assert!(!needs_suggestions(&[], &policy));
    }

    #[test]
    fn test_key_platform_policy() {
        let policy = SuggestionPolicy::KeyPlatforms(vec!["github".to_string()]);
        let results = vec![
            result("GitHub", ProbeStatus::Available),
            result("X", ProbeStatus::Taken),
        ];
        assert!(!needs_suggestions(&results, &policy));

        let results = vec![
            result("GitHub", ProbeStatus::Unknown),
            result("X", ProbeStatus::Available),
        ];
        assert!(needs_suggestions(&results, &policy));
    }

    #[test]
    fn test_disabled() {
        let results = vec![result("GitHub", ProbeStatus::Taken)];
        let config = SuggestionConfig::default().with_enabled(false);
        assert!(generate_suggestions("alice", &results, &config).is_empty());
    }

    // ── Candidates ──────────────────────────────────────────────────

    #[test]
    fn test_default_candidate_order() {
        let candidates = build_candidates("alice", &SuggestionConfig::default());
        assert_eq!(candidates.len(), 18);
        assert_eq!(
            &candidates[..7],
            &[
                "alicehq",
                "alice_hq",
                "alice.hq",
                "alicedev",
                "alice_dev",
                "alice.dev",
                "aliceapp"
            ]
        );
        assert_eq!(candidates.last().unwrap(), "alice.real");
    }

    #[test]
    fn test_numbers_and_prefixes_when_cap_allows() {
        let config = SuggestionConfig::default().with_cap(100);
        let candidates = build_candidates("alice", &config);
        // 6 suffixes x 3 valid forms + 4 numbers x 3 valid forms + 2 prefixes
        assert_eq!(candidates.len(), 32);
        assert!(candidates.contains(&"alice01".to_string()));
        assert!(candidates.contains(&"alice_3".to_string()));
        assert_eq!(&candidates[30..], &["itsalice", "thealice"]);
    }

    #[test]
    fn test_candidates_are_valid_unique_and_capped() {
        let usernames = vec![
            "ab".to_string(),
            "alice".to_string(),
            "john.doe".to_string(),
            "x".repeat(27),
            "y".repeat(30),
        ];
        for username in &usernames {
            for cap in [0, 5, 12, 18] {
                let config = SuggestionConfig::default().with_cap(cap);
                let candidates = build_candidates(username, &config);
                assert!(candidates.len() <= cap);
                let unique: HashSet<_> = candidates.iter().collect();
                assert_eq!(unique.len(), candidates.len());
                assert!(candidates.iter().all(|c| is_valid_username(c)));
            }
        }
    }

    #[test]
    fn test_long_username_drops_overlong_candidates() {
        let username = "y".repeat(30);
        assert!(build_candidates(&username, &SuggestionConfig::default()).is_empty());

        let username = "z".repeat(27);
        let candidates = build_candidates(&username, &SuggestionConfig::default().with_cap(100));
        assert!(candidates.contains(&format!("{}hq", username)));
        assert!(candidates.contains(&format!("{}_hq", username)));
        assert!(!candidates.contains(&format!("{}_dev", username)));
    }

    #[test]
    fn test_duplicates_from_config_are_dropped() {
        let config = SuggestionConfig {
            suffixes: vec!["dev".to_string(), "dev".to_string()],
            separators: vec!["_".to_string(), "_".to_string()],
            numbers: Vec::new(),
            prefixes: Vec::new(),
            ..SuggestionConfig::default()
        };
        assert_eq!(build_candidates("alice", &config), vec!["alicedev", "alice_dev"]);
    }

    #[test]
    fn test_truncation_happens_after_generation() {
        // Invalid early candidates must not eat into the cap
        let config = SuggestionConfig {
            separators: vec!["-".to_string(), "_".to_string()],
            ..SuggestionConfig::default().with_cap(2)
        };
        assert_eq!(build_candidates("alice", &config), vec!["alicehq", "alice_hq"]);
    }
}
