//! Probe executor: one HTTP request and one verdict per platform.
//!
//! A probe never returns an error. Every failure path (skipped platform,
//! network failure, timeout, unreadable body, unexpected status) ends in a
//! [`ProbeResult`].

use crate::error::HandleCheckError;
use crate::types::{CheckConfig, PlatformSpec, ProbeResult, ProbeStatus};
use crate::utils::fill_template;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// HTTP prober shared by every probe of a checker.
///
/// Holds the connection pool and the default headers; per-platform data is
/// passed in on each call.
#[derive(Clone)]
pub struct Prober {
    /// HTTP client (connection pooling, redirect following)
    http_client: reqwest::Client,
    /// Per-request timeout
    timeout: Duration,
    /// Headers sent unless a platform overrides them
    default_headers: HeaderMap,
}

/// A response that made it back from the platform.
struct FetchedResponse {
    status: u16,
    /// Only read when the status needs marker disambiguation
    body: String,
}

/// Why a request produced no usable response.
struct FetchFailure {
    http_status: Option<u16>,
    reason: &'static str,
}

impl Prober {
    /// Create a prober from a checker configuration.
    ///
    /// # Errors
    ///
    /// Returns `HandleCheckError::ConfigError` for malformed default headers
    /// and `HandleCheckError::NetworkError` if the HTTP client cannot be built.
    pub fn new(config: &CheckConfig) -> Result<Self, HandleCheckError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                HandleCheckError::config(format!("Invalid default header name '{}'", name))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                HandleCheckError::config(format!("Invalid value for default header '{}'", name))
            })?;
            default_headers.insert(header_name, header_value);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout.saturating_add(Duration::from_secs(1))) // Buffer over the probe timeout
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            http_client,
            timeout: config.timeout,
            default_headers,
        })
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe one platform for `username`.
    ///
    /// The username is expected to be valid already; it is substituted into
    /// the URL templates as-is.
    pub async fn probe(&self, spec: &PlatformSpec, username: &str) -> ProbeResult {
        if spec.skip_check {
            debug!(platform = %spec.name, "platform skipped: {}", spec.skip_reason());
            return ProbeResult::skipped(spec);
        }

        let profile_url = fill_template(&spec.profile_url_template, username);
        let check_url = fill_template(spec.check_template(), username);
        let start_time = Instant::now();

        debug!(platform = %spec.name, method = %spec.method, url = %check_url, "probing");

        let outcome = tokio::time::timeout(self.timeout, self.fetch(spec, &check_url)).await;

        let mut result = match outcome {
            Ok(Ok(response)) => {
                let (status, reason) =
                    classify_response(spec, username, response.status, &response.body);
                debug!(
                    platform = %spec.name,
                    http_status = response.status,
                    verdict = %status,
                    "classified"
                );
                ProbeResult {
                    platform: spec.name.clone(),
                    url: Some(profile_url),
                    status,
                    http_status: Some(response.status),
                    reason,
                    elapsed_ms: None,
                }
            }
            Ok(Err(failure)) => {
                warn!(platform = %spec.name, reason = failure.reason, "probe failed");
                ProbeResult::failed(
                    &spec.name,
                    Some(profile_url),
                    failure.http_status,
                    failure.reason,
                )
            }
            Err(_) => {
                warn!(platform = %spec.name, timeout = ?self.timeout, "probe timed out");
                ProbeResult::failed(&spec.name, Some(profile_url), None, "timeout")
            }
        };

        result.elapsed_ms = Some(start_time.elapsed().as_millis() as u64);
        result
    }

    /// Send the request and read the body if classification will need it.
    async fn fetch(
        &self,
        spec: &PlatformSpec,
        check_url: &str,
    ) -> Result<FetchedResponse, FetchFailure> {
        let method = Method::from_bytes(spec.method.to_uppercase().as_bytes()).map_err(|_| {
            FetchFailure {
                http_status: None,
                reason: "invalid request",
            }
        })?;

        let response = self
            .http_client
            .request(method, check_url)
            .headers(self.merged_headers(spec))
            .send()
            .await
            .map_err(|e| FetchFailure {
                http_status: None,
                reason: describe_request_error(&e),
            })?;

        let status = response.status().as_u16();

        let body = if spec.taken_statuses.contains(&status) {
            response.text().await.map_err(|e| FetchFailure {
                http_status: Some(status),
                reason: if e.is_timeout() {
                    "timeout"
                } else {
                    "malformed response body"
                },
            })?
        } else {
            String::new()
        };

        Ok(FetchedResponse { status, body })
    }

    /// Default headers with the platform's own headers layered on top.
    fn merged_headers(&self, spec: &PlatformSpec) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        for (name, value) in &spec.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        headers
    }
}

/// Classify a completed response.
///
/// Status buckets are checked in order: available, taken, unknown. Inside
/// the taken bucket the body decides, with markers tried in priority order:
/// unknown, available, taken. `body` is matched case-insensitively.
pub fn classify_response(
    spec: &PlatformSpec,
    username: &str,
    status_code: u16,
    body: &str,
) -> (ProbeStatus, String) {
    if spec.available_statuses.contains(&status_code) {
        return (
            ProbeStatus::Available,
            format!("Profile returns {} => likely available", status_code),
        );
    }

    if spec.taken_statuses.contains(&status_code) {
        let text = body.to_lowercase();
        let found = |marker: &str| text.contains(&marker.to_lowercase());

        if spec.unknown_markers.iter().any(|m| found(m)) {
            return (
                ProbeStatus::Unknown,
                "Page requires verification or is blocked".to_string(),
            );
        }

        if spec.available_markers.iter().any(|m| found(m)) {
            return (
                ProbeStatus::Available,
                "Page indicates account does not exist".to_string(),
            );
        }

        if spec
            .taken_markers
            .iter()
            .any(|m| found(&fill_template(m, username)))
        {
            return (
                ProbeStatus::Taken,
                "Page includes username marker".to_string(),
            );
        }

        if spec.ambiguous_on_200 {
            return (
                ProbeStatus::Unknown,
                format!("{} but no definitive marker found", status_code),
            );
        }

        return (
            ProbeStatus::Taken,
            format!("Profile returns {} => likely taken", status_code),
        );
    }

    if spec.unknown_statuses.contains(&status_code) {
        return (
            ProbeStatus::Unknown,
            format!("Status {} => blocked or rate-limited", status_code),
        );
    }

    (ProbeStatus::Unknown, format!("Unexpected {}", status_code))
}

/// Name the failure class of a request error.
fn describe_request_error(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_redirect() {
        "too many redirects"
    } else if err.is_builder() {
        "invalid request"
    } else if err.is_body() || err.is_decode() {
        "malformed response body"
    } else {
        "request failed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> PlatformSpec {
        PlatformSpec::new("GitHub", "https://github.com/{username}")
    }

    fn tiktok() -> PlatformSpec {
        PlatformSpec::new("TikTok", "https://www.tiktok.com/@{username}")
            .with_unknown_markers(&["captcha"])
            .with_available_markers(&["couldn't find this account"])
            .with_taken_markers(&["\"uniqueId\":\"{username}\""])
            .ambiguous_on_200()
    }

    #[test]
    fn test_available_status() {
        let (status, reason) = classify_response(&plain(), "alice", 404, "");
        assert_eq!(status, ProbeStatus::Available);
        assert_eq!(reason, "Profile returns 404 => likely available");
    }

    #[test]
    fn test_taken_status_without_markers_defaults_to_taken() {
        let (status, reason) = classify_response(&plain(), "alice", 200, "<html>hi</html>");
        assert_eq!(status, ProbeStatus::Taken);
        assert_eq!(reason, "Profile returns 200 => likely taken");
    }

    #[test]
    fn test_unknown_marker_wins_over_other_markers() {
        let body = "Please solve the CAPTCHA. couldn't find this account \"uniqueId\":\"alice\"";
        let (status, reason) = classify_response(&tiktok(), "alice", 200, body);
        assert_eq!(status, ProbeStatus::Unknown);
        assert_eq!(reason, "Page requires verification or is blocked");
    }

    #[test]
    fn test_available_marker_wins_over_taken_marker() {
        let body = "Couldn't find this account. \"uniqueId\":\"alice\"";
        let (status, reason) = classify_response(&tiktok(), "alice", 200, body);
        assert_eq!(status, ProbeStatus::Available);
        assert_eq!(reason, "Page indicates account does not exist");
    }

    #[test]
    fn test_taken_marker_is_formatted_per_username() {
        let body = "{\"uniqueId\":\"Alice\",\"nickname\":\"A\"}";
        let (status, reason) = classify_response(&tiktok(), "alice", 200, body);
        assert_eq!(status, ProbeStatus::Taken);
        assert_eq!(reason, "Page includes username marker");

        // Someone else's profile does not count
        let (status, _) = classify_response(&tiktok(), "bob", 200, body);
        assert_eq!(status, ProbeStatus::Unknown);
    }

    #[test]
    fn test_ambiguous_without_marker() {
        let (status, reason) = classify_response(&tiktok(), "alice", 200, "<div id=app></div>");
        assert_eq!(status, ProbeStatus::Unknown);
        assert_eq!(reason, "200 but no definitive marker found");
    }

    #[test]
    fn test_markers_ignored_outside_taken_bucket() {
        let (status, _) = classify_response(&tiktok(), "alice", 404, "captcha");
        assert_eq!(status, ProbeStatus::Available);
    }

    #[test]
    fn test_unknown_status() {
        let (status, reason) = classify_response(&plain(), "alice", 429, "");
        assert_eq!(status, ProbeStatus::Unknown);
        assert_eq!(reason, "Status 429 => blocked or rate-limited");
    }

    #[test]
    fn test_unexpected_status() {
        let (status, reason) = classify_response(&plain(), "alice", 500, "");
        assert_eq!(status, ProbeStatus::Unknown);
        assert_eq!(reason, "Unexpected 500");
    }

    #[test]
    fn test_marker_matching_is_case_insensitive() {
        let spec = plain().with_available_markers(&["User Not Found"]);
        let (status, _) = classify_response(&spec, "alice", 200, "USER NOT FOUND");
        assert_eq!(status, ProbeStatus::Available);
    }

    #[test]
    fn test_prober_rejects_bad_default_header() {
        let mut config = CheckConfig::default();
        config
            .default_headers
            .insert("Bad Header".to_string(), "x".to_string());
        assert!(matches!(
            Prober::new(&config),
            Err(HandleCheckError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_prober_accepts_maximum_timeout() {
        let config = CheckConfig::default().with_timeout(Duration::MAX);
        let prober = Prober::new(&config).unwrap();
        assert_eq!(prober.timeout(), Duration::MAX);
    }

    #[test]
    fn test_platform_headers_override_defaults() {
        let prober = Prober::new(&CheckConfig::default()).unwrap();
        let spec = plain()
            .with_header("user-agent", "Platform/1.0")
            .with_header("X-Extra", "1");
        let headers = prober.merged_headers(&spec);
        assert_eq!(headers.get("User-Agent").unwrap(), "Platform/1.0");
        assert_eq!(headers.get("Accept-Language").unwrap(), "en-US,en;q=0.9");
        assert_eq!(headers.get("x-extra").unwrap(), "1");
        assert_eq!(headers.get_all("user-agent").iter().count(), 1);
    }

    #[tokio::test]
    async fn test_skipped_platform_makes_no_request() {
        // Unroutable URL: a real request would fail as `error`, not `unknown`.
        let spec = PlatformSpec::new("Instagram", "http://127.0.0.1:9/{username}")
            .skipped("Requires JavaScript rendering");
        let prober = Prober::new(&CheckConfig::default()).unwrap();
        let result = prober.probe(&spec, "alice").await;
        assert_eq!(result.status, ProbeStatus::Unknown);
        assert_eq!(result.reason, "Requires JavaScript rendering");
        assert_eq!(result.url, None);
        assert_eq!(result.http_status, None);
        assert_eq!(result.elapsed_ms, None);
    }
}
