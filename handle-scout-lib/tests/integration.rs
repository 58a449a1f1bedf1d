// handle-scout-lib/tests/integration.rs

//! Integration tests for handle-scout-lib against local mock platforms

use futures_util::StreamExt;
use handle_scout_lib::{
    get_builtin_platform_names, CheckConfig, HandleChecker, PlatformRegistry, PlatformSpec,
    ProbeStatus, SuggestionConfig, SuggestionPolicy,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn checker_for(platforms: Vec<PlatformSpec>, config: CheckConfig) -> HandleChecker {
    let registry = PlatformRegistry::new(platforms).unwrap();
    HandleChecker::with_config(config, registry).unwrap()
}

/// Three platforms on one mock server: free, registered, and behind a captcha.
async fn mixed_server() -> (MockServer, Vec<PlatformSpec>) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/free/alice"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/used/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>alice</h1>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/guarded/alice"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<div>Please complete the CAPTCHA</div>"),
        )
        .mount(&server)
        .await;

    let platforms = vec![
        PlatformSpec::new("Free", format!("{}/free/{{username}}", server.uri())),
        PlatformSpec::new("Used", format!("{}/used/{{username}}", server.uri())),
        PlatformSpec::new("Guarded", format!("{}/guarded/{{username}}", server.uri()))
            .with_unknown_markers(&["captcha"])
            .ambiguous_on_200(),
    ];

    (server, platforms)
}

#[test]
fn test_library_exports_work() {
    let names = get_builtin_platform_names();
    assert_eq!(names.len(), 10);
    assert_eq!(names[0], "GitHub");
    assert!(names.contains(&"TikTok"));

    let registry = PlatformRegistry::builtin();
    assert_eq!(registry.names(), names);
}

#[tokio::test]
async fn test_results_follow_registry_order_and_classification() {
    let (_server, platforms) = mixed_server().await;
    let checker = checker_for(platforms, CheckConfig::default());

    let batch = checker.check_handle("alice").await.unwrap();
    let summary: Vec<_> = batch
        .results
        .iter()
        .map(|r| (r.platform.as_str(), r.status, r.http_status))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("Free", ProbeStatus::Available, Some(404)),
            ("Used", ProbeStatus::Taken, Some(200)),
            ("Guarded", ProbeStatus::Unknown, Some(200)),
        ]
    );
    assert_eq!(batch.results[1].reason, "Profile returns 200 => likely taken");
    assert_eq!(
        batch.results[2].reason,
        "Page requires verification or is blocked"
    );
    assert!(batch.results.iter().all(|r| r.elapsed_ms.is_some()));
    assert!(batch.results[0].url.as_deref().unwrap().ends_with("/free/alice"));

    // Not available everywhere, so suggestions are produced
    assert_eq!(batch.suggestions.len(), 18);
    assert_eq!(batch.suggestions[0], "alicehq");
}

#[tokio::test]
async fn test_order_is_stable_across_runs() {
    let (_server, platforms) = mixed_server().await;
    let checker = checker_for(platforms, CheckConfig::default().with_concurrency(1));

    let first = checker.check_handle("alice").await.unwrap();
    for _ in 0..3 {
        let again = checker.check_handle("alice").await.unwrap();
        let names: Vec<_> = again.results.iter().map(|r| r.platform.clone()).collect();
        let expected: Vec<_> = first.results.iter().map(|r| r.platform.clone()).collect();
        assert_eq!(names, expected);
        assert_eq!(again.suggestions, first.suggestions);
    }
}

#[tokio::test]
async fn test_slow_platform_times_out_without_affecting_others() {
    let server = MockServer::start().await;
    Mock::given(path("/slow/alice"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    Mock::given(path("/fast/alice"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let checker = checker_for(
        vec![
            PlatformSpec::new("Slow", format!("{}/slow/{{username}}", server.uri())),
            PlatformSpec::new("Fast", format!("{}/fast/{{username}}", server.uri())),
        ],
        CheckConfig::default().with_timeout(Duration::from_millis(300)),
    );

    let start = std::time::Instant::now();
    let batch = checker.check_handle("alice").await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));

    assert_eq!(batch.results[0].status, ProbeStatus::Error);
    assert_eq!(batch.results[0].reason, "timeout");
    assert_eq!(batch.results[0].http_status, None);
    assert_eq!(batch.results[1].status, ProbeStatus::Available);
}

#[tokio::test]
async fn test_unreachable_platform_is_an_error_result() {
    let (_server, mut platforms) = mixed_server().await;
    platforms.insert(
        1,
        PlatformSpec::new("Offline", "http://127.0.0.1:1/{username}"),
    );
    let checker = checker_for(platforms, CheckConfig::default());

    let batch = checker.check_handle("alice").await.unwrap();
    assert_eq!(batch.results.len(), 4);
    assert_eq!(batch.results[1].platform, "Offline");
    assert_eq!(batch.results[1].status, ProbeStatus::Error);
    assert!(!batch.results[1].reason.is_empty());
    assert_eq!(batch.results[0].status, ProbeStatus::Available);
}

#[tokio::test]
async fn test_skipped_platform_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(path("/hidden/alice"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let checker = checker_for(
        vec![PlatformSpec::new("Hidden", format!("{}/hidden/{{username}}", server.uri()))
            .skipped("Blocks automated checks")],
        CheckConfig::default(),
    );

    let batch = checker.check_handle("alice").await.unwrap();
    assert_eq!(batch.results[0].status, ProbeStatus::Unknown);
    assert_eq!(batch.results[0].reason, "Blocks automated checks");
    server.verify().await;
}

#[tokio::test]
async fn test_method_check_url_and_headers_reach_platform() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/api/users/alice"))
        .and(header("user-agent", "scout-test/2.0"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let spec = PlatformSpec::new("Api", "https://profiles.invalid/{username}")
        .with_check_url(format!("{}/api/users/{{username}}", server.uri()))
        .with_method("HEAD")
        .with_header("User-Agent", "scout-test/2.0");
    let checker = checker_for(vec![spec], CheckConfig::default());

    let batch = checker.check_handle("alice").await.unwrap();
    assert_eq!(batch.results[0].status, ProbeStatus::Available);
    // The profile URL is reported, not the check URL
    assert_eq!(
        batch.results[0].url.as_deref(),
        Some("https://profiles.invalid/alice")
    );
    server.verify().await;
}

#[tokio::test]
async fn test_all_available_produces_no_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let checker = checker_for(
        vec![
            PlatformSpec::new("One", format!("{}/one/{{username}}", server.uri())),
            PlatformSpec::new("Two", format!("{}/two/{{username}}", server.uri())),
        ],
        CheckConfig::default(),
    );

    let batch = checker.check_handle("alice").await.unwrap();
    assert!(batch.all_available());
    assert!(batch.suggestions.is_empty());
}

#[tokio::test]
async fn test_key_platform_policy_ignores_other_platforms() {
    let (_server, platforms) = mixed_server().await;
    let suggestions = SuggestionConfig::default()
        .with_policy(SuggestionPolicy::KeyPlatforms(vec!["Free".to_string()]));
    let checker = checker_for(
        platforms,
        CheckConfig::default().with_suggestions(suggestions),
    );

    let batch = checker.check_handle("alice").await.unwrap();
    assert_eq!(batch.count(ProbeStatus::Taken), 1);
    assert!(batch.suggestions.is_empty());
}

#[tokio::test]
async fn test_stream_yields_every_platform_once() {
    let (_server, platforms) = mixed_server().await;
    let checker = checker_for(platforms, CheckConfig::default());

    let mut seen: Vec<(usize, String)> = checker
        .check_handle_stream("alice")
        .unwrap()
        .map(|(index, result)| (index, result.platform))
        .collect()
        .await;
    seen.sort();

    assert_eq!(
        seen,
        vec![
            (0, "Free".to_string()),
            (1, "Used".to_string()),
            (2, "Guarded".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_invalid_username_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let checker = checker_for(
        vec![PlatformSpec::new("Any", format!("{}/{{username}}", server.uri()))],
        CheckConfig::default(),
    );

    let too_long = "x".repeat(31);
    for bad in ["", "a", "has space", "dash-name", too_long.as_str()] {
        let err = checker.check_handle(bad).await.unwrap_err();
        assert!(err.is_user_input(), "expected rejection for {:?}", bad);
    }
    server.verify().await;
}

#[tokio::test]
async fn test_redirect_loop_is_an_error_result() {
    let server = MockServer::start().await;
    Mock::given(path("/loop/alice"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/loop/alice", server.uri()).as_str()),
        )
        .mount(&server)
        .await;

    let mut config = CheckConfig::default();
    config.max_redirects = 2;
    let checker = checker_for(
        vec![PlatformSpec::new("Loop", format!("{}/loop/{{username}}", server.uri()))],
        config,
    );

    let batch = checker.check_handle("alice").await.unwrap();
    assert_eq!(batch.results[0].status, ProbeStatus::Error);
    assert_eq!(batch.results[0].reason, "too many redirects");
    assert_eq!(batch.results[0].http_status, None);
}

#[tokio::test]
async fn test_truncated_body_is_malformed_response() {
    // Promises 100 bytes, sends 5, then hangs up
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let checker = checker_for(
        vec![PlatformSpec::new("Truncated", format!("http://{}/{{username}}", addr))],
        CheckConfig::default(),
    );

    let batch = checker.check_handle("alice").await.unwrap();
    assert_eq!(batch.results[0].status, ProbeStatus::Error);
    assert_eq!(batch.results[0].http_status, Some(200));
    assert_eq!(batch.results[0].reason, "malformed response body");
}
