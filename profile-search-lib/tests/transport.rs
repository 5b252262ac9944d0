//! Integration tests for the reqwest-backed transport.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! platform is contacted.

use profile_search_lib::{
    exists_unless_404, exists_unless_marked, DispatchEngine, Probe, ProbeClient, ProbeError,
    ProbeExecutor, ProbeRequest, ProbeResponse, ReqwestTransport, RunConfig, Transport,
    ACCEPT_LANGUAGE,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> RunConfig {
    RunConfig::default()
        .with_timeout(Duration::from_secs(5))
        .with_backoff_unit(Duration::ZERO)
        .with_user_agents(vec!["profile-search-test/1.0".to_string()])
}

fn marked_not_found(response: &ProbeResponse) -> Result<bool, ProbeError> {
    exists_unless_marked(response, &["Page not found"])
}

#[tokio::test]
async fn test_request_carries_user_agent_and_language() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alice"))
        .and(header("user-agent", "profile-search-test/1.0"))
        .and(header("accept-language", ACCEPT_LANGUAGE))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestTransport::new().acquire(&test_config()).unwrap();
    let request = ProbeRequest::get(
        &format!("{}/alice", server.uri()),
        test_config().pick_user_agent(),
    )
    .unwrap();

    let response = client.send(request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.text().unwrap(), "hello");
}

#[tokio::test]
async fn test_not_found_status_is_returned_not_raised() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let client = ReqwestTransport::new().acquire(&test_config()).unwrap();
    let request = ProbeRequest::get(&format!("{}/ghost", server.uri()), "agent").unwrap();

    let response = client.send(request).await.unwrap();
    assert!(response.is_not_found());
    assert_eq!(response.body, b"missing".to_vec());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = test_config().with_timeout(Duration::from_millis(200));
    let client = ReqwestTransport::new().acquire(&config).unwrap();
    let request = ProbeRequest::get(&format!("{}/slow", server.uri()), "agent").unwrap();

    let err = client.send(request).await.unwrap_err();
    assert!(matches!(err, ProbeError::Timeout { .. }), "got: {err:?}");
    assert!(err.applies_backoff());
}

#[tokio::test]
async fn test_executor_against_mock_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>alice</h1>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/bob"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Page not found"))
        .expect(1)
        .mount(&server)
        .await;

    let probe = Probe::new(
        "Mock",
        format!("{}/users/{{}}", server.uri()),
        marked_not_found,
    );
    let executor = ProbeExecutor::new(Arc::new(ReqwestTransport::new()), Arc::new(test_config()));

    let found = executor.execute(&probe, "alice").await;
    assert_eq!(found.exists, Some(true));
    assert_eq!(found.attempts, 1);

    let missing = executor.execute(&probe, "bob").await;
    assert_eq!(missing.exists, Some(false));
    assert!(missing.error_message.is_none());
}

#[tokio::test]
async fn test_status_only_probe_settles_on_first_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let probe = Probe::new(
        "Flaky",
        format!("{}/{{}}", server.uri()),
        exists_unless_404,
    );
    let engine = DispatchEngine::new(ReqwestTransport::new(), test_config());

    let outcomes = engine.run_collect(vec![probe], "alice").await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].exists, Some(true));
    assert_eq!(outcomes[0].attempts, 1);
}

#[tokio::test]
async fn test_unreachable_host_exhausts_retries() {
    // Nothing listens on port 1.
    let probe = Probe::new("Gone", "http://127.0.0.1:1/{}", exists_unless_404);
    let engine = DispatchEngine::new(
        ReqwestTransport::new(),
        test_config().with_max_retries(2),
    );

    let outcomes = engine.run_collect(vec![probe], "alice").await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].exists, None);
    assert_eq!(outcomes[0].attempts, 2);
    assert!(outcomes[0].error_message.is_some());
}
