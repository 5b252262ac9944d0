//! Single-probe execution with bounded retries.
//!
//! The executor turns one [`Probe`] and one username into exactly one
//! [`Outcome`], retrying transport and validation failures up to
//! `RunConfig::max_retries` attempts.

use crate::error::ProbeError;
use crate::probe::Probe;
use crate::transport::{ProbeClient, ProbeRequest, Transport};
use crate::types::{Outcome, ProfileInfo, RunConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sleep inserted after a transport failure on attempt `attempt` (1-based).
///
/// Linear: `attempt * unit`.
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    unit.saturating_mul(attempt)
}

/// Runs probes against a shared transport and configuration.
pub struct ProbeExecutor<T> {
    transport: Arc<T>,
    config: Arc<RunConfig>,
}

impl<T> Clone for ProbeExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: Transport> ProbeExecutor<T> {
    pub fn new(transport: Arc<T>, config: Arc<RunConfig>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Probe one platform for `username`.
    ///
    /// Never fails: every error ends up in the returned outcome. A successful
    /// validation, positive or negative, stops the retry loop and clears any
    /// error left by earlier attempts. When every attempt fails the outcome
    /// has `exists == None` and the last error.
    pub async fn execute(&self, probe: &Probe, username: &str) -> Outcome {
        let url = probe.resolve_url(username);
        let started = Instant::now();
        let max_retries = self.config.max_retries.max(1);

        let mut exists = None;
        let mut info = None;
        let mut last_error: Option<ProbeError> = None;
        let mut attempts = 0;

        for attempt in 1..=max_retries {
            attempts = attempt;

            match self.attempt(probe, username, &url).await {
                Ok((found, extracted)) => {
                    exists = Some(found);
                    info = extracted;
                    last_error = None;
                    tracing::debug!(platform = probe.name(), attempt, found, "probe validated");
                    break;
                }
                Err(err) => {
                    tracing::debug!(
                        platform = probe.name(),
                        attempt,
                        max_retries,
                        error = %err,
                        "probe attempt failed"
                    );

                    let retryable = err.is_retryable();
                    let backoff = retryable && err.applies_backoff() && attempt < max_retries;
                    last_error = Some(err);

                    if !retryable {
                        break;
                    }
                    if backoff {
                        let delay = backoff_delay(attempt, self.config.backoff_unit);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        if let Some(err) = &last_error {
            tracing::warn!(platform = probe.name(), attempts, error = %err, "probe gave up");
        }

        Outcome {
            platform: probe.name().to_string(),
            url,
            exists,
            error_message: last_error.map(|e| e.to_string()),
            response_time: started.elapsed(),
            attempts,
            info,
        }
    }

    /// One attempt: fresh client, fresh request, one send, one validation.
    async fn attempt(
        &self,
        probe: &Probe,
        username: &str,
        url: &str,
    ) -> Result<(bool, Option<ProfileInfo>), ProbeError> {
        let client = self.transport.acquire(&self.config)?;
        let request = ProbeRequest::get(url, self.config.pick_user_agent())?;
        probe.check_host(username, request.url())?;
        let response = client.send(request).await?;

        let found = probe.validate(&response)?;
        let info = if found { probe.extract(&response) } else { None };

        Ok((found, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ProbeResponse;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Transport that replays scripted results and counts sends.
    struct ScriptedTransport {
        script: Mutex<Vec<Result<ProbeResponse, ProbeError>>>,
        sends: Arc<AtomicU32>,
        user_agents: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<ProbeResponse, ProbeError>>) -> Self {
            Self {
                script: Mutex::new(script),
                sends: Arc::new(AtomicU32::new(0)),
                user_agents: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    struct ScriptedClient {
        next: Result<ProbeResponse, ProbeError>,
        sends: Arc<AtomicU32>,
        user_agents: Arc<Mutex<Vec<String>>>,
    }

    impl Transport for ScriptedTransport {
        type Client = ScriptedClient;

        fn acquire(&self, _config: &RunConfig) -> Result<ScriptedClient, ProbeError> {
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            };
            Ok(ScriptedClient {
                next,
                sends: Arc::clone(&self.sends),
                user_agents: Arc::clone(&self.user_agents),
            })
        }
    }

    impl ProbeClient for ScriptedClient {
        fn send(
            &self,
            request: ProbeRequest,
        ) -> impl Future<Output = Result<ProbeResponse, ProbeError>> + Send {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if let Some(ua) = request.header("User-Agent") {
                self.user_agents.lock().unwrap().push(ua.to_string());
            }
            let next = self.next.clone();
            async move { next }
        }
    }

    fn exists_on_200(response: &ProbeResponse) -> Result<bool, ProbeError> {
        Ok(response.status == 200)
    }

    fn strict_utf8(response: &ProbeResponse) -> Result<bool, ProbeError> {
        response.text().map(|_| true)
    }

    fn extract_name(_: &ProbeResponse) -> Result<ProfileInfo, ProbeError> {
        Ok(ProfileInfo {
            name: Some("Alice".to_string()),
            ..Default::default()
        })
    }

    fn extract_fails(_: &ProbeResponse) -> Result<ProfileInfo, ProbeError> {
        Err(ProbeError::extraction("A", "markup changed"))
    }

    fn config(max_retries: u32) -> Arc<RunConfig> {
        Arc::new(
            RunConfig::default()
                .with_max_retries(max_retries)
                .with_backoff_unit(Duration::from_millis(1)),
        )
    }

    fn executor(transport: ScriptedTransport, max_retries: u32) -> ProbeExecutor<ScriptedTransport> {
        ProbeExecutor::new(Arc::new(transport), config(max_retries))
    }

    #[test]
    fn test_backoff_strictly_increases() {
        let unit = Duration::from_secs(1);
        assert_eq!(backoff_delay(1, unit), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, unit), Duration::from_secs(2));
        for attempt in 1..10 {
            assert!(backoff_delay(attempt, unit) < backoff_delay(attempt + 1, unit));
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_sends_once() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(200, "ok"))]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 5);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.exists, Some(true));
        assert_eq!(outcome.url, "https://a.test/alice");
        assert!(outcome.error_message.is_none());
    }

    #[tokio::test]
    async fn test_negative_validation_is_terminal() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(404, ""))]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 3);

        let probe = Probe::new("B", "https://b.test/{}", exists_on_200);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.exists, Some(false));
        assert!(outcome.error_message.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_exhausts_retries() {
        let transport = ScriptedTransport::new(vec![Err(ProbeError::network("connection refused"))]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 3);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(sends.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.exists, None);
        assert!(!outcome.is_found());
        assert!(outcome
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_success_after_transient_failure_clears_error() {
        let transport = ScriptedTransport::new(vec![
            Err(ProbeError::network("reset by peer")),
            Ok(ProbeResponse::new(200, "ok")),
        ]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 3);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(sends.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.exists, Some(true));
        assert!(outcome.error_message.is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_is_retried() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(200, vec![0xff]))]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 2);

        let probe = Probe::new("A", "https://a.test/{}", strict_utf8);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(sends.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.exists, None);
        assert!(outcome
            .error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Validation error for 'A'")));
    }

    #[tokio::test]
    async fn test_malformed_url_consumes_attempts_without_sending() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(200, "ok"))]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 3);

        let probe = Probe::new("Broken", "not a url/{}", exists_on_200);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(sends.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.exists, None);
        assert!(outcome
            .error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Failed to build request")));
    }

    #[tokio::test]
    async fn test_extractor_populates_profile_fields() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(200, "ok"))]);
        let executor = executor(transport, 3);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200).with_extractor(extract_name);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(outcome.exists, Some(true));
        assert_eq!(
            outcome.info.and_then(|i| i.name),
            Some("Alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_extractor_failure_keeps_existence() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(200, "ok"))]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 3);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200).with_extractor(extract_fails);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.exists, Some(true));
        assert!(outcome.info.is_none());
        assert!(outcome.error_message.is_none());
    }

    #[tokio::test]
    async fn test_extractor_not_called_for_missing_profile() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(404, ""))]);
        let executor = executor(transport, 3);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200).with_extractor(extract_name);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(outcome.exists, Some(false));
        assert!(outcome.info.is_none());
    }

    #[tokio::test]
    async fn test_user_agent_comes_from_pool() {
        let transport = ScriptedTransport::new(vec![Err(ProbeError::network("down"))]);
        let seen = Arc::clone(&transport.user_agents);
        let config = Arc::new(
            RunConfig::default()
                .with_max_retries(3)
                .with_backoff_unit(Duration::ZERO)
                .with_user_agents(vec!["agent-a".to_string(), "agent-b".to_string()]),
        );
        let executor = ProbeExecutor::new(Arc::new(transport), config);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200);
        executor.execute(&probe, "alice").await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|ua| ua == "agent-a" || ua == "agent-b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleeps_between_transport_failures() {
        let transport = ScriptedTransport::new(vec![Err(ProbeError::network("down"))]);
        let config = Arc::new(
            RunConfig::default()
                .with_max_retries(3)
                .with_backoff_unit(Duration::from_secs(1)),
        );
        let executor = ProbeExecutor::new(Arc::new(transport), config);

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200);
        let started = tokio::time::Instant::now();
        executor.execute(&probe, "alice").await;

        // 1s after attempt 1, 2s after attempt 2, nothing after the last one.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    /// Transport that can never hand out a client.
    struct MisconfiguredTransport {
        acquires: AtomicU32,
    }

    impl Transport for MisconfiguredTransport {
        type Client = ScriptedClient;

        fn acquire(&self, _config: &RunConfig) -> Result<ScriptedClient, ProbeError> {
            self.acquires.fetch_add(1, Ordering::SeqCst);
            Err(ProbeError::config("Invalid proxy URL 'http://proxy host:8080'"))
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_early() {
        let transport = Arc::new(MisconfiguredTransport {
            acquires: AtomicU32::new(0),
        });
        let executor = ProbeExecutor::new(Arc::clone(&transport), config(3));

        let probe = Probe::new("A", "https://a.test/{}", exists_on_200);
        let outcome = executor.execute(&probe, "alice").await;

        assert_eq!(transport.acquires.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.exists, None);
        assert!(outcome
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("Invalid proxy URL")));
    }

    #[tokio::test]
    async fn test_username_cannot_move_request_to_another_host() {
        let transport = ScriptedTransport::new(vec![Ok(ProbeResponse::new(200, "ok"))]);
        let sends = Arc::clone(&transport.sends);
        let executor = executor(transport, 2);

        let probe = Probe::new("WordPress", "https://{}.wordpress.com", exists_on_200);
        let outcome = executor.execute(&probe, "evil.example\\").await;

        assert_eq!(sends.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.exists, None);
        assert!(outcome
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("evil.example")));
    }
}
