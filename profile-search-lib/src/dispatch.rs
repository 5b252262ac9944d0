//! Concurrent fan-out/fan-in of probe executions.
//!
//! The [`DispatchEngine`] spawns one task per probe, admits them through a
//! semaphore sized to `RunConfig::concurrency`, and funnels every outcome
//! through a single channel. The returned stream ends once every probe has
//! reported.

use crate::error::ProbeError;
use crate::executor::ProbeExecutor;
use crate::probe::Probe;
use crate::transport::Transport;
use crate::types::{Outcome, RunConfig};
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::AbortHandle;

/// Stream of outcomes in completion order.
///
/// Dropping it cancels every check that has not reported yet.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = Outcome> + Send>>;

/// Aborts the run's tasks when the consuming stream goes away.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Drives many probes for one username under a hard concurrency cap.
///
/// # Example
///
/// ```rust,no_run
/// use futures::StreamExt;
/// use profile_search_lib::{get_platforms, DispatchEngine, ReqwestTransport, RunConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let engine = DispatchEngine::new(ReqwestTransport::new(), RunConfig::default());
///     let mut outcomes = engine.run(get_platforms(), "alice");
///     while let Some(outcome) = outcomes.next().await {
///         println!("{}: {:?}", outcome.platform, outcome.exists);
///     }
/// }
/// ```
pub struct DispatchEngine<T> {
    executor: ProbeExecutor<T>,
}

impl<T> Clone for DispatchEngine<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
        }
    }
}

impl<T: Transport + 'static> DispatchEngine<T> {
    pub fn new(transport: T, config: RunConfig) -> Self {
        Self::with_shared(Arc::new(transport), Arc::new(config))
    }

    /// Build an engine around an already shared transport and configuration.
    pub fn with_shared(transport: Arc<T>, config: Arc<RunConfig>) -> Self {
        Self {
            executor: ProbeExecutor::new(transport, config),
        }
    }

    pub fn config(&self) -> &RunConfig {
        self.executor.config()
    }

    /// Probe every platform in `probes` for `username`.
    ///
    /// Yields exactly one outcome per probe, in completion order. At most
    /// `concurrency` probes run at once; each holds its admission permit for
    /// its whole retry loop. Must be called from within a tokio runtime.
    pub fn run(&self, probes: Vec<Probe>, username: &str) -> OutcomeStream {
        let total = probes.len();
        let concurrency = self.config().concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let username: Arc<str> = Arc::from(username);
        let (tx, rx) = mpsc::channel::<Outcome>(total.max(1));

        tracing::info!(
            probes = total,
            concurrency,
            username = %username,
            "dispatching probes"
        );

        let mut pending = FuturesUnordered::new();
        let mut handles = Vec::with_capacity(total + 1);
        for probe in probes {
            let platform = probe.name().to_string();
            let url = probe.resolve_url(&username);
            let task = tokio::spawn(Self::probe_task(
                self.executor.clone(),
                Arc::clone(&semaphore),
                probe,
                Arc::clone(&username),
            ));
            handles.push(task.abort_handle());

            pending.push(async move {
                match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(platform = %platform, error = %e, "probe task aborted");
                        Outcome::failed(
                            platform,
                            url,
                            &ProbeError::internal(format!("probe task aborted: {}", e)),
                        )
                    }
                }
            });
        }

        // Single collector: the channel is the only place outcomes are written.
        let collector = tokio::spawn(async move {
            while let Some(outcome) = pending.next().await {
                if tx.send(outcome).await.is_err() {
                    tracing::debug!("outcome receiver dropped, stopping collection");
                    break;
                }
            }
        });
        handles.push(collector.abort_handle());

        let guard = AbortOnDrop(handles);
        Box::pin(futures::stream::unfold(
            (rx, guard),
            |(mut rx, guard)| async move {
                rx.recv().await.map(|outcome| (outcome, (rx, guard)))
            },
        ))
    }

    /// Probe every platform and wait for all outcomes.
    pub async fn run_collect(&self, probes: Vec<Probe>, username: &str) -> Vec<Outcome> {
        self.run(probes, username).collect().await
    }

    async fn probe_task(
        executor: ProbeExecutor<T>,
        semaphore: Arc<Semaphore>,
        probe: Probe,
        username: Arc<str>,
    ) -> Outcome {
        let _permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                return Outcome::failed(
                    probe.name(),
                    probe.resolve_url(&username),
                    &ProbeError::internal(format!("admission closed: {}", e)),
                );
            }
        };

        executor.execute(&probe, &username).await
    }
}
