//! Progress reporting for long-running coordinated tasks
//!
//! Generation latency is opaque, so tasks report synthetic progress: a
//! background ticker raises the percentage in small random increments,
//! capped below completion, until the real work settles. The consumer
//! only ever sees 100 when the task actually succeeded.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Sink for task progress events
pub trait ProgressReporter: Send + Sync {
    /// Report one progress update for an agent's task
    fn report(&self, agent: &str, status: &str, percent: u8);
}

impl<F> ProgressReporter for F
where
    F: Fn(&str, &str, u8) + Send + Sync,
{
    fn report(&self, agent: &str, status: &str, percent: u8) {
        self(agent, status, percent)
    }
}

/// Reporter that discards every event
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _agent: &str, _status: &str, _percent: u8) {}
}

const TICK_INTERVAL: Duration = Duration::from_millis(500);
const SYNTHETIC_CAP: f32 = 90.0;

/// Synthetic progress ticker for one task
///
/// Reports 0 on start, then random increments every 500 ms capped at 90,
/// and stops the instant the task settles: 100 on success, 0 with a
/// "failed" status on failure.
pub struct ProgressTicker {
    agent: String,
    status: String,
    reporter: Arc<dyn ProgressReporter>,
    handle: tokio::task::JoinHandle<()>,
}

impl ProgressTicker {
    /// Start ticking for a task
    pub fn start(
        agent: impl Into<String>,
        status: impl Into<String>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let agent = agent.into();
        let status = status.into();
        reporter.report(&agent, &status, 0);

        let handle = {
            let agent = agent.clone();
            let status = status.clone();
            let reporter = Arc::clone(&reporter);
            tokio::spawn(async move {
                let mut percent = 0.0f32;
                let mut interval = tokio::time::interval(TICK_INTERVAL);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if percent < SYNTHETIC_CAP {
                        let increment = rand::thread_rng().gen_range(0.0..10.0);
                        percent = (percent + increment).min(SYNTHETIC_CAP);
                        reporter.report(&agent, &status, percent as u8);
                    }
                }
            })
        };

        Self {
            agent,
            status,
            reporter,
            handle,
        }
    }

    /// Settle with success: stop ticking and report 100
    pub fn succeed(self) {
        self.handle.abort();
        self.reporter
            .report(&self.agent, &format!("{} completed", self.status), 100);
    }

    /// Settle with failure: stop ticking and report 0
    pub fn fail(self) {
        self.handle.abort();
        self.reporter
            .report(&self.agent, &format!("{} failed", self.status), 0);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
