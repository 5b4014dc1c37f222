//! Request manager: the single authority for turning "agent wants a
//! generation" into "agent eventually gets a response or a typed failure"
//!
//! The manager owns five tracking structures: the priority queue, the
//! active set, the streaming set, the response cache, and the per-agent
//! status map. All of them are guarded for a multi-threaded runtime; every
//! mutation that must appear atomic to concurrent submitters (notably
//! cancel-by-agent-name) runs to completion without awaiting.
//!
//! Concurrency is serialized by default (`max_concurrent = 1`): the
//! external backend is the scarce, rate-limited resource, and the queue
//! absorbs burstiness from many agents without overwhelming it.

use dashmap::DashMap;
use futures::{Stream, StreamExt};
use rand::Rng;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use mentor_llm::{GenerationClient, GenerationConfig, Message, Response};

use crate::{
    cache::ResponseCache,
    cancel::{CancelHandle, CancelKind},
    error::{RequestError, Result},
    options::{AgentStatus, ManagerConfig, Priority, QueueStatus, RequestOptions},
};

/// Type alias for the lazily-consumed text streams handed to callers
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

const RETRY_BASE_DELAY_MS: u64 = 1000;
const RETRY_MAX_DELAY_MS: u64 = 10_000;
const RETRY_JITTER_MS: u64 = 1000;

/// One pending-or-in-flight generation call
struct QueuedRequest {
    id: String,
    agent_name: String,
    messages: Vec<Message>,
    config: GenerationConfig,
    options: RequestOptions,
    cancel: CancelHandle,
    responder: oneshot::Sender<Result<Response>>,
    retry_count: u32,
}

/// Tracking entry for an executing request
struct ActiveEntry {
    agent_name: String,
    cancel: CancelHandle,
}

/// Tracking entry for a request waiting out its retry backoff
struct RetryEntry {
    agent_name: String,
    cancel: CancelHandle,
}

/// Tracking entry for a live stream
struct StreamEntry {
    agent_name: String,
    cancel: CancelHandle,
}

struct Inner {
    config: ManagerConfig,
    client: Arc<dyn GenerationClient>,
    queue: Mutex<VecDeque<QueuedRequest>>,
    active: DashMap<String, ActiveEntry>,
    retrying: DashMap<String, RetryEntry>,
    streaming: DashMap<String, StreamEntry>,
    statuses: DashMap<String, AgentStatus>,
    cache: ResponseCache,
    wake: mpsc::UnboundedSender<()>,
}

/// Cheaply cloneable handle to one request manager instance
///
/// Explicitly constructed and passed down; tests instantiate isolated
/// managers per case instead of sharing hidden process state.
#[derive(Clone)]
pub struct RequestManager {
    inner: Arc<Inner>,
}

impl RequestManager {
    /// Create a manager driving the given client
    ///
    /// Must be called within a tokio runtime: the manager spawns its
    /// queue-drain worker and a periodic cache sweep.
    pub fn new(client: Arc<dyn GenerationClient>, config: ManagerConfig) -> Self {
        let (wake_tx, mut wake_rx) = mpsc::unbounded_channel();
        let cache = ResponseCache::new(config.cache_ttl, config.cache_capacity);

        let inner = Arc::new(Inner {
            config,
            client,
            queue: Mutex::new(VecDeque::new()),
            active: DashMap::new(),
            retrying: DashMap::new(),
            streaming: DashMap::new(),
            statuses: DashMap::new(),
            cache,
            wake: wake_tx,
        });

        // Queue-drain worker. Holds a weak reference so dropping the last
        // manager handle shuts it down (the wake sender closes).
        let worker = Arc::downgrade(&inner);
        tokio::spawn(async move {
            while wake_rx.recv().await.is_some() {
                match worker.upgrade() {
                    Some(inner) => inner.drain(),
                    None => break,
                }
            }
        });

        // Periodic cache sweep; lazy eviction on lookup handles the rest.
        let sweeper = Arc::downgrade(&inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            interval.tick().await;
            loop {
                interval.tick().await;
                match sweeper.upgrade() {
                    Some(inner) => inner.cache.sweep().await,
                    None => break,
                }
            }
        });

        Self { inner }
    }

    /// Create a manager with default limits
    pub fn with_defaults(client: Arc<dyn GenerationClient>) -> Self {
        Self::new(client, ManagerConfig::default())
    }

    /// Request options seeded from this manager's configuration
    pub fn default_options(&self) -> RequestOptions {
        self.inner.config.default_options()
    }

    /// Submit a generation request
    ///
    /// Checks the cache first; a hit resolves immediately with no queue
    /// interaction. Exclusive submissions (`cancellable: false`) pre-empt
    /// every other outstanding request for the same agent name before
    /// queuing. High-priority requests are inserted at the queue head.
    pub async fn submit(
        &self,
        agent_name: &str,
        messages: Vec<Message>,
        config: &GenerationConfig,
        options: RequestOptions,
    ) -> Result<Response> {
        if !options.cancellable {
            self.cancel_agent_requests(agent_name);
        }

        if let Some(cached) = self.inner.cache.get(&messages, config).await {
            tracing::debug!(agent = %agent_name, "cache hit, skipping queue");
            return Ok(cached);
        }

        let (responder, receiver) = oneshot::channel();
        let request = QueuedRequest {
            id: Uuid::new_v4().to_string(),
            agent_name: agent_name.to_string(),
            messages,
            config: config.clone(),
            options,
            cancel: CancelHandle::new(),
            responder,
            retry_count: 0,
        };

        {
            let mut queue = self
                .inner
                .queue
                .lock()
                .expect("request queue lock poisoned");
            match request.options.priority {
                Priority::High => queue.push_front(request),
                Priority::Normal => queue.push_back(request),
            }
        }

        self.inner
            .statuses
            .insert(agent_name.to_string(), AgentStatus::Processing);
        self.inner.wake();

        receiver.await.map_err(|_| RequestError::ChannelClosed)?
    }

    /// Submit a streaming generation request
    ///
    /// Streaming is always exclusive per agent: any prior request for the
    /// same name is cancelled first. The returned sequence is finite and
    /// not restartable; consuming it drives the underlying stream forward.
    /// On timeout or cancellation, iteration stops silently and any
    /// further chunks are discarded.
    pub fn submit_stream(
        &self,
        agent_name: &str,
        messages: Vec<Message>,
        config: &GenerationConfig,
        options: RequestOptions,
    ) -> TextStream {
        self.cancel_agent_requests(agent_name);

        let inner = Arc::clone(&self.inner);
        let agent = agent_name.to_string();
        let config = config.clone();

        // Tracked and marked processing at submission time, not at first
        // poll, so status and counts are accurate before the consumer
        // starts reading.
        let id = Uuid::new_v4().to_string();
        let cancel = CancelHandle::new();
        inner.streaming.insert(
            id.clone(),
            StreamEntry {
                agent_name: agent.clone(),
                cancel: cancel.clone(),
            },
        );
        inner.statuses.insert(agent.clone(), AgentStatus::Processing);
        let deadline = tokio::time::Instant::now() + options.timeout;

        // Removes the tracking entry even if the consumer drops the
        // stream mid-iteration or never polls it.
        let guard = StreamGuard {
            inner: Arc::clone(&inner),
            id,
        };

        Box::pin(async_stream::stream! {
            let _guard = guard;

            let mut chunks = match inner.client.stream(messages, &config).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(agent = %agent, error = %e, "failed to open stream");
                    inner.statuses.insert(agent.clone(), AgentStatus::Error);
                    return;
                }
            };

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        // Silent truncation; status was already set by the
                        // cancellation path.
                        break;
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::warn!(agent = %agent, "stream timed out");
                        inner.statuses.insert(agent.clone(), AgentStatus::Error);
                        break;
                    }
                    next = chunks.next() => match next {
                        Some(Ok(chunk)) => {
                            let done = chunk.is_final();
                            if !chunk.content.is_empty() {
                                yield chunk.content;
                            }
                            if done {
                                inner.statuses.insert(agent.clone(), AgentStatus::Idle);
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!(agent = %agent, error = %e, "stream failed mid-flight");
                            inner.statuses.insert(agent.clone(), AgentStatus::Error);
                            break;
                        }
                        None => {
                            inner.statuses.insert(agent.clone(), AgentStatus::Idle);
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Cancel every queued, in-flight, retrying, and streaming request
    /// owned by this agent name
    ///
    /// Idempotent. The agent's status reads `cancelled` for a short window
    /// before reverting to `idle`.
    pub fn cancel_agent_requests(&self, agent_name: &str) {
        self.inner.cancel_matching(Some(agent_name), CancelKind::User);
        self.inner.mark_cancelled(agent_name);
        tracing::debug!(agent = %agent_name, "cancelled agent requests");
    }

    /// Abort all requests across all agents
    ///
    /// Every pending future rejects with `EmergencyStop`. Leaves the
    /// manager in a clean, reusable state: empty queue, empty active set,
    /// empty streaming set, cleared statuses.
    pub fn emergency_stop(&self) {
        self.inner.cancel_matching(None, CancelKind::Emergency);
        self.inner.statuses.clear();
        tracing::warn!("emergency stop: all requests aborted");
    }

    /// Current status for an agent (`Idle` when untracked)
    pub fn agent_status(&self, agent_name: &str) -> AgentStatus {
        self.inner
            .statuses
            .get(agent_name)
            .map(|entry| *entry)
            .unwrap_or_default()
    }

    /// Read-only snapshot for observability
    pub fn queue_status(&self) -> QueueStatus {
        let queued = self
            .inner
            .queue
            .lock()
            .expect("request queue lock poisoned")
            .len();
        QueueStatus {
            queued,
            active: self.inner.active.len(),
            streaming: self.inner.streaming.len(),
            agent_statuses: self
                .inner
                .statuses
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }
}

impl Inner {
    fn wake(&self) {
        let _ = self.wake.send(());
    }

    /// Queue-drain step: promote queued requests into the active set while
    /// capacity remains, one spawned execution per request. Each completion
    /// wakes this step again, so the queue drains continuously rather than
    /// on a fixed interval.
    fn drain(self: &Arc<Self>) {
        loop {
            if self.active.len() >= self.config.max_concurrent {
                return;
            }

            let request = self
                .queue
                .lock()
                .expect("request queue lock poisoned")
                .pop_front();
            let Some(request) = request else { return };

            self.active.insert(
                request.id.clone(),
                ActiveEntry {
                    agent_name: request.agent_name.clone(),
                    cancel: request.cancel.clone(),
                },
            );
            self.statuses
                .insert(request.agent_name.clone(), AgentStatus::Processing);

            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.execute(request).await;
            });
        }
    }

    /// Run one attempt of a request: race the backend call (under its
    /// timeout) against cancellation, then settle or route to retry.
    async fn execute(self: Arc<Self>, request: QueuedRequest) {
        let cancel = request.cancel.clone();

        let outcome = {
            let call = self
                .client
                .complete(request.messages.clone(), &request.config);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(cancel.as_error()),
                result = tokio::time::timeout(request.options.timeout, call) => match result {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(e)) => Err(RequestError::Backend(e)),
                    Err(_) => Err(RequestError::Timeout),
                },
            }
        };

        self.active.remove(&request.id);

        match outcome {
            Ok(response) => {
                self.cache
                    .insert(&request.messages, &request.config, response.clone())
                    .await;
                self.statuses
                    .insert(request.agent_name.clone(), AgentStatus::Idle);
                let _ = request.responder.send(Ok(response));
            }
            Err(err) => self.handle_failure(request, err),
        }

        self.wake();
    }

    /// Retry-with-backoff routing for a failed attempt
    fn handle_failure(self: &Arc<Self>, mut request: QueuedRequest, err: RequestError) {
        if request.cancel.is_cancelled() {
            self.settle_cancelled(request);
            return;
        }

        request.retry_count += 1;

        if err.is_retryable() && request.retry_count <= request.options.retries {
            let exponent = request.retry_count - 1;
            let base = (RETRY_BASE_DELAY_MS * 2u64.pow(exponent)).min(RETRY_MAX_DELAY_MS);
            let jitter = rand::thread_rng().gen_range(0..RETRY_JITTER_MS);
            let delay = Duration::from_millis(base + jitter);

            tracing::debug!(
                agent = %request.agent_name,
                attempt = request.retry_count,
                delay_ms = base + jitter,
                error = %err,
                "retrying after backoff"
            );

            self.retrying.insert(
                request.id.clone(),
                RetryEntry {
                    agent_name: request.agent_name.clone(),
                    cancel: request.cancel.clone(),
                },
            );

            let inner = Arc::clone(self);
            tokio::spawn(async move {
                let cancel = request.cancel.clone();
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
                inner.retrying.remove(&request.id);

                if request.cancel.is_cancelled() {
                    inner.settle_cancelled(request);
                    return;
                }

                // Retries re-enter at the queue head, ahead of newcomers,
                // so a transiently failing request is not starved behind a
                // growing backlog.
                inner
                    .queue
                    .lock()
                    .expect("request queue lock poisoned")
                    .push_front(request);
                inner.wake();
            });
        } else {
            tracing::warn!(
                agent = %request.agent_name,
                attempts = request.retry_count,
                error = %err,
                "request failed terminally"
            );
            self.statuses
                .insert(request.agent_name.clone(), AgentStatus::Error);
            let _ = request.responder.send(Err(err));
        }
    }

    /// Reject a cancelled request with the right typed error
    fn settle_cancelled(self: &Arc<Self>, request: QueuedRequest) {
        let err = request.cancel.as_error();
        if request.cancel.kind() != Some(CancelKind::Emergency) {
            self.mark_cancelled(&request.agent_name);
        }
        let _ = request.responder.send(Err(err));
    }

    /// Remove and abort every tracked request matching the agent filter
    /// (all agents when `None`)
    fn cancel_matching(self: &Arc<Self>, agent_name: Option<&str>, kind: CancelKind) {
        let matches = |name: &str| agent_name.map_or(true, |agent| agent == name);

        // Queued requests are drained and rejected right here.
        let removed: Vec<QueuedRequest> = {
            let mut queue = self.queue.lock().expect("request queue lock poisoned");
            let mut kept = VecDeque::with_capacity(queue.len());
            let mut removed = Vec::new();
            for request in queue.drain(..) {
                if matches(&request.agent_name) {
                    removed.push(request);
                } else {
                    kept.push_back(request);
                }
            }
            *queue = kept;
            removed
        };
        for request in removed {
            request.cancel.trigger(kind);
            let err = request.cancel.as_error();
            let _ = request.responder.send(Err(err));
        }

        // Active, retrying, and streaming requests observe their token and
        // settle themselves; they are untracked immediately so snapshots
        // never attribute them to the agent again.
        self.active.retain(|_, entry| {
            if matches(&entry.agent_name) {
                entry.cancel.trigger(kind);
                false
            } else {
                true
            }
        });
        self.retrying.retain(|_, entry| {
            if matches(&entry.agent_name) {
                entry.cancel.trigger(kind);
                false
            } else {
                true
            }
        });
        self.streaming.retain(|_, entry| {
            if matches(&entry.agent_name) {
                entry.cancel.trigger(kind);
                false
            } else {
                true
            }
        });
    }

    /// Record the transient `cancelled` status and schedule its decay back
    /// to `idle`
    fn mark_cancelled(self: &Arc<Self>, agent_name: &str) {
        self.statuses
            .insert(agent_name.to_string(), AgentStatus::Cancelled);

        let inner = Arc::clone(self);
        let agent = agent_name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.status_reset_delay).await;
            if let Some(mut entry) = inner.statuses.get_mut(&agent) {
                if *entry == AgentStatus::Cancelled {
                    *entry = AgentStatus::Idle;
                }
            }
        });
    }
}

/// Drop guard that untracks a stream when its consumer lets go of it
struct StreamGuard {
    inner: Arc<Inner>,
    id: String,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.inner.streaming.remove(&self.id);
    }
}
