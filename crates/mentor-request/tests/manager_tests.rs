//! Integration tests for the request manager's queuing, retry,
//! cancellation, and streaming behavior
//!
//! Timing-sensitive cases run with a paused tokio clock so backoff and
//! timeout windows elapse instantly and deterministically.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use mentor_llm::{
    ChunkStream, GenerationClient, GenerationConfig, LLMError, Message, Provider, Response,
    StreamChunk,
};
use mentor_request::{AgentStatus, RequestError, RequestManager, RequestOptions};

fn test_config() -> GenerationConfig {
    GenerationConfig::new(Provider::Custom, "key", "test-model").with_base_url("http://unused")
}

fn response(content: &str) -> Response {
    Response {
        content: content.to_string(),
        model: "test-model".to_string(),
        usage: None,
        finish_reason: Some("stop".to_string()),
    }
}

/// Client gated on a semaphore: each call records its start order, then
/// waits for a permit before responding
struct GatedClient {
    gate: Arc<Semaphore>,
    started: Mutex<Vec<String>>,
    calls: AtomicU32,
}

impl GatedClient {
    fn new(gate: Arc<Semaphore>) -> Self {
        Self {
            gate,
            started: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for GatedClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<Response> {
        let content = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.started.lock().unwrap().push(content.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| LLMError::api("gate closed"))?;
        Ok(response(&format!("done: {}", content)))
    }

    async fn stream(
        &self,
        _messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<ChunkStream> {
        Err(LLMError::api("streaming not supported"))
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Client that fails a fixed number of times before succeeding, recording
/// the instant each attempt arrives
struct FlakyClient {
    failures: u32,
    attempts: AtomicU32,
    starts: Mutex<Vec<tokio::time::Instant>>,
}

impl FlakyClient {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            attempts: AtomicU32::new(0),
            starts: Mutex::new(Vec::new()),
        }
    }

    fn starts(&self) -> Vec<tokio::time::Instant> {
        self.starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for FlakyClient {
    async fn complete(
        &self,
        _messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<Response> {
        self.starts.lock().unwrap().push(tokio::time::Instant::now());
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(LLMError::api("transient"))
        } else {
            Ok(response("recovered"))
        }
    }

    async fn stream(
        &self,
        _messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<ChunkStream> {
        Err(LLMError::api("streaming not supported"))
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Client that takes a fixed duration per completion, tracking the peak
/// number of simultaneous calls
struct SlowClient {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicU32,
}

impl SlowClient {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GenerationClient for SlowClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let content = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(response(&content))
    }

    async fn stream(
        &self,
        _messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<ChunkStream> {
        Err(LLMError::api("streaming not supported"))
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Client streaming a scripted chunk sequence with a gap between chunks
struct StreamingClient {
    chunks: Vec<String>,
    gap: Duration,
}

#[async_trait]
impl GenerationClient for StreamingClient {
    async fn complete(
        &self,
        _messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<Response> {
        Err(LLMError::api("completion not supported"))
    }

    async fn stream(
        &self,
        _messages: Vec<Message>,
        _config: &GenerationConfig,
    ) -> mentor_llm::Result<ChunkStream> {
        let chunks = self.chunks.clone();
        let gap = self.gap;
        Ok(Box::pin(async_stream::stream! {
            let last = chunks.len().saturating_sub(1);
            for (i, content) in chunks.into_iter().enumerate() {
                if gap > Duration::ZERO {
                    tokio::time::sleep(gap).await;
                }
                let mut chunk = StreamChunk::new(content);
                if i == last {
                    chunk.finish_reason = Some("stop".to_string());
                }
                yield Ok(chunk);
            }
        }))
    }

    fn name(&self) -> &str {
        "streaming"
    }
}

async fn settle() {
    // Let spawned tasks (queue worker, executions) make progress.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_never_exceeds_limit() {
    let client = Arc::new(SlowClient::new(Duration::from_millis(50)));
    let manager = RequestManager::with_defaults(client.clone());
    let config = test_config();

    let mut handles = Vec::new();
    for i in 0..4 {
        let manager = manager.clone();
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            manager
                .submit(
                    &format!("agent-{i}"),
                    vec![Message::user(format!("req-{i}"))],
                    &config,
                    RequestOptions::default(),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(client.peak.load(Ordering::SeqCst), 1);
    assert_eq!(client.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_high_priority_jumps_queue() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient::new(gate.clone()));
    let manager = RequestManager::with_defaults(client.clone());
    let config = test_config();

    // First request occupies the single execution slot.
    let first = {
        let manager = manager.clone();
        let config = config.clone();
        tokio::spawn(async move {
            manager
                .submit(
                    "a",
                    vec![Message::user("first")],
                    &config,
                    RequestOptions::default(),
                )
                .await
        })
    };
    settle().await;

    // Two more arrive while the slot is busy; the high-priority one jumps.
    let normal = {
        let manager = manager.clone();
        let config = config.clone();
        tokio::spawn(async move {
            manager
                .submit(
                    "b",
                    vec![Message::user("normal")],
                    &config,
                    RequestOptions::default(),
                )
                .await
        })
    };
    settle().await;
    let urgent = {
        let manager = manager.clone();
        let config = config.clone();
        tokio::spawn(async move {
            manager
                .submit(
                    "c",
                    vec![Message::user("urgent")],
                    &config,
                    RequestOptions::default().high_priority(),
                )
                .await
        })
    };
    settle().await;

    gate.add_permits(3);
    first.await.unwrap().unwrap();
    urgent.await.unwrap().unwrap();
    normal.await.unwrap().unwrap();

    assert_eq!(client.started(), vec!["first", "urgent", "normal"]);
}

#[tokio::test(start_paused = true)]
async fn test_exclusive_submission_preempts_same_agent() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient::new(gate.clone()));
    let manager = RequestManager::with_defaults(client.clone());
    let config = test_config();

    let blocked = {
        let manager = manager.clone();
        let config = config.clone();
        tokio::spawn(async move {
            manager
                .submit(
                    "tutor",
                    vec![Message::user("old question")],
                    &config,
                    RequestOptions::default(),
                )
                .await
        })
    };
    settle().await;

    // The exclusive submission cancels the blocked request on entry,
    // before its own permit is released.
    let replacement = {
        let manager = manager.clone();
        let config = config.clone();
        tokio::spawn(async move {
            manager
                .submit(
                    "tutor",
                    vec![Message::user("new question")],
                    &config,
                    RequestOptions::default().exclusive(),
                )
                .await
        })
    };
    settle().await;

    let old = blocked.await.unwrap();
    assert!(matches!(old, Err(RequestError::Cancelled)));

    gate.add_permits(1);
    let result = replacement.await.unwrap().unwrap();
    assert_eq!(result.content, "done: new question");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_by_agent_name() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient::new(gate.clone()));
    let manager = RequestManager::with_defaults(client.clone());
    let config = test_config();

    let spawn_submit = |agent: &str, content: &str| {
        let manager = manager.clone();
        let config = config.clone();
        let agent = agent.to_string();
        let content = content.to_string();
        tokio::spawn(async move {
            manager
                .submit(
                    &agent,
                    vec![Message::user(content)],
                    &config,
                    RequestOptions::default(),
                )
                .await
        })
    };

    // One active and one queued for "tutor", one queued for "grader".
    let tutor_active = spawn_submit("tutor", "t1");
    settle().await;
    let tutor_queued = spawn_submit("tutor", "t2");
    settle().await;
    let grader = spawn_submit("grader", "g1");
    settle().await;

    manager.cancel_agent_requests("tutor");

    assert!(matches!(
        tutor_active.await.unwrap(),
        Err(RequestError::Cancelled)
    ));
    assert!(matches!(
        tutor_queued.await.unwrap(),
        Err(RequestError::Cancelled)
    ));
    assert_eq!(manager.agent_status("tutor"), AgentStatus::Cancelled);

    // The other agent's request is untouched and still completes.
    gate.add_permits(1);
    let grader_result = grader.await.unwrap().unwrap();
    assert_eq!(grader_result.content, "done: g1");

    // The transient cancelled status decays back to idle.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(manager.agent_status("tutor"), AgentStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_emergency_stop_clears_everything() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient::new(gate.clone()));
    let manager = RequestManager::with_defaults(client.clone());
    let config = test_config();

    let mut handles = Vec::new();
    for i in 0..3 {
        let manager = manager.clone();
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            manager
                .submit(
                    &format!("agent-{i}"),
                    vec![Message::user(format!("req-{i}"))],
                    &config,
                    RequestOptions::default(),
                )
                .await
        }));
    }
    settle().await;

    manager.emergency_stop();
    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Err(RequestError::EmergencyStop)
        ));
    }

    settle().await;
    let status = manager.queue_status();
    assert_eq!(status.queued, 0);
    assert_eq!(status.active, 0);
    assert_eq!(status.streaming, 0);
    assert!(status.agent_statuses.is_empty());

    // The manager stays usable afterwards.
    gate.add_permits(1);
    let result = manager
        .submit(
            "agent-0",
            vec![Message::user("after")],
            &config,
            RequestOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(result.content, "done: after");
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_from_transient_failures() {
    let client = Arc::new(FlakyClient::new(2));
    let manager = RequestManager::with_defaults(client.clone());

    let result = manager
        .submit(
            "tutor",
            vec![Message::user("q")],
            &test_config(),
            RequestOptions::default().with_retries(2),
        )
        .await
        .unwrap();

    assert_eq!(result.content, "recovered");
    assert_eq!(client.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(manager.agent_status("tutor"), AgentStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_retry_limit_is_bounded() {
    let client = Arc::new(FlakyClient::new(u32::MAX));
    let manager = RequestManager::with_defaults(client.clone());

    let result = manager
        .submit(
            "tutor",
            vec![Message::user("q")],
            &test_config(),
            RequestOptions::default().with_retries(1),
        )
        .await;

    assert!(matches!(result, Err(RequestError::Backend(_))));
    // Initial attempt plus exactly one retry.
    assert_eq!(client.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(manager.agent_status("tutor"), AgentStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn test_retry_delays_grow_and_cap() {
    let client = Arc::new(FlakyClient::new(u32::MAX));
    let manager = RequestManager::with_defaults(client.clone());

    let result = manager
        .submit(
            "tutor",
            vec![Message::user("q")],
            &test_config(),
            RequestOptions::default().with_retries(5),
        )
        .await;
    assert!(matches!(result, Err(RequestError::Backend(_))));

    // Six attempts, so five waits with doubling delays: roughly 1s, 2s,
    // 4s, 8s, then capped at 10s, each with up to 1s of jitter on top.
    let starts = client.starts();
    assert_eq!(starts.len(), 6);
    let gaps: Vec<Duration> = starts.windows(2).map(|w| w[1] - w[0]).collect();

    assert!(gaps[0] >= Duration::from_secs(1));
    for gap in &gaps {
        assert!(*gap <= Duration::from_secs(11), "gap {:?} exceeds cap", gap);
    }
    for pair in gaps.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "delay shrank from {:?} to {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried_then_surfaced() {
    let client = Arc::new(SlowClient::new(Duration::from_secs(60)));
    let manager = RequestManager::with_defaults(client.clone());

    let result = manager
        .submit(
            "tutor",
            vec![Message::user("q")],
            &test_config(),
            RequestOptions::default()
                .with_timeout(Duration::from_secs(1))
                .with_retries(1),
        )
        .await;

    assert!(matches!(result, Err(RequestError::Timeout)));
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_identical_requests_hit_cache() {
    let client = Arc::new(SlowClient::new(Duration::from_millis(10)));
    let manager = RequestManager::with_defaults(client.clone());
    let config = test_config();
    let messages = vec![Message::user("what is 2+2?")];

    let first = manager
        .submit("tutor", messages.clone(), &config, RequestOptions::default())
        .await
        .unwrap();
    let second = manager
        .submit("tutor", messages.clone(), &config, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(first.content, second.content);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);

    // A different conversation misses.
    manager
        .submit(
            "tutor",
            vec![Message::user("what is 3+3?")],
            &config,
            RequestOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stream_preserves_chunk_order_each_time() {
    let client = Arc::new(StreamingClient {
        chunks: vec!["Let".to_string(), " me".to_string(), " think".to_string()],
        gap: Duration::ZERO,
    });
    let manager = RequestManager::with_defaults(client);
    let config = test_config();

    for _ in 0..2 {
        let stream = manager.submit_stream(
            "tutor",
            vec![Message::user("explain")],
            &config,
            RequestOptions::default(),
        );
        let collected: Vec<String> = stream.collect().await;
        assert_eq!(collected, vec!["Let", " me", " think"]);
    }

    assert_eq!(manager.agent_status("tutor"), AgentStatus::Idle);
    assert_eq!(manager.queue_status().streaming, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stream_is_tracked_before_first_poll() {
    let client = Arc::new(StreamingClient {
        chunks: vec!["hi".to_string()],
        gap: Duration::ZERO,
    });
    let manager = RequestManager::with_defaults(client);
    let config = test_config();

    let stream = manager.submit_stream(
        "tutor",
        vec![Message::user("explain")],
        &config,
        RequestOptions::default(),
    );

    // Visible on the status surfaces before the consumer reads anything.
    assert_eq!(manager.agent_status("tutor"), AgentStatus::Processing);
    assert_eq!(manager.queue_status().streaming, 1);

    // Dropping an unpolled stream releases its tracking entry.
    drop(stream);
    assert_eq!(manager.queue_status().streaming, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stream_cancellation_truncates_silently() {
    let client = Arc::new(StreamingClient {
        chunks: (0..100).map(|i| format!("chunk-{i}")).collect(),
        gap: Duration::from_millis(20),
    });
    let manager = RequestManager::with_defaults(client);
    let config = test_config();

    let mut stream = manager.submit_stream(
        "tutor",
        vec![Message::user("explain")],
        &config,
        RequestOptions::default(),
    );

    let consumer = tokio::spawn(async move {
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.push(chunk);
        }
        collected
    });

    tokio::time::sleep(Duration::from_millis(90)).await;
    manager.cancel_agent_requests("tutor");

    // The consumer sees a clean early end, not an error.
    let collected = consumer.await.unwrap();
    assert!(!collected.is_empty());
    assert!(collected.len() < 100);
    assert_eq!(collected[0], "chunk-0");

    assert_eq!(manager.agent_status("tutor"), AgentStatus::Cancelled);
    assert_eq!(manager.queue_status().streaming, 0);
}

#[tokio::test(start_paused = true)]
async fn test_queue_status_tracks_counts() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient::new(gate.clone()));
    let manager = RequestManager::with_defaults(client);
    let config = test_config();

    let mut handles = Vec::new();
    for i in 0..2 {
        let manager = manager.clone();
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            manager
                .submit(
                    &format!("agent-{i}"),
                    vec![Message::user(format!("req-{i}"))],
                    &config,
                    RequestOptions::default(),
                )
                .await
        }));
    }
    settle().await;

    let status = manager.queue_status();
    assert_eq!(status.active, 1);
    assert_eq!(status.queued, 1);
    assert_eq!(
        status.agent_statuses.get("agent-0"),
        Some(&AgentStatus::Processing)
    );

    gate.add_permits(2);
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    let status = manager.queue_status();
    assert_eq!(status.active, 0);
    assert_eq!(status.queued, 0);
}
