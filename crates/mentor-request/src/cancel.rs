//! Cancellation handles for managed requests
//!
//! Every queued, active, and streaming request carries a [`CancelHandle`].
//! Triggering it records which kind of cancellation happened first, so the
//! task observing it can reject with the right typed error (`Cancelled` vs
//! `EmergencyStop`).

use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

use crate::error::RequestError;

/// Why a request was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelKind {
    /// Targeted cancellation (by agent name, or pre-emption by an
    /// exclusive submission)
    User,
    /// Process-wide emergency stop
    Emergency,
}

/// Cancellation handle shared between the manager and the executing task
#[derive(Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    kind: Arc<OnceLock<CancelKind>>,
}

impl CancelHandle {
    /// Create a fresh, untriggered handle
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            kind: Arc::new(OnceLock::new()),
        }
    }

    /// Trigger cancellation
    ///
    /// The first trigger wins; later triggers keep the original kind.
    /// Idempotent.
    pub fn trigger(&self, kind: CancelKind) {
        let _ = self.kind.set(kind);
        self.token.cancel();
    }

    /// Wait until the handle is triggered
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Check without waiting
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The kind recorded by the first trigger
    pub fn kind(&self) -> Option<CancelKind> {
        self.kind.get().copied()
    }

    /// The typed error a caller should see for this cancellation
    pub fn as_error(&self) -> RequestError {
        match self.kind() {
            Some(CancelKind::Emergency) => RequestError::EmergencyStop,
            _ => RequestError::Cancelled,
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
