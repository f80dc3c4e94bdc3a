//! Lifecycle of the single remote conversational session.
//!
//! A session is seeded with a history snapshot when it is created and is
//! never updated in place: whenever the history it was built from changes,
//! the handle is dropped and a new one is built from the full history.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::core::error::{SendError, SessionInitError};
use crate::core::history::HistoryKey;
use crate::core::message::Message;

/// Something that can open conversational sessions against a remote model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a session whose context is `seed`, replayed in order.
    async fn start_session(
        &self,
        seed: &[Message],
    ) -> Result<Box<dyn ChatSession>, SessionInitError>;
}

/// An open conversational context.
#[async_trait]
pub trait ChatSession: Send {
    /// Send one user turn and return the full response text.
    async fn send_message(&mut self, text: &str) -> Result<String, SendError>;
}

struct ActiveSession {
    key: HistoryKey,
    handle: Box<dyn ChatSession>,
}

pub struct SessionManager {
    backend: Arc<dyn ChatBackend>,
    timeout: Duration,
    current: Option<ActiveSession>,
    rebuilds: u64,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            current: None,
            rebuilds: 0,
        }
    }

    /// Discard the current session and build a new one seeded with `history`.
    ///
    /// The old handle is invalid as soon as this is called, even if the new
    /// session fails to start.
    pub async fn rebuild(&mut self, history: &[Message]) -> Result<(), SessionInitError> {
        self.current = None;
        let key = HistoryKey::of(history);

        let started = tokio::time::timeout(self.timeout, self.backend.start_session(history))
            .await
            .map_err(|_| SessionInitError::Timeout(self.timeout))
            .and_then(|result| result);

        match started {
            Ok(handle) => {
                self.rebuilds += 1;
                debug!(
                    seed_len = history.len(),
                    rebuilds = self.rebuilds,
                    "session rebuilt"
                );
                self.current = Some(ActiveSession { key, handle });
                Ok(())
            }
            Err(err) => {
                warn!(seed_len = history.len(), error = %err, "session rebuild failed");
                Err(err)
            }
        }
    }

    /// Make sure the current session reflects exactly `history`, rebuilding
    /// only when the history differs from the one it was seeded with.
    pub async fn ensure(&mut self, history: &[Message]) -> Result<(), SessionInitError> {
        let key = HistoryKey::of(history);
        if self.current_key() == Some(key) {
            trace!(seed_len = history.len(), "reusing session");
            return Ok(());
        }
        self.rebuild(history).await
    }

    /// Send `text` over the current session.
    ///
    /// The session is keyed on the history it was seeded with. Once a turn has
    /// been sent the store moves on, so the session is dropped whatever the
    /// outcome and the next turn reseeds.
    pub async fn send(&mut self, text: &str) -> Result<String, SendError> {
        let timeout = self.timeout;
        let Some(active) = self.current.as_mut() else {
            return Err(SendError::NoSession);
        };

        let outcome = match tokio::time::timeout(timeout, active.handle.send_message(text)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout(timeout)),
        };
        self.current = None;
        outcome
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn has_session(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_key(&self) -> Option<HistoryKey> {
        self.current.as_ref().map(|active| active.key)
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}
