//! One user turn: record it, obtain a session reflecting the prior history,
//! exchange it with the remote model and record the sanitized reply.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::error::SubmitError;
use crate::core::history::MessageStore;
use crate::core::message::Message;
use crate::core::preferences::Language;
use crate::core::sanitize::sanitize;
use crate::core::session::SessionManager;
use crate::core::translate::Translator;

/// Only `Idle` accepts a new submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    AwaitingSession,
    AwaitingResponse,
}

impl ControllerState {
    pub fn is_idle(self) -> bool {
        self == ControllerState::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// A previous turn is still in flight; nothing happened.
    Busy,
    /// The assistant reply was appended.
    Completed,
    /// The user message was kept, no reply was appended and the error slot was set.
    Failed(SubmitError),
}

/// Changes observable by a display surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    StateChanged(ControllerState),
    MessageAppended(Message),
    InputCleared,
    ErrorChanged(Option<String>),
}

pub struct ConversationController {
    store: MessageStore,
    sessions: SessionManager,
    translator: Arc<dyn Translator>,
    language: Language,
    state: ControllerState,
    input: String,
    error: Option<String>,
    events: Option<mpsc::UnboundedSender<ConversationEvent>>,
}

impl ConversationController {
    pub fn new(sessions: SessionManager, translator: Arc<dyn Translator>) -> Self {
        Self {
            store: MessageStore::new(),
            sessions,
            translator,
            language: Language::default(),
            state: ControllerState::Idle,
            input: String::new(),
            error: None,
            events: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<ConversationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn history(&self) -> &[Message] {
        self.store.snapshot()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        if self.language != language {
            debug!(language = language.code(), "user language changed");
            self.language = language;
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Build the session for the current history ahead of the first turn.
    pub async fn prewarm(&mut self) {
        if !self.state.is_idle() {
            return;
        }
        self.set_state(ControllerState::AwaitingSession);
        let result = self.sessions.ensure(self.store.snapshot()).await;
        self.set_state(ControllerState::Idle);
        if let Err(err) = result {
            let err = SubmitError::from(err);
            warn!(kind = err.kind(), error = %err, "session prewarm failed");
            self.set_error(Some(err.user_message()));
        }
    }

    /// Submit whatever is in the pending input buffer.
    pub async fn submit_pending(&mut self) -> SubmitOutcome {
        let text = self.input.clone();
        self.submit(&text).await
    }

    pub async fn submit(&mut self, raw: &str) -> SubmitOutcome {
        if raw.trim().is_empty() {
            debug!("ignoring blank submission");
            return SubmitOutcome::Ignored;
        }
        if !self.state.is_idle() {
            debug!(state = ?self.state, "rejecting submission while busy");
            return SubmitOutcome::Busy;
        }

        self.set_error(None);
        self.append(Message::user(raw));
        self.input.clear();
        self.emit(ConversationEvent::InputCleared);

        let result = self.round_trip(raw).await;
        self.set_state(ControllerState::Idle);

        match result {
            Ok(reply) => {
                self.append(reply);
                info!(history_len = self.store.len(), "turn completed");
                SubmitOutcome::Completed
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "turn failed");
                self.sessions.invalidate();
                self.set_error(Some(err.user_message()));
                SubmitOutcome::Failed(err)
            }
        }
    }

    async fn round_trip(&mut self, raw: &str) -> Result<Message, SubmitError> {
        self.set_state(ControllerState::AwaitingSession);
        let history = self.store.snapshot();
        let prior = &history[..history.len().saturating_sub(1)];
        self.sessions.ensure(prior).await?;

        let outbound = self
            .translator
            .translate(raw, Language::SERVICE, self.language)
            .await?;

        self.set_state(ControllerState::AwaitingResponse);
        let response = self.sessions.send(&outbound).await?;

        let localized = self
            .translator
            .translate(&response, self.language, Language::SERVICE)
            .await?;

        Ok(Message::assistant(sanitize(&localized).into_string()))
    }

    fn append(&mut self, message: Message) {
        self.store.append(message.clone());
        self.emit(ConversationEvent::MessageAppended(message));
    }

    fn set_state(&mut self, state: ControllerState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "controller state");
            self.state = state;
            self.emit(ConversationEvent::StateChanged(state));
        }
    }

    fn set_error(&mut self, error: Option<String>) {
        if self.error != error {
            self.error = error.clone();
            self.emit(ConversationEvent::ErrorChanged(error));
        }
    }

    fn emit(&self, event: ConversationEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
