use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::error::{SendError, SessionInitError, TranslationError};
use crate::core::message::{Message, Role};
use crate::core::preferences::Language;
use crate::core::session::{ChatBackend, ChatSession};
use crate::core::translate::Translator;

#[derive(Clone, Debug)]
enum ScriptedReply {
    Text(String),
    Fail(SendError),
    Hang,
}

#[derive(Default)]
struct ScriptState {
    seeds: Vec<Vec<(Role, String)>>,
    sent: Vec<String>,
    replies: VecDeque<ScriptedReply>,
    init_failures: VecDeque<SessionInitError>,
    hang_init: bool,
}

/// In-memory backend that records every seed and send and replays canned
/// outcomes in order. Unscripted sends echo their input.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push_reply(ScriptedReply::Text(text.to_string()));
        self
    }

    pub fn fail_send(self, err: SendError) -> Self {
        self.push_reply(ScriptedReply::Fail(err));
        self
    }

    pub fn hang_send(self) -> Self {
        self.push_reply(ScriptedReply::Hang);
        self
    }

    pub fn fail_init(self, err: SessionInitError) -> Self {
        self.state.lock().unwrap().init_failures.push_back(err);
        self
    }

    /// Every `start_session` call waits forever.
    pub fn hang_init(self) -> Self {
        self.state.lock().unwrap().hang_init = true;
        self
    }

    fn push_reply(&self, reply: ScriptedReply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn seeds(&self) -> Vec<Vec<(Role, String)>> {
        self.state.lock().unwrap().seeds.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn start_session(
        &self,
        seed: &[Message],
    ) -> Result<Box<dyn ChatSession>, SessionInitError> {
        let hang = self.state.lock().unwrap().hang_init;
        if hang {
            std::future::pending::<()>().await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.init_failures.pop_front() {
            return Err(err);
        }
        state.seeds.push(
            seed.iter()
                .map(|message| (message.role(), message.text().to_string()))
                .collect(),
        );
        Ok(Box::new(ScriptedSession {
            state: self.state.clone(),
        }))
    }
}

struct ScriptedSession {
    state: Arc<Mutex<ScriptState>>,
}

#[async_trait]
impl ChatSession for ScriptedSession {
    async fn send_message(&mut self, text: &str) -> Result<String, SendError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.sent.push(text.to_string());
            state.replies.pop_front()
        };
        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(err)) => Err(err),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Ok(format!("echo: {text}")),
        }
    }
}

/// Translator that tags text with its direction so tests can see both calls.
#[derive(Default)]
pub struct TaggingTranslator;

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(
        &self,
        text: &str,
        target: Language,
        source: Language,
    ) -> Result<String, TranslationError> {
        Ok(format!("[{}->{}]{}", source.code(), target.code(), text))
    }
}

/// Translator that always fails.
#[derive(Default)]
pub struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(
        &self,
        _text: &str,
        target: Language,
        source: Language,
    ) -> Result<String, TranslationError> {
        Err(TranslationError {
            source_lang: source.code().to_string(),
            target_lang: target.code().to_string(),
            message: "translator offline".to_string(),
        })
    }
}

pub fn texts(messages: &[Message]) -> Vec<(Role, &str)> {
    messages
        .iter()
        .map(|message| (message.role(), message.text()))
        .collect()
}
