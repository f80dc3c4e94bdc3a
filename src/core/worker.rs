//! Runs the conversation controller on its own task.
//!
//! The display surface never touches history or the session directly: it
//! sends commands and mirrors whatever events come back. Commands are handled
//! one at a time, so a submission that arrives while another turn is in flight
//! waits in the channel instead of racing it.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::controller::{ConversationController, ConversationEvent, SubmitOutcome};
use crate::core::preferences::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationCommand {
    Submit(String),
    SetLanguage(Language),
    Prewarm,
}

/// Handle held by the display surface.
pub struct ConversationHandle {
    commands: mpsc::UnboundedSender<ConversationCommand>,
    events: mpsc::UnboundedReceiver<ConversationEvent>,
    task: JoinHandle<()>,
}

impl ConversationHandle {
    /// Queue a command. Returns false once the worker has stopped.
    pub fn send(&self, command: ConversationCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn try_next_event(&mut self) -> Option<ConversationEvent> {
        self.events.try_recv().ok()
    }

    pub async fn next_event(&mut self) -> Option<ConversationEvent> {
        self.events.recv().await
    }

    /// Stop accepting commands and wait for the in-flight one to finish.
    pub async fn shutdown(self) {
        let ConversationHandle {
            commands,
            events,
            task,
        } = self;
        drop(commands);
        drop(events);
        let _ = task.await;
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Spawn `controller` on the current runtime.
///
/// Replaces any event sink the controller already had.
pub fn spawn(controller: ConversationController) -> ConversationHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let controller = controller.with_events(event_tx);
    let task = tokio::spawn(run(controller, command_rx));
    ConversationHandle {
        commands: command_tx,
        events: event_rx,
        task,
    }
}

async fn run(
    mut controller: ConversationController,
    mut commands: mpsc::UnboundedReceiver<ConversationCommand>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            ConversationCommand::Submit(text) => {
                let outcome = controller.submit(&text).await;
                if matches!(outcome, SubmitOutcome::Busy) {
                    debug!("submission dropped while busy");
                }
            }
            ConversationCommand::SetLanguage(language) => controller.set_language(language),
            ConversationCommand::Prewarm => controller.prewarm().await,
        }
    }
    debug!("conversation worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::controller::ControllerState;
    use crate::core::message::Role;
    use crate::core::session::SessionManager;
    use crate::core::translate::IdentityTranslator;
    use crate::utils::test_utils::ScriptedBackend;
    use std::sync::Arc;
    use std::time::Duration;

    fn spawn_with(backend: &ScriptedBackend) -> ConversationHandle {
        let sessions = SessionManager::new(Arc::new(backend.clone()), Duration::from_secs(5));
        spawn(ConversationController::new(
            sessions,
            Arc::new(IdentityTranslator),
        ))
    }

    async fn collect_until_idle_after_reply(
        handle: &mut ConversationHandle,
        replies: usize,
    ) -> Vec<ConversationEvent> {
        let mut events = Vec::new();
        let mut seen = 0;
        while let Some(event) = handle.next_event().await {
            let done = matches!(&event, ConversationEvent::MessageAppended(m) if m.is_assistant());
            events.push(event);
            if done {
                seen += 1;
                if seen == replies {
                    break;
                }
            }
        }
        events
    }

    #[tokio::test]
    async fn queued_submissions_run_in_order() {
        let backend = ScriptedBackend::new().reply("first").reply("second");
        let mut handle = spawn_with(&backend);

        assert!(handle.send(ConversationCommand::Submit("one".into())));
        assert!(handle.send(ConversationCommand::Submit("two".into())));

        let events = collect_until_idle_after_reply(&mut handle, 2).await;
        let appended: Vec<(Role, String)> = events
            .iter()
            .filter_map(|event| match event {
                ConversationEvent::MessageAppended(m) => Some((m.role(), m.text().to_string())),
                _ => None,
            })
            .collect();
        assert_eq!(
            appended,
            vec![
                (Role::User, "one".to_string()),
                (Role::Assistant, "first".to_string()),
                (Role::User, "two".to_string()),
                (Role::Assistant, "second".to_string()),
            ]
        );
        assert_eq!(backend.seeds()[1].len(), 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn prewarm_builds_the_empty_session() {
        let backend = ScriptedBackend::new();
        let mut handle = spawn_with(&backend);

        handle.send(ConversationCommand::Prewarm);
        handle.send(ConversationCommand::Submit("hi".into()));
        let events = collect_until_idle_after_reply(&mut handle, 1).await;

        assert_eq!(backend.seeds(), vec![Vec::new()]);
        assert!(events.contains(&ConversationEvent::StateChanged(ControllerState::Idle)));
        handle.shutdown().await;
    }
}
