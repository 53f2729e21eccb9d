use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::AnalysisBackend;
use crate::conversation::{Conversation, Message, SUBMIT_FAILURE_NOTICE};
use crate::driver::{DriverEvent, PollTask};

/// Transient UI flags for the current session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub draft: String,
    pub is_recording: bool,
    pub is_awaiting: bool,
}

/// How a send ended, as seen by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    SubmitFailed,
    PollFailed,
    Completed { replies: usize },
}

/// Owns the conversation and UI flags, and wires sends to the poll driver.
///
/// All mutation happens on the thread that owns the session. Driver results
/// arrive over a channel and are applied with [`ChatSession::apply`].
pub struct ChatSession {
    conversation: Conversation,
    state: SessionState,
    backend: Arc<dyn AnalysisBackend>,
    poll_interval: Duration,
    events_tx: mpsc::UnboundedSender<DriverEvent>,
    events_rx: mpsc::UnboundedReceiver<DriverEvent>,
    active: Option<PollTask>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn AnalysisBackend>, poll_interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            conversation: Conversation::new(),
            state: SessionState::default(),
            backend,
            poll_interval,
            events_tx,
            events_rx,
            active: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn draft(&self) -> &str {
        &self.state.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.state.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
    }

    pub fn is_awaiting(&self) -> bool {
        self.state.is_awaiting
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording
    }

    /// Flip the microphone flag. Audio capture is not wired up.
    pub fn toggle_recording(&mut self) -> bool {
        self.state.is_recording = !self.state.is_recording;
        tracing::debug!(recording = self.state.is_recording, "microphone toggled");
        self.state.is_recording
    }

    pub fn append(&mut self, message: Message) {
        self.conversation.append(message);
    }

    fn set_awaiting(&mut self, awaiting: bool) {
        self.state.is_awaiting = awaiting;
    }

    /// Send whatever is in the draft.
    pub fn send_draft(&mut self) -> bool {
        let text = self.state.draft.clone();
        self.send(&text)
    }

    /// Record the user message and start the submit/poll cycle.
    ///
    /// Returns `false` without touching any state when `text` is blank or a
    /// previous send is still awaiting its response.
    pub fn send(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.state.is_awaiting {
            return false;
        }

        self.append(Message::user(text));
        self.state.draft.clear();
        self.set_awaiting(true);

        if let Some(mut stale) = self.active.take() {
            stale.stop();
        }
        self.active = Some(PollTask::start(
            Arc::clone(&self.backend),
            text.to_string(),
            self.poll_interval,
            self.events_tx.clone(),
        ));

        tracing::info!(chars = text.chars().count(), "query sent");
        true
    }

    /// Apply a driver outcome to the conversation.
    pub fn apply(&mut self, event: DriverEvent) -> SendOutcome {
        if let Some(mut task) = self.active.take() {
            task.stop();
        }
        self.set_awaiting(false);

        match event {
            DriverEvent::SubmitFailed(err) => {
                tracing::error!(error = %err, "could not submit query");
                self.append(Message::error(SUBMIT_FAILURE_NOTICE));
                SendOutcome::SubmitFailed
            }
            DriverEvent::PollFailed(err) => {
                // Poll failures are only logged; nothing is shown in the chat.
                tracing::error!(error = %err, "error polling response");
                SendOutcome::PollFailed
            }
            DriverEvent::Completed(replies) => {
                let count = replies.len();
                for reply in replies {
                    self.append(Message::from(reply));
                }
                SendOutcome::Completed { replies: count }
            }
        }
    }

    /// Apply every driver event that is already queued. Returns how many
    /// were applied.
    pub fn process_driver_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next driver event without applying it.
    pub async fn next_driver_event(&mut self) -> Option<DriverEvent> {
        self.events_rx.recv().await
    }

    /// Wait until the in-flight send (if any) finishes and report how it
    /// ended. Returns `None` when nothing was in flight.
    pub async fn settle(&mut self) -> Option<SendOutcome> {
        let mut outcome = None;
        while self.state.is_awaiting {
            let event = self.events_rx.recv().await?;
            outcome = Some(self.apply(event));
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{DEFAULT_AGENT_CONTENT, DEFAULT_AGENT_NAME};
    use crate::conversation::MessageKind;
    use crate::testing::{PollStep, ScriptedBackend};

    const TICK: Duration = Duration::from_millis(5);

    fn session(backend: &Arc<ScriptedBackend>) -> ChatSession {
        ChatSession::new(backend.clone(), TICK)
    }

    #[tokio::test]
    async fn send_records_user_message_before_any_network_call() {
        let backend = Arc::new(ScriptedBackend::new(vec![PollStep::done(&[])]));
        let mut session = session(&backend);
        session.set_draft("  What is AAPL's margin?  ");

        assert!(session.send_draft());

        // Nothing has been awaited yet, so the spawned task has not run.
        assert_eq!(backend.submit_calls(), 0);
        assert_eq!(session.conversation().len(), 1);
        let message = &session.conversation().messages()[0];
        assert_eq!(message.kind(), MessageKind::User);
        assert_eq!(message.text(), "  What is AAPL's margin?  ");
        assert!(session.draft().is_empty());
        assert!(session.is_awaiting());

        session.settle().await;
        assert_eq!(backend.inputs(), vec!["  What is AAPL's margin?  ".to_string()]);
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let mut session = session(&backend);

        for input in ["", "   ", "\t\n"] {
            session.set_draft(input);
            assert!(!session.send_draft());
            assert_eq!(session.draft(), input);
        }

        assert!(session.conversation().is_empty());
        assert!(!session.is_awaiting());
        assert_eq!(session.settle().await, None);
        assert_eq!(backend.submit_calls(), 0);
    }

    #[tokio::test]
    async fn send_while_awaiting_is_a_no_op() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let mut session = session(&backend);

        assert!(session.send("first"));
        session.set_draft("second");
        assert!(!session.send_draft());

        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.draft(), "second");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.submit_calls(), 1);
    }

    #[tokio::test]
    async fn submit_failure_appends_one_error_and_never_polls() {
        let backend = Arc::new(ScriptedBackend::failing_submit());
        let mut session = session(&backend);

        session.send("query");
        assert_eq!(session.settle().await, Some(SendOutcome::SubmitFailed));

        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].kind(), MessageKind::Error);
        assert_eq!(messages[1].text(), SUBMIT_FAILURE_NOTICE);
        assert!(!session.is_awaiting());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.poll_calls(), 0);
    }

    #[tokio::test]
    async fn terminal_response_appends_agents_in_order() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            PollStep::waiting(),
            PollStep::waiting(),
            PollStep::done(&[("A", "x"), ("B", "y")]),
        ]));
        let mut session = session(&backend);
        session.send("query");

        // Still awaiting while only waiting responses have come back.
        let event = session.next_driver_event().await.expect("event");
        assert!(session.is_awaiting());
        assert_eq!(session.apply(event), SendOutcome::Completed { replies: 2 });
        assert!(!session.is_awaiting());

        let agents: Vec<_> = session
            .conversation()
            .messages()
            .iter()
            .filter(|m| m.kind() == MessageKind::Agent)
            .map(|m| (m.author().unwrap().to_string(), m.text().to_string()))
            .collect();
        assert_eq!(
            agents,
            vec![("A".to_string(), "x".to_string()), ("B".to_string(), "y".to_string())]
        );
        assert_eq!(backend.poll_calls(), 3);
    }

    #[tokio::test]
    async fn missing_fields_use_defaults() {
        let backend = Arc::new(ScriptedBackend::new(vec![PollStep::Respond(
            serde_json::from_str(
                r#"{"status":"done","analysis_result":{"analysis":[{"content":"c"},{"name":"n"}]}}"#,
            )
            .unwrap(),
        )]));
        let mut session = session(&backend);
        session.send("query");
        session.settle().await;

        let messages = session.conversation().messages();
        assert_eq!(messages[1].author(), Some(DEFAULT_AGENT_NAME));
        assert_eq!(messages[1].text(), "c");
        assert_eq!(messages[2].author(), Some("n"));
        assert_eq!(messages[2].text(), DEFAULT_AGENT_CONTENT);
    }

    #[tokio::test]
    async fn poll_failure_clears_awaiting_without_a_message() {
        let backend = Arc::new(ScriptedBackend::new(vec![PollStep::waiting(), PollStep::Fail]));
        let mut session = session(&backend);
        session.send("query");
        let before = session.conversation().len();

        assert_eq!(session.settle().await, Some(SendOutcome::PollFailed));

        assert!(!session.is_awaiting());
        assert_eq!(session.conversation().len(), before);
    }

    #[tokio::test]
    async fn session_is_ready_again_after_a_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![PollStep::Fail, PollStep::done(&[("A", "x")])]));
        let mut session = session(&backend);

        session.send("first");
        session.settle().await;
        assert!(session.send("second"));
        session.settle().await;

        let kinds: Vec<_> = session.conversation().messages().iter().map(Message::kind).collect();
        assert_eq!(kinds, [MessageKind::User, MessageKind::User, MessageKind::Agent]);
    }

    #[tokio::test]
    async fn process_driver_events_drains_queue() {
        let backend = Arc::new(ScriptedBackend::failing_submit());
        let mut session = session(&backend);
        session.send("query");

        assert_eq!(session.process_driver_events(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.process_driver_events(), 1);
        assert!(!session.is_awaiting());
    }

    #[test]
    fn recording_toggle_only_flips_the_flag() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let mut session = session(&backend);

        assert!(session.toggle_recording());
        assert!(!session.toggle_recording());
        assert!(session.conversation().is_empty());
        assert!(!session.is_awaiting());
    }
}
