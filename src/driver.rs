//! Submission and poll loop for a single send.
//!
//! A [`PollTask`] owns one spawned tokio task: it submits the query, then
//! polls on a fixed interval until the backend returns a terminal response
//! or a call fails. Outcomes are reported over a channel so that all
//! conversation state stays on the event loop that owns it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::api::{AgentReply, AnalysisBackend};
use crate::error::ApiError;

/// Outcome of a send, delivered to the session
#[derive(Debug)]
pub enum DriverEvent {
    /// The submission call failed; no polling happened.
    SubmitFailed(ApiError),
    /// A poll call failed or returned an unreadable body.
    PollFailed(ApiError),
    /// Terminal response with the replies in payload order.
    Completed(Vec<AgentReply>),
}

/// Handle to the background task driving one send
pub struct PollTask {
    handle: Option<JoinHandle<()>>,
}

impl PollTask {
    pub fn start(
        backend: Arc<dyn AnalysisBackend>,
        input: String,
        every: Duration,
        events: mpsc::UnboundedSender<DriverEvent>,
    ) -> Self {
        let handle = tokio::spawn(drive(backend, input, every, events));
        Self {
            handle: Some(handle),
        }
    }

    /// Abort the task if it is still running
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn drive(
    backend: Arc<dyn AnalysisBackend>,
    input: String,
    every: Duration,
    events: mpsc::UnboundedSender<DriverEvent>,
) {
    if let Err(err) = backend.submit(&input).await {
        tracing::warn!(error = %err, "submission failed");
        let _ = events.send(DriverEvent::SubmitFailed(err));
        return;
    }

    tracing::info!(interval_ms = every.as_millis() as u64, "submission sent, polling for result");

    // First poll fires one interval after the submission.
    let mut ticker = time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts: u64 = 0;
    loop {
        ticker.tick().await;
        attempts += 1;

        match backend.poll().await {
            Ok(response) if response.is_terminal() => {
                let replies = response.replies();
                tracing::info!(attempts, replies = replies.len(), "analysis result received");
                let _ = events.send(DriverEvent::Completed(replies));
                return;
            }
            Ok(response) => {
                tracing::debug!(attempts, status = ?response.status, "result not ready");
            }
            Err(err) => {
                let _ = events.send(DriverEvent::PollFailed(err));
                return;
            }
        }
    }
}
