//! Scripted in-memory backend for unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::models::{AnalysisEntry, AnalysisResult, PollResponse, STATUS_WAITING};
use crate::api::AnalysisBackend;
use crate::error::{ApiError, ApiResult};

pub enum PollStep {
    Respond(PollResponse),
    Fail,
}

impl PollStep {
    pub fn waiting() -> Self {
        PollStep::Respond(PollResponse {
            status: Some(STATUS_WAITING.into()),
            analysis_result: None,
        })
    }

    pub fn done(entries: &[(&str, &str)]) -> Self {
        let analysis = entries
            .iter()
            .map(|(name, content)| {
                Some(AnalysisEntry {
                    name: Some((*name).into()),
                    content: Some((*content).into()),
                })
            })
            .collect();

        PollStep::Respond(PollResponse {
            status: Some("done".into()),
            analysis_result: Some(AnalysisResult {
                analysis: Some(analysis),
            }),
        })
    }
}

/// Plays back poll steps in order, then reports `waiting` forever.
pub struct ScriptedBackend {
    submit_ok: bool,
    steps: Mutex<VecDeque<PollStep>>,
    inputs: Mutex<Vec<String>>,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<PollStep>) -> Self {
        Self {
            submit_ok: true,
            steps: Mutex::new(steps.into()),
            inputs: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_submit() -> Self {
        Self {
            submit_ok: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn submit(&self, input: &str) -> ApiResult<()> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());

        if self.submit_ok {
            Ok(())
        } else {
            Err(ApiError::Status {
                endpoint: crate::api::client::SEND_REQUEST_PATH,
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            })
        }
    }

    async fn poll(&self) -> ApiResult<PollResponse> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(PollStep::Respond(response)) => Ok(response),
            Some(PollStep::Fail) => Err(ApiError::Decode {
                endpoint: crate::api::client::GET_RESPONSE_PATH,
                source: serde_json::from_str::<PollResponse>("<html>").unwrap_err(),
            }),
            None => Ok(PollResponse {
                status: Some(STATUS_WAITING.into()),
                analysis_result: None,
            }),
        }
    }
}
