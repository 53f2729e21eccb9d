//! Backend seam: the two HTTP endpoints the chat client talks to.

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::error::ApiResult;

pub use client::BackendClient;
pub use models::{AgentReply, PollResponse};

/// Submit/poll operations the driver needs from a backend.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit a user query. Any transport failure or non-success status is
    /// an error.
    async fn submit(&self, input: &str) -> ApiResult<()>;

    /// Fetch the current analysis status.
    async fn poll(&self) -> ApiResult<PollResponse>;
}
