use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status value the backend reports while no analysis is ready.
pub const STATUS_WAITING: &str = "waiting";

/// Author shown when an analysis entry has no name.
pub const DEFAULT_AGENT_NAME: &str = "Agent";

/// Text shown when an analysis entry has no content.
pub const DEFAULT_AGENT_CONTENT: &str = "No content available";

/// Body of `POST /api/send-request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub input: String,
}

impl SubmitRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self { input: input.into() }
    }
}

/// Body of `GET /api/get-response`
///
/// Scalar fields are kept as raw JSON so that an odd type in one entry does
/// not make the whole body unreadable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub analysis_result: Option<AnalysisResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub analysis: Option<Vec<Option<AnalysisEntry>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisEntry {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

/// One agent reply extracted from a terminal poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub author: String,
    pub text: String,
}

impl PollResponse {
    /// A response ends the poll loop once the backend stops reporting
    /// `waiting` and a result payload is attached.
    pub fn is_terminal(&self) -> bool {
        !self.is_waiting() && self.analysis_result.is_some()
    }

    /// Only the exact string `waiting` counts; any other value does not.
    pub fn is_waiting(&self) -> bool {
        matches!(&self.status, Some(Value::String(status)) if status == STATUS_WAITING)
    }

    /// Agent replies in payload order. Null entries are skipped; a missing
    /// `analysis` list yields no replies.
    pub fn replies(&self) -> Vec<AgentReply> {
        let Some(entries) = self
            .analysis_result
            .as_ref()
            .and_then(|result| result.analysis.as_ref())
        else {
            return Vec::new();
        };

        entries.iter().flatten().map(AgentReply::from).collect()
    }
}

impl From<&AnalysisEntry> for AgentReply {
    fn from(entry: &AnalysisEntry) -> Self {
        Self {
            author: display_text(entry.name.as_ref()).unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
            text: display_text(entry.content.as_ref())
                .unwrap_or_else(|| DEFAULT_AGENT_CONTENT.to_string()),
        }
    }
}

// Null and empty strings fall back to the defaults just like missing fields.
// Other JSON values are shown as written.
fn display_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
