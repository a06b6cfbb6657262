//! Agent connector seam
//!
//! The chat session drives one request at a time through an
//! [`AgentConnector`]. Connectors block until the turn settles, streaming
//! partial text through the delta callback on the way, and are expected to
//! check the cancel token at natural pause points and bail out with
//! [`AgentError::Aborted`] once it trips.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag for one in-flight request. Clones observe the same
/// flag, so the session keeps one clone to abort while the connector polls
/// another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    aborted: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// One prior conversation turn, as the connector sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Everything a connector needs for one turn: the conversation so far, the
/// serialized canvas, and the quoted-selection bounds when the user sent a
/// selection along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub messages: Vec<InputMessage>,
    pub artifact: Option<String>,
    pub selected_text_offset: Option<usize>,
    pub selected_text_length: Option<usize>,
}

/// A settled turn: the final reply text and, when the agent produced or
/// rewrote the canvas, a fresh artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub text: String,
    pub artifact: Option<String>,
}

#[derive(Debug)]
pub enum AgentError {
    RequestFailed(String),
    Aborted,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::RequestFailed(msg) => write!(f, "Agent request failed: {msg}"),
            AgentError::Aborted => write!(f, "Agent request aborted"),
        }
    }
}

impl std::error::Error for AgentError {}

/// Transport seam between the session and whatever serves the agent.
pub trait AgentConnector {
    fn run(
        &self,
        request: &AgentRequest,
        cancel: &CancelToken,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<AgentOutput, AgentError>;
}
