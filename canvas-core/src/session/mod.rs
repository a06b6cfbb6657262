//! Chat session state
//!
//! A [`ChatSession`] owns the message transcript, the artifact versions the
//! agent has produced, and the cancellation lifecycle of the in-flight
//! turn. Transport lives behind [`AgentConnector`]; rendering lives with the
//! caller. The session's job is ordering and status: a user message is
//! appended, a pending agent message follows it, and the pending message
//! settles into exactly one of success, error, or aborted.
//!
//! Abort classification happens when the turn settles, not when the user
//! clicks: a response that loses the race to a cancel still lands as
//! `Aborted`, because the token is checked after the connector returns.

pub mod agent;
pub mod editor;

pub use agent::{
    AgentConnector, AgentError, AgentOutput, AgentRequest, CancelToken, InputMessage, MessageRole,
};
pub use editor::{CanvasEditor, EditorOptions};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Success,
    Error,
    Aborted,
}

/// The slice of the artifact the user had selected when sending, kept with
/// the message so the transcript can render the quote later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedArtifact {
    pub text: String,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    User {
        key: Uuid,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        quoted: Option<QuotedArtifact>,
    },
    Agent {
        key: Uuid,
        content: String,
        status: MessageStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        has_artifact: bool,
    },
}

impl ChatMessage {
    pub fn key(&self) -> Uuid {
        match self {
            ChatMessage::User { key, .. } | ChatMessage::Agent { key, .. } => *key,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::User { content, .. } | ChatMessage::Agent { content, .. } => content,
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            ChatMessage::User { .. } => MessageRole::User,
            ChatMessage::Agent { .. } => MessageRole::Agent,
        }
    }
}

/// One canvas revision, keyed by the agent message that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub message_key: Uuid,
    pub markdown: String,
}

/// Parameters for one user turn.
#[derive(Debug, Clone, Default)]
pub struct SendMessageParams {
    pub input: String,
    pub artifact: Option<String>,
    pub selected_text_offset: Option<usize>,
    pub selected_text_length: Option<usize>,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    artifacts: Vec<ArtifactVersion>,
    selected_artifact: Option<Uuid>,
    current_request: Option<CancelToken>,
}

impl ChatSession {
    pub fn new() -> Self {
        ChatSession::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn artifacts(&self) -> &[ArtifactVersion] {
        &self.artifacts
    }

    /// Run one turn to completion: append the user message, stream the
    /// agent's reply into a pending message, and settle its status. Returns
    /// the key of the agent message.
    pub fn send_message(
        &mut self,
        connector: &dyn AgentConnector,
        params: SendMessageParams,
    ) -> Uuid {
        let quoted = quoted_slice(
            params.artifact.as_deref(),
            params.selected_text_offset,
            params.selected_text_length,
        );

        let user_key = Uuid::new_v4();
        self.messages.push(ChatMessage::User {
            key: user_key,
            content: params.input,
            quoted,
        });

        // The request carries the transcript up to and including the new
        // user message; the pending agent message is appended after.
        let request = AgentRequest {
            messages: self
                .messages
                .iter()
                .map(|message| InputMessage {
                    role: message.role(),
                    content: message.content().to_string(),
                })
                .collect(),
            artifact: params.artifact,
            selected_text_offset: params.selected_text_offset,
            selected_text_length: params.selected_text_length,
        };

        let agent_key = Uuid::new_v4();
        self.messages.push(ChatMessage::Agent {
            key: agent_key,
            content: String::new(),
            status: MessageStatus::Pending,
            error: None,
            has_artifact: false,
        });

        let token = CancelToken::new();
        self.current_request = Some(token.clone());
        debug!(message = %agent_key, "dispatching agent request");

        let mut streamed = String::new();
        let result = connector.run(&request, &token, &mut |delta| streamed.push_str(delta));

        let aborted = token.is_aborted();
        self.current_request = None;

        let mut new_artifact = None;
        if let Some(ChatMessage::Agent {
            content,
            status,
            error,
            has_artifact,
            ..
        }) = self.messages.last_mut()
        {
            match result {
                Ok(output) => {
                    *content = output.text;
                    *status = MessageStatus::Success;
                    if let Some(markdown) = output.artifact {
                        *has_artifact = true;
                        new_artifact = Some(markdown);
                    }
                }
                Err(err) => {
                    // Keep whatever streamed in before the failure so a
                    // cancelled turn still shows its partial reply.
                    *content = streamed;
                    *status = if aborted || matches!(err, AgentError::Aborted) {
                        MessageStatus::Aborted
                    } else {
                        MessageStatus::Error
                    };
                    *error = Some(err.to_string());
                    debug!(message = %agent_key, status = ?*status, "agent request settled without output");
                }
            }
        }

        if let Some(markdown) = new_artifact {
            self.artifacts.push(ArtifactVersion {
                message_key: agent_key,
                markdown,
            });
            self.selected_artifact = Some(agent_key);
        }

        agent_key
    }

    /// Flag the in-flight request as aborted. The pending message settles
    /// when the connector notices and returns.
    pub fn cancel(&self) {
        if let Some(token) = &self.current_request {
            debug!("aborting in-flight agent request");
            token.abort();
        }
    }

    pub fn clear(&mut self) {
        self.cancel();
        self.messages.clear();
        self.artifacts.clear();
        self.selected_artifact = None;
        self.current_request = None;
    }

    /// The artifact the canvas should show: the explicitly selected version
    /// if one is set, otherwise the newest.
    pub fn latest_artifact(&self) -> Option<&ArtifactVersion> {
        match self.selected_artifact {
            Some(key) => self
                .artifacts
                .iter()
                .rev()
                .find(|version| version.message_key == key),
            None => self.artifacts.last(),
        }
    }

    /// Switch the canvas to the version keyed by `key`. Returns false when
    /// no such version exists.
    pub fn select_artifact(&mut self, key: Uuid) -> bool {
        if self
            .artifacts
            .iter()
            .any(|version| version.message_key == key)
        {
            self.selected_artifact = Some(key);
            true
        } else {
            false
        }
    }

    /// Write canvas edits back into the version currently shown. Returns
    /// false when there is no artifact to update.
    pub fn update_selected_artifact(&mut self, markdown: String) -> bool {
        let key = match self.selected_artifact {
            Some(key) => Some(key),
            None => self.artifacts.last().map(|version| version.message_key),
        };
        let Some(key) = key else {
            return false;
        };
        if let Some(version) = self
            .artifacts
            .iter_mut()
            .rev()
            .find(|version| version.message_key == key)
        {
            version.markdown = markdown;
            true
        } else {
            false
        }
    }
}

/// Byte-slice the artifact at the selection bounds. Bounds that fall
/// outside the artifact or off a UTF-8 boundary yield no quote rather than
/// a panic; the offsets are a serialization-time heuristic, not an
/// invariant.
fn quoted_slice(
    artifact: Option<&str>,
    offset: Option<usize>,
    length: Option<usize>,
) -> Option<QuotedArtifact> {
    let (artifact, offset, length) = match (artifact, offset, length) {
        (Some(artifact), Some(offset), Some(length)) if length > 0 => (artifact, offset, length),
        _ => return None,
    };
    let end = offset.checked_add(length)?;
    let text = artifact.get(offset..end)?;
    Some(QuotedArtifact {
        text: text.to_string(),
        offset,
        length,
    })
}
