use std::thread;
use std::time::Duration;

use canvas_core::document::{Point, Selection};
use canvas_core::session::{
    AgentConnector, AgentError, AgentOutput, AgentRequest, CancelToken, CanvasEditor, ChatMessage,
    ChatSession, EditorOptions, MessageStatus, SendMessageParams,
};

use crate::common;

/// Produces a canvas on the first turn and appends to the carried canvas on
/// follow-up turns.
struct DraftingConnector;

impl AgentConnector for DraftingConnector {
    fn run(
        &self,
        request: &AgentRequest,
        _cancel: &CancelToken,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<AgentOutput, AgentError> {
        on_delta("Drafted.");
        let artifact = match &request.artifact {
            Some(current) => format!("{current}\n\nRevised."),
            None => "# Notes\n\n| a | b |\n| c | d |".to_string(),
        };
        Ok(AgentOutput {
            text: "Drafted.".to_string(),
            artifact: Some(artifact),
        })
    }
}

struct AbortingConnector;

impl AgentConnector for AbortingConnector {
    fn run(
        &self,
        _request: &AgentRequest,
        cancel: &CancelToken,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<AgentOutput, AgentError> {
        on_delta("partial ");
        cancel.abort();
        Err(AgentError::Aborted)
    }
}

#[test]
fn artifact_flows_from_chat_to_canvas_and_back() {
    let mut session = ChatSession::new();
    session.send_message(
        &DraftingConnector,
        SendMessageParams {
            input: "draft a comparison".to_string(),
            ..Default::default()
        },
    );

    let artifact = session.latest_artifact().expect("first turn's canvas");
    assert_eq!(artifact.markdown, "# Notes\n\n| a | b |\n| c | d |");

    // Open the canvas in the editor; the pasted rows arrive as a real table.
    let mut editor = CanvasEditor::from_markdown(&artifact.markdown, EditorOptions::default());
    assert_eq!(
        common::block_kinds(editor.document()),
        vec!["heading", "table"]
    );

    // A typed row joins the table, and the revision lands back in the
    // session's selected version.
    editor.append_line("| e | f |");
    let table = editor.document().children(editor.document().root())[1];
    assert_eq!(editor.document().child_count(table), 3);

    let revised = editor.flush().expect("flush to serialize");
    assert_eq!(revised, "# Notes\n\n| a | b |\n| c | d |\n| e | f |");
    assert!(session.update_selected_artifact(revised.clone()));

    // The follow-up turn carries the revised canvas.
    session.send_message(
        &DraftingConnector,
        SendMessageParams {
            input: "add a closing line".to_string(),
            artifact: Some(revised.clone()),
            ..Default::default()
        },
    );

    assert_eq!(session.messages().len(), 4);
    let latest = session.latest_artifact().expect("second turn's canvas");
    assert_eq!(latest.markdown, format!("{revised}\n\nRevised."));
}

#[test]
fn quoted_canvas_selection_reaches_the_transcript() {
    let mut editor =
        CanvasEditor::from_markdown("Hello **world** out there", EditorOptions::default());

    let paragraph = editor.document().children(editor.document().root())[0];
    let bold = editor.document().children(paragraph)[1];
    let selection = Selection::new(Point::new(bold, 0), Point::new(bold, 5));

    let (offset, length) = editor.quoted_bounds(&selection).expect("bounds to resolve");
    let artifact = editor.flush().expect("flush to serialize");

    let mut session = ChatSession::new();
    session.send_message(
        &DraftingConnector,
        SendMessageParams {
            input: "tighten this".to_string(),
            artifact: Some(artifact),
            selected_text_offset: Some(offset),
            selected_text_length: Some(length),
        },
    );

    match &session.messages()[0] {
        ChatMessage::User {
            quoted: Some(quote),
            ..
        } => {
            assert_eq!(quote.text, "**world**");
            assert_eq!(quote.offset, offset);
            assert_eq!(quote.length, length);
        }
        other => panic!("expected a quoted user message, got {other:?}"),
    }
}

#[test]
fn aborted_turn_leaves_the_canvas_versions_alone() {
    let mut session = ChatSession::new();
    session.send_message(
        &DraftingConnector,
        SendMessageParams {
            input: "draft".to_string(),
            ..Default::default()
        },
    );
    let before = session.latest_artifact().expect("canvas exists").markdown.clone();

    session.send_message(
        &AbortingConnector,
        SendMessageParams {
            input: "never mind".to_string(),
            ..Default::default()
        },
    );

    match session.messages().last() {
        Some(ChatMessage::Agent {
            status,
            content,
            has_artifact,
            ..
        }) => {
            assert_eq!(*status, MessageStatus::Aborted);
            assert_eq!(content, "partial ");
            assert!(!has_artifact);
        }
        other => panic!("expected a settled agent message, got {other:?}"),
    }
    assert_eq!(session.artifacts().len(), 1);
    assert_eq!(session.latest_artifact().expect("canvas kept").markdown, before);
}

#[test]
fn debounced_edits_feed_the_selected_version() {
    let mut session = ChatSession::new();
    session.send_message(
        &DraftingConnector,
        SendMessageParams {
            input: "draft".to_string(),
            ..Default::default()
        },
    );
    let artifact = session.latest_artifact().expect("canvas exists").markdown.clone();

    let options = EditorOptions {
        debounce: Duration::from_millis(40),
    };
    let mut editor = CanvasEditor::from_markdown(&artifact, options);
    editor.append_line("fresh line");

    assert_eq!(editor.poll_markdown().expect("poll"), None);
    thread::sleep(Duration::from_millis(80));

    let revised = editor
        .poll_markdown()
        .expect("poll")
        .expect("debounce elapsed");
    assert!(session.update_selected_artifact(revised.clone()));
    assert_eq!(session.latest_artifact().expect("canvas updated").markdown, revised);
    assert!(revised.ends_with("fresh line"));
}
