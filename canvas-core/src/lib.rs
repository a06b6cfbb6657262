//! Document tree, markdown transforms, and session state for the canvas editor
//!
//!     This crate is the shell-agnostic core of the canvas tools: a typed node tree,
//!     markdown in both directions, rule driven block transforms (tables assembled from
//!     typed rows being the big one), and the chat/editing session state that sits on top.
//!
//!     TLDR for rule authors:
//!         - The crate never parses or serializes markdown by hand, comrak does both ends.
//!         - A transform rule owns a block shape end to end: it recognizes typed lines,
//!           rewrites the tree, and serializes its blocks on export. See markdown/rule.rs.
//!         - Rules must leave the tree valid at every return, callers do not tolerate a
//!           half rewritten document.
//!         - Test at the rule level with small handmade documents, and at the module level
//!           with import/export round trips.
//!
//! Architecture
//!
//!     The tree model is deliberately small (document/mod.rs): an arena of nodes with
//!     ordered children, one root, and an explicit selection. Sibling links are derived
//!     from the parent's child order so they cannot drift. Everything that looks like an
//!     editor operation is a plain function over that tree, which keeps the whole crate
//!     shell agnostic. No code here may assume a terminal, env vars or std print; that is
//!     the cli's business.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── document
//!     │   ├── mod.rs              # Node arena, tree ops, text projection
//!     │   └── selection.rs        # Anchor/focus points over the tree
//!     ├── markdown
//!     │   ├── mod.rs              # comrak options, default rule registry
//!     │   ├── export.rs           # tree -> markdown (builds the comrak AST)
//!     │   ├── import.rs           # markdown -> tree (walks the comrak AST)
//!     │   ├── extract.rs          # markdown for arbitrary node lists
//!     │   ├── range.rs            # selection-scoped serialization
//!     │   ├── rule.rs             # TransformRule trait and dispatch
//!     │   ├── table.rs            # the table rule
//!     │   └── shortcuts.rs        # heading / quote line shortcuts
//!     ├── session
//!     │   ├── mod.rs              # chat transcript and artifact versions
//!     │   ├── agent.rs            # connector trait, cancel token
//!     │   └── editor.rs           # debounced canvas editing session
//!     └── lib.rs
//!
//! Core Algorithms
//!
//!     The hard part is table assembly (markdown/table.rs). When a typed line turns out to
//!     be a table row or divider, the rule walks sibling paragraphs backwards and line
//!     segments forward, consumes everything that still parses as a row, and replaces the
//!     lot with one native table node. The same rule serializes tables back out, so the
//!     exporter proper never learns about row syntax.
//!
//!     Selection scoped export (markdown/range.rs) never mutates the source document. The
//!     in-range nodes are projected into a scratch document with the boundary text runs
//!     sliced by char offset, and the ordinary exporter runs over the copy. This is also
//!     what keeps rule owned blocks (table rows etc) rendering the same way inside a
//!     selection as they do in a full export.
//!
//! Library Choices
//!
//!     comrak does all markdown parsing and serialization. We only build and walk its AST;
//!     the hand written row/divider regexes exist solely because a typed table line is not
//!     markdown yet at the moment it is typed. uuid keys chat messages and artifact
//!     versions, tracing carries diagnostics, and serde sits on the session types so a
//!     shell can persist transcripts. Nothing here shells out.

pub mod document;
pub mod error;
pub mod markdown;
pub mod session;

pub use document::{Document, NodeId, NodeKind, Point, Selection, TextFormat};
pub use error::CanvasError;
pub use markdown::{
    default_rules, export_markdown, import_markdown, markdown_content, selected_markdown,
    RuleOutcome, RuleSet, TransformRule,
};
pub use session::{
    AgentConnector, AgentError, AgentOutput, AgentRequest, CancelToken, CanvasEditor, ChatMessage,
    ChatSession, EditorOptions, MessageStatus, SendMessageParams,
};
