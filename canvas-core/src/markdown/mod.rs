//! Markdown transforms over the canvas document tree
//!
//! This module implements bidirectional conversion between the document tree
//! and CommonMark markdown, plus the selection-scoped extraction the canvas
//! toolbar needs.
//!
//! # Library Choice
//!
//! We use the `comrak` crate for markdown parsing and serialization. This
//! choice is based on:
//! - Single crate for both parsing and serialization
//! - Feature-rich with CommonMark compliance
//! - Robust and well-maintained
//! - Supports extensions (tables, strikethrough, autolink)
//!
//! # Element Mapping Table
//!
//! | Tree node        | Markdown equivalent   | Export notes                        | Import notes                          |
//! |------------------|------------------------|-------------------------------------|---------------------------------------|
//! | Paragraph        | Paragraph              | Direct mapping                      | Soft breaks join as spaces            |
//! | Heading          | `#`..`######`          | Level clamped to 6                  | Level preserved                       |
//! | Quote            | `> `                   | Children render as blocks           | Direct mapping                        |
//! | CodeBlock        | Fenced block           | Language → info string              | Info string → language, line nodes    |
//! | List / ListItem  | `-` or `1.`            | Tight lists                         | Ordered start preserved               |
//! | HorizontalRule   | `---`                  | Direct                              | Direct                                |
//! | Table            | `\| a \| b \|` lines   | Rule-owned, divider after header    | Native tables and line promotion      |
//! | Text w/ format   | `**` `*` `` ` `` `~~`  | Nested by bit                       | Bits flattened onto text runs         |
//! | Link             | `[text](url)`          | Direct                              | Autolink on                           |
//! | LineBreak        | Hard break             | Direct                              | Preserved inside table-row paragraphs |
//!
//! # Architecture Notes
//!
//! Export offers every block to the registered transform rules first and
//! falls back to comrak's `format_commonmark` on a single-block document, so
//! the pipe-table shape stays under our control while everything else uses
//! the library serializer. Import parses the whole string with comrak and
//! then runs a promotion pass: top-level paragraphs whose first line matches
//! a rule pattern go through the same replace path that handles typed lines,
//! which is how divider-less pipe tables become real tables.

pub mod export;
pub mod extract;
pub mod import;
pub mod range;
pub mod rule;
pub mod shortcuts;
pub mod table;

pub use export::{export_markdown, export_nodes};
pub use extract::markdown_content;
pub use import::import_markdown;
pub use range::{markdown_up_to, selected_markdown};
pub use rule::{RuleOutcome, RuleSet, TransformRule};
pub use shortcuts::{HeadingRule, QuoteRule};
pub use table::TableRule;

use comrak::ComrakOptions;

pub(crate) fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options
}

/// Rule set registered by default: the table transform plus the heading and
/// quote typed-line shortcuts.
pub fn default_rules() -> RuleSet {
    let mut rules = RuleSet::new();
    rules.register(Box::new(TableRule));
    rules.register(Box::new(HeadingRule));
    rules.register(Box::new(QuoteRule));
    rules
}
