// Command-line interface for canvas documents
//
// This binary provides commands for normalizing and inspecting canvas markdown files.
//
// The inspect command is an internal tool for aid in the development of the canvas ecosystem; the
// views it renders are the same document trees the editor holds in memory.
//
// The main role for the canvas program is to interface with canvas content: normalizing it through
// an import/export round trip, inspecting the imported tree, and extracting selection-scoped
// markdown. The core capabilities use the canvas-core crate.
//
// Normalizing:
//
// fmt imports the markdown (running the block transform rules, so typed-style table rows become
// native tables) and re-serializes it. It is the default command, so the subcommand name can be
// omitted when the first argument is a file.
// Usage:
//  canvas <input> [-o <file>]              - Normalize a markdown file (default)
//  canvas fmt <input> [-o <file>]          - Same as above (explicit)
//  canvas inspect <path> [<view>]          - Render a document view (defaults to "tree")
//  canvas quote <input> <offset> <length>  - Markdown for a plain-text range
//  canvas --list-views                     - List available inspect views
//
// Extra Parameters:
//
// View- and format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix and maps the parameters onto the configuration.
// Example:
//  canvas inspect file.md --extra-node-ids false --extra-preview-length 20

mod views;

use canvas_config::{CanvasConfig, Loader};
use canvas_core::document::Selection;
use canvas_core::markdown::{default_rules, export_markdown, import_markdown, RuleSet};
use canvas_core::session::{CanvasEditor, EditorOptions};
use clap::{Arg, ArgAction, Command, ValueHint};
use std::collections::HashMap;
use std::fs;

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            // Found an extra-* argument
            // Check if the next arg is a value or another flag/end
            let has_value = if i + 1 < args.len() {
                let next = &args[i + 1];
                !next.starts_with('-') && !next.starts_with("--")
            } else {
                false
            };

            if has_value {
                // Explicit value provided
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2; // Skip both the key and value
            } else {
                // No value, treat as boolean flag (default to "true")
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("canvas")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for normalizing and inspecting canvas markdown files")
        .long_about(
            "canvas is a command-line tool for working with canvas markdown documents.\n\n\
            Commands:\n  \
            - fmt:     Normalize a markdown file through an import/export round trip\n  \
            - inspect: View the imported document tree (tree, blocks, text)\n  \
            - quote:   Extract the markdown for a plain-text offset range\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to pass view-specific options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            canvas draft.md                         # Normalize to stdout ('fmt' is optional)\n  \
            canvas fmt draft.md -o clean.md         # Normalize into a file\n  \
            canvas inspect draft.md                 # View the document tree\n  \
            canvas inspect draft.md blocks          # Top-level block summary as JSON\n  \
            canvas quote draft.md 10 14             # Markdown for 14 chars from offset 10",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-views")
                .long("list-views")
                .help("List available inspect views")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a canvas.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("fmt")
                .about("Normalize a markdown file (default command)")
                .long_about(
                    "Normalize a markdown file through an import/export round trip.\n\n\
                    The file is imported into the canvas document tree (applying the block\n\
                    transform rules, so typed-style table rows are promoted to native\n\
                    tables) and serialized back to markdown.\n\n\
                    Output goes to stdout by default, or use -o to specify a file.\n\n\
                    Examples:\n  \
                    canvas fmt draft.md                   # Normalize to stdout\n  \
                    canvas fmt draft.md -o clean.md       # Normalize into a file\n  \
                    canvas fmt draft.md --extra-no-promote  # Skip block promotion",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect the document tree of a markdown file")
                .long_about(
                    "View the document tree a markdown file imports into.\n\n\
                    Views:\n  \
                    - tree:   One node per line, indented by depth (default)\n  \
                    - blocks: Top-level block summary as JSON\n  \
                    - text:   Plain-text projection of the document\n\n\
                    Extra Parameters:\n  \
                    --extra-node-ids [bool]        Show numeric node ids (tree view)\n  \
                    --extra-show-formats [bool]    Show style bits on text nodes (tree view)\n  \
                    --extra-preview-length <n>     Longest text excerpt before truncation\n\n\
                    Examples:\n  \
                    canvas inspect draft.md                      # Tree view (default)\n  \
                    canvas inspect draft.md blocks               # JSON block summary\n  \
                    canvas inspect draft.md --extra-node-ids false",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("view")
                        .help("View to render. Defaults to 'tree'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            views::AVAILABLE_VIEWS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("quote")
                .about("Extract the markdown for a plain-text range")
                .long_about(
                    "Serialize just the content covered by a plain-text range.\n\n\
                    The offset and length count characters in the document's plain-text\n\
                    projection (the 'text' inspect view). The output keeps inline markers,\n\
                    so quoting half a bold run still yields well-formed markdown.\n\n\
                    With --json, the output is a JSON object carrying the markdown plus the\n\
                    byte offset and length of the quote within the serialized document.\n\n\
                    Examples:\n  \
                    canvas quote draft.md 10 14             # Markdown for 14 chars from offset 10\n  \
                    canvas quote draft.md 0 5 --json        # Machine-readable quote with bounds",
                )
                .arg(
                    Arg::new("input")
                        .help("Path to the markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("offset")
                        .help("Start of the range (characters)")
                        .required(true)
                        .index(2)
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("length")
                        .help("Length of the range (characters)")
                        .required(true)
                        .index(3)
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit JSON with the markdown and its byte bounds in the serialized document")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    // Try to parse args. If no subcommand is provided, inject "fmt"
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, mut extra_params) = parse_extra_args(&args);

    // First, try normal parsing with cleaned args
    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            // Check if this is a "missing subcommand" error by seeing if the first arg looks like a file
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && cleaned_args[1] != "fmt"
                && cleaned_args[1] != "inspect"
                && cleaned_args[1] != "quote"
                && cleaned_args[1] != "help"
            {
                // Inject "fmt" as the subcommand
                let mut new_args = vec![cleaned_args[0].clone(), "fmt".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                // Try parsing again with "fmt" injected
                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                // Not a case where we should inject fmt, show original error
                e.exit();
            }
        }
    };

    if matches.get_flag("list-views") {
        handle_list_views_command();
        return;
    }

    let mut config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    apply_config_overrides(&mut config, &mut extra_params);

    for key in extra_params.keys() {
        eprintln!("Warning: unused extra parameter --extra-{key}");
    }

    match matches.subcommand() {
        Some(("fmt", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_fmt_command(input, output, &config);
        }
        Some(("inspect", sub_matches)) => {
            let path = sub_matches
                .get_one::<String>("path")
                .expect("path is required");
            let view = sub_matches
                .get_one::<String>("view")
                .map(|s| s.as_str())
                .unwrap_or("tree");
            handle_inspect_command(path, view, &config);
        }
        Some(("quote", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let offset = *sub_matches
                .get_one::<usize>("offset")
                .expect("offset is required");
            let length = *sub_matches
                .get_one::<usize>("length")
                .expect("length is required");
            let json = sub_matches.get_flag("json");
            handle_quote_command(input, offset, length, json, &config);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// Handle the fmt command
fn handle_fmt_command(input: &str, output: Option<&str>, config: &CanvasConfig) {
    let source = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading file '{input}': {e}");
        std::process::exit(1);
    });

    let rules = rules_from_config(config);
    let doc = import_markdown(&source, &rules);
    let markdown = export_markdown(&doc, &rules).unwrap_or_else(|e| {
        eprintln!("Serialization error: {e}");
        std::process::exit(1);
    });

    match output {
        Some(path) => {
            fs::write(path, markdown + "\n").unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        None => println!("{markdown}"),
    }
}

/// Handle the inspect command
fn handle_inspect_command(path: &str, view: &str, config: &CanvasConfig) {
    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    });

    let output = views::render_view(&source, view, config).unwrap_or_else(|e| {
        eprintln!("Execution error: {e}");
        std::process::exit(1);
    });

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
}

/// Handle the quote command
fn handle_quote_command(input: &str, offset: usize, length: usize, json: bool, config: &CanvasConfig) {
    let source = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading file '{input}': {e}");
        std::process::exit(1);
    });

    let options = EditorOptions::from(&config.editor);
    let editor = CanvasEditor::from_markdown(&source, options);
    let doc = editor.document();

    let start_point = doc.resolve_text_point(offset).unwrap_or_else(|| {
        eprintln!("Offset {offset} is outside the document");
        std::process::exit(1);
    });
    let end = offset.saturating_add(length);
    let end_point = doc.resolve_text_point(end).unwrap_or_else(|| {
        eprintln!("Offset {end} is outside the document");
        std::process::exit(1);
    });

    let selection = Selection::new(start_point, end_point);
    let markdown = editor.selected_markdown(&selection).unwrap_or_else(|e| {
        eprintln!("Selection error: {e}");
        std::process::exit(1);
    });

    if json {
        let (byte_offset, byte_length) = editor.quoted_bounds(&selection).unwrap_or_else(|e| {
            eprintln!("Selection error: {e}");
            std::process::exit(1);
        });
        let quote = serde_json::json!({
            "markdown": markdown,
            "offset": byte_offset,
            "length": byte_length,
        });
        println!("{quote}");
    } else {
        println!("{markdown}");
    }
}

/// Handle the list-views command
fn handle_list_views_command() {
    println!("Available views:\n");
    println!("  tree    - Document tree, one node per line (default)");
    println!("  blocks  - Top-level block summary as JSON");
    println!("  text    - Plain-text projection of the document\n");

    println!("View-specific extra parameters:");
    println!("  --extra-node-ids [bool]        Show numeric node ids (tree)");
    println!("  --extra-show-formats [bool]    Show style bits on text nodes (tree)");
    println!("  --extra-preview-length <n>     Longest text excerpt before truncation");
}

fn load_cli_config(explicit_path: Option<&str>) -> CanvasConfig {
    let loader = Loader::new().with_optional_file("canvas.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn rules_from_config(config: &CanvasConfig) -> RuleSet {
    if config.format.promote {
        default_rules()
    } else {
        RuleSet::new()
    }
}

fn apply_config_overrides(config: &mut CanvasConfig, extra_params: &mut HashMap<String, String>) {
    let promote_flag =
        take_override(extra_params, &["promote"]).map(|raw| parse_bool_arg("promote", &raw));
    let no_promote = extra_params
        .remove("no-promote")
        .map(|raw| parse_bool_arg("no-promote", &raw))
        .unwrap_or(false);

    if let Some(promote) = promote_flag {
        if promote && no_promote {
            eprintln!("Conflicting promotion overrides: --extra-promote and --extra-no-promote");
            std::process::exit(1);
        }
        config.format.promote = promote;
    }
    if no_promote {
        config.format.promote = false;
    }

    if let Some(raw) = take_override(extra_params, &["node-ids", "nodeids"]) {
        config.inspect.tree.show_node_ids = parse_bool_arg("node-ids", &raw);
    }
    if let Some(raw) = take_override(extra_params, &["show-formats", "formats"]) {
        config.inspect.tree.show_formats = parse_bool_arg("show-formats", &raw);
    }
    if let Some(raw) = take_override(extra_params, &["preview-length", "preview"]) {
        config.inspect.preview.max_text_length = parse_usize_arg("preview-length", &raw);
    }
    if let Some(raw) = take_override(extra_params, &["debounce-ms", "debounce"]) {
        config.editor.debounce_ms = parse_u64_arg("debounce-ms", &raw);
    }
}

fn take_override(map: &mut HashMap<String, String>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = map.remove(*key) {
            return Some(value);
        }
    }
    None
}

fn parse_bool_arg(flag: &str, raw: &str) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        other => {
            eprintln!("Invalid boolean value '{other}' for --extra-{flag}");
            std::process::exit(1);
        }
    }
}

fn parse_usize_arg(flag: &str, raw: &str) -> usize {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid numeric value '{raw}' for --extra-{flag}");
        std::process::exit(1);
    })
}

fn parse_u64_arg(flag: &str, raw: &str) -> u64 {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid numeric value '{raw}' for --extra-{flag}");
        std::process::exit(1);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extra_args_empty() {
        let args = vec![
            "canvas".to_string(),
            "inspect".to_string(),
            "file.md".to_string(),
        ];
        let (cleaned, extra) = parse_extra_args(&args);

        assert_eq!(cleaned, args);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_parse_extra_args_single_param() {
        let args = vec![
            "canvas".to_string(),
            "inspect".to_string(),
            "file.md".to_string(),
            "--extra-node-ids".to_string(),
            "false".to_string(),
        ];
        let (cleaned, extra) = parse_extra_args(&args);

        assert_eq!(
            cleaned,
            vec![
                "canvas".to_string(),
                "inspect".to_string(),
                "file.md".to_string()
            ]
        );
        assert_eq!(extra.len(), 1);
        assert_eq!(extra.get("node-ids"), Some(&"false".to_string()));
    }

    #[test]
    fn test_parse_extra_args_multiple_params() {
        let args = vec![
            "canvas".to_string(),
            "inspect".to_string(),
            "file.md".to_string(),
            "--extra-node-ids".to_string(),
            "false".to_string(),
            "tree".to_string(),
            "--extra-preview-length".to_string(),
            "20".to_string(),
        ];
        let (cleaned, extra) = parse_extra_args(&args);

        assert_eq!(
            cleaned,
            vec![
                "canvas".to_string(),
                "inspect".to_string(),
                "file.md".to_string(),
                "tree".to_string()
            ]
        );
        assert_eq!(extra.len(), 2);
        assert_eq!(extra.get("node-ids"), Some(&"false".to_string()));
        assert_eq!(extra.get("preview-length"), Some(&"20".to_string()));
    }

    #[test]
    fn test_parse_extra_args_boolean_flag() {
        let args = vec![
            "canvas".to_string(),
            "fmt".to_string(),
            "file.md".to_string(),
            "--extra-no-promote".to_string(),
        ];
        let (cleaned, extra) = parse_extra_args(&args);

        assert_eq!(
            cleaned,
            vec![
                "canvas".to_string(),
                "fmt".to_string(),
                "file.md".to_string()
            ]
        );
        assert_eq!(extra.len(), 1);
        assert_eq!(extra.get("no-promote"), Some(&"true".to_string()));
    }

    #[test]
    fn test_parse_extra_args_allows_extras_alias() {
        let args = vec![
            "canvas".to_string(),
            "inspect".to_string(),
            "doc.md".to_string(),
            "--extras-preview-length".to_string(),
            "32".to_string(),
        ];

        let (cleaned, extra) = parse_extra_args(&args);
        assert_eq!(
            cleaned,
            vec![
                "canvas".to_string(),
                "inspect".to_string(),
                "doc.md".to_string()
            ]
        );
        assert_eq!(extra.get("preview-length"), Some(&"32".to_string()));
    }

    #[test]
    fn test_parse_extra_args_mixed_boolean_and_value() {
        let args = vec![
            "canvas".to_string(),
            "inspect".to_string(),
            "file.md".to_string(),
            "--extra-show-formats".to_string(),
            "--extra-preview-length".to_string(),
            "5".to_string(),
            "--extra-node-ids".to_string(),
        ];
        let (cleaned, extra) = parse_extra_args(&args);

        assert_eq!(
            cleaned,
            vec![
                "canvas".to_string(),
                "inspect".to_string(),
                "file.md".to_string()
            ]
        );
        assert_eq!(extra.len(), 3);
        assert_eq!(extra.get("show-formats"), Some(&"true".to_string()));
        assert_eq!(extra.get("preview-length"), Some(&"5".to_string()));
        assert_eq!(extra.get("node-ids"), Some(&"true".to_string()));
    }

    #[test]
    fn apply_config_overrides_updates_known_flags() {
        let mut config = load_cli_config(None);
        let mut extras = HashMap::new();
        extras.insert("no-promote".to_string(), "true".to_string());
        extras.insert("node-ids".to_string(), "false".to_string());
        extras.insert("preview-length".to_string(), "12".to_string());
        extras.insert("debounce-ms".to_string(), "50".to_string());

        apply_config_overrides(&mut config, &mut extras);

        assert!(!config.format.promote);
        assert!(!config.inspect.tree.show_node_ids);
        assert_eq!(config.inspect.preview.max_text_length, 12);
        assert_eq!(config.editor.debounce_ms, 50);
        assert!(extras.is_empty());
    }

    #[test]
    fn apply_config_overrides_accepts_format_aliases() {
        let mut config = load_cli_config(None);
        let mut extras = HashMap::new();
        extras.insert("formats".to_string(), "false".to_string());

        apply_config_overrides(&mut config, &mut extras);

        assert!(!config.inspect.tree.show_formats);
        assert!(extras.is_empty());
    }

    #[test]
    fn rules_from_config_respects_promotion_flag() {
        let mut config = load_cli_config(None);
        assert!(!rules_from_config(&config).rule_names().is_empty());

        config.format.promote = false;
        assert!(rules_from_config(&config).rule_names().is_empty());
    }
}
