use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the views from src/views.rs
// We need to duplicate this here since build scripts can't access src/ modules
const AVAILABLE_VIEWS: &[&str] = &["tree", "blocks", "text"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    // Mirror of build_cli from src/main.rs, kept to the surface the
    // completion scripts need (names, arguments, value hints).
    let mut cmd = Command::new("canvas")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for normalizing and inspecting canvas markdown files")
        .arg_required_else_help(true)
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
                        .value_parser(clap::builder::PossibleValuesParser::new(AVAILABLE_VIEWS))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("quote")
                .about("Extract the markdown for a plain-text range")
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
                        .index(2),
                )
                .arg(
                    Arg::new("length")
                        .help("Length of the range (characters)")
                        .required(true)
                        .index(3),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit JSON with the markdown and its byte bounds")
                        .action(ArgAction::SetTrue),
                ),
        );

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "canvas", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "canvas", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "canvas", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
