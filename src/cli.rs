use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "migration-assistant",
    disable_version_flag = true,
    about = "Scans a codebase for driver API usages that are deprecated or removed in a target driver version",
    long_about = "Scans a codebase for driver API usages that are deprecated or removed in a target \
driver version and points at where action is needed. It does not rewrite code.\n\n\
Some hits may be false positives. Implicit calls and hard-to-parse expressions are not \
surfaced by the default parser; use --regex-parser to broaden the search."
)]
pub struct Args {
    /// Files, directories or glob patterns to scan
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Language of the project (python, go, javascript, java, dotnet)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Lines of context shown before and after each hit [default: 3]
    #[arg(short, long, value_name = "N")]
    pub context_lines: Option<usize>,

    /// Library version to check compatibility against [default: 6.0]
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Match with line regexes instead of syntax trees (more hits, more false positives)
    #[arg(short = 'R', long)]
    pub regex_parser: bool,

    /// Include acknowledged hits in the output
    #[arg(long)]
    pub show_ignored: bool,

    /// Acknowledge every hit shown in this run so later runs hide it
    #[arg(long)]
    pub ignore_all: bool,

    /// Rule catalog (JSON) to use instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Suppression store [default: .migration-assistant-ignore]
    #[arg(long, value_name = "FILE")]
    pub ignore_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Path to configuration file [default: .migration-assistant.yml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Print the catalog rules for the language, then exit
    #[arg(long)]
    pub list_rules: bool,
}
