pub mod assistant;
pub mod capture;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod fallback;
pub mod formatter;
pub mod fs;
pub mod grammar;
pub mod namespace;
pub mod parse;
pub mod query;
pub mod suppression;
pub mod version;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use assistant::{Assistant, AssistantOptions};
use catalog::Catalog;
use cli::Args;
use config::{Settings, load_config};
use formatter::create_formatter;
use fs::discover_files;

/// Run the assistant. Returns the exit code: 0 = nothing to act on,
/// 1 = unacknowledged findings, 2 = error (reported by the caller).
pub fn run(args: Args) -> Result<i32> {
    let file_config = load_config(args.config.as_deref())?;
    let settings = Settings::resolve(&args, file_config)?;
    debug!(?settings, "resolved settings");

    let catalog = match &settings.catalog {
        Some(path) => Some(Catalog::load(path)?),
        None => None,
    };

    let assistant = Assistant::new(AssistantOptions {
        language: settings.language,
        version: settings.version.clone(),
        context_lines: settings.context_lines,
        mode: settings.mode,
        catalog,
        store_path: settings.ignore_file.clone(),
        library: None,
    })
    .context("invalid configuration")?;

    // --list-rules: print the catalog and exit
    if args.list_rules {
        for rule in assistant.catalog().rules() {
            println!(
                "{}\tdeprecated={}\tremoved={}",
                rule.identifier,
                rule.deprecated.as_deref().unwrap_or("-"),
                rule.removed.as_deref().unwrap_or("-"),
            );
        }
        for e in assistant.catalog_errors() {
            println!("invalid: {e}");
        }
        return Ok(0);
    }

    let files = discover_files(&args.paths, settings.language, &settings.excludes)?;
    debug!(files = files.len(), "discovered files");

    let summary = assistant.run_assistant(&files);

    let formatter = create_formatter(&args.format, settings.language, args.show_ignored);
    formatter.print(&summary).context("failed to write report")?;

    if args.ignore_all {
        let mut added = 0usize;
        for diagnostic in summary.reports.iter().flat_map(|r| &r.diagnostics) {
            if diagnostic.suppressed {
                continue;
            }
            match assistant.suppress(diagnostic) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %settings.ignore_file.display(), "failed to record suppression: {e}"),
            }
        }
        info!(added, store = %settings.ignore_file.display(), "acknowledged findings");
        return Ok(0);
    }

    Ok(if summary.unsuppressed_count() == 0 { 0 } else { 1 })
}
