//! Command-line interface module for dirsorter.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (`clap` derive)
//! - Loading configuration and building the extension table
//! - Turning `--ext` / `--category` options into an extension selection
//! - Running scans, dry runs and relocation batches, and reporting results

use crate::config::{CompiledFilters, SorterConfig};
use crate::error::{SortError, SortResult};
use crate::file_category::{ExtensionTable, normalize_extension};
use crate::output::{BarProgress, OutputFormatter};
use crate::relocator::{NoProgress, RelocationReport, Relocator};
use crate::scanner::Scanner;
use clap::{ArgAction, Parser, Subcommand};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sort the files of a directory into per-category subfolders.
#[derive(Debug, Parser)]
#[command(name = "dirsorter", version, about)]
pub struct Cli {
    /// Configuration file (defaults to ./.dirsorter.toml, then ~/.config/dirsorter/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Count the recognized files of a directory by extension.
    Scan {
        path: PathBuf,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Move recognized files into per-category subfolders.
    Sort {
        path: PathBuf,

        /// Extension to sort (repeatable), e.g. `--ext jpg --ext .pdf`.
        #[arg(short = 'e', long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Sort every extension of a category (repeatable).
        #[arg(short = 'c', long = "category", value_name = "NAME")]
        categories: Vec<String>,

        /// Show what would be moved without touching anything.
        #[arg(long)]
        dry_run: bool,

        /// Hide the progress bar.
        #[arg(long)]
        no_progress: bool,
    },
    /// List supported extensions by category.
    Extensions {
        /// Print the table as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Runs a parsed command line.
///
/// Loads configuration, builds the extension table and dispatches to the
/// subcommand. Per-file failures of a batch are printed here; the returned
/// error still carries them so the caller can pick an exit code.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsorter::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["dirsorter", "sort", "/path/to/Downloads", "--dry-run"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> SortResult<()> {
    let config = SorterConfig::load(cli.config.as_deref())?;
    let table = config.extension_table()?;
    let filters = config.compile_filters()?;

    match &cli.command {
        Command::Scan { path, json } => scan_directory(path, &table, &filters, *json),
        Command::Sort {
            path,
            extensions,
            categories,
            dry_run,
            no_progress,
        } => {
            let selection = resolve_selection(&table, extensions, categories)?;
            sort_directory(path, &table, &filters, &selection, *dry_run, !*no_progress)
        }
        Command::Extensions { json } => list_extensions(&table, *json),
    }
}

/// Builds the set of selected extensions from `--ext` and `--category`.
///
/// With neither option every extension of the table is selected. Extensions
/// that are valid but absent from the table are dropped with a warning.
///
/// # Errors
///
/// [`SortError::Usage`] for a malformed extension or an unknown category.
pub fn resolve_selection(
    table: &ExtensionTable,
    extensions: &[String],
    categories: &[String],
) -> SortResult<HashSet<String>> {
    if extensions.is_empty() && categories.is_empty() {
        return Ok(table.all_extensions().into_iter().map(String::from).collect());
    }

    let mut selection = HashSet::new();
    for raw in extensions {
        let ext = normalize_extension(raw)
            .ok_or_else(|| SortError::Usage(format!("Invalid extension '{}'", raw)))?;
        match table.category_for_extension(&ext) {
            Some(category) => {
                debug!(ext = %ext, category, "extension selected");
                selection.insert(ext);
            }
            None => {
                OutputFormatter::warning(&format!("Ignoring unsupported extension '{}'", ext))
            }
        }
    }

    for category in categories {
        let members = table.extensions_in_category(category);
        if members.is_empty() {
            return Err(SortError::Usage(format!(
                "Unknown category '{}'. Run `dirsorter extensions` to list categories.",
                category
            )));
        }
        selection.extend(members.into_iter().map(String::from));
    }

    Ok(selection)
}

/// Prints what a scan of `path` found.
fn scan_directory(
    path: &Path,
    table: &ExtensionTable,
    filters: &CompiledFilters,
    json: bool,
) -> SortResult<()> {
    let result = Scanner::new(table).with_filters(filters).scan(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !path.exists() {
        OutputFormatter::warning(&format!(
            "Path does not exist: {}. Nothing to show.",
            path.display()
        ));
        return Ok(());
    }

    OutputFormatter::info(&format!("Scanned: {}", path.display()));
    if result.is_empty() {
        OutputFormatter::plain("No recognized files found.");
        return Ok(());
    }

    OutputFormatter::scan_table(&result);
    OutputFormatter::summary_table(&result.category_counts(), result.total_files());
    Ok(())
}

/// Sorts (or, with `dry_run`, previews sorting) the selected files of `path`.
fn sort_directory(
    path: &Path,
    table: &ExtensionTable,
    filters: &CompiledFilters,
    selection: &HashSet<String>,
    dry_run: bool,
    show_progress: bool,
) -> SortResult<()> {
    if !path.exists() {
        OutputFormatter::warning(&format!(
            "Path does not exist: {}. Nothing was moved.",
            path.display()
        ));
        return Ok(());
    }

    if selection.is_empty() {
        OutputFormatter::warning("No file type selected. Nothing was moved.");
        return Ok(());
    }

    let relocator = Relocator::new(table).with_filters(filters);

    if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", path.display()));
        let plan = relocator.plan(path, selection)?;
        if plan.is_empty() {
            OutputFormatter::plain("No files found to organize.");
            return Ok(());
        }

        OutputFormatter::header("Files would be organized as follows:");
        OutputFormatter::plan(&plan);

        let counts: BTreeMap<String, usize> = plan
            .by_category()
            .into_iter()
            .map(|(category, files)| (category.to_string(), files.len()))
            .collect();
        OutputFormatter::summary_table(&counts, plan.len());

        OutputFormatter::success("Dry run complete. No files were modified.");
        return Ok(());
    }

    OutputFormatter::info(&format!("Organizing contents of: {}", path.display()));

    let result = if show_progress {
        let mut progress = BarProgress::new(OutputFormatter::create_progress_bar());
        let result = relocator.relocate(path, selection, &mut progress);
        match &result {
            Ok(_) => progress.finish("done"),
            Err(_) => progress.abandon(),
        }
        result
    } else {
        relocator.relocate(path, selection, &mut NoProgress)
    };

    match result {
        Ok(report) => {
            print_report(path, &report);
            Ok(())
        }
        Err(SortError::MoveFailures { failures, moved }) => {
            OutputFormatter::error(&format!(
                "{} file(s) could not be moved ({} moved):",
                failures.len(),
                moved
            ));
            OutputFormatter::failures(&failures);
            Err(SortError::MoveFailures { failures, moved })
        }
        Err(e) => Err(e),
    }
}

fn print_report(base: &Path, report: &RelocationReport) {
    if report.moved_count() == 0 {
        OutputFormatter::plain("No files found to organize.");
        return;
    }

    for file in report.renamed() {
        let shown = file
            .destination
            .strip_prefix(base)
            .unwrap_or(&file.destination);
        OutputFormatter::warning(&format!(
            "{} already existed, saved as {}",
            file.file_name,
            shown.display()
        ));
    }

    OutputFormatter::summary_table(&report.category_counts(), report.moved_count());
    OutputFormatter::success(&format!(
        "{} file(s) organized successfully.",
        report.moved_count()
    ));
}

fn list_extensions(table: &ExtensionTable, json: bool) -> SortResult<()> {
    let groups = table.extensions_by_category();
    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    OutputFormatter::extension_groups(&groups);
    OutputFormatter::plain(&format!(
        "\n{} extensions in {} categories",
        table.len(),
        groups.len()
    ));
    Ok(())
}
