//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! the progress bar that observes a relocation batch, and summary tables.

use crate::error::MoveFailure;
use crate::relocator::{ProgressObserver, RelocationPlan};
use crate::scanner::ScanResult;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Summary tables
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for a relocation batch.
    ///
    /// The length is set by the first progress notification.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the per-extension table of a scan.
    pub fn scan_table(result: &ScanResult) {
        Self::header("FILES BY EXTENSION");

        let width = result
            .extensions()
            .iter()
            .map(|ext| ext.len())
            .max()
            .unwrap_or(0)
            .max(9);

        println!(
            "{:<width$} | {:>5} | {}",
            "Extension".bold(),
            "Files".bold(),
            "Category".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 24));
        for (ext, bucket) in result.iter() {
            println!(
                "{:<width$} | {:>5} | {}",
                ext,
                bucket.count.to_string().green(),
                bucket.category,
                width = width
            );
        }
    }

    /// Prints a summary table with file counts by category.
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }

    /// Prints what a batch would do, grouped by category folder.
    pub fn plan(plan: &RelocationPlan) {
        for (category, files) in plan.by_category() {
            println!("{}/", category.bold());
            for file in files {
                println!("   → {}", file);
            }
        }
    }

    /// Prints every file left behind by a batch, one line each.
    pub fn failures(failures: &[MoveFailure]) {
        for failure in failures {
            eprintln!("  {}", failure.to_string().red());
        }
    }

    /// Prints extensions grouped by category.
    pub fn extension_groups(groups: &BTreeMap<&str, Vec<&str>>) {
        for (category, extensions) in groups {
            println!("{} ({})", category.bold(), extensions.len());
            println!("   {}", extensions.join(" "));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Drives an indicatif bar from batch progress notifications.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Removes the bar, e.g. before printing an error.
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ProgressObserver for BarProgress {
    fn on_progress(&mut self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }
}
