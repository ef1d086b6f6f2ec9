//! Cast rewrite command.

use crate::classify::CastKind;
use crate::engine::{rewrite_source, FileRewrite, RewriteOptions};
use crate::output;
use crate::utils::{collect_cpp_files, normalize_display_path, validate_output_path};

use anyhow::Result;
use colored::Colorize;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What to do with rewritten sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RewriteMode {
    /// List planned rewrites without touching files.
    #[default]
    Preview,
    /// Write rewritten files in place.
    Apply,
    /// Print rewritten translation units.
    Stdout,
    /// Print a JSON report.
    Json,
}

/// Options for the rewrite command
#[derive(Debug, Clone, Default)]
pub struct RewriteCommandOptions {
    /// Output mode
    pub mode: RewriteMode,
    /// Verbose output
    pub verbose: bool,
    /// Engine options
    pub engine: RewriteOptions,
    /// Folders excluded from the walk
    pub exclude_folders: Vec<String>,
    /// Folders force-included in the walk
    pub include_folders: Vec<String>,
    /// Extensions of files to rewrite
    pub extensions: Vec<String>,
    /// Containment root for files written in place
    pub root: PathBuf,
}

/// Rewrite result for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Display path
    pub file: String,
    /// Rewrites and skips
    #[serde(flatten)]
    pub result: FileRewrite,
}

/// A file that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Display path
    pub file: String,
    /// Error message
    pub error: String,
}

/// Aggregate result of a run.
#[derive(Debug, Default, Serialize)]
pub struct RewriteSummary {
    /// Number of source files processed
    pub files_scanned: usize,
    /// Number of files with at least one rewrite
    pub files_changed: usize,
    /// Casts rewritten as `const_cast`
    pub const_casts: usize,
    /// Casts rewritten as `static_cast`
    pub static_casts: usize,
    /// Casts left untouched
    pub skipped: usize,
    /// Whether files were written
    pub applied: bool,
    /// Files with rewrites or skipped casts
    pub files: Vec<FileReport>,
    /// Files that failed
    pub failures: Vec<FileFailure>,
}

impl RewriteSummary {
    /// Total number of rewritten casts.
    #[must_use]
    pub fn total_rewrites(&self) -> usize {
        self.const_casts + self.static_casts
    }

    fn record(&mut self, report: FileReport) {
        self.const_casts += report.result.count(CastKind::Qualification);
        self.static_casts += report.result.count(CastKind::General);
        self.skipped += report.result.skipped.len();
        if report.result.is_changed() {
            self.files_changed += 1;
        }
        if report.result.is_changed() || !report.result.skipped.is_empty() {
            self.files.push(report);
        }
    }

    fn fail(&mut self, file: &Path, error: impl std::fmt::Display) {
        self.failures.push(FileFailure {
            file: normalize_display_path(file),
            error: error.to_string(),
        });
    }
}

/// Collects the sources below every path, without duplicates.
fn collect_sources(paths: &[PathBuf], options: &RewriteCommandOptions) -> Vec<PathBuf> {
    let mut seen = FxHashSet::default();
    let mut files = Vec::new();
    for path in paths {
        let (found, _) = collect_cpp_files(
            path,
            &options.exclude_folders,
            &options.include_folders,
            &options.extensions,
            options.verbose,
        );
        for file in found {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }
    files
}

/// Rewrite C-style casts in all C++ sources below `paths`.
///
/// Each file gets its own edit log and is processed in parallel. A file that
/// cannot be read, parsed, verified or written is reported in
/// [`RewriteSummary::failures`] and the remaining files still proceed.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
#[allow(clippy::too_many_lines)]
pub fn run_rewrite<W: Write>(
    paths: &[PathBuf],
    options: &RewriteCommandOptions,
    mut writer: W,
) -> Result<RewriteSummary> {
    let files = collect_sources(paths, options);
    let interactive = matches!(options.mode, RewriteMode::Preview | RewriteMode::Apply);

    if options.verbose && interactive {
        writeln!(writer, "[VERBOSE] Files to rewrite: {}", files.len())?;
    }

    let progress = (interactive && !files.is_empty())
        .then(|| output::create_progress_bar(files.len() as u64));

    let results: Vec<(PathBuf, Result<FileRewrite>)> = files
        .par_iter()
        .map(|path| {
            let outcome = fs::read_to_string(path)
                .map_err(anyhow::Error::from)
                .and_then(|source| Ok(rewrite_source(&source, &options.engine)?));
            if let Some(pb) = &progress {
                pb.inc(1);
            }
            (path.clone(), outcome)
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let mut summary = RewriteSummary {
        files_scanned: files.len(),
        applied: options.mode == RewriteMode::Apply,
        ..RewriteSummary::default()
    };

    if interactive {
        output::print_header(&mut writer, summary.applied)?;
    }

    for (path, outcome) in results {
        let display = normalize_display_path(&path);
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                if options.mode == RewriteMode::Json {
                    summary.fail(&path, &e);
                    continue;
                }
                if interactive {
                    writeln!(writer, "{} {}: {}", "Error:".red().bold(), display, e)?;
                } else {
                    eprintln!("Error: {display}: {e}");
                }
                summary.fail(&path, e);
                continue;
            }
        };

        match options.mode {
            RewriteMode::Preview => print_file(&mut writer, &display, &result, options.verbose)?,
            RewriteMode::Apply => {
                if result.is_changed() {
                    if let Err(e) = write_in_place(&path, &result, &options.root) {
                        writeln!(writer, "{} {}: {}", "Error:".red().bold(), display, e)?;
                        summary.fail(&path, e);
                        continue;
                    }
                }
                print_file(&mut writer, &display, &result, options.verbose)?;
            }
            RewriteMode::Stdout => {
                if files.len() > 1 {
                    writeln!(writer, "==> {display} <==")?;
                }
                write!(writer, "{}", result.output)?;
            }
            RewriteMode::Json => {}
        }

        summary.record(FileReport {
            file: display,
            result,
        });
    }

    match options.mode {
        RewriteMode::Json => {
            writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        RewriteMode::Stdout => {}
        RewriteMode::Preview | RewriteMode::Apply => {
            output::print_summary_table(&mut writer, &summary)?;
            output::print_summary_pills(&mut writer, &summary)?;
            output::print_rewrite_stats(&mut writer, &summary)?;
            if !summary.applied && summary.total_rewrites() > 0 {
                writeln!(
                    writer,
                    "{}",
                    "[DRY-RUN] Run with --apply to write these changes.".yellow()
                )?;
            }
        }
    }

    Ok(summary)
}

fn write_in_place(path: &Path, result: &FileRewrite, root: &Path) -> Result<()> {
    let target = validate_output_path(path, Some(root))?;
    fs::write(&target, &result.output)?;
    Ok(())
}

fn print_file<W: Write>(
    writer: &mut W,
    display: &str,
    result: &FileRewrite,
    verbose: bool,
) -> Result<()> {
    if !result.is_changed() && (result.skipped.is_empty() || !verbose) {
        return Ok(());
    }

    writeln!(writer, "{}", display.bold())?;
    for rewrite in &result.rewrites {
        output::print_rewrite(writer, rewrite, verbose)?;
    }
    if verbose {
        for skipped in &result.skipped {
            output::print_skipped(writer, skipped)?;
        }
    }
    writeln!(writer)?;
    Ok(())
}
