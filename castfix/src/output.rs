use crate::classify::CastKind;
use crate::commands::RewriteSummary;
use crate::engine::{CastRewrite, SkippedCast};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Print the exclusion list in styled format.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_exclusion_list(writer: &mut impl Write, folders: &[String]) -> std::io::Result<()> {
    if folders.is_empty() {
        let defaults = crate::constants::DEFAULT_EXCLUDE_FOLDERS();
        let mut sorted_defaults: Vec<&str> = defaults.iter().copied().collect();
        sorted_defaults.sort_unstable();
        let list = sorted_defaults.join(", ");
        writeln!(
            writer,
            "{} {}",
            "[OK] Using default exclusions only:".green(),
            list.dimmed()
        )?;
    } else {
        let list = folders
            .iter()
            .map(std::string::String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(writer, "{} {}", "Excluding:".yellow().bold(), list)?;
    }
    Ok(())
}

/// Create a progress bar with file count.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_progress_bar(total_files: u64) -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("rewriting...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.tick();
    pb
}

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write, applied: bool) -> std::io::Result<()> {
    let title = if applied {
        "║  C++ Cast Rewrites (applied)           ║"
    } else {
        "║  C++ Cast Rewrites (preview)           ║"
    };
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(writer, "{}", title.cyan().bold())?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print one rewritten cast: line, prefix as written and its replacement.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_rewrite(
    writer: &mut impl Write,
    rewrite: &CastRewrite,
    verbose: bool,
) -> std::io::Result<()> {
    let replacement = match rewrite.kind {
        CastKind::Qualification => rewrite.replacement.magenta(),
        CastKind::General => rewrite.replacement.green(),
    };
    let closing = if rewrite.wraps_operand { " … )" } else { "" };
    writeln!(
        writer,
        "  {:>5}: {} {} {}{}",
        rewrite.line.to_string().dimmed(),
        rewrite.original.red(),
        "->".dimmed(),
        replacement,
        closing.dimmed()
    )?;
    if verbose {
        writeln!(
            writer,
            "         [VERBOSE] {} -> {}",
            rewrite.source_type, rewrite.dest_type
        )?;
    }
    Ok(())
}

/// Print a cast that was left untouched.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_skipped(writer: &mut impl Write, skipped: &SkippedCast) -> std::io::Result<()> {
    writeln!(
        writer,
        "  {:>5}: {} {}",
        skipped.line.to_string().dimmed(),
        "Skip:".yellow(),
        skipped.reason
    )
}

/// Print summary with colored "pills".
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_pills(
    writer: &mut impl Write,
    summary: &RewriteSummary,
) -> std::io::Result<()> {
    fn pill(label: &str, count: usize) -> String {
        if count == 0 {
            format!("{}: {}", label, count.to_string().green())
        } else {
            format!("{}: {}", label, count.to_string().yellow().bold())
        }
    }

    writeln!(
        writer,
        "{}  {}  {}  {}",
        pill("const_cast", summary.const_casts),
        pill("static_cast", summary.static_casts),
        pill("Skipped", summary.skipped),
        pill("Errors", summary.failures.len()),
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Helper to create a styled table
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Print a per-file table of rewrite counts.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_table(
    writer: &mut impl Write,
    summary: &RewriteSummary,
) -> std::io::Result<()> {
    if summary.files.is_empty() {
        return Ok(());
    }

    let mut table = create_table(vec!["File", "const_cast", "static_cast", "Skipped"]);
    for report in &summary.files {
        let consts = report.result.count(CastKind::Qualification);
        let statics = report.result.count(CastKind::General);
        table.add_row(vec![
            Cell::new(&report.file).add_attribute(Attribute::Bold),
            Cell::new(consts).fg(if consts > 0 { Color::Magenta } else { Color::White }),
            Cell::new(statics).fg(if statics > 0 { Color::Green } else { Color::White }),
            Cell::new(report.result.skipped.len()).fg(Color::Yellow),
        ]);
    }
    writeln!(writer, "{table}")?;
    writeln!(writer)?;
    Ok(())
}

/// Print file statistics.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_rewrite_stats(
    writer: &mut impl Write,
    summary: &RewriteSummary,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{}",
        format!(
            "Scanned {} files, {} with rewrites",
            summary.files_scanned.to_string().bold(),
            summary.files_changed.to_string().bold()
        )
        .dimmed()
    )
}
