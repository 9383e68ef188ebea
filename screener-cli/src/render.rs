//! Result rendering: plain-text tables for the terminal, pretty JSON for tools.

use screener_core::data::DataSource;
use screener_core::signals::{MAX_ENTRY_SCORE, MAX_EXIT_SCORE};
use screener_core::{ScreenReport, SignalTable};
use std::fmt::Write;

/// Where the bars behind a report came from.
#[derive(Debug, Clone, Copy)]
pub struct Provenance {
    pub source: DataSource,
    pub from_cache: bool,
}

/// Render both tables as text. `max_rows` of 0 shows every row.
pub fn render_text(report: &ScreenReport, provenance: Provenance, max_rows: usize) -> String {
    let mut out = String::new();

    let as_of = report
        .as_of
        .map_or_else(|| "n/a".to_string(), |d| d.to_string());
    let cached = if provenance.from_cache { ", cached" } else { "" };
    let _ = writeln!(
        out,
        "{} signal screen as of {as_of} ({} bars, source: {}{cached})",
        report.ticker, report.bar_count, provenance.source
    );

    if report.narrowed() {
        let _ = writeln!(
            out,
            "Notice: history too short for the requested windows \
             (entry {} -> {}, exit {} -> {}; {} eligible days)",
            report.entries.requested_window,
            report.entries.effective_window,
            report.exits.requested_window,
            report.exits.effective_window,
            report.indicator_bar_count,
        );
    }

    out.push('\n');
    let header = table_header("Entry signals", &report.entries, MAX_ENTRY_SCORE);
    let _ = writeln!(out, "{header}");
    write_rows(&mut out, &report.entries, max_rows);

    out.push('\n');
    let title = match report.reference_price {
        Some(price) => format!("Exit signals vs reference {price:.2}"),
        None => "Exit signals".to_string(),
    };
    let header = table_header(&title, &report.exits, MAX_EXIT_SCORE);
    let _ = writeln!(out, "{header}");
    write_rows(&mut out, &report.exits, max_rows);

    if provenance.source == DataSource::Synthetic {
        out.push('\n');
        out.push_str("WARNING: results based on SYNTHETIC data\n");
    }

    out
}

fn table_header(title: &str, table: &SignalTable, max_score: f64) -> String {
    let mean = table
        .mean_score
        .map_or_else(|| "n/a".to_string(), |m| format!("{m:.2} / {max_score:.0}"));
    format!(
        "{title} (last {} days, mean score {mean})",
        table.effective_window
    )
}

fn write_rows(out: &mut String, table: &SignalTable, max_rows: usize) {
    if table.rows.is_empty() {
        out.push_str("  (no eligible days)\n");
        return;
    }

    let _ = writeln!(out, "{:<10} | {:>10} | {:>5} | Traits", "Date", "Close", "Score");
    let _ = writeln!(out, "{}", "-".repeat(60));

    let limit = if max_rows == 0 { table.rows.len() } else { max_rows };
    for row in table.rows.iter().take(limit) {
        let traits = if row.traits.is_empty() {
            "-".to_string()
        } else {
            row.traits.join(", ")
        };
        let _ = writeln!(
            out,
            "{:<10} | {:>10.2} | {:>5.1} | {traits}",
            row.date.to_string(),
            row.close,
            row.score
        );
    }

    let hidden = table.rows.len().saturating_sub(limit);
    if hidden > 0 {
        let _ = writeln!(out, "  ... {hidden} more");
    }
}

/// The full report as pretty-printed JSON.
pub fn render_json(report: &ScreenReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
