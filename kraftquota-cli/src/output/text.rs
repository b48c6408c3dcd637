//! Text output formatting: `list` and `table` layouts with optional colors.

use kraftquota_core::{AuthConfig, QuotaEntry, QuotaReport, usage_percent};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Placeholder for empty cells.
const EMPTY: &str = "-";

/// Gap between table columns.
const COLUMN_GAP: &str = "  ";

// ============================================================================
// Views
// ============================================================================

/// Severity used to color a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// No color.
    Plain,
    /// Well within quota.
    Good,
    /// 80% or more of quota used.
    Warn,
    /// Quota exhausted.
    Critical,
    /// De-emphasized.
    Muted,
}

/// A single rendered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Plain text (no escape codes).
    pub text: String,
    /// Color to apply when colors are enabled.
    pub tone: Tone,
}

impl Cell {
    /// Creates an uncolored cell.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Plain,
        }
    }

    /// Creates a `used/hard` cell colored by consumption.
    pub fn usage(used: u64, hard: u64) -> Self {
        Self::usage_with(used, hard, |v| v.to_string())
    }

    /// Creates a `used/hard` memory cell with humanized sizes.
    pub fn memory_usage(used_mb: u64, hard_mb: u64) -> Self {
        Self::usage_with(used_mb, hard_mb, humanize_mib)
    }

    fn usage_with(used: u64, hard: u64, fmt: impl Fn(u64) -> String) -> Self {
        let Some(percent) = usage_percent(used, hard) else {
            return Self::plain(fmt(used));
        };
        let tone = if percent >= 100.0 {
            Tone::Critical
        } else if percent >= 80.0 {
            Tone::Warn
        } else {
            Tone::Good
        };
        Self {
            text: format!("{}/{}", fmt(used), fmt(hard)),
            tone,
        }
    }
}

/// Column headers plus one row of cells per quota entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaView {
    /// Column names.
    pub headers: Vec<&'static str>,
    /// One row per entry, same length as `headers`.
    pub rows: Vec<Vec<Cell>>,
}

impl QuotaView {
    /// Full report: consumption against hard caps.
    pub fn quotas(auth: &AuthConfig, report: &QuotaReport) -> Self {
        let mut headers = vec!["uuid"];
        if auth.user.is_some() {
            headers.push("user");
        }
        headers.extend([
            "live instances",
            "instances",
            "live memory",
            "services",
            "service groups",
            "volumes",
            "volume storage",
        ]);

        let rows = report
            .quotas
            .iter()
            .map(|entry| {
                let mut row = vec![uuid_cell(entry)];
                if let Some(user) = &auth.user {
                    row.push(Cell::plain(user.clone()));
                }
                row.extend([
                    Cell::usage(entry.used.live_instances, entry.hard.live_instances),
                    Cell::usage(entry.used.instances, entry.hard.instances),
                    Cell::memory_usage(entry.used.live_memory_mb, entry.hard.live_memory_mb),
                    Cell::usage(entry.used.services, entry.hard.services),
                    Cell::usage(entry.used.service_groups, entry.hard.service_groups),
                    Cell::usage(entry.used.volumes, entry.hard.volumes),
                    Cell::memory_usage(entry.used.total_volume_mb, entry.hard.total_volume_mb),
                ]);
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Limits only: min/max ranges per resource.
    pub fn limits(report: &QuotaReport) -> Self {
        let rows = report
            .quotas
            .iter()
            .map(|entry| {
                let l = &entry.limits;
                vec![
                    uuid_cell(entry),
                    range_cell(humanize_mib(l.min_memory_mb), humanize_mib(l.max_memory_mb), l.max_memory_mb),
                    range_cell(humanize_mib(l.min_volume_mb), humanize_mib(l.max_volume_mb), l.max_volume_mb),
                    range_cell(
                        l.min_autoscale_size.to_string(),
                        l.max_autoscale_size.to_string(),
                        l.max_autoscale_size,
                    ),
                ]
            })
            .collect();

        Self {
            headers: vec!["uuid", "memory", "volume size", "autoscale size"],
            rows,
        }
    }

    /// Features only: enabled feature names.
    pub fn features(report: &QuotaReport) -> Self {
        let rows = report
            .quotas
            .iter()
            .map(|entry| {
                let features = if entry.features.is_empty() {
                    Cell {
                        text: "none".to_string(),
                        tone: Tone::Muted,
                    }
                } else {
                    Cell::plain(entry.features.join(", "))
                };
                vec![uuid_cell(entry), features]
            })
            .collect();

        Self {
            headers: vec!["uuid", "features"],
            rows,
        }
    }
}

fn uuid_cell(entry: &QuotaEntry) -> Cell {
    if entry.uuid.is_empty() {
        Cell::plain(EMPTY)
    } else {
        Cell::plain(entry.uuid.clone())
    }
}

/// `min - max`, or a placeholder when the API reports no upper bound.
fn range_cell(min: String, max: String, raw_max: u64) -> Cell {
    if raw_max == 0 {
        Cell::plain(EMPTY)
    } else {
        Cell::plain(format!("{min} - {max}"))
    }
}

/// Formats a MiB figure, switching to GiB from 1024 MiB.
pub fn humanize_mib(mb: u64) -> String {
    if mb < 1024 {
        return format!("{mb} MiB");
    }
    if mb % 1024 == 0 {
        return format!("{} GiB", mb / 1024);
    }
    #[allow(clippy::cast_precision_loss)]
    let gib = mb as f64 / 1024.0;
    format!("{gib:.1} GiB")
}

// ============================================================================
// Text Formatter
// ============================================================================

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats a view as `key: value` blocks, one block per row.
    pub fn format_list(&self, view: &QuotaView) -> String {
        let key_width = view.headers.iter().map(|h| h.len() + 1).max().unwrap_or(0);

        view.rows
            .iter()
            .map(|row| {
                view.headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| {
                        let key = format!("{:<key_width$}", format!("{header}:"));
                        format!("{} {}", self.bold(&key), self.paint(&cell.text, cell.tone))
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Formats a view as aligned columns under an uppercase header row.
    pub fn format_table(&self, view: &QuotaView) -> String {
        let mut widths: Vec<usize> = view.headers.iter().map(|h| h.chars().count()).collect();
        for row in &view.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.text.chars().count());
            }
        }

        let last = widths.len().saturating_sub(1);
        let mut lines = Vec::with_capacity(view.rows.len() + 1);

        let header = view
            .headers
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (h, w))| self.bold(&pad(&h.to_uppercase(), *w, i == last)))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        lines.push(header);

        for row in &view.rows {
            let line = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, w))| self.paint(&pad(&cell.text, *w, i == last), cell.tone))
                .collect::<Vec<_>>()
                .join(COLUMN_GAP);
            lines.push(line);
        }

        lines.join("\n")
    }

    /// Colors text for a tone.
    fn paint(&self, text: &str, tone: Tone) -> String {
        let color = match tone {
            Tone::Plain => return text.to_string(),
            Tone::Good => GREEN,
            Tone::Warn => YELLOW,
            Tone::Critical => RED,
            Tone::Muted => DIM,
        };
        self.colorize(text, color)
    }

    fn bold(&self, text: &str) -> String {
        self.colorize(text, BOLD)
    }

    fn colorize(&self, text: &str, code: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Left-aligns `text` to `width`; the last column is not padded.
fn pad(text: &str, width: usize, last: bool) -> String {
    if last {
        text.to_string()
    } else {
        format!("{text:<width$}")
    }
}
