//! Paginated attendance report export.
//!
//! # Responsibility
//! - Flatten sessions into one row per student per session.
//! - Paginate rows and render them as a fixed-width text table.
//!
//! # Invariants
//! - Pure formatting: nothing here feeds back into attendance state.
//! - Unmarked timestamps render as `Not marked`.

use crate::engine::AggregateStats;
use crate::model::attendance::Session;
use chrono::{DateTime, FixedOffset};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};

pub const NOT_MARKED: &str = "Not marked";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const COLUMN_HEADERS: [&str; 6] = ["Session", "Date", "Name", "Email", "Status", "Marked at"];

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Rows per page; must be at least 1.
    pub rows_per_page: usize,
    /// Offset applied to `marked_at` before formatting.
    pub utc_offset_minutes: i32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            rows_per_page: 40,
            utc_offset_minutes: 0,
        }
    }
}

/// Invalid export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    ZeroRowsPerPage,
    InvalidUtcOffset(i32),
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroRowsPerPage => write!(f, "rows_per_page must be at least 1"),
            Self::InvalidUtcOffset(minutes) => {
                write!(f, "utc offset of {minutes} minutes is out of range")
            }
        }
    }
}

impl Error for ReportError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub session_title: String,
    pub session_date: String,
    pub name: String,
    pub email: String,
    pub status: &'static str,
    pub marked_at: String,
}

impl ReportRow {
    fn cells(&self) -> [&str; 6] {
        [
            self.session_title.as_str(),
            self.session_date.as_str(),
            self.name.as_str(),
            self.email.as_str(),
            self.status,
            self.marked_at.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPage {
    pub number: usize,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub title: String,
    pub summary: AggregateStats,
    pub session_count: usize,
    pub pages: Vec<ReportPage>,
}

impl AttendanceReport {
    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|page| page.rows.len()).sum()
    }
}

/// Builds a paginated report. An empty session list yields zero pages.
pub fn build_report(
    classroom_name: &str,
    sessions: &[Session],
    summary: AggregateStats,
    options: ReportOptions,
) -> Result<AttendanceReport, ReportError> {
    if options.rows_per_page == 0 {
        return Err(ReportError::ZeroRowsPerPage);
    }
    let offset = options
        .utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(ReportError::InvalidUtcOffset(options.utc_offset_minutes))?;

    let rows: Vec<ReportRow> = sessions
        .iter()
        .flat_map(|session| {
            session.attendance.iter().map(move |record| ReportRow {
                session_title: session.title.clone(),
                session_date: session.date.clone(),
                name: record.student_name.clone().unwrap_or_default(),
                email: record.student_email.clone().unwrap_or_default(),
                status: record.status.capitalized(),
                marked_at: format_marked_at(record.marked_at, &offset),
            })
        })
        .collect();

    let pages: Vec<ReportPage> = rows
        .chunks(options.rows_per_page)
        .enumerate()
        .map(|(index, chunk)| ReportPage {
            number: index + 1,
            rows: chunk.to_vec(),
        })
        .collect();

    info!(
        "event=report_build module=report status=ok sessions={} rows={} pages={}",
        sessions.len(),
        rows.len(),
        pages.len()
    );

    Ok(AttendanceReport {
        title: format!("{} attendance", classroom_name.trim()),
        summary,
        session_count: sessions.len(),
        pages,
    })
}

/// Formats an epoch-millisecond timestamp in `offset`, or `Not marked`.
pub fn format_marked_at(marked_at: Option<i64>, offset: &FixedOffset) -> String {
    match marked_at {
        None => NOT_MARKED.to_string(),
        Some(ms) => DateTime::from_timestamp_millis(ms)
            .map(|utc| utc.with_timezone(offset).format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| ms.to_string()),
    }
}

/// Renders the report as a fixed-width text document.
pub fn render_text(report: &AttendanceReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;
    let total_pages = report.pages.len();

    let _ = writeln!(out, "{}", report.title);
    let _ = writeln!(
        out,
        "Sessions: {}  Present: {}  Absent: {}  Attendance: {}% of {}",
        report.session_count,
        summary.present_count,
        summary.absent_count,
        summary.attendance_percentage,
        summary.denominator
    );

    if report.pages.is_empty() {
        let _ = writeln!(out, "\nNo attendance recorded.");
        return out;
    }

    for page in &report.pages {
        let mut widths = COLUMN_HEADERS.map(|header| header.chars().count());
        for row in &page.rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let _ = writeln!(out, "\nPage {} of {}", page.number, total_pages);
        push_line(&mut out, &COLUMN_HEADERS, &widths);
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        let rule_refs: Vec<&str> = rule.iter().map(String::as_str).collect();
        push_line(&mut out, &rule_refs, &widths);
        for row in &page.rows {
            push_line(&mut out, &row.cells(), &widths);
        }
    }
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}
