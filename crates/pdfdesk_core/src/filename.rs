use chrono::{DateTime, Utc};

use crate::RequestJob;

/// Suggested download name for a finished job.
///
/// - compress: `{base}_compressed.pdf`
/// - merge: `merged_document_{YYYYMMDDHHMMSS}.pdf`
/// - split: `{base}_split_{YYYYMMDDHHMMSS}.zip`
pub fn suggested_file_name(job: &RequestJob, finished_at: DateTime<Utc>) -> String {
    match job {
        RequestJob::Compress { file, .. } => {
            format!("{}_compressed.pdf", sanitize(base_name(file.name())))
        }
        RequestJob::Merge { .. } => {
            format!("merged_document_{}.pdf", timestamp14(finished_at))
        }
        RequestJob::Split { file, .. } => format!(
            "{}_split_{}.zip",
            sanitize(base_name(file.name())),
            timestamp14(finished_at)
        ),
    }
}

/// The file name without a trailing `.pdf` (any case).
pub fn base_name(name: &str) -> &str {
    let len = name.len();
    if len >= 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..len - 4]
    } else {
        name
    }
}

/// Fourteen digit UTC timestamp, `YYYYMMDDHHMMSS`.
pub fn timestamp14(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&[' ', '.'][..]);
    if cleaned.is_empty() {
        return "document".to_string();
    }
    let mut name = cleaned.to_string();
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
