use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use pdfdesk_core::{AppViewModel, Notice, PhaseKind, SplitMode, Tool};

/// Turns view models into terminal output: a progress bar while processing, plus notices.
#[derive(Default)]
pub struct Renderer {
    bar: Option<ProgressBar>,
    shown_notice: Option<Notice>,
    shown_saved: Option<PathBuf>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) {
        if view.phase == PhaseKind::Processing {
            let bar = self.bar.get_or_insert_with(|| new_bar(view.tool));
            bar.set_position(u64::from(view.progress_percent));
        } else if let Some(bar) = self.bar.take() {
            if view.phase == PhaseKind::Succeeded {
                bar.set_position(100);
            }
            bar.finish_and_clear();
        }

        if view.notice != self.shown_notice {
            if let Some(notice) = &view.notice {
                self.print(&notice_line(notice));
            }
            self.shown_notice = view.notice.clone();
        }

        if view.last_saved != self.shown_saved {
            if let Some(path) = &view.last_saved {
                self.print(&format!("  saved to {}", path.display()));
            }
            self.shown_saved = view.last_saved.clone();
        }
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn new_bar(tool: Tool) -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos:>3}%",
    )
    .map(|style| style.progress_chars("━╸─").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(format!("{}...", tool.label()));
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}

pub(crate) fn notice_line(notice: &Notice) -> String {
    match notice {
        Notice::Success {
            file_name,
            reduction_percent: Some(percent),
        } => format!("  \x1b[32m✓\x1b[0m {file_name} is ready (size reduced by {percent}%)"),
        Notice::Success { file_name, .. } => {
            format!("  \x1b[32m✓\x1b[0m {file_name} is ready")
        }
        Notice::Error { message } => format!("  \x1b[31m✗\x1b[0m {message}"),
    }
}

/// Full session summary for the shell's `status` command.
pub(crate) fn status_text(view: &AppViewModel) -> String {
    let mut lines = vec![format!("tool: {}", view.tool.label())];
    match view.tool {
        Tool::Compress => lines.push(format!(
            "level: {} ({})",
            view.options.compression_level.get(),
            view.options.compression_level.label()
        )),
        Tool::Merge => lines.push(format!("room for {} more file(s)", view.remaining_capacity)),
        Tool::Split => match view.options.split_mode {
            SplitMode::All => lines.push("mode: all pages".to_string()),
            SplitMode::Range => lines.push(format!("mode: range '{}'", view.options.page_range)),
        },
    }

    if view.files.is_empty() {
        lines.push("files: none".to_string());
    } else {
        lines.push("files:".to_string());
        for row in &view.files {
            lines.push(format!("  [{}] {} ({})", row.index, row.name, human_size(row.size)));
        }
    }

    lines.push(format!("state: {:?}", view.phase).to_lowercase());
    if view.phase == PhaseKind::Processing {
        lines.push(format!("progress: {}%", view.progress_percent));
    }
    if let Some(result) = &view.result {
        let mut line = format!("result: {} ({})", result.file_name, human_size(result.size));
        if let (Some(original), Some(percent)) = (result.original_size, result.reduction_percent) {
            line.push_str(&format!(", was {}, reduced by {percent}%", human_size(original)));
        }
        lines.push(line);
    }
    if let Some(notice) = &view.notice {
        lines.push(notice_line(notice));
    }
    lines.join("\n")
}

pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
