use std::path::PathBuf;

use crate::{Notice, RequestId, Tool, ToolOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseKind {
    #[default]
    Idle,
    Ready,
    Processing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub tool: Tool,
    pub options: ToolOptions,
    pub files: Vec<FileRowView>,
    pub phase: PhaseKind,
    pub active_request: Option<RequestId>,
    pub progress_percent: u8,
    pub notice: Option<Notice>,
    pub result: Option<ResultView>,
    pub remaining_capacity: usize,
    pub can_submit: bool,
    pub last_saved: Option<PathBuf>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub index: usize,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub file_name: String,
    pub size: u64,
    pub original_size: Option<u64>,
    pub reduction_percent: Option<i64>,
}
