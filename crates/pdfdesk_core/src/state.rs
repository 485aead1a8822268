use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pdfdesk_logging::{desk_debug, request_label};

use crate::view_model::{AppViewModel, FileRowView, PhaseKind, ResultView};
use crate::{
    accept, materialize, suggested_file_name, CandidateFile, Effect, Failure, FileIdentity,
    IntakePolicy, Materialized, Notice, NoticeSurface, OptionChange, ProcessedArtifact,
    ProcessingRequest, ProcessingResult, ProgressState, RequestId, RequestJob, ResultPayload,
    SplitMode, Tool, ToolOptions, UploadedFile, ValidationError,
};

/// Source of the current UTC time, injected so tests can pin it.
#[derive(Clone, Copy)]
pub struct Clock(fn() -> DateTime<Utc>);

impl Clock {
    pub fn new(now: fn() -> DateTime<Utc>) -> Self {
        Self(now)
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self(Utc::now)
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}

// Clocks carry no comparable state.
impl PartialEq for Clock {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// Lifecycle of the session. `Idle` and `Ready` follow from the file set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Ready,
    Processing(ProcessingRequest),
    Succeeded(ProcessedArtifact),
    Failed(Failure),
}

impl SessionPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            SessionPhase::Idle => PhaseKind::Idle,
            SessionPhase::Ready => PhaseKind::Ready,
            SessionPhase::Processing(_) => PhaseKind::Processing,
            SessionPhase::Succeeded(_) => PhaseKind::Succeeded,
            SessionPhase::Failed(_) => PhaseKind::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    clock: Clock,
    policy: IntakePolicy,
    tool: Tool,
    options: ToolOptions,
    files: Vec<UploadedFile>,
    phase: SessionPhase,
    progress: ProgressState,
    notice: NoticeSurface,
    last_request_id: RequestId,
    last_saved: Option<PathBuf>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: IntakePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.current()
    }

    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }

    /// Id of the request currently allowed to change state, if any.
    pub fn active_request(&self) -> Option<RequestId> {
        match &self.phase {
            SessionPhase::Processing(request) => Some(request.id),
            _ => None,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let result = match &self.phase {
            SessionPhase::Succeeded(artifact) => Some(ResultView {
                file_name: artifact.file_name().to_string(),
                size: artifact.result_size(),
                original_size: artifact.original_size(),
                reduction_percent: artifact.reduction_percent(),
            }),
            _ => None,
        };
        let capacity = self.policy.capacity(self.tool);
        AppViewModel {
            tool: self.tool,
            options: self.options.clone(),
            files: self
                .files
                .iter()
                .enumerate()
                .map(|(index, file)| FileRowView {
                    index,
                    name: file.name().to_string(),
                    size: file.size(),
                })
                .collect(),
            phase: self.phase.kind(),
            active_request: self.active_request(),
            progress_percent: self.progress.percent(),
            notice: self.notice.current().cloned(),
            result,
            remaining_capacity: capacity.saturating_sub(self.files.len()),
            can_submit: self.build_job().is_ok(),
            last_saved: self.last_saved.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // ---- user actions ----

    pub(crate) fn intake(&mut self, candidates: Vec<CandidateFile>, effects: &mut Vec<Effect>) {
        match accept(&self.files, candidates, self.tool, &self.policy) {
            Err(err) => {
                desk_debug!("intake rejected: {}", err);
                self.reject_intake(err);
            }
            Ok(accepted) if accepted.added == 0 => {
                desk_debug!(
                    "intake added nothing ({} duplicates, {} over capacity)",
                    accepted.duplicates,
                    accepted.over_capacity
                );
            }
            Ok(accepted) => {
                desk_debug!(
                    "intake added {} file(s), skipped {} duplicates, dropped {} over capacity",
                    accepted.added,
                    accepted.duplicates,
                    accepted.over_capacity
                );
                self.restart(effects);
                self.files = accepted.files;
                self.settle();
                if self.tool.auto_runs() {
                    self.run(effects);
                }
            }
        }
    }

    pub(crate) fn remove_file(&mut self, identity: &FileIdentity, effects: &mut Vec<Effect>) {
        let Some(index) = self.files.iter().position(|f| &f.identity() == identity) else {
            return;
        };
        self.restart(effects);
        self.files.remove(index);
        self.settle();
    }

    pub(crate) fn move_file(&mut self, from: usize, to: usize, effects: &mut Vec<Effect>) {
        if from == to || from >= self.files.len() || to >= self.files.len() {
            return;
        }
        self.restart(effects);
        let file = self.files.remove(from);
        self.files.insert(to, file);
        self.settle();
    }

    pub(crate) fn select_tool(&mut self, tool: Tool, effects: &mut Vec<Effect>) {
        self.restart(effects);
        self.tool = tool;
        self.settle();
        if !self.files.is_empty() && tool.auto_runs() {
            self.run(effects);
        }
    }

    pub(crate) fn change_option(&mut self, change: OptionChange, effects: &mut Vec<Effect>) {
        let reruns = change.reruns(self.tool);
        self.options.apply(change);
        self.mark_dirty();
        if reruns && !self.files.is_empty() {
            self.restart(effects);
            self.run(effects);
        }
    }

    pub(crate) fn submit(&mut self, effects: &mut Vec<Effect>) {
        self.restart(effects);
        self.run(effects);
    }

    pub(crate) fn save(&mut self, effects: &mut Vec<Effect>) {
        if let SessionPhase::Succeeded(artifact) = &self.phase {
            effects.push(Effect::SaveArtifact {
                file_name: artifact.file_name().to_string(),
                content: artifact.content().clone(),
            });
        } else {
            desk_debug!("save ignored: no artifact");
        }
    }

    pub(crate) fn dismiss_notice(&mut self) {
        if self.notice.dismiss().is_some() {
            self.mark_dirty();
        }
        if matches!(self.phase, SessionPhase::Failed(_)) {
            self.settle();
        }
    }

    pub(crate) fn reset(&mut self, effects: &mut Vec<Effect>) {
        self.restart(effects);
        self.files.clear();
        self.options = ToolOptions::default();
        self.last_saved = None;
        self.settle();
    }

    pub(crate) fn shutdown(&mut self, effects: &mut Vec<Effect>) {
        self.restart(effects);
        self.settle();
    }

    // ---- engine events ----

    pub(crate) fn transport_progress(&mut self, request_id: RequestId, percent: f32, effects: &mut Vec<Effect>) {
        if self.current_request(request_id, "progress").is_none() {
            return;
        }
        if self.progress.mirror(percent) {
            effects.push(Effect::CancelProgressTimer { request_id });
        }
        self.mark_dirty();
    }

    pub(crate) fn progress_tick(&mut self, request_id: RequestId, increment: f32) {
        if self.current_request(request_id, "tick").is_none() {
            return;
        }
        self.progress.tick(increment);
        self.mark_dirty();
    }

    pub(crate) fn transport_succeeded(
        &mut self,
        request_id: RequestId,
        payload: ResultPayload,
        effects: &mut Vec<Effect>,
    ) {
        let Some(request) = self.current_request(request_id, "success") else {
            return;
        };
        let outcome = match materialize(payload) {
            Materialized::Ready(bytes) => Some(ProcessingResult::Success(self.artifact_for(request, bytes))),
            Materialized::NeedsFetch(location) => {
                desk_debug!("{} delivered a reference: {}", request_label(request_id), location);
                effects.push(Effect::ResolveReference {
                    request_id,
                    location,
                });
                None
            }
            Materialized::Missing => Some(ProcessingResult::Failure(Failure::MissingArtifact)),
        };
        if let Some(outcome) = outcome {
            self.complete(request_id, outcome, effects);
        }
    }

    pub(crate) fn transport_failed(&mut self, request_id: RequestId, failure: Failure, effects: &mut Vec<Effect>) {
        if self.current_request(request_id, "failure").is_none() {
            return;
        }
        self.complete(request_id, ProcessingResult::Failure(failure), effects);
    }

    pub(crate) fn reference_resolved(
        &mut self,
        request_id: RequestId,
        result: Result<Arc<[u8]>, Failure>,
        effects: &mut Vec<Effect>,
    ) {
        let Some(request) = self.current_request(request_id, "reference") else {
            return;
        };
        let outcome = match result {
            Ok(bytes) => ProcessingResult::Success(self.artifact_for(request, bytes)),
            Err(failure) => ProcessingResult::Failure(failure),
        };
        self.complete(request_id, outcome, effects);
    }

    pub(crate) fn success_notice_due(&mut self, request_id: RequestId) {
        let SessionPhase::Succeeded(artifact) = &self.phase else {
            return;
        };
        let notice = Notice::Success {
            file_name: artifact.file_name().to_string(),
            reduction_percent: artifact.reduction_percent(),
        };
        if self.notice.success_due(request_id, notice) {
            self.mark_dirty();
        }
    }

    pub(crate) fn artifact_saved(&mut self, path: PathBuf) {
        self.last_saved = Some(path);
        self.mark_dirty();
    }

    pub(crate) fn save_failed(&mut self, message: &str) {
        self.notice.show_error(&format!("Could not save the file: {message}"));
        self.mark_dirty();
    }

    // ---- transitions ----

    /// Leaves any terminal or processing phase before a triggering action.
    ///
    /// The in-flight request, if any, loses its right to touch state: its
    /// timer is cancelled and the runner may abort its network call.
    fn restart(&mut self, effects: &mut Vec<Effect>) {
        if let SessionPhase::Processing(request) = &self.phase {
            desk_debug!("superseding {}", request_label(request.id));
            effects.push(Effect::CancelProgressTimer {
                request_id: request.id,
            });
            effects.push(Effect::Abandon {
                request_id: request.id,
            });
        }
        self.notice.clear();
        self.progress = ProgressState::default();
        self.phase = SessionPhase::Idle;
        self.mark_dirty();
    }

    /// Derives `Idle` or `Ready` from the file set.
    fn settle(&mut self) {
        self.phase = if self.files.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Ready
        };
        self.mark_dirty();
    }

    /// Validates and dispatches a request for the current tool, options and files.
    fn run(&mut self, effects: &mut Vec<Effect>) {
        let job = match self.build_job() {
            Ok(job) => job,
            Err(err) => {
                desk_debug!("submit rejected: {}", err);
                self.reject(err, effects);
                return;
            }
        };
        self.last_request_id += 1;
        let request = ProcessingRequest {
            id: self.last_request_id,
            job,
            started_at: self.clock.now(),
        };
        desk_debug!(
            "dispatching {} ({}, {} input bytes)",
            request_label(request.id),
            request.tool(),
            request.job.input_bytes()
        );
        effects.push(Effect::Dispatch {
            request: request.clone(),
        });
        effects.push(Effect::StartProgressTimer {
            request_id: request.id,
        });
        self.progress = ProgressState::start();
        self.phase = SessionPhase::Processing(request);
        self.mark_dirty();
    }

    fn build_job(&self) -> Result<RequestJob, ValidationError> {
        match self.tool {
            Tool::Compress => {
                let file = self.files.first().ok_or(ValidationError::NoFiles)?;
                Ok(RequestJob::Compress {
                    file: file.clone(),
                    level: self.options.compression_level,
                })
            }
            Tool::Merge => {
                if self.files.len() < 2 {
                    return Err(ValidationError::MergeNeedsTwo {
                        found: self.files.len(),
                    });
                }
                Ok(RequestJob::Merge {
                    files: self.files.clone(),
                })
            }
            Tool::Split => {
                let [file] = self.files.as_slice() else {
                    return Err(ValidationError::SplitNeedsOne {
                        found: self.files.len(),
                    });
                };
                let pages = match self.options.split_mode {
                    SplitMode::All => None,
                    SplitMode::Range => {
                        let range = self.options.page_range.trim();
                        if range.is_empty() {
                            return Err(ValidationError::EmptyPageRange);
                        }
                        Some(range.to_string())
                    }
                };
                Ok(RequestJob::Split {
                    file: file.clone(),
                    pages,
                })
            }
        }
    }

    /// A refused drop only raises the error notice. A running request and an
    /// unsaved result both survive it; only an idle session turns `Failed`.
    fn reject_intake(&mut self, err: ValidationError) {
        let failure = Failure::from(err);
        self.notice.show_error(&failure.user_message());
        if matches!(
            self.phase,
            SessionPhase::Idle | SessionPhase::Ready | SessionPhase::Failed(_)
        ) {
            self.phase = SessionPhase::Failed(failure);
        }
        self.mark_dirty();
    }

    fn reject(&mut self, err: ValidationError, effects: &mut Vec<Effect>) {
        self.restart(effects);
        let failure = Failure::from(err);
        self.notice.show_error(&failure.user_message());
        self.phase = SessionPhase::Failed(failure);
    }

    /// The active request if `request_id` is it; anything else is stale and dropped.
    fn current_request(&self, request_id: RequestId, what: &str) -> Option<&ProcessingRequest> {
        match &self.phase {
            SessionPhase::Processing(request) if request.id == request_id => Some(request),
            _ => {
                desk_debug!(
                    "discarding stale {} for {} (latest is {})",
                    what,
                    request_label(request_id),
                    request_label(self.last_request_id)
                );
                None
            }
        }
    }

    fn artifact_for(&self, request: &ProcessingRequest, bytes: Arc<[u8]>) -> ProcessedArtifact {
        let original_size = match &request.job {
            RequestJob::Compress { file, .. } => Some(file.size()),
            _ => None,
        };
        let file_name = suggested_file_name(&request.job, self.clock.now());
        ProcessedArtifact::new(bytes, file_name, original_size)
    }

    /// The single terminal transition for the active request.
    fn complete(&mut self, request_id: RequestId, result: ProcessingResult, effects: &mut Vec<Effect>) {
        self.progress.finish();
        effects.push(Effect::CancelProgressTimer { request_id });
        match result {
            ProcessingResult::Success(artifact) => {
                desk_debug!(
                    "{} succeeded: {} ({} bytes)",
                    request_label(request_id),
                    artifact.file_name(),
                    artifact.result_size()
                );
                self.notice.schedule_success(request_id);
                effects.push(Effect::ScheduleSuccessNotice { request_id });
                self.phase = SessionPhase::Succeeded(artifact);
            }
            ProcessingResult::Failure(failure) => {
                desk_debug!("{} failed: {}", request_label(request_id), failure);
                self.notice.show_error(&failure.user_message());
                self.phase = SessionPhase::Failed(failure);
            }
        }
        self.mark_dirty();
    }
}
