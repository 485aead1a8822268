use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use pdfdesk_core::{
    Effect, Failure, Msg, RequestId, RequestJob, ResultPayload, Tool, UploadedFile,
    UNKNOWN_ERROR_MESSAGE,
};
use pdfdesk_engine::{
    Delivery, EngineEvent, EngineHandle, FailureKind, Job, TransportError, UploadPart,
};
use pdfdesk_logging::{desk_debug, desk_info, desk_warn, request_label};

/// Executes core effects on the engine and feeds engine events back as [`Msg`]s.
pub struct EffectRunner {
    engine: EngineHandle,
    /// Tool per dispatched request, for the per-operation failure fallback.
    tools: Arc<Mutex<HashMap<RequestId, Tool>>>,
    stopped: Arc<AtomicBool>,
}

impl EffectRunner {
    pub fn new<T>(engine: EngineHandle, inbox: mpsc::Sender<T>) -> Self
    where
        T: From<Msg> + Send + 'static,
    {
        let runner = Self {
            engine,
            tools: Arc::new(Mutex::new(HashMap::new())),
            stopped: Arc::new(AtomicBool::new(false)),
        };
        runner.spawn_event_loop(inbox);
        runner
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Dispatch { request } => {
                    desk_info!(
                        "{} dispatch {} with {} file(s), {} bytes",
                        request_label(request.id),
                        request.tool(),
                        request.job.inputs().len(),
                        request.job.input_bytes()
                    );
                    if let Ok(mut tools) = self.tools.lock() {
                        tools.insert(request.id, request.tool());
                    }
                    self.engine.submit(request.id, engine_job(&request.job));
                }
                Effect::Abandon { request_id } => {
                    if let Ok(mut tools) = self.tools.lock() {
                        tools.remove(&request_id);
                    }
                    self.engine.abandon(request_id);
                }
                Effect::StartProgressTimer { request_id } => self.engine.start_timer(request_id),
                Effect::CancelProgressTimer { request_id } => self.engine.cancel_timer(request_id),
                Effect::ScheduleSuccessNotice { request_id } => {
                    self.engine.schedule_notice(request_id)
                }
                Effect::ResolveReference {
                    request_id,
                    location,
                } => self.engine.resolve(request_id, location),
                Effect::SaveArtifact { file_name, content } => {
                    desk_info!("saving {} ({} bytes)", file_name, content.len());
                    self.engine.save(file_name, content);
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        self.engine.shutdown();
    }

    fn spawn_event_loop<T>(&self, inbox: mpsc::Sender<T>)
    where
        T: From<Msg> + Send + 'static,
    {
        let engine = self.engine.clone();
        let tools = self.tools.clone();
        let stopped = self.stopped.clone();
        thread::spawn(move || {
            while !stopped.load(Ordering::Relaxed) {
                let Some(event) = engine.recv_timeout(Duration::from_millis(50)) else {
                    continue;
                };
                let tool_of = |request_id: RequestId| {
                    tools
                        .lock()
                        .ok()
                        .and_then(|tools| tools.get(&request_id).copied())
                };
                let settled = settled_request(&event);
                let msg = map_event(event, tool_of);
                if let Some(request_id) = settled {
                    if let Ok(mut tools) = tools.lock() {
                        tools.remove(&request_id);
                    }
                }
                if let Some(msg) = msg {
                    if inbox.send(T::from(msg)).is_err() {
                        break;
                    }
                }
            }
        });
    }
}

fn upload_part(file: &UploadedFile) -> UploadPart {
    UploadPart::new(file.name(), file.content().clone())
}

pub(crate) fn engine_job(job: &RequestJob) -> Job {
    match job {
        RequestJob::Compress { file, level } => Job::Compress {
            file: upload_part(file),
            level: level.get(),
        },
        RequestJob::Merge { files } => Job::Merge {
            files: files.iter().map(upload_part).collect(),
        },
        RequestJob::Split { file, pages } => Job::Split {
            file: upload_part(file),
            pages: pages.clone(),
        },
    }
}

/// Converts an engine error into the session's failure, picking the right fallback text.
pub(crate) fn to_failure(err: TransportError, tool: Option<Tool>) -> Failure {
    match err.kind {
        FailureKind::HttpStatus { status, detail } => {
            let fallback = tool.map_or(UNKNOWN_ERROR_MESSAGE, Tool::failure_message);
            Failure::request(status, detail, fallback)
        }
        _ => Failure::transport(Some(err.message)),
    }
}

/// The request an event finishes for good. A reference delivery is not final
/// yet: its fetch still needs the tool for a failure fallback.
pub(crate) fn settled_request(event: &EngineEvent) -> Option<RequestId> {
    match event {
        EngineEvent::Completed {
            result: Ok(Delivery::Reference(_)),
            ..
        } => None,
        EngineEvent::Completed { request_id, .. }
        | EngineEvent::ReferenceResolved { request_id, .. } => Some(*request_id),
        _ => None,
    }
}

pub(crate) fn map_event(
    event: EngineEvent,
    tool_of: impl Fn(RequestId) -> Option<Tool>,
) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Progress {
            request_id,
            percent,
        } => Msg::TransportProgress {
            request_id,
            percent,
        },
        EngineEvent::Tick {
            request_id,
            increment,
        } => Msg::ProgressTick {
            request_id,
            increment,
        },
        EngineEvent::Completed { request_id, result } => match result {
            Ok(delivery) => Msg::TransportSucceeded {
                request_id,
                payload: match delivery {
                    Delivery::Inline(bytes) => ResultPayload::Inline(bytes.into()),
                    Delivery::Reference(location) => ResultPayload::Reference(location),
                    Delivery::Empty => ResultPayload::Empty,
                },
            },
            Err(err) if err.kind == FailureKind::Cancelled => {
                desk_debug!("{} cancelled", request_label(request_id));
                return None;
            }
            Err(err) => {
                desk_warn!("{} failed: {}", request_label(request_id), err);
                Msg::TransportFailed {
                    request_id,
                    failure: to_failure(err, tool_of(request_id)),
                }
            }
        },
        EngineEvent::ReferenceResolved { request_id, result } => match result {
            Ok(bytes) => Msg::ReferenceResolved {
                request_id,
                result: Ok(bytes.into()),
            },
            Err(err) if err.kind == FailureKind::Cancelled => return None,
            Err(err) => {
                desk_warn!("{} reference failed: {}", request_label(request_id), err);
                Msg::ReferenceResolved {
                    request_id,
                    result: Err(to_failure(err, tool_of(request_id))),
                }
            }
        },
        EngineEvent::NoticeDue { request_id } => Msg::SuccessNoticeDue { request_id },
        EngineEvent::Saved { path } => Msg::ArtifactSaved { path },
        EngineEvent::SaveFailed { message } => Msg::SaveFailed { message },
    };
    Some(msg)
}
