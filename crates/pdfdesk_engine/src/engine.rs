use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use pdfdesk_logging::{desk_debug, desk_info, desk_warn, request_label};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::persist::ArtifactWriter;
use crate::ticker::run_progress_timer;
use crate::transport::{ChannelProgressSink, ReqwestTransport, Transport, TransportSettings};
use crate::{EngineEvent, FailureKind, Job, RequestId, TransportError};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub transport: TransportSettings,
    pub tick_interval: Duration,
    pub notice_delay: Duration,
    pub output_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            transport: TransportSettings::default(),
            tick_interval: Duration::from_millis(500),
            notice_delay: Duration::from_millis(500),
            output_dir: PathBuf::from("output"),
        }
    }
}

enum EngineCommand {
    Submit { request_id: RequestId, job: Job },
    Abandon { request_id: RequestId },
    StartTimer { request_id: RequestId },
    CancelTimer { request_id: RequestId },
    ScheduleNotice { request_id: RequestId },
    Resolve { request_id: RequestId, location: String },
    Save { file_name: String, content: Arc<[u8]> },
    Shutdown,
}

/// Handle to the background IO thread. Clones share the same thread.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    worker: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> io::Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(settings.transport.clone()));
        Self::with_transport(settings, transport)
    }

    pub fn with_transport(
        settings: EngineSettings,
        transport: Arc<dyn Transport>,
    ) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        let worker = thread::Builder::new()
            .name("pdfdesk-engine".to_string())
            .spawn(move || {
                let mut worker = Worker::new(settings, transport, event_tx);
                while let Ok(command) = cmd_rx.recv() {
                    if !worker.handle(&runtime, command) {
                        break;
                    }
                }
                worker.stop();
                runtime.shutdown_timeout(Duration::from_secs(1));
                desk_debug!("engine thread stopped");
            })?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            worker: Arc::new(Mutex::new(Some(worker))),
        })
    }

    pub fn submit(&self, request_id: RequestId, job: Job) {
        self.send(EngineCommand::Submit { request_id, job });
    }

    pub fn abandon(&self, request_id: RequestId) {
        self.send(EngineCommand::Abandon { request_id });
    }

    pub fn start_timer(&self, request_id: RequestId) {
        self.send(EngineCommand::StartTimer { request_id });
    }

    pub fn cancel_timer(&self, request_id: RequestId) {
        self.send(EngineCommand::CancelTimer { request_id });
    }

    pub fn schedule_notice(&self, request_id: RequestId) {
        self.send(EngineCommand::ScheduleNotice { request_id });
    }

    pub fn resolve(&self, request_id: RequestId, location: impl Into<String>) {
        self.send(EngineCommand::Resolve {
            request_id,
            location: location.into(),
        });
    }

    pub fn save(&self, file_name: impl Into<String>, content: Arc<[u8]>) {
        self.send(EngineCommand::Save {
            file_name: file_name.into(),
            content,
        });
    }

    /// Cancels everything in flight and waits for the engine thread to exit.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(worker) = worker {
            if worker.join().is_err() {
                desk_warn!("engine thread panicked during shutdown");
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Blocks up to `timeout`; `None` on timeout or once the engine is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            desk_debug!("engine command dropped; engine already stopped");
        }
    }
}

type Task = (CancellationToken, JoinHandle<()>);

struct Worker {
    settings: EngineSettings,
    transport: Arc<dyn Transport>,
    writer: ArtifactWriter,
    event_tx: mpsc::Sender<EngineEvent>,
    root: CancellationToken,
    requests: HashMap<RequestId, Task>,
    timers: HashMap<RequestId, Task>,
}

impl Worker {
    fn new(
        settings: EngineSettings,
        transport: Arc<dyn Transport>,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let writer = ArtifactWriter::new(settings.output_dir.clone());
        Self {
            settings,
            transport,
            writer,
            event_tx,
            root: CancellationToken::new(),
            requests: HashMap::new(),
            timers: HashMap::new(),
        }
    }

    /// Returns false once the engine should stop.
    fn handle(&mut self, runtime: &tokio::runtime::Runtime, command: EngineCommand) -> bool {
        self.requests.retain(|_, (_, handle)| !handle.is_finished());
        self.timers.retain(|_, (_, handle)| !handle.is_finished());

        match command {
            EngineCommand::Submit { request_id, job } => {
                desk_info!("{} submitting {} job", request_label(request_id), job.name());
                let token = self.root.child_token();
                let transport = self.transport.clone();
                let tx = self.event_tx.clone();
                let cancel = token.clone();
                let handle = runtime.spawn(async move {
                    let sink = ChannelProgressSink::new(tx.clone());
                    let result = tokio::select! {
                        _ = cancel.cancelled() => Err(abandoned()),
                        result = transport.submit(request_id, &job, &sink) => result,
                    };
                    let _ = tx.send(EngineEvent::Completed { request_id, result });
                });
                self.track_request(request_id, (token, handle));
            }
            EngineCommand::Resolve {
                request_id,
                location,
            } => {
                let token = self.root.child_token();
                let transport = self.transport.clone();
                let tx = self.event_tx.clone();
                let cancel = token.clone();
                let handle = runtime.spawn(async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => Err(abandoned()),
                        result = transport.fetch_reference(&location) => result,
                    };
                    let _ = tx.send(EngineEvent::ReferenceResolved { request_id, result });
                });
                self.track_request(request_id, (token, handle));
            }
            EngineCommand::Abandon { request_id } => {
                if let Some((token, _)) = self.requests.remove(&request_id) {
                    desk_debug!("{} abandoned", request_label(request_id));
                    token.cancel();
                }
            }
            EngineCommand::StartTimer { request_id } => {
                let token = self.root.child_token();
                let handle = runtime.spawn(run_progress_timer(
                    request_id,
                    self.settings.tick_interval,
                    token.clone(),
                    self.event_tx.clone(),
                ));
                if let Some((old, _)) = self.timers.insert(request_id, (token, handle)) {
                    old.cancel();
                }
            }
            EngineCommand::CancelTimer { request_id } => {
                if let Some((token, _)) = self.timers.remove(&request_id) {
                    token.cancel();
                }
            }
            EngineCommand::ScheduleNotice { request_id } => {
                let delay = self.settings.notice_delay;
                let cancel = self.root.child_token();
                let tx = self.event_tx.clone();
                runtime.spawn(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {
                            let _ = tx.send(EngineEvent::NoticeDue { request_id });
                        }
                    }
                });
            }
            EngineCommand::Save { file_name, content } => {
                let writer = self.writer.clone();
                let tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let written =
                        tokio::task::spawn_blocking(move || writer.write(&file_name, &content))
                            .await;
                    let event = match written {
                        Ok(Ok(path)) => EngineEvent::Saved { path },
                        Ok(Err(err)) => EngineEvent::SaveFailed {
                            message: err.to_string(),
                        },
                        Err(err) => EngineEvent::SaveFailed {
                            message: err.to_string(),
                        },
                    };
                    let _ = tx.send(event);
                });
            }
            EngineCommand::Shutdown => return false,
        }
        true
    }

    fn track_request(&mut self, request_id: RequestId, task: Task) {
        if let Some((old, _)) = self.requests.insert(request_id, task) {
            old.cancel();
        }
    }

    fn stop(&mut self) {
        self.root.cancel();
        self.requests.clear();
        self.timers.clear();
    }
}

fn abandoned() -> TransportError {
    TransportError::new(FailureKind::Cancelled, "request abandoned")
}
