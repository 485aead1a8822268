use std::path::PathBuf;
use std::sync::Arc;

use crate::{CandidateFile, Failure, FileIdentity, OptionChange, RequestId, ResultPayload, Tool};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User dropped or picked files.
    FilesDropped(Vec<CandidateFile>),
    /// User removed a file from the session.
    FileRemoved(FileIdentity),
    /// User reordered the merge list.
    FileMoved { from: usize, to: usize },
    /// User switched tools.
    ToolSelected(Tool),
    /// User edited a tool option.
    OptionChanged(OptionChange),
    /// User confirmed merge or split (or re-ran compress).
    SubmitClicked,
    /// User asked to save the current artifact.
    SaveClicked,
    /// User closed the visible notice.
    NoticeDismissed,
    /// User started over with an empty session.
    ResetClicked,
    /// The front end is going away.
    Shutdown,
    /// Real progress reported by the transport.
    TransportProgress { request_id: RequestId, percent: f32 },
    /// Simulation timer tick carrying its pseudo-random increment.
    ProgressTick { request_id: RequestId, increment: f32 },
    /// The service answered with a success status.
    TransportSucceeded {
        request_id: RequestId,
        payload: ResultPayload,
    },
    /// The service answered with an error, or never answered.
    TransportFailed {
        request_id: RequestId,
        failure: Failure,
    },
    /// A legacy reference was fetched (or not).
    ReferenceResolved {
        request_id: RequestId,
        result: Result<Arc<[u8]>, Failure>,
    },
    /// The success notice delay elapsed.
    SuccessNoticeDue { request_id: RequestId },
    ArtifactSaved { path: PathBuf },
    SaveFailed { message: String },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
