//! PdfDesk core: pure session state machine and view-model helpers.
//!
//! Everything here is deterministic. IO, timers and the clock live outside;
//! they talk to the core only through [`Msg`] values and [`Effect`] requests.
mod effect;
mod error;
mod filename;
mod intake;
mod msg;
mod notice;
mod progress;
mod request;
mod result;
mod session;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{Failure, ValidationError, UNKNOWN_ERROR_MESSAGE};
pub use filename::{base_name, suggested_file_name, timestamp14};
pub use intake::{
    accept, AcceptedFiles, CandidateFile, FileIdentity, IntakePolicy, UploadedFile,
    DEFAULT_MAX_FILE_BYTES, DEFAULT_MERGE_MAX_FILES, PDF_CONTENT_TYPE,
};
pub use msg::Msg;
pub use notice::{Notice, NoticeSurface};
pub use progress::{ProgressSource, ProgressState, MAX_SIMULATED_INCREMENT, SIMULATED_CEILING};
pub use request::{ProcessingRequest, RequestId, RequestJob};
pub use result::{
    materialize, reduction_percent, Materialized, ProcessedArtifact, ProcessingResult,
    ResultPayload,
};
pub use session::{CompressionLevel, OptionChange, SplitMode, Tool, ToolOptions};
pub use state::{AppState, Clock, SessionPhase};
pub use update::update;
pub use view_model::{AppViewModel, FileRowView, PhaseKind, ResultView};
