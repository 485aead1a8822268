//! PdfDesk engine: talks to the processing service and runs timers and saves off the UI thread.
mod engine;
mod persist;
mod ticker;
mod transport;
mod types;

pub use engine::{EngineHandle, EngineSettings};
pub use persist::{prepare_save_dir, ArtifactWriter, PersistError};
pub use ticker::{random_increment, MAX_TICK_INCREMENT};
pub use transport::{
    ChannelProgressSink, ProgressSink, ReqwestTransport, Transport, TransportSettings,
};
pub use types::{Delivery, EngineEvent, FailureKind, Job, RequestId, TransportError, UploadPart};
