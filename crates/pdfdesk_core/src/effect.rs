use std::sync::Arc;

use crate::{ProcessingRequest, RequestId};

/// Side effects requested by [`crate::update`]. The runner reports back with [`crate::Msg`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the request to the processing service.
    Dispatch { request: ProcessingRequest },
    /// A newer request replaced this one; its network call may be aborted.
    Abandon { request_id: RequestId },
    StartProgressTimer { request_id: RequestId },
    CancelProgressTimer { request_id: RequestId },
    /// Deliver `Msg::SuccessNoticeDue` after the notice delay.
    ScheduleSuccessNotice { request_id: RequestId },
    /// Fetch the bytes behind a legacy success reference.
    ResolveReference {
        request_id: RequestId,
        location: String,
    },
    SaveArtifact {
        file_name: String,
        content: Arc<[u8]>,
    },
}
