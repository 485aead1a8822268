use crate::{RequestId, UNKNOWN_ERROR_MESSAGE};

/// Blocking notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success {
        file_name: String,
        reduction_percent: Option<i64>,
    },
    Error {
        message: String,
    },
}

/// Decides which notice is visible. At most one at a time; the latest outcome wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoticeSurface {
    shown: Option<Notice>,
    pending_success: Option<RequestId>,
}

impl NoticeSurface {
    pub fn current(&self) -> Option<&Notice> {
        self.shown.as_ref()
    }

    pub fn pending_success(&self) -> Option<RequestId> {
        self.pending_success
    }

    /// Success is shown later, once progress has had time to render 100%.
    pub(crate) fn schedule_success(&mut self, request_id: RequestId) {
        self.pending_success = Some(request_id);
    }

    /// Shows the success notice if it is still the pending one for `request_id`.
    pub(crate) fn success_due(&mut self, request_id: RequestId, notice: Notice) -> bool {
        if self.pending_success != Some(request_id) {
            return false;
        }
        self.pending_success = None;
        self.shown = Some(notice);
        true
    }

    /// Errors show immediately and cancel any success still waiting.
    pub(crate) fn show_error(&mut self, message: &str) {
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message.to_string()
        };
        self.pending_success = None;
        self.shown = Some(Notice::Error { message });
    }

    pub(crate) fn dismiss(&mut self) -> Option<Notice> {
        self.shown.take()
    }

    pub(crate) fn clear(&mut self) {
        self.shown = None;
        self.pending_success = None;
    }
}
