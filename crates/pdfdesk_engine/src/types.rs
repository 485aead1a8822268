use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub type RequestId = u64;

/// One file part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    pub file_name: String,
    pub content: Arc<[u8]>,
}

impl UploadPart {
    pub fn new(file_name: impl Into<String>, content: Arc<[u8]>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}

/// A single call to the processing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Compress { file: UploadPart, level: u8 },
    Merge { files: Vec<UploadPart> },
    /// `pages: None` asks the service to split every page.
    Split {
        file: UploadPart,
        pages: Option<String>,
    },
}

impl Job {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Job::Compress { .. } => "compress-pdf",
            Job::Merge { .. } => "api/merge",
            Job::Split { .. } => "api/split",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Job::Compress { .. } => "compress",
            Job::Merge { .. } => "merge",
            Job::Split { .. } => "split",
        }
    }
}

/// How a successful response delivered its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Inline(Vec<u8>),
    /// Legacy: the body (or `Location` header) only points at the result.
    Reference(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Real download progress, 0 to 100.
    Progress { request_id: RequestId, percent: f32 },
    /// Simulation tick with its pseudo-random increment.
    Tick { request_id: RequestId, increment: f32 },
    Completed {
        request_id: RequestId,
        result: Result<Delivery, TransportError>,
    },
    ReferenceResolved {
        request_id: RequestId,
        result: Result<Vec<u8>, TransportError>,
    },
    NoticeDue { request_id: RequestId },
    Saved { path: PathBuf },
    SaveFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The service's own explanation, when it sent one.
    pub fn detail(&self) -> Option<&str> {
        match &self.kind {
            FailureKind::HttpStatus {
                detail: Some(detail),
                ..
            } => Some(detail),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            FailureKind::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus { status: u16, detail: Option<String> },
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus { status, .. } => write!(f, "http status {status}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
