use chrono::{DateTime, Utc};

use crate::{CompressionLevel, Tool, UploadedFile};

/// Monotonically increasing per session; the highest dispatched id is authoritative.
pub type RequestId = u64;

/// What the service is asked to do, with the inputs and options snapshotted at dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestJob {
    Compress {
        file: UploadedFile,
        level: CompressionLevel,
    },
    /// Files in the order they will appear in the merged document.
    Merge { files: Vec<UploadedFile> },
    /// `pages: None` splits every page.
    Split {
        file: UploadedFile,
        pages: Option<String>,
    },
}

impl RequestJob {
    pub fn tool(&self) -> Tool {
        match self {
            RequestJob::Compress { .. } => Tool::Compress,
            RequestJob::Merge { .. } => Tool::Merge,
            RequestJob::Split { .. } => Tool::Split,
        }
    }

    pub fn inputs(&self) -> Vec<&UploadedFile> {
        match self {
            RequestJob::Compress { file, .. } | RequestJob::Split { file, .. } => vec![file],
            RequestJob::Merge { files } => files.iter().collect(),
        }
    }

    pub fn input_bytes(&self) -> u64 {
        self.inputs().iter().map(|file| file.size()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRequest {
    pub id: RequestId,
    pub job: RequestJob,
    pub started_at: DateTime<Utc>,
}

impl ProcessingRequest {
    pub fn tool(&self) -> Tool {
        self.job.tool()
    }
}
