use std::sync::Arc;

use crate::Failure;

/// Success body as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPayload {
    /// The document bytes themselves.
    Inline(Arc<[u8]>),
    /// Legacy shape: a location the bytes must be fetched from.
    Reference(String),
    /// Neither; the service broke its contract.
    Empty,
}

/// What the session has to do with a success payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    Ready(Arc<[u8]>),
    NeedsFetch(String),
    Missing,
}

/// Collapses the two success shapes: bytes are the artifact, a reference must
/// be resolved to bytes before anything is downloadable.
pub fn materialize(payload: ResultPayload) -> Materialized {
    match payload {
        ResultPayload::Inline(bytes) => Materialized::Ready(bytes),
        ResultPayload::Reference(location) if !location.trim().is_empty() => {
            Materialized::NeedsFetch(location.trim().to_string())
        }
        ResultPayload::Reference(_) | ResultPayload::Empty => Materialized::Missing,
    }
}

/// `round((1 - result/original) * 100)`; `None` when the original size is unknown or zero.
pub fn reduction_percent(original_size: u64, result_size: u64) -> Option<i64> {
    if original_size == 0 {
        return None;
    }
    let ratio = result_size as f64 / original_size as f64;
    Some(((1.0 - ratio) * 100.0).round() as i64)
}

/// Canonical downloadable output of a processing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedArtifact {
    content: Arc<[u8]>,
    file_name: String,
    original_size: Option<u64>,
}

impl ProcessedArtifact {
    pub fn new(content: Arc<[u8]>, file_name: impl Into<String>, original_size: Option<u64>) -> Self {
        Self {
            content,
            file_name: file_name.into(),
            original_size,
        }
    }

    pub fn content(&self) -> &Arc<[u8]> {
        &self.content
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn original_size(&self) -> Option<u64> {
        self.original_size
    }

    pub fn result_size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn reduction_percent(&self) -> Option<i64> {
        self.original_size
            .and_then(|original| reduction_percent(original, self.result_size()))
    }
}

/// Exactly one of these ends every dispatched request that is not superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingResult {
    Success(ProcessedArtifact),
    Failure(Failure),
}
