use std::sync::Arc;

use crate::{Tool, ValidationError};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DEFAULT_MERGE_MAX_FILES: usize = 10;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// A file offered to the session, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    /// Declared MIME type, when the source knows one.
    pub content_type: Option<String>,
    pub content: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        content_type: Option<String>,
        content: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type,
            content: content.into(),
        }
    }

    fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn is_pdf(&self) -> bool {
        let declared = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
            .is_some_and(|ct| ct.eq_ignore_ascii_case(PDF_CONTENT_TYPE));
        declared || self.name.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// Deduplication key: two files are the same if name and size match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub name: String,
    pub size: u64,
}

/// A file accepted into the session. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    content_type: Option<String>,
    content: Arc<[u8]>,
}

impl UploadedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content(&self) -> &Arc<[u8]> {
        &self.content
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            name: self.name.clone(),
            size: self.size(),
        }
    }

    fn same_as(&self, candidate: &CandidateFile) -> bool {
        self.name == candidate.name && self.size() == candidate.size()
    }
}

impl From<CandidateFile> for UploadedFile {
    fn from(candidate: CandidateFile) -> Self {
        Self {
            name: candidate.name,
            content_type: candidate.content_type,
            content: candidate.content,
        }
    }
}

/// Limits applied at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakePolicy {
    pub merge_max_files: usize,
    pub max_file_bytes: u64,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            merge_max_files: DEFAULT_MERGE_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl IntakePolicy {
    pub fn capacity(&self, tool: Tool) -> usize {
        if tool.is_multi_file() {
            self.merge_max_files
        } else {
            1
        }
    }
}

/// Result of a successful intake: the complete new file set plus what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFiles {
    pub files: Vec<UploadedFile>,
    pub added: usize,
    pub duplicates: usize,
    pub over_capacity: usize,
}

/// Validates a batch of candidates against the current file set.
///
/// Non-PDF and oversize candidates are filtered out; if nothing remains the
/// batch fails with [`ValidationError::NoSupportedFiles`]. Multi-file tools
/// append new files up to the remaining capacity, dropping duplicates and the
/// excess silently. Single-file tools replace the current file with the first
/// supported candidate.
pub fn accept(
    current: &[UploadedFile],
    candidates: Vec<CandidateFile>,
    tool: Tool,
    policy: &IntakePolicy,
) -> Result<AcceptedFiles, ValidationError> {
    let supported: Vec<CandidateFile> = candidates
        .into_iter()
        .filter(|candidate| candidate.is_pdf() && candidate.size() <= policy.max_file_bytes)
        .collect();

    if supported.is_empty() {
        return Err(ValidationError::NoSupportedFiles);
    }

    if !tool.is_multi_file() {
        let total = supported.len();
        let first = supported.into_iter().next().map(UploadedFile::from);
        return Ok(AcceptedFiles {
            files: first.into_iter().collect(),
            added: 1,
            duplicates: 0,
            over_capacity: total - 1,
        });
    }

    let mut files = current.to_vec();
    let remaining = policy.merge_max_files.saturating_sub(files.len());
    let mut added = 0;
    let mut duplicates = 0;
    let mut over_capacity = 0;

    for candidate in supported {
        if files.iter().any(|existing| existing.same_as(&candidate)) {
            duplicates += 1;
            continue;
        }
        if added >= remaining {
            over_capacity += 1;
            continue;
        }
        files.push(candidate.into());
        added += 1;
    }

    Ok(AcceptedFiles {
        files,
        added,
        duplicates,
        over_capacity,
    })
}
