use thiserror::Error;

/// Shown when neither the service nor the transport said anything useful.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Local validation failures. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no supported files")]
    NoSupportedFiles,
    #[error("no PDF file to process")]
    NoFiles,
    #[error("please add at least 2 PDF files to merge (have {found})")]
    MergeNeedsTwo { found: usize },
    #[error("split works on exactly one PDF file (have {found})")]
    SplitNeedsOne { found: usize },
    #[error("enter the pages to extract, for example 1,3,5-9")]
    EmptyPageRange,
    #[error("compression level must be between 1 and 4 (got {0})")]
    CompressionLevelOutOfRange(u8),
}

/// Every way a processing attempt can end unsuccessfully, as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The service answered with a non-success status.
    #[error("{message}")]
    Request { status: u16, message: String },
    /// No response at all (connect failure, timeout, aborted body).
    #[error("{message}")]
    Transport { message: String },
    /// The service claimed success but delivered neither bytes nor a location.
    #[error("the service reported success but returned no document")]
    MissingArtifact,
}

impl Failure {
    /// Builds a request failure, preferring the service's `detail` text.
    pub fn request(status: u16, detail: Option<String>, fallback: &str) -> Self {
        let message = detail
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Failure::Request { status, message }
    }

    /// Builds a transport failure from the underlying fault description, if any.
    pub fn transport(description: Option<String>) -> Self {
        let message = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        Failure::Transport { message }
    }

    /// Message for the error notice; never empty.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failure_prefers_detail() {
        let failure = Failure::request(400, Some("Invalid page range: 9-3".into()), "Failed to split PDF");
        assert_eq!(failure.user_message(), "Invalid page range: 9-3");
    }

    #[test]
    fn request_failure_falls_back_on_blank_detail() {
        let failure = Failure::request(500, Some("   ".into()), "Failed to merge PDFs");
        assert_eq!(
            failure,
            Failure::Request {
                status: 500,
                message: "Failed to merge PDFs".into()
            }
        );
    }

    #[test]
    fn transport_failure_without_description_is_generic() {
        assert_eq!(Failure::transport(None).user_message(), UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn validation_message_is_passed_through() {
        let failure = Failure::from(ValidationError::NoSupportedFiles);
        assert_eq!(failure.user_message(), "no supported files");
    }
}
