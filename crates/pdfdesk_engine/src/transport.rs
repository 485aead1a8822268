use std::time::Duration;

use futures_util::StreamExt;
use pdfdesk_logging::{desk_debug, request_label};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::{Delivery, EngineEvent, FailureKind, Job, RequestId, TransportError, UploadPart};

const PDF_MIME: &str = "application/pdf";

/// JSON keys a legacy response may use to point at its result.
const REFERENCE_KEYS: [&str; 4] = ["download_url", "url", "location", "file_url"];

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_bytes: 200 * 1024 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The processing service as seen by the engine.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Uploads the job's files and returns whatever the service delivered.
    async fn submit(
        &self,
        request_id: RequestId,
        job: &Job,
        sink: &dyn ProgressSink,
    ) -> Result<Delivery, TransportError>;

    /// Downloads the content behind a reference returned by `submit`.
    async fn fetch_reference(&self, location: &str) -> Result<Vec<u8>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: TransportSettings,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))
    }

    fn base(&self) -> Result<Url, TransportError> {
        let raw = self.settings.base_url.trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Url::parse(&with_slash)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn endpoint(&self, job: &Job) -> Result<Url, TransportError> {
        self.base()?
            .join(job.endpoint())
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// Resolves a possibly relative reference against the service address.
    pub fn resolve_location(&self, location: &str) -> Result<Url, TransportError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(TransportError::new(
                FailureKind::InvalidUrl,
                "empty result reference",
            ));
        }
        self.base()?
            .join(location)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> TransportError {
        TransportError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }

    /// Streams the body, mirroring download progress when the length is known.
    async fn read_body(
        &self,
        response: reqwest::Response,
        progress: Option<(RequestId, &dyn ProgressSink)>,
    ) -> Result<Vec<u8>, TransportError> {
        let total = response.content_length();
        if let Some(len) = total {
            if len > self.settings.max_bytes {
                return Err(self.too_large(len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
            if let (Some(total), Some((request_id, sink))) = (total, progress) {
                if total > 0 {
                    let percent = (bytes.len() as f64 / total as f64 * 100.0) as f32;
                    sink.emit(EngineEvent::Progress {
                        request_id,
                        percent: percent.min(100.0),
                    });
                }
            }
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn submit(
        &self,
        request_id: RequestId,
        job: &Job,
        sink: &dyn ProgressSink,
    ) -> Result<Delivery, TransportError> {
        let url = self.endpoint(job)?;
        let client = self.build_client()?;
        let form = build_form(job)?;

        desk_debug!(
            "{} posting {} job to {}",
            request_label(request_id),
            job.name(),
            url
        );

        let response = client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = self.read_body(response, None).await.unwrap_or_default();
            return Err(TransportError::new(
                FailureKind::HttpStatus {
                    status: status.as_u16(),
                    detail: extract_detail(&body),
                },
                status.to_string(),
            ));
        }

        let location = header_text(&response, LOCATION);
        let is_json = header_text(&response, CONTENT_TYPE)
            .map(|ct| {
                ct.split(';')
                    .next()
                    .unwrap_or(&ct)
                    .trim()
                    .eq_ignore_ascii_case("application/json")
            })
            .unwrap_or(false);

        let body = self.read_body(response, Some((request_id, sink))).await?;
        Ok(classify_body(body, is_json, location))
    }

    async fn fetch_reference(&self, location: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.resolve_location(location)?;
        let client = self.build_client()?;
        desk_debug!("resolving result reference {}", url);

        let response = client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus {
                    status: status.as_u16(),
                    detail: None,
                },
                status.to_string(),
            ));
        }
        self.read_body(response, None).await
    }
}

fn header_text(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn pdf_part(file: &UploadPart) -> Result<Part, TransportError> {
    Part::bytes(file.content.to_vec())
        .file_name(file.file_name.clone())
        .mime_str(PDF_MIME)
        .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))
}

fn build_form(job: &Job) -> Result<Form, TransportError> {
    let form = match job {
        Job::Compress { file, level } => Form::new()
            .part("file", pdf_part(file)?)
            .text("compression_level", level.to_string()),
        Job::Merge { files } => {
            let mut form = Form::new();
            for file in files {
                form = form.part("files", pdf_part(file)?);
            }
            form
        }
        Job::Split { file, pages } => {
            let form = Form::new().part("file", pdf_part(file)?);
            match pages {
                Some(pages) => form.text("pages", pages.clone()),
                None => form.text("split_all", "true"),
            }
        }
    };
    Ok(form)
}

/// Decides whether a success body is the result itself or a pointer to it.
pub(crate) fn classify_body(body: Vec<u8>, is_json: bool, location: Option<String>) -> Delivery {
    if is_json {
        if let Some(reference) = reference_from_json(&body) {
            return Delivery::Reference(reference);
        }
    }
    if body.is_empty() {
        return match location.filter(|loc| !loc.trim().is_empty()) {
            Some(location) => Delivery::Reference(location),
            None => Delivery::Empty,
        };
    }
    Delivery::Inline(body)
}

fn reference_from_json(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;
    REFERENCE_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .filter_map(|value| value.as_str())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Pulls the service's `detail` explanation out of an error body.
///
/// `detail` is either a string or a list of validation entries carrying `msg`.
pub(crate) fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let detail = value.get("detail")?;
    let text = match detail {
        serde_json::Value::String(text) => text.trim().to_string(),
        serde_json::Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| entry.get("msg").and_then(|msg| msg.as_str()))
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return TransportError::new(FailureKind::InvalidUrl, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
