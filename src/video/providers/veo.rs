//! Veo (Google) video generation over the Gemini Developer API.

use crate::credential::ApiKey;
use crate::error::{describe_transport_error, sanitize_error_message, Result, StillMotionError};
use crate::video::provider::{AssetFetcher, VideoGenerationService};
use crate::video::types::{GeneratedAsset, GenerationJob, GenerationRequest, JobHandle};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Gemini Developer API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable that overrides the API root.
pub const BASE_URL_ENV: &str = "STILLMOTION_VEO_BASE_URL";

/// Error text the API returns when the key (or the project behind it) is unknown.
const ENTITY_NOT_FOUND: &str = "requested entity was not found";

/// Veo model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VeoModel {
    /// Veo 3.1 Fast Preview - lower latency, used by default.
    #[default]
    Veo31FastPreview,
    /// Veo 3.1 Preview - full quality.
    Veo31Preview,
}

impl VeoModel {
    /// Returns the Gemini Developer API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veo31FastPreview => "veo-3.1-fast-generate-preview",
            Self::Veo31Preview => "veo-3.1-generate-preview",
        }
    }
}

/// Builder for VeoService.
#[derive(Debug, Clone, Default)]
pub struct VeoServiceBuilder {
    model: VeoModel,
    base_url: Option<String>,
    request_timeout: Option<Duration>,
}

impl VeoServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Veo model variant.
    pub fn model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the API root. Falls back to `STILLMOTION_VEO_BASE_URL`, then the public endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Bounds each individual HTTP request. Unset means the transport default.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the service.
    pub fn build(self) -> Result<VeoService> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|e| {
            StillMotionError::InvalidInput(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(VeoService {
            client: build_client(self.request_timeout)?,
            model: self.model,
            base_url,
        })
    }
}

fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| StillMotionError::InvalidInput(format!("HTTP client setup failed: {e}")))
}

/// Veo job submission and status polling.
pub struct VeoService {
    client: reqwest::Client,
    model: VeoModel,
    base_url: String,
}

/// Which call an HTTP failure came from.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Submit,
    Poll,
}

impl VeoService {
    /// Creates a new `VeoServiceBuilder`.
    pub fn builder() -> VeoServiceBuilder {
        VeoServiceBuilder::new()
    }

    /// Returns the configured API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_operation(
        &self,
        response: reqwest::Response,
        phase: Phase,
    ) -> Result<VeoOperationResponse> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_error(phase, status, &text));
        }
        response
            .json::<VeoOperationResponse>()
            .await
            .map_err(|e| {
                phase_error(
                    phase,
                    None,
                    format!("unreadable operation: {}", describe_transport_error(e)),
                )
            })
    }
}

#[async_trait]
impl VideoGenerationService for VeoService {
    async fn submit(&self, request: &GenerationRequest, key: &ApiKey) -> Result<GenerationJob> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url,
            self.model.as_str()
        );
        let body = VeoRequest::from_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| phase_error(Phase::Submit, None, describe_transport_error(e)))?;

        let operation = self.read_operation(response, Phase::Submit).await?;
        tracing::debug!(operation = %operation.name, model = self.model.as_str(), "Veo job accepted");
        operation.into_job()
    }

    async fn poll(&self, job: &GenerationJob, key: &ApiKey) -> Result<GenerationJob> {
        let url = format!("{}/{}", self.base_url, job.handle.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", key.expose())
            .send()
            .await
            .map_err(|e| phase_error(Phase::Poll, None, describe_transport_error(e)))?;

        self.read_operation(response, Phase::Poll).await?.into_job()
    }

    fn model_name(&self) -> &str {
        self.model.as_str()
    }
}

fn phase_error(phase: Phase, status: Option<u16>, message: String) -> StillMotionError {
    match phase {
        Phase::Submit => StillMotionError::Submission { status, message },
        Phase::Poll => StillMotionError::StatusCheck { status, message },
    }
}

/// Maps a non-success response to a structured error.
fn classify_error(phase: Phase, status: StatusCode, text: &str) -> StillMotionError {
    let message = sanitize_error_message(&error_detail(text));
    if is_credential_rejection(status, &message) {
        return StillMotionError::InvalidCredential(message);
    }
    phase_error(phase, Some(status.as_u16()), message)
}

/// Whether a failed response means the API key was refused, whatever the call.
fn is_credential_rejection(status: StatusCode, message: &str) -> bool {
    status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || message.to_lowercase().contains(ENTITY_NOT_FOUND)
}

/// Pulls `error.message` out of a Google API error body, if there is one.
fn error_detail(text: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: VeoError,
    }

    serde_json::from_str::<Envelope>(text)
        .ok()
        .and_then(|env| env.error.message)
        .unwrap_or_else(|| text.to_string())
}

/// Downloads generated videos, passing the API key as the `key` query parameter.
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl Default for HttpAssetFetcher {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl HttpAssetFetcher {
    /// Creates a fetcher with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher bounding each download by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(Some(timeout))?,
        })
    }
}

/// Appends `key=<api key>` to the asset URI.
fn authorized_url(uri: &str, key: &ApiKey) -> Result<Url> {
    if uri.starts_with("gs://") {
        return Err(StillMotionError::Download {
            status: None,
            message: "Google Cloud Storage URIs cannot be downloaded directly".into(),
        });
    }
    let mut url = Url::parse(uri).map_err(|e| StillMotionError::Download {
        status: None,
        message: format!("invalid video URI: {e}"),
    })?;
    url.query_pairs_mut().append_pair("key", key.expose());
    Ok(url)
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, asset: &GeneratedAsset, key: &ApiKey) -> Result<Bytes> {
        let url = authorized_url(&asset.download_uri, key)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StillMotionError::Download {
                status: None,
                message: describe_transport_error(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = sanitize_error_message(&error_detail(&text));
            if is_credential_rejection(status, &message) {
                return Err(StillMotionError::InvalidCredential(message));
            }
            return Err(StillMotionError::Download {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.bytes().await.map_err(|e| StillMotionError::Download {
            status: None,
            message: describe_transport_error(e),
        })
    }
}

// ── Gemini Developer API wire format ────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

/// Inline data wrapper for the Gemini API (`{"inlineData": {"mimeType": "...", "data": "..."}}`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoMediaData {
    inline_data: VeoInlineData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInstance {
    prompt: String,
    image: VeoMediaData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: String,
    resolution: String,
    number_of_videos: u32,
}

impl VeoRequest {
    fn from_request(req: &GenerationRequest) -> Self {
        Self {
            instances: vec![VeoInstance {
                prompt: req.prompt.clone(),
                image: VeoMediaData {
                    inline_data: VeoInlineData {
                        mime_type: req.seed_image.mime_type.clone(),
                        data: req.seed_image.base64_payload.clone(),
                    },
                },
            }],
            parameters: VeoParameters {
                aspect_ratio: req.aspect_ratio.as_str().to_string(),
                resolution: req.resolution.as_str().to_string(),
                number_of_videos: req.video_count,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    message: Option<String>,
}

impl VeoOperationResponse {
    /// Converts the wire operation into a job snapshot.
    ///
    /// An operation-level error is terminal whether or not `done` is set.
    fn into_job(self) -> Result<GenerationJob> {
        if let Some(err) = self.error {
            let message = err.message.unwrap_or_else(|| "Unknown error".into());
            if message.to_lowercase().contains(ENTITY_NOT_FOUND) {
                return Err(StillMotionError::InvalidCredential(message));
            }
            return Err(StillMotionError::GenerationFailed(message));
        }

        let handle = JobHandle::new(self.name);
        if !self.done.unwrap_or(false) {
            return Ok(GenerationJob::pending(handle));
        }

        let Some(gen_resp) = self.response.and_then(|r| r.generate_video_response) else {
            return Ok(GenerationJob::done(handle, None));
        };

        let uri = gen_resp
            .generated_samples
            .as_ref()
            .and_then(|samples| samples.first())
            .and_then(|sample| sample.video.as_ref())
            .and_then(|video| video.uri.clone());

        if uri.is_none() && gen_resp.rai_media_filtered_count.unwrap_or(0) > 0 {
            let reason = gen_resp
                .rai_media_filtered_reasons
                .and_then(|reasons| reasons.into_iter().next())
                .unwrap_or_else(|| "Video was filtered by Veo safety filters".into());
            return Err(StillMotionError::ContentBlocked(reason));
        }

        Ok(GenerationJob::done(handle, uri.map(GeneratedAsset::new)))
    }
}
