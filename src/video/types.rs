//! Core types for video generation.

use crate::error::{Result, StillMotionError};
use crate::video::seed::SeedImage;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Aspect ratio of the generated video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StillMotionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            other => Err(StillMotionError::InvalidInput(format!(
                "unsupported aspect ratio '{other}' (expected 16:9 or 9:16)"
            ))),
        }
    }
}

/// Output resolution tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// 1280x720.
    #[default]
    #[serde(rename = "720p")]
    Hd720,
    /// 1920x1080.
    #[serde(rename = "1080p")]
    Hd1080,
}

impl Resolution {
    /// Returns the wire identifier (e.g., "720p").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd720 => "720p",
            Self::Hd1080 => "1080p",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully specified image-to-video request.
///
/// Built by the orchestrator from caller input plus its fixed configuration,
/// and only ever handed to a service by shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// The text prompt describing the desired motion.
    pub prompt: String,
    /// The still image the video starts from.
    pub seed_image: SeedImage,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Number of videos to generate.
    pub video_count: u32,
    /// Output resolution.
    pub resolution: Resolution,
}

/// Opaque token identifying a job on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wraps a service-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as issued by the service.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a job. Only ever moves from `Pending` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Still running on the service.
    Pending,
    /// Finished; the result (if any) is attached.
    Done,
}

/// Reference to a finished video held by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAsset {
    /// Download URI. Fetching it requires the API key.
    pub download_uri: String,
}

impl GeneratedAsset {
    /// Creates an asset reference.
    pub fn new(download_uri: impl Into<String>) -> Self {
        Self {
            download_uri: download_uri.into(),
        }
    }

    /// Returns true if the reference can be dereferenced.
    pub fn is_usable(&self) -> bool {
        !self.download_uri.trim().is_empty()
    }
}

/// Snapshot of a remote job as last reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    /// Service-issued handle, passed back when polling.
    pub handle: JobHandle,
    /// Current status.
    pub status: JobStatus,
    /// Result reference, present only once the job is done.
    pub asset: Option<GeneratedAsset>,
}

impl GenerationJob {
    /// A job the service is still working on.
    pub fn pending(handle: JobHandle) -> Self {
        Self {
            handle,
            status: JobStatus::Pending,
            asset: None,
        }
    }

    /// A finished job with an optional result.
    pub fn done(handle: JobHandle, asset: Option<GeneratedAsset>) -> Self {
        Self {
            handle,
            status: JobStatus::Done,
            asset,
        }
    }

    /// Returns true once the service has reported completion.
    pub fn is_done(&self) -> bool {
        self.status == JobStatus::Done
    }
}

/// Metadata about the video generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Wall-clock time from submission to download, in milliseconds.
    pub duration_ms: Option<u64>,
    /// Number of status checks performed.
    pub status_checks: u32,
    /// Video resolution.
    pub resolution: Option<String>,
    /// Aspect ratio.
    pub aspect_ratio: Option<String>,
}

/// A downloaded video, owned by the caller.
///
/// Each handle carries a unique id so hosts can register it (for example as a
/// playback source) and release it by dropping the handle.
#[derive(Debug, Clone)]
pub struct LocalVideoHandle {
    id: Uuid,
    data: Bytes,
    mime_type: String,
    metadata: VideoMetadata,
}

impl LocalVideoHandle {
    /// Wraps downloaded video bytes.
    pub fn new(data: Bytes, mime_type: impl Into<String>, metadata: VideoMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Unique id of this handle.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Local address of the video, e.g. `stillmotion:video/<uuid>`.
    pub fn local_ref(&self) -> String {
        format!("stillmotion:video/{}", self.id)
    }

    /// Raw video bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// MIME type (e.g., "video/mp4").
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Generation metadata.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Returns the size of the video data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the video to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Returns the video as a data URL.
    pub fn to_data_url(&self) -> String {
        use base64::Engine;
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// Consumes the handle, returning the bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}
