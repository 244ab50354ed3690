#![warn(missing_docs)]
//! StillMotion - animate a still image into a short AI-generated video.
//!
//! The core is [`VideoOrchestrator`]: it submits an image-to-video job to a
//! [`VideoGenerationService`], polls until the job finishes, and downloads the
//! result through an [`AssetFetcher`]. The API key comes from an injected
//! [`CredentialProvider`] on every call.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use stillmotion::{
//!     AspectRatio, EnvCredential, HttpAssetFetcher, ProgressEvent, SeedImage, VeoService,
//!     VideoOrchestrator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> stillmotion::Result<()> {
//!     let orchestrator = VideoOrchestrator::new(
//!         Arc::new(EnvCredential::default()),
//!         Arc::new(VeoService::builder().build()?),
//!         Arc::new(HttpAssetFetcher::new()),
//!     );
//!
//!     let seed = SeedImage::from_path("dog.png")?;
//!     let on_progress = |event: &ProgressEvent| eprintln!("{event}");
//!     let video = orchestrator
//!         .submit_and_await_video(
//!             "The dog starts running along the beach",
//!             seed,
//!             AspectRatio::Landscape,
//!             &on_progress,
//!         )
//!         .await?;
//!     video.save("dog.mp4")?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `veo` (default): Veo service and HTTP asset fetcher
//! - `cli` (default): `stillmotion` command-line host

pub mod credential;
mod error;
pub mod orchestrator;
pub mod progress;
pub mod video;

// Re-export error types at crate root
pub use error::{ErrorKind, Result, StillMotionError};

pub use credential::{
    ApiKey, CredentialProvider, EnvCredential, SharedCredential, StaticCredential,
};
pub use orchestrator::{OrchestratorConfig, VideoOrchestrator, DEFAULT_POLL_INTERVAL};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use video::{
    AspectRatio, AssetFetcher, GeneratedAsset, GenerationJob, GenerationRequest, JobHandle,
    JobStatus, LocalVideoHandle, Resolution, SeedImage, VideoGenerationService, VideoMetadata,
};

#[cfg(feature = "veo")]
pub use video::providers::{HttpAssetFetcher, VeoModel, VeoService, VeoServiceBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::credential::{CredentialProvider, EnvCredential, StaticCredential};
    pub use crate::error::{Result, StillMotionError};
    pub use crate::orchestrator::{OrchestratorConfig, VideoOrchestrator};
    pub use crate::progress::{ProgressEvent, ProgressSink};
    pub use crate::video::{AspectRatio, LocalVideoHandle, SeedImage};

    #[cfg(feature = "veo")]
    pub use crate::video::providers::{HttpAssetFetcher, VeoService};
}
