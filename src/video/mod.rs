//! Video generation module.

mod provider;
pub mod providers;
mod seed;
mod types;

pub use provider::{AssetFetcher, VideoGenerationService};
pub use seed::{ImageFormat, SeedImage, OCTET_STREAM};
pub use types::{
    AspectRatio, GeneratedAsset, GenerationJob, GenerationRequest, JobHandle, JobStatus,
    LocalVideoHandle, Resolution, VideoMetadata,
};
