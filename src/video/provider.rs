//! Service traits the orchestrator is built on.

use crate::credential::ApiKey;
use crate::error::Result;
use crate::video::types::{GeneratedAsset, GenerationJob, GenerationRequest};
use async_trait::async_trait;
use bytes::Bytes;

/// A remote service that runs long-running video generation jobs.
#[async_trait]
pub trait VideoGenerationService: Send + Sync {
    /// Submits a request and returns the job as first reported.
    ///
    /// A rejected credential must surface as
    /// [`StillMotionError::InvalidCredential`](crate::StillMotionError::InvalidCredential).
    async fn submit(&self, request: &GenerationRequest, key: &ApiKey) -> Result<GenerationJob>;

    /// Re-fetches the status of a previously returned job.
    async fn poll(&self, job: &GenerationJob, key: &ApiKey) -> Result<GenerationJob>;

    /// Model identifier reported in video metadata.
    fn model_name(&self) -> &str;
}

/// Retrieves the binary behind a [`GeneratedAsset`].
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Downloads the asset, authorizing the request with `key`.
    async fn fetch(&self, asset: &GeneratedAsset, key: &ApiKey) -> Result<Bytes>;
}
