//! Submit → poll → download orchestration.

use crate::credential::CredentialProvider;
use crate::error::{Result, StillMotionError};
use crate::progress::{report_isolated, ProgressEvent, ProgressSink};
use crate::video::{
    AspectRatio, AssetFetcher, GeneratedAsset, GenerationJob, GenerationRequest, LocalVideoHandle,
    Resolution, SeedImage, VideoGenerationService, VideoMetadata,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default time between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// MIME type of videos produced by the service.
const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Fixed generation settings applied to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Delay between status checks. Defaults to 10 seconds.
    pub poll_interval: Duration,
    /// Resolution tier requested. Defaults to 720p.
    pub resolution: Resolution,
    /// Videos requested per job. Defaults to 1.
    pub video_count: u32,
    /// Upper bound on the whole operation. `None` (the default) waits as long
    /// as the service keeps reporting the job as pending.
    pub max_wait: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            resolution: Resolution::default(),
            video_count: 1,
            max_wait: None,
        }
    }
}

impl OrchestratorConfig {
    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the resolution tier.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets an overall deadline.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

/// Turns a still image into a video by driving a [`VideoGenerationService`].
///
/// Holds no per-call state, so one orchestrator can serve concurrent calls.
pub struct VideoOrchestrator {
    credentials: Arc<dyn CredentialProvider>,
    service: Arc<dyn VideoGenerationService>,
    fetcher: Arc<dyn AssetFetcher>,
    config: OrchestratorConfig,
}

impl VideoOrchestrator {
    /// Creates an orchestrator with the default configuration.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        service: Arc<dyn VideoGenerationService>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        Self::with_config(credentials, service, fetcher, OrchestratorConfig::default())
    }

    /// Creates an orchestrator with an explicit configuration.
    pub fn with_config(
        credentials: Arc<dyn CredentialProvider>,
        service: Arc<dyn VideoGenerationService>,
        fetcher: Arc<dyn AssetFetcher>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            credentials,
            service,
            fetcher,
            config,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Submits a generation job, waits for it to finish and downloads the video.
    ///
    /// Every failure is terminal; nothing is retried.
    pub async fn submit_and_await_video(
        &self,
        prompt: &str,
        seed_image: SeedImage,
        aspect_ratio: AspectRatio,
        on_progress: &dyn ProgressSink,
    ) -> Result<LocalVideoHandle> {
        self.submit_and_await_video_with_cancel(
            prompt,
            seed_image,
            aspect_ratio,
            on_progress,
            &CancellationToken::new(),
        )
        .await
    }

    /// Like [`submit_and_await_video`](Self::submit_and_await_video), but
    /// stops with [`StillMotionError::Cancelled`] as soon as `cancel` fires.
    pub async fn submit_and_await_video_with_cancel(
        &self,
        prompt: &str,
        seed_image: SeedImage,
        aspect_ratio: AspectRatio,
        on_progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<LocalVideoHandle> {
        let run = self.run(prompt, seed_image, aspect_ratio, on_progress, cancel);
        match self.config.max_wait {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| StillMotionError::DeadlineExceeded(limit))?,
            None => run.await,
        }
    }

    async fn run(
        &self,
        prompt: &str,
        seed_image: SeedImage,
        aspect_ratio: AspectRatio,
        on_progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<LocalVideoHandle> {
        if prompt.trim().is_empty() {
            return Err(StillMotionError::InvalidInput("prompt must not be empty".into()));
        }

        let start = Instant::now();
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            seed_image,
            aspect_ratio,
            video_count: self.config.video_count,
            resolution: self.config.resolution,
        };

        let key = self.credentials.api_key()?;

        let mut job = cancellable(cancel, self.service.submit(&request, &key)).await?;
        tracing::debug!(job = %job.handle, "submitted video generation request");
        report_isolated(on_progress, ProgressEvent::Submitted);

        let mut checks = 0u32;
        while !job.is_done() {
            checks += 1;
            report_isolated(on_progress, ProgressEvent::Checking { check: checks });
            cancellable(cancel, async {
                tokio::time::sleep(self.config.poll_interval).await;
                Ok(())
            })
            .await?;
            let next = cancellable(cancel, self.service.poll(&job, &key)).await?;
            job = next;
            tracing::debug!(
                job = %job.handle,
                check = checks,
                elapsed_secs = start.elapsed().as_secs(),
                done = job.is_done(),
                "polled video generation"
            );
        }

        report_isolated(on_progress, ProgressEvent::Downloading);
        let asset = completed_asset(job)?;
        let data = cancellable(cancel, self.fetcher.fetch(&asset, &key)).await?;
        tracing::debug!(bytes = data.len(), "downloaded generated video");

        Ok(LocalVideoHandle::new(
            data,
            VIDEO_MIME_TYPE,
            VideoMetadata {
                model: Some(self.service.model_name().to_string()),
                duration_ms: Some(start.elapsed().as_millis() as u64),
                status_checks: checks,
                resolution: Some(request.resolution.to_string()),
                aspect_ratio: Some(request.aspect_ratio.to_string()),
            },
        ))
    }
}

fn completed_asset(job: GenerationJob) -> Result<GeneratedAsset> {
    job.asset
        .filter(|asset| asset.is_usable())
        .ok_or(StillMotionError::MissingAsset)
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    step: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StillMotionError::Cancelled),
        result = step => result,
    }
}
