//! CLI for StillMotion - animate a still image with Veo.

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stillmotion::{
    AspectRatio, CredentialProvider, EnvCredential, HttpAssetFetcher, OrchestratorConfig,
    ProgressEvent, SeedImage, VeoModel, VeoService, VideoOrchestrator,
};
use tracing_subscriber::EnvFilter;

/// Prompts used when none is given on the command line.
const CANNED_PROMPTS: &[&str] = &[
    "Bring this image to life with gentle, natural motion",
    "A slow cinematic push-in with subtle parallax",
    "The scene comes alive as a soft breeze moves through it",
    "Animate the subject with a calm, looping motion",
    "A dreamy camera drift with soft light shifting across the scene",
];

#[derive(Parser)]
#[command(name = "stillmotion")]
#[command(about = "Turn a still image into a short AI-generated video (Veo)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video from a still image
    Generate(GenerateArgs),

    /// Report whether an API key is available
    Check,
}

#[derive(Args)]
struct GenerateArgs {
    /// Seed image (PNG, JPEG or WebP file, or a data: URL)
    image: String,

    /// Text prompt describing the motion (a canned prompt is picked if omitted)
    #[arg(short, long)]
    prompt: Option<String>,

    /// Output file path
    #[arg(short, long, default_value = "stillmotion.mp4")]
    output: PathBuf,

    /// Aspect ratio
    #[arg(short, long, value_enum, default_value = "16:9")]
    aspect_ratio: AspectRatioArg,

    /// Veo model
    #[arg(short, long, value_enum, default_value = "fast")]
    model: ModelArg,

    /// Seconds between status checks
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// Give up after this many seconds (waits indefinitely if omitted)
    #[arg(long)]
    max_wait: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Fast,
    Standard,
}

impl From<ModelArg> for VeoModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Fast => VeoModel::Veo31FastPreview,
            ModelArg::Standard => VeoModel::Veo31Preview,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            generate(args, cli.json).await?;
        }
        Commands::Check => {
            check(cli.json)?;
        }
    }

    Ok(())
}

fn load_seed_image(image: &str) -> anyhow::Result<SeedImage> {
    if image.starts_with("data:") {
        return Ok(SeedImage::from_data_url(image));
    }
    let seed = SeedImage::from_path(image)?;
    if !seed.mime_type.starts_with("image/") {
        anyhow::bail!("{image} does not look like a PNG, JPEG or WebP image");
    }
    Ok(seed)
}

fn pick_prompt(prompt: Option<String>) -> String {
    prompt
        .filter(|p| !p.trim().is_empty())
        .or_else(|| {
            CANNED_PROMPTS
                .choose(&mut rand::thread_rng())
                .map(|p| p.to_string())
        })
        .unwrap_or_else(|| CANNED_PROMPTS[0].to_string())
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let seed = load_seed_image(&args.image)?;
    let prompt = pick_prompt(args.prompt);

    let mut config =
        OrchestratorConfig::default().with_poll_interval(Duration::from_secs(args.poll_interval));
    if let Some(secs) = args.max_wait {
        config = config.with_max_wait(Duration::from_secs(secs));
    }

    let credentials = Arc::new(EnvCredential::default());
    let service = VeoService::builder().model(args.model.into()).build()?;
    let orchestrator = VideoOrchestrator::with_config(
        credentials,
        Arc::new(service),
        Arc::new(HttpAssetFetcher::new()),
        config,
    );

    let on_progress = |event: &ProgressEvent| {
        if !json_output {
            eprintln!("{event}");
        }
    };

    let result = orchestrator
        .submit_and_await_video(&prompt, seed, args.aspect_ratio.into(), &on_progress)
        .await;

    let video = match result {
        Ok(video) => video,
        Err(e) if e.is_credential_error() => {
            anyhow::bail!(
                "{e}\nSet GOOGLE_API_KEY to a key from a Google Cloud project with billing enabled."
            );
        }
        Err(e) => return Err(e.into()),
    };

    video.save(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "video",
            "success": true,
            "output": args.output.display().to_string(),
            "size_bytes": video.size(),
            "prompt": prompt,
            "model": video.metadata().model,
            "aspect_ratio": video.metadata().aspect_ratio,
            "resolution": video.metadata().resolution,
            "status_checks": video.metadata().status_checks,
            "duration_ms": video.metadata().duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated video: {} ({} bytes)",
            args.output.display(),
            video.size()
        );
        if let Some(duration) = video.metadata().duration_ms {
            println!("Generation time: {}ms", duration);
        }
    }

    Ok(())
}

fn check(json_output: bool) -> anyhow::Result<()> {
    let credentials = EnvCredential::default();
    let available = credentials.has_credential();

    if json_output {
        let result = serde_json::json!({
            "credential": available,
            "env_vars": stillmotion::credential::DEFAULT_KEY_ENV_VARS,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if available {
        println!("✓ API key found");
    } else {
        println!(
            "✗ No API key found. Set one of: {}",
            stillmotion::credential::DEFAULT_KEY_ENV_VARS.join(", ")
        );
    }

    Ok(())
}
