//! Live/batch captioning session binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vcap_media::{discover_camera, FfmpegCameraOpener, FfmpegFrameSource};
use vcap_ml_client::{CohereClient, MlClient};
use vcap_models::SessionEvent;
use vcap_session::{LiveSession, SessionAdapters, SessionConfig, VideoPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vcap=info".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vcap-session");

    let config = SessionConfig::from_env();
    info!("Session config: {:?}", config);

    vcap_media::check_ffmpeg().context("ffmpeg is required")?;

    let ml = Arc::new(MlClient::from_env().context("failed to create ML client")?);
    let summarizer =
        Arc::new(CohereClient::from_env().context("failed to create Cohere client")?);

    if !ml.health_check().await.unwrap_or(false) {
        error!("ML service is not healthy; model calls will degrade to empty results");
    }

    let adapters = SessionAdapters {
        detector: ml.clone(),
        captioner: ml,
        summarizer,
    };

    match std::env::args().nth(1).as_deref() {
        None | Some("live") => run_live(config, adapters).await,
        Some(path) => run_batch(config, adapters, path).await,
    }
}

/// Drive a live camera session until ctrl-c.
async fn run_live(config: SessionConfig, adapters: SessionAdapters) -> anyhow::Result<()> {
    let opener = FfmpegCameraOpener::default();
    let index = discover_camera(&opener, config.max_camera_devices)
        .await
        .context("no working camera")?;

    let source = FfmpegFrameSource::open_camera(index, opener.width, opener.height)
        .context("failed to open camera")?;

    let mut handle = LiveSession::spawn(Box::new(source), adapters, config);

    // Setup signal handler
    let stop = handle.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        stop.stop();
    });

    let mut last_caption = String::new();
    while let Some(event) = handle.next_event().await {
        match event {
            SessionEvent::Update { caption, total_captions, .. } => {
                if !caption.is_empty() && caption != last_caption {
                    info!(total_captions, "Caption: {}", caption);
                    last_caption = caption;
                }
            }
            SessionEvent::Summary { window_start, summary, record_count } => {
                info!(
                    window = %window_start.format("%H:%M"),
                    record_count,
                    "Summary: {}", summary
                );
            }
            SessionEvent::Ended { reason } => {
                info!("Session ended: {:?}", reason);
            }
        }
    }

    let stats = handle.join().await?;
    info!(
        frames = stats.frames_processed,
        captions = stats.total_captions,
        "Live session finished; peak object counts: {:?}",
        stats.tally.max_counts()
    );
    Ok(())
}

/// Process one video file end to end.
async fn run_batch(
    config: SessionConfig,
    adapters: SessionAdapters,
    path: &str,
) -> anyhow::Result<()> {
    let pipeline = VideoPipeline::new(config, adapters.captioner, adapters.summarizer);
    let report = pipeline.run(path).await?;

    info!(
        scenes = report.boundaries.len(),
        captions = report.captions.len(),
        "Batch processing complete"
    );
    match report.summary {
        Some(summary) => info!("Summary: {}", summary),
        None => info!("No summary produced"),
    }
    Ok(())
}
