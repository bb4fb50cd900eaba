//! `deepfake-detector` server - classify uploaded images as REAL or FAKE.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepfake_detector::config::default_cors_origins;
use deepfake_detector::model::default_checkpoint_path;
use deepfake_detector::{server, ModelHandle, OnnxClassifier, ServerConfig};

/// Deepfake detection API backed by an EfficientNet-B0 ONNX model.
#[derive(Parser, Debug)]
#[command(name = "deepfake-detector")]
#[command(version, about, long_about = None)]
struct Args {
    /// Checkpoint path. Defaults to `models/best_effnetb0.onnx` beside the executable.
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Host to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Allowed CORS origin. Repeat for several origins.
    #[arg(long = "cors-origin", value_name = "ORIGIN")]
    cors_origins: Vec<String>,

    /// Maximum upload size in bytes. Uploads are unlimited when omitted.
    #[arg(long, value_name = "BYTES")]
    max_upload_bytes: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("deepfake_detector={log_level},tower_http={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run(args).await {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run(args: Args) -> Result<()> {
    let checkpoint = args.model.unwrap_or_else(default_checkpoint_path);

    // Loading is fatal: the server never starts without a model.
    let model = Arc::new(ModelHandle::new());
    let classifier = OnnxClassifier::load(&checkpoint).context("Error loading model")?;
    model.install(classifier)?;

    let cors_origins = if args.cors_origins.is_empty() {
        default_cors_origins()
    } else {
        args.cors_origins
    };

    let config = ServerConfig {
        port: args.port,
        host: args.host,
        cors_origins,
        max_body_size: args.max_upload_bytes,
    };

    server::start(model, config).await
}
