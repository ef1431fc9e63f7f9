use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod install;
mod predict;

use config::Config;

/// Classify photos as Live or Spoof with an on-device model.
#[derive(Parser)]
#[command(name = "livecheck", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one or more images.
    Predict(PredictArgs),
    /// Copy a model artifact into the model directory.
    InstallModel(InstallArgs),
    /// Check that the configured model exists and matches its checksum.
    VerifyModel(ModelArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// Model file (overrides LIVECHECK_MODEL_PATH).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Expected SHA-256 of the model (overrides LIVECHECK_MODEL_SHA256).
    #[arg(long)]
    sha256: Option<String>,
}

#[derive(Args)]
struct PredictArgs {
    /// Images to classify.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    model: ModelArgs,

    /// Decision threshold override; scores below it are Live.
    #[arg(long)]
    threshold: Option<f32>,

    /// Emit a JSON array instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InstallArgs {
    /// Model artifact to install.
    source: PathBuf,

    /// Destination directory (overrides LIVECHECK_MODEL_DIR).
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Expected SHA-256 of the artifact.
    #[arg(long)]
    sha256: Option<String>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let env = Config::from_env();

    match cli.command {
        Command::Predict(args) => {
            let config = env.with_overrides(args.model.model, args.model.sha256, args.threshold);
            tracing::info!(
                model = %config.model_path.display(),
                threshold = config.threshold,
                images = args.images.len(),
                "predict"
            );
            let all_classified = predict::run(&config, &args.images, args.json).await?;
            Ok(if all_classified {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::InstallModel(args) => {
            let model_dir = args.model_dir.unwrap_or(env.model_dir);
            install::run(&args.source, &model_dir, args.sha256.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::VerifyModel(args) => {
            let config = env.with_overrides(args.model, args.sha256, None);
            let digest = livecheck_models::verify_model(
                &config.model_path,
                config.model_sha256.as_deref(),
            )
            .context("model verification failed")?;
            match digest {
                Some(digest) => println!("{}: ok (sha256 {digest})", config.model_path.display()),
                None => println!(
                    "{}: present (no checksum pinned)",
                    config.model_path.display()
                ),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
