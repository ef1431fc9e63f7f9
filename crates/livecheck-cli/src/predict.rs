//! `livecheck predict`: classify one or more photos as Live or Spoof.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;
use livecheck_core::{ClassifierError, Label};
use serde::Serialize;

use crate::config::Config;
use crate::engine::{self, EngineError, EngineHandle};

/// Outcome for a single image, as shown to the user.
#[derive(Debug, Serialize, PartialEq)]
pub struct PredictionReport {
    pub image: String,
    pub label: Option<Label>,
    pub error: Option<String>,
}

impl PredictionReport {
    fn success(path: &Path, label: Label) -> Self {
        Self {
            image: path.display().to_string(),
            label: Some(label),
            error: None,
        }
    }

    fn failure(path: &Path, message: String) -> Self {
        Self {
            image: path.display().to_string(),
            label: None,
            error: Some(message),
        }
    }
}

/// What the image source produced for a path.
enum Selection {
    Image(DynamicImage),
    NoImage,
    Unreadable(image::ImageError),
}

fn select_image(path: &Path) -> Selection {
    if !path.is_file() {
        return Selection::NoImage;
    }
    match image::open(path) {
        Ok(img) => Selection::Image(img),
        Err(e) => Selection::Unreadable(e),
    }
}

/// Translate engine errors into the messages the user sees.
fn user_message(err: &EngineError) -> String {
    match err {
        EngineError::Preprocess(_) => "could not read image, choose a different one".to_string(),
        EngineError::Classifier(ClassifierError::Inference(_)) => {
            "prediction failed, try again".to_string()
        }
        EngineError::Classifier(e) => format!("internal error: {e}"),
        EngineError::ChannelClosed => "prediction engine stopped".to_string(),
        EngineError::Model(e) => e.to_string(),
        EngineError::Spawn(e) => format!("failed to start prediction engine: {e}"),
    }
}

/// Run every image through the engine, in order.
pub async fn predict_all(engine: &EngineHandle, images: &[PathBuf]) -> Vec<PredictionReport> {
    let mut reports = Vec::with_capacity(images.len());

    for path in images {
        let report = match select_image(path) {
            Selection::NoImage => {
                tracing::warn!(path = %path.display(), "no image at path");
                PredictionReport::failure(path, "no image selected".to_string())
            }
            Selection::Unreadable(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to decode image");
                PredictionReport::failure(
                    path,
                    "could not read image, choose a different one".to_string(),
                )
            }
            Selection::Image(img) => match engine.predict(img).await {
                Ok(label) => PredictionReport::success(path, label),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "prediction failed");
                    PredictionReport::failure(path, user_message(&e))
                }
            },
        };
        reports.push(report);
    }

    reports
}

/// Render reports as plain text, one line per image.
pub fn render_text(reports: &[PredictionReport]) -> String {
    let multiple = reports.len() > 1;
    let mut out = String::new();
    for report in reports {
        let body = match (&report.label, &report.error) {
            (Some(label), _) => format!("Prediction: {label}"),
            (None, Some(error)) => format!("Error: {error}"),
            (None, None) => "Error: unknown".to_string(),
        };
        if multiple {
            out.push_str(&format!("{}: {body}\n", report.image));
        } else {
            out.push_str(&body);
            out.push('\n');
        }
    }
    out
}

/// Run the predict command. Returns `true` if every image was classified.
pub async fn run(config: &Config, images: &[PathBuf], json: bool) -> Result<bool> {
    let digest = livecheck_models::verify_model(&config.model_path, config.model_sha256.as_deref())
        .context("model artifact check failed")?;
    if let Some(digest) = digest {
        tracing::debug!(%digest, "model checksum verified");
    }

    let engine = engine::spawn_engine(&config.model_path, config.intra_threads, config.threshold)
        .with_context(|| format!("failed to load model {}", config.model_path.display()))?;

    let reports = predict_all(&engine, images).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", render_text(&reports));
    }

    Ok(reports.iter().all(|r| r.label.is_some()))
}
