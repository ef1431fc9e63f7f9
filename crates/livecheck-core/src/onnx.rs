//! ONNX Runtime backend for the liveness model.
//!
//! The model takes one `f32` input of shape `[1, 128, 128, 3]` (NHWC, values in
//! `[0, 1]`) and produces one `f32` output whose first element is the spoof score.

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use thiserror::Error;

use crate::classifier::Scorer;
use crate::tensor::InputTensor;

#[derive(Error, Debug)]
pub enum OnnxError {
    #[error("failed to load model {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("input tensor is not contiguous")]
    NonContiguousInput,
    #[error("onnx runtime error: {0}")]
    Runtime(String),
    #[error("model produced an empty output tensor")]
    EmptyOutput,
}

/// Liveness scorer backed by an ONNX Runtime session.
pub struct OnnxScorer {
    session: Session,
}

impl OnnxScorer {
    /// Load the model from disk and build an optimized session.
    pub fn load(path: impl AsRef<Path>, intra_threads: usize) -> Result<Self, OnnxError> {
        let path = path.as_ref();
        let session = Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(path, e))?
            .with_intra_threads(intra_threads.max(1))
            .map_err(|e| load_error(path, e))?
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        tracing::debug!(path = %path.display(), intra_threads, "liveness model loaded");
        Ok(Self { session })
    }
}

impl Scorer for OnnxScorer {
    type Error = OnnxError;

    fn score(&mut self, input: &InputTensor) -> Result<f32, OnnxError> {
        let view = input.view();
        if !view.is_standard_layout() {
            return Err(OnnxError::NonContiguousInput);
        }
        let tensor = TensorRef::from_array_view(view).map_err(runtime)?;

        let outputs = self.session.run(ort::inputs![tensor]).map_err(runtime)?;
        let (_, scores) = outputs[0].try_extract_tensor::<f32>().map_err(runtime)?;

        scores.first().copied().ok_or(OnnxError::EmptyOutput)
    }
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> OnnxError {
    OnnxError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn runtime(e: impl std::fmt::Display) -> OnnxError {
    OnnxError::Runtime(e.to_string())
}
