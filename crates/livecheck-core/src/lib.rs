//! Livecheck core: turns a photo into a `Live` / `Spoof` decision.
//!
//! The pipeline has two independent stages:
//!
//! 1. [`preprocess`] resizes any RGB image to 128×128 and normalizes it into an
//!    [`InputTensor`] of shape `[1, 128, 128, 3]`.
//! 2. [`LivenessClassifier`] feeds that tensor to a [`Scorer`] and thresholds the
//!    single output score into a [`Label`].
//!
//! The ONNX Runtime backend lives in [`onnx`]; tests substitute their own scorers.

pub mod classifier;
pub mod label;
pub mod onnx;
pub mod preprocess;
pub mod tensor;

use std::path::PathBuf;

pub use classifier::{ClassifierError, LivenessClassifier, ModelState, Scorer};
pub use label::{Label, DEFAULT_THRESHOLD};
pub use onnx::{OnnxError, OnnxScorer};
pub use preprocess::{preprocess, preprocess_dynamic, preprocess_raw, PreprocessError};
pub use tensor::{InputTensor, INPUT_LEN, INPUT_SHAPE, INPUT_SIZE};

/// Default directory for the liveness model.
///
/// `$XDG_DATA_HOME/livecheck/models`, falling back to `~/.local/share/livecheck/models`.
pub fn default_model_dir() -> PathBuf {
    let data_home = std::env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.local/share")
    });
    PathBuf::from(data_home).join("livecheck/models")
}
