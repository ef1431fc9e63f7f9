use std::path::Path;

use image::DynamicImage;
use livecheck_core::{
    preprocess_dynamic, ClassifierError, Label, LivenessClassifier, OnnxError, OnnxScorer,
    PreprocessError, Scorer,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model error: {0}")]
    Model(#[from] OnnxError),
    #[error("{0}")]
    Preprocess(#[from] PreprocessError),
    #[error("{0}")]
    Classifier(#[from] ClassifierError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Messages sent from callers to the engine thread.
enum EngineRequest {
    Predict {
        image: DynamicImage,
        reply: oneshot::Sender<Result<Label, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Request a prediction: preprocess the image, run the model, threshold the score.
    pub async fn predict(&self, image: DynamicImage) -> Result<Label, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Predict {
                image,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Load the ONNX model and spawn the engine on a dedicated OS thread.
///
/// Fails fast if the model cannot be loaded.
pub fn spawn_engine(
    model_path: &Path,
    intra_threads: usize,
    threshold: f32,
) -> Result<EngineHandle, EngineError> {
    let scorer = OnnxScorer::load(model_path, intra_threads)?;
    tracing::info!(path = %model_path.display(), "liveness model loaded");
    spawn_with_scorer(scorer, threshold)
}

/// Spawn the engine around an already-loaded scorer.
///
/// The thread owns the classifier exclusively, so requests from any number of
/// handles are served one at a time. The model is released when the last
/// handle is dropped.
pub fn spawn_with_scorer<S>(scorer: S, threshold: f32) -> Result<EngineHandle, EngineError>
where
    S: Scorer + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("livecheck-engine".into())
        .spawn(move || {
            let mut classifier = LivenessClassifier::with_scorer(scorer).with_threshold(threshold);
            tracing::info!(threshold, "engine thread started");

            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Predict { image, reply } => {
                        let result = run_predict(&mut classifier, &image);
                        let _ = reply.send(result);
                    }
                }
            }

            if classifier.release() {
                tracing::info!("liveness model released");
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn run_predict<S: Scorer>(
    classifier: &mut LivenessClassifier<S>,
    image: &DynamicImage,
) -> Result<Label, EngineError> {
    let tensor = preprocess_dynamic(image)?;
    let label = classifier.classify(&tensor)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        %label,
        "prediction complete"
    );
    Ok(label)
}
