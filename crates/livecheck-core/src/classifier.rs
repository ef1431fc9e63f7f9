//! Liveness classifier: model handle lifecycle plus the score → label decision.

use thiserror::Error;

use crate::label::{Label, DEFAULT_THRESHOLD};
use crate::tensor::{InputTensor, INPUT_SHAPE};

/// A backend that turns a preprocessed tensor into a single liveness score.
///
/// The score is expected to lie roughly in `[0, 1]`, with higher values meaning
/// "more likely spoofed". Implementations need not be reentrant; the classifier
/// holds them exclusively.
pub trait Scorer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn score(&mut self, input: &InputTensor) -> Result<f32, Self::Error>;
}

impl<S: Scorer + ?Sized> Scorer for Box<S> {
    type Error = S::Error;

    fn score(&mut self, input: &InputTensor) -> Result<f32, Self::Error> {
        (**self).score(input)
    }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("input tensor shape {actual:?} does not match model shape {expected:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        actual: Vec<usize>,
    },
    #[error("model is not loaded (state: {0:?})")]
    ModelNotLoaded(ModelState),
    #[error("model handle already acquired (state: {0:?})")]
    AlreadyAcquired(ModelState),
    #[error("inference failed: {0}")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Lifecycle of the model handle. `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loaded,
    Released,
}

enum Handle<S> {
    Unloaded,
    Loaded(S),
    Released,
}

/// Binary liveness classifier wrapping an exclusively-owned [`Scorer`].
///
/// The scorer is released exactly once: either through [`release`](Self::release)
/// or when the classifier is dropped.
pub struct LivenessClassifier<S: Scorer> {
    handle: Handle<S>,
    threshold: f32,
}

impl<S: Scorer> LivenessClassifier<S> {
    /// A classifier with no model yet. Call [`acquire`](Self::acquire) before use.
    pub fn new() -> Self {
        Self {
            handle: Handle::Unloaded,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// A classifier that is immediately in the `Loaded` state.
    pub fn with_scorer(scorer: S) -> Self {
        Self {
            handle: Handle::Loaded(scorer),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Override the decision threshold. Only for callers that explicitly need a
    /// different operating point; the default is [`DEFAULT_THRESHOLD`].
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn state(&self) -> ModelState {
        match self.handle {
            Handle::Unloaded => ModelState::Unloaded,
            Handle::Loaded(_) => ModelState::Loaded,
            Handle::Released => ModelState::Released,
        }
    }

    /// Take ownership of the model handle. Only valid from `Unloaded`.
    pub fn acquire(&mut self, scorer: S) -> Result<(), ClassifierError> {
        match self.handle {
            Handle::Unloaded => {
                self.handle = Handle::Loaded(scorer);
                Ok(())
            }
            _ => Err(ClassifierError::AlreadyAcquired(self.state())),
        }
    }

    /// Release the model handle. Returns `true` if a loaded model was dropped.
    ///
    /// After this every [`classify`](Self::classify) fails with `ModelNotLoaded`.
    pub fn release(&mut self) -> bool {
        let was_loaded = matches!(self.handle, Handle::Loaded(_));
        self.handle = Handle::Released;
        was_loaded
    }

    /// Classify a preprocessed tensor as `Live` or `Spoof`.
    ///
    /// The shape is checked before the scorer is touched. A single inference attempt
    /// is made; failures are returned to the caller.
    pub fn classify(&mut self, input: &InputTensor) -> Result<Label, ClassifierError> {
        let state = self.state();
        let Handle::Loaded(scorer) = &mut self.handle else {
            return Err(ClassifierError::ModelNotLoaded(state));
        };

        if !input.has_model_shape() {
            return Err(ClassifierError::ShapeMismatch {
                expected: INPUT_SHAPE,
                actual: input.shape().to_vec(),
            });
        }

        let score = scorer
            .score(input)
            .map_err(|e| ClassifierError::Inference(Box::new(e)))?;

        Ok(Label::from_score(score, self.threshold))
    }

    /// Classify and hand the outcome to `on_complete` instead of returning it.
    pub fn classify_then<F>(&mut self, input: &InputTensor, on_complete: F)
    where
        F: FnOnce(Result<Label, ClassifierError>),
    {
        on_complete(self.classify(input));
    }
}

impl<S: Scorer> Default for LivenessClassifier<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scorer> Drop for LivenessClassifier<S> {
    fn drop(&mut self) {
        self.release();
    }
}
