use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores strictly below this are `Live`; everything else, including the
/// threshold itself, is `Spoof`.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Liveness decision for a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Live,
    Spoof,
}

impl Label {
    /// Threshold a model score.
    ///
    /// `score < threshold` is `Live`, anything else is `Spoof`. A NaN score fails
    /// the comparison and is therefore `Spoof`.
    pub fn from_score(score: f32, threshold: f32) -> Self {
        if score < threshold {
            Label::Live
        } else {
            Label::Spoof
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Live => "Live",
            Label::Spoof => "Spoof",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
