use std::path::PathBuf;

use livecheck_core::DEFAULT_THRESHOLD;
use livecheck_models::DEFAULT_MODEL_FILE;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing the ONNX model file.
    pub model_dir: PathBuf,
    /// Model file to load (default: `<model_dir>/liveness.onnx`).
    pub model_path: PathBuf,
    /// Expected SHA-256 of the model. When set, the file is verified before loading.
    pub model_sha256: Option<String>,
    /// Scores strictly below this are `Live`. Only changed by explicit override.
    pub threshold: f32,
    /// ONNX Runtime intra-op thread count.
    pub intra_threads: usize,
}

impl Config {
    /// Load configuration from `LIVECHECK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let model_dir = lookup("LIVECHECK_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(livecheck_core::default_model_dir);

        let model_path = lookup("LIVECHECK_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| model_dir.join(DEFAULT_MODEL_FILE));

        let threshold = parse_or(&lookup, "LIVECHECK_THRESHOLD", DEFAULT_THRESHOLD);

        Self {
            model_dir,
            model_path,
            model_sha256: lookup("LIVECHECK_MODEL_SHA256").filter(|v| !v.trim().is_empty()),
            threshold: validated_threshold(threshold),
            intra_threads: parse_or(&lookup, "LIVECHECK_INTRA_THREADS", 1usize).max(1),
        }
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        model: Option<PathBuf>,
        sha256: Option<String>,
        threshold: Option<f32>,
    ) -> Self {
        if let Some(model) = model {
            self.model_path = model;
        }
        if sha256.is_some() {
            self.model_sha256 = sha256;
        }
        if let Some(threshold) = threshold {
            self.threshold = validated_threshold(threshold);
        }
        self
    }
}

/// Thresholds outside `[0, 1]` (or NaN) would make one label unreachable.
fn validated_threshold(threshold: f32) -> f32 {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        threshold
    } else {
        tracing::warn!(
            threshold,
            default = DEFAULT_THRESHOLD,
            "threshold out of range, using default"
        );
        DEFAULT_THRESHOLD
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[("LIVECHECK_MODEL_DIR", "/models")]);
        assert_eq!(config.model_path, PathBuf::from("/models/liveness.onnx"));
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.intra_threads, 1);
        assert_eq!(config.model_sha256, None);
    }

    #[test]
    fn explicit_model_path_wins_over_dir() {
        let config = config_from(&[
            ("LIVECHECK_MODEL_DIR", "/models"),
            ("LIVECHECK_MODEL_PATH", "/elsewhere/custom.onnx"),
        ]);
        assert_eq!(config.model_path, PathBuf::from("/elsewhere/custom.onnx"));
        assert_eq!(config.model_dir, PathBuf::from("/models"));
    }

    #[test]
    fn parses_numeric_values() {
        let config = config_from(&[
            ("LIVECHECK_MODEL_DIR", "/models"),
            ("LIVECHECK_THRESHOLD", "0.65"),
            ("LIVECHECK_INTRA_THREADS", "4"),
            ("LIVECHECK_MODEL_SHA256", "abc123"),
        ]);
        assert_eq!(config.threshold, 0.65);
        assert_eq!(config.intra_threads, 4);
        assert_eq!(config.model_sha256.as_deref(), Some("abc123"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("LIVECHECK_MODEL_DIR", "/models"),
            ("LIVECHECK_THRESHOLD", "high"),
            ("LIVECHECK_INTRA_THREADS", "0"),
            ("LIVECHECK_MODEL_SHA256", "  "),
        ]);
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.intra_threads, 1);
        assert_eq!(config.model_sha256, None);

        let config = config_from(&[
            ("LIVECHECK_MODEL_DIR", "/models"),
            ("LIVECHECK_THRESHOLD", "1.5"),
        ]);
        assert_eq!(config.threshold, 0.5);
    }

    #[test]
    fn overrides_replace_env() {
        let config = config_from(&[("LIVECHECK_MODEL_DIR", "/models")]).with_overrides(
            Some(PathBuf::from("/tmp/m.onnx")),
            Some("ff".to_string()),
            Some(0.3),
        );
        assert_eq!(config.model_path, PathBuf::from("/tmp/m.onnx"));
        assert_eq!(config.model_sha256.as_deref(), Some("ff"));
        assert_eq!(config.threshold, 0.3);
    }

    #[test]
    fn absent_overrides_keep_env() {
        let base = config_from(&[
            ("LIVECHECK_MODEL_DIR", "/models"),
            ("LIVECHECK_THRESHOLD", "0.4"),
        ]);
        let config = base.clone().with_overrides(None, None, None);
        assert_eq!(config, base);
    }
}
