//! Runtime settings

use std::env;
use std::path::PathBuf;

/// Service settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    /// ONNX model artifact, loaded before the server binds
    pub model_path: PathBuf,

    /// JSON prediction log, relative to the working directory
    pub predictions_path: PathBuf,

    pub max_upload_bytes: usize,

    /// Side length of the square model input
    pub image_size: u32,

    /// Confidence percentage a prediction must exceed to be labelled cancer
    pub confidence_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            model_path: PathBuf::from("model/model.onnx"),
            predictions_path: PathBuf::from("predictions.json"),
            max_upload_bytes: 1_000_000,
            image_size: 224,
            confidence_threshold: 50.0,
        }
    }
}

impl Settings {
    /// Load settings from environment variables, keeping the default for
    /// anything missing or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            predictions_path: env::var("PREDICTIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.predictions_path),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            image_size: parsed("IMAGE_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.image_size),
            confidence_threshold: parsed("CONFIDENCE_THRESHOLD")
                .filter(|threshold: &f32| threshold.is_finite())
                .unwrap_or(defaults.confidence_threshold),
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let settings = Settings::default();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.max_upload_bytes, 1_000_000);
        assert_eq!(settings.image_size, 224);
        assert_eq!(settings.confidence_threshold, 50.0);
    }

    #[test]
    fn invalid_values_fall_back() {
        env::set_var("CANCER_API_TEST_PORT", "not-a-port");
        assert_eq!(parsed::<u16>("CANCER_API_TEST_PORT"), None);
        env::set_var("CANCER_API_TEST_PORT", " 8081 ");
        assert_eq!(parsed::<u16>("CANCER_API_TEST_PORT"), Some(8081));
        env::remove_var("CANCER_API_TEST_PORT");
    }

    #[test]
    fn non_finite_threshold_falls_back() {
        for raw in ["NaN", "inf", "-inf"] {
            env::set_var("CONFIDENCE_THRESHOLD", raw);
            assert_eq!(Settings::from_env().confidence_threshold, 50.0, "{raw}");
        }
        env::set_var("CONFIDENCE_THRESHOLD", "75");
        assert_eq!(Settings::from_env().confidence_threshold, 75.0);
        env::remove_var("CONFIDENCE_THRESHOLD");
    }
}
