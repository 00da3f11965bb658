//! Binary decision over the model's highest score.

use crate::error::PolicyError;
use crate::models::PredictionLabel;

pub const CANCER_SUGGESTION: &str = "Please consult a doctor immediately!";
pub const NON_CANCER_SUGGESTION: &str = "No cancer detected.";

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub label: PredictionLabel,
    pub suggestion: &'static str,
    /// Highest score scaled to 0..=100
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassificationPolicy {
    /// Confidence must be strictly greater than this to label cancer.
    pub threshold: f32,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self { threshold: 50.0 }
    }
}

impl ClassificationPolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn decide(&self, scores: &[f32]) -> Result<Decision, PolicyError> {
        if scores.is_empty() {
            return Err(PolicyError::EmptyScores);
        }

        // f32::max drops NaN in favour of the other operand
        let max = scores.iter().copied().fold(f32::NAN, f32::max);
        let confidence = max * 100.0;

        let decision = if confidence > self.threshold {
            Decision {
                label: PredictionLabel::Cancer,
                suggestion: CANCER_SUGGESTION,
                confidence,
            }
        } else {
            Decision {
                label: PredictionLabel::NonCancer,
                suggestion: NON_CANCER_SUGGESTION,
                confidence,
            }
        };
        Ok(decision)
    }
}
