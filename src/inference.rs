//! Inference adapter around the pre-trained model.

use std::path::Path;

use ndarray::Array4;
use tract_onnx::prelude::*;

use crate::error::{InferenceError, ModelLoadError};

/// A model that maps a preprocessed image batch to raw scores.
pub trait Classifier: Send + Sync {
    fn classify(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// ONNX model, optimized once at load time and read-only afterwards.
pub struct OnnxClassifier {
    plan: OnnxPlan,
    image_size: usize,
}

impl OnnxClassifier {
    pub fn load(path: impl AsRef<Path>, image_size: u32) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let load_err = |e: TractError| ModelLoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let side = image_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_err)?
            .with_input_fact(0, f32::fact([1, side, side, 3]).into())
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        Ok(Self {
            plan,
            image_size: side,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let expected = (1, self.image_size, self.image_size, 3);
        if tensor.dim() != expected {
            return Err(InferenceError(format!(
                "input shape {:?} does not match model input {:?}",
                tensor.dim(),
                expected
            )));
        }

        let input = tract_ndarray::Array4::from_shape_vec(expected, tensor.iter().copied().collect())
            .map_err(|e| InferenceError(e.to_string()))?
            .into_tensor();

        let result = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError(e.to_string()))?;

        let output = result
            .first()
            .ok_or_else(|| InferenceError("model produced no outputs".to_string()))?;
        let scores = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError(e.to_string()))?;

        Ok(scores.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");

        let err = OnnxClassifier::load(&path, 224).err().expect("load should fail");
        assert!(err.path.ends_with("model.onnx"));
    }

    #[test]
    fn corrupt_model_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"\x00\x01 not a protobuf graph").unwrap();

        assert!(OnnxClassifier::load(&path, 224).is_err());
    }
}
