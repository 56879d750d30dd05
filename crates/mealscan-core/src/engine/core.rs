//! The classification engine: model loading, forward pass, result assembly.

use std::sync::Mutex;
use std::time::Instant;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputs};
use ort::value::TensorRef;
use tracing::{info, warn};

use super::output::{rank_predictions, Classification, RankedPredictions};
use super::preprocess::{decode_image, dequantize_score, prepare_tensor, InputTensor};
use super::signature::{ModelSignature, Precision};
use crate::config::EngineConfig;
use crate::error::{Error, Result, Stage};
use crate::labels::LabelVocabulary;

/// Image classification engine.
///
/// Loaded once, shared read-only for the process lifetime. The only mutable
/// state is the runtime session, which requires `&mut` for a forward pass and
/// therefore sits behind a mutex held just for the inference call; decode,
/// preprocessing, and ranking all run outside the lock.
#[derive(Debug)]
pub struct ClassifierEngine {
    config: EngineConfig,
    session: Mutex<Session>,
    signature: ModelSignature,
    labels: LabelVocabulary,
}

impl ClassifierEngine {
    /// Load the model artifact and its colocated label file.
    ///
    /// This is the expensive one-time step (deserialization, runtime
    /// initialization); callers construct the engine once at startup and
    /// share it, never per request. A missing label file degrades to
    /// synthesized labels; a missing or unparseable model is fatal.
    pub fn load(config: EngineConfig) -> Result<Self> {
        let start = Instant::now();

        if !config.model_path.is_file() {
            return Err(Error::ModelLoad(format!(
                "model artifact not found at {:?}",
                config.model_path
            )));
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(config.intra_threads))
            .and_then(|b| b.commit_from_file(&config.model_path))
            .map_err(|e| Error::ModelLoad(e.to_string()))?;

        let signature = ModelSignature::from_session(&session)?;
        let labels = LabelVocabulary::load(
            &config.model_path,
            &config.labels_filename,
            signature.output.num_classes,
        );

        if let Some(num_classes) = signature.output.num_classes {
            if labels.len() != num_classes {
                warn!(
                    "Label count {} does not match model output length {}; \
                     out-of-range indices will use placeholder names",
                    labels.len(),
                    num_classes
                );
            }
        }

        info!(
            "Loaded model {:?} in {:.1}ms: input {:?} {:?}, {} classes, {} labels",
            config.model_path,
            start.elapsed().as_secs_f32() * 1000.0,
            signature.input.batched_dims(),
            signature.input.layout,
            signature
                .output
                .num_classes
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string()),
            labels.len()
        );

        Ok(Self {
            config,
            session: Mutex::new(session),
            signature,
            labels,
        })
    }

    /// Classify an uploaded image.
    ///
    /// Never returns an error: decode, preprocessing, and inference failures
    /// are folded into a failure-shaped result so a single bad image cannot
    /// take down the shared engine. Callers check the outcome, not a `Result`.
    pub fn classify(&self, image_bytes: &[u8]) -> Classification {
        match self.run_pipeline(image_bytes) {
            Ok(ranked) => {
                info!(
                    "Classified image as '{}' ({})",
                    ranked.predicted_label, ranked.confidence_percentage
                );
                Classification::Success(ranked)
            }
            Err(err) => {
                let stage = err.stage().unwrap_or(Stage::Inference);
                warn!("Classification failed at {} stage: {}", stage, err);
                Classification::Failure {
                    stage,
                    message: err.to_string(),
                }
            }
        }
    }

    fn run_pipeline(&self, image_bytes: &[u8]) -> Result<RankedPredictions> {
        let image = decode_image(image_bytes)?;
        let tensor = prepare_tensor(&image, &self.signature.input)?;
        let probabilities = self.forward(&tensor)?;
        rank_predictions(&probabilities, &self.labels, self.config.top_k)
            .ok_or_else(|| Error::Inference("model produced an empty output tensor".to_string()))
    }

    /// Run the forward pass and extract per-class scores.
    fn forward(&self, tensor: &InputTensor) -> Result<Vec<f32>> {
        let dims = tensor.dims();
        let input_name = self.signature.input.name.as_str();
        let output_name = self.signature.output.name.as_str();

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("inference session lock poisoned".to_string()))?;

        let outputs = match tensor {
            InputTensor::Float(array) => {
                let data = array.as_slice().ok_or_else(|| {
                    Error::Inference("input tensor is not contiguous".to_string())
                })?;
                let value = TensorRef::from_array_view((dims, data))
                    .map_err(|e| Error::Inference(e.to_string()))?;
                session
                    .run(SessionInputs::<0>::ValueMap(ort::inputs![input_name => value]))
                    .map_err(|e| Error::Inference(e.to_string()))?
            }
            InputTensor::Quantized(array) => {
                let data = array.as_slice().ok_or_else(|| {
                    Error::Inference("input tensor is not contiguous".to_string())
                })?;
                let value = TensorRef::from_array_view((dims, data))
                    .map_err(|e| Error::Inference(e.to_string()))?;
                session
                    .run(SessionInputs::<0>::ValueMap(ort::inputs![input_name => value]))
                    .map_err(|e| Error::Inference(e.to_string()))?
            }
        };

        match self.signature.output.precision {
            Precision::Float32 => {
                let (_, data) = outputs[output_name]
                    .try_extract_tensor::<f32>()
                    .map_err(|e| Error::Inference(e.to_string()))?;
                Ok(data.to_vec())
            }
            Precision::Quantized { scale, zero_point } => {
                let (_, data) = outputs[output_name]
                    .try_extract_tensor::<u8>()
                    .map_err(|e| Error::Inference(e.to_string()))?;
                Ok(data
                    .iter()
                    .map(|&q| dequantize_score(q, scale, zero_point))
                    .collect())
            }
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The loaded model's fixed I/O contract.
    pub fn signature(&self) -> &ModelSignature {
        &self.signature
    }

    /// The label vocabulary in effect.
    pub fn labels(&self) -> &LabelVocabulary {
        &self.labels
    }

    /// Short model name for API responses.
    pub fn model_name(&self) -> String {
        self.config.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_fails_on_missing_artifact() {
        let config = EngineConfig {
            model_path: PathBuf::from("/nonexistent/food.onnx"),
            ..Default::default()
        };
        let err = ClassifierEngine::load(config).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_fails_on_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("garbage.onnx");
        std::fs::write(&model_path, b"this is not an onnx graph").unwrap();

        let config = EngineConfig {
            model_path,
            ..Default::default()
        };
        let err = ClassifierEngine::load(config).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
    }
}
