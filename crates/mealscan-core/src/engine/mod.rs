//! The image classification engine and its pipeline stages.

mod core;
mod output;
mod preprocess;
mod signature;

pub use core::ClassifierEngine;
pub use output::{format_percentage, rank_predictions, Classification, Prediction, RankedPredictions};
pub use preprocess::{decode_image, prepare_tensor, InputTensor};
pub use signature::{InputSpec, ModelSignature, OutputSpec, Precision, TensorLayout};
