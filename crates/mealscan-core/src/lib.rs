//! Mealscan Core - Food-Image Classification Inference Engine
//!
//! This crate provides the on-device inference pipeline behind the mealscan
//! API: it loads an ONNX food classifier once, preprocesses uploaded photos
//! into the model's declared input tensor, runs the forward pass, and decodes
//! the output scores into ranked, human-readable labels.
//!
//! # Example
//!
//! ```ignore
//! use mealscan_core::{ClassifierEngine, EngineConfig};
//!
//! let engine = ClassifierEngine::load(EngineConfig::default())?;
//! let outcome = engine.classify(&image_bytes);
//! if outcome.is_success() {
//!     // serialize and return
//! }
//! ```
//!
//! The engine is read-only shared state after `load`: wrap it in an `Arc` and
//! call `classify` from as many request handlers as needed. Classification
//! failures come back as failure-shaped results, never as panics or errors.

pub mod config;
pub mod engine;
pub mod error;
pub mod labels;

pub use config::{EngineConfig, ServerConfig};
pub use engine::{
    Classification, ClassifierEngine, ModelSignature, Precision, Prediction, RankedPredictions,
    TensorLayout,
};
pub use error::{Error, Result, Stage};
pub use labels::LabelVocabulary;
