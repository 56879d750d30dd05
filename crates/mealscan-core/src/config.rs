//! Configuration types for the mealscan engine and server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the ONNX model artifact.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Label file looked up next to the model artifact.
    #[serde(default = "default_labels_filename")]
    pub labels_filename: String,

    /// Number of ranked predictions to return.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of threads for intra-op parallelism in the runtime.
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            labels_filename: default_labels_filename(),
            top_k: default_top_k(),
            intra_threads: default_intra_threads(),
        }
    }
}

impl EngineConfig {
    /// Short name of the loaded artifact, used in API responses.
    pub fn model_name(&self) -> String {
        self.model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string())
    }
}

fn default_model_path() -> PathBuf {
    if let Ok(from_env) = std::env::var("MEALSCAN_MODEL_PATH") {
        let trimmed = from_env.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from("models/food_fp16.onnx")
}

fn default_labels_filename() -> String {
    "labels_final.txt".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_intra_threads() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
        .min(8)
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_cors_enabled(),
        }
    }
}

impl ServerConfig {
    /// Build from `MEALSCAN_HOST` / `MEALSCAN_PORT`, falling back to defaults
    /// on missing or unparsable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("MEALSCAN_HOST") {
            if !host.trim().is_empty() {
                config.host = host;
            }
        }
        if let Ok(raw) = std::env::var("MEALSCAN_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => {
                    tracing::warn!("Invalid MEALSCAN_PORT='{}', using {}", raw, config.port);
                }
            }
        }
        config
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_enabled() -> bool {
    true
}
