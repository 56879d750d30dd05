//! Model signature endpoint for operators.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use mealscan_core::{Precision, TensorLayout};

use crate::state::AppState;

/// Describe the loaded model's derived I/O contract.
pub async fn model_info(State(state): State<AppState>) -> Json<Value> {
    let signature = state.engine.signature();
    let input = &signature.input;

    Json(json!({
        "model": state.engine.model_name(),
        "input": {
            "height": input.height,
            "width": input.width,
            "channels": input.channels,
            "layout": match input.layout {
                TensorLayout::Nhwc => "nhwc",
                TensorLayout::Nchw => "nchw",
            },
            "precision": precision_name(&input.precision),
        },
        "output": {
            "num_classes": signature.output.num_classes,
            "precision": precision_name(&signature.output.precision),
        },
        "labels": {
            "count": state.engine.labels().len(),
            "synthesized": state.engine.labels().is_synthesized(),
        },
    }))
}

fn precision_name(precision: &Precision) -> &'static str {
    match precision {
        Precision::Float32 => "float32",
        Precision::Quantized { .. } => "uint8",
    }
}
