//! Ranked prediction types and output postprocessing.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::error::Stage;
use crate::labels::LabelVocabulary;

/// One ranked class prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
    pub confidence_percentage: String,
}

/// A successful classification: the top-1 class plus the ranked top-K list.
///
/// Invariants: `top_predictions` is sorted by descending probability with
/// ascending-index tie-breaks, holds `min(K, num_classes)` entries, and its
/// head always equals (`predicted_label`, `confidence`).
#[derive(Debug, Clone, Serialize)]
pub struct RankedPredictions {
    pub predicted_label: String,
    pub confidence: f32,
    pub confidence_percentage: String,
    pub top_predictions: Vec<Prediction>,
}

/// Per-request classification outcome.
///
/// `classify` never propagates errors past its boundary; a bad image becomes
/// a `Failure` so one request cannot destabilize the shared engine. The wire
/// shape carries a `success` flag plus either the ranked predictions or an
/// error message.
#[derive(Debug, Clone)]
pub enum Classification {
    Success(RankedPredictions),
    Failure { stage: Stage, message: String },
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Success(_))
    }

    /// The failure message, if this outcome is a failure.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Classification::Success(_) => None,
            Classification::Failure { message, .. } => Some(message),
        }
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Classification::Success(ranked) => {
                let mut s = serializer.serialize_struct("Classification", 5)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("predicted_label", &ranked.predicted_label)?;
                s.serialize_field("confidence", &ranked.confidence)?;
                s.serialize_field("confidence_percentage", &ranked.confidence_percentage)?;
                s.serialize_field("top_predictions", &ranked.top_predictions)?;
                s.end()
            }
            Classification::Failure { message, .. } => {
                let mut s = serializer.serialize_struct("Classification", 2)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", message)?;
                s.end()
            }
        }
    }
}

/// Format a [0, 1] probability as a percentage with exactly two decimals.
pub fn format_percentage(probability: f32) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Rank per-class scores into the top-K result.
///
/// Stable descending sort on probability with the original index as the
/// secondary key, so ties deterministically resolve to the lower index. The
/// top-1 entry doubles as the headline prediction.
pub fn rank_predictions(
    probabilities: &[f32],
    labels: &LabelVocabulary,
    top_k: usize,
) -> Option<RankedPredictions> {
    if probabilities.is_empty() {
        return None;
    }
    // The headline prediction is the head of the ranked list, so always keep
    // at least one entry.
    let top_k = top_k.max(1);

    let mut indices: Vec<usize> = (0..probabilities.len()).collect();
    indices.sort_by(|&a, &b| {
        probabilities[b]
            .partial_cmp(&probabilities[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let top_predictions: Vec<Prediction> = indices
        .iter()
        .take(top_k)
        .map(|&idx| Prediction {
            label: labels.name_for(idx),
            probability: probabilities[idx],
            confidence_percentage: format_percentage(probabilities[idx]),
        })
        .collect();

    let head = &top_predictions[0];
    Some(RankedPredictions {
        predicted_label: head.label.clone(),
        confidence: head.probability,
        confidence_percentage: head.confidence_percentage.clone(),
        top_predictions,
    })
}
