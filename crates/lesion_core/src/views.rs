//! Pure view computations over a prediction and the selected sample. These
//! guard against malformed upstream data instead of raising errors, so a bad
//! response degrades to an empty or zeroed display.

use crate::catalog::Sample;
use crate::result::PredictionResult;
use crate::taxonomy::LesionCode;

/// Reported confidence when it is a finite number in [0, 1], else 0.
pub fn normalized_confidence(result: &PredictionResult) -> f64 {
    let c = result.confidence;
    if c.is_finite() && (0.0..=1.0).contains(&c) {
        c
    } else {
        0.0
    }
}

/// Class probabilities in descending order. Non-numeric and non-finite
/// entries are dropped; equal values keep the endpoint's key order.
pub fn sorted_class_probabilities(result: &PredictionResult) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = result
        .all_class_probabilities
        .iter()
        .filter_map(|(name, value)| {
            value
                .as_f64()
                .filter(|p| p.is_finite())
                .map(|p| (name.clone(), p))
        })
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
}

/// Whether the predicted class matches the sample's ground truth. An
/// unrecognized class name counts as incorrect.
pub fn is_correct(result: &PredictionResult, sample: &Sample) -> bool {
    LesionCode::parse(&result.predicted_class_name) == Some(sample.true_label)
}
