//! Synthetic prediction responses, reproducing the hosted demo's mock
//! endpoint: the true class always wins, everything else gets noise.

use rand::Rng;
use serde_json::{Map, Value};

use crate::result::PredictionResult;
use crate::taxonomy::LesionCode;

/// Overlay path the mock endpoint reports.
pub const MOCK_ACTIVATION_MAP: &str = "/images/activation-map.png";

/// Build a mock response for a sample with the given ground truth. The true
/// class gets 85-95% probability, every other class 1-3%, and the
/// distribution is normalized to sum to 1. Confidence equals the predicted
/// class's probability.
pub fn mock_prediction(true_label: LesionCode, rng: &mut impl Rng) -> PredictionResult {
    let mut probabilities: Vec<(LesionCode, f64)> = LesionCode::ALL
        .iter()
        .map(|&code| {
            let p = if code == true_label {
                0.85 + rng.gen_range(0.0..0.1)
            } else {
                0.01 + rng.gen_range(0.0..0.02)
            };
            (code, p)
        })
        .collect();

    let total: f64 = probabilities.iter().map(|(_, p)| p).sum();
    for (_, p) in &mut probabilities {
        *p /= total;
    }

    let confidence = probabilities
        .iter()
        .find(|(code, _)| *code == true_label)
        .map(|(_, p)| *p)
        .unwrap_or(0.9);

    let mut all_class_probabilities = Map::new();
    for (code, p) in &probabilities {
        all_class_probabilities.insert(code.class_name().to_string(), Value::from(*p));
    }

    PredictionResult {
        predicted_class_index: true_label.index() as i64,
        predicted_class_name: true_label.class_name().to_string(),
        confidence,
        all_class_probabilities,
        raw_logits: None,
        activation_map: Some(MOCK_ACTIVATION_MAP.to_string()),
        activation_map_base64: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Sample;
    use crate::views::{is_correct, normalized_confidence, sorted_class_probabilities};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn probabilities_are_normalized() {
        let mut rng = StdRng::seed_from_u64(11);
        for &label in &LesionCode::ALL {
            let result = mock_prediction(label, &mut rng);
            let sum: f64 = sorted_class_probabilities(&result)
                .iter()
                .map(|(_, p)| p)
                .sum();
            assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
        }
    }

    #[test]
    fn predicted_class_always_matches_the_true_label() {
        let mut rng = StdRng::seed_from_u64(5);
        let sample = Sample {
            image_name: "3.jpg".to_string(),
            true_label: LesionCode::Bcc,
        };
        let result = mock_prediction(sample.true_label, &mut rng);
        assert!(is_correct(&result, &sample));
        assert_eq!(result.predicted_class_index, 2);
    }

    #[test]
    fn confidence_is_the_predicted_class_probability() {
        let mut rng = StdRng::seed_from_u64(23);
        let result = mock_prediction(LesionCode::Vasc, &mut rng);
        let top = &sorted_class_probabilities(&result)[0];
        assert_eq!(top.0, LesionCode::Vasc.class_name());
        assert_eq!(top.1, result.confidence);
        assert!(normalized_confidence(&result) > 0.7);
    }
}
