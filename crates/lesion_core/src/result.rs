use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed inference response.
///
/// The endpoint reports per-class probabilities keyed by class label and the
/// activation overlay in one of two forms: a URL (`activation_map`) or an
/// inline base64 payload (`activation_map_base64`). Only one of the two is
/// expected per response, but neither is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_class_index: i64,
    pub predicted_class_name: String,
    pub confidence: f64,
    /// Keyed by class label. Insertion order is preserved so that ties in
    /// the sorted probability view keep the endpoint's ordering.
    pub all_class_probabilities: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_logits: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_map_base64: Option<String>,
}

/// The overlay image in whichever representation the endpoint supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMap<'a> {
    Url(&'a str),
    Base64(&'a str),
}

impl PredictionResult {
    /// The activation overlay, if any. An inline payload wins when a
    /// response carries both forms.
    pub fn activation_map(&self) -> Option<ActivationMap<'_>> {
        if let Some(b64) = self.activation_map_base64.as_deref() {
            return Some(ActivationMap::Base64(b64));
        }
        self.activation_map.as_deref().map(ActivationMap::Url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_url_shaped_response() {
        let json = r#"{
            "predicted_class_index": 2,
            "predicted_class_name": "Basal cell carcinoma",
            "confidence": 0.91,
            "all_class_probabilities": {"Basal cell carcinoma": 0.91, "Melanoma": 0.04},
            "activation_map": "/images/activation-map.png"
        }"#;
        let result: PredictionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.predicted_class_index, 2);
        assert_eq!(result.confidence, 0.91);
        assert_eq!(
            result.activation_map(),
            Some(ActivationMap::Url("/images/activation-map.png"))
        );
    }

    #[test]
    fn parses_base64_shaped_response_with_logits() {
        let json = r#"{
            "predicted_class_index": 0,
            "predicted_class_name": "Melanoma",
            "confidence": 0.87,
            "all_class_probabilities": {"MEL": 0.87, "NV": 0.13},
            "raw_logits": [3.1, 0.4],
            "activation_map_base64": "aGVsbG8="
        }"#;
        let result: PredictionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.raw_logits.as_deref(), Some(&[3.1, 0.4][..]));
        assert_eq!(result.activation_map(), Some(ActivationMap::Base64("aGVsbG8=")));
    }

    #[test]
    fn missing_overlay_yields_none() {
        let json = r#"{
            "predicted_class_index": 1,
            "predicted_class_name": "Melanocytic nevi",
            "confidence": 0.5,
            "all_class_probabilities": {}
        }"#;
        let result: PredictionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.activation_map(), None);
    }
}
