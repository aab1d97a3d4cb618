use serde::{Deserialize, Serialize};

/// The seven lesion categories the demo knows about, identified by their
/// short dermatological codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LesionCode {
    #[serde(rename = "MEL")]
    Mel,
    #[serde(rename = "NV")]
    Nv,
    #[serde(rename = "BCC")]
    Bcc,
    #[serde(rename = "AKIEC")]
    Akiec,
    #[serde(rename = "BKL")]
    Bkl,
    #[serde(rename = "DF")]
    Df,
    #[serde(rename = "VASC")]
    Vasc,
}

impl LesionCode {
    /// All codes, in the model's output index order.
    pub const ALL: [LesionCode; 7] = [
        LesionCode::Mel,
        LesionCode::Nv,
        LesionCode::Bcc,
        LesionCode::Akiec,
        LesionCode::Bkl,
        LesionCode::Df,
        LesionCode::Vasc,
    ];

    /// Short code, e.g. `MEL`.
    pub fn code(self) -> &'static str {
        match self {
            LesionCode::Mel => "MEL",
            LesionCode::Nv => "NV",
            LesionCode::Bcc => "BCC",
            LesionCode::Akiec => "AKIEC",
            LesionCode::Bkl => "BKL",
            LesionCode::Df => "DF",
            LesionCode::Vasc => "VASC",
        }
    }

    /// Canonical full class name, as reported by the inference endpoint.
    pub fn class_name(self) -> &'static str {
        match self {
            LesionCode::Mel => "Melanoma",
            LesionCode::Nv => "Melanocytic nevi",
            LesionCode::Bcc => "Basal cell carcinoma",
            LesionCode::Akiec => "Actinic keratoses",
            LesionCode::Bkl => "Benign keratosis-like lesions",
            LesionCode::Df => "Dermatofibroma",
            LesionCode::Vasc => "Vascular lesions",
        }
    }

    /// Position of this class in the model's output vector.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).unwrap_or(0)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Resolve any label the endpoint may emit: probability maps have been
    /// observed keyed both by short code and by full class name, and older
    /// payloads use singular name variants.
    pub fn parse(label: &str) -> Option<Self> {
        if let Some(code) = Self::from_code(label) {
            return Some(code);
        }
        if let Some(code) = Self::ALL.iter().copied().find(|c| c.class_name() == label) {
            return Some(code);
        }
        match label {
            "Melanocytic nevus" => Some(LesionCode::Nv),
            "Actinic keratosis" => Some(LesionCode::Akiec),
            "Benign keratosis" => Some(LesionCode::Bkl),
            "Vascular lesion" => Some(LesionCode::Vasc),
            _ => None,
        }
    }
}

/// Short code for an endpoint class label. Unrecognized labels are passed
/// through unchanged so the UI always has something to show.
pub fn display_code(label: &str) -> &str {
    match LesionCode::parse(label) {
        Some(code) => code.code(),
        None => label,
    }
}
