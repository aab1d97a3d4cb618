use thiserror::Error;

/// Any failure while requesting a prediction: reading the sample image, the
/// network call, a non-success status, or an unparseable body. The caller
/// never receives partial data; the whole request either yields a
/// [`PredictionResult`](crate::result::PredictionResult) or this error.
#[derive(Debug, Error)]
#[error("inference failed: {message}")]
pub struct InferenceFailed {
    message: String,
}

impl InferenceFailed {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for InferenceFailed {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}
