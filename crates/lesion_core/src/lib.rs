pub mod catalog;
pub mod client;
pub mod error;
pub mod mock;
pub mod result;
pub mod state;
pub mod taxonomy;
pub mod views;

pub use catalog::{sample_catalog, true_label_for, Sample, GALLERY_SIZE};
pub use client::{ClientConfig, PredictionClient};
pub use error::InferenceFailed;
pub use result::{ActivationMap, PredictionResult};
pub use state::{InferenceTicket, ViewState};
pub use taxonomy::{display_code, LesionCode};
pub use views::{is_correct, normalized_confidence, sorted_class_probabilities};
