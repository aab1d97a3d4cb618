use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::multipart;
use serde::Deserialize;

use crate::catalog::Sample;
use crate::error::InferenceFailed;
use crate::result::PredictionResult;

/// Where to find the sample images and where to send them for inference.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub samples_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7878/predict".to_string(),
            samples_dir: PathBuf::from("assets/samples"),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML config; fields that are absent keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Blocking HTTP client for the inference endpoint. One request at a time
/// per selection is a caller obligation; the client itself defines no retry
/// policy.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl PredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self, InferenceFailed> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// On-disk path of a sample's image.
    pub fn sample_path(&self, sample: &Sample) -> PathBuf {
        self.config.samples_dir.join(&sample.image_name)
    }

    /// Upload the sample's image as a multipart form and parse the returned
    /// prediction. Every failure mode collapses into [`InferenceFailed`].
    pub fn predict(&self, sample: &Sample) -> Result<PredictionResult, InferenceFailed> {
        let path = self.sample_path(sample);
        let bytes = std::fs::read(&path)
            .map_err(|e| InferenceFailed::new(format!("cannot read {}: {e}", path.display())))?;

        let part = multipart::Part::bytes(bytes)
            .file_name(sample.image_name.clone())
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(
            endpoint = %self.config.endpoint,
            image = %sample.image_name,
            "sending inference request"
        );
        let response = self
            .http
            .post(&self.config.endpoint)
            .multipart(form)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config = ClientConfig::from_toml("endpoint = \"http://example.test/predict\"").unwrap();
        assert_eq!(config.endpoint, "http://example.test/predict");
        assert_eq!(config.samples_dir, PathBuf::from("assets/samples"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config = ClientConfig::from_toml("").unwrap();
        let defaults = ClientConfig::default();
        assert_eq!(config.endpoint, defaults.endpoint);
        assert_eq!(config.samples_dir, defaults.samples_dir);
    }

    #[test]
    fn sample_path_joins_the_image_name() {
        let client = PredictionClient::new(ClientConfig {
            samples_dir: PathBuf::from("/data/samples"),
            ..ClientConfig::default()
        })
        .unwrap();
        let sample = Sample {
            image_name: "3.jpg".to_string(),
            true_label: crate::taxonomy::LesionCode::Bcc,
        };
        assert_eq!(client.sample_path(&sample), PathBuf::from("/data/samples/3.jpg"));
    }
}
