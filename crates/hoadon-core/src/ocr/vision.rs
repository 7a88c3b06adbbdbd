//! Google Cloud Vision `TEXT_DETECTION` over the REST API.

use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{OcrBackend, RawOcrResult};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Cloud Vision client authenticated with an API key.
pub struct VisionBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl VisionBackend {
    pub fn new(config: &OcrConfig, api_key: String) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.vision_endpoint.clone(),
            api_key,
        })
    }

    fn request_body(image: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: BASE64.encode(image),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        }
    }
}

impl OcrBackend for VisionBackend {
    fn name(&self) -> &'static str {
        "google_vision"
    }

    fn recognize(&self, path: &Path) -> Result<RawOcrResult, OcrError> {
        let bytes = fs::read(path)?;

        match image::guess_format(&bytes) {
            Ok(format) => debug!("Uploading {:?} image {}", format, path.display()),
            Err(e) => warn!("{} does not look like an image ({}), sending anyway", path.display(), e),
        }

        let response = self
            .client
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&Self::request_body(&bytes))
            .send()
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    OcrError::Request(format!("could not reach Cloud Vision: {}", e))
                } else {
                    OcrError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(OcrError::Api {
                status: status.as_u16(),
                message: if body.is_empty() {
                    "invalid API key or endpoint?".to_string()
                } else {
                    body
                },
            });
        }

        blocks_from_response(&body)
    }
}

/// Map an `images:annotate` response body to text blocks: the first
/// annotation is the full text, the rest are individual words.
fn blocks_from_response(body: &str) -> Result<RawOcrResult, OcrError> {
    let parsed: AnnotateResponse =
        serde_json::from_str(body).map_err(|e| OcrError::Response(e.to_string()))?;

    let Some(first) = parsed.responses.into_iter().next() else {
        return Ok(RawOcrResult::default());
    };

    if let Some(status) = first.error {
        return Err(OcrError::Response(format!(
            "Cloud Vision error {}: {}",
            status.code, status.message
        )));
    }

    let blocks: Vec<String> = first
        .text_annotations
        .into_iter()
        .map(|a| a.description)
        .collect();
    debug!("Cloud Vision returned {} text annotations", blocks.len());

    Ok(RawOcrResult::new(blocks))
}
