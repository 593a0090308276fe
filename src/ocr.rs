use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::blocking::{Client, multipart};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::OcrError;
use crate::model::RecognizedFragment;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub api_url: String,
    pub secret_key: String,
    pub lang: String,
    pub timeout_secs: u64,
}

pub trait FragmentSource {
    fn recognize(&self, image: &Path) -> Result<Vec<Vec<RecognizedFragment>>, OcrError>;
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    images: Vec<OcrImage>,
}

#[derive(Debug, Deserialize)]
struct OcrImage {
    #[serde(default)]
    fields: Vec<RecognizedFragment>,
}

pub struct ClovaClient {
    client: Client,
    config: OcrConfig,
}

impl ClovaClient {
    pub fn new(config: OcrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build OCR http client")?;

        Ok(Self { client, config })
    }
}

fn image_format(image: &Path) -> String {
    image
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .map(|ext| if ext == "jpeg" { "jpg".to_string() } else { ext })
        .unwrap_or_else(|| "png".to_string())
}

fn classify_transport_error(err: reqwest::Error) -> OcrError {
    if err.is_connect() {
        OcrError::Connection(err)
    } else if err.is_decode() {
        OcrError::MalformedResponse(err.to_string())
    } else {
        OcrError::Request(err)
    }
}

impl FragmentSource for ClovaClient {
    fn recognize(&self, image: &Path) -> Result<Vec<Vec<RecognizedFragment>>, OcrError> {
        let bytes = fs::read(image).map_err(|err| match err.kind() {
            ErrorKind::NotFound => OcrError::FileNotFound(image.to_path_buf()),
            _ => OcrError::Read {
                path: image.to_path_buf(),
                source: err,
            },
        })?;

        let message = json!({
            "version": "V2",
            "requestId": Uuid::new_v4().to_string(),
            "timestamp": Utc::now().timestamp_millis(),
            "lang": self.config.lang,
            "images": [{ "format": image_format(image), "name": "toc" }],
        });

        let file_name = image
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let form = multipart::Form::new()
            .text("message", message.to_string())
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&self.config.api_url)
            .header("X-OCR-SECRET", &self.config.secret_key)
            .multipart(form)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(classify_transport_error)?;

        let body = response.text().map_err(classify_transport_error)?;
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Vec<Vec<RecognizedFragment>>, OcrError> {
    let response: OcrResponse =
        serde_json::from_str(body).map_err(|err| OcrError::MalformedResponse(err.to_string()))?;
    Ok(response
        .images
        .into_iter()
        .map(|image| image.fields)
        .collect())
}

#[derive(Debug, Default)]
pub struct OcrBatch {
    pub images: Vec<Vec<RecognizedFragment>>,
    pub skipped: Vec<PathBuf>,
    pub aborted: bool,
    pub warnings: Vec<String>,
}

pub fn recognize_batch(source: &dyn FragmentSource, images: &[PathBuf]) -> OcrBatch {
    let mut batch = OcrBatch::default();
    let total = images.len();

    for (index, image) in images.iter().enumerate() {
        info!(
            progress = %format!("{}/{}", index + 1, total),
            image = %image.display(),
            "recognizing image"
        );

        match source.recognize(image) {
            Ok(groups) => batch.images.extend(groups),
            Err(err) if err.is_recoverable() => {
                warn!(image = %image.display(), error = %err, "skipping image");
                batch.warnings.push(format!("{}: {err}", image.display()));
                batch.skipped.push(image.clone());
            }
            Err(err) => {
                warn!(
                    image = %image.display(),
                    error = %err,
                    remaining = total - index,
                    "aborting OCR batch"
                );
                batch.warnings.push(format!("{}: {err}", image.display()));
                batch.aborted = true;
                break;
            }
        }
    }

    info!(
        recognized = batch.images.len(),
        skipped = batch.skipped.len(),
        aborted = batch.aborted,
        "OCR batch finished"
    );
    batch
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && is_image(&path) {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}

pub fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            images.extend(discover_images(input)?);
        } else {
            images.push(input.clone());
        }
    }
    Ok(images)
}
