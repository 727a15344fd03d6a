use log::{debug, info};
use reqwest::blocking::multipart;
use reqwest::StatusCode;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use super::{BackendError, ImageRecord, MattingRequest};
use crate::utils::{
    file_extension, format_duration, read_image_record, timestamped_output_path, unix_millis,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Blocking client for the remove.bg background-removal API.
#[derive(Debug, Clone)]
pub struct RemoveBgClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl RemoveBgClient {
    /// `timeout: None` waits for the service indefinitely.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload `request.file_path`, write the cut-out under `request.save_path`
    /// and return the written file.
    pub fn remove_background(&self, request: &MattingRequest) -> Result<ImageRecord, BackendError> {
        let source = Path::new(&request.file_path);
        let extension = file_extension(source)
            .ok_or_else(|| BackendError::MissingExtension(source.to_path_buf()))?;
        let contents = fs::read(source).map_err(|source_err| BackendError::ReadImage {
            path: source.to_path_buf(),
            source: source_err,
        })?;

        info!("Starting cutout: {}", request.file_path);
        let started = Instant::now();

        let form = multipart::Form::new()
            .part(
                "image_file",
                multipart::Part::bytes(contents).file_name(format!("file.{}", extension)),
            )
            .text("size", "auto");

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Api-Key", &request.api_key)
            .multipart(form)
            .send()?;

        let status = response.status();
        debug!("Matting service answered {} after {}", status, format_duration(started.elapsed()));

        if status == StatusCode::FORBIDDEN {
            return Err(BackendError::Forbidden);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let image_data = response.bytes()?;
        let output = timestamped_output_path(Path::new(&request.save_path), unix_millis(), &extension);
        fs::write(&output, &image_data).map_err(|source| BackendError::WriteResult {
            path: output.clone(),
            source,
        })?;

        info!(
            "Cutout saved to {} ({})",
            output.display(),
            format_duration(started.elapsed())
        );
        read_image_record(&output)
    }
}
