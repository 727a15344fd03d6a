//! Command bridge between the view and native functionality.
//!
//! The view never touches dialogs, files or the network directly. It issues one
//! of three commands through [`Backend`] on a worker thread and waits for the
//! reply on a channel.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "gui")]
pub mod native;
pub mod removebg;

#[cfg(feature = "gui")]
pub use native::NativeBackend;
pub use removebg::RemoveBgClient;

/// An image as the view sees it: a data URI for display plus where it lives on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub image_base64: String,
    pub image_path: String,
}

impl ImageRecord {
    pub fn new(image_base64: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            image_base64: image_base64.into(),
            image_path: image_path.into(),
        }
    }

    /// A record missing either half is what a cancelled picker returns.
    pub fn is_empty(&self) -> bool {
        self.image_base64.is_empty() || self.image_path.is_empty()
    }
}

/// Arguments of the `matting_image` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MattingRequest {
    pub file_path: String,
    pub save_path: String,
    pub api_key: String,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to read image {path:?}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image path has no file extension: {0:?}")]
    MissingExtension(PathBuf),

    #[error("request to matting service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("matting service rejected the API key (403)")]
    Forbidden,

    #[error("matting service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("failed to write result {path:?}: {source}")]
    WriteResult {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backend worker stopped before replying")]
    Disconnected,
}

/// The three commands of the bridge.
///
/// Implementations block; callers are expected to run them off the UI thread.
pub trait Backend: Send + Sync {
    /// Let the user pick an image. Cancellation yields an empty record.
    fn open_image(&self) -> Result<ImageRecord, BackendError>;

    /// Let the user pick the output directory. Cancellation yields an empty string.
    fn save_matting_image_path(&self) -> Result<String, BackendError>;

    /// Remove the background of `request.file_path` and store the result under
    /// `request.save_path`.
    fn matting_image(&self, request: &MattingRequest) -> Result<ImageRecord, BackendError>;
}
