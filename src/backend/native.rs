use log::debug;

use super::{Backend, BackendError, ImageRecord, MattingRequest, RemoveBgClient};
use crate::utils::read_image_record;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg"];

/// Desktop backend: native pickers via `rfd`, matting via remove.bg.
pub struct NativeBackend {
    client: RemoveBgClient,
}

impl NativeBackend {
    pub fn new(client: RemoveBgClient) -> Self {
        Self { client }
    }
}

impl Backend for NativeBackend {
    fn open_image(&self) -> Result<ImageRecord, BackendError> {
        match rfd::FileDialog::new()
            .add_filter("image", IMAGE_EXTENSIONS)
            .pick_file()
        {
            Some(path) => read_image_record(&path),
            None => {
                debug!("Image picker cancelled");
                Ok(ImageRecord::default())
            }
        }
    }

    fn save_matting_image_path(&self) -> Result<String, BackendError> {
        Ok(rfd::FileDialog::new()
            .pick_folder()
            .map(|path| path.display().to_string())
            .unwrap_or_default())
    }

    fn matting_image(&self, request: &MattingRequest) -> Result<ImageRecord, BackendError> {
        self.client.remove_background(request)
    }
}
