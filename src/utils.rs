use base64::{engine::general_purpose, Engine as _};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::backend::{BackendError, ImageRecord};

const DATA_URI_MARKER: &str = ";base64,";

/// Lower-cased file extension, if any
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

/// MIME subtype for an image extension (`jpg` is spelled `jpeg` in MIME)
pub fn image_mime_subtype(extension: &str) -> String {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" => "jpeg".to_string(),
        other => other.to_string(),
    }
}

/// Encode raw image bytes as a `data:image/<subtype>;base64,...` URI
pub fn encode_image_data_uri(bytes: &[u8], extension: &str) -> String {
    format!(
        "data:image/{}{}{}",
        image_mime_subtype(extension),
        DATA_URI_MARKER,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Decode either a data URI or a bare base64 payload back into bytes
pub fn decode_data_uri(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match value.find(DATA_URI_MARKER) {
        Some(idx) if value.starts_with("data:") => &value[idx + DATA_URI_MARKER.len()..],
        _ => value,
    };
    general_purpose::STANDARD.decode(payload.trim())
}

/// Read an image file into the record shape the view displays
pub fn read_image_record(path: &Path) -> Result<ImageRecord, BackendError> {
    let extension =
        file_extension(path).ok_or_else(|| BackendError::MissingExtension(path.to_path_buf()))?;
    let bytes = fs::read(path).map_err(|source| BackendError::ReadImage {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ImageRecord {
        image_base64: encode_image_data_uri(&bytes, &extension),
        image_path: path.display().to_string(),
    })
}

/// Milliseconds since the Unix epoch, used to name result files
pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// `<dir>/<millis>.<extension>`
pub fn timestamped_output_path(dir: &Path, millis: u128, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", millis, extension))
}

/// Create a styled spinner for work of unknown length
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Show only the first four characters of an API key
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let visible: String = key.chars().take(4).collect();
    format!("{}****", visible)
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("ab"), "ab****");
        assert_eq!(mask_api_key("abcdefgh"), "abcd****");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(Path::new("/tmp/a.PNG")), Some("png".to_string()));
        assert_eq!(file_extension(Path::new("/tmp/photo.jpeg")), Some("jpeg".to_string()));
        assert_eq!(file_extension(Path::new("/tmp/noext")), None);
    }

    #[test]
    fn test_image_mime_subtype() {
        assert_eq!(image_mime_subtype("jpg"), "jpeg");
        assert_eq!(image_mime_subtype("JPG"), "jpeg");
        assert_eq!(image_mime_subtype("png"), "png");
    }

    #[test]
    fn test_encode_image_data_uri() {
        assert_eq!(
            encode_image_data_uri(b"test", "png"),
            "data:image/png;base64,dGVzdA=="
        );
        assert_eq!(
            encode_image_data_uri(b"image", "jpg"),
            "data:image/jpeg;base64,aW1hZ2U="
        );
    }

    #[test]
    fn test_decode_data_uri_accepts_prefixed_and_bare_payloads() {
        assert_eq!(decode_data_uri("data:image/png;base64,dGVzdA==").unwrap(), b"test");
        assert_eq!(decode_data_uri("dGVzdA==").unwrap(), b"test");
        assert!(decode_data_uri("data:image/png;base64,***").is_err());
    }

    #[test]
    fn test_read_image_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"test").unwrap();

        let record = read_image_record(&path).unwrap();
        assert_eq!(record.image_base64, "data:image/png;base64,dGVzdA==");
        assert_eq!(record.image_path, path.display().to_string());
    }

    #[test]
    fn test_read_image_record_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.png");
        assert!(matches!(
            read_image_record(&missing),
            Err(BackendError::ReadImage { .. })
        ));

        let no_ext = dir.path().join("noext");
        fs::write(&no_ext, b"x").unwrap();
        assert!(matches!(
            read_image_record(&no_ext),
            Err(BackendError::MissingExtension(_))
        ));
    }

    #[test]
    fn test_timestamped_output_path() {
        assert_eq!(
            timestamped_output_path(Path::new("/out"), 1700000000000, "png"),
            PathBuf::from("/out/1700000000000.png")
        );
    }
}
