use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Upload size ceiling, enforced before anything touches disk.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid file format")]
    InvalidFormat,
    #[error("file too large")]
    FileTooLarge,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata for a stored upload.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
    /// Path persisted with the detection result, relative to the site root.
    pub relative_path: String,
    /// Browser-facing URL served by the static file handler.
    pub url: String,
}

/// Local-disk image store. Files are content-addressed by SHA-256, so
/// concurrent uploads can never collide and re-uploading the same image is a
/// no-op.
#[derive(Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
    public_prefix: String,
}

impl ImageStore {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let upload_dir = upload_dir.into();
        std::fs::create_dir_all(&upload_dir)?;
        Ok(Self {
            upload_dir,
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    /// Canonical extension for an upload, from the declared MIME type first
    /// and the client file name second. Only the three accepted formats map.
    pub fn resolve_extension(
        mime_type: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<&'static str, StorageError> {
        match mime_type {
            Some("image/jpeg") => return Ok("jpg"),
            Some("image/png") => return Ok("png"),
            // Browsers often send application/octet-stream for drag-and-drop
            // uploads; fall through to the file name in that case.
            Some("application/octet-stream") | None => {}
            Some(_) => return Err(StorageError::InvalidFormat),
        }

        let name = file_name.ok_or(StorageError::InvalidFormat)?;
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or(StorageError::InvalidFormat)?;
        match ext.as_str() {
            "jpg" | "jpeg" => Ok("jpg"),
            "png" => Ok("png"),
            _ => Err(StorageError::InvalidFormat),
        }
    }

    pub fn validate_size(image_data: &[u8]) -> Result<(), StorageError> {
        if image_data.len() > MAX_UPLOAD_BYTES {
            return Err(StorageError::FileTooLarge);
        }
        Ok(())
    }

    /// Write the upload to disk under its content hash and report where it
    /// landed.
    pub fn save(&self, image_data: &[u8], extension: &str) -> Result<StoredImage, StorageError> {
        Self::validate_size(image_data)?;

        let hash = Self::calculate_image_hash(image_data);
        let file_name = format!("{}.{}", hash, extension);
        let disk_path = self.upload_dir.join(&file_name);

        // Content-addressed: an existing file already holds these bytes.
        if !disk_path.exists() {
            std::fs::write(&disk_path, image_data)?;
        }

        let url = format!("{}/{}", self.public_prefix, file_name);
        Ok(StoredImage {
            relative_path: url.trim_start_matches('/').to_string(),
            url,
            file_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (ImageStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path().join("uploads"), "/static/uploads").unwrap();
        (store, tmp)
    }

    #[test]
    fn resolve_extension_accepts_the_three_formats() {
        assert_eq!(
            ImageStore::resolve_extension(Some("image/jpeg"), None).unwrap(),
            "jpg"
        );
        assert_eq!(
            ImageStore::resolve_extension(Some("image/png"), None).unwrap(),
            "png"
        );
        assert_eq!(
            ImageStore::resolve_extension(None, Some("scan.JPEG")).unwrap(),
            "jpg"
        );
        assert_eq!(
            ImageStore::resolve_extension(Some("application/octet-stream"), Some("eye.png"))
                .unwrap(),
            "png"
        );
    }

    #[test]
    fn resolve_extension_rejects_everything_else() {
        assert!(ImageStore::resolve_extension(Some("image/gif"), Some("a.gif")).is_err());
        assert!(ImageStore::resolve_extension(Some("text/plain"), Some("a.txt")).is_err());
        assert!(ImageStore::resolve_extension(None, Some("no-extension")).is_err());
        assert!(ImageStore::resolve_extension(None, None).is_err());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let data = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            ImageStore::validate_size(&data),
            Err(StorageError::FileTooLarge)
        ));
        assert!(ImageStore::validate_size(&[0u8; 16]).is_ok());
    }

    #[test]
    fn save_is_content_addressed() {
        let (store, tmp) = store();
        let first = store.save(b"fake image bytes", "png").unwrap();
        let second = store.save(b"fake image bytes", "png").unwrap();
        assert_eq!(first.file_name, second.file_name);
        assert_eq!(first.url, "/static/uploads/".to_string() + &first.file_name);
        assert!(tmp.path().join("uploads").join(&first.file_name).exists());

        let other = store.save(b"different bytes", "png").unwrap();
        assert_ne!(first.file_name, other.file_name);
    }
}
