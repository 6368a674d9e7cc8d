//! Storage of one photo per record under the configured image directory.

use crate::error::PhotoError;
use crate::record::RecordId;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` to `{dir}/{id}.{ext}`, replacing an earlier photo with the same
    /// extension, and returns the path to record on the asset.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn save(
        &self,
        id: &RecordId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, PhotoError> {
        let extension = photo_extension(file_name)?;
        if bytes.is_empty() {
            return Err(PhotoError::EmptyUpload);
        }
        if !is_safe_file_stem(id.as_str()) {
            return Err(PhotoError::InvalidId(id.clone()));
        }

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{id}.{extension}"));
        let temp_path = self.dir.join(format!(".{id}.{extension}.tmp"));
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        info!(name: "photo.saved", %id, path = %path.display(), "stored photo");
        Ok(path)
    }

    /// Deletes the photo a record pointed at before `current` replaced it. Only files
    /// directly inside the image directory are removed; returns whether a file was deleted.
    pub async fn remove_superseded(
        &self,
        previous: &str,
        current: &Path,
    ) -> Result<bool, PhotoError> {
        let previous = Path::new(previous.trim());
        if previous.as_os_str().is_empty()
            || previous == current
            || previous.parent() != Some(self.dir.as_path())
        {
            return Ok(false);
        }

        match fs::remove_file(previous).await {
            Ok(()) => {
                info!(name: "photo.removed", path = %previous.display(), "removed superseded photo");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, PhotoError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PhotoError::Missing(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// MIME type for serving a stored photo, based on its extension.
pub fn content_type(path: &Path) -> &'static str {
    match lowercase_extension(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn photo_extension(file_name: &str) -> Result<String, PhotoError> {
    lowercase_extension(Path::new(file_name))
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| PhotoError::UnsupportedExtension(file_name.to_string()))
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}

fn is_safe_file_stem(id: &str) -> bool {
    !id.trim().is_empty() && !id.contains(['/', '\\']) && !id.contains("..")
}
