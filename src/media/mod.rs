use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub mod qr;

/// Allowed image extensions
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Maximum file size (10 MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Public route the uploads directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredMedia {
    pub url: String,
    pub filename: String,
    pub size: usize,
}

/// Lower-cased extension when it is one of the allowed image types.
pub fn image_extension(filename: &str) -> Result<String> {
    let (_, extension) = filename
        .rsplit_once('.')
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;
    let extension = extension.to_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(extension)
}

/// Save an uploaded image under `uploads_dir` with a fresh random name and
/// return the public URL it is served from.
pub async fn save_uploaded_file(
    uploads_dir: &str,
    filename: &str,
    data: &[u8],
) -> Result<StoredMedia> {
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::Validation("File too large (max 10 MB)".to_string()));
    }

    let extension = image_extension(filename)?;

    let uploads_path = PathBuf::from(uploads_dir);
    fs::create_dir_all(&uploads_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create uploads directory: {}", e))
    })?;

    let new_filename = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = uploads_path.join(&new_filename);

    let mut file = fs::File::create(&file_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create file: {}", e))
    })?;

    file.write_all(data).await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;

    tracing::debug!("Stored upload {} ({} bytes)", new_filename, data.len());

    Ok(StoredMedia {
        url: format!("{}/{}", UPLOADS_ROUTE, new_filename),
        filename: new_filename,
        size: data.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("photo.JPG").unwrap(), "jpg");
        assert_eq!(image_extension("a.b.webp").unwrap(), "webp");
        assert!(image_extension("script.sh").is_err());
        assert!(image_extension("noextension").is_err());
    }

    #[tokio::test]
    async fn test_save_and_reject() {
        let dir = std::env::temp_dir().join(format!("clubhouse-uploads-{}", Uuid::new_v4()));
        let dir = dir.to_string_lossy().to_string();

        let stored = save_uploaded_file(&dir, "cover.png", b"not really a png").await.unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(".png"));
        assert_eq!(stored.size, 16);

        assert!(save_uploaded_file(&dir, "cover.png", b"").await.is_err());
        assert!(save_uploaded_file(&dir, "cover.exe", b"data").await.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
