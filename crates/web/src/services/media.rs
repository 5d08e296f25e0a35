//! Storage for uploaded profile pictures.
//!
//! Files live under the configured media directory and are served at
//! `/media/`. Stored paths are relative to that directory.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Sub-directory for profile pictures.
const PROFILE_PIC_DIR: &str = "profile_pics";

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl ImageKind {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

/// Identify an image format from the file's leading bytes.
#[must_use]
pub fn sniff_image(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageKind::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageKind::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageKind::Gif)
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(&b"WEBP"[..]) {
        Some(ImageKind::WebP)
    } else {
        None
    }
}

/// Errors from media storage.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored path escapes the media directory.
    #[error("invalid media path: {0}")]
    InvalidPath(String),
}

/// Media directory on local disk.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a profile picture under a fresh name and return its relative path.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the directory or file cannot be written.
    pub async fn save_profile_pic(&self, bytes: &[u8], kind: ImageKind) -> Result<String, MediaError> {
        let relative = format!("{PROFILE_PIC_DIR}/{}.{}", Uuid::new_v4(), kind.extension());
        let dir = self.root.join(PROFILE_PIC_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(self.root.join(&relative), bytes).await?;
        Ok(relative)
    }

    /// Delete a stored file. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidPath` for paths leaving the media directory.
    /// Returns `MediaError::Io` if the file exists but cannot be removed.
    pub async fn remove(&self, relative: &str) -> Result<(), MediaError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let path = Path::new(relative);
        if relative.is_empty()
            || path
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(MediaError::InvalidPath(relative.to_owned()));
        }
        Ok(self.root.join(path))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(sniff_image(b"\x89PNG\r\n\x1a\nrest"), Some(ImageKind::Png));
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(sniff_image(b"GIF89a..."), Some(ImageKind::Gif));
        assert_eq!(sniff_image(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageKind::WebP));
    }

    #[test]
    fn test_sniff_rejects_other_content() {
        assert_eq!(sniff_image(b""), None);
        assert_eq!(sniff_image(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), None);
        assert_eq!(sniff_image(b"RIFF\0\0\0\0WAVEfmt "), None);
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let store = MediaStore::new("/srv/media");
        assert!(store.resolve("profile_pics/a.png").is_ok());
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("").is_err());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("storekeep-media-{}", Uuid::new_v4()));
        let store = MediaStore::new(&root);

        let relative = store
            .save_profile_pic(b"\x89PNG\r\n\x1a\n", ImageKind::Png)
            .await
            .unwrap();
        assert!(relative.starts_with("profile_pics/"));
        assert!(relative.ends_with(".png"));
        assert!(root.join(&relative).exists());

        store.remove(&relative).await.unwrap();
        assert!(!root.join(&relative).exists());
        store.remove(&relative).await.unwrap();

        let _ = std::fs::remove_dir_all(root);
    }
}
