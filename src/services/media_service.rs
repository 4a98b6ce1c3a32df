use std::path::PathBuf;

use bytes::Bytes;
use chrono::Utc;
use tokio::fs;
use uuid::Uuid;

use crate::errors::{AppError, Result};

pub const PUBLIC_PREFIX: &str = "/uploads/";
const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Owner of an uploaded image; used as the file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Player,
    News,
    User,
}

impl MediaKind {
    fn prefix(self) -> &'static str {
        match self {
            MediaKind::Player => "player",
            MediaKind::News => "news",
            MediaKind::User => "user",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Bytes,
}

/// Requested change to an entity's image. An upload wins over `remove`.
#[derive(Debug, Clone, Default)]
pub struct ImageChange {
    pub upload: Option<ImageUpload>,
    pub remove: bool,
}

/// A staged image change. The entity should carry [`ImageSwap::path`].
#[derive(Debug)]
#[must_use]
pub struct ImageSwap {
    path: String,
    stored: Option<String>,
    replaced: Option<String>,
}

impl ImageSwap {
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Image files on local disk, referenced from entities as `/uploads/<file>`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_bytes: usize,
}

impl MediaStore {
    pub async fn new(root: PathBuf, max_bytes: usize) -> Result<Self> {
        fs::create_dir_all(&root).await?;
        tracing::info!(path = %root.display(), "Media store initialized");
        Ok(MediaStore { root, max_bytes })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validates and writes an upload, returning its public path.
    pub async fn store(&self, kind: MediaKind, upload: &ImageUpload) -> Result<String> {
        if upload.data.is_empty() {
            return Err(AppError::InvalidImageFormat);
        }
        if upload.data.len() > self.max_bytes {
            return Err(AppError::ImageTooLarge { max: self.max_bytes });
        }

        let detected = infer::get(&upload.data)
            .filter(|t| ALLOWED_MIME_TYPES.contains(&t.mime_type()))
            .ok_or(AppError::InvalidImageFormat)?;

        let random = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}.{}",
            kind.prefix(),
            Utc::now().timestamp_millis(),
            &random[..8],
            detected.extension()
        );
        fs::write(self.root.join(&file_name), &upload.data).await?;

        tracing::debug!(
            original = %upload.file_name,
            stored = %file_name,
            size = upload.data.len(),
            "Stored image"
        );
        Ok(format!("{}{}", PUBLIC_PREFIX, file_name))
    }

    /// Deletes the file behind a public path. Failures are logged only.
    pub async fn remove(&self, public_path: &str) {
        if public_path.is_empty() {
            return;
        }
        let Some(path) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|name| self.resolve(name))
        else {
            tracing::warn!(path = %public_path, "Refusing to delete image outside the uploads directory");
            return;
        };

        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Deleted image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "Failed to delete image: {}", e),
        }
    }

    /// Stages `change` for an entity whose image is currently `current`.
    /// Only the new file is written here; nothing is deleted until
    /// [`MediaStore::settle`] sees the outcome of the entity write.
    pub async fn prepare(&self, kind: MediaKind, current: &str, change: ImageChange) -> Result<ImageSwap> {
        let replaced = Some(current.to_string()).filter(|c| !c.is_empty());
        if let Some(upload) = change.upload {
            let stored = self.store(kind, &upload).await?;
            return Ok(ImageSwap {
                path: stored.clone(),
                stored: Some(stored),
                replaced,
            });
        }
        if change.remove {
            return Ok(ImageSwap {
                path: String::new(),
                stored: None,
                replaced,
            });
        }
        Ok(ImageSwap {
            path: current.to_string(),
            stored: None,
            replaced: None,
        })
    }

    /// Completes a swap after the entity write: the replaced file goes when
    /// `written` succeeded, the newly stored one when it failed.
    pub async fn settle<T>(&self, swap: ImageSwap, written: Result<T>) -> Result<T> {
        let leftover = if written.is_ok() { swap.replaced } else { swap.stored };
        if let Some(path) = leftover {
            self.remove(&path).await;
        }
        written
    }

    /// Maps a bare file name to a path inside the root, rejecting anything
    /// that could escape it.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.is_empty()
            || file_name.contains("..")
            || file_name.contains('/')
            || file_name.contains('\\')
        {
            return None;
        }
        Some(self.root.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    async fn test_store(max: usize) -> (MediaStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf(), max).await.unwrap();
        (store, dir)
    }

    fn upload(data: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: "photo.bin".to_string(),
            data: Bytes::copy_from_slice(data),
        }
    }

    fn on_disk(store: &MediaStore, public: &str) -> PathBuf {
        store.resolve(public.strip_prefix(PUBLIC_PREFIX).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn stores_under_kind_prefix_with_sniffed_extension() {
        let (store, _dir) = test_store(1024).await;
        let path = store.store(MediaKind::Player, &upload(PNG)).await.unwrap();
        assert!(path.starts_with("/uploads/player-"));
        assert!(path.ends_with(".png"));
        assert!(on_disk(&store, &path).is_file());
    }

    #[tokio::test]
    async fn consecutive_uploads_get_distinct_names() {
        let (store, _dir) = test_store(1024).await;
        let a = store.store(MediaKind::News, &upload(JPEG)).await.unwrap();
        let b = store.store(MediaKind::News, &upload(JPEG)).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn rejects_non_images_and_oversized_files() {
        let (store, _dir) = test_store(8).await;
        assert!(matches!(
            store.store(MediaKind::User, &upload(b"plain text")).await,
            Err(AppError::ImageTooLarge { max: 8 })
        ));

        let (store, _dir) = test_store(1024).await;
        assert!(matches!(
            store.store(MediaKind::User, &upload(b"plain text")).await,
            Err(AppError::InvalidImageFormat)
        ));
        assert!(matches!(
            store.store(MediaKind::User, &upload(b"")).await,
            Err(AppError::InvalidImageFormat)
        ));
    }

    #[tokio::test]
    async fn upload_replaces_previous_file_and_wins_over_remove() {
        let (store, _dir) = test_store(1024).await;
        let old = store.store(MediaKind::Player, &upload(PNG)).await.unwrap();

        let change = ImageChange { upload: Some(upload(JPEG)), remove: true };
        let swap = store.prepare(MediaKind::Player, &old, change).await.unwrap();
        let new = swap.path().to_string();
        assert!(new.ends_with(".jpg"));
        assert!(on_disk(&store, &old).exists());

        store.settle(swap, Ok(())).await.unwrap();
        assert!(!on_disk(&store, &old).exists());
        assert!(on_disk(&store, &new).exists());
    }

    #[tokio::test]
    async fn failed_write_keeps_old_file_and_drops_new_one() {
        let (store, _dir) = test_store(1024).await;
        let old = store.store(MediaKind::News, &upload(PNG)).await.unwrap();

        let change = ImageChange { upload: Some(upload(JPEG)), remove: false };
        let swap = store.prepare(MediaKind::News, &old, change).await.unwrap();
        let new = swap.path().to_string();
        let written: Result<()> = Err(AppError::NotFound("News"));

        assert!(store.settle(swap, written).await.is_err());
        assert!(on_disk(&store, &old).exists());
        assert!(!on_disk(&store, &new).exists());
    }

    #[tokio::test]
    async fn remove_flag_clears_reference() {
        let (store, _dir) = test_store(1024).await;
        let old = store.store(MediaKind::User, &upload(PNG)).await.unwrap();
        let change = ImageChange { upload: None, remove: true };
        let swap = store.prepare(MediaKind::User, &old, change).await.unwrap();
        assert_eq!(swap.path(), "");

        store.settle(swap, Ok(())).await.unwrap();
        assert!(!on_disk(&store, &old).exists());
    }

    #[tokio::test]
    async fn failed_write_after_remove_flag_keeps_the_file() {
        let (store, _dir) = test_store(1024).await;
        let old = store.store(MediaKind::User, &upload(PNG)).await.unwrap();
        let change = ImageChange { upload: None, remove: true };
        let swap = store.prepare(MediaKind::User, &old, change).await.unwrap();

        let written: Result<()> = Err(AppError::DuplicateKey);
        assert!(store.settle(swap, written).await.is_err());
        assert!(on_disk(&store, &old).exists());
    }

    #[tokio::test]
    async fn rejected_upload_keeps_current_image() {
        let (store, _dir) = test_store(1024).await;
        let old = store.store(MediaKind::News, &upload(PNG)).await.unwrap();
        let change = ImageChange { upload: Some(upload(b"nope")), remove: false };
        assert!(store.prepare(MediaKind::News, &old, change).await.is_err());
        assert!(on_disk(&store, &old).exists());
    }

    #[tokio::test]
    async fn removing_missing_or_foreign_files_is_harmless() {
        let (store, _dir) = test_store(1024).await;
        store.remove("/uploads/player-0-gone.png").await;
        store.remove("/etc/passwd").await;
        store.remove("/uploads/../secret").await;
        store.remove("").await;
    }

    #[test]
    fn resolve_rejects_traversal() {
        let store = MediaStore { root: PathBuf::from("uploads"), max_bytes: 1 };
        assert!(store.resolve("../x.png").is_none());
        assert!(store.resolve("a/b.png").is_none());
        assert!(store.resolve("").is_none());
        assert_eq!(store.resolve("news-1.png"), Some(PathBuf::from("uploads/news-1.png")));
    }
}
