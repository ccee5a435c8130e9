//! Binary asset storage (cover images, avatars, milestone photos).
//!
//! Assets are uploaded as raw bytes and addressed by a URL path that the
//! HTTP layer serves back. The filesystem implementation stores files under
//! the media directory, named by content hash so re-uploading the same bytes
//! is idempotent.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

/// URL prefix under which stored assets are served.
pub const ASSET_URL_PREFIX: &str = "/media";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Cover,
    Avatar,
    ProfileCover,
    Milestone,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Cover => "covers",
            AssetCategory::Avatar => "avatars",
            AssetCategory::ProfileCover => "profile-covers",
            AssetCategory::Milestone => "milestones",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "covers" => Some(AssetCategory::Cover),
            "avatars" => Some(AssetCategory::Avatar),
            "profile-covers" => Some(AssetCategory::ProfileCover),
            "milestones" => Some(AssetCategory::Milestone),
            _ => None,
        }
    }
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores the bytes and returns the URL path they will be served from.
    /// Rejects payloads that are not a recognizable image.
    async fn upload(&self, category: AssetCategory, bytes: Vec<u8>) -> Result<String>;

    /// Deletes the asset behind a URL previously returned by `upload`.
    /// Deleting an unknown or already-deleted URL is not an error.
    async fn delete(&self, url: &str) -> Result<()>;

    /// Maps an asset URL back to a servable file path, or None if the URL is
    /// not one of ours.
    fn resolve(&self, url: &str) -> Option<PathBuf>;
}

pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create asset directory {:?}", root))?;
        Ok(Self { root })
    }

    /// Splits "/media/{category}/{file}" into its parts.
    fn parse_url(url: &str) -> Option<(AssetCategory, &str)> {
        let rest = url.strip_prefix(ASSET_URL_PREFIX)?.strip_prefix('/')?;
        let (category, file) = rest.split_once('/')?;
        // Hash-derived names only, no separators that could escape the root.
        if file.is_empty() || !file.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.') {
            return None;
        }
        Some((AssetCategory::from_str(category)?, file))
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn upload(&self, category: AssetCategory, bytes: Vec<u8>) -> Result<String> {
        let kind = match infer::get(&bytes) {
            Some(kind) if kind.mime_type().starts_with("image/") => kind,
            _ => bail!("Payload is not a recognizable image"),
        };

        let digest = Sha256::digest(&bytes);
        let file_name = format!("{:x}.{}", digest, kind.extension());

        let dir = self.root.join(category.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write asset {:?}", path))?;

        Ok(format!(
            "{}/{}/{}",
            ASSET_URL_PREFIX,
            category.as_str(),
            file_name
        ))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let Some(path) = self.resolve(url) else {
            debug!("Ignoring delete of foreign asset url {}", url);
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete asset {:?}", path)),
        }
    }

    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let (category, file) = Self::parse_url(url)?;
        Some(self.root.join(category.as_str()).join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Minimal PNG header + IHDR, enough for content sniffing.
    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
    ];

    #[tokio::test]
    async fn upload_resolves_and_deletes() {
        let dir = TempDir::new().unwrap();
        let store = FsAssetStore::new(dir.path()).unwrap();

        let url = store
            .upload(AssetCategory::Cover, PNG_BYTES.to_vec())
            .await
            .unwrap();
        assert!(url.starts_with("/media/covers/"));
        assert!(url.ends_with(".png"));

        let path = store.resolve(&url).unwrap();
        assert!(path.exists());

        store.delete(&url).await.unwrap();
        assert!(!path.exists());

        // Double delete is fine.
        store.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn upload_is_idempotent_for_same_bytes() {
        let dir = TempDir::new().unwrap();
        let store = FsAssetStore::new(dir.path()).unwrap();

        let a = store
            .upload(AssetCategory::Avatar, PNG_BYTES.to_vec())
            .await
            .unwrap();
        let b = store
            .upload(AssetCategory::Avatar, PNG_BYTES.to_vec())
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn rejects_non_image_payloads() {
        let dir = TempDir::new().unwrap();
        let store = FsAssetStore::new(dir.path()).unwrap();
        assert!(store
            .upload(AssetCategory::Cover, b"not an image".to_vec())
            .await
            .is_err());
    }

    #[test]
    fn resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FsAssetStore::new(dir.path()).unwrap();
        assert!(store.resolve("/media/covers/../../etc/passwd").is_none());
        assert!(store.resolve("/elsewhere/covers/x.png").is_none());
        assert!(store.resolve("/media/unknown/x.png").is_none());
    }
}
