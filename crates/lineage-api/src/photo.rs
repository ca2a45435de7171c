//! Profile-photo uploads.
//!
//! Clients send a photo inline as base64 alongside the person's attributes.
//! The bytes go to a [`PhotoStore`]; only the returned URI is kept.

use std::{io, path::PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use lineage_core::photo::{PhotoStore, extension_for};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// An inline photo in a request body.
#[derive(Debug, Deserialize)]
pub struct PhotoUpload {
  pub media_type: String,
  /// Base64 (standard alphabet, padded).
  pub data:       String,
}

/// Validate and store an uploaded photo, returning its URI.
pub async fn store_upload<P>(photos: &P, upload: PhotoUpload) -> Result<String, ApiError>
where
  P: PhotoStore,
{
  if extension_for(&upload.media_type).is_none() {
    return Err(ApiError::BadRequest(format!(
      "unsupported photo type {:?}",
      upload.media_type
    )));
  }
  let bytes = B64
    .decode(upload.data.trim())
    .map_err(|_| ApiError::BadRequest("photo data is not valid base64".into()))?;
  if bytes.is_empty() {
    return Err(ApiError::BadRequest("photo is empty".into()));
  }

  photos
    .put(bytes, upload.media_type)
    .await
    .map_err(|e| ApiError::Photo(Box::new(e)))
}

// ─── Filesystem backend ──────────────────────────────────────────────────────

/// Content-addressed photo directory: each photo is written once as
/// `<sha256>.<ext>` and served from `base_url` by whatever fronts the
/// directory.
#[derive(Debug, Clone)]
pub struct FsPhotoStore {
  dir:      PathBuf,
  base_url: String,
}

impl FsPhotoStore {
  pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
    Self { dir: dir.into(), base_url: base_url.into() }
  }
}

impl PhotoStore for FsPhotoStore {
  type Error = io::Error;

  async fn put(&self, bytes: Vec<u8>, media_type: String) -> io::Result<String> {
    let ext = extension_for(&media_type).ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("unsupported media type {media_type:?}"),
      )
    })?;

    let name = format!("{}.{ext}", hex::encode(Sha256::digest(&bytes)));
    let path = self.dir.join(&name);

    tokio::fs::create_dir_all(&self.dir).await?;
    if !tokio::fs::try_exists(&path).await? {
      tokio::fs::write(&path, &bytes).await?;
      tracing::debug!(file = %name, size = bytes.len(), "stored photo");
    }

    Ok(format!("{}/{name}", self.base_url.trim_end_matches('/')))
  }
}
