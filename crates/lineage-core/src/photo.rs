//! Object storage for profile photos.
//!
//! The registry never looks inside an image. It hands the bytes to a
//! [`PhotoStore`] and keeps the URI it gets back in `Person::profile_pic`.

use std::future::Future;

/// Media types accepted for profile photos, with the file extension used when
/// a backend needs one.
pub const ACCEPTED_MEDIA_TYPES: &[(&str, &str)] = &[
  ("image/jpeg", "jpg"),
  ("image/png", "png"),
  ("image/gif", "gif"),
  ("image/webp", "webp"),
];

/// File extension for an accepted media type, or `None` if it is not accepted.
pub fn extension_for(media_type: &str) -> Option<&'static str> {
  ACCEPTED_MEDIA_TYPES
    .iter()
    .find(|(mt, _)| mt.eq_ignore_ascii_case(media_type))
    .map(|(_, ext)| *ext)
}

/// "Store bytes, get back a URI."
pub trait PhotoStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn put(
    &self,
    bytes: Vec<u8>,
    media_type: String,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}
