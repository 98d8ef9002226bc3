//! Gallery URL slugs and artwork upload checks

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for gallery URLs
const MAX_GALLERY_URL_LEN: usize = 100;

/// One path segment: no whitespace, slashes, query or fragment markers
static GALLERY_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s/?#]+$").expect("invalid gallery url regex"));

/// Image types accepted for artwork
const IMAGE_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// Validated public gallery URL segment (`/gallery/<url>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GalleryUrl(String);

impl GalleryUrl {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "Gallery URL",
            });
        }

        if s.chars().count() > MAX_GALLERY_URL_LEN {
            return Err(ValidationError::TooLong {
                field: "Gallery URL",
                max: MAX_GALLERY_URL_LEN,
            });
        }

        if !GALLERY_URL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "Gallery URL",
                reason: "must not contain spaces, slashes, '?' or '#'",
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Fallback URL when the handle is already taken: `<handle>-<id>`.
    pub fn with_user_suffix(handle: &str, user_id: i64) -> Result<Self, ValidationError> {
        Self::new(&format!("{}-{}", handle, user_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An uploaded artwork file that passed the type check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkImage {
    /// Lowercased extension including the dot, e.g. `.png`
    pub extension: String,
    pub content_type: String,
}

impl ArtworkImage {
    /// Both the file extension and the MIME type must name an allowed image type.
    pub fn check(file_name: &str, content_type: &str) -> Result<Self, ValidationError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mime = content_type.to_ascii_lowercase();

        let ext_ok = IMAGE_TYPES.contains(&extension.as_str());
        let mime_ok = mime.starts_with("image/") && IMAGE_TYPES.iter().any(|t| mime.contains(t));

        if !(ext_ok && mime_ok) {
            return Err(ValidationError::InvalidFormat {
                field: "Image",
                reason: "only jpeg, jpg, png, gif and webp files are allowed",
            });
        }

        Ok(Self {
            extension: format!(".{}", extension),
            content_type: mime,
        })
    }

    /// Storage key for a user's artwork: `gallery/<user>/art_<millis><ext>`.
    pub fn storage_key(&self, user_id: i64, millis: i64) -> String {
        format!("gallery/{}/art_{}{}", user_id, millis, self.extension)
    }
}
