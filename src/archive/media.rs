//! Media type inference for archive entries

use std::path::Path;

/// Infers the media type of an archive entry from its name
///
/// Lookup order:
/// 1. The `mime_guess` extension registry
/// 2. `application/<ext>` when the name has a non-empty extension
/// 3. `default`
///
/// Names without an extension, names ending in a bare dot and dotfiles
/// (`.gitignore`) all fall through to `default`.
///
/// # Examples
///
/// ```
/// use catalog_crawler::infer_media_type;
///
/// assert_eq!(infer_media_type("image.png", "application/octet-stream"), "image/png");
/// assert_eq!(
///     infer_media_type("model.binaryproto", "application/octet-stream"),
///     "application/binaryproto"
/// );
/// assert_eq!(infer_media_type("file.", "unknown/unknown"), "unknown/unknown");
/// ```
pub fn infer_media_type(name: &str, default: &str) -> String {
    if let Some(mime) = mime_guess::from_path(name).first_raw() {
        return mime.to_string();
    }

    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("application/{}", ext),
        _ => default.to_string(),
    }
}
