//! Source identity validation and derivative cache keys

use super::CacheError;
use std::path::{Component, Path};

/// Placeholder for characters that are not filesystem safe
const PLACEHOLDER: char = '_';

/// Extension every derivative is stored under
pub const DERIVATIVE_EXTENSION: &str = "webp";

/// Reject identities that could leave the upload directory.
///
/// Runs before any filesystem access.
pub fn validate_identity(identity: &str) -> Result<(), CacheError> {
    let invalid = |reason: &str| {
        Err(CacheError::InvalidIdentity(format!("{}: {:?}", reason, identity)))
    };

    if identity.trim().is_empty() {
        return invalid("empty path");
    }
    if identity.starts_with('/') || identity.starts_with('\\') {
        return invalid("leading separator");
    }
    if identity.contains('\\') {
        return invalid("backslash in path");
    }
    if identity.contains('\0') {
        return invalid("NUL byte in path");
    }
    if identity.split('/').any(|segment| segment == "..") {
        return invalid("parent directory segment");
    }

    let path = Path::new(identity);
    if path.is_absolute()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return invalid("not a relative path");
    }

    Ok(())
}

/// Replace every character outside `[A-Za-z0-9._-]`
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                PLACEHOLDER
            }
        })
        .collect()
}

/// Cache file name for a source identity.
///
/// Built from the file name only, so `cover.jpg` and `cover.png` get
/// distinct keys while `a/cover.jpg` and `b/cover.jpg` share one.
pub fn cache_key(identity: &str) -> String {
    let path = Path::new(identity);
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    format!(
        "{}{}{}.{}",
        sanitize(&base),
        PLACEHOLDER,
        sanitize(&ext),
        DERIVATIVE_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_traversal() {
        for identity in [
            "",
            "   ",
            "../etc/passwd",
            "covers/../../etc/passwd",
            "/etc/passwd",
            "\\windows\\system.ini",
            "covers\\a.jpg",
            "a\0.jpg",
            "covers/..",
        ] {
            assert!(
                matches!(validate_identity(identity), Err(CacheError::InvalidIdentity(_))),
                "accepted {:?}",
                identity
            );
        }
    }

    #[test]
    fn test_accepts_relative_paths() {
        assert!(validate_identity("cover.jpg").is_ok());
        assert!(validate_identity("2024/cover..final.png").is_ok());
        assert!(validate_identity("./cover.jpg").is_ok());
    }

    #[test]
    fn test_extension_is_part_of_key() {
        assert_eq!(cache_key("cover.jpg"), "cover_jpg.webp");
        assert_eq!(cache_key("cover.png"), "cover_png.webp");
        assert_ne!(cache_key("cover.jpg"), cache_key("cover.png"));
    }

    #[test]
    fn test_key_is_sanitized() {
        assert_eq!(cache_key("dir/my cover (1).JPG"), "my_cover__1__JPG.webp");
        assert_eq!(cache_key("封面.png"), "___png.webp");
        assert_eq!(cache_key("noext"), "noext_.webp");
    }
}
