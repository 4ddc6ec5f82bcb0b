//! Stored filename derivation.
//!
//! Stored names are `{digest}_{stem}{extension}` where stem and extension come from a
//! sanitized copy of the client filename.

use imgdrop_core::ContentDigest;

/// Maximum stem length (in characters) kept in a stored filename.
pub const MAX_STEM_LEN: usize = 50;

/// Replacement used when sanitation leaves nothing.
pub const FALLBACK_FILENAME: &str = "unnamed_file.jpg";

/// Reduce a client filename to `[A-Za-z0-9_.-]`.
///
/// Non-ASCII characters are dropped, path separators and whitespace runs become a
/// single `_`, and leading/trailing `.` and `_` are trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_ascii_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a sanitized name into `(stem, extension)`; the extension keeps its dot.
pub fn split_name(sanitized: &str) -> (&str, &str) {
    match sanitized.rfind('.') {
        Some(i) if i > 0 && i < sanitized.len() - 1 => (&sanitized[..i], &sanitized[i..]),
        _ => (sanitized, ""),
    }
}

/// Truncate a stem to [`MAX_STEM_LEN`] characters.
pub fn truncate_stem(stem: &str) -> &str {
    match stem.char_indices().nth(MAX_STEM_LEN) {
        Some((idx, _)) => &stem[..idx],
        None => stem,
    }
}

pub fn stored_filename(digest: &ContentDigest, stem: &str, extension: &str) -> String {
    format!("{}_{}{}", digest, truncate_stem(stem), extension)
}

/// Prefix shared by every stored object with this digest.
pub fn digest_prefix(digest: &ContentDigest) -> String {
    format!("{}_", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test.png"), "test.png");
        assert_eq!(sanitize_filename("My Vacation  Photo.JPG"), "My_Vacation_Photo.JPG");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("a\\b.png"), "a_b.png");
        assert_eq!(sanitize_filename("image (1).png"), "image_1.png");
        assert_eq!(sanitize_filename("_.hidden_"), "hidden");
    }

    #[test]
    fn test_sanitize_falls_back_when_empty() {
        assert_eq!(sanitize_filename("..."), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("照片"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("照片.png"), "png");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("test.png"), ("test", ".png"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name("noext"), ("noext", ""));
    }

    #[test]
    fn test_stored_filename_truncates_stem() {
        let digest = ContentDigest::parse("0123456789abcdef").unwrap();
        let long_stem = "x".repeat(80);
        let name = stored_filename(&digest, &long_stem, ".png");
        assert_eq!(name, format!("0123456789abcdef_{}.png", "x".repeat(MAX_STEM_LEN)));
        assert!(name.starts_with(&digest_prefix(&digest)));
    }
}
