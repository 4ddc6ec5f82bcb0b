//! Filename policy for uploaded files.
//!
//! Rejects names that are empty, too long, contain characters that are illegal on
//! common filesystems, name a reserved device, or attempt to escape the upload directory.

use imgdrop_core::{UploadError, ValidationOutcome};

/// Maximum filename length in UTF-16 code units.
pub const MAX_FILENAME_LENGTH: usize = 255;

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\0'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct FilenamePolicy;

impl FilenamePolicy {
    /// Check a client-supplied filename. Pure function of the string.
    ///
    /// Traversal and reserved-name checks run before the length and character checks so
    /// that names like `../../etc/passwd.png` are always classified as traversal attempts.
    pub fn validate(&self, name: &str) -> Result<(), UploadError> {
        if name.is_empty() {
            return Err(UploadError::EmptyName);
        }

        if name.contains("..") || name.starts_with('/') || name.contains('~') {
            return Err(UploadError::PathTraversal);
        }

        let stem = file_stem(name).to_uppercase();
        if RESERVED_NAMES.contains(&stem.as_str()) {
            return Err(UploadError::ReservedName { stem });
        }

        let length = name.encode_utf16().count();
        if length > MAX_FILENAME_LENGTH {
            return Err(UploadError::NameTooLong {
                length,
                max: MAX_FILENAME_LENGTH,
            });
        }

        if name.contains(FORBIDDEN_CHARS) {
            return Err(UploadError::ForbiddenCharacters);
        }

        Ok(())
    }

    pub fn check(&self, name: &str) -> ValidationOutcome {
        self.validate(name).into()
    }
}

/// Last path component, using `/` as the separator.
fn final_component(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Byte index of the extension dot in the final component, if it has an extension.
/// A leading dot (".profile") or a trailing dot ("name.") does not start an extension.
fn extension_dot(component: &str) -> Option<usize> {
    match component.rfind('.') {
        Some(i) if i > 0 && i < component.len() - 1 => Some(i),
        _ => None,
    }
}

/// Name without its extension (`photo.tar.gz` -> `photo.tar`).
pub fn file_stem(name: &str) -> &str {
    let component = final_component(name);
    match extension_dot(component) {
        Some(i) => &component[..i],
        None => component,
    }
}

/// Lower-cased extension including the dot, or an empty string.
pub fn file_extension(name: &str) -> String {
    let component = final_component(name);
    match extension_dot(component) {
        Some(i) => component[i..].to_lowercase(),
        None => String::new(),
    }
}
