//! Imgdrop Processing Library
//!
//! Pre-storage checks for uploaded images: filename policy, magic-number
//! content detection and the upload validator that combines them.

pub mod filename;
pub mod sniff;
pub mod validator;

pub use filename::{file_extension, file_stem, FilenamePolicy, MAX_FILENAME_LENGTH};
pub use sniff::{cross_check, detect, MediaType, SNIFF_LEN};
pub use validator::{normalize_mime_type, UploadRequest, UploadValidator};
