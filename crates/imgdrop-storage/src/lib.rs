//! Imgdrop Storage Library
//!
//! Content addressing and the local object store.
//!
//! # Object naming
//!
//! Objects are stored flat under the storage root as `{digest}_{stem}{extension}`, where
//! `digest` is the first 16 hex characters of the SHA-256 of the content and `stem` is the
//! sanitized client filename stem truncated to 50 characters. Any object whose name starts
//! with `{digest}_` holds the same bytes, which is what deduplication relies on.

pub mod digest;
pub mod local;
pub mod naming;
pub mod traits;

// Re-export commonly used types
pub use digest::{digest_bytes, digest_stream, DIGEST_CHUNK_SIZE};
pub use local::LocalStorage;
pub use naming::{sanitize_filename, split_name, stored_filename, MAX_STEM_LEN};
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
