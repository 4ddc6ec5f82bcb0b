//! Data model shared by the upload pipeline.

use std::fmt;

use serde::Serialize;

use crate::error::{ErrorKind, ErrorMetadata, UploadError};

/// Length of a [`ContentDigest`] in hex characters.
pub const DIGEST_HEX_LEN: usize = 16;

/// Result of running a validation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected { reason: ErrorKind, detail: String },
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }
}

impl From<Result<(), UploadError>> for ValidationOutcome {
    fn from(result: Result<(), UploadError>) -> Self {
        match result {
            Ok(()) => ValidationOutcome::Accepted,
            Err(err) => ValidationOutcome::Rejected {
                reason: err.kind(),
                detail: err.client_message(),
            },
        }
    }
}

/// First 16 hex characters of the SHA-256 of an object's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Wrap an existing hex string. Returns `None` unless it is exactly 16 lower-case hex chars.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == DIGEST_HEX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| ContentDigest(value.to_string()))
    }

    /// Digest from raw hash output; only the leading bytes are kept.
    pub fn from_hash(hash: &[u8]) -> Self {
        let prefix = hash.get(..DIGEST_HEX_LEN / 2).unwrap_or(hash);
        ContentDigest(hex::encode(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the caller gets back for one upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub public_url: Option<String>,
    pub error_message: Option<String>,
    pub error_code: u8,
    pub deduplicated: bool,
}

impl UploadOutcome {
    pub fn stored(public_url: String, deduplicated: bool) -> Self {
        Self {
            success: true,
            public_url: Some(public_url),
            error_message: None,
            error_code: 0,
            deduplicated,
        }
    }

    pub fn failed(err: &UploadError) -> Self {
        Self {
            success: false,
            public_url: None,
            error_message: Some(err.client_message()),
            error_code: 1,
            deduplicated: false,
        }
    }
}
