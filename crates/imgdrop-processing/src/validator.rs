use imgdrop_core::{UploadError, UploadLimits, ValidationOutcome};
use std::io::SeekFrom;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::filename::{file_extension, FilenamePolicy};
use crate::sniff::{self, SNIFF_LEN};

/// One uploaded file as received from the transport.
///
/// `stream` must be rewindable: validation peeks at the leading bytes and later
/// stages read the content again from the start.
#[derive(Debug)]
pub struct UploadRequest<R> {
    pub original_name: String,
    pub declared_content_type: Option<String>,
    pub size: u64,
    pub stream: R,
}

impl<R> UploadRequest<R> {
    pub fn new(
        original_name: impl Into<String>,
        declared_content_type: Option<String>,
        size: u64,
        stream: R,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            declared_content_type,
            size,
            stream,
        }
    }

    /// Lower-cased extension of the original name, including the dot.
    pub fn extension(&self) -> String {
        file_extension(&self.original_name)
    }
}

/// Strip parameters from a MIME type and lower-case it (`Image/PNG; q=1` -> `image/png`).
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// Upload validator
///
/// Runs every check that can be decided before touching the storage directory,
/// in a fixed order; the first failing check determines the rejection.
pub struct UploadValidator<'a> {
    limits: &'a UploadLimits,
    filename_policy: FilenamePolicy,
}

impl<'a> UploadValidator<'a> {
    pub fn new(limits: &'a UploadLimits) -> Self {
        Self {
            limits,
            filename_policy: FilenamePolicy,
        }
    }

    /// Validate everything except the content itself.
    pub fn validate_metadata(
        &self,
        original_name: &str,
        declared_content_type: Option<&str>,
        size: u64,
    ) -> Result<(), UploadError> {
        self.filename_policy.validate(original_name)?;

        if size > self.limits.max_file_size {
            return Err(UploadError::file_too_large(size, self.limits.max_file_size));
        }

        if size < self.limits.min_file_size {
            return Err(UploadError::FileTooSmall {
                size,
                min: self.limits.min_file_size,
            });
        }

        let extension = file_extension(original_name);
        if !self.limits.allowed_extensions.contains(&extension) {
            let allowed = self
                .limits
                .allowed_extensions
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(UploadError::UnsupportedType { extension, allowed });
        }

        if let Some(content_type) = declared_content_type.filter(|ct| !ct.trim().is_empty()) {
            if !self
                .limits
                .allowed_content_types
                .contains(&normalize_mime_type(content_type))
            {
                return Err(UploadError::InvalidDeclaredType {
                    content_type: content_type.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Check detected content against the allow-list and the file extension.
    pub fn validate_content(&self, prefix: &[u8], extension: &str) -> Result<(), UploadError> {
        let Some(detected) = sniff::detect(prefix) else {
            tracing::debug!(extension = %extension, "No known signature in upload, skipping content check");
            return Ok(());
        };

        if !self
            .limits
            .allowed_content_types
            .contains(detected.mime_type())
        {
            return Err(UploadError::ContentTypeMismatch {
                detected: detected.mime_type().to_string(),
            });
        }

        if !sniff::cross_check(detected, extension) {
            return Err(UploadError::ExtensionContentMismatch {
                detected: detected.mime_type().to_string(),
                extension: extension.to_string(),
            });
        }

        Ok(())
    }

    /// Validate a full request. The stream is left positioned at its start.
    pub async fn validate<R>(&self, request: &mut UploadRequest<R>) -> Result<(), UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin,
    {
        self.validate_metadata(
            &request.original_name,
            request.declared_content_type.as_deref(),
            request.size,
        )?;

        match peek_prefix(&mut request.stream).await {
            Ok(prefix) => self.validate_content(&prefix, &request.extension())?,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    filename = %request.original_name,
                    "Could not read file signature, skipping content check"
                );
            }
        }

        Ok(())
    }

    pub async fn outcome<R>(&self, request: &mut UploadRequest<R>) -> ValidationOutcome
    where
        R: AsyncRead + AsyncSeek + Unpin,
    {
        self.validate(request).await.into()
    }
}

/// Read up to [`SNIFF_LEN`] bytes from the start of `stream`, then rewind it.
async fn peek_prefix<R>(stream: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    stream.seek(SeekFrom::Start(0)).await?;
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    (&mut *stream)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut prefix)
        .await?;
    stream.seek(SeekFrom::Start(0)).await?;
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgdrop_core::ErrorKind;
    use std::io::Cursor;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

    fn limits() -> UploadLimits {
        UploadLimits {
            max_file_size: 1024,
            ..UploadLimits::default()
        }
    }

    fn body(magic: &[u8], len: usize) -> Vec<u8> {
        let mut data = magic.to_vec();
        data.resize(len, 0);
        data
    }

    fn request(name: &str, content_type: Option<&str>, data: Vec<u8>) -> UploadRequest<Cursor<Vec<u8>>> {
        UploadRequest::new(
            name,
            content_type.map(str::to_string),
            data.len() as u64,
            Cursor::new(data),
        )
    }

    async fn kind_of(req: &mut UploadRequest<Cursor<Vec<u8>>>) -> Option<ErrorKind> {
        let limits = limits();
        UploadValidator::new(&limits)
            .validate(req)
            .await
            .err()
            .map(|e| e.kind())
    }

    #[tokio::test]
    async fn test_accepts_valid_png() {
        let mut req = request("test.png", Some("image/png"), body(PNG_MAGIC, 89));
        assert_eq!(kind_of(&mut req).await, None);
        // Stream is rewound for the next stage.
        assert_eq!(req.stream.position(), 0);
    }

    #[test]
    fn test_size_boundaries() {
        let limits = limits();
        let validator = UploadValidator::new(&limits);

        let at_min = validator.validate_metadata("a.png", None, limits.min_file_size);
        assert!(at_min.is_ok());
        let below_min = validator.validate_metadata("a.png", None, limits.min_file_size - 1);
        assert_eq!(below_min.unwrap_err().kind(), ErrorKind::FileTooSmall);

        let at_max = validator.validate_metadata("a.png", None, limits.max_file_size);
        assert!(at_max.is_ok());
        let above_max = validator.validate_metadata("a.png", None, limits.max_file_size + 1);
        assert_eq!(above_max.unwrap_err().kind(), ErrorKind::FileTooLarge);
    }

    #[tokio::test]
    async fn test_filename_checked_first() {
        let mut req = request("../../etc/passwd.png", Some("text/plain"), vec![]);
        assert_eq!(kind_of(&mut req).await, Some(ErrorKind::PathTraversal));
    }

    #[tokio::test]
    async fn test_unsupported_extension_lists_allowed() {
        let limits = limits();
        let err = UploadValidator::new(&limits)
            .validate_metadata("doc.pdf", None, 100)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File type not supported. Allowed types: .gif, .jpeg, .jpg, .png, .webp"
        );
    }

    #[tokio::test]
    async fn test_declared_type() {
        let mut bad = request("test.png", Some("text/html"), body(PNG_MAGIC, 64));
        assert_eq!(kind_of(&mut bad).await, Some(ErrorKind::InvalidDeclaredType));

        let mut with_params = request("test.png", Some("Image/PNG; charset=binary"), body(PNG_MAGIC, 64));
        assert_eq!(kind_of(&mut with_params).await, None);

        let mut absent = request("test.png", None, body(PNG_MAGIC, 64));
        assert_eq!(kind_of(&mut absent).await, None);
    }

    #[tokio::test]
    async fn test_extension_content_mismatch() {
        let mut req = request("test.png", Some("image/png"), body(JPEG_MAGIC, 64));
        assert_eq!(kind_of(&mut req).await, Some(ErrorKind::ExtensionContentMismatch));
    }

    #[tokio::test]
    async fn test_detected_type_not_allowed() {
        let mut limits = limits();
        limits.allowed_content_types.remove("image/gif");
        let mut req = request("anim.gif", None, body(b"GIF89a", 64));
        let err = UploadValidator::new(&limits).validate(&mut req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContentTypeMismatch);
    }

    #[tokio::test]
    async fn test_unknown_content_is_accepted() {
        let mut req = request("test.png", Some("image/png"), vec![b'x'; 20]);
        assert_eq!(kind_of(&mut req).await, None);
    }

    #[tokio::test]
    async fn test_short_stream_still_sniffed() {
        // Shorter than the sniff window; the signature is still recognized.
        let limits = UploadLimits {
            min_file_size: 1,
            ..limits()
        };
        let mut req = request("test.jpg", None, JPEG_MAGIC.to_vec());
        assert!(UploadValidator::new(&limits).validate(&mut req).await.is_ok());
    }

    #[tokio::test]
    async fn test_outcome_carries_message() {
        let limits = limits();
        let mut req = request("", None, vec![]);
        let outcome = UploadValidator::new(&limits).outcome(&mut req).await;
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected {
                reason: ErrorKind::EmptyName,
                detail: "File must have a name.".to_string(),
            }
        );
    }

    /// Stream that can be read but refuses to seek.
    struct UnseekableStream(Cursor<Vec<u8>>);

    impl AsyncRead for UnseekableStream {
        fn poll_read(
            mut self: std::pin::Pin<&mut Self>,
            cx: &mut std::task::Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::pin::Pin::new(&mut self.0).poll_read(cx, buf)
        }
    }

    impl AsyncSeek for UnseekableStream {
        fn start_seek(self: std::pin::Pin<&mut Self>, _position: SeekFrom) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "seek not supported",
            ))
        }

        fn poll_complete(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<u64>> {
            std::task::Poll::Ready(Ok(0))
        }
    }

    #[tokio::test]
    async fn test_unreadable_signature_does_not_reject() {
        let limits = limits();
        let data = body(JPEG_MAGIC, 64);
        let mut req = UploadRequest::new(
            "photo.png",
            Some("image/png".to_string()),
            data.len() as u64,
            UnseekableStream(Cursor::new(data)),
        );

        assert!(UploadValidator::new(&limits).validate(&mut req).await.is_ok());
    }

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("image/jpeg"), "image/jpeg");
        assert_eq!(normalize_mime_type(" IMAGE/PNG ; q=0.9"), "image/png");
    }
}
