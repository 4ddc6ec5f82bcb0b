//! Magic-number content detection.

use std::fmt;

/// Number of leading bytes inspected by [`detect`].
pub const SNIFF_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl MediaType {
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
        }
    }

    /// Extensions (lower-case, with dot) that may carry this content.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaType::Jpeg => &[".jpg", ".jpeg"],
            MediaType::Png => &[".png"],
            MediaType::Gif => &[".gif"],
            MediaType::Webp => &[".webp"],
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

// Checked in order; first match wins.
const SIGNATURES: &[(&[u8], MediaType)] = &[
    (&[0xFF, 0xD8, 0xFF], MediaType::Jpeg),
    (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], MediaType::Png),
    (b"GIF87a", MediaType::Gif),
    (b"GIF89a", MediaType::Gif),
    (b"RIFF", MediaType::Webp),
];

/// Identify content from its leading bytes. `None` means unknown, which is not an error.
pub fn detect(prefix: &[u8]) -> Option<MediaType> {
    SIGNATURES
        .iter()
        .find(|(magic, _)| prefix.starts_with(magic))
        .map(|(_, media_type)| *media_type)
}

/// Whether `extension` (lower-case, with dot) is a valid extension for `media_type`.
pub fn cross_check(media_type: MediaType, extension: &str) -> bool {
    media_type.extensions().contains(&extension)
}
