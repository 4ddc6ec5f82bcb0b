//! Content addressing: SHA-256 over the whole object, truncated to 16 hex characters.

use imgdrop_core::ContentDigest;
use sha2::{Digest, Sha256};
use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Read size for the hashing pass.
pub const DIGEST_CHUNK_SIZE: usize = 64 * 1024;

/// Digest an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest::from_hash(&Sha256::digest(data))
}

/// Hash `stream` from its start in bounded chunks and rewind it afterwards.
///
/// Returns the digest and the number of bytes hashed.
pub async fn digest_stream<R>(stream: &mut R) -> io::Result<(ContentDigest, u64)>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    stream.seek(SeekFrom::Start(0)).await?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; DIGEST_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    stream.seek(SeekFrom::Start(0)).await?;
    Ok((ContentDigest::from_hash(&hasher.finalize()), total))
}
