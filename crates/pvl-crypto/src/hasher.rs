use std::io::{self, Read};

use pvl_types::Digest;
use sha2::{Digest as _, Sha256};

/// Read size used when streaming content into the hasher.
const CHUNK_SIZE: usize = 8192;

/// SHA-256 content hasher for uploaded files.
///
/// Produces the lowercase hex `filehash` that provenance payloads carry.
/// Content is hashed without any domain prefix so the value matches what
/// `sha256sum` reports for the same bytes.
pub struct ContentHasher;

impl ContentHasher {
    /// Hash an in-memory byte slice.
    pub fn hash(data: &[u8]) -> Digest {
        Digest::from_bytes(Sha256::digest(data).into())
    }

    /// Hash a stream to its end, reading in fixed-size chunks.
    pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<Digest> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(Digest::from_bytes(hasher.finalize().into()))
    }

    /// Verify that data hashes to the expected digest.
    pub fn verify(data: &[u8], expected: &Digest) -> bool {
        Self::hash(data) == *expected
    }
}
