//! Streaming content digests for sealed archives.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use pger_schema::Sha256Hash;
use sha2::{Digest, Sha256};

/// Read size used while hashing.
pub const DIGEST_CHUNK_SIZE: usize = 4096;

/// Computes the content digest of a file.
pub trait ContentDigest {
    /// Hex digest of the file at `path`. Identical bytes give identical digests.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or read.
    fn digest(&self, path: &Path) -> std::io::Result<Sha256Hash>;
}

/// SHA-256 [`ContentDigest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl ContentDigest for Sha256Digester {
    fn digest(&self, path: &Path) -> std::io::Result<Sha256Hash> {
        sha256_file(path)
    }
}

/// SHA-256 of a file, streamed in [`DIGEST_CHUNK_SIZE`] reads.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> std::io::Result<Sha256Hash> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; DIGEST_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Sha256Hash::from_digest(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn known_vectors() {
        let tmp = tempdir().unwrap();
        let empty = tmp.path().join("empty");
        let abc = tmp.path().join("abc");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&abc, b"abc").unwrap();

        assert_eq!(
            sha256_file(&empty).unwrap().as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            Sha256Digester.digest(&abc).unwrap().as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn spans_multiple_chunks_deterministically() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("big");
        let data: Vec<u8> = (0..DIGEST_CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let expected = Sha256Hash::from_digest(&Sha256::digest(&data));
        assert_eq!(sha256_file(&path).unwrap(), expected);
        assert_eq!(sha256_file(&path).unwrap(), sha256_file(&path).unwrap());
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        assert!(sha256_file(&tmp.path().join("nope")).is_err());
    }
}
