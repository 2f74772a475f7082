// src/verify.rs

//! Media content verification.
//!
//! The upstream API declares each attachment's MD5 digest, base64-encoded.
//! MD5 here only defends against truncated or corrupted downloads, not
//! tampering, so its weakness as a cryptographic hash does not matter.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};

/// Compute the base64-encoded MD5 digest of a file's contents.
pub fn digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(STANDARD.encode(hasher.finalize()))
}

/// Digest of an in-memory buffer, in the same encoding as [`digest`].
pub fn digest_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(Md5::digest(bytes))
}

/// Check a file's digest against the expected value.
///
/// A missing or unreadable file is simply "not verified".
pub fn verify(path: &Path, expected: &str) -> bool {
    match digest(path) {
        Ok(actual) => actual == expected,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // MD5("") = d41d8cd98f00b204e9800998ecf8427e
    const EMPTY_MD5_B64: &str = "1B2M2Y8AsgTpgAmY7PhCfg==";

    #[test]
    fn test_digest_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(digest(&path).unwrap(), EMPTY_MD5_B64);
    }

    #[test]
    fn test_digest_matches_bytes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let content = b"the quick brown fox";
        std::fs::write(&path, content).unwrap();
        assert_eq!(digest(&path).unwrap(), digest_bytes(content));
    }

    #[test]
    fn test_verify_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"actual content").unwrap();
        assert!(verify(&path, &digest_bytes(b"actual content")));
        assert!(!verify(&path, &digest_bytes(b"different content")));
    }

    #[test]
    fn test_missing_file_is_not_verified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.bin");
        assert!(!verify(&path, EMPTY_MD5_B64));
    }
}
