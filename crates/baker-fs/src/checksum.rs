//! Checksum utilities
//!
//! Lookaside cache entries are addressed by MD5 (legacy manifests) or SHA-512
//! digests. The algorithm is never declared in a manifest; it is inferred from
//! the length of the hex digest. A separate `sha256:<hex>` content checksum is
//! used for change detection of local files.

use std::fmt;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256, Sha512};

use crate::{Error, Result, io};

/// Prefix for change-detection checksums produced by this module
const PREFIX: &str = "sha256:";

/// Hex length of a SHA-512 digest.
pub const SHA512_HEX_LEN: usize = 128;

/// Hex length of an MD5 digest.
pub const MD5_HEX_LEN: usize = 32;

/// Hash algorithm of a lookaside cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha512,
}

impl HashAlgorithm {
    /// Infer the algorithm from a hex digest.
    ///
    /// A 128-character digest is SHA-512; anything else is treated as MD5.
    pub fn infer(hash: &str) -> Self {
        if hash.len() == SHA512_HEX_LEN {
            Self::Sha512
        } else {
            Self::Md5
        }
    }

    /// Lowercase name as used by the lookaside protocol (`md5`, `sha512`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn digest_reader<D: Digest>(reader: &mut dyn Read, path: &Path) -> Result<String> {
    let mut hasher = D::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the hex digest of a file with the given algorithm.
pub fn file_digest(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let mut file = io::open(path)?;
    match algorithm {
        HashAlgorithm::Md5 => digest_reader::<Md5>(&mut file, path),
        HashAlgorithm::Sha512 => digest_reader::<Sha512>(&mut file, path),
    }
}

/// Verify that a file's digest matches `expected` (case-insensitive hex).
pub fn verify_file(path: &Path, expected: &str) -> Result<()> {
    let algorithm = HashAlgorithm::infer(expected);
    let actual = file_digest(path, algorithm)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let mut file = io::open(path)?;
    let hex = digest_reader::<Sha256>(&mut file, path)?;
    Ok(format!("{PREFIX}{hex}"))
}
