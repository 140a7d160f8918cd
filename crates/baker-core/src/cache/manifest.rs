//! `sources` manifest parsing
//!
//! Two line formats are accepted:
//!
//! ```text
//! d41d8cd98f00b204e9800998ecf8427e  foo.tar.gz
//! SHA512 (foo.tar.gz) = cf83e135...927da3e
//! ```
//!
//! A single line matching neither format rejects the whole manifest, as does
//! a filename that is not a plain file name (`/`, `.`, `..`).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use baker_fs::HashAlgorithm;
use regex::Regex;

use crate::{Error, Result};

/// `<md5>  <filename>`
static MD5_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-f0-9]{32})  (.+)$").unwrap());

/// `SHA512 (<filename>) = <sha512>`
static SHA512_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SHA512 \((.+)\) = ([a-f0-9]{128})$").unwrap());

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRecord {
    Md5 { filename: String, hash: String },
    Sha512 { filename: String, hash: String },
}

impl SourceRecord {
    /// Parse a single line, trailing whitespace ignored.
    ///
    /// The md5 format is tried first.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if let Some(caps) = MD5_LINE.captures(line) {
            return Some(Self::Md5 {
                hash: caps[1].to_string(),
                filename: caps[2].to_string(),
            });
        }
        SHA512_LINE.captures(line).map(|caps| Self::Sha512 {
            filename: caps[1].to_string(),
            hash: caps[2].to_string(),
        })
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Md5 { filename, .. } | Self::Sha512 { filename, .. } => filename,
        }
    }

    pub fn hash(&self) -> &str {
        match self {
            Self::Md5 { hash, .. } | Self::Sha512 { hash, .. } => hash,
        }
    }

    /// Algorithm inferred from the digest length.
    pub fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::infer(self.hash())
    }
}

/// A parsed `sources` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<SourceRecord>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        let records = content
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                SourceRecord::parse_line(line)
                    .filter(|record| is_plain_filename(record.filename()))
                    .ok_or_else(|| Error::ManifestFormat {
                        line: idx + 1,
                        content: line.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&baker_fs::io::read_text(path)?)
    }

    /// Records in file order, duplicates included.
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    /// Filename to hash mapping. A filename listed twice keeps its last hash.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.records
            .iter()
            .map(|r| (r.filename().to_string(), r.hash().to_string()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A single normal path component: files are staged under a scratch
/// directory by this name.
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
