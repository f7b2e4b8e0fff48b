use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;
use serde::Deserialize;

/// Content hash algorithms supported by the digest engine. Both produce a
/// 64-character lowercase hex string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

const CHUNK_SIZE: usize = 8192;

enum Hasher {
    Blake3(blake3::Hasher),
    Sha256(sha2::Sha256),
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Blake3(h) => {
                h.update(data);
            }
            Hasher::Sha256(h) => {
                use sha2::Digest;
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Blake3(h) => h.finalize().to_hex().to_string(),
            Hasher::Sha256(h) => {
                use sha2::Digest;
                let bytes = h.finalize();
                let mut hex = String::with_capacity(bytes.len() * 2);
                for byte in bytes {
                    let _ = write!(hex, "{byte:02x}");
                }
                hex
            }
        }
    }
}

impl HashAlgorithm {
    fn hasher(self) -> Hasher {
        match self {
            HashAlgorithm::Blake3 => Hasher::Blake3(blake3::Hasher::new()),
            HashAlgorithm::Sha256 => {
                use sha2::Digest;
                Hasher::Sha256(sha2::Sha256::new())
            }
        }
    }

    /// Hash an arbitrary byte stream in fixed-size chunks. Memory use is
    /// bounded regardless of input size; an empty stream yields the
    /// algorithm's empty-input digest.
    pub fn digest_reader<R: Read>(self, mut reader: R) -> io::Result<String> {
        let mut hasher = self.hasher();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize_hex())
    }

    /// Hash a file's content.
    pub fn digest_file(self, file_path: &Path) -> Result<String> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: '{}'", file_path.display()))?;

        let digest = self
            .digest_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read file: '{}'", file_path.display()))?;

        debug!("Hashed '{}': {}", file_path.display(), digest);
        Ok(digest)
    }

    /// Digest of a directory, derived from the digests of its immediate
    /// children. The list is sorted before hashing so the result does not
    /// depend on filesystem enumeration order. An empty directory yields
    /// the empty-input digest.
    pub fn directory_digest(self, mut child_digests: Vec<String>) -> String {
        child_digests.sort_unstable();

        let mut hasher = self.hasher();
        for digest in &child_digests {
            hasher.update(digest.as_bytes());
        }
        hasher.finalize_hex()
    }
}
