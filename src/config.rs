use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::digest::HashAlgorithm;

/// Settings read from an optional TOML file. Every field can also be set on
/// the command line; CLI flags win over the file, the file wins over
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Location of the persistent hash cache.
    pub cache_file: Option<PathBuf>,
    /// Content hash algorithm.
    pub algorithm: Option<HashAlgorithm>,
    /// Traverse symbolic links.
    pub follow_links: Option<bool>,
    /// Size of the hashing thread pool.
    pub threads: Option<usize>,
    /// Minimum likeness percentage shown in the report.
    pub likeness_threshold: Option<f64>,
}

impl Config {
    pub const DEFAULT_FILE: &'static str = concat!(env!("CARGO_PKG_NAME"), ".toml");

    /// Load the config from `path`, or from `clonescout.toml` in the
    /// working directory when no path is given. An explicitly named file
    /// must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(Self::DEFAULT_FILE), false),
        };

        match fs::read_to_string(&file) {
            Ok(text) => {
                debug!("Loaded config from '{}'", file.display());
                toml::from_str(&text)
                    .with_context(|| format!("Failed to parse config: '{}'", file.display()))
            }
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read config: '{}'", file.display())),
        }
    }
}
