pub mod cache;
pub mod cli;
pub mod config;
pub mod diag;
pub mod digest;
pub mod index;
pub mod likeness;
pub mod prune;
pub mod report;
pub mod scan;
pub mod scanner;

pub use cache::HashCache;
pub use cli::Cli;
pub use config::Config;
pub use diag::{Diagnostic, DiagnosticKind};
pub use digest::HashAlgorithm;
pub use index::{DigestIndex, drop_singletons, invert};
pub use likeness::LikenessPair;
pub use scan::{ScanOptions, ScanResult, scan};
