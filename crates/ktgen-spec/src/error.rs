use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or resolving a test definitions document.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("could not read test definitions file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test definitions file contains invalid yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("test entry {entry} is missing required key '{key}'")]
    MissingKey { entry: String, key: &'static str },

    #[error("test entry {entry}: invalid index symbol '{symbol}' (expected a single ASCII letter)")]
    InvalidSymbol { entry: String, symbol: String },

    #[error("test entry {entry}: index '{symbol}' is declared more than once")]
    DuplicateIndex { entry: String, symbol: char },

    #[error("test entry {entry}: index '{symbol}' has non-positive static extent {extent}")]
    InvalidExtent {
        entry: String,
        symbol: char,
        extent: i64,
    },

    #[error("test entry {entry}: tensor '{tensor}' uses undeclared index '{symbol}'")]
    UnknownIndex {
        entry: String,
        tensor: String,
        symbol: String,
    },

    #[error("test entries '{first}' and '{second}' both map to directory '{identifier}'")]
    DuplicateIdentifier {
        first: String,
        second: String,
        identifier: String,
    },
}

pub type Result<T> = std::result::Result<T, SpecError>;
