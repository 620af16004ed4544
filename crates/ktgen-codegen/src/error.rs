use std::path::PathBuf;

use ktgen_spec::{Category, SpecError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("tensor '{tensor}' uses index '{symbol}' which has no extent in variant '{tag}'")]
    UnresolvedIndex {
        tensor: String,
        symbol: char,
        tag: String,
    },

    #[error("tensor '{tensor}' in variant '{tag}' has more elements than fit in 64 bits")]
    StorageOverflow { tensor: String, tag: String },

    #[error(
        "test '{entry}' reads argv[{required}] in its dynamic variants \
         but only {provided} run arguments are configured"
    )]
    InsufficientRunArguments {
        entry: String,
        required: usize,
        provided: usize,
    },

    #[error("test '{entry}': {source}")]
    Entry {
        entry: String,
        #[source]
        source: Box<GenerateError>,
    },

    #[error("test '{entry}' is a {actual} test and cannot be generated under {expected}")]
    CategoryMismatch {
        entry: String,
        expected: Category,
        actual: Category,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GenerateError>;
