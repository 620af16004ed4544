//! Declarative KTensor test definitions.
//!
//! A definitions document lists test entries for one [`Category`]. Each entry
//! is resolved into an immutable [`TestSpecification`] with all defaults
//! applied, ready to be expanded into generated programs.

pub mod document;
pub mod error;
pub mod extent;
pub mod index;
pub mod specification;
pub mod tensor;

pub use document::{load_document, parse_document, DEFINITIONS_FILE};
pub use error::{Result, SpecError};
pub use extent::{DefaultExtent, Extent, DEFAULT_STATIC_EXTENT, DYNAMIC_EXTENT};
pub use index::IndexSpec;
pub use specification::{
    Category, CompileTimeCheckCase, CorrectnessCase, Fragment, TestCase, TestSpecification,
};
pub use tensor::{TensorKind, TensorSpec, DEFAULT_SCALAR_TYPE, PRIMARY_TENSOR_TYPE};
