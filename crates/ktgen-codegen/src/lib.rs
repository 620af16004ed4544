//! Expansion of KTensor test specifications into C++ programs and CMake
//! registration.
//!
//! Every specification is expanded into one program per static/dynamic
//! extent [`Variant`]. Correctness programs check the expression under test
//! against scalar loops; compile-time-check programs carry a buggy and a
//! correct region behind `FORCE_ERROR`. Planning is pure; [`output`] writes
//! or verifies the planned files.

pub mod check;
pub mod cmake;
pub mod compile_check;
pub mod correctness;
pub mod error;
pub mod output;
pub mod plan;
mod program;
pub mod tensor_decl;
pub mod variant;
pub mod writer;

use std::path::Path;

use ktgen_spec::{load_document, Category, DefaultExtent};

pub use cmake::{StepKind, VariantMatrix, DEFAULT_RUN_ARGUMENTS};
pub use error::{GenerateError, Result};
pub use output::{check_files, write_files, FileCheck, FileStatus, WriteSummary};
pub use plan::{plan_category, CategoryPlan, GeneratedFile, GenerationSettings, SpecPlan};
pub use variant::{enumerate, Variant};

/// Load `<root>/<category>/<definitions file>` and plan its output.
pub fn plan_from_root(
    root: &Path,
    category: Category,
    defaults: &mut DefaultExtent,
    settings: &GenerationSettings,
) -> Result<CategoryPlan> {
    let path = root.join(category.dir_name()).join(&settings.definitions_file);
    let specs = load_document(&path, category, defaults)?;
    plan_category(category, &specs, settings)
}
