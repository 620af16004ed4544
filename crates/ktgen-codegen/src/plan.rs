//! Pure planning stage: every file a category produces, in a fixed order.

use std::path::PathBuf;

use log::{debug, info};
use serde::Serialize;

use ktgen_spec::{Category, TestCase, TestSpecification, DEFINITIONS_FILE};

use crate::cmake::{
    compile_check_matrix, correctness_matrix, render_category, render_subdirectory,
    VariantMatrix, DEFAULT_RUN_ARGUMENTS,
};
use crate::compile_check::render_compile_check;
use crate::correctness::render_correctness;
use crate::error::{GenerateError, Result};
use crate::variant::enumerate;

pub const CMAKE_LISTS: &str = "CMakeLists.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    /// Name of the definitions document inside each category directory.
    pub definitions_file: String,
    pub run_arguments: Vec<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            definitions_file: DEFINITIONS_FILE.to_string(),
            run_arguments: DEFAULT_RUN_ARGUMENTS.to_vec(),
        }
    }
}

/// A file to be written, relative to the tests root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecPlan {
    pub name: String,
    pub identifier: String,
    pub variants: Vec<VariantMatrix>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPlan {
    pub category: Category,
    pub specs: Vec<SpecPlan>,
    #[serde(skip)]
    pub files: Vec<GeneratedFile>,
}

/// Expand every specification of `category` into sources and CMake files.
///
/// Specifications are processed in document order and variants in
/// enumeration order, so the same input always yields identical output.
pub fn plan_category(
    category: Category,
    specs: &[TestSpecification],
    settings: &GenerationSettings,
) -> Result<CategoryPlan> {
    let category_dir = PathBuf::from(category.dir_name());
    let mut files = Vec::new();
    let mut spec_plans = Vec::with_capacity(specs.len());

    for spec in specs {
        if spec.category() != category {
            return Err(GenerateError::CategoryMismatch {
                entry: spec.name.clone(),
                expected: category,
                actual: spec.category(),
            });
        }
        if spec.category() == Category::Correctness {
            check_run_arguments(spec, &settings.run_arguments)?;
        }
        let spec_dir = category_dir.join(&spec.identifier);
        let mut matrices = Vec::new();

        for variant in enumerate(&spec.indices) {
            debug!(
                "{}: variant {}{}",
                spec.identifier,
                variant.stem(),
                if variant.has_dynamic() { " (runtime extents)" } else { "" }
            );
            let (contents, matrix) = match &spec.case {
                TestCase::Correctness(case) => (
                    render_correctness(&spec.indices, case, &variant)
                        .map_err(|err| in_entry(spec, err))?,
                    correctness_matrix(&spec.identifier, &variant, &settings.run_arguments),
                ),
                TestCase::CompileTimeCheck(case) => (
                    render_compile_check(&spec.indices, case, &variant)
                        .map_err(|err| in_entry(spec, err))?,
                    compile_check_matrix(&spec.identifier, &variant),
                ),
            };
            files.push(GeneratedFile {
                path: spec_dir.join(variant.source_file_name()),
                contents,
            });
            matrices.push(matrix);
        }

        files.push(GeneratedFile {
            path: spec_dir.join(CMAKE_LISTS),
            contents: render_subdirectory(&matrices),
        });
        info!(
            "{category}: '{}' expands to {} variants",
            spec.name,
            matrices.len()
        );
        spec_plans.push(SpecPlan {
            name: spec.name.clone(),
            identifier: spec.identifier.clone(),
            variants: matrices,
        });
    }

    files.push(GeneratedFile {
        path: category_dir.join(CMAKE_LISTS),
        contents: render_category(specs.iter().map(|s| s.identifier.as_str())),
    });

    Ok(CategoryPlan {
        category,
        specs: spec_plans,
        files,
    })
}

fn in_entry(spec: &TestSpecification, err: GenerateError) -> GenerateError {
    GenerateError::Entry {
        entry: spec.name.clone(),
        source: Box::new(err),
    }
}

/// Dynamic extents read `argv[1 + position]`; every slot a variant of `spec`
/// can read must be filled by the run step.
fn check_run_arguments(spec: &TestSpecification, run_arguments: &[u32]) -> Result<()> {
    let required = spec
        .indices
        .iter()
        .rposition(|index| index.allow_dynamic)
        .map_or(0, |position| position + 1);
    if required > run_arguments.len() {
        return Err(GenerateError::InsufficientRunArguments {
            entry: spec.name.clone(),
            required,
            provided: run_arguments.len(),
        });
    }
    Ok(())
}
