//! CMake registration of generated programs.
//!
//! Each variant contributes one or two executables and the CTest entries that
//! build (and, for correctness programs, run) them. The matrix is described
//! as data first and rendered afterwards, so the names can also be listed.

use serde::Serialize;

use crate::compile_check::FORCE_ERROR_DEFINE;
use crate::variant::Variant;

const CORRECTNESS_TARGET_PREFIX: &str = "xc_";
const COMPILE_CHECK_TARGET_PREFIX: &str = "xctc_";
const WITH_BUG_SUFFIX: &str = "_with_bug";

/// Arguments appended to every run step. Dynamic extents read them by
/// declared index position, so seven values cover up to seven indices.
pub const DEFAULT_RUN_ARGUMENTS: [u32; 7] = [3, 4, 5, 6, 7, 8, 9];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub source: String,
    /// Extra `target_compile_definitions`, e.g. `FORCE_ERROR=1`.
    pub definitions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Build,
    Run,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub name: String,
    pub kind: StepKind,
    pub target: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<u32>,
    pub will_fail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantMatrix {
    pub tag: String,
    pub targets: Vec<Target>,
    pub steps: Vec<Step>,
}

impl VariantMatrix {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .map(|t| t.name.as_str())
            .chain(self.steps.iter().map(|s| s.name.as_str()))
    }
}

fn build_step(name: String, target: &str, will_fail: bool) -> Step {
    Step {
        name,
        kind: StepKind::Build,
        target: target.to_string(),
        arguments: Vec::new(),
        will_fail,
    }
}

/// One executable, a build test and a run test.
pub fn correctness_matrix(
    identifier: &str,
    variant: &Variant,
    run_arguments: &[u32],
) -> VariantMatrix {
    let stem = variant.stem();
    let target = format!("{CORRECTNESS_TARGET_PREFIX}{identifier}_{stem}");
    let test = format!("test_{identifier}_{stem}");
    VariantMatrix {
        tag: variant.tag(),
        targets: vec![Target {
            name: target.clone(),
            source: variant.source_file_name(),
            definitions: Vec::new(),
        }],
        steps: vec![
            build_step(format!("build_{test}"), &target, false),
            Step {
                name: format!("run_{test}"),
                kind: StepKind::Run,
                target,
                arguments: run_arguments.to_vec(),
                will_fail: false,
            },
        ],
    }
}

/// The same source built twice; the build with the error switch must fail.
pub fn compile_check_matrix(identifier: &str, variant: &Variant) -> VariantMatrix {
    let stem = variant.stem();
    let target = format!("{COMPILE_CHECK_TARGET_PREFIX}{identifier}_{stem}");
    let buggy = format!("{target}{WITH_BUG_SUFFIX}");
    let test = format!("test_{identifier}_{stem}");
    VariantMatrix {
        tag: variant.tag(),
        targets: vec![
            Target {
                name: target.clone(),
                source: variant.source_file_name(),
                definitions: Vec::new(),
            },
            Target {
                name: buggy.clone(),
                source: variant.source_file_name(),
                definitions: vec![format!("{FORCE_ERROR_DEFINE}=1")],
            },
        ],
        steps: vec![
            build_step(test.clone(), &target, false),
            build_step(format!("{test}{WITH_BUG_SUFFIX}"), &buggy, true),
        ],
    }
}

/// `CMakeLists.txt` for one specification directory.
pub fn render_subdirectory(matrices: &[VariantMatrix]) -> String {
    let mut out = String::new();
    for matrix in matrices {
        render_variant(&mut out, matrix);
    }
    out
}

fn render_variant(out: &mut String, matrix: &VariantMatrix) {
    for target in &matrix.targets {
        push(
            out,
            &format!(
                "add_executable({} ${{CMAKE_CURRENT_SOURCE_DIR}}/{})",
                target.name, target.source
            ),
        );
    }
    for target in matrix.targets.iter().filter(|t| !t.definitions.is_empty()) {
        push(
            out,
            &format!(
                "target_compile_definitions({} PRIVATE {})",
                target.name,
                target.definitions.join(" ")
            ),
        );
    }
    for target in &matrix.targets {
        push(out, "target_include_directories(");
        push(out, &format!("    {}", target.name));
        push(out, "    PUBLIC ${CMAKE_INSTALL_PREFIX}/${CMAKE_INSTALL_INCLUDEDIR}");
        push(out, ")");
        push(out, &format!("set_target_properties({} PROPERTIES", target.name));
        push(out, "    EXCLUDE_FROM_ALL TRUE");
        push(out, "    EXCLUDE_FROM_DEFAULT_BUILD TRUE");
        push(out, "    CXX_STANDARD ${KTENSOR_CXX_STANDARD}");
        push(out, ")");
        for step in matrix.steps.iter().filter(|s| s.target == target.name) {
            render_step(out, step);
        }
    }
    for step in matrix.steps.iter().filter(|s| s.will_fail) {
        push(out, "set_property(");
        push(out, &format!("    TEST {}", step.name));
        push(out, "    PROPERTY WILL_FAIL TRUE");
        push(out, ")");
    }
}

fn render_step(out: &mut String, step: &Step) {
    push(out, "add_test(");
    push(out, &format!("    NAME {}", step.name));
    match step.kind {
        StepKind::Build => push(
            out,
            &format!(
                "    COMMAND ${{CMAKE_COMMAND}} --build . --target {}",
                step.target
            ),
        ),
        StepKind::Run => {
            let mut command = format!("    COMMAND $<TARGET_FILE:{}>", step.target);
            for arg in &step.arguments {
                command.push_str(&format!(" {arg}"));
            }
            push(out, &command);
        }
    }
    push(out, "    WORKING_DIRECTORY ${CMAKE_BINARY_DIR}");
    push(out, ")");
}

/// `CMakeLists.txt` for a category directory.
pub fn render_category<'a>(identifiers: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for identifier in identifiers {
        push(&mut out, &format!("add_subdirectory(\"{identifier}\")"));
    }
    out
}

fn push(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
