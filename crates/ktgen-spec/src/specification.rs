//! Resolved, immutable test specifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::index::IndexSpec;
use crate::tensor::TensorSpec;

/// The two kinds of generated tests. Each has its own directory and its own
/// entry schema in `test_definitions.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Correctness,
    CompileTimeChecks,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Correctness, Category::CompileTimeChecks];

    /// Directory (relative to the tests root) holding this category.
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Correctness => "correctness",
            Category::CompileTimeChecks => "compile_time_checks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSpecification {
    pub name: String,
    /// `name` with spaces replaced by underscores; names directories and targets.
    pub identifier: String,
    /// Declaration order is significant: it fixes variant order and tags.
    pub indices: Vec<IndexSpec>,
    pub case: TestCase,
}

impl TestSpecification {
    pub fn identifier_for(name: &str) -> String {
        name.replace(' ', "_")
    }

    pub fn category(&self) -> Category {
        match self.case {
            TestCase::Correctness(_) => Category::Correctness,
            TestCase::CompileTimeCheck(_) => Category::CompileTimeChecks,
        }
    }

    pub fn index(&self, symbol: char) -> Option<&IndexSpec> {
        self.indices.iter().find(|index| index.symbol == symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCase {
    Correctness(CorrectnessCase),
    CompileTimeCheck(CompileTimeCheckCase),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectnessCase {
    pub tensors: Vec<TensorSpec>,
    pub setup: Vec<String>,
    /// Tensor-index expression under test, e.g. `C(i,j) = A(i,k)*B(k,j);`
    pub expression: String,
    pub inside_loop: Vec<String>,
    /// Explicit comparison; derived from `expression` when absent.
    pub check: Option<String>,
}

/// Tensors and statements placed in one region of a compile-time-check program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub tensors: Vec<TensorSpec>,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileTimeCheckCase {
    pub setup: Fragment,
    pub with_bug: Fragment,
    pub correct: Fragment,
    pub post: Vec<String>,
    /// Tensor whose data the program returns, keeping it alive.
    pub anchor: String,
}
