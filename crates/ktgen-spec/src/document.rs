//! Parsing of `test_definitions.yaml` documents.
//!
//! Raw nodes mirror the document keys one-to-one; every optional key is
//! resolved to its default here so that generators never look at raw input.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, SpecError};
use crate::extent::DefaultExtent;
use crate::index::IndexSpec;
use crate::specification::{
    Category, CompileTimeCheckCase, CorrectnessCase, Fragment, TestCase, TestSpecification,
};
use crate::tensor::{RawTensor, TensorKind, TensorSpec, DEFAULT_SCALAR_TYPE, PRIMARY_TENSOR_TYPE};

/// File name of the definitions document inside each category directory.
pub const DEFINITIONS_FILE: &str = "test_definitions.yaml";

/// Anchor used when a compile-time check declares no dense tensor of its own.
const FALLBACK_ANCHOR: &str = "A";

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "E: Deserialize<'de>"))]
struct RawDocument<E> {
    #[serde(default)]
    tests: Vec<E>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIndex {
    symbol: Option<String>,
    #[serde(rename = "static extent")]
    static_extent: Option<i64>,
    #[serde(rename = "allow dynamic")]
    allow_dynamic: Option<bool>,
    #[serde(rename = "forms loop")]
    forms_loop: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCorrectnessEntry {
    name: Option<String>,
    #[serde(default)]
    indices: Vec<RawIndex>,
    #[serde(default)]
    tensors: Vec<RawTensor>,
    #[serde(default)]
    setup: Vec<String>,
    expression: Option<String>,
    #[serde(default, rename = "inside loop")]
    inside_loop: Vec<String>,
    check: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFragment {
    #[serde(default)]
    tensors: Vec<RawTensor>,
    #[serde(default)]
    lines: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCompileCheckEntry {
    name: Option<String>,
    #[serde(default)]
    indices: Vec<RawIndex>,
    setup: Option<RawFragment>,
    #[serde(rename = "with bug")]
    with_bug: Option<RawFragment>,
    correct: Option<RawFragment>,
    #[serde(default)]
    post: Vec<String>,
    anchor: Option<String>,
}

/// Read and resolve the definitions file at `path`.
pub fn load_document(
    path: &Path,
    category: Category,
    defaults: &mut DefaultExtent,
) -> Result<Vec<TestSpecification>> {
    let source = fs::read_to_string(path).map_err(|source| SpecError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let specs = parse_document(&source, category, defaults)?;
    info!(
        "loaded {} {} test definitions from {}",
        specs.len(),
        category,
        path.display()
    );
    Ok(specs)
}

/// Parse a definitions document for `category`.
///
/// The whole document is rejected on the first invalid entry; no partial list
/// is ever returned.
pub fn parse_document(
    source: &str,
    category: Category,
    defaults: &mut DefaultExtent,
) -> Result<Vec<TestSpecification>> {
    let specs = match category {
        Category::Correctness => parse_entries(source, |position, raw| {
            resolve_correctness(position, raw, defaults)
        })?,
        Category::CompileTimeChecks => parse_entries(source, |position, raw| {
            resolve_compile_check(position, raw, defaults)
        })?,
    };
    check_unique_identifiers(&specs)?;
    Ok(specs)
}

fn parse_entries<E, F>(source: &str, mut resolve: F) -> Result<Vec<TestSpecification>>
where
    E: DeserializeOwned,
    F: FnMut(usize, E) -> Result<TestSpecification>,
{
    let document: RawDocument<E> = serde_yaml::from_str(source)?;
    document
        .tests
        .into_iter()
        .enumerate()
        .map(|(position, raw)| resolve(position, raw))
        .collect()
}

fn entry_label(name: Option<&str>, position: usize) -> String {
    match name {
        Some(name) => format!("'{name}'"),
        None => format!("#{}", position + 1),
    }
}

fn require_name(name: Option<String>, position: usize) -> Result<String> {
    name.filter(|n| !n.trim().is_empty())
        .ok_or_else(|| SpecError::MissingKey {
            entry: entry_label(None, position),
            key: "name",
        })
}

fn resolve_correctness(
    position: usize,
    raw: RawCorrectnessEntry,
    defaults: &mut DefaultExtent,
) -> Result<TestSpecification> {
    let name = require_name(raw.name, position)?;
    let label = entry_label(Some(&name), position);
    let indices = resolve_indices(&label, raw.indices, defaults)?;
    let expression = raw
        .expression
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| SpecError::MissingKey {
            entry: label.clone(),
            key: "expression",
        })?;
    let tensors = resolve_tensors(&label, raw.tensors, &indices)?;
    debug!(
        "resolved correctness entry {label}: {} indices, {} tensors",
        indices.len(),
        tensors.len()
    );
    Ok(TestSpecification {
        identifier: TestSpecification::identifier_for(&name),
        name,
        indices,
        case: TestCase::Correctness(CorrectnessCase {
            tensors,
            setup: raw.setup,
            expression,
            inside_loop: raw.inside_loop,
            check: raw.check,
        }),
    })
}

fn resolve_compile_check(
    position: usize,
    raw: RawCompileCheckEntry,
    defaults: &mut DefaultExtent,
) -> Result<TestSpecification> {
    let name = require_name(raw.name, position)?;
    let label = entry_label(Some(&name), position);
    let indices = resolve_indices(&label, raw.indices, defaults)?;

    let with_bug = raw.with_bug.ok_or_else(|| SpecError::MissingKey {
        entry: label.clone(),
        key: "with bug",
    })?;
    let correct = raw.correct.ok_or_else(|| SpecError::MissingKey {
        entry: label.clone(),
        key: "correct",
    })?;

    let setup = resolve_fragment(&label, raw.setup.unwrap_or_default(), &indices)?;
    let with_bug = resolve_fragment(&label, with_bug, &indices)?;
    let correct = resolve_fragment(&label, correct, &indices)?;
    let anchor = raw
        .anchor
        .or_else(|| first_dense(&setup))
        .or_else(|| first_dense(&correct))
        .unwrap_or_else(|| FALLBACK_ANCHOR.to_string());
    debug!("resolved compile-time-check entry {label}: anchor {anchor}");

    Ok(TestSpecification {
        identifier: TestSpecification::identifier_for(&name),
        name,
        indices,
        case: TestCase::CompileTimeCheck(CompileTimeCheckCase {
            setup,
            with_bug,
            correct,
            post: raw.post,
            anchor,
        }),
    })
}

fn first_dense(fragment: &Fragment) -> Option<String> {
    fragment
        .tensors
        .iter()
        .find(|t| t.is_dense())
        .map(|t| t.name.clone())
}

fn resolve_fragment(label: &str, raw: RawFragment, indices: &[IndexSpec]) -> Result<Fragment> {
    Ok(Fragment {
        tensors: resolve_tensors(label, raw.tensors, indices)?,
        lines: raw.lines,
    })
}

fn resolve_indices(
    label: &str,
    raw: Vec<RawIndex>,
    defaults: &mut DefaultExtent,
) -> Result<Vec<IndexSpec>> {
    let mut seen = HashSet::new();
    let mut indices = Vec::with_capacity(raw.len());
    for node in raw {
        let text = node.symbol.ok_or_else(|| SpecError::MissingKey {
            entry: label.to_string(),
            key: "symbol",
        })?;
        let symbol = parse_symbol(&text).ok_or_else(|| SpecError::InvalidSymbol {
            entry: label.to_string(),
            symbol: text.clone(),
        })?;
        if !seen.insert(symbol) {
            return Err(SpecError::DuplicateIndex {
                entry: label.to_string(),
                symbol,
            });
        }
        let static_extent = match node.static_extent {
            Some(extent) => u32::try_from(extent)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| SpecError::InvalidExtent {
                    entry: label.to_string(),
                    symbol,
                    extent,
                })?,
            None => defaults.next_extent(),
        };
        indices.push(IndexSpec {
            symbol,
            static_extent,
            allow_dynamic: node.allow_dynamic.unwrap_or(true),
            forms_loop: node.forms_loop.unwrap_or(true),
        });
    }
    Ok(indices)
}

fn parse_symbol(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
        _ => None,
    }
}

fn resolve_tensors(
    label: &str,
    raw: Vec<RawTensor>,
    indices: &[IndexSpec],
) -> Result<Vec<TensorSpec>> {
    raw.into_iter()
        .enumerate()
        .map(|(position, node)| {
            let name = node.name.ok_or_else(|| SpecError::MissingKey {
                entry: format!("{label} tensor #{}", position + 1),
                key: "name",
            })?;
            let extents = node
                .extents
                .iter()
                .map(|text| {
                    parse_symbol(text)
                        .filter(|c| indices.iter().any(|i| i.symbol == *c))
                        .ok_or_else(|| SpecError::UnknownIndex {
                            entry: label.to_string(),
                            tensor: name.clone(),
                            symbol: text.clone(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            let type_name = node
                .tensor_type
                .unwrap_or_else(|| PRIMARY_TENSOR_TYPE.to_string());
            Ok(TensorSpec {
                name,
                extents,
                scalar_type: node
                    .scalar_type
                    .unwrap_or_else(|| DEFAULT_SCALAR_TYPE.to_string()),
                kind: TensorKind::from_type_name(&type_name),
            })
        })
        .collect()
}

fn check_unique_identifiers(specs: &[TestSpecification]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for spec in specs {
        if let Some(first) = seen.insert(&spec.identifier, &spec.name) {
            return Err(SpecError::DuplicateIdentifier {
                first: first.to_string(),
                second: spec.name.clone(),
                identifier: spec.identifier.clone(),
            });
        }
    }
    Ok(())
}
