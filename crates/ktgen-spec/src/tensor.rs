use serde::Deserialize;

/// Wrapper type name that gets generated storage and random initialisation.
pub const PRIMARY_TENSOR_TYPE: &str = "Tensor";

/// Scalar type used when a tensor does not name one.
pub const DEFAULT_SCALAR_TYPE: &str = "int";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorKind {
    /// The library's dense tensor, backed by generated storage.
    Dense,
    /// Any other library type; it manages its own storage.
    Opaque(String),
}

impl TensorKind {
    pub fn from_type_name(name: &str) -> Self {
        if name == PRIMARY_TENSOR_TYPE {
            TensorKind::Dense
        } else {
            TensorKind::Opaque(name.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    pub name: String,
    /// Index symbols naming each extent, outermost first.
    pub extents: Vec<char>,
    pub scalar_type: String,
    pub kind: TensorKind,
}

impl TensorSpec {
    pub fn dense(name: &str, extents: &[char]) -> Self {
        Self {
            name: name.to_string(),
            extents: extents.to_vec(),
            scalar_type: DEFAULT_SCALAR_TYPE.to_string(),
            kind: TensorKind::Dense,
        }
    }

    pub fn is_dense(&self) -> bool {
        self.kind == TensorKind::Dense
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawTensor {
    pub name: Option<String>,
    #[serde(default)]
    pub extents: Vec<String>,
    #[serde(rename = "scalar type")]
    pub scalar_type: Option<String>,
    #[serde(rename = "tensor type")]
    pub tensor_type: Option<String>,
}
