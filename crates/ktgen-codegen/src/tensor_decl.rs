//! Storage, wrapper and initialisation lines for one tensor in one variant.

use ktgen_spec::{Extent, TensorKind, TensorSpec, DYNAMIC_EXTENT, PRIMARY_TENSOR_TYPE};

use crate::error::{GenerateError, Result};
use crate::variant::Variant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDeclaration {
    /// Buffer wrapped by a dense tensor; absent for opaque types.
    pub storage: Option<String>,
    pub declaration: String,
    /// Random fill; absent for opaque types.
    pub initialization: Option<String>,
}

pub fn declare_tensor(tensor: &TensorSpec, variant: &Variant) -> Result<TensorDeclaration> {
    let scalar = &tensor.scalar_type;
    let name = &tensor.name;

    let type_name = match &tensor.kind {
        TensorKind::Dense => PRIMARY_TENSOR_TYPE,
        TensorKind::Opaque(type_name) => {
            return Ok(TensorDeclaration {
                storage: None,
                declaration: format!("{type_name}<{scalar}> {name};"),
                initialization: None,
            });
        }
    };

    let mut template_params = Vec::with_capacity(tensor.extents.len());
    let mut runtime_args = Vec::new();
    let mut static_size = Some(1u64);
    let mut runtime_size = String::from("1");
    for &symbol in &tensor.extents {
        let extent = variant
            .extent(symbol)
            .ok_or_else(|| GenerateError::UnresolvedIndex {
                tensor: name.clone(),
                symbol,
                tag: variant.tag(),
            })?;
        match extent {
            Extent::Static(n) => {
                template_params.push(n.to_string());
                static_size = static_size.and_then(|size| size.checked_mul(u64::from(n)));
            }
            Extent::Dynamic => {
                template_params.push(DYNAMIC_EXTENT.to_string());
                runtime_args.push(format!("ext_{symbol}"));
            }
        }
        runtime_size.push_str(&format!("*ext_{symbol}"));
    }

    let storage = if runtime_args.is_empty() {
        let static_size = static_size.ok_or_else(|| GenerateError::StorageOverflow {
            tensor: name.clone(),
            tag: variant.tag(),
        })?;
        format!("std::array<{scalar}, {static_size}> {name}_array;")
    } else {
        format!("std::vector<{scalar}> {name}_array({runtime_size});")
    };

    let mut type_params = scalar.clone();
    if !template_params.is_empty() {
        type_params.push_str(", ");
        type_params.push_str(&template_params.join(","));
    }
    let mut constructor_args = format!("{name}_array.data()");
    for arg in &runtime_args {
        constructor_args.push(',');
        constructor_args.push_str(arg);
    }

    Ok(TensorDeclaration {
        storage: Some(storage),
        declaration: format!("{type_name}<{type_params}> {name}({constructor_args});"),
        initialization: Some(format!("{name}.initialize_to_random();")),
    })
}
