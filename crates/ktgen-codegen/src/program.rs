//! Pieces shared by both generated program kinds.

use ktgen_spec::{IndexSpec, TensorSpec};

use crate::error::Result;
use crate::tensor_decl::declare_tensor;
use crate::variant::Variant;
use crate::writer::SourceWriter;

const INCLUDES: &[&str] = &[
    "#include <array>",
    "#include <vector>",
    "#include <cstdlib>",
    "#include \"KTensor/KTensor.hpp\"",
];

pub(crate) fn write_prelude(w: &mut SourceWriter) {
    for include in INCLUDES {
        w.flush_left(include);
    }
    w.blank();
    w.flush_left("using namespace KTensor;");
}

/// Index objects and `ext_<symbol>` variables, in declared order.
pub(crate) fn write_indices(w: &mut SourceWriter, indices: &[IndexSpec], variant: &Variant) {
    for (position, index) in indices.iter().enumerate() {
        w.line(&index.declaration());
        if let Some(extent) = variant.extent(index.symbol) {
            w.line(&index.extent_declaration(extent, position + 1));
        }
    }
}

pub(crate) fn write_tensors(
    w: &mut SourceWriter,
    tensors: &[TensorSpec],
    variant: &Variant,
    initialize: bool,
) -> Result<()> {
    for tensor in tensors {
        let decl = declare_tensor(tensor, variant)?;
        if let Some(storage) = &decl.storage {
            w.line(storage);
        }
        w.line(&decl.declaration);
        if initialize {
            if let Some(init) = &decl.initialization {
                w.line(init);
            }
        }
    }
    Ok(())
}
