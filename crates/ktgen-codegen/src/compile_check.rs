//! Compile-time-check programs: one source holding a buggy and a correct
//! region behind a preprocessor switch.

use ktgen_spec::{CompileTimeCheckCase, Fragment, IndexSpec};

use crate::error::Result;
use crate::program::{write_indices, write_prelude, write_tensors};
use crate::variant::Variant;
use crate::writer::SourceWriter;

/// Preprocessor symbol selecting the buggy region.
pub const FORCE_ERROR_DEFINE: &str = "FORCE_ERROR";

pub fn render_compile_check(
    indices: &[IndexSpec],
    case: &CompileTimeCheckCase,
    variant: &Variant,
) -> Result<String> {
    let mut w = SourceWriter::new();
    write_prelude(&mut w);
    w.open("int main(int argc, char* argv[]){");

    write_indices(&mut w, indices, variant);
    write_fragment(&mut w, &case.setup, variant)?;

    w.flush_left(&format!("#ifdef {FORCE_ERROR_DEFINE}"));
    write_fragment(&mut w, &case.with_bug, variant)?;
    w.flush_left("#else");
    write_fragment(&mut w, &case.correct, variant)?;
    w.flush_left("#endif");

    w.lines(&case.post);
    w.line(&format!("return *({}.data_handle());", case.anchor));
    w.close("}");
    Ok(w.finish())
}

fn write_fragment(w: &mut SourceWriter, fragment: &Fragment, variant: &Variant) -> Result<()> {
    write_tensors(w, &fragment.tensors, variant, false)?;
    w.lines(&fragment.lines);
    Ok(())
}
