//! Runtime correctness programs: evaluate the expression under test, then
//! recompute every element with scalar loops and compare.

use ktgen_spec::{CorrectnessCase, IndexSpec};

use crate::check::comparison;
use crate::error::Result;
use crate::program::{write_indices, write_prelude, write_tensors};
use crate::variant::Variant;
use crate::writer::SourceWriter;

/// Source of the correctness program for one variant. The program exits with
/// 0 when every loop iteration agrees and 1 otherwise.
pub fn render_correctness(
    indices: &[IndexSpec],
    case: &CorrectnessCase,
    variant: &Variant,
) -> Result<String> {
    let mut w = SourceWriter::new();
    write_prelude(&mut w);
    w.open("int main(int argc, char* argv[]){");
    w.line("bool check = true;");

    write_indices(&mut w, indices, variant);
    write_tensors(&mut w, &case.tensors, variant, true)?;
    w.lines(&case.setup);
    w.line(&case.expression);

    let loops: Vec<&IndexSpec> = indices.iter().filter(|i| i.forms_loop).collect();
    for index in &loops {
        w.open(&index.loop_open());
    }
    w.lines(&case.inside_loop);
    w.line(&format!("check = check && ({});", comparison(case, indices)));
    for _ in &loops {
        w.close("}");
    }

    w.open("if (check){");
    w.line("return 0;");
    w.reopen("}else{");
    w.line("return 1;");
    w.close("}");
    w.close("}");
    Ok(w.finish())
}
