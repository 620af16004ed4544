/// Line-oriented text buffer with two-space indentation levels.
#[derive(Debug, Default)]
pub struct SourceWriter {
    buffer: String,
    depth: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `text` at the current depth.
    pub fn line(&mut self, text: &str) {
        self.line_at(self.depth, text);
    }

    /// Write `text` at column zero regardless of depth (preprocessor lines).
    pub fn flush_left(&mut self, text: &str) {
        self.line_at(0, text);
    }

    pub fn lines<S: AsRef<str>>(&mut self, lines: &[S]) {
        for line in lines {
            self.line(line.as_ref());
        }
    }

    pub fn blank(&mut self) {
        self.buffer.push('\n');
    }

    /// Write an opening line, then indent what follows.
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedent, then write a closing line.
    pub fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// Dedent for one line, e.g. `}else{`, then indent again.
    pub fn reopen(&mut self, text: &str) {
        self.close(text);
        self.depth += 1;
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    fn line_at(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_indent_by_two() {
        let mut w = SourceWriter::new();
        w.open("int main(){");
        w.open("for(;;){");
        w.line("x();");
        w.flush_left("#endif");
        w.close("}");
        w.close("}");
        assert_eq!(
            w.finish(),
            "int main(){\n  for(;;){\n    x();\n#endif\n  }\n}\n"
        );
    }
}
