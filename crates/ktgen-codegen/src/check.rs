//! Derivation of the scalar reference comparison from a tensor expression.
//!
//! The expression under test is written in index notation, e.g.
//! `C(i,j) = A(i,k)*B(k,j);`. The reference check evaluates the same formula
//! element by element inside explicit loops, so it is rewritten by an ordered
//! list of textual passes into `C(ii,jj) == A(ii,kk)*B(kk,jj)`.

use ktgen_spec::{CorrectnessCase, IndexSpec};

#[derive(Copy, Clone)]
pub struct RewritePass {
    pub name: &'static str,
    pub apply: fn(&str, &[IndexSpec]) -> String,
}

// 1) Top-level assignment becomes a comparison
pub const ASSIGNMENT_TO_EQUALITY: RewritePass = RewritePass {
    name: "assignment-to-equality",
    apply: |text: &str, _: &[IndexSpec]| assignment_to_equality(text),
};

// 2) Integer division would make the reference disagree with the tensor result
pub const FLOATING_DIVISION: RewritePass = RewritePass {
    name: "floating-division",
    apply: |text: &str, _: &[IndexSpec]| floating_division(text),
};

// 3) Index objects become loop variables
pub const INDICES_TO_LOOP_VARS: RewritePass = RewritePass {
    name: "indices-to-loop-vars",
    apply: indices_to_loop_vars,
};

/// Passes applied by [`derive_check`], in order.
pub static CHECK_PASSES: &[RewritePass] =
    &[ASSIGNMENT_TO_EQUALITY, FLOATING_DIVISION, INDICES_TO_LOOP_VARS];

/// Comparison placed in `check = check && (...)` for a correctness case.
pub fn comparison(case: &CorrectnessCase, indices: &[IndexSpec]) -> String {
    match &case.check {
        Some(check) => strip_statement(check).to_string(),
        None => derive_check(&case.expression, indices),
    }
}

pub fn derive_check(expression: &str, indices: &[IndexSpec]) -> String {
    CHECK_PASSES
        .iter()
        .fold(strip_statement(expression).to_string(), |text, pass| {
            (pass.apply)(&text, indices)
        })
}

fn strip_statement(text: &str) -> &str {
    text.trim().trim_matches(';').trim()
}

fn is_operator_prefix(c: char) -> bool {
    matches!(
        c,
        '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^'
    )
}

/// Replace the first lone `=` with `==`. Compound and relational operators
/// are left alone.
pub fn assignment_to_equality(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    for (at, &c) in chars.iter().enumerate() {
        if c != '=' {
            continue;
        }
        let prev = at.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(at + 1).copied();
        if prev.is_some_and(is_operator_prefix) || next == Some('=') {
            continue;
        }
        let mut out: String = chars[..at].iter().collect();
        out.push_str("==");
        out.extend(&chars[at + 1..]);
        return out;
    }
    text.to_string()
}

/// Cast the right operand of every `/` to `double`.
pub fn floating_division(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (at, &c) in chars.iter().enumerate() {
        out.push(c);
        if c == '/' && chars.get(at + 1) != Some(&'=') {
            out.push_str("(double)");
        }
    }
    out
}

/// Replace each identifier that is exactly an index symbol with that index's
/// loop variable. Longer identifiers, numeric literals and quoted literals
/// are copied unchanged.
pub fn indices_to_loop_vars(text: &str, indices: &[IndexSpec]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);
    let mut at = 0;
    while at < chars.len() {
        let c = chars[at];
        if c == '\'' || c == '"' {
            let end = quoted_end(&chars, at);
            out.extend(&chars[at..end]);
            at = end;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            let end = word_end(&chars, at);
            let word = &chars[at..end];
            let replacement = match word {
                [symbol] => indices.iter().find(|i| i.symbol == *symbol),
                _ => None,
            };
            match replacement {
                Some(index) => out.push_str(&index.loop_var()),
                None => out.extend(word),
            }
            at = end;
        } else {
            out.push(c);
            at += 1;
        }
    }
    out
}

fn word_end(chars: &[char], start: usize) -> usize {
    let numeric = chars[start].is_ascii_digit();
    let mut end = start + 1;
    while end < chars.len() {
        let c = chars[end];
        if c.is_ascii_alphanumeric() || c == '_' || (numeric && c == '.') {
            end += 1;
        } else {
            break;
        }
    }
    end
}

fn quoted_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut end = start + 1;
    while end < chars.len() {
        match chars[end] {
            '\\' => end += 2,
            c if c == quote => return end + 1,
            _ => end += 1,
        }
    }
    chars.len()
}
