//! Conservative PEP8-style correction.
//!
//! A pure text transform that fixes exactly the defects the lint penalizes
//! (minus E501, which is reported but never rewritten): tab indentation,
//! trailing whitespace, blank-line normalization, literal comparisons to
//! None/True/False, and the final newline. Fixing only lint-penalized
//! defects keeps the corrected score at or above the original's.

use std::sync::OnceLock;

use regex::Regex;

fn toplevel_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:async\s+)?(?:def|class)\s").unwrap())
}

fn eq_none_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"==\s*None\b").unwrap())
}

fn ne_none_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!=\s*None\b").unwrap())
}

fn eq_bool_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"==\s*(True|False)\b").unwrap())
}

fn ne_bool_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!=\s*(True|False)\b").unwrap())
}

/// Correct a Python source text. Idempotent.
pub fn correct_source(code: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut blank_run = 0usize;

    for line in code.lines() {
        let mut line = fix_line(line);

        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue; // E303: collapse to two blank lines
            }
            out.push(String::new()); // W293: blank lines carry no whitespace
            continue;
        }

        // E302: two blank lines before a top-level def/class (unless the
        // previous statement is a decorator or comment, or file start).
        if toplevel_def_re().is_match(&line) {
            let prev = out
                .iter()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_default();
            if !prev.is_empty() && !prev.starts_with('@') && !prev.starts_with('#') {
                while blank_run < 2 {
                    out.push(String::new());
                    blank_run += 1;
                }
            }
        }

        blank_run = 0;

        // E711/E712: only on lines without string literals, mirroring lint.
        if !line.contains('"') && !line.contains('\'') {
            line = eq_none_re().replace_all(&line, "is None").into_owned();
            line = ne_none_re().replace_all(&line, "is not None").into_owned();
            line = eq_bool_re().replace_all(&line, "is $1").into_owned();
            line = ne_bool_re().replace_all(&line, "is not $1").into_owned();
        }

        out.push(line);
    }

    // Drop trailing blank lines, keep exactly one final newline (W292).
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    if out.is_empty() {
        return String::new();
    }
    let mut result = out.join("\n");
    result.push('\n');
    result
}

/// Per-line fixes: leading tabs to 4 spaces (W191), trailing whitespace
/// stripped (W291).
fn fix_line(line: &str) -> String {
    let trimmed_start = line.trim_start();
    let indent_len = line.len() - trimmed_start.len();
    let indent: String = line[..indent_len]
        .chars()
        .map(|c| if c == '\t' { "    " } else { " " })
        .collect::<Vec<&str>>()
        .join("");
    format!("{}{}", indent, trimmed_start.trim_end())
}
