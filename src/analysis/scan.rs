//! Structure scan for Python sources.
//!
//! A line-oriented scanner (no full parse) that extracts what the metrics
//! and reports need: functions, classes and their methods, docstring
//! presence, a cyclomatic-style complexity estimate, and imports.
//! Indentation tracking attaches `def`s to the enclosing `class`; defs
//! nested inside other defs are folded into the parent's complexity.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub line: usize,
    pub has_docstring: bool,
    pub complexity: u32,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub line: usize,
    pub has_docstring: bool,
    pub bases: Vec<String>,
    pub methods: Vec<FunctionInfo>,
}

#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub module: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SourceScan {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    pub code_lines: usize,
    /// Module-level functions (methods live under their class).
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<ImportInfo>,
}

impl SourceScan {
    pub fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.name.clone()).collect()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.name.clone()).collect()
    }

    /// All functions and methods, for complexity aggregation.
    pub fn all_functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
    }
}

fn def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").unwrap())
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)class\s+([A-Za-z_]\w*)\s*(?:\(([^)]*)\))?\s*:").unwrap())
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:import\s+([A-Za-z_][\w.]*)|from\s+([A-Za-z_][\w.]*)\s+import\b)")
            .unwrap()
    })
}

fn branch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:if|elif|for|while|except|and|or|assert|with)\b").unwrap()
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    Class,
    Def,
}

pub fn scan_source(code: &str) -> SourceScan {
    let lines: Vec<&str> = code.lines().collect();
    let mut scan = SourceScan {
        total_lines: lines.len(),
        ..Default::default()
    };

    // (indent, kind, index into scan.classes when kind == Class)
    let mut stack: Vec<(usize, BlockKind, usize)> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            scan.blank_lines += 1;
            continue;
        }
        if trimmed.starts_with('#') {
            scan.comment_lines += 1;
            continue;
        }

        if let Some(caps) = import_re().captures(line) {
            let module = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            scan.imports.push(ImportInfo {
                module,
                line: i + 1,
            });
        }

        if let Some(caps) = class_re().captures(line) {
            let indent = indent_width(caps.get(1).map_or("", |m| m.as_str()));
            while stack.last().is_some_and(|(d, _, _)| *d >= indent) {
                stack.pop();
            }
            let bases = caps
                .get(3)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(|b| b.trim().to_string())
                        .filter(|b| !b.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            scan.classes.push(ClassInfo {
                name: caps[2].to_string(),
                line: i + 1,
                has_docstring: has_docstring(&lines, i, indent),
                bases,
                methods: Vec::new(),
            });
            stack.push((indent, BlockKind::Class, scan.classes.len() - 1));
            continue;
        }

        if let Some(caps) = def_re().captures(line) {
            let indent = indent_width(caps.get(1).map_or("", |m| m.as_str()));
            while stack.last().is_some_and(|(d, _, _)| *d >= indent) {
                stack.pop();
            }
            let info = FunctionInfo {
                name: caps[2].to_string(),
                line: i + 1,
                has_docstring: has_docstring(&lines, i, indent),
                complexity: complexity(&lines, i, indent),
            };
            match stack.last() {
                Some((_, BlockKind::Class, class_idx)) => {
                    scan.classes[*class_idx].methods.push(info);
                }
                Some((_, BlockKind::Def, _)) => {
                    // Nested function: counted in the parent's complexity.
                }
                None => scan.functions.push(info),
            }
            stack.push((indent, BlockKind::Def, 0));
        }
    }

    scan.code_lines = scan.total_lines - scan.blank_lines - scan.comment_lines;
    scan
}

/// Leading-whitespace width, tabs counted as 4.
fn indent_width(ws: &str) -> usize {
    ws.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

/// Index of the line that closes a def/class signature (ends with `:`).
/// Signatures can span lines; give up after a short window.
fn signature_end(lines: &[&str], start: usize) -> usize {
    for (offset, line) in lines.iter().enumerate().skip(start).take(20) {
        let code = line.split('#').next().unwrap_or("").trim_end();
        if code.ends_with(':') {
            return offset;
        }
    }
    start
}

/// Does the block starting at `start` open with a string literal?
fn has_docstring(lines: &[&str], start: usize, indent: usize) -> bool {
    let sig_end = signature_end(lines, start);
    for line in lines.iter().skip(sig_end + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if indent_width(leading_ws(line)) <= indent {
            return false;
        }
        return trimmed.starts_with("\"\"\"")
            || trimmed.starts_with("'''")
            || trimmed.starts_with("r\"\"\"")
            || trimmed.starts_with("r'''");
    }
    false
}

/// 1 + branch-keyword occurrences in the block body.
fn complexity(lines: &[&str], start: usize, indent: usize) -> u32 {
    let sig_end = signature_end(lines, start);
    let mut count = 1u32;
    for line in lines.iter().skip(sig_end + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if indent_width(leading_ws(line)) <= indent {
            break;
        }
        count += branch_re().find_iter(trimmed).count() as u32;
    }
    count
}

fn leading_ws(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"import os
from pathlib import Path

CONSTANT = 42


def helper(x):
    """Docstring."""
    if x and x > 0:
        return x
    return 0


class Greeter(Base):
    """Greets."""

    def __init__(self, name):
        self.name = name

    def greet(self):
        for _ in range(3):
            print(self.name)


def undocumented():
    pass
"#;

    #[test]
    fn finds_functions_and_classes() {
        let scan = scan_source(SAMPLE);
        assert_eq!(scan.function_names(), vec!["helper", "undocumented"]);
        assert_eq!(scan.class_names(), vec!["Greeter"]);
        assert_eq!(scan.classes[0].bases, vec!["Base"]);
        let methods: Vec<_> = scan.classes[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(methods, vec!["__init__", "greet"]);
    }

    #[test]
    fn detects_docstrings() {
        let scan = scan_source(SAMPLE);
        assert!(scan.functions[0].has_docstring);
        assert!(!scan.functions[1].has_docstring);
        assert!(scan.classes[0].has_docstring);
        assert!(!scan.classes[0].methods[0].has_docstring);
    }

    #[test]
    fn complexity_counts_branches() {
        let scan = scan_source(SAMPLE);
        // helper: 1 + if + and = 3
        assert_eq!(scan.functions[0].complexity, 3);
        // greet: 1 + for = 2
        assert_eq!(scan.classes[0].methods[1].complexity, 2);
        assert_eq!(scan.functions[1].complexity, 1);
    }

    #[test]
    fn counts_line_kinds() {
        let scan = scan_source("x = 1\n\n# comment\ny = 2\n");
        assert_eq!(scan.total_lines, 4);
        assert_eq!(scan.blank_lines, 1);
        assert_eq!(scan.comment_lines, 1);
        assert_eq!(scan.code_lines, 2);
    }

    #[test]
    fn collects_imports() {
        let scan = scan_source(SAMPLE);
        let modules: Vec<_> = scan.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["os", "pathlib"]);
    }

    #[test]
    fn nested_defs_are_not_module_functions() {
        let code = "def outer():\n    def inner():\n        pass\n    return inner\n";
        let scan = scan_source(code);
        assert_eq!(scan.function_names(), vec!["outer"]);
    }

    #[test]
    fn multiline_signature_docstring() {
        let code = "def f(\n    a,\n    b,\n):\n    \"\"\"Doc.\"\"\"\n    return a\n";
        let scan = scan_source(code);
        assert!(scan.functions[0].has_docstring);
    }

    #[test]
    fn empty_source() {
        let scan = scan_source("");
        assert_eq!(scan.total_lines, 0);
        assert!(scan.functions.is_empty());
        assert!(scan.classes.is_empty());
    }
}
