//! Style lint and quality scoring.
//!
//! A flake8-inspired rule set restricted to defects the corrector knows how
//! to fix (plus E501, which is only reported). Each issue carries a code and
//! renders in `file:line: CODE message` style.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::scan::scan_source;

/// Maximum accepted line length (matches the corrector's config).
pub const MAX_LINE_LENGTH: usize = 120;

#[derive(Debug, Clone, serde::Serialize)]
pub struct StyleIssue {
    pub line: usize,
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for StyleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.line, self.code, self.message)
    }
}

fn none_cmp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[=!]=\s*None\b").unwrap())
}

fn bool_cmp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[=!]=\s*(?:True|False)\b").unwrap())
}

fn toplevel_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:async\s+)?(?:def|class)\s").unwrap())
}

/// Run every style rule over a source text.
pub fn lint_source(code: &str) -> Vec<StyleIssue> {
    let lines: Vec<&str> = code.lines().collect();
    let mut issues = Vec::new();
    let mut blank_run = 0usize;

    for (i, line) in lines.iter().enumerate() {
        let n = i + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run == 3 {
                issues.push(StyleIssue {
                    line: n,
                    code: "E303",
                    message: "too many blank lines".into(),
                });
            }
            if !line.is_empty() {
                issues.push(StyleIssue {
                    line: n,
                    code: "W293",
                    message: "whitespace on blank line".into(),
                });
            }
            continue;
        }

        let width = line.chars().count();
        if width > MAX_LINE_LENGTH {
            issues.push(StyleIssue {
                line: n,
                code: "E501",
                message: format!("line too long ({width} > {MAX_LINE_LENGTH})"),
            });
        }
        if line.ends_with(' ') || line.ends_with('\t') {
            issues.push(StyleIssue {
                line: n,
                code: "W291",
                message: "trailing whitespace".into(),
            });
        }
        if leading_indent(line).contains('\t') {
            issues.push(StyleIssue {
                line: n,
                code: "W191",
                message: "indentation contains tabs".into(),
            });
        }
        if toplevel_def_re().is_match(line) && i > 0 && blank_run < 2 {
            // Decorated or commented-preceded defs are exempt.
            let prev = lines[..i]
                .iter()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim())
                .unwrap_or("");
            if !prev.starts_with('@') && !prev.starts_with('#') {
                issues.push(StyleIssue {
                    line: n,
                    code: "E302",
                    message: "expected 2 blank lines before top-level definition".into(),
                });
            }
        }
        // Comparison rules skip lines with string literals: a text match
        // inside a string is not a comparison.
        if !line.contains('"') && !line.contains('\'') {
            if none_cmp_re().is_match(line) {
                issues.push(StyleIssue {
                    line: n,
                    code: "E711",
                    message: "comparison to None should use 'is' / 'is not'".into(),
                });
            }
            if bool_cmp_re().is_match(line) {
                issues.push(StyleIssue {
                    line: n,
                    code: "E712",
                    message: "comparison to True/False should use 'is' / 'is not'".into(),
                });
            }
        }
        blank_run = 0;
    }

    if !code.is_empty() && !code.ends_with('\n') {
        issues.push(StyleIssue {
            line: lines.len(),
            code: "W292",
            message: "no newline at end of file".into(),
        });
    }

    issues
}

fn leading_indent(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Everything the score formula needs, derived fresh from source text.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub scan: super::scan::SourceScan,
    pub issues: Vec<StyleIssue>,
    pub avg_complexity: f64,
    pub max_complexity: u32,
    pub doc_coverage: f64,
    pub comment_ratio: f64,
    pub score: u8,
}

/// Full analysis of one source text: structure scan, lint, derived
/// metrics, quality score.
pub fn analyze_source(code: &str) -> FileAnalysis {
    let scan = scan_source(code);
    let issues = lint_source(code);

    let all: Vec<u32> = scan.all_functions().map(|f| f.complexity).collect();
    let avg_complexity = if all.is_empty() {
        0.0
    } else {
        all.iter().sum::<u32>() as f64 / all.len() as f64
    };
    let max_complexity = all.iter().copied().max().unwrap_or(0);

    let documented = scan.functions.iter().filter(|f| f.has_docstring).count()
        + scan.classes.iter().filter(|c| c.has_docstring).count();
    let documentable = scan.functions.len() + scan.classes.len();
    let doc_coverage = if documentable == 0 {
        100.0
    } else {
        documented as f64 / documentable as f64 * 100.0
    };

    let comment_ratio = if scan.code_lines == 0 {
        0.0
    } else {
        scan.comment_lines as f64 / scan.code_lines as f64 * 100.0
    };

    let score = quality_score(issues.len(), avg_complexity, doc_coverage, comment_ratio);

    FileAnalysis {
        scan,
        issues,
        avg_complexity,
        max_complexity,
        doc_coverage,
        comment_ratio,
        score,
    }
}

/// 0-100 quality score.
///
/// Start from 100: up to -30 for style issues (2 per issue), complexity
/// penalties above an average of 5, a documentation bonus/penalty, and a
/// small penalty for uncommented code.
pub fn quality_score(
    issue_count: usize,
    avg_complexity: f64,
    doc_coverage: f64,
    comment_ratio: f64,
) -> u8 {
    let mut score: i64 = 100;

    score -= (issue_count as i64 * 2).min(30);

    if avg_complexity > 10.0 {
        score -= (((avg_complexity - 10.0) * 2.0) as i64).min(20);
    } else if avg_complexity > 5.0 {
        score -= ((avg_complexity - 5.0) as i64).min(10);
    }

    if doc_coverage >= 80.0 {
        score += 5;
    } else if doc_coverage < 30.0 {
        score -= 10;
    }

    if comment_ratio < 5.0 {
        score -= 5;
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(issues: &[StyleIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn long_line_is_e501() {
        let code = format!("x = \"{}\"\n", "a".repeat(130));
        assert!(codes(&lint_source(&code)).contains(&"E501"));
    }

    #[test]
    fn trailing_whitespace_is_w291() {
        assert!(codes(&lint_source("x = 1  \n")).contains(&"W291"));
    }

    #[test]
    fn tab_indent_is_w191() {
        assert!(codes(&lint_source("if x:\n\ty = 1\n")).contains(&"W191"));
    }

    #[test]
    fn missing_blank_lines_is_e302() {
        let issues = lint_source("x = 1\ndef f():\n    pass\n");
        assert!(codes(&issues).contains(&"E302"));
    }

    #[test]
    fn decorated_def_is_not_e302() {
        let issues = lint_source("x = 1\n@decorator\ndef f():\n    pass\n");
        // The decorator line itself triggers nothing; the def after it
        // is exempt.
        assert!(!codes(&issues).contains(&"E302"));
    }

    #[test]
    fn two_blank_lines_before_def_is_clean() {
        let issues = lint_source("x = 1\n\n\ndef f():\n    pass\n");
        assert!(!codes(&issues).contains(&"E302"));
    }

    #[test]
    fn too_many_blank_lines_is_e303() {
        let issues = lint_source("x = 1\n\n\n\ny = 2\n");
        assert!(codes(&issues).contains(&"E303"));
    }

    #[test]
    fn none_comparison_is_e711() {
        assert!(codes(&lint_source("if x == None:\n    pass\n")).contains(&"E711"));
        assert!(codes(&lint_source("if x != None:\n    pass\n")).contains(&"E711"));
    }

    #[test]
    fn bool_comparison_is_e712() {
        assert!(codes(&lint_source("if done == True:\n    pass\n")).contains(&"E712"));
    }

    #[test]
    fn none_inside_string_is_ignored() {
        assert!(codes(&lint_source("msg = \"x == None\"\n")).is_empty());
    }

    #[test]
    fn missing_final_newline_is_w292() {
        assert!(codes(&lint_source("x = 1")).contains(&"W292"));
        assert!(!codes(&lint_source("x = 1\n")).contains(&"W292"));
    }

    #[test]
    fn clean_code_has_no_issues() {
        let code = "import os\n\n\ndef f():\n    \"\"\"Doc.\"\"\"\n    return os.name\n";
        assert!(lint_source(code).is_empty());
    }

    #[test]
    fn score_is_bounded() {
        // 100 - 30 (issues cap) - 20 (complexity cap) - 10 (docs) - 5 (comments)
        assert_eq!(quality_score(1000, 50.0, 0.0, 0.0), 35);
        assert!(quality_score(0, 0.0, 100.0, 10.0) <= 100);
        for issues in [0, 5, 20, 100] {
            let s = quality_score(issues, 3.0, 50.0, 10.0);
            assert!(s <= 100);
        }
    }

    #[test]
    fn documented_simple_code_scores_high() {
        let code = "def f():\n    \"\"\"Doc.\"\"\"\n    # explain\n    return 1\n";
        let analysis = analyze_source(code);
        assert!(analysis.score >= 90, "score was {}", analysis.score);
    }

    #[test]
    fn messy_code_scores_lower_than_clean() {
        let messy = "def f():  \n\tx= 1\n\treturn x\ndef g():\n\tpass";
        let clean = "def f():\n    \"\"\"Doc.\"\"\"\n    # note\n    return 1\n";
        assert!(analyze_source(messy).score < analyze_source(clean).score);
    }

    #[test]
    fn empty_source_analysis() {
        let analysis = analyze_source("");
        assert_eq!(analysis.doc_coverage, 100.0);
        assert_eq!(analysis.avg_complexity, 0.0);
        assert!(analysis.score <= 100);
    }
}
