//! Static analysis of uploaded Python sources: structure scan, style lint,
//! and the 0-100 quality score the whole pipeline reports against.

pub mod lint;
pub mod scan;

pub use lint::{analyze_source, lint_source, quality_score, FileAnalysis, StyleIssue};
pub use scan::{scan_source, ClassInfo, FunctionInfo, SourceScan};
