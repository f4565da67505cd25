//! HTML quality reports.
//!
//! One page per processed file (before/after metrics, issue list) and one
//! global page per job. Pages are self-contained: inline CSS, no scripts,
//! suitable for writing straight into the job's output directory.

use chrono::Local;

use crate::analysis::FileAnalysis;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Everything the per-file page needs, computed once during processing.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub relative_path: String,
    pub filename: String,
    pub date: String,
    pub score_before: u8,
    pub score_after: u8,
    pub has_changes: bool,
    pub has_docstrings: bool,
    pub before: FileAnalysis,
    pub after: FileAnalysis,
}

impl FileReport {
    pub fn improvement(&self) -> i16 {
        i16::from(self.score_after) - i16::from(self.score_before)
    }
}

pub fn build_file_report(
    relative_path: &str,
    original: &str,
    corrected: &str,
    before: FileAnalysis,
    after: FileAnalysis,
    has_docstrings: bool,
) -> FileReport {
    let filename = relative_path
        .rsplit('/')
        .next()
        .unwrap_or(relative_path)
        .to_string();
    FileReport {
        relative_path: relative_path.to_string(),
        filename,
        date: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        score_before: before.score,
        score_after: after.score,
        has_changes: original != corrected,
        has_docstrings,
        before,
        after,
    }
}

fn score_color(score: u8) -> &'static str {
    if score >= 80 {
        "#22c55e"
    } else if score >= 50 {
        "#f59e0b"
    } else {
        "#ef4444"
    }
}

fn metric_row(label: &str, before: String, after: String) -> String {
    format!("<tr><td>{label}</td><td>{before}</td><td>{after}</td></tr>\n")
}

/// The per-file report page.
pub fn render_file_report(report: &FileReport) -> String {
    let mut metrics = String::new();
    metrics.push_str(&metric_row(
        "Style issues",
        report.before.issues.len().to_string(),
        report.after.issues.len().to_string(),
    ));
    metrics.push_str(&metric_row(
        "Average complexity",
        format!("{:.1}", report.before.avg_complexity),
        format!("{:.1}", report.after.avg_complexity),
    ));
    metrics.push_str(&metric_row(
        "Max complexity",
        report.before.max_complexity.to_string(),
        report.after.max_complexity.to_string(),
    ));
    metrics.push_str(&metric_row(
        "Docstring coverage",
        format!("{:.0}%", report.before.doc_coverage),
        format!("{:.0}%", report.after.doc_coverage),
    ));
    metrics.push_str(&metric_row(
        "Comment ratio",
        format!("{:.1}%", report.before.comment_ratio),
        format!("{:.1}%", report.after.comment_ratio),
    ));
    metrics.push_str(&metric_row(
        "Lines of code",
        report.before.scan.code_lines.to_string(),
        report.after.scan.code_lines.to_string(),
    ));

    let mut issues_html = String::new();
    if report.after.issues.is_empty() {
        issues_html.push_str("<p class=\"all-clear\">No remaining style issues.</p>");
    } else {
        issues_html.push_str("<ul class=\"issues\">\n");
        for issue in report.after.issues.iter().take(50) {
            issues_html.push_str(&format!(
                "<li><span class=\"code\">{}</span> line {}: {}</li>\n",
                issue.code,
                issue.line,
                escape_html(&issue.message)
            ));
        }
        if report.after.issues.len() > 50 {
            issues_html.push_str(&format!(
                "<li>... and {} more</li>\n",
                report.after.issues.len() - 50
            ));
        }
        issues_html.push_str("</ul>\n");
    }

    let badges = [
        (report.has_changes, "Formatting applied"),
        (report.has_docstrings, "Docstrings added"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, label)| format!("<span class=\"badge\">{label}</span>"))
    .collect::<Vec<_>>()
    .join(" ");

    let improvement = report.improvement();
    let improvement_html = if improvement > 0 {
        format!("<span class=\"delta up\">+{improvement}</span>")
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Report - {title}</title>
<style>
body {{ font-family: system-ui, sans-serif; background: #f8fafc; padding: 24px; color: #0f172a; }}
.container {{ max-width: 900px; margin: 0 auto; background: white; border-radius: 12px; overflow: hidden; }}
.header {{ background: linear-gradient(135deg, #2563eb 0%, #1e3a8a 100%); color: white; padding: 32px; }}
.header p {{ opacity: 0.8; margin-top: 4px; }}
.scores {{ display: flex; gap: 32px; padding: 24px 32px; align-items: center; }}
.score {{ font-size: 40px; font-weight: 700; }}
.score-label {{ font-size: 12px; color: #64748b; }}
.delta.up {{ color: #22c55e; font-size: 20px; font-weight: 600; }}
.badge {{ background: #dbeafe; color: #1d4ed8; border-radius: 12px; padding: 4px 12px; font-size: 12px; }}
table {{ width: 100%; border-collapse: collapse; margin: 0 0 16px; }}
th, td {{ text-align: left; padding: 8px 32px; border-bottom: 1px solid #f1f5f9; font-size: 14px; }}
.issues {{ padding: 0 32px 24px 48px; font-size: 13px; }}
.issues .code {{ font-family: monospace; color: #b91c1c; }}
.all-clear {{ padding: 0 32px 24px; color: #16a34a; }}
h2 {{ padding: 8px 32px; font-size: 16px; }}
</style>
</head>
<body>
<div class="container">
<div class="header"><h1>{title}</h1><p>{path} &middot; {date}</p></div>
<div class="scores">
<div><div class="score" style="color:{before_color}">{score_before}</div><div class="score-label">Before</div></div>
<div><div class="score" style="color:{after_color}">{score_after}</div><div class="score-label">After</div></div>
{improvement_html}
{badges}
</div>
<h2>Metrics</h2>
<table>
<tr><th>Metric</th><th>Before</th><th>After</th></tr>
{metrics}
</table>
<h2>Remaining issues</h2>
{issues_html}
</div>
</body>
</html>
"#,
        title = escape_html(&report.filename),
        path = escape_html(&report.relative_path),
        date = report.date,
        before_color = score_color(report.score_before),
        after_color = score_color(report.score_after),
        score_before = report.score_before,
        score_after = report.score_after,
    )
}

/// The job-wide summary page, one table row per file.
pub fn render_global_report(job_id: &str, reports: &[FileReport]) -> String {
    let file_count = reports.len();
    let avg_before = average(reports.iter().map(|r| r.score_before));
    let avg_after = average(reports.iter().map(|r| r.score_after));
    let improved = reports.iter().filter(|r| r.improvement() > 0).count();

    let mut rows = String::new();
    for report in reports {
        let improvement = report.improvement();
        let delta = if improvement > 0 {
            format!("<span class=\"up\">+{improvement}</span>")
        } else {
            "&ndash;".to_string()
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td style=\"color:{}\">{}</td><td style=\"color:{}\">{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&report.relative_path),
            score_color(report.score_before),
            report.score_before,
            score_color(report.score_after),
            report.score_after,
            delta,
            if report.has_docstrings { "yes" } else { "no" },
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Processing summary - {job_id}</title>
<style>
body {{ font-family: system-ui, sans-serif; background: #f8fafc; padding: 24px; color: #0f172a; }}
.container {{ max-width: 900px; margin: 0 auto; background: white; border-radius: 12px; overflow: hidden; }}
.header {{ background: linear-gradient(135deg, #2563eb 0%, #1e3a8a 100%); color: white; padding: 32px; }}
.summary {{ display: flex; gap: 32px; padding: 24px 32px; }}
.stat-value {{ font-size: 28px; font-weight: 700; color: #2563eb; }}
.stat-label {{ font-size: 12px; color: #64748b; }}
table {{ width: 100%; border-collapse: collapse; }}
th, td {{ text-align: left; padding: 8px 32px; border-bottom: 1px solid #f1f5f9; font-size: 14px; }}
.up {{ color: #22c55e; font-weight: 600; }}
</style>
</head>
<body>
<div class="container">
<div class="header"><h1>Processing summary</h1><p>Job {job_id}</p></div>
<div class="summary">
<div><div class="stat-value">{file_count}</div><div class="stat-label">Files</div></div>
<div><div class="stat-value">{avg_before}</div><div class="stat-label">Avg score before</div></div>
<div><div class="stat-value">{avg_after}</div><div class="stat-label">Avg score after</div></div>
<div><div class="stat-value">{improved}</div><div class="stat-label">Improved</div></div>
</div>
<table>
<tr><th>File</th><th>Before</th><th>After</th><th>Delta</th><th>Docstrings</th></tr>
{rows}
</table>
</div>
</body>
</html>
"#,
        job_id = escape_html(job_id),
    )
}

fn average(scores: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = scores.fold((0u32, 0u32), |(s, c), v| (s + u32::from(v), c + 1));
    if count == 0 {
        0
    } else {
        (sum / count) as u8
    }
}
