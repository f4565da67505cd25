//! Execution profiling of uploaded scripts.
//!
//! Runs `python3 -m cProfile` on a file in a subprocess with a hard
//! timeout, parses the stats table, and renders an HTML artifact. The
//! interpreter is an external collaborator: a missing `python3`, a crash,
//! or a timeout surfaces as an error the pipeline records per file.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::report::escape_html;

/// Scripts get this long to run under the profiler.
const PROFILE_TIMEOUT_SECS: u64 = 30;
/// Rows kept in the rendered table.
const MAX_ROWS: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("python3 interpreter not available: {0}")]
    InterpreterMissing(String),
    #[error("profiling timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub ncalls: String,
    pub tottime: f64,
    pub cumtime: f64,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct ProfileStats {
    pub success: bool,
    pub error: Option<String>,
    pub total_calls: u64,
    pub total_time: f64,
    pub rows: Vec<ProfileRow>,
}

/// Profile one script. The working directory is the script's parent so
/// relative imports and data paths behave as they would for the user.
pub async fn profile_file(path: &Path) -> Result<ProfileStats, ProfileError> {
    let workdir = path.parent().unwrap_or(Path::new("."));

    let child = Command::new("python3")
        .arg("-m")
        .arg("cProfile")
        .arg("-s")
        .arg("cumulative")
        .arg(path)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ProfileError::InterpreterMissing(e.to_string()))?;

    let output = tokio::time::timeout(
        Duration::from_secs(PROFILE_TIMEOUT_SECS),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| ProfileError::Timeout(PROFILE_TIMEOUT_SECS))??;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut stats = parse_cprofile_output(&stdout);
    if !output.status.success() {
        stats.success = false;
        let excerpt: String = stderr.chars().take(500).collect();
        stats.error = Some(excerpt);
    }
    Ok(stats)
}

/// Parse cProfile's text output: the `N function calls in T seconds`
/// header plus the whitespace-aligned stats table.
pub fn parse_cprofile_output(stdout: &str) -> ProfileStats {
    let mut total_calls = 0u64;
    let mut total_time = 0.0f64;
    let mut rows = Vec::new();
    let mut in_table = false;

    for line in stdout.lines() {
        let trimmed = line.trim();

        if trimmed.contains("function calls") && trimmed.contains("in") {
            // e.g. "1234 function calls (1200 primitive calls) in 0.042 seconds"
            if let Some(first) = trimmed.split_whitespace().next() {
                total_calls = first.parse().unwrap_or(0);
            }
            if let Some(pos) = trimmed.rfind(" in ") {
                let tail = &trimmed[pos + 4..];
                if let Some(secs) = tail.split_whitespace().next() {
                    total_time = secs.parse().unwrap_or(0.0);
                }
            }
            continue;
        }

        if trimmed.starts_with("ncalls") {
            in_table = true;
            continue;
        }
        if !in_table || trimmed.is_empty() {
            continue;
        }

        // ncalls  tottime  percall  cumtime  percall  filename:lineno(function)
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }
        push_row(&mut rows, &parts);
    }

    rows.truncate(MAX_ROWS);
    ProfileStats {
        success: true,
        error: None,
        total_calls,
        total_time,
        rows,
    }
}

fn push_row(rows: &mut Vec<ProfileRow>, parts: &[&str]) {
    let (Ok(tottime), Ok(cumtime)) = (parts[1].parse::<f64>(), parts[3].parse::<f64>()) else {
        return;
    };
    // Hide interpreter internals, as the stats are about the user's code.
    let location = parts[5..].join(" ");
    if location.starts_with('<') || location.contains("importlib") {
        return;
    }
    rows.push(ProfileRow {
        ncalls: parts[0].to_string(),
        tottime,
        cumtime,
        location,
    });
}

/// Render the profiling artifact for one file.
pub fn render_profile_html(stats: &ProfileStats, filename: &str) -> String {
    let max_cum = stats
        .rows
        .iter()
        .map(|r| r.cumtime)
        .fold(0.0f64, f64::max)
        .max(f64::EPSILON);

    let mut rows_html = String::new();
    for row in &stats.rows {
        let pct = if stats.total_time > 0.0 {
            row.cumtime / stats.total_time * 100.0
        } else {
            0.0
        };
        let bar = row.cumtime / max_cum * 100.0;
        let color = if pct < 10.0 {
            "#22c55e"
        } else if pct < 30.0 {
            "#f59e0b"
        } else {
            "#ef4444"
        };
        rows_html.push_str(&format!(
            "<tr><td><code>{}</code></td><td>{}</td><td>{:.6}s</td><td>{:.6}s</td>\
             <td><div class=\"bar-container\"><div class=\"bar\" style=\"width:{:.1}%;background:{}\"></div>\
             <span>{:.1}%</span></div></td></tr>\n",
            escape_html(&row.location),
            escape_html(&row.ncalls),
            row.tottime,
            row.cumtime,
            bar,
            color,
            pct,
        ));
    }

    let error_html = stats
        .error
        .as_deref()
        .map(|e| format!("<div class=\"error-box\">Error: {}</div>", escape_html(e)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Profiling - {title}</title>
<style>
body {{ font-family: system-ui, sans-serif; background: #f8fafc; padding: 24px; }}
.container {{ max-width: 1000px; margin: 0 auto; background: white; border-radius: 12px; overflow: hidden; }}
.header {{ background: linear-gradient(135deg, #7c3aed 0%, #4c1d95 100%); color: white; padding: 32px; }}
.stats {{ display: flex; gap: 24px; padding: 24px; border-bottom: 1px solid #e2e8f0; }}
.stat-value {{ font-size: 28px; font-weight: 700; color: #7c3aed; }}
.stat-label {{ font-size: 12px; color: #64748b; }}
table {{ width: 100%; border-collapse: collapse; }}
th, td {{ text-align: left; padding: 8px 16px; border-bottom: 1px solid #f1f5f9; font-size: 13px; }}
.bar-container {{ display: flex; align-items: center; gap: 8px; }}
.bar {{ height: 10px; border-radius: 5px; min-width: 2px; }}
.error-box {{ background: #fef2f2; color: #b91c1c; padding: 16px; margin: 16px; border-radius: 8px; }}
</style>
</head>
<body>
<div class="container">
<div class="header"><h1>Profiling report</h1><p>{title}</p></div>
{error_html}
<div class="stats">
<div class="stat"><div class="stat-value">{total_time:.4}s</div><div class="stat-label">Total time</div></div>
<div class="stat"><div class="stat-value">{total_calls}</div><div class="stat-label">Function calls</div></div>
</div>
<table>
<tr><th>Function</th><th>Calls</th><th>Own time</th><th>Cumulative</th><th>Share</th></tr>
{rows_html}
</table>
</div>
</body>
</html>
"#,
        title = escape_html(filename),
        total_time = stats.total_time,
        total_calls = stats.total_calls,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_OUTPUT: &str = "\
         123 function calls in 0.042 seconds

   Ordered by: cumulative time

   ncalls  tottime  percall  cumtime  percall filename:lineno(function)
        1    0.001    0.001    0.040    0.040 script.py:1(<module>)
       10    0.030    0.003    0.030    0.003 script.py:4(work)
        5    0.002    0.000    0.005    0.001 <built-in method print>
        2    0.000    0.000    0.001    0.000 importlib/_bootstrap.py:100(x)
";

    #[test]
    fn parses_header_totals() {
        let stats = parse_cprofile_output(SAMPLE_OUTPUT);
        assert_eq!(stats.total_calls, 123);
        assert!((stats.total_time - 0.042).abs() < 1e-9);
    }

    #[test]
    fn parses_rows_and_filters_internals() {
        let stats = parse_cprofile_output(SAMPLE_OUTPUT);
        let locations: Vec<_> = stats.rows.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(
            locations,
            vec!["script.py:1(<module>)", "script.py:4(work)"]
        );
        assert_eq!(stats.rows[1].ncalls, "10");
        assert!((stats.rows[1].tottime - 0.030).abs() < 1e-9);
    }

    #[test]
    fn empty_output_parses_to_empty_stats() {
        let stats = parse_cprofile_output("");
        assert!(stats.rows.is_empty());
        assert_eq!(stats.total_calls, 0);
    }

    #[test]
    fn renders_rows_and_totals() {
        let stats = parse_cprofile_output(SAMPLE_OUTPUT);
        let html = render_profile_html(&stats, "script.py");
        assert!(html.contains("script.py:4(work)"));
        assert!(html.contains("0.0420s"));
        assert!(html.contains("123"));
        assert!(!html.contains("error-box"));
    }

    #[test]
    fn renders_error_box_on_failure() {
        let stats = ProfileStats {
            success: false,
            error: Some("Traceback <script>".into()),
            total_calls: 0,
            total_time: 0.0,
            rows: vec![],
        };
        let html = render_profile_html(&stats, "bad.py");
        assert!(html.contains("error-box"));
        assert!(html.contains("&lt;script&gt;"));
    }

}
