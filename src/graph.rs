//! Dependency graphs.
//!
//! Two levels: a per-file graph (imports, classes with inheritance edges,
//! functions) and a job-level graph (one node per module, edges for local
//! imports). Both render to a standalone HTML page with a simple
//! column-layout SVG.

use std::collections::BTreeSet;
use std::path::Path;

use crate::analysis::scan_source;
use crate::report::escape_html;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Import,
    Class,
    Function,
    Module,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Graph of one file: external imports, classes (with inheritance edges
/// into other classes of the same file), module functions.
pub fn file_graph(code: &str) -> DependencyGraph {
    let scan = scan_source(code);
    let mut graph = DependencyGraph::default();

    let mut seen_imports = BTreeSet::new();
    for import in &scan.imports {
        let root = import.module.split('.').next().unwrap_or("").to_string();
        if !root.is_empty() && seen_imports.insert(root.clone()) {
            graph.nodes.push(GraphNode {
                id: format!("import_{root}"),
                label: root,
                kind: NodeKind::Import,
            });
        }
    }

    for class in &scan.classes {
        graph.nodes.push(GraphNode {
            id: format!("class_{}", class.name),
            label: class.name.clone(),
            kind: NodeKind::Class,
        });
        for base in &class.bases {
            graph.edges.push(GraphEdge {
                from: format!("class_{}", class.name),
                to: format!("class_{base}"),
                kind: "inherits",
            });
        }
    }

    for function in &scan.functions {
        graph.nodes.push(GraphNode {
            id: format!("func_{}", function.name),
            label: function.name.clone(),
            kind: NodeKind::Function,
        });
    }

    graph
}

/// Graph of a whole job: one node per Python module, edges where a module
/// imports another module of the same job.
pub fn project_graph(files: &[(String, String)]) -> DependencyGraph {
    let mut graph = DependencyGraph::default();

    // Module name = relative path with `/` as `.` and no extension.
    let module_names: Vec<String> = files
        .iter()
        .map(|(rel, _)| module_name(rel))
        .collect();
    let known: BTreeSet<&str> = module_names.iter().map(String::as_str).collect();

    for ((_, code), name) in files.iter().zip(&module_names) {
        graph.nodes.push(GraphNode {
            id: name.clone(),
            label: name.rsplit('.').next().unwrap_or(name).to_string(),
            kind: NodeKind::Module,
        });

        let scan = scan_source(code);
        let mut targets = BTreeSet::new();
        for import in &scan.imports {
            let root = import.module.split('.').next().unwrap_or("");
            let target = if known.contains(import.module.as_str()) {
                Some(import.module.clone())
            } else if known.contains(root) {
                Some(root.to_string())
            } else {
                None
            };
            if let Some(target) = target {
                if target != *name && targets.insert(target.clone()) {
                    graph.edges.push(GraphEdge {
                        from: name.clone(),
                        to: target,
                        kind: "imports",
                    });
                }
            }
        }
    }

    graph
}

fn module_name(relative: &str) -> String {
    let path = Path::new(relative);
    let no_ext = path.with_extension("");
    no_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

/// Render a graph as a standalone HTML page with an inline SVG.
pub fn render_graph_html(graph: &DependencyGraph, title: &str) -> String {
    let columns = [
        (NodeKind::Import, "node-import"),
        (NodeKind::Module, "node-module"),
        (NodeKind::Class, "node-class"),
        (NodeKind::Function, "node-function"),
    ];

    let mut positions: Vec<(String, i32, i32)> = Vec::new();
    let mut svg_nodes = String::new();
    let mut used_columns = 0;

    for (kind, css) in columns {
        let nodes: Vec<&GraphNode> = graph.nodes.iter().filter(|n| n.kind == kind).collect();
        if nodes.is_empty() {
            continue;
        }
        let x = 110 + used_columns * 260;
        used_columns += 1;
        for (i, node) in nodes.iter().enumerate() {
            let y = 40 + i as i32 * 50;
            positions.push((node.id.clone(), x, y));
            svg_nodes.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"180\" height=\"30\" rx=\"4\" class=\"{}\"/>\n\
                 <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" class=\"node-text\">{}</text>\n",
                x - 90,
                y - 15,
                css,
                x,
                y + 4,
                escape_html(truncate(&node.label, 22)),
            ));
        }
    }

    let mut svg_edges = String::new();
    for edge in &graph.edges {
        let from = positions.iter().find(|(id, _, _)| *id == edge.from);
        let to = positions.iter().find(|(id, _, _)| *id == edge.to);
        if let (Some((_, x1, y1)), Some((_, x2, y2))) = (from, to) {
            svg_edges.push_str(&format!(
                "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" class=\"edge edge-{}\"/>\n",
                edge.kind
            ));
        }
    }

    let max_rows = columns
        .iter()
        .map(|(kind, _)| graph.nodes.iter().filter(|n| n.kind == *kind).count())
        .max()
        .unwrap_or(0);
    let height = (80 + max_rows * 50).max(200);
    let width = (220 + used_columns.max(1) as i32 * 260).max(400);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Dependencies - {title}</title>
<style>
body {{ font-family: system-ui, sans-serif; background: #f8fafc; padding: 24px; }}
.container {{ max-width: 1100px; margin: 0 auto; background: white; border-radius: 12px; padding: 24px; }}
h1 {{ font-size: 20px; margin-bottom: 16px; }}
.node-import {{ fill: #dbeafe; stroke: #3b82f6; }}
.node-module {{ fill: #ede9fe; stroke: #7c3aed; }}
.node-class {{ fill: #dcfce7; stroke: #22c55e; }}
.node-function {{ fill: #fef3c7; stroke: #f59e0b; }}
.node-text {{ font-family: system-ui; font-size: 12px; }}
.edge {{ stroke: #94a3b8; stroke-width: 1; fill: none; }}
.edge-inherits {{ stroke: #22c55e; stroke-width: 2; }}
.edge-imports {{ stroke: #3b82f6; stroke-dasharray: 4; }}
</style>
</head>
<body>
<div class="container">
<h1>Dependency graph: {title}</h1>
<svg viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">
{svg_edges}{svg_nodes}</svg>
</div>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_graph_collects_imports_classes_functions() {
        let code = "import os\nimport os.path\nfrom json import loads\n\n\nclass A(Base):\n    pass\n\n\ndef work():\n    pass\n";
        let graph = file_graph(code);

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(ids.contains(&"import_os"));
        assert!(ids.contains(&"import_json"));
        assert!(ids.contains(&"class_A"));
        assert!(ids.contains(&"func_work"));
        // os and os.path collapse to one import node
        assert_eq!(ids.iter().filter(|id| **id == "import_os").count(), 1);

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].to, "class_Base");
        assert_eq!(graph.edges[0].kind, "inherits");
    }

    #[test]
    fn project_graph_links_local_imports_only() {
        let files = vec![
            (
                "main.py".to_string(),
                "import helpers\nimport os\n".to_string(),
            ),
            ("helpers.py".to_string(), "x = 1\n".to_string()),
        ];
        let graph = project_graph(&files);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, "main");
        assert_eq!(graph.edges[0].to, "helpers");
    }

    #[test]
    fn project_graph_handles_packages() {
        let files = vec![
            (
                "app.py".to_string(),
                "from pkg.util import helper\n".to_string(),
            ),
            ("pkg/util.py".to_string(), "def helper():\n    pass\n".to_string()),
        ];
        let graph = project_graph(&files);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].to, "pkg.util");
    }

    #[test]
    fn render_contains_nodes_and_edges() {
        let code = "import os\n\n\nclass A(Base):\n    pass\n\n\nclass Base:\n    pass\n";
        let graph = file_graph(code);
        let html = render_graph_html(&graph, "sample.py");
        assert!(html.contains("sample.py"));
        assert!(html.contains(">Base<"));
        assert!(html.contains("edge-inherits"));
        assert!(html.contains("node-import"));
    }

    #[test]
    fn empty_graph_still_renders_a_page() {
        let html = render_graph_html(&DependencyGraph::default(), "empty.py");
        assert!(html.contains("empty.py"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(truncate("short", 22), "short");
        assert_eq!(truncate("a_very_long_function_name_indeed", 8), "a_very_l");
    }
}
