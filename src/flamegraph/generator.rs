//! SVG flamegraph generation from the flattened call tree.
//!
//! Hand-rolled SVG rather than a flamegraph library:
//! - Frames are coloured by source file
//! - Inverted layout (Root at bottom)
//! - Input is already a tree, no collapsed-stack text round trip

use crate::aggregator::metrics::HotPath;
use crate::parser::{CallTreePath, FunctionSite};
use crate::utils::error::FlamegraphError;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

const ROOT_NAME: &str = "all";
const ROOT_COLOR: &str = "rgb(100, 149, 237)";

const FILE_PALETTE: [&str; 8] = [
    "rgb(220, 20, 60)",
    "rgb(255, 140, 0)",
    "rgb(138, 43, 226)",
    "rgb(34, 139, 34)",
    "rgb(70, 130, 180)",
    "rgb(218, 165, 32)",
    "rgb(199, 21, 133)",
    "rgb(0, 139, 139)",
];

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    pub width: usize,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Line Profile".to_string(),
            width: 1200,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Internal Node structure for building the tree
struct Node {
    name: String,
    file: Option<String>,
    value: u64,
    children: BTreeMap<FunctionSite, Node>,
}

impl Node {
    fn new(name: String, file: Option<String>) -> Self {
        Self {
            name,
            file,
            value: 0,
            children: BTreeMap::new(),
        }
    }

    fn insert(&mut self, path: &[FunctionSite], value: u64) {
        self.value += value;
        if let Some((head, tail)) = path.split_first() {
            let child = self
                .children
                .entry(head.clone())
                .or_insert_with(|| Node::new(head.label(), Some(head.file.clone())));
            child.insert(tail, value);
        }
    }
}

/// Generate an SVG flamegraph from the flattened call tree
///
/// **Public** - used by the `reduce` command
///
/// Frame widths are inclusive runtime: a node's own runtime plus that of
/// everything below it.
///
/// # Errors
/// * `FlamegraphError::EmptyProfile` - no runtime was recorded anywhere
pub fn generate_flamegraph(
    paths: &[CallTreePath],
    config: Option<&FlamegraphConfig>,
) -> Result<String, FlamegraphError> {
    let config = config.cloned().unwrap_or_default();

    let mut root = Node::new(ROOT_NAME.to_string(), None);
    for path in paths {
        root.insert(&path.path, path.runtime);
    }
    if root.value == 0 {
        return Err(FlamegraphError::EmptyProfile);
    }

    info!("Generating flamegraph from {} call paths", paths.len());

    let colors = assign_file_colors(paths);
    let max_depth = paths.iter().map(|p| p.path.len()).max().unwrap_or(0);
    debug!("Flamegraph depth {}, {} files", max_depth, colors.len());

    let width = config.width;
    let height_per_level = 20;
    let graph_height = (max_depth + 1) * height_per_level;
    let legend_rows = colors.len().div_ceil(LEGEND_PER_ROW).max(1);
    let legend_height = 40 + legend_rows * 20;
    let total_height = graph_height + 30 + legend_height;

    let mut svg_content = String::new();

    // Header
    svg_content.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        width, total_height, width, total_height
    ));

    svg_content.push_str(
        r#"<style>.func { font: 12px sans-serif; } .func:hover { stroke: black; stroke-width: 1; cursor: pointer; opacity: 0.9; }</style>"#,
    );

    // Title
    svg_content.push_str(&format!(
        r#"<text x="{}" y="20" font-size="16" text-anchor="middle" font-weight="bold">{}</text>"#,
        width / 2,
        escape_xml(&config.title)
    ));

    let layout = Layout {
        height_per_level,
        graph_height,
        total: root.value,
        colors: &colors,
    };
    render_node(&root, 0, 0.0, width as f64, &mut svg_content, &layout);

    render_legend(&mut svg_content, graph_height, &colors);

    svg_content.push_str("</svg>");

    info!("Flamegraph generated successfully ({} bytes)", svg_content.len());
    Ok(svg_content)
}

/// Escape text for use in SVG element content and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Distinct files in sorted order, each with a palette colour
fn assign_file_colors(paths: &[CallTreePath]) -> BTreeMap<String, &'static str> {
    let files: BTreeSet<&str> = paths
        .iter()
        .flat_map(|p| p.path.iter().map(|site| site.file.as_str()))
        .collect();

    files
        .into_iter()
        .enumerate()
        .map(|(i, file)| (file.to_string(), FILE_PALETTE[i % FILE_PALETTE.len()]))
        .collect()
}

struct Layout<'a> {
    height_per_level: usize,
    graph_height: usize,
    total: u64,
    colors: &'a BTreeMap<String, &'static str>,
}

fn render_node(node: &Node, level: usize, x: f64, w: f64, out: &mut String, layout: &Layout) {
    if w < 0.5 {
        return;
    }

    let color = node
        .file
        .as_ref()
        .and_then(|f| layout.colors.get(f).copied())
        .unwrap_or(ROOT_COLOR);

    let h = layout.height_per_level;
    // 30px margin for the title
    let y = layout.graph_height - ((level + 1) * h) + 30;
    let percentage = node.value as f64 / layout.total as f64 * 100.0;
    let name = escape_xml(&node.name);

    out.push_str(&format!(
        r#"<rect x="{:.2}" y="{}" width="{:.2}" height="{}" fill="{}" class="func"><title>{} ({} ticks, {:.2}%)</title></rect>"#,
        x, y, w, h, color, name, node.value, percentage
    ));

    if w > 35.0 {
        let char_width = 7.0;
        let max_chars = (w / char_width) as usize;
        let char_count = node.name.chars().count();
        let display_name = if char_count > max_chars && max_chars > 3 {
            let head: String = node.name.chars().take(max_chars - 3).collect();
            format!("{}...", head)
        } else {
            node.name.clone()
        };

        if !display_name.is_empty() {
            out.push_str(&format!(
                r#"<text x="{:.2}" y="{}" dx="4" dy="14" font-size="12" fill="white" pointer-events="none">{}</text>"#,
                x,
                y,
                escape_xml(&display_name)
            ));
        }
    }

    let mut current_x = x;
    let mut children: Vec<&Node> = node.children.values().filter(|c| c.value > 0).collect();
    children.sort_by(|a, b| b.value.cmp(&a.value));

    for child in children {
        let child_w = (child.value as f64 / node.value as f64) * w;
        render_node(child, level + 1, current_x, child_w, out, layout);
        current_x += child_w;
    }
}

const LEGEND_PER_ROW: usize = 4;

fn render_legend(out: &mut String, graph_height: usize, colors: &BTreeMap<String, &'static str>) {
    let legend_y = graph_height + 60;

    out.push_str(&format!(
        r#"<text x="10" y="{}" font-size="14" font-weight="bold">Files:</text>"#,
        legend_y
    ));

    for (i, (file, color)) in colors.iter().enumerate() {
        let x = 80 + (i % LEGEND_PER_ROW) * 260;
        let y = legend_y + (i / LEGEND_PER_ROW) * 20;
        out.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}" rx="2"/>"#,
            x,
            y - 12,
            color
        ));
        out.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
            x + 20,
            y,
            escape_xml(file)
        ));
    }
}

/// Create a text summary table of the hottest call paths
pub fn generate_text_summary(hot_paths: &[HotPath], max_lines: usize) -> String {
    let mut lines = Vec::new();

    lines.push("  HOT PATHS".to_string());
    lines.push(format!("  ┏{}┳{}┳{}┳{}┓", "━".repeat(52), "━".repeat(14), "━".repeat(10), "━".repeat(9)));
    lines.push(format!(
        "  ┃ {:<50} ┃ {:^12} ┃ {:^8} ┃ {:^7} ┃",
        "Call Path (Hottest First)", "TICKS", "CALLS", "%"
    ));
    lines.push(format!("  ┣{}╋{}╋{}╋{}┫", "━".repeat(52), "━".repeat(14), "━".repeat(10), "━".repeat(9)));

    for hot in hot_paths.iter().take(max_lines) {
        lines.push(format!(
            "  ┃ {:<50} ┃ {:>12} ┃ {:>8} ┃ {:>6.1}% ┃",
            truncate_front(&hot.stack, 50),
            hot.runtime,
            hot.calls,
            hot.percentage
        ));
    }

    lines.push(format!("  ┗{}┻{}┻{}┻{}┛", "━".repeat(52), "━".repeat(14), "━".repeat(10), "━".repeat(9)));

    lines.push(String::new());
    lines.push("  SIMPLIFIED FLAMEGRAPH".to_string());
    for hot in hot_paths.iter().take(5) {
        let bar = "█".repeat((hot.percentage / 2.0) as usize);
        let leaf = hot.stack.rsplit(';').next().unwrap_or(&hot.stack);
        lines.push(format!(
            "  └─ {:<24} {:<50} {:>5.1}%",
            truncate_front(leaf, 24),
            bar,
            hot.percentage
        ));
    }

    if hot_paths.len() > max_lines {
        lines.push(String::new());
        lines.push(format!(
            "   (Showing top {} of {} paths)",
            max_lines,
            hot_paths.len()
        ));
    }

    lines.join("\n")
}

/// Keep the last `max` characters, marking the cut with "..."
fn truncate_front(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (max - 3)).collect();
    format!("...{}", tail)
}
