use anyhow::Result;
use docsearch_search::SearchResponse;
use docsearch_sections::TocNode;
use std::io::{self, Write};

/// Write one line to stdout; a closed pipe is not an error.
pub fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .and_then(|()| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

pub fn format_toc(nodes: &[TocNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        push_node(&mut out, node, 0);
    }
    out.trim_end().to_string()
}

fn push_node(out: &mut String, node: &TocNode, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&format!("- {} (#{})\n", node.title, node.slug));
    for child in &node.children {
        push_node(out, child, depth + 1);
    }
}

pub fn format_results(response: &SearchResponse) -> String {
    if response.results.is_empty() {
        return format!("No results for '{}'", response.query);
    }

    let mut lines = Vec::new();
    for (i, result) in response.results.iter().enumerate() {
        lines.push(format!(
            "{}. {} (#{}, score: {:.3})",
            i + 1,
            result.section.title,
            result.section.slug,
            result.score
        ));
        if !result.matches.is_empty() {
            lines.push(format!("   Matches: {}", result.matches.join(", ")));
        }
    }
    lines.push(format!(
        "{} of {} results in {:.2}ms",
        response.results.len(),
        response.total_results,
        response.search_time_ms
    ));
    lines.join("\n")
}
