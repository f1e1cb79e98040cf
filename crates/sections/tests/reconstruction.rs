use docsearch_sections::{build_toc, extract_sections, reconstruct, validate_sections, TocNode};
use proptest::prelude::*;

fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn block() -> impl Strategy<Value = String> {
    (
        1usize..=6,
        "[A-Za-z][A-Za-z0-9 ]{0,15}",
        prop::collection::vec("[a-z0-9 ,.]{0,30}", 0..5),
    )
        .prop_map(|(level, title, body)| {
            let mut out = format!("{} {title}\n", "#".repeat(level));
            for line in body {
                out.push_str(&line);
                out.push('\n');
            }
            out
        })
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(block(), 0..12).prop_map(|blocks| blocks.concat())
}

fn count(nodes: &[TocNode]) -> usize {
    nodes.iter().map(TocNode::node_count).sum()
}

proptest! {
    #[test]
    fn sections_reconstruct_document(doc in document()) {
        let sections = extract_sections(&doc);
        prop_assert_eq!(normalize(&reconstruct(&sections)), normalize(&doc));
    }

    #[test]
    fn extracted_sets_are_valid(doc in document()) {
        let sections = extract_sections(&doc);
        prop_assert!(validate_sections(&sections).is_ok());
    }

    #[test]
    fn toc_covers_every_section(doc in document()) {
        let sections = extract_sections(&doc);
        prop_assert_eq!(count(&build_toc(&sections)), sections.len());
    }

    #[test]
    fn line_ranges_tile_the_document(doc in document()) {
        let sections = extract_sections(&doc);
        for pair in sections.windows(2) {
            prop_assert_eq!(pair[0].end_line + 1, pair[1].start_line);
        }
        if let Some(last) = sections.last() {
            prop_assert_eq!(last.end_line, doc.lines().count());
        }
    }
}

#[test]
fn heading_only_document_round_trips() {
    let doc = "# One\n## Two\n### Three";
    let sections = extract_sections(doc);
    assert_eq!(reconstruct(&sections), doc);
}
