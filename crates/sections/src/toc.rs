use crate::types::{Section, SectionId};
use serde::{Deserialize, Serialize};

/// Node of the table-of-contents tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    pub id: SectionId,
    pub slug: String,
    pub title: String,
    pub level: u8,
    pub children: Vec<TocNode>,
}

impl TocNode {
    fn from_section(section: &Section) -> Self {
        Self {
            id: section.id,
            slug: section.slug.clone(),
            title: section.title.clone(),
            level: section.level,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including self
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TocNode::node_count).sum::<usize>()
    }
}

/// Build the heading tree.
///
/// A level-N section becomes a child of the nearest preceding section
/// whose level is lower than N, or a root when there is none.
#[must_use]
pub fn build_toc(sections: &[Section]) -> Vec<TocNode> {
    let mut roots: Vec<TocNode> = Vec::new();
    let mut stack: Vec<TocNode> = Vec::new();

    for section in sections {
        while stack
            .last()
            .is_some_and(|open| open.level >= section.level)
        {
            if let Some(done) = stack.pop() {
                attach(&mut stack, &mut roots, done);
            }
        }
        stack.push(TocNode::from_section(section));
    }

    while let Some(done) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }

    roots
}

fn attach(stack: &mut [TocNode], roots: &mut Vec<TocNode>, node: TocNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Parent index of every section (same ordering as the input)
#[must_use]
pub fn parent_indices(sections: &[Section]) -> Vec<Option<usize>> {
    let mut parents = Vec::with_capacity(sections.len());
    let mut stack: Vec<usize> = Vec::new();

    for (idx, section) in sections.iter().enumerate() {
        while stack
            .last()
            .is_some_and(|&open| sections[open].level >= section.level)
        {
            stack.pop();
        }
        parents.push(stack.last().copied());
        stack.push(idx);
    }

    parents
}
