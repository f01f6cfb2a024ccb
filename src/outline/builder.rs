use crate::core::types::{HeadingNode, HeadingRecord};
use crate::outline::level::HeadingLevel;

/// Rebuilds the heading forest from records in document-scan order. Equal
/// levels never nest.
pub fn build_tree(records: &[HeadingRecord]) -> Vec<HeadingNode> {
    let mut roots: Vec<HeadingNode> = Vec::new();
    let mut open: Vec<(u32, HeadingNode)> = Vec::new();

    for record in records {
        let level = HeadingLevel::parse(&record.level);
        if level.is_malformed() {
            tracing::debug!(heading_id = %record.id, level = %record.level, "malformed heading level, treating as root");
        }
        let depth = level.depth();
        while open.last().is_some_and(|(top_depth, _)| *top_depth >= depth) {
            if let Some((_, closed)) = open.pop() {
                attach(&mut open, &mut roots, closed);
            }
        }
        open.push((
            depth,
            HeadingNode {
                heading: record.clone(),
                children: Vec::new(),
            },
        ));
    }

    while let Some((_, closed)) = open.pop() {
        attach(&mut open, &mut roots, closed);
    }

    roots
}

fn attach(open: &mut [(u32, HeadingNode)], roots: &mut Vec<HeadingNode>, node: HeadingNode) {
    match open.last_mut() {
        Some((_, parent)) => parent.children.push(node),
        None => roots.push(node),
    }
}

pub fn find_node<'a>(forest: &'a [HeadingNode], id: &str) -> Option<&'a HeadingNode> {
    for node in forest {
        if node.heading.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Pre-order walk yielding `(depth, node)`, roots at depth 0.
pub fn flatten(forest: &[HeadingNode]) -> Vec<(usize, &HeadingNode)> {
    let mut out = Vec::new();
    let mut pending: Vec<(usize, &HeadingNode)> = forest.iter().rev().map(|node| (0, node)).collect();
    while let Some((depth, node)) = pending.pop() {
        out.push((depth, node));
        pending.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
    }
    out
}
