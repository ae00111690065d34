// Layered top-to-bottom layout for the object forest.
//
// Every subtree gets a horizontal band wide enough for its children; a parent
// is centered above its band. Ranks follow forest depth.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::config::LayoutConfig;
use crate::query::TreeNode;

/// Top-left corner of a node box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub positions: HashMap<Uuid, Position>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn position(&self, id: &Uuid) -> Option<Position> {
        self.positions.get(id).copied()
    }
}

pub fn layout_forest(forest: &[TreeNode], config: &LayoutConfig) -> Layout {
    let mut widths = HashMap::new();
    let mut layout = Layout::default();
    if forest.is_empty() {
        return layout;
    }

    let mut left = 0.0;
    let mut deepest = 0;
    for (index, root) in forest.iter().enumerate() {
        if index > 0 {
            left += config.node_sep;
        }
        let band = measure(root, config, &mut widths);
        place(root, left, config, &widths, &mut layout.positions);
        left += band;
        deepest = deepest.max(root.depth());
    }

    let ranks = deepest as f64;
    layout.width = left;
    layout.height = ranks * config.node_height + (ranks - 1.0) * config.rank_sep;
    layout
}

/// Band width of every subtree, post-order with an explicit stack
fn measure(root: &TreeNode, config: &LayoutConfig, widths: &mut HashMap<Uuid, f64>) -> f64 {
    let mut stack = vec![(root, false)];
    while let Some((tree, expanded)) = stack.pop() {
        if !expanded {
            stack.push((tree, true));
            stack.extend(tree.children.iter().map(|child| (child, false)));
            continue;
        }

        let children: f64 = tree.children.iter().map(|child| band(child, config, widths)).sum();
        let gaps = tree.children.len().saturating_sub(1) as f64 * config.node_sep;
        widths.insert(tree.node.id, config.node_width.max(children + gaps));
    }
    band(root, config, widths)
}

fn band(tree: &TreeNode, config: &LayoutConfig, widths: &HashMap<Uuid, f64>) -> f64 {
    widths.get(&tree.node.id).copied().unwrap_or(config.node_width)
}

/// Center each node over its band, then split the band among its children
fn place(
    root: &TreeNode,
    left: f64,
    config: &LayoutConfig,
    widths: &HashMap<Uuid, f64>,
    positions: &mut HashMap<Uuid, Position>,
) {
    let mut stack = vec![(root, left, 0usize)];
    while let Some((tree, left, rank)) = stack.pop() {
        let center_x = left + band(tree, config, widths) / 2.0;
        let center_y = rank as f64 * (config.node_height + config.rank_sep) + config.node_height / 2.0;

        positions.insert(
            tree.node.id,
            Position {
                x: center_x - config.node_width / 2.0,
                y: center_y - config.node_height / 2.0,
            },
        );

        let children: f64 = tree.children.iter().map(|child| band(child, config, widths)).sum();
        let gaps = tree.children.len().saturating_sub(1) as f64 * config.node_sep;
        let mut child_left = center_x - (children + gaps) / 2.0;

        for child in &tree.children {
            stack.push((child, child_left, rank + 1));
            child_left += band(child, config, widths) + config.node_sep;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateObjectInput, ObjectKind, ObjectNode};
    use crate::query::build_forest;
    use chrono::Utc;

    fn node(name: &str, level: i32, parent: Option<&ObjectNode>) -> ObjectNode {
        let mut input = CreateObjectInput::new(name, ObjectKind::Unit, level);
        input.parent_id = parent.map(|p| p.id);
        ObjectNode::from_input(input, Utc::now())
    }

    #[test]
    fn single_node_sits_at_origin() {
        let a = node("A", 0, None);
        let layout = layout_forest(&build_forest(&[a.clone()]), &LayoutConfig::default());

        assert_eq!(layout.position(&a.id), Some(Position { x: 0.0, y: 0.0 }));
        assert_eq!(layout.width, 180.0);
        assert_eq!(layout.height, 70.0);
    }

    #[test]
    fn parent_is_centered_over_children() {
        let a = node("A", 0, None);
        let b = node("B", 1, Some(&a));
        let c = node("C", 1, Some(&a));
        let layout = layout_forest(&build_forest(&[a.clone(), b.clone(), c.clone()]), &LayoutConfig::default());

        let pa = layout.position(&a.id).unwrap();
        let pb = layout.position(&b.id).unwrap();
        let pc = layout.position(&c.id).unwrap();

        // Children band is 180 + 40 + 180 = 400
        assert_eq!(pb, Position { x: 0.0, y: 170.0 });
        assert_eq!(pc, Position { x: 220.0, y: 170.0 });
        assert_eq!(pa, Position { x: 110.0, y: 0.0 });
        assert_eq!(layout.width, 400.0);
        assert_eq!(layout.height, 240.0);
    }

    #[test]
    fn long_chain_stacks_vertically() {
        let mut nodes: Vec<ObjectNode> = Vec::new();
        for i in 0..10_000 {
            let next = node(&format!("N{}", i), i, nodes.last());
            nodes.push(next);
        }
        let layout = layout_forest(&build_forest(&nodes), &LayoutConfig::default());

        let last = nodes.last().map(|n| n.id).unwrap();
        assert_eq!(layout.position(&last), Some(Position { x: 0.0, y: 9_999.0 * 170.0 }));
        assert_eq!(layout.width, 180.0);
        assert_eq!(layout.positions.len(), 10_000);
    }

    #[test]
    fn roots_do_not_overlap() {
        let a = node("A", 0, None);
        let b = node("B", 0, None);
        let layout = layout_forest(&build_forest(&[a.clone(), b.clone()]), &LayoutConfig::default());

        let pa = layout.position(&a.id).unwrap();
        let pb = layout.position(&b.id).unwrap();
        assert!(pb.x >= pa.x + 180.0 + 40.0);
        assert_eq!(pa.y, pb.y);
    }
}
