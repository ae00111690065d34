// List-to-tree projection over parent pointers

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use uuid::Uuid;

use crate::model::ObjectNode;
use crate::query::QueryError;

/// Deepest forest served as nested JSON; deeper hierarchies are only
/// available flat (listings and the graph view)
pub const MAX_NESTED_DEPTH: usize = 256;

/// A node together with its materialized children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: ObjectNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, itself included
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            count += 1;
            stack.extend(&tree.children);
        }
        count
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((tree, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(tree.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

// Long parent chains would otherwise be dropped one stack frame per level
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

/// Index of children by parent id, preserving input order
pub fn children_index(nodes: &[ObjectNode]) -> HashMap<Uuid, Vec<&ObjectNode>> {
    let mut index: HashMap<Uuid, Vec<&ObjectNode>> = HashMap::new();
    for node in nodes {
        if let Some(parent_id) = node.parent_id {
            index.entry(parent_id).or_default().push(node);
        }
    }
    index
}

/// Build the forest for a node set.
///
/// Roots are nodes without a parent and nodes whose parent is not part of the
/// set. Nodes stuck on a parent cycle are never reachable from a root; they are
/// promoted to roots with the cycle cut so every input node appears exactly once.
pub fn build_forest(nodes: &[ObjectNode]) -> Vec<TreeNode> {
    let present: HashSet<Uuid> = nodes.iter().map(|n| n.id).collect();
    let index = children_index(nodes);
    let mut visited: HashSet<Uuid> = HashSet::with_capacity(nodes.len());
    let mut roots = Vec::new();

    for node in nodes {
        let is_root = match node.parent_id {
            None => true,
            Some(parent_id) => !present.contains(&parent_id),
        };
        if is_root {
            roots.extend(attach(node, &index, &mut visited));
        }
    }

    for node in nodes {
        if !visited.contains(&node.id) {
            tracing::warn!("Object {} is part of a parent cycle, listing it as a root", node.id);
            roots.extend(attach(node, &index, &mut visited));
        }
    }

    roots
}

/// Refuse forests nested deeper than a JSON tree can reasonably carry
pub fn ensure_nestable(forest: &[TreeNode]) -> Result<(), QueryError> {
    let depth = forest.iter().map(TreeNode::depth).max().unwrap_or(0);
    if depth > MAX_NESTED_DEPTH {
        return Err(QueryError::TooDeep {
            depth,
            limit: MAX_NESTED_DEPTH,
        });
    }
    Ok(())
}

/// A node under construction with the children still to visit
struct Frame<'a> {
    node: &'a ObjectNode,
    pending: std::slice::Iter<'a, &'a ObjectNode>,
    children: Vec<TreeNode>,
}

impl<'a> Frame<'a> {
    fn new(node: &'a ObjectNode, index: &'a HashMap<Uuid, Vec<&'a ObjectNode>>) -> Self {
        Self {
            node,
            pending: index.get(&node.id).map(Vec::as_slice).unwrap_or(&[]).iter(),
            children: Vec::new(),
        }
    }
}

/// Depth-first materialization of the subtree under `root` with an explicit stack
fn attach<'a>(
    root: &'a ObjectNode,
    index: &'a HashMap<Uuid, Vec<&'a ObjectNode>>,
    visited: &mut HashSet<Uuid>,
) -> Option<TreeNode> {
    visited.insert(root.id);
    let mut stack = vec![Frame::new(root, index)];

    while let Some(frame) = stack.last_mut() {
        if let Some(child) = frame.pending.next() {
            if visited.insert(child.id) {
                stack.push(Frame::new(child, index));
            }
            continue;
        }

        let Some(done) = stack.pop() else { break };
        let tree = TreeNode {
            node: done.node.clone(),
            children: done.children,
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(tree),
            None => return Some(tree),
        }
    }
    None
}

/// Ids of `root` and every node transitively below it, breadth first
pub fn subtree_ids(nodes: &[ObjectNode], root: Uuid) -> Vec<Uuid> {
    let index = children_index(nodes);
    let mut seen = HashSet::from([root]);
    let mut order = vec![root];
    let mut queue = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        for child in index.get(&current).into_iter().flatten() {
            if seen.insert(child.id) {
                order.push(child.id);
                queue.push_back(child.id);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateObjectInput, ObjectKind};
    use chrono::Utc;

    fn node(name: &str, kind: ObjectKind, level: i32, parent: Option<&ObjectNode>) -> ObjectNode {
        let mut input = CreateObjectInput::new(name, kind, level);
        input.parent_id = parent.map(|p| p.id);
        ObjectNode::from_input(input, Utc::now())
    }

    #[test]
    fn builds_nested_forest_in_input_order() {
        let hospital = node("Hospital", ObjectKind::Organization, 0, None);
        let clinic = node("Clinic", ObjectKind::Organization, 0, None);
        let ward = node("Ward A", ObjectKind::Unit, 1, Some(&hospital));
        let room = node("Room 1", ObjectKind::Room, 2, Some(&ward));
        let bed = node("Bed 1", ObjectKind::Bed, 3, Some(&room));

        let forest = build_forest(&[hospital.clone(), clinic.clone(), ward, room, bed]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].node.id, hospital.id);
        assert_eq!(forest[1].node.id, clinic.id);
        assert_eq!(forest[0].size(), 4);
        assert_eq!(forest[0].depth(), 4);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn orphan_with_missing_parent_becomes_root() {
        let hospital = node("Hospital", ObjectKind::Organization, 0, None);
        let ward = node("Ward A", ObjectKind::Unit, 1, Some(&hospital));

        let forest = build_forest(&[ward.clone()]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].node.id, ward.id);
    }

    #[test]
    fn cycle_members_still_appear_once() {
        let mut a = node("A", ObjectKind::Unit, 1, None);
        let mut b = node("B", ObjectKind::Unit, 2, None);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);

        let forest = build_forest(&[a, b]);
        let total: usize = forest.iter().map(TreeNode::size).sum();
        assert_eq!(total, 2);
    }

    fn chain(len: usize) -> Vec<ObjectNode> {
        let mut nodes: Vec<ObjectNode> = Vec::with_capacity(len);
        for i in 0..len {
            let parent = nodes.last();
            let next = node(&format!("N{}", i), ObjectKind::Unit, i as i32, parent);
            nodes.push(next);
        }
        nodes
    }

    #[test]
    fn long_parent_chain_builds_without_recursion() {
        let nodes = chain(20_000);
        let forest = build_forest(&nodes);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].size(), 20_000);
        assert_eq!(forest[0].depth(), 20_000);
        assert!(matches!(
            ensure_nestable(&forest),
            Err(QueryError::TooDeep { depth: 20_000, .. })
        ));
    }

    #[test]
    fn shallow_forest_is_nestable() {
        let nodes = chain(MAX_NESTED_DEPTH);
        assert!(ensure_nestable(&build_forest(&nodes)).is_ok());
    }

    #[test]
    fn subtree_is_transitive_and_excludes_siblings() {
        let root = node("Hospital", ObjectKind::Organization, 0, None);
        let ward = node("Ward", ObjectKind::Unit, 1, Some(&root));
        let other = node("Other", ObjectKind::Unit, 1, Some(&root));
        let room = node("Room", ObjectKind::Room, 2, Some(&ward));
        let nodes = vec![root, ward.clone(), other.clone(), room.clone()];

        let ids = subtree_ids(&nodes, ward.id);
        assert_eq!(ids, vec![ward.id, room.id]);
        assert!(!ids.contains(&other.id));
    }
}
