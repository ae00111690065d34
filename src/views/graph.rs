// Graph presentation: nodes with absolute positions and parent -> child edges

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::config::LayoutConfig;
use crate::model::{ObjectKind, ObjectNode};
use crate::query::build_forest;
use crate::views::layout::{layout_forest, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub label: String,
    pub description: Option<String>,
    pub level: i32,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: Uuid,
    pub target: Uuid,
}

impl GraphEdge {
    pub fn between(parent: Uuid, child: Uuid) -> Self {
        Self {
            id: format!("e-{}-{}", parent, child),
            source: parent,
            target: child,
        }
    }
}

/// Entry points offered when there is nothing to click on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Affordance {
    AddRoot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GraphView {
    Empty {
        affordance: Affordance,
    },
    Laid {
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        width: f64,
        height: f64,
    },
}

/// One edge per node whose parent is part of the same set
pub fn edges_for(nodes: &[ObjectNode]) -> Vec<GraphEdge> {
    let present: HashSet<Uuid> = nodes.iter().map(|node| node.id).collect();
    nodes
        .iter()
        .filter_map(|node| {
            node.parent_id
                .filter(|parent| present.contains(parent))
                .map(|parent| GraphEdge::between(parent, node.id))
        })
        .collect()
}

impl GraphView {
    pub fn build(nodes: &[ObjectNode], config: &LayoutConfig) -> Self {
        if nodes.is_empty() {
            return GraphView::Empty {
                affordance: Affordance::AddRoot,
            };
        }

        let layout = layout_forest(&build_forest(nodes), config);
        let graph_nodes = nodes
            .iter()
            .map(|node| GraphNode {
                id: node.id,
                label: node.name.clone(),
                description: node.description.clone(),
                level: node.level,
                kind: node.kind,
                position: layout.position(&node.id).unwrap_or(Position { x: 0.0, y: 0.0 }),
            })
            .collect();

        GraphView::Laid {
            nodes: graph_nodes,
            edges: edges_for(nodes),
            width: layout.width,
            height: layout.height,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GraphView::Empty { .. })
    }

    pub fn nodes(&self) -> &[GraphNode] {
        match self {
            GraphView::Empty { .. } => &[],
            GraphView::Laid { nodes, .. } => nodes,
        }
    }

    pub fn edges(&self) -> &[GraphEdge] {
        match self {
            GraphView::Empty { .. } => &[],
            GraphView::Laid { edges, .. } => edges,
        }
    }

    pub fn node(&self, id: Uuid) -> Option<&GraphNode> {
        self.nodes().iter().find(|node| node.id == id)
    }
}
