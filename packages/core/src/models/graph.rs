//! Mindmap Graph Structures
//!
//! The mindmap is a positioned, leveled, directed layout graph. Nodes come in
//! two kinds, told apart by `entity_type`:
//!
//! - Synchronized nodes carry an `entity_type` and are derived from entity
//!   state. Every synchronization pass destroys and rebuilds them wholesale,
//!   so their ids are only meaningful within one generation and must never
//!   be persisted across syncs.
//! - Standalone nodes carry no `entity_type`. They are created through the
//!   node endpoints, keep user-supplied positions, and survive
//!   synchronization untouched.

use serde::{Deserialize, Serialize};

/// Level 0: one node per project
pub const NODE_LEVEL_PROJECT: i64 = 0;
/// Level 1: the "Team Members" grouping node under a project
pub const NODE_LEVEL_TEAM: i64 = 1;
/// Level 2: one node per (project, assigned member) pair
pub const NODE_LEVEL_MEMBER: i64 = 2;
/// Level 3: one node per assigned task
pub const NODE_LEVEL_TASK: i64 = 3;

/// A positioned vertex in the mindmap.
///
/// Synchronized nodes get dense ids assigned by a single counter in emission
/// order, starting at 0 on every pass; standalone nodes are allocated ids
/// from a disjoint high range so the two never collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindmapNode {
    pub id: i64,

    /// Layout-computed position in pixels
    pub x: f64,
    pub y: f64,

    /// Display text
    pub text: String,

    /// Depth in the layout tree (see `NODE_LEVEL_*`)
    pub level: i64,

    /// Originating entity kind ("project", "member", "task", or "team" for
    /// the grouping node, which references no single entity). `None` marks a
    /// standalone node the synchronizer leaves alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Originating entity id, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// Partial fields for creating or moving a standalone node
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpsert {
    pub id: Option<i64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub text: Option<String>,
    pub level: Option<i64>,
}

/// A directed parent -> child edge between two mindmap nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindmapConnection {
    pub id: i64,
    pub from_node: i64,
    pub to_node: i64,
}

/// One full generation of the derived graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindmapLayout {
    pub nodes: Vec<MindmapNode>,
    pub connections: Vec<MindmapConnection>,
}

impl MindmapLayout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }
}
