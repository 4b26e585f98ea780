use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;
use uuid::Uuid;

new_key_type! {
    /// Slot in the registry arena that stores a node.
    pub struct NodeKey;
}

/// Stable identity of a composition node. Generated once at construction
/// and never reused; restorable verbatim from persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id_{}", self.0.simple())
    }
}

/// Identifies a crew member. Crew members live outside the composition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CrewId(pub Uuid);

impl CrewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CrewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CrewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crew_{}", self.0.simple())
    }
}

/// The three kinds of composition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Ingredient,
    Meal,
    Adventure,
}

impl NodeKind {
    /// The kind a node of this kind accepts as children, if any.
    pub fn child_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Ingredient => None,
            NodeKind::Meal => Some(NodeKind::Ingredient),
            NodeKind::Adventure => Some(NodeKind::Meal),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Ingredient => "Ingredient",
            NodeKind::Meal => "Meal",
            NodeKind::Adventure => "Adventure",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
