//! Binary snapshots of a registry.
//!
//! Snapshots are encoded with `bitcode` behind a versioned header. Only
//! source state is stored: names, edges, ingredient nutrients and
//! measurement data, trip length, crew. Parent sets, name indexes and all
//! aggregates are rebuilt on restore.

use crate::adventure::AdventureData;
use crate::config::{ConfigError, EngineConfig};
use crate::crew::CrewMember;
use crate::edge::Edge;
use crate::error::ModelError;
use crate::id::{CrewId, NodeId, NodeKind};
use crate::ingredient::IngredientData;
use crate::node::{Node, NodeBody};
use crate::nutrient::{NutrientError, NutrientSimplex};
use crate::registry::Registry;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a registry snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x7A11_F00D;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("edge from {parent} points at unknown node {child}")]
    UnknownChild { parent: NodeId, child: NodeId },
    #[error("adventure {adventure} lists unknown crew member {crew}")]
    UnknownCrew { adventure: NodeId, crew: CrewId },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Nutrient(#[from] NutrientError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot, checked before the payload is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Number of nodes in the snapshot.
    pub node_count: u32,
}

impl SnapshotHeader {
    pub fn new(node_count: u32) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            node_count,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
enum BodyRecord {
    Ingredient(IngredientData),
    Meal,
    Adventure { days: u32, crew: Vec<CrewId> },
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    id: NodeId,
    name: String,
    created_at: DateTime<FixedOffset>,
    edges: Vec<Edge>,
    /// Only read back for ingredients; everything else is derived.
    nutrients: [f64; 6],
    body: BodyRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistrySnapshot {
    header: SnapshotHeader,
    config: EngineConfig,
    nodes: Vec<NodeRecord>,
    crew: Vec<CrewMember>,
}

fn record_of(node: &Node) -> NodeRecord {
    let body = match node.body() {
        NodeBody::Ingredient(data) => BodyRecord::Ingredient(data.clone()),
        NodeBody::Meal => BodyRecord::Meal,
        NodeBody::Adventure(data) => BodyRecord::Adventure {
            days: data.days(),
            crew: data.crew().to_vec(),
        },
    };
    NodeRecord {
        id: node.id(),
        name: node.name().to_string(),
        created_at: node.created_at(),
        edges: node.edges().to_vec(),
        nutrients: node.nutrients().values(),
        body,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Encode the registry, oldest nodes first.
pub fn serialize_registry(registry: &Registry) -> Result<Vec<u8>, SerializeError> {
    let mut nodes: Vec<&Node> = registry.iter().collect();
    nodes.sort_by_key(|n| (n.created_at(), n.id()));

    let mut crew: Vec<CrewMember> = registry
        .adventures()
        .iter()
        .filter_map(|adv| match adv.body() {
            NodeBody::Adventure(data) => Some(data.crew()),
            _ => None,
        })
        .flatten()
        .filter_map(|id| registry.crew_member(*id).cloned())
        .collect();
    crew.dedup_by_key(|m| m.id());

    let snapshot = RegistrySnapshot {
        header: SnapshotHeader::new(nodes.len() as u32),
        config: registry.config().clone(),
        nodes: nodes.into_iter().map(record_of).collect(),
        crew,
    };
    bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
}

/// Read only the header of a snapshot.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: RegistrySnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

/// Rebuild a registry from a snapshot.
///
/// Ids are kept verbatim. Parent sets and name indexes are rebuilt from
/// the edge tables, then derived state is recomputed bottom-up.
pub fn deserialize_registry(data: &[u8]) -> Result<Registry, DeserializeError> {
    let snapshot: RegistrySnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    snapshot.config.validate()?;

    let mut registry = Registry::with_config(snapshot.config);
    for member in snapshot.crew {
        registry.insert_crew(member);
    }

    let mut edges = Vec::new();
    for record in snapshot.nodes {
        let id = record.id;
        let (body, nutrients) = match record.body {
            BodyRecord::Ingredient(data) => (
                NodeBody::Ingredient(data),
                NutrientSimplex::from_values(record.nutrients)?,
            ),
            BodyRecord::Meal => (NodeBody::Meal, NutrientSimplex::new()),
            BodyRecord::Adventure { days, crew } => {
                if days == 0 {
                    return Err(ModelError::InvalidDays(days).into());
                }
                if let Some(&missing) = crew.iter().find(|c| registry.crew_member(**c).is_none()) {
                    return Err(DeserializeError::UnknownCrew {
                        adventure: id,
                        crew: missing,
                    });
                }
                (
                    NodeBody::Adventure(AdventureData::with_crew(days, crew)),
                    NutrientSimplex::new(),
                )
            }
        };
        let mut node = Node::new(id, record.name, record.created_at, body);
        node.nutrients = nutrients;
        node.edges = record.edges;
        edges.extend(node.edges.iter().map(|e| (id, e.child())));
        registry.insert_node(node)?;
    }

    for &(parent, child) in &edges {
        let node = registry
            .get_mut(child)
            .ok_or(DeserializeError::UnknownChild { parent, child })?;
        node.add_parent(parent);
    }

    let ids: Vec<(NodeId, NodeKind)> = registry.iter().map(|n| (n.id(), n.kind())).collect();
    for kind in [NodeKind::Ingredient, NodeKind::Meal, NodeKind::Adventure] {
        for &(id, _) in ids.iter().filter(|(_, k)| *k == kind) {
            match kind {
                NodeKind::Ingredient => registry.refresh_ingredient(id),
                NodeKind::Meal => registry.refresh_meal(id),
                NodeKind::Adventure => registry.refresh_adventure(id),
            }
        }
    }

    tracing::debug!(nodes = registry.len(), crew = registry.crew_len(), "registry restored");
    Ok(registry)
}
