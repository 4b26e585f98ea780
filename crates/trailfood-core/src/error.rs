use crate::id::{CrewId, NodeId, NodeKind};
use crate::nutrient::NutrientError;
use crate::unit::UnitError;

/// Errors returned by composition operations. Every variant is raised
/// before any state is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// The child to attach does not exist in the registry.
    #[error("cannot attach {0}: no such node")]
    NullChild(NodeId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("{child} is not a child of {parent}")]
    ChildNotFound { parent: NodeId, child: NodeId },

    #[error("no child named '{name}' in {parent}")]
    ChildNameNotFound { parent: NodeId, name: String },

    #[error("crew member not found: {0}")]
    CrewNotFound(CrewId),

    #[error("{child} is already attached to {parent}")]
    AlreadyAttached { parent: NodeId, child: NodeId },

    #[error("{id} is a {found}, expected a {expected}")]
    KindMismatch {
        id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },

    /// Ingredients are leaves; nothing can be attached below them.
    #[error("{0} is an ingredient and cannot hold children")]
    LeafParent(NodeId),

    #[error("node id {0} is already registered")]
    DuplicateId(NodeId),

    #[error("crew id {0} is already registered")]
    DuplicateCrewId(CrewId),

    #[error("invalid recipe weight for {child}: {grams} g, must be greater than 0")]
    InvalidWeight { child: NodeId, grams: f64 },

    #[error("invalid ratio for {child}: {ratio}")]
    InvalidRatio { child: NodeId, ratio: f64 },

    #[error("ratios for {parent} sum to {sum}, expected 1")]
    InvalidRatioSum { parent: NodeId, sum: f64 },

    /// A full ratio assignment must name every child exactly once.
    #[error("ratio assignment for {parent} must name {child} exactly once")]
    RatioCoverage { parent: NodeId, child: NodeId },

    #[error("days must be one or more, got {0}")]
    InvalidDays(u32),

    #[error("invalid daily kcal need for '{name}': {kcal}")]
    InvalidKcal { name: String, kcal: f64 },

    #[error("piece weight must be greater than 0, got {0}")]
    InvalidPieceWeight(f64),

    #[error("density must be greater than 0, got {0}")]
    InvalidDensity(f64),

    #[error(transparent)]
    Nutrient(#[from] NutrientError),

    #[error(transparent)]
    Unit(#[from] UnitError),
}
