use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// A parent-to-child link in the composition tree.
///
/// `ratio` is this child's share of the parent's whole. `recipe_weight`
/// holds absolute grams and is only meaningful when the parent is a meal.
/// Neither value is validated here; keeping sibling ratios summing to one
/// is the parent's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    child: NodeId,
    ratio: f64,
    recipe_weight: f64,
}

impl Edge {
    pub fn new(child: NodeId, ratio: f64, recipe_weight: f64) -> Self {
        Self {
            child,
            ratio,
            recipe_weight,
        }
    }

    pub fn child(&self) -> NodeId {
        self.child
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio;
    }

    pub fn recipe_weight(&self) -> f64 {
        self.recipe_weight
    }

    pub fn set_recipe_weight(&mut self, grams: f64) {
        self.recipe_weight = grams;
    }

    /// Point this edge at a different child. Parent-set bookkeeping on the
    /// two children is done by the registry.
    pub(crate) fn set_child(&mut self, child: NodeId) {
        self.child = child;
    }
}
