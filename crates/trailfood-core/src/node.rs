//! The composition node shared by ingredients, meals and adventures, and
//! the ratio-rebalancing algorithms that operate on a node's edge table.

use crate::adventure::AdventureData;
use crate::edge::Edge;
use crate::id::{NodeId, NodeKind};
use crate::ingredient::IngredientData;
use crate::nutrient::NutrientSimplex;
use chrono::{DateTime, FixedOffset};
use std::collections::{BTreeSet, HashMap};

/// Kind-specific state carried by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Ingredient(IngredientData),
    Meal,
    Adventure(AdventureData),
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::Ingredient(_) => NodeKind::Ingredient,
            NodeBody::Meal => NodeKind::Meal,
            NodeBody::Adventure(_) => NodeKind::Adventure,
        }
    }
}

/// A unit of composition: an insertion-ordered edge table plus derived
/// aggregates (nutrients, energy density, weight) and the ids of every
/// node that lists this one as a child.
///
/// Parent ids are back-references only; they are resolved through the
/// [`Registry`](crate::registry::Registry) when changes propagate.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    name: String,
    created_at: DateTime<FixedOffset>,
    pub(crate) edges: Vec<Edge>,
    name_index: HashMap<String, NodeId>,
    pub(crate) nutrients: NutrientSimplex,
    pub(crate) energy_density: f64,
    pub(crate) weight: Option<f64>,
    parents: BTreeSet<NodeId>,
    pub(crate) body: NodeBody,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        name: impl Into<String>,
        created_at: DateTime<FixedOffset>,
        body: NodeBody,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
            edges: Vec::new(),
            name_index: HashMap::new(),
            nutrients: NutrientSimplex::new(),
            energy_density: 0.0,
            weight: None,
            parents: BTreeSet::new(),
            body,
        }
    }

    /// Name given to nodes created without one, e.g. `"Unnamed Meal"`.
    pub fn default_name(kind: NodeKind) -> String {
        format!("Unnamed {kind}")
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name_raw(&mut self, name: String) {
        self.name = name;
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    pub fn nutrients(&self) -> &NutrientSimplex {
        &self.nutrients
    }

    /// kcal per kg of this node's aggregated composition.
    pub fn energy_density(&self) -> f64 {
        self.energy_density
    }

    /// Absolute weight in kg. Only adventures derive one; `None` means
    /// unset (no adventure, or zero energy density).
    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn child_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, child: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.child() == child)
    }

    pub(crate) fn edge_mut(&mut self, child: NodeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.child() == child)
    }

    pub fn has_child(&self, child: NodeId) -> bool {
        self.edge(child).is_some()
    }

    pub fn child_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    pub fn parents(&self) -> &BTreeSet<NodeId> {
        &self.parents
    }

    pub(crate) fn add_parent(&mut self, parent: NodeId) {
        self.parents.insert(parent);
    }

    pub(crate) fn remove_parent(&mut self, parent: NodeId) {
        self.parents.remove(&parent);
    }

    /// Sum of all edge ratios. 1 for a consistent nonempty node, 0 when empty.
    pub fn ratio_sum(&self) -> f64 {
        self.edges.iter().map(Edge::ratio).sum()
    }

    /// Sum of all recipe weights, in grams.
    pub fn recipe_weight_total(&self) -> f64 {
        self.edges.iter().map(Edge::recipe_weight).sum()
    }

    // -----------------------------------------------------------------------
    // Ratio rebalancing
    // -----------------------------------------------------------------------

    /// Shrink every existing ratio by `n / (n + 1)` and return the share
    /// left for one more child, so all children end up equally weighted.
    /// With no children the returned share is exactly 1.
    pub(crate) fn give_space_for_another_entry(&mut self) -> f64 {
        let n = self.edges.len() as f64;
        let keep = n / (n + 1.0);
        let mut kept = 0.0;
        for edge in &mut self.edges {
            let scaled = edge.ratio() * keep;
            edge.set_ratio(scaled);
            kept += scaled;
        }
        1.0 - kept
    }

    /// Grow the remaining ratios after a child was dropped, restoring a
    /// sum of 1.
    ///
    /// Scales by the actual remaining sum rather than `1 - removed_ratio`,
    /// so a removed share just below 1 still leaves siblings summing to 1.
    /// When the siblings all hold 0 (the removed child held the whole)
    /// they are left as they are.
    pub(crate) fn scale_entries_on_removal(&mut self) {
        let remaining = self.ratio_sum();
        if remaining <= 0.0 {
            return;
        }
        let scale = 1.0 / remaining;
        for edge in &mut self.edges {
            edge.set_ratio(edge.ratio() * scale);
        }
    }

    /// Set every ratio to `recipe_weight / total`. Leaves ratios alone when
    /// no recipe weight has been assigned yet.
    pub(crate) fn ratios_from_recipe_weights(&mut self) {
        let total = self.recipe_weight_total();
        if total <= 0.0 {
            return;
        }
        for edge in &mut self.edges {
            edge.set_ratio(edge.recipe_weight() / total);
        }
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    pub(crate) fn rebuild_name_index<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = (String, NodeId)>,
    {
        self.name_index.clear();
        self.name_index.extend(names);
    }

    /// Recompute energy density from this node's own simplex.
    pub(crate) fn refresh_energy_density(&mut self) {
        self.energy_density = self.nutrients.energy_density();
    }

    /// Replace this node's simplex with the ratio-weighted average of the
    /// given child simplices, then refresh energy density.
    pub(crate) fn aggregate_nutrients<'a, I>(&mut self, children: I)
    where
        I: IntoIterator<Item = (&'a NutrientSimplex, f64)>,
    {
        self.nutrients.reset();
        for (simplex, ratio) in children {
            self.nutrients.accumulate(simplex, ratio);
        }
        self.refresh_energy_density();
    }
}
