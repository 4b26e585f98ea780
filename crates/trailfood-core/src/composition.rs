//! Generic composition engine: attaching and detaching children, editing
//! edges, and the bottom-up recomputation that runs after every change.
//!
//! # Propagation
//!
//! Every mutation ends in [`Registry::update_and_propagate`] on the node it
//! touched. That node refreshes its own derived state according to its
//! kind, then each parent id is resolved through the registry and the
//! parent runs the same step, up to the roots. A parent id that no longer
//! resolves is logged and skipped.
//!
//! The parent graph must be acyclic. Kind rules (meals hold ingredients,
//! adventures hold meals, ingredients hold nothing) guarantee that for
//! every public operation, so no cycle guard runs here.

use crate::edge::Edge;
use crate::error::ModelError;
use crate::id::{NodeId, NodeKind};
use crate::nutrient::{NutrientSimplex, TOLERANCE};
use crate::registry::Registry;

/// How the ratio of a newly attached child is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Share {
    /// Make room so that every child, including the new one, holds an
    /// equal share.
    Even,
    /// Attach with exactly this ratio; siblings are untouched.
    Fixed(f64),
}

impl Registry {
    // -----------------------------------------------------------------------
    // Attach / detach
    // -----------------------------------------------------------------------

    /// Attach an existing node as a child of `parent`.
    ///
    /// Validates everything before mutating: the child must exist
    /// (`NullChild`), be of the kind `parent` accepts, and not be attached
    /// already. Registers `parent` in the child's parent set, refreshes the
    /// name index and propagates.
    pub fn put_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        share: Share,
        recipe_weight: f64,
    ) -> Result<NodeId, ModelError> {
        let child_kind = self.get(child).ok_or(ModelError::NullChild(child))?.kind();
        let parent_node = self.node(parent)?;
        match parent_node.kind().child_kind() {
            Some(expected) if expected == child_kind => {}
            Some(expected) => {
                return Err(ModelError::KindMismatch {
                    id: child,
                    expected,
                    found: child_kind,
                });
            }
            None => return Err(ModelError::LeafParent(parent)),
        }
        if parent_node.has_child(child) {
            return Err(ModelError::AlreadyAttached { parent, child });
        }

        let node = self.node_mut(parent)?;
        let ratio = match share {
            Share::Even => node.give_space_for_another_entry(),
            Share::Fixed(r) => r,
        };
        node.edges.push(Edge::new(child, ratio, recipe_weight));
        if let Some(c) = self.get_mut(child) {
            c.add_parent(parent);
        }

        self.refresh_name_index(parent);
        self.propagate_from(parent);
        Ok(child)
    }

    /// Detach `child` from `parent` and grow the remaining ratios back to
    /// a sum of 1. A meal re-derives its ratios from recipe grams.
    /// Returns the removed edge.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<Edge, ModelError> {
        let node = self.node_mut(parent)?;
        let pos = node
            .edges
            .iter()
            .position(|e| e.child() == child)
            .ok_or(ModelError::ChildNotFound { parent, child })?;
        let edge = node.edges.remove(pos);
        node.scale_entries_on_removal();
        if node.kind() == NodeKind::Meal {
            node.ratios_from_recipe_weights();
        }

        if let Some(c) = self.get_mut(child) {
            c.remove_parent(parent);
        }

        self.refresh_name_index(parent);
        self.propagate_from(parent);
        Ok(edge)
    }

    /// Detach a child found through the parent's name index.
    pub fn remove_child_by_name(&mut self, parent: NodeId, name: &str) -> Result<Edge, ModelError> {
        let child = self
            .node(parent)?
            .child_by_name(name)
            .ok_or_else(|| ModelError::ChildNameNotFound {
                parent,
                name: name.to_string(),
            })?;
        self.remove_child(parent, child)
    }

    /// Point the edge for `old` at `new`, keeping ratio and recipe weight.
    /// `old` loses `parent` from its parent set and `new` gains it.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), ModelError> {
        let new_kind = self.get(new).ok_or(ModelError::NullChild(new))?.kind();
        let parent_node = self.node(parent)?;
        if !parent_node.has_child(old) {
            return Err(ModelError::ChildNotFound { parent, child: old });
        }
        if let Some(expected) = parent_node.kind().child_kind() {
            if expected != new_kind {
                return Err(ModelError::KindMismatch {
                    id: new,
                    expected,
                    found: new_kind,
                });
            }
        }
        if old != new && parent_node.has_child(new) {
            return Err(ModelError::AlreadyAttached { parent, child: new });
        }

        if let Some(edge) = self.node_mut(parent)?.edge_mut(old) {
            edge.set_child(new);
        }
        if let Some(c) = self.get_mut(old) {
            c.remove_parent(parent);
        }
        if let Some(c) = self.get_mut(new) {
            c.add_parent(parent);
        }

        self.refresh_name_index(parent);
        self.propagate_from(parent);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Edge edits
    // -----------------------------------------------------------------------

    /// Overwrite one edge's ratio. Does not rebalance siblings and does not
    /// propagate: set every sibling consistently, then call
    /// [`update_and_propagate`](Self::update_and_propagate).
    pub fn modify_ratio(&mut self, parent: NodeId, child: NodeId, ratio: f64) -> Result<(), ModelError> {
        self.node_mut(parent)?
            .edge_mut(child)
            .ok_or(ModelError::ChildNotFound { parent, child })?
            .set_ratio(ratio);
        Ok(())
    }

    /// Overwrite one edge's recipe weight. Same contract as
    /// [`modify_ratio`](Self::modify_ratio).
    pub fn modify_recipe_weight(
        &mut self,
        parent: NodeId,
        child: NodeId,
        grams: f64,
    ) -> Result<(), ModelError> {
        self.node_mut(parent)?
            .edge_mut(child)
            .ok_or(ModelError::ChildNotFound { parent, child })?
            .set_recipe_weight(grams);
        Ok(())
    }

    /// Replace every child ratio of `parent` in one step.
    ///
    /// `ratios` must name each current child exactly once with a finite,
    /// nonnegative value, and the values must sum to 1.
    pub fn set_child_ratios(
        &mut self,
        parent: NodeId,
        ratios: &[(NodeId, f64)],
    ) -> Result<(), ModelError> {
        let node = self.node(parent)?;
        for &(child, ratio) in ratios {
            if !node.has_child(child) {
                return Err(ModelError::ChildNotFound { parent, child });
            }
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(ModelError::InvalidRatio { child, ratio });
            }
        }
        for edge in node.edges() {
            let mentions = ratios.iter().filter(|(c, _)| *c == edge.child()).count();
            if mentions != 1 {
                return Err(ModelError::RatioCoverage {
                    parent,
                    child: edge.child(),
                });
            }
        }
        let sum: f64 = ratios.iter().map(|(_, r)| r).sum();
        if !ratios.is_empty() && (sum - 1.0).abs() > TOLERANCE {
            return Err(ModelError::InvalidRatioSum { parent, sum });
        }

        for &(child, ratio) in ratios {
            self.modify_ratio(parent, child, ratio)?;
        }
        self.propagate_from(parent);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Naming
    // -----------------------------------------------------------------------

    /// Rename a node. Every parent's name index is rebuilt.
    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), ModelError> {
        let node = self.node_mut(id)?;
        node.set_name_raw(name.to_string());
        let parents: Vec<NodeId> = node.parents().iter().copied().collect();
        for parent in parents {
            self.refresh_name_index(parent);
        }
        self.propagate_from(id);
        Ok(())
    }

    pub(crate) fn refresh_name_index(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let names: Vec<(String, NodeId)> = node
            .edges()
            .iter()
            .filter_map(|e| self.get(e.child()).map(|c| (c.name().to_string(), e.child())))
            .collect();
        if let Some(node) = self.get_mut(id) {
            node.rebuild_name_index(names);
        }
    }

    // -----------------------------------------------------------------------
    // Recomputation and propagation
    // -----------------------------------------------------------------------

    /// Reset the node's simplex to the ratio-weighted average of its
    /// children's simplices and recompute energy density. Children missing
    /// from the registry contribute nothing.
    pub(crate) fn recompute_nutrients_and_energy(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let inputs: Vec<(NutrientSimplex, f64)> = node
            .edges()
            .iter()
            .filter_map(|e| match self.get(e.child()) {
                Some(child) => Some((*child.nutrients(), e.ratio())),
                None => {
                    tracing::warn!(parent = %id, child = %e.child(), "child not found in registry during aggregation");
                    None
                }
            })
            .collect();
        if let Some(node) = self.get_mut(id) {
            node.aggregate_nutrients(inputs.iter().map(|(s, r)| (s, *r)));
        }
    }

    /// Recompute `id`'s derived state, then every ancestor's.
    pub fn update_and_propagate(&mut self, id: NodeId) -> Result<(), ModelError> {
        if !self.contains(id) {
            return Err(ModelError::NodeNotFound(id));
        }
        self.propagate_from(id);
        Ok(())
    }

    pub(crate) fn propagate_from(&mut self, id: NodeId) {
        let Some(kind) = self.get(id).map(|n| n.kind()) else {
            return;
        };
        tracing::debug!(node = %id, %kind, "entering update_and_propagate");

        match kind {
            NodeKind::Ingredient => self.refresh_ingredient(id),
            NodeKind::Meal => self.refresh_meal(id),
            NodeKind::Adventure => self.refresh_adventure(id),
        }

        let parents: Vec<NodeId> = self
            .get(id)
            .map(|n| n.parents().iter().copied().collect())
            .unwrap_or_default();
        for parent in parents {
            if self.contains(parent) {
                self.propagate_from(parent);
            } else {
                tracing::warn!(
                    parent = %parent,
                    child = %id,
                    "parent not found in registry during update propagation"
                );
            }
        }

        tracing::debug!(node = %id, %kind, "exiting update_and_propagate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adventure_with_meals(count: usize) -> (Registry, NodeId, Vec<NodeId>) {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Kungsleden");
        let meals = (0..count)
            .map(|i| {
                let meal = reg.create_meal(&format!("Meal {i}"));
                reg.put_child(adv, meal, Share::Even, 0.0).unwrap();
                meal
            })
            .collect();
        (reg, adv, meals)
    }

    #[test]
    fn put_child_registers_parent() {
        let (reg, adv, meals) = adventure_with_meals(1);
        let meal = reg.get(meals[0]).unwrap();
        assert!(meal.parents().contains(&adv));
        assert_eq!(reg.find_parents(meals[0]), vec![adv]);
    }

    #[test]
    fn put_child_null_child() {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Sarek");
        let ghost = NodeId::new();
        assert_eq!(
            reg.put_child(adv, ghost, Share::Even, 0.0).unwrap_err(),
            ModelError::NullChild(ghost)
        );
    }

    #[test]
    fn put_child_rejects_wrong_kind() {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Sarek");
        let oats = reg.create_ingredient("Oats");
        let err = reg.put_child(adv, oats, Share::Even, 0.0).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
        assert_eq!(reg.get(adv).unwrap().child_count(), 0);
    }

    #[test]
    fn ingredients_cannot_have_children() {
        let mut reg = Registry::new();
        let a = reg.create_ingredient("A");
        let b = reg.create_ingredient("B");
        assert_eq!(
            reg.put_child(a, b, Share::Fixed(1.0), 0.0),
            Err(ModelError::LeafParent(a))
        );
        assert_eq!(
            ModelError::LeafParent(a).to_string(),
            format!("{a} is an ingredient and cannot hold children")
        );
        assert!(reg.get(b).unwrap().parents().is_empty());
    }

    #[test]
    fn put_child_twice_rejected_without_rebalancing() {
        let (mut reg, adv, meals) = adventure_with_meals(2);
        let err = reg.put_child(adv, meals[0], Share::Even, 0.0).unwrap_err();
        assert!(matches!(err, ModelError::AlreadyAttached { .. }));
        for edge in reg.get(adv).unwrap().edges() {
            assert!((edge.ratio() - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn even_shares_after_k_children() {
        let (reg, adv, _) = adventure_with_meals(5);
        let node = reg.get(adv).unwrap();
        for edge in node.edges() {
            assert!((edge.ratio() - 0.2).abs() < 1e-9);
        }
        assert!((node.ratio_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn remove_child_restores_sum() {
        let (mut reg, adv, meals) = adventure_with_meals(3);
        let edge = reg.remove_child(adv, meals[1]).unwrap();
        assert!((edge.ratio() - 1.0 / 3.0).abs() < 1e-9);
        let node = reg.get(adv).unwrap();
        assert_eq!(node.child_count(), 2);
        assert!((node.ratio_sum() - 1.0).abs() < 1e-9);
        assert!(!reg.get(meals[1]).unwrap().parents().contains(&adv));
    }

    #[test]
    fn remove_only_child_leaves_empty_set() {
        let (mut reg, adv, meals) = adventure_with_meals(1);
        reg.remove_child(adv, meals[0]).unwrap();
        let node = reg.get(adv).unwrap();
        assert_eq!(node.child_count(), 0);
        assert_eq!(node.ratio_sum(), 0.0);
    }

    #[test]
    fn remove_missing_child() {
        let (mut reg, adv, _) = adventure_with_meals(1);
        let stranger = reg.create_meal("Stranger");
        assert_eq!(
            reg.remove_child(adv, stranger).unwrap_err(),
            ModelError::ChildNotFound { parent: adv, child: stranger }
        );
    }

    #[test]
    fn remove_by_name() {
        let (mut reg, adv, meals) = adventure_with_meals(2);
        let edge = reg.remove_child_by_name(adv, "Meal 0").unwrap();
        assert_eq!(edge.child(), meals[0]);
        assert!(matches!(
            reg.remove_child_by_name(adv, "Meal 0"),
            Err(ModelError::ChildNameNotFound { .. })
        ));
    }

    #[test]
    fn rename_refreshes_parent_index() {
        let (mut reg, adv, meals) = adventure_with_meals(1);
        reg.set_name(meals[0], "Breakfast").unwrap();
        let node = reg.get(adv).unwrap();
        assert_eq!(node.child_by_name("Breakfast"), Some(meals[0]));
        assert_eq!(node.child_by_name("Meal 0"), None);
    }

    #[test]
    fn replace_child_moves_parent_link() {
        let (mut reg, adv, meals) = adventure_with_meals(2);
        let fresh = reg.create_meal("Fresh");
        reg.replace_child(adv, meals[0], fresh).unwrap();

        let node = reg.get(adv).unwrap();
        assert!(node.has_child(fresh));
        assert!(!node.has_child(meals[0]));
        assert!((node.edge(fresh).unwrap().ratio() - 0.5).abs() < 1e-9);
        assert!(reg.get(fresh).unwrap().parents().contains(&adv));
        assert!(!reg.get(meals[0]).unwrap().parents().contains(&adv));
    }

    #[test]
    fn modify_ratio_does_not_rebalance() {
        let (mut reg, adv, meals) = adventure_with_meals(2);
        reg.modify_ratio(adv, meals[0], 0.9).unwrap();
        let node = reg.get(adv).unwrap();
        assert_eq!(node.edge(meals[0]).unwrap().ratio(), 0.9);
        assert!((node.edge(meals[1]).unwrap().ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn modify_unknown_edge() {
        let (mut reg, adv, _) = adventure_with_meals(1);
        let ghost = NodeId::new();
        assert!(matches!(
            reg.modify_recipe_weight(adv, ghost, 10.0),
            Err(ModelError::ChildNotFound { .. })
        ));
    }

    #[test]
    fn set_child_ratios_validates_sum() {
        let (mut reg, adv, meals) = adventure_with_meals(2);
        let err = reg
            .set_child_ratios(adv, &[(meals[0], 0.5), (meals[1], 0.6)])
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidRatioSum { .. }));

        let err = reg.set_child_ratios(adv, &[(meals[0], 1.0)]).unwrap_err();
        assert!(matches!(err, ModelError::RatioCoverage { .. }));

        reg.set_child_ratios(adv, &[(meals[0], 0.25), (meals[1], 0.75)])
            .unwrap();
        let node = reg.get(adv).unwrap();
        assert_eq!(node.edge(meals[1]).unwrap().ratio(), 0.75);
    }

    #[test]
    fn propagate_unknown_node() {
        let mut reg = Registry::new();
        let ghost = NodeId::new();
        assert_eq!(
            reg.update_and_propagate(ghost).unwrap_err(),
            ModelError::NodeNotFound(ghost)
        );
    }

    #[test]
    fn dangling_parent_is_skipped() {
        let (mut reg, adv, meals) = adventure_with_meals(1);
        reg.remove_node(adv).unwrap();
        assert!(reg.get(meals[0]).unwrap().parents().contains(&adv));
        assert!(reg.update_and_propagate(meals[0]).is_ok());
    }
}
