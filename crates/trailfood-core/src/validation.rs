//! Consistency checks over a whole registry.
//!
//! Operations keep these invariants on their own; the checks exist for
//! tests, for restored snapshots, and for callers that use the raw
//! [`Registry::remove_node`] escape hatch.

use crate::id::{NodeId, NodeKind};
use crate::registry::Registry;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    /// Child ratios of a nonempty node do not sum to 1.
    RatioSum { node: NodeId, sum: f64 },
    /// A nutrient simplex sums above 1.
    SimplexOverflow { node: NodeId, sum: f64 },
    /// An edge points at a node that is not registered.
    MissingChild { parent: NodeId, child: NodeId },
    /// A child's parent set does not list a parent that holds an edge to it.
    MissingBackRef { parent: NodeId, child: NodeId },
    /// A parent id in a parent set does not resolve.
    DanglingParent { node: NodeId, parent: NodeId },
}

impl InvariantViolation {
    pub fn node(&self) -> NodeId {
        match self {
            InvariantViolation::RatioSum { node, .. }
            | InvariantViolation::SimplexOverflow { node, .. }
            | InvariantViolation::DanglingParent { node, .. } => *node,
            InvariantViolation::MissingChild { parent, .. }
            | InvariantViolation::MissingBackRef { parent, .. } => *parent,
        }
    }
}

/// Check every node and return all violations found.
///
/// A meal whose recipe weights are all still zero may have a ratio sum of
/// 0; its ingredients have not been weighed yet.
pub fn validate_registry(registry: &Registry, tolerance: f64) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for node in registry.iter() {
        let id = node.id();

        if node.child_count() > 0 {
            let sum = node.ratio_sum();
            let unweighed = node.kind() == NodeKind::Meal && node.recipe_weight_total() <= 0.0;
            let ok = (sum - 1.0).abs() <= tolerance || (unweighed && sum.abs() <= tolerance);
            if !ok {
                violations.push(InvariantViolation::RatioSum { node: id, sum });
            }
        }

        let simplex_sum = node.nutrients().sum();
        if simplex_sum > 1.0 + tolerance {
            violations.push(InvariantViolation::SimplexOverflow {
                node: id,
                sum: simplex_sum,
            });
        }

        for edge in node.edges() {
            match registry.get(edge.child()) {
                None => violations.push(InvariantViolation::MissingChild {
                    parent: id,
                    child: edge.child(),
                }),
                Some(child) if !child.parents().contains(&id) => {
                    violations.push(InvariantViolation::MissingBackRef {
                        parent: id,
                        child: edge.child(),
                    });
                }
                Some(_) => {}
            }
        }

        for &parent in node.parents() {
            if !registry.contains(parent) {
                violations.push(InvariantViolation::DanglingParent { node: id, parent });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrient::TOLERANCE;

    #[test]
    fn fresh_tree_is_valid() {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Trip");
        let meal = reg.create_meal_in(adv, "Lunch").unwrap();
        reg.create_meal_in(adv, "Dinner").unwrap();
        let a = reg.create_ingredient_in(meal, "A").unwrap();
        reg.create_ingredient_in(meal, "B").unwrap();
        assert!(validate_registry(&reg, TOLERANCE).is_empty());

        reg.set_ingredient_weight(meal, a, 40.0).unwrap();
        assert!(validate_registry(&reg, TOLERANCE).is_empty());
    }

    #[test]
    fn raw_removal_is_reported() {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Trip");
        let meal = reg.create_meal_in(adv, "Lunch").unwrap();
        reg.remove_node(adv).unwrap();

        let found = validate_registry(&reg, TOLERANCE);
        assert_eq!(
            found,
            vec![InvariantViolation::DanglingParent {
                node: meal,
                parent: adv
            }]
        );
        assert_eq!(found[0].node(), meal);
    }

    #[test]
    fn missing_child_and_bad_sum() {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Trip");
        let a = reg.create_meal_in(adv, "A").unwrap();
        reg.create_meal_in(adv, "B").unwrap();
        reg.modify_ratio(adv, a, 0.9).unwrap();
        reg.remove_node(a).unwrap();

        let found = validate_registry(&reg, TOLERANCE);
        assert!(found.contains(&InvariantViolation::MissingChild { parent: adv, child: a }));
        assert!(found
            .iter()
            .any(|v| matches!(v, InvariantViolation::RatioSum { node, .. } if *node == adv)));
    }
}
