//! Read-only views of registry state.
//!
//! Every view is an owned copy with no references into the registry, so
//! it can be serialized or handed to rendering code directly.

use crate::adventure::AdventureData;
use crate::crew::CrewMember;
use crate::error::ModelError;
use crate::id::{CrewId, NodeId, NodeKind};
use crate::ingredient::IngredientData;
use crate::node::NodeBody;
use crate::nutrient::NutrientSimplex;
use crate::registry::Registry;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Node view
// ---------------------------------------------------------------------------

/// One child row of a [`NodeView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildView {
    pub id: NodeId,
    /// Empty when the child no longer resolves.
    pub name: String,
    pub ratio: f64,
    /// Grams; only meaningful below a meal.
    pub recipe_weight: f64,
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// Public derived state of any node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub created_at: DateTime<FixedOffset>,
    pub nutrients: NutrientSimplex,
    /// kcal/kg.
    pub energy_density: f64,
    /// kg, adventures only.
    pub weight: Option<f64>,
    /// Children, oldest first.
    pub children: Vec<ChildView>,
    pub total_ratio: f64,
    pub parents: Vec<NodeId>,
    /// Measurement data for ingredients.
    pub ingredient: Option<IngredientData>,
}

// ---------------------------------------------------------------------------
// Adventure view
// ---------------------------------------------------------------------------

/// Trip-level state on top of the generic [`NodeView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdventureView {
    pub node: NodeView,
    pub days: u32,
    pub crew: Vec<CrewMember>,
    pub crew_daily_kcal_need: f64,
    pub meal_weights: HashMap<NodeId, f64>,
    pub ingredient_weights: HashMap<NodeId, f64>,
}

impl AdventureView {
    /// Every meal and ingredient weight converted to grams.
    pub fn weight_grams(&self, id: NodeId) -> Option<f64> {
        self.meal_weights
            .get(&id)
            .or_else(|| self.ingredient_weights.get(&id))
            .map(|kg| kg * 1000.0)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Registry {
    pub fn node_view(&self, id: NodeId) -> Result<NodeView, ModelError> {
        let node = self.node(id)?;

        let mut children: Vec<ChildView> = node
            .edges()
            .iter()
            .map(|e| {
                let child = self.get(e.child());
                ChildView {
                    id: e.child(),
                    name: child.map(|c| c.name().to_string()).unwrap_or_default(),
                    ratio: e.ratio(),
                    recipe_weight: e.recipe_weight(),
                    created_at: child.map(|c| c.created_at()),
                }
            })
            .collect();
        children.sort_by_key(|c| c.created_at);

        let ingredient = match node.body() {
            NodeBody::Ingredient(data) => Some(data.clone()),
            _ => None,
        };

        Ok(NodeView {
            id,
            name: node.name().to_string(),
            kind: node.kind(),
            created_at: node.created_at(),
            nutrients: *node.nutrients(),
            energy_density: node.energy_density(),
            weight: node.weight(),
            total_ratio: node.ratio_sum(),
            children,
            parents: node.parents().iter().copied().collect(),
            ingredient,
        })
    }

    pub fn adventure_view(&self, id: NodeId) -> Result<AdventureView, ModelError> {
        let data: &AdventureData = self.adventure_data(id)?;
        let crew = data
            .crew()
            .iter()
            .filter_map(|c: &CrewId| self.crew_member(*c).cloned())
            .collect();
        Ok(AdventureView {
            node: self.node_view(id)?,
            days: data.days(),
            crew,
            crew_daily_kcal_need: data.crew_daily_kcal_need(),
            meal_weights: data.meal_weights().clone(),
            ingredient_weights: data.ingredient_weights().clone(),
        })
    }

    /// Child ids of `id`, oldest first.
    pub fn children_by_age(&self, id: NodeId) -> Result<Vec<NodeId>, ModelError> {
        Ok(self.node_view(id)?.children.into_iter().map(|c| c.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrient::Nutrient;

    #[test]
    fn node_view_lists_children_oldest_first() {
        let mut reg = Registry::new();
        let meal = reg.create_meal("Stew");
        let a = reg.create_ingredient_in(meal, "Lentils").unwrap();
        let b = reg.create_ingredient_in(meal, "Onion").unwrap();
        reg.set_ingredient_weight(meal, a, 150.0).unwrap();
        reg.set_ingredient_weight(meal, b, 50.0).unwrap();

        let view = reg.node_view(meal).unwrap();
        assert_eq!(view.kind, NodeKind::Meal);
        assert_eq!(view.children.len(), 2);
        assert_eq!(view.children[0].id, a);
        assert_eq!(view.children[0].name, "Lentils");
        assert_eq!(view.children[0].recipe_weight, 150.0);
        assert!((view.total_ratio - 1.0).abs() < 1e-12);
        assert_eq!(reg.children_by_age(meal).unwrap(), vec![a, b]);
    }

    #[test]
    fn ingredient_view_carries_measurement_data() {
        let mut reg = Registry::new();
        let honey = reg.create_ingredient("Honey");
        reg.set_density(honey, 1.4).unwrap();
        let view = reg.node_view(honey).unwrap();
        assert_eq!(view.ingredient.unwrap().density(), Some(1.4));
    }

    #[test]
    fn adventure_view_includes_crew_and_weights() {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Trip");
        let meal = reg.create_meal_in(adv, "Bars").unwrap();
        let bar = reg.create_ingredient_in(meal, "Bar").unwrap();
        reg.set_ingredient_weight(meal, bar, 60.0).unwrap();
        reg.set_nutrients(bar, [(Nutrient::Carbs, 1.0)]).unwrap();
        reg.add_crew_member(adv, "Kim", 4000.0).unwrap();

        let view = reg.adventure_view(adv).unwrap();
        assert_eq!(view.crew.len(), 1);
        assert_eq!(view.crew[0].name(), "Kim");
        assert_eq!(view.node.weight, Some(1.0));
        assert_eq!(view.weight_grams(bar), Some(1000.0));
    }

    #[test]
    fn adventure_view_rejects_meal() {
        let mut reg = Registry::new();
        let meal = reg.create_meal("Bars");
        assert!(matches!(
            reg.adventure_view(meal),
            Err(ModelError::KindMismatch { .. })
        ));
    }
}
