//! Meals: ratios derived from recipe grams rather than assigned directly.

use crate::composition::Share;
use crate::edge::Edge;
use crate::error::ModelError;
use crate::id::{NodeId, NodeKind};
use crate::ingredient::check_grams;
use crate::registry::Registry;

impl Registry {
    /// Attach an existing ingredient to a meal with ratio 0 and no recipe
    /// weight. Its share follows once a weight is set.
    pub fn add_ingredient(&mut self, meal: NodeId, ingredient: NodeId) -> Result<NodeId, ModelError> {
        self.node_of_kind(meal, NodeKind::Meal)?;
        self.put_child(meal, ingredient, Share::Fixed(0.0), 0.0)
    }

    /// Create a new ingredient and attach it to `meal`.
    pub fn create_ingredient_in(&mut self, meal: NodeId, name: &str) -> Result<NodeId, ModelError> {
        self.node_of_kind(meal, NodeKind::Meal)?;
        let ingredient = self.create_ingredient(name);
        self.add_ingredient(meal, ingredient)
    }

    pub fn remove_ingredient(&mut self, meal: NodeId, ingredient: NodeId) -> Result<Edge, ModelError> {
        self.node_of_kind(meal, NodeKind::Meal)?;
        self.remove_child(meal, ingredient)
    }

    /// Set the recipe weight of one ingredient, in grams, and re-derive
    /// every ratio in the meal as `weight / total`.
    pub fn set_ingredient_weight(
        &mut self,
        meal: NodeId,
        ingredient: NodeId,
        grams: f64,
    ) -> Result<(), ModelError> {
        let node = self.node_of_kind(meal, NodeKind::Meal)?;
        if !node.has_child(ingredient) {
            return Err(ModelError::ChildNotFound {
                parent: meal,
                child: ingredient,
            });
        }
        let grams = check_grams(ingredient, grams)?;

        self.modify_recipe_weight(meal, ingredient, grams)?;
        self.node_mut(meal)?.ratios_from_recipe_weights();
        self.propagate_from(meal);
        Ok(())
    }

    /// Like [`set_ingredient_weight`](Self::set_ingredient_weight) with the
    /// amount given in the ingredient's own measurement unit.
    pub fn set_ingredient_amount(
        &mut self,
        meal: NodeId,
        ingredient: NodeId,
        amount: f64,
    ) -> Result<(), ModelError> {
        let grams = self.ingredient_data(ingredient)?.amount_to_grams(amount)?;
        self.set_ingredient_weight(meal, ingredient, grams)
    }

    /// Local refresh step for a meal during propagation.
    pub(crate) fn refresh_meal(&mut self, id: NodeId) {
        self.refresh_name_index(id);
        self.recompute_nutrients_and_energy(id);
    }
}
