//! Leaf nodes: nutrient edits, measurement data, and the combined edit
//! used when an ingredient is changed from within a meal.

use crate::error::ModelError;
use crate::id::{NodeId, NodeKind};
use crate::node::NodeBody;
use crate::nutrient::Nutrient;
use crate::registry::Registry;
use crate::unit::MeasurementUnit;
use serde::{Deserialize, Serialize};

/// Measurement data carried by an ingredient node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientData {
    unit: MeasurementUnit,
    /// Grams per piece, for [`MeasurementUnit::Piece`].
    piece_weight: Option<f64>,
    /// g/ml, for volume units.
    density: Option<f64>,
}

impl IngredientData {
    pub fn new(unit: MeasurementUnit, piece_weight: Option<f64>, density: Option<f64>) -> Self {
        Self {
            unit,
            piece_weight,
            density,
        }
    }

    pub fn unit(&self) -> MeasurementUnit {
        self.unit
    }

    pub fn piece_weight(&self) -> Option<f64> {
        self.piece_weight
    }

    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// Grams represented by `amount` of this ingredient's unit.
    pub fn amount_to_grams(&self, amount: f64) -> Result<f64, ModelError> {
        Ok(self.unit.to_grams(amount, self.piece_weight, self.density)?)
    }
}

/// A batch of changes applied to an ingredient inside one meal.
/// Fields left `None` (or empty) are not touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientEdit {
    pub nutrients: Vec<(Nutrient, f64)>,
    /// New recipe weight for this ingredient in the meal, in grams.
    pub grams: Option<f64>,
    pub unit: Option<MeasurementUnit>,
    pub piece_weight: Option<f64>,
    pub density: Option<f64>,
}

fn check_piece_weight(grams: f64) -> Result<f64, ModelError> {
    if grams.is_finite() && grams > 0.0 {
        Ok(grams)
    } else {
        Err(ModelError::InvalidPieceWeight(grams))
    }
}

fn check_density(density: f64) -> Result<f64, ModelError> {
    if density.is_finite() && density > 0.0 {
        Ok(density)
    } else {
        Err(ModelError::InvalidDensity(density))
    }
}

pub(crate) fn check_grams(child: NodeId, grams: f64) -> Result<f64, ModelError> {
    if grams.is_finite() && grams > 0.0 {
        Ok(grams)
    } else {
        Err(ModelError::InvalidWeight { child, grams })
    }
}

impl Registry {
    pub fn ingredient_data(&self, id: NodeId) -> Result<&IngredientData, ModelError> {
        match self.node_of_kind(id, NodeKind::Ingredient)?.body() {
            NodeBody::Ingredient(data) => Ok(data),
            other => Err(ModelError::KindMismatch {
                id,
                expected: NodeKind::Ingredient,
                found: other.kind(),
            }),
        }
    }

    fn ingredient_data_mut(&mut self, id: NodeId) -> Result<&mut IngredientData, ModelError> {
        let node = self.node_mut(id)?;
        let found = node.kind();
        match &mut node.body {
            NodeBody::Ingredient(data) => Ok(data),
            _ => Err(ModelError::KindMismatch {
                id,
                expected: NodeKind::Ingredient,
                found,
            }),
        }
    }

    /// Stage a batch of nutrient ratios on an ingredient.
    ///
    /// The whole batch is rejected if any key is unknown, any value is
    /// negative, or the resulting sum would exceed 1. Nothing is normalised
    /// or propagated; follow up with
    /// [`normalize_ratios_and_propagate`](Self::normalize_ratios_and_propagate).
    pub fn set_nutrient_ratios<I, K>(&mut self, id: NodeId, updates: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.node_of_kind(id, NodeKind::Ingredient)?;
        self.node_mut(id)?.nutrients.set_batch(updates)?;
        Ok(())
    }

    /// Scale the staged simplex up to a sum of 1, refresh energy density
    /// and propagate to every meal using this ingredient.
    pub fn normalize_ratios_and_propagate(&mut self, id: NodeId) -> Result<(), ModelError> {
        self.node_of_kind(id, NodeKind::Ingredient)?;
        let node = self.node_mut(id)?;
        node.nutrients.normalize_up();
        node.refresh_energy_density();
        self.propagate_from(id);
        Ok(())
    }

    /// Stage, normalise and propagate in one call.
    pub fn set_nutrients<I>(&mut self, id: NodeId, updates: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (Nutrient, f64)>,
    {
        self.node_of_kind(id, NodeKind::Ingredient)?;
        self.node_mut(id)?.nutrients.set_batch_typed(updates)?;
        self.normalize_ratios_and_propagate(id)
    }

    pub fn set_measurement_unit(&mut self, id: NodeId, unit: MeasurementUnit) -> Result<(), ModelError> {
        self.ingredient_data_mut(id)?.unit = unit;
        Ok(())
    }

    pub fn set_piece_weight(&mut self, id: NodeId, grams: f64) -> Result<(), ModelError> {
        let grams = check_piece_weight(grams)?;
        self.ingredient_data_mut(id)?.piece_weight = Some(grams);
        Ok(())
    }

    pub fn set_density(&mut self, id: NodeId, density: f64) -> Result<(), ModelError> {
        let density = check_density(density)?;
        self.ingredient_data_mut(id)?.density = Some(density);
        Ok(())
    }

    /// Apply an [`IngredientEdit`] to `ingredient` as used by `meal`.
    ///
    /// Every field is validated before anything is written. After applying,
    /// the simplex is normalised and a single propagation runs from the
    /// ingredient.
    pub fn edit_meal_ingredient(
        &mut self,
        meal: NodeId,
        ingredient: NodeId,
        edit: IngredientEdit,
    ) -> Result<(), ModelError> {
        let meal_node = self.node_of_kind(meal, NodeKind::Meal)?;
        if !meal_node.has_child(ingredient) {
            return Err(ModelError::ChildNotFound {
                parent: meal,
                child: ingredient,
            });
        }
        let node = self.node_of_kind(ingredient, NodeKind::Ingredient)?;

        let mut staged = *node.nutrients();
        staged.set_batch_typed(edit.nutrients.iter().copied())?;
        let grams = edit.grams.map(|g| check_grams(ingredient, g)).transpose()?;
        let piece_weight = edit.piece_weight.map(check_piece_weight).transpose()?;
        let density = edit.density.map(check_density).transpose()?;

        let data = self.ingredient_data_mut(ingredient)?;
        if let Some(unit) = edit.unit {
            data.unit = unit;
        }
        if piece_weight.is_some() {
            data.piece_weight = piece_weight;
        }
        if density.is_some() {
            data.density = density;
        }

        if let Some(grams) = grams {
            let meal_node = self.node_mut(meal)?;
            if let Some(edge) = meal_node.edge_mut(ingredient) {
                edge.set_recipe_weight(grams);
            }
            meal_node.ratios_from_recipe_weights();
        }

        let node = self.node_mut(ingredient)?;
        node.nutrients = staged;
        node.nutrients.normalize_up();
        node.refresh_energy_density();
        self.propagate_from(ingredient);
        Ok(())
    }

    /// Local refresh step for an ingredient during propagation.
    pub(crate) fn refresh_ingredient(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.refresh_energy_density();
        }
    }
}
