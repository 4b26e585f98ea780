//! Serde structs for trip plan files.
//!
//! A plan lists ingredients, meals that reference ingredients by name, and
//! adventures that reference meals by name. Plans are deserialized from
//! RON, JSON, or TOML and then built into a registry by
//! [`build_plan`](crate::builder::build_plan).

use serde::Deserialize;
use std::collections::BTreeMap;
use trailfood_core::unit::MeasurementUnit;

// ===========================================================================
// Ingredients
// ===========================================================================

/// An ingredient definition.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientSpec {
    pub name: String,
    /// Nutrient name to ratio. Normalised up to a sum of 1 when built.
    #[serde(default)]
    pub nutrients: BTreeMap<String, f64>,
    #[serde(default)]
    pub unit: MeasurementUnit,
    /// Grams per piece, for the `piece` unit.
    #[serde(default)]
    pub piece_weight: Option<f64>,
    /// g/ml, for volume units.
    #[serde(default)]
    pub density: Option<f64>,
}

// ===========================================================================
// Meals
// ===========================================================================

/// One ingredient line of a recipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortionSpec {
    /// Short form: `("oats", 80.0)`, amount in the ingredient's unit.
    Short(String, f64),
    Full { ingredient: String, amount: f64 },
}

impl PortionSpec {
    pub fn ingredient(&self) -> &str {
        match self {
            PortionSpec::Short(name, _) => name,
            PortionSpec::Full { ingredient, .. } => ingredient,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            PortionSpec::Short(_, amount) | PortionSpec::Full { amount, .. } => *amount,
        }
    }
}

/// A meal (recipe) definition.
#[derive(Debug, Clone, Deserialize)]
pub struct MealSpec {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<PortionSpec>,
}

// ===========================================================================
// Adventures
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CrewSpec {
    pub name: String,
    pub daily_kcal: f64,
}

/// A trip definition.
#[derive(Debug, Clone, Deserialize)]
pub struct AdventureSpec {
    pub name: String,
    /// Falls back to the engine's `default_days` when absent.
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub crew: Vec<CrewSpec>,
    /// Meal names; each meal gets an even share.
    #[serde(default)]
    pub meals: Vec<String>,
    /// Optional explicit meal shares by name. Must cover every meal and
    /// sum to 1.
    #[serde(default)]
    pub meal_ratios: BTreeMap<String, f64>,
}

// ===========================================================================
// Plan
// ===========================================================================

/// A complete plan file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanData {
    #[serde(default)]
    pub ingredients: Vec<IngredientSpec>,
    #[serde(default)]
    pub meals: Vec<MealSpec>,
    #[serde(default)]
    pub adventures: Vec<AdventureSpec>,
}
