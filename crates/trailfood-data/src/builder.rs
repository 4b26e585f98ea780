//! Builds a populated registry from a [`PlanData`].
//!
//! Names are resolved in three passes: ingredients, then meals (which
//! reference ingredients), then adventures (which reference meals). Every
//! step goes through the same registry operations an API layer would call.

use crate::schema::{AdventureSpec, IngredientSpec, MealSpec, PlanData};
use std::collections::HashMap;
use trailfood_core::config::EngineConfig;
use trailfood_core::error::ModelError;
use trailfood_core::id::NodeId;
use trailfood_core::registry::Registry;

/// Errors from resolving and applying a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("unresolved {expected_kind} reference '{name}' in '{owner}'")]
    UnresolvedRef {
        owner: String,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("invalid {kind} '{name}': {source}")]
    Model {
        kind: &'static str,
        name: String,
        #[source]
        source: ModelError,
    },
}

/// A registry built from a plan, with name lookups for every node.
#[derive(Debug)]
pub struct BuiltPlan {
    pub registry: Registry,
    pub ingredients: HashMap<String, NodeId>,
    pub meals: HashMap<String, NodeId>,
    pub adventures: HashMap<String, NodeId>,
}

impl BuiltPlan {
    pub fn ingredient(&self, name: &str) -> Option<NodeId> {
        self.ingredients.get(name).copied()
    }

    pub fn meal(&self, name: &str) -> Option<NodeId> {
        self.meals.get(name).copied()
    }

    pub fn adventure(&self, name: &str) -> Option<NodeId> {
        self.adventures.get(name).copied()
    }
}

fn model_err<'a>(kind: &'static str, name: &'a str) -> impl FnOnce(ModelError) -> PlanError + 'a {
    move |source| PlanError::Model {
        kind,
        name: name.to_string(),
        source,
    }
}

fn check_duplicate(map: &HashMap<String, NodeId>, kind: &'static str, name: &str) -> Result<(), PlanError> {
    if map.contains_key(name) {
        Err(PlanError::DuplicateName {
            kind,
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn resolve(
    map: &HashMap<String, NodeId>,
    owner: &str,
    name: &str,
    expected_kind: &'static str,
) -> Result<NodeId, PlanError> {
    map.get(name).copied().ok_or_else(|| PlanError::UnresolvedRef {
        owner: owner.to_string(),
        name: name.to_string(),
        expected_kind,
    })
}

fn build_ingredient(reg: &mut Registry, spec: &IngredientSpec) -> Result<NodeId, ModelError> {
    let id = reg.create_ingredient(&spec.name);
    reg.set_measurement_unit(id, spec.unit)?;
    if let Some(w) = spec.piece_weight {
        reg.set_piece_weight(id, w)?;
    }
    if let Some(d) = spec.density {
        reg.set_density(id, d)?;
    }
    reg.set_nutrient_ratios(id, spec.nutrients.iter().map(|(k, v)| (k.as_str(), *v)))?;
    reg.normalize_ratios_and_propagate(id)?;
    Ok(id)
}

fn build_meal(
    reg: &mut Registry,
    spec: &MealSpec,
    ingredients: &HashMap<String, NodeId>,
) -> Result<NodeId, PlanError> {
    let resolved = spec
        .ingredients
        .iter()
        .map(|p| Ok((resolve(ingredients, &spec.name, p.ingredient(), "ingredient")?, p.amount())))
        .collect::<Result<Vec<_>, PlanError>>()?;

    let meal = reg.create_meal(&spec.name);
    for (ingredient, amount) in resolved {
        reg.add_ingredient(meal, ingredient)
            .and_then(|_| reg.set_ingredient_amount(meal, ingredient, amount))
            .map_err(model_err("meal", &spec.name))?;
    }
    Ok(meal)
}

fn build_adventure(
    reg: &mut Registry,
    spec: &AdventureSpec,
    meals: &HashMap<String, NodeId>,
) -> Result<NodeId, PlanError> {
    let resolved = spec
        .meals
        .iter()
        .map(|m| resolve(meals, &spec.name, m, "meal"))
        .collect::<Result<Vec<_>, PlanError>>()?;
    let ratios = spec
        .meal_ratios
        .iter()
        .map(|(m, r)| Ok((resolve(meals, &spec.name, m, "meal")?, *r)))
        .collect::<Result<Vec<_>, PlanError>>()?;

    let adv = reg.create_adventure(&spec.name);
    let apply = |reg: &mut Registry| -> Result<(), ModelError> {
        if let Some(days) = spec.days {
            reg.set_days(adv, days)?;
        }
        for member in &spec.crew {
            reg.add_crew_member(adv, &member.name, member.daily_kcal)?;
        }
        for meal in &resolved {
            reg.add_meal(adv, *meal)?;
        }
        if !ratios.is_empty() {
            reg.set_meal_ratios(adv, &ratios)?;
        }
        Ok(())
    };
    apply(reg).map_err(model_err("adventure", &spec.name))?;
    Ok(adv)
}

/// Build every ingredient, meal and adventure of `plan` into a fresh
/// registry using `config`.
pub fn build_plan(plan: &PlanData, config: EngineConfig) -> Result<BuiltPlan, PlanError> {
    let mut registry = Registry::with_config(config);
    let mut ingredients = HashMap::new();
    let mut meals = HashMap::new();
    let mut adventures = HashMap::new();

    for spec in &plan.ingredients {
        check_duplicate(&ingredients, "ingredient", &spec.name)?;
        let id = build_ingredient(&mut registry, spec).map_err(model_err("ingredient", &spec.name))?;
        ingredients.insert(spec.name.clone(), id);
    }

    for spec in &plan.meals {
        check_duplicate(&meals, "meal", &spec.name)?;
        let id = build_meal(&mut registry, spec, &ingredients)?;
        meals.insert(spec.name.clone(), id);
    }

    for spec in &plan.adventures {
        check_duplicate(&adventures, "adventure", &spec.name)?;
        let id = build_adventure(&mut registry, spec, &meals)?;
        adventures.insert(spec.name.clone(), id);
    }

    tracing::info!(
        ingredients = ingredients.len(),
        meals = meals.len(),
        adventures = adventures.len(),
        "plan built"
    );

    Ok(BuiltPlan {
        registry,
        ingredients,
        meals,
        adventures,
    })
}
