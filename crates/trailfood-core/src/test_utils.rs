//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::id::NodeId;
use crate::nutrient::Nutrient;
use crate::registry::Registry;

// ===========================================================================
// Float comparison
// ===========================================================================

pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

// ===========================================================================
// Ingredient constructors
// ===========================================================================

/// Protein 0.2, carbs 0.5, fat 0.3: 5500 kcal/kg.
pub fn trail_mix(reg: &mut Registry) -> NodeId {
    ingredient(
        reg,
        "Trail mix",
        &[(Nutrient::Protein, 0.2), (Nutrient::Carbs, 0.5), (Nutrient::Fat, 0.3)],
    )
}

pub fn oats(reg: &mut Registry) -> NodeId {
    ingredient(
        reg,
        "Oats",
        &[
            (Nutrient::Protein, 0.13),
            (Nutrient::Fat, 0.07),
            (Nutrient::Carbs, 0.6),
            (Nutrient::Fiber, 0.1),
            (Nutrient::Water, 0.1),
        ],
    )
}

pub fn olive_oil(reg: &mut Registry) -> NodeId {
    ingredient(reg, "Olive oil", &[(Nutrient::Fat, 1.0)])
}

/// Create an ingredient with the given nutrients, normalised.
pub fn ingredient(reg: &mut Registry, name: &str, nutrients: &[(Nutrient, f64)]) -> NodeId {
    let id = reg.create_ingredient(name);
    reg.set_nutrients(id, nutrients.iter().copied())
        .expect("test nutrients must fit the simplex");
    id
}

// ===========================================================================
// Tree builders
// ===========================================================================

/// Adventure -> one meal -> trail mix, every ratio 1, with one crew member
/// needing `kcal` per day over `days`.
pub fn single_chain(reg: &mut Registry, kcal: f64, days: u32) -> (NodeId, NodeId, NodeId) {
    let adv = reg.create_adventure("Single chain");
    let meal = reg.create_meal_in(adv, "Only meal").expect("adventure exists");
    let mix = trail_mix(reg);
    reg.add_ingredient(meal, mix).expect("meal accepts ingredients");
    reg.set_ingredient_weight(meal, mix, 100.0)
        .expect("ingredient is attached");
    reg.add_crew_member(adv, "Hiker", kcal).expect("valid kcal");
    reg.set_days(adv, days).expect("days > 0");
    (adv, meal, mix)
}

/// Adventure with `meals` meals of `ingredients` ingredients each, every
/// ingredient weighed and filled with nutrients. Returns the adventure and
/// every meal id.
pub fn wide_adventure(reg: &mut Registry, meals: usize, ingredients: usize) -> (NodeId, Vec<NodeId>) {
    let adv = reg.create_adventure("Wide");
    reg.add_crew_member(adv, "Hiker", 3000.0).expect("valid kcal");
    let mut meal_ids = Vec::with_capacity(meals);
    for m in 0..meals {
        let meal = reg
            .create_meal_in(adv, &format!("Meal {m}"))
            .expect("adventure exists");
        for i in 0..ingredients {
            let id = ingredient(
                reg,
                &format!("Ingredient {m}.{i}"),
                &[(Nutrient::Carbs, 0.5), (Nutrient::Fat, 0.2), (Nutrient::Protein, 0.1)],
            );
            reg.add_ingredient(meal, id).expect("meal accepts ingredients");
            reg.set_ingredient_weight(meal, id, 10.0 + i as f64)
                .expect("ingredient is attached");
        }
        meal_ids.push(meal);
    }
    (adv, meal_ids)
}
