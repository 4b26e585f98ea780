//! Property-based tests for the Trailfood composition engine.
//!
//! Uses proptest to generate random trips and edit sequences, then verify
//! the ratio and simplex invariants hold after every step.

use proptest::prelude::*;
use trailfood_core::composition::Share;
use trailfood_core::id::NodeId;
use trailfood_core::nutrient::{Nutrient, NutrientSimplex, TOLERANCE};
use trailfood_core::registry::Registry;
use trailfood_core::test_utils::*;
use trailfood_core::validation::validate_registry;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_nutrient() -> impl Strategy<Value = Nutrient> {
    prop::sample::select(Nutrient::ALL.to_vec())
}

fn arb_batch() -> impl Strategy<Value = Vec<(Nutrient, f64)>> {
    proptest::collection::vec((arb_nutrient(), 0.0..0.6f64), 0..6)
}

/// Edit operations applied to a small trip.
#[derive(Debug, Clone)]
enum EditOp {
    AddMeal,
    RemoveMeal(usize),
    AddIngredient(usize),
    RemoveIngredient(usize, usize),
    Weigh(usize, usize, f64),
    Nutrients(usize, Vec<(Nutrient, f64)>),
    Days(u32),
    Crew(f64),
}

fn arb_edits(max_ops: usize) -> impl Strategy<Value = Vec<EditOp>> {
    proptest::collection::vec(
        prop_oneof![
            Just(EditOp::AddMeal),
            (0..8usize).prop_map(EditOp::RemoveMeal),
            (0..8usize).prop_map(EditOp::AddIngredient),
            (0..8usize, 0..8usize).prop_map(|(m, i)| EditOp::RemoveIngredient(m, i)),
            (0..8usize, 0..8usize, 1.0..500.0f64).prop_map(|(m, i, g)| EditOp::Weigh(m, i, g)),
            (0..32usize, arb_batch()).prop_map(|(i, b)| EditOp::Nutrients(i, b)),
            (1..30u32).prop_map(EditOp::Days),
            (1000.0..5000.0f64).prop_map(EditOp::Crew),
        ],
        1..=max_ops,
    )
}

fn apply(reg: &mut Registry, adv: NodeId, meals: &mut Vec<NodeId>, ingredients: &mut Vec<NodeId>, op: EditOp) {
    match op {
        EditOp::AddMeal => {
            let meal = reg.create_meal_in(adv, "Meal").unwrap();
            meals.push(meal);
        }
        EditOp::RemoveMeal(i) => {
            if !meals.is_empty() {
                let meal = meals.remove(i % meals.len());
                reg.remove_meal(adv, meal).unwrap();
            }
        }
        EditOp::AddIngredient(m) => {
            if !meals.is_empty() {
                let meal = meals[m % meals.len()];
                let id = reg.create_ingredient_in(meal, "Ingredient").unwrap();
                ingredients.push(id);
            }
        }
        EditOp::RemoveIngredient(m, i) => {
            if let Some(&meal) = meals.get(m % meals.len().max(1)) {
                let children = reg.children_by_age(meal).unwrap();
                if !children.is_empty() {
                    reg.remove_ingredient(meal, children[i % children.len()]).unwrap();
                }
            }
        }
        EditOp::Weigh(m, i, grams) => {
            if let Some(&meal) = meals.get(m % meals.len().max(1)) {
                let children = reg.children_by_age(meal).unwrap();
                if !children.is_empty() {
                    reg.set_ingredient_weight(meal, children[i % children.len()], grams)
                        .unwrap();
                }
            }
        }
        EditOp::Nutrients(i, batch) => {
            if !ingredients.is_empty() {
                let id = ingredients[i % ingredients.len()];
                // Overflowing batches are rejected; that is part of the property.
                let _ = reg.set_nutrients(id, batch);
            }
        }
        EditOp::Days(d) => reg.set_days(adv, d).unwrap(),
        EditOp::Crew(kcal) => {
            reg.add_crew_member(adv, "Crew", kcal).unwrap();
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every node keeps its ratio sum at 1 (or 0) and every simplex at <= 1
    /// through any sequence of edits.
    #[test]
    fn invariants_hold_under_edits(ops in arb_edits(40)) {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Trip");
        let mut meals = Vec::new();
        let mut ingredients = Vec::new();

        for op in ops {
            apply(&mut reg, adv, &mut meals, &mut ingredients, op);
            let violations = validate_registry(&reg, 1e-6);
            prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        }
    }

    /// A rejected batch leaves the simplex exactly as it was.
    #[test]
    fn batch_is_all_or_nothing(first in arb_batch(), second in arb_batch()) {
        let mut simplex = NutrientSimplex::new();
        let _ = simplex.set_batch_typed(first);
        let before = simplex;
        match simplex.set_batch_typed(second) {
            Ok(()) => prop_assert!(simplex.sum() <= 1.0 + TOLERANCE),
            Err(_) => prop_assert_eq!(simplex, before),
        }
    }

    /// normalize_up twice equals normalize_up once.
    #[test]
    fn normalize_is_idempotent(batch in arb_batch()) {
        let mut simplex = NutrientSimplex::new();
        let _ = simplex.set_batch_typed(batch);
        simplex.normalize_up();
        let once = simplex;
        simplex.normalize_up();
        prop_assert_eq!(simplex, once);
    }

    /// After adding the k-th evenly shared child every child holds 1/k.
    #[test]
    fn even_split(k in 1..20usize) {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Trip");
        for _ in 0..k {
            reg.create_meal_in(adv, "Meal").unwrap();
        }
        for edge in reg.get(adv).unwrap().edges() {
            prop_assert!(approx_eq(edge.ratio(), 1.0 / k as f64, 1e-9));
        }
    }

    /// Removing a freshly attached child restores the sibling ratios.
    #[test]
    fn remove_inverts_put(shares in proptest::collection::vec(0.01..1.0f64, 1..8)) {
        let mut reg = Registry::new();
        let adv = reg.create_adventure("Trip");
        let total: f64 = shares.iter().sum();
        let meals: Vec<NodeId> = shares
            .iter()
            .map(|s| {
                let meal = reg.create_meal("Meal");
                reg.put_child(adv, meal, Share::Fixed(s / total), 0.0).unwrap();
                meal
            })
            .collect();
        let before: Vec<f64> = meals
            .iter()
            .map(|m| reg.get(adv).unwrap().edge(*m).unwrap().ratio())
            .collect();

        let extra = reg.create_meal("Extra");
        reg.put_child(adv, extra, Share::Even, 0.0).unwrap();
        reg.remove_child(adv, extra).unwrap();

        for (meal, ratio) in meals.iter().zip(before) {
            let after = reg.get(adv).unwrap().edge(*meal).unwrap().ratio();
            prop_assert!(approx_eq(after, ratio, 1e-9));
        }
    }

    /// Meal ratios always equal recipe weight over total.
    #[test]
    fn meal_ratios_follow_grams(grams in proptest::collection::vec(1.0..1000.0f64, 1..10)) {
        let mut reg = Registry::new();
        let meal = reg.create_meal("Meal");
        let ids: Vec<NodeId> = grams
            .iter()
            .map(|_| reg.create_ingredient_in(meal, "Ingredient").unwrap())
            .collect();
        for (id, g) in ids.iter().zip(&grams) {
            reg.set_ingredient_weight(meal, *id, *g).unwrap();
        }
        let total: f64 = grams.iter().sum();
        let node = reg.get(meal).unwrap();
        for (id, g) in ids.iter().zip(&grams) {
            prop_assert!(approx_eq(node.edge(*id).unwrap().ratio(), g / total, 1e-12));
        }
    }
}
