//! Trailfood Core -- the composition engine for trip food planning.
//!
//! A trip ([`NodeKind::Adventure`](id::NodeKind)) holds meals, a meal holds
//! ingredients. Every node carries a nutrient simplex and every edge carries
//! the child's share (ratio) of its parent. This crate keeps the hierarchy
//! consistent under edits: sibling ratios sum to 1, aggregates are
//! recomputed bottom-up, and absolute weights flow top-down from the trip.
//!
//! # Edit Pipeline
//!
//! Every mutating call on [`registry::Registry`] runs to completion before
//! returning:
//!
//! 1. **Validate** -- every argument is checked; failures leave state untouched.
//! 2. **Apply** -- the local edit (edge table, simplex, crew, days).
//! 3. **Refresh** -- the node recomputes its own derived state by kind.
//! 4. **Propagate** -- each parent id is resolved and refreshed in turn, up
//!    to the roots. Dangling parent ids are logged and skipped.
//! 5. **Distribute** -- an adventure turns its weight into per-meal and
//!    per-ingredient weights as part of its refresh.
//!
//! ```rust,ignore
//! let mut reg = Registry::new();
//! let trip = reg.create_adventure("Kungsleden");
//! let lunch = reg.create_meal_in(trip, "Lunch")?;
//! let nuts = reg.create_ingredient_in(lunch, "Nuts")?;
//! reg.set_ingredient_weight(lunch, nuts, 120.0)?;
//! reg.set_nutrients(nuts, [(Nutrient::Fat, 0.5), (Nutrient::Protein, 0.2)])?;
//! reg.add_crew_member(trip, "Robin", 2800.0)?;
//! reg.set_days(trip, 5)?;
//! ```
//!
//! # Key Types
//!
//! - [`registry::Registry`] -- Arena owning every node and crew member.
//! - [`node::Node`] -- Edge table plus derived nutrients, energy density, weight.
//! - [`nutrient::NutrientSimplex`] -- Six nutrient ratios summing to at most 1.
//! - [`edge::Edge`] -- Child id, ratio and recipe weight.
//! - [`composition::Share`] -- How a new child's ratio is chosen.
//! - [`query::NodeView`] -- Owned read-back views.
//! - [`serialize`] -- Versioned binary snapshots via bitcode.

pub mod adventure;
pub mod composition;
pub mod config;
pub mod crew;
pub mod edge;
pub mod error;
pub mod id;
pub mod ingredient;
pub mod meal;
pub mod node;
pub mod nutrient;
pub mod query;
pub mod registry;
pub mod report;
pub mod serialize;
pub mod unit;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
