//! Adventures: the root of a trip. Weight is derived from the crew's
//! energy need and trip length, then pushed down as absolute weights.

use crate::composition::Share;
use crate::crew::CrewMember;
use crate::edge::Edge;
use crate::error::ModelError;
use crate::id::{CrewId, NodeId, NodeKind};
use crate::node::NodeBody;
use crate::nutrient::TOLERANCE;
use crate::registry::Registry;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trip state carried by an adventure node.
///
/// `meal_weights` and `ingredient_weights` are rebuilt from scratch on
/// every propagation and are empty while the adventure has no weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureData {
    days: u32,
    crew: Vec<CrewId>,
    crew_daily_kcal_need: f64,
    meal_weights: HashMap<NodeId, f64>,
    ingredient_weights: HashMap<NodeId, f64>,
}

impl AdventureData {
    pub(crate) fn new(days: u32) -> Self {
        Self::with_crew(days, Vec::new())
    }

    pub(crate) fn with_crew(days: u32, crew: Vec<CrewId>) -> Self {
        Self {
            days,
            crew,
            crew_daily_kcal_need: 0.0,
            meal_weights: HashMap::new(),
            ingredient_weights: HashMap::new(),
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Crew member ids in the order they joined.
    pub fn crew(&self) -> &[CrewId] {
        &self.crew
    }

    /// Sum of every crew member's daily kcal need.
    pub fn crew_daily_kcal_need(&self) -> f64 {
        self.crew_daily_kcal_need
    }

    /// Absolute weight (kg) of each direct meal.
    pub fn meal_weights(&self) -> &HashMap<NodeId, f64> {
        &self.meal_weights
    }

    /// Absolute weight (kg) of each ingredient. An ingredient used by
    /// several meals gets the sum of its shares.
    pub fn ingredient_weights(&self) -> &HashMap<NodeId, f64> {
        &self.ingredient_weights
    }

    pub fn meal_weight(&self, meal: NodeId) -> Option<f64> {
        self.meal_weights.get(&meal).copied()
    }

    pub fn ingredient_weight(&self, ingredient: NodeId) -> Option<f64> {
        self.ingredient_weights.get(&ingredient).copied()
    }
}

/// Total trip weight in kg, or `None` while energy density is zero.
pub fn trip_weight(crew_daily_kcal_need: f64, days: u32, energy_density: f64) -> Option<f64> {
    if energy_density.abs() < TOLERANCE {
        return None;
    }
    Some(crew_daily_kcal_need * f64::from(days) / energy_density)
}

impl Registry {
    pub fn adventure_data(&self, id: NodeId) -> Result<&AdventureData, ModelError> {
        match self.node_of_kind(id, NodeKind::Adventure)?.body() {
            NodeBody::Adventure(data) => Ok(data),
            other => Err(ModelError::KindMismatch {
                id,
                expected: NodeKind::Adventure,
                found: other.kind(),
            }),
        }
    }

    fn adventure_data_mut(&mut self, id: NodeId) -> Result<&mut AdventureData, ModelError> {
        let node = self.node_mut(id)?;
        let found = node.kind();
        match &mut node.body {
            NodeBody::Adventure(data) => Ok(data),
            _ => Err(ModelError::KindMismatch {
                id,
                expected: NodeKind::Adventure,
                found,
            }),
        }
    }

    /// Attach an existing meal as an evenly weighted sibling.
    pub fn add_meal(&mut self, adventure: NodeId, meal: NodeId) -> Result<NodeId, ModelError> {
        self.node_of_kind(adventure, NodeKind::Adventure)?;
        self.put_child(adventure, meal, Share::Even, 0.0)
    }

    pub fn create_meal_in(&mut self, adventure: NodeId, name: &str) -> Result<NodeId, ModelError> {
        self.node_of_kind(adventure, NodeKind::Adventure)?;
        let meal = self.create_meal(name);
        self.add_meal(adventure, meal)
    }

    pub fn remove_meal(&mut self, adventure: NodeId, meal: NodeId) -> Result<Edge, ModelError> {
        self.node_of_kind(adventure, NodeKind::Adventure)?;
        self.remove_child(adventure, meal)
    }

    /// Assign meal shares directly. Every current meal must be named once
    /// and the shares must sum to 1.
    pub fn set_meal_ratios(&mut self, adventure: NodeId, ratios: &[(NodeId, f64)]) -> Result<(), ModelError> {
        self.node_of_kind(adventure, NodeKind::Adventure)?;
        self.set_child_ratios(adventure, ratios)
    }

    pub fn set_days(&mut self, adventure: NodeId, days: u32) -> Result<(), ModelError> {
        if days == 0 {
            return Err(ModelError::InvalidDays(days));
        }
        self.adventure_data_mut(adventure)?.days = days;
        self.propagate_from(adventure);
        Ok(())
    }

    /// Add a crew member with an externally computed daily kcal need.
    pub fn add_crew_member(
        &mut self,
        adventure: NodeId,
        name: &str,
        daily_kcal_need: f64,
    ) -> Result<CrewId, ModelError> {
        let created_at = self.config().now();
        self.restore_crew_member(adventure, CrewId::new(), name, daily_kcal_need, created_at)
    }

    /// Add a crew member under a persisted id and creation time.
    pub fn restore_crew_member(
        &mut self,
        adventure: NodeId,
        id: CrewId,
        name: &str,
        daily_kcal_need: f64,
        created_at: DateTime<FixedOffset>,
    ) -> Result<CrewId, ModelError> {
        if !daily_kcal_need.is_finite() || daily_kcal_need < 0.0 {
            return Err(ModelError::InvalidKcal {
                name: name.to_string(),
                kcal: daily_kcal_need,
            });
        }
        self.node_of_kind(adventure, NodeKind::Adventure)?;
        if self.crew_member(id).is_some() {
            return Err(ModelError::DuplicateCrewId(id));
        }

        self.insert_crew(CrewMember::new(id, name, daily_kcal_need, created_at));
        self.adventure_data_mut(adventure)?.crew.push(id);
        self.propagate_from(adventure);
        Ok(id)
    }

    /// Remove a crew member from the adventure and the registry.
    pub fn remove_crew_member(&mut self, adventure: NodeId, crew: CrewId) -> Result<CrewMember, ModelError> {
        let pos = self
            .adventure_data(adventure)?
            .crew
            .iter()
            .position(|&c| c == crew)
            .ok_or(ModelError::CrewNotFound(crew))?;
        if self.crew_member(crew).is_none() {
            return Err(ModelError::CrewNotFound(crew));
        }

        self.adventure_data_mut(adventure)?.crew.remove(pos);
        let member = self.take_crew(crew).ok_or(ModelError::CrewNotFound(crew))?;
        self.propagate_from(adventure);
        Ok(member)
    }

    /// Local refresh step for an adventure during propagation: aggregates,
    /// crew need, weight, then the top-down weight maps.
    pub(crate) fn refresh_adventure(&mut self, id: NodeId) {
        self.refresh_name_index(id);
        self.recompute_nutrients_and_energy(id);

        let Ok(data) = self.adventure_data(id) else {
            return;
        };
        let crew_need: f64 = data
            .crew()
            .iter()
            .filter_map(|c| self.crew_member(*c))
            .map(CrewMember::daily_kcal_need)
            .sum();
        let Some(node) = self.get(id) else {
            return;
        };
        let weight = trip_weight(crew_need, data.days(), node.energy_density());
        let (meal_weights, ingredient_weights) = match weight {
            Some(w) => self.distribute_weight(id, w),
            None => (HashMap::new(), HashMap::new()),
        };

        if let Some(node) = self.get_mut(id) {
            node.weight = weight;
            if let NodeBody::Adventure(data) = &mut node.body {
                data.crew_daily_kcal_need = crew_need;
                data.meal_weights = meal_weights;
                data.ingredient_weights = ingredient_weights;
            }
        }
    }

    /// Convert ratios into absolute weights for every meal and ingredient
    /// below `adventure`.
    fn distribute_weight(
        &self,
        adventure: NodeId,
        weight: f64,
    ) -> (HashMap<NodeId, f64>, HashMap<NodeId, f64>) {
        let mut meals = HashMap::new();
        let mut ingredients: HashMap<NodeId, f64> = HashMap::new();
        let Some(node) = self.get(adventure) else {
            return (meals, ingredients);
        };

        for meal_edge in node.edges() {
            let meal_weight = weight * meal_edge.ratio();
            meals.insert(meal_edge.child(), meal_weight);
            let Some(meal) = self.get(meal_edge.child()) else {
                continue;
            };
            for edge in meal.edges() {
                *ingredients.entry(edge.child()).or_default() += meal_weight * edge.ratio();
            }
        }
        (meals, ingredients)
    }
}
