//! Plain-text summary tables for a node, as printed by the CLI.

use crate::error::ModelError;
use crate::id::{NodeId, NodeKind};
use crate::node::{Node, NodeBody};
use crate::nutrient::NutrientSimplex;
use crate::registry::Registry;
use std::fmt;

/// Borrowing summary of one node. Render it with `{}`.
#[derive(Debug, Clone, Copy)]
pub struct Summary<'a> {
    registry: &'a Registry,
    node: &'a Node,
}

impl Registry {
    pub fn summary(&self, id: NodeId) -> Result<Summary<'_>, ModelError> {
        Ok(Summary {
            registry: self,
            node: self.node(id)?,
        })
    }
}

fn write_nutrients(f: &mut fmt::Formatter<'_>, simplex: &NutrientSimplex) -> fmt::Result {
    for (nutrient, value) in simplex.iter() {
        write!(f, " | {nutrient}: {:4.1} %", value * 100.0)?;
    }
    Ok(())
}

fn write_weight(f: &mut fmt::Formatter<'_>, kg: Option<f64>) -> fmt::Result {
    match kg {
        Some(kg) => write!(f, " | calc. weight: {kg:4.2} kg"),
        None => write!(f, " | calc. weight:  n/a"),
    }
}

impl Summary<'_> {
    fn write_children(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let with_grams = self.node.kind() != NodeKind::Adventure;
        for edge in self.node.edges() {
            let Some(child) = self.registry.get(edge.child()) else {
                continue;
            };
            write!(f, "{:>10} | ratio: {:5.1} %", child.name(), edge.ratio() * 100.0)?;
            if with_grams {
                write!(f, " | weight: {:5.1} g", edge.recipe_weight())?;
            }
            write_nutrients(f, child.nutrients())?;
            writeln!(f)?;
        }

        writeln!(f)?;
        write!(
            f,
            "{:>10} | ratio: {:5.1} %",
            self.node.kind().name(),
            self.node.ratio_sum() * 100.0
        )?;
        if with_grams {
            write!(f, " | weight: {:5.1} g", self.node.recipe_weight_total())?;
        }
        write_nutrients(f, self.node.nutrients())?;
        writeln!(f)
    }

    fn write_trip(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let NodeBody::Adventure(data) = self.node.body() else {
            return Ok(());
        };

        writeln!(f, "CREW MEMBERS:")?;
        for (i, crew) in data.crew().iter().enumerate() {
            let Some(member) = self.registry.crew_member(*crew) else {
                continue;
            };
            writeln!(f, "{:>25} {}", format!("Crew member {}:", i + 1), member.name())?;
            writeln!(f, "{:>25} {:.0} KCal", "Daily KCal need:", member.daily_kcal_need())?;
        }
        writeln!(f)?;
        writeln!(f, "{:>25} {:.0} KCal", "Daily KCal need crew:", data.crew_daily_kcal_need())?;
        writeln!(f)?;

        writeln!(f, "MEALS FOR {} DAYS:", data.days())?;
        writeln!(f)?;
        for meal_edge in self.node.edges() {
            let Some(meal) = self.registry.get(meal_edge.child()) else {
                continue;
            };
            write!(f, "{:>10} | ratio: {:5.1} %", meal.name(), meal_edge.ratio() * 100.0)?;
            write_nutrients(f, meal.nutrients())?;
            write_weight(f, data.meal_weight(meal.id()))?;
            writeln!(f)?;

            for edge in meal.edges() {
                let Some(ingredient) = self.registry.get(edge.child()) else {
                    continue;
                };
                write!(f, "{:>15} | ratio: {:5.1} %", ingredient.name(), edge.ratio() * 100.0)?;
                write_nutrients(f, ingredient.nutrients())?;
                write_weight(f, data.ingredient_weight(ingredient.id()))?;
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        write!(f, "{:>10} |", "Total")?;
        write_weight(f, self.node.weight())?;
        writeln!(f)
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary of {} \"{}\":", self.node.kind(), self.node.name())?;
        writeln!(f)?;

        if self.node.kind() == NodeKind::Adventure {
            self.write_trip(f)?;
        } else {
            self.write_children(f)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Energy Density of {}: {:4.0} KCal/Kg",
            self.node.kind(),
            self.node.energy_density()
        )
    }
}
