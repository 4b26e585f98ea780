use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Density assumed for volume units when an ingredient has none, in g/ml.
pub const DEFAULT_DENSITY: f64 = 1.0;

/// Errors converting between measurement units.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("unknown measurement unit: {0}")]
    UnknownUnit(String),
    #[error("unit {0} needs a piece weight to convert to grams")]
    MissingPieceWeight(MeasurementUnit),
}

/// How an ingredient amount is expressed in a recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementUnit {
    #[default]
    Gram,
    Kilogram,
    /// Counted pieces; the gram weight of one piece is set per ingredient.
    Piece,
    Teaspoon,
    Tablespoon,
    Cup,
    Milliliter,
    Liter,
}

impl MeasurementUnit {
    pub const ALL: [MeasurementUnit; 8] = [
        MeasurementUnit::Gram,
        MeasurementUnit::Kilogram,
        MeasurementUnit::Piece,
        MeasurementUnit::Teaspoon,
        MeasurementUnit::Tablespoon,
        MeasurementUnit::Cup,
        MeasurementUnit::Milliliter,
        MeasurementUnit::Liter,
    ];

    /// Grams (mass units) or millilitres (volume units) per one unit.
    /// `None` for pieces.
    pub fn standard_amount(self) -> Option<f64> {
        match self {
            MeasurementUnit::Gram => Some(1.0),
            MeasurementUnit::Kilogram => Some(1000.0),
            MeasurementUnit::Piece => None,
            MeasurementUnit::Teaspoon => Some(5.0),
            MeasurementUnit::Tablespoon => Some(15.0),
            MeasurementUnit::Cup => Some(240.0),
            MeasurementUnit::Milliliter => Some(1.0),
            MeasurementUnit::Liter => Some(1000.0),
        }
    }

    pub fn is_volume(self) -> bool {
        matches!(
            self,
            MeasurementUnit::Teaspoon
                | MeasurementUnit::Tablespoon
                | MeasurementUnit::Cup
                | MeasurementUnit::Milliliter
                | MeasurementUnit::Liter
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            MeasurementUnit::Gram | MeasurementUnit::Kilogram => "Metric weight",
            MeasurementUnit::Piece => "Custom piece weight",
            MeasurementUnit::Teaspoon => "US volume (5ml)",
            MeasurementUnit::Tablespoon => "US volume (15ml)",
            MeasurementUnit::Cup => "US volume (240ml)",
            MeasurementUnit::Milliliter | MeasurementUnit::Liter => "Metric volume",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementUnit::Gram => "gram",
            MeasurementUnit::Kilogram => "kilogram",
            MeasurementUnit::Piece => "piece",
            MeasurementUnit::Teaspoon => "teaspoon",
            MeasurementUnit::Tablespoon => "tablespoon",
            MeasurementUnit::Cup => "cup",
            MeasurementUnit::Milliliter => "milliliter",
            MeasurementUnit::Liter => "liter",
        }
    }

    /// Convert `amount` of this unit into grams.
    ///
    /// Volume units go through `density` (g/ml), falling back to
    /// [`DEFAULT_DENSITY`]. Pieces require `piece_weight`.
    pub fn to_grams(
        self,
        amount: f64,
        piece_weight: Option<f64>,
        density: Option<f64>,
    ) -> Result<f64, UnitError> {
        match self.standard_amount() {
            None => piece_weight
                .map(|w| amount * w)
                .ok_or(UnitError::MissingPieceWeight(self)),
            Some(per_unit) if self.is_volume() => {
                Ok(amount * per_unit * density.unwrap_or(DEFAULT_DENSITY))
            }
            Some(per_unit) => Ok(amount * per_unit),
        }
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "g" => Some(MeasurementUnit::Gram),
            "kg" => Some(MeasurementUnit::Kilogram),
            "pcs" => Some(MeasurementUnit::Piece),
            "tsp" => Some(MeasurementUnit::Teaspoon),
            "tbsp" => Some(MeasurementUnit::Tablespoon),
            "ml" => Some(MeasurementUnit::Milliliter),
            "l" => Some(MeasurementUnit::Liter),
            _ => None,
        };
        alias
            .or_else(|| MeasurementUnit::ALL.into_iter().find(|u| u.as_str() == wanted))
            .ok_or_else(|| UnitError::UnknownUnit(s.to_string()))
    }
}
