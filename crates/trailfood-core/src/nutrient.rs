//! The nutrient simplex: six nonnegative ratios that sum to at most one.
//!
//! Mutation is validated up front and rejected, never clamped into place
//! by shrinking the other nutrients. Up-scaling to a full simplex is a
//! separate, explicit step ([`NutrientSimplex::normalize_up`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tolerance used for every simplex sum comparison.
pub const TOLERANCE: f64 = 1e-9;

/// Energy density of protein, in kcal per kg.
pub const PROTEIN_KCAL_PER_KG: f64 = 4000.0;
/// Energy density of carbohydrates, in kcal per kg.
pub const CARBS_KCAL_PER_KG: f64 = 4000.0;
/// Energy density of fat, in kcal per kg.
pub const FAT_KCAL_PER_KG: f64 = 9000.0;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when mutating a [`NutrientSimplex`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NutrientError {
    #[error("invalid nutrient key: {0}")]
    InvalidKey(String),
    #[error("nutrient value cannot be negative: {nutrient} = {value}")]
    NegativeValue { nutrient: Nutrient, value: f64 },
    #[error("nutrient value must be a finite number: {nutrient} = {value}")]
    NotFinite { nutrient: Nutrient, value: f64 },
    #[error("nutrient ratios would sum to {projected_sum:.6}, which exceeds 1")]
    OverflowConstraint { projected_sum: f64 },
}

// ---------------------------------------------------------------------------
// Nutrient keys
// ---------------------------------------------------------------------------

/// One of the six tracked nutrients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Protein,
    Fat,
    Carbs,
    Water,
    Fiber,
    Salt,
}

impl Nutrient {
    /// All nutrients in their fixed display order.
    pub const ALL: [Nutrient; 6] = [
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carbs,
        Nutrient::Water,
        Nutrient::Fiber,
        Nutrient::Salt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Nutrient::Protein => "protein",
            Nutrient::Fat => "fat",
            Nutrient::Carbs => "carbs",
            Nutrient::Water => "water",
            Nutrient::Fiber => "fiber",
            Nutrient::Salt => "salt",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nutrient {
    type Err = NutrientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Nutrient::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| NutrientError::InvalidKey(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// NutrientSimplex
// ---------------------------------------------------------------------------

/// Fixed-key vector of nutrient ratios. The sum of all values never
/// exceeds `1 + TOLERANCE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientSimplex {
    values: [f64; 6],
}

impl NutrientSimplex {
    /// An all-zero simplex.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        self.values[nutrient.index()]
    }

    /// Look up a nutrient by name.
    pub fn get_by_name(&self, key: &str) -> Result<f64, NutrientError> {
        Ok(self.get(key.parse()?))
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Iterate `(nutrient, ratio)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::ALL.into_iter().map(|n| (n, self.get(n)))
    }

    /// Set a single nutrient by name. See [`set`](Self::set).
    pub fn set_by_name(&mut self, key: &str, value: f64) -> Result<(), NutrientError> {
        self.set(key.parse()?, value)
    }

    /// Set a single nutrient.
    ///
    /// Fails on negative or non-finite values; values above 1 are clamped
    /// to 1. Fails with `OverflowConstraint` if the new total would exceed
    /// `1 + TOLERANCE`. Other nutrients are never touched.
    pub fn set(&mut self, nutrient: Nutrient, value: f64) -> Result<(), NutrientError> {
        let value = checked_value(nutrient, value)?;
        let old = self.get(nutrient);
        if (value - old).abs() < TOLERANCE {
            return Ok(());
        }

        let projected_sum = self.sum() - old + value;
        if projected_sum > 1.0 + TOLERANCE {
            return Err(NutrientError::OverflowConstraint { projected_sum });
        }
        self.values[nutrient.index()] = value;
        Ok(())
    }

    /// Apply several updates atomically.
    ///
    /// Every pair is validated first, then the projected total (old values
    /// of updated keys netted out) is checked. On any failure the simplex
    /// is left unchanged. Later duplicates of a key win.
    pub fn set_batch<I, K>(&mut self, updates: I) -> Result<(), NutrientError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut staged = self.values;
        for (key, value) in updates {
            let nutrient: Nutrient = key.as_ref().parse()?;
            staged[nutrient.index()] = checked_value(nutrient, value)?;
        }

        let projected_sum: f64 = staged.iter().sum();
        if projected_sum > 1.0 + TOLERANCE {
            return Err(NutrientError::OverflowConstraint { projected_sum });
        }
        self.write_unchecked(staged);
        Ok(())
    }

    /// Typed variant of [`set_batch`](Self::set_batch).
    pub fn set_batch_typed<I>(&mut self, updates: I) -> Result<(), NutrientError>
    where
        I: IntoIterator<Item = (Nutrient, f64)>,
    {
        self.set_batch(updates.into_iter().map(|(n, v)| (n.as_str(), v)))
    }

    /// Scale every value up so the sum becomes exactly 1.
    ///
    /// No-op when the sum is already within tolerance of 1, above it, or
    /// negligible. Returns `true` if the values were rescaled.
    pub fn normalize_up(&mut self) -> bool {
        let sum = self.sum();
        if (sum - 1.0).abs() < TOLERANCE || sum > 1.0 + TOLERANCE || sum < TOLERANCE {
            return false;
        }

        let scale = 1.0 / sum;
        tracing::info!(sum, scale, "normalizing nutrient simplex");
        for v in &mut self.values {
            *v *= scale;
        }
        true
    }

    /// Energy density in kcal per kg derived from protein, carbs and fat.
    pub fn energy_density(&self) -> f64 {
        self.get(Nutrient::Protein) * PROTEIN_KCAL_PER_KG
            + self.get(Nutrient::Carbs) * CARBS_KCAL_PER_KG
            + self.get(Nutrient::Fat) * FAT_KCAL_PER_KG
    }

    /// Percentage with one decimal, e.g. `"20.0%"`.
    pub fn format_percent(&self, nutrient: Nutrient) -> String {
        format!("{:.1}%", self.get(nutrient) * 100.0)
    }

    pub(crate) fn reset(&mut self) {
        self.values = [0.0; 6];
    }

    /// Accumulate `other * weight` into this simplex. Used for weighted
    /// averages over children whose own simplices already sum to <= 1.
    pub(crate) fn accumulate(&mut self, other: &NutrientSimplex, weight: f64) {
        for (v, o) in self.values.iter_mut().zip(other.values.iter()) {
            *v += o * weight;
        }
    }

    /// Restore raw values from persisted state. Validates the sum.
    pub(crate) fn from_values(values: [f64; 6]) -> Result<Self, NutrientError> {
        let mut simplex = Self::new();
        simplex.set_batch_typed(Nutrient::ALL.into_iter().zip(values))?;
        Ok(simplex)
    }

    pub(crate) fn values(&self) -> [f64; 6] {
        self.values
    }

    fn write_unchecked(&mut self, values: [f64; 6]) {
        self.values = values;
    }
}

fn checked_value(nutrient: Nutrient, value: f64) -> Result<f64, NutrientError> {
    if !value.is_finite() {
        return Err(NutrientError::NotFinite { nutrient, value });
    }
    if value < 0.0 {
        return Err(NutrientError::NegativeValue { nutrient, value });
    }
    Ok(value.min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn new_simplex_is_zero() {
        let s = NutrientSimplex::new();
        assert_eq!(s.sum(), 0.0);
        for (_, v) in s.iter() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn parse_nutrient_names() {
        assert_eq!("protein".parse::<Nutrient>().unwrap(), Nutrient::Protein);
        assert_eq!("Carbs".parse::<Nutrient>().unwrap(), Nutrient::Carbs);
        match "sugar".parse::<Nutrient>() {
            Err(NutrientError::InvalidKey(k)) => assert_eq!(k, "sugar"),
            other => panic!("expected InvalidKey, got {other:?}"),
        }
    }

    #[test]
    fn set_and_get() {
        let mut s = NutrientSimplex::new();
        s.set(Nutrient::Protein, 0.25).unwrap();
        s.set_by_name("fat", 0.5).unwrap();
        assert!(approx(s.get(Nutrient::Protein), 0.25));
        assert!(approx(s.get_by_name("fat").unwrap(), 0.5));
        assert!(approx(s.sum(), 0.75));
    }

    #[test]
    fn set_rejects_invalid_key() {
        let mut s = NutrientSimplex::new();
        assert!(matches!(
            s.set_by_name("sugar", 0.1),
            Err(NutrientError::InvalidKey(_))
        ));
    }

    #[test]
    fn set_rejects_negative() {
        let mut s = NutrientSimplex::new();
        let err = s.set(Nutrient::Salt, -0.1).unwrap_err();
        assert!(matches!(err, NutrientError::NegativeValue { nutrient: Nutrient::Salt, .. }));
        assert_eq!(s.sum(), 0.0);
    }

    #[test]
    fn set_rejects_nan() {
        let mut s = NutrientSimplex::new();
        assert!(matches!(
            s.set(Nutrient::Water, f64::NAN),
            Err(NutrientError::NotFinite { .. })
        ));
    }

    #[test]
    fn set_clamps_to_one() {
        let mut s = NutrientSimplex::new();
        s.set(Nutrient::Water, 3.0).unwrap();
        assert!(approx(s.get(Nutrient::Water), 1.0));
    }

    #[test]
    fn set_overflow_does_not_steal_from_siblings() {
        let mut s = NutrientSimplex::new();
        s.set(Nutrient::Protein, 0.6).unwrap();
        s.set(Nutrient::Fat, 0.4).unwrap();
        let err = s.set(Nutrient::Carbs, 0.1).unwrap_err();
        assert!(matches!(err, NutrientError::OverflowConstraint { .. }));
        assert!(approx(s.get(Nutrient::Protein), 0.6));
        assert!(approx(s.get(Nutrient::Fat), 0.4));
        assert_eq!(s.get(Nutrient::Carbs), 0.0);
    }

    #[test]
    fn set_replacing_own_value_nets_out_old() {
        let mut s = NutrientSimplex::new();
        s.set(Nutrient::Protein, 0.9).unwrap();
        // 0.9 -> 1.0 only adds 0.1, still within budget.
        s.set(Nutrient::Protein, 1.0).unwrap();
        assert!(approx(s.sum(), 1.0));
    }

    #[test]
    fn batch_overflow_is_atomic() {
        let mut s = NutrientSimplex::new();
        s.set_batch([("protein", 0.6), ("fat", 0.4)]).unwrap();
        let err = s.set_batch([("carbs", 0.1)]).unwrap_err();
        match err {
            NutrientError::OverflowConstraint { projected_sum } => {
                assert!(approx(projected_sum, 1.1));
            }
            other => panic!("expected OverflowConstraint, got {other:?}"),
        }
        assert!(approx(s.get(Nutrient::Protein), 0.6));
        assert!(approx(s.get(Nutrient::Fat), 0.4));
    }

    #[test]
    fn batch_nets_out_replaced_values() {
        let mut s = NutrientSimplex::new();
        s.set_batch([("protein", 0.6), ("fat", 0.4)]).unwrap();
        // Lowering protein makes room for carbs within the same batch.
        s.set_batch([("protein", 0.3), ("carbs", 0.3)]).unwrap();
        assert!(approx(s.get(Nutrient::Protein), 0.3));
        assert!(approx(s.get(Nutrient::Carbs), 0.3));
        assert!(approx(s.sum(), 1.0));
    }

    #[test]
    fn batch_invalid_key_leaves_state() {
        let mut s = NutrientSimplex::new();
        s.set(Nutrient::Fiber, 0.2).unwrap();
        let err = s.set_batch([("fiber", 0.1), ("sugar", 0.1)]).unwrap_err();
        assert!(matches!(err, NutrientError::InvalidKey(_)));
        assert!(approx(s.get(Nutrient::Fiber), 0.2));
    }

    #[test]
    fn batch_negative_leaves_state() {
        let mut s = NutrientSimplex::new();
        let err = s.set_batch([("fat", 0.2), ("salt", -0.01)]).unwrap_err();
        assert!(matches!(err, NutrientError::NegativeValue { .. }));
        assert_eq!(s.sum(), 0.0);
    }

    #[test]
    fn normalize_scales_up() {
        let mut s = NutrientSimplex::new();
        s.set_batch([("protein", 0.1), ("carbs", 0.3)]).unwrap();
        assert!(s.normalize_up());
        assert!(approx(s.sum(), 1.0));
        assert!(approx(s.get(Nutrient::Protein), 0.25));
        assert!(approx(s.get(Nutrient::Carbs), 0.75));
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut s = NutrientSimplex::new();
        s.set_batch([("fat", 0.2), ("water", 0.2)]).unwrap();
        s.normalize_up();
        let once = s;
        assert!(!s.normalize_up());
        assert_eq!(s, once);
    }

    #[test]
    fn normalize_ignores_empty_simplex() {
        let mut s = NutrientSimplex::new();
        assert!(!s.normalize_up());
        assert_eq!(s.sum(), 0.0);
    }

    #[test]
    fn energy_density_from_macros() {
        let mut s = NutrientSimplex::new();
        s.set_batch([("protein", 0.2), ("carbs", 0.5), ("fat", 0.3)])
            .unwrap();
        assert!(approx(s.energy_density(), 5500.0));
    }

    #[test]
    fn format_percent_one_decimal() {
        let mut s = NutrientSimplex::new();
        s.set(Nutrient::Protein, 0.2).unwrap();
        assert_eq!(s.format_percent(Nutrient::Protein), "20.0%");
        assert_eq!(s.format_percent(Nutrient::Salt), "0.0%");
    }

    #[test]
    fn from_values_rejects_overflow() {
        let err = NutrientSimplex::from_values([0.5, 0.5, 0.5, 0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, NutrientError::OverflowConstraint { .. }));
    }

    #[test]
    fn error_messages_carry_context() {
        let msg = NutrientError::NegativeValue {
            nutrient: Nutrient::Fat,
            value: -1.0,
        }
        .to_string();
        assert!(msg.contains("fat"), "got: {msg}");
        assert!(msg.contains("-1"), "got: {msg}");
    }
}
