use crate::id::CrewId;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A person on a trip. Not a composition node: no children, no ratios.
///
/// The daily energy need is supplied by the caller; how it is estimated
/// (BMR formula, activity level) lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    id: CrewId,
    name: String,
    daily_kcal_need: f64,
    created_at: DateTime<FixedOffset>,
}

impl CrewMember {
    pub(crate) fn new(
        id: CrewId,
        name: impl Into<String>,
        daily_kcal_need: f64,
        created_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            daily_kcal_need,
            created_at,
        }
    }

    pub fn id(&self) -> CrewId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn daily_kcal_need(&self) -> f64 {
        self.daily_kcal_need
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }
}
