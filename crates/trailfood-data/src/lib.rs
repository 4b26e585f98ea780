pub mod builder;
pub mod loader;
pub mod schema;

pub use builder::{build_plan, BuiltPlan, PlanError};
pub use loader::{load_plan_dir, DataLoadError, LoadedPlan};
