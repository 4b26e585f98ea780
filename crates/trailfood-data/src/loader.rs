//! Plan directories on disk.
//!
//! A plan directory holds `plan.<ext>` and optionally `config.<ext>`, where
//! `<ext>` is `ron`, `toml` or `json`. [`load_plan_dir`] finds both,
//! parses them and hands the result to the builder.

use crate::builder::{build_plan, BuiltPlan, PlanError};
use crate::schema::PlanData;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use trailfood_core::config::{ConfigError, EngineConfig};

/// Base name of the plan file inside a plan directory.
pub const PLAN_FILE: &str = "plan";
/// Base name of the optional engine config file.
pub const CONFIG_FILE: &str = "config";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no {file}.ron, {file}.toml or {file}.json in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    #[error("{file}: extension must be .ron, .toml or .json")]
    UnsupportedFormat { file: PathBuf },

    /// Both `plan.ron` and `plan.json` (say) are present; neither wins.
    #[error("ambiguous plan directory: both {a} and {b} exist")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("cannot parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("invalid config in {file}: {source}")]
    Config {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("cannot build plan from {file}: {source}")]
    Plan {
        file: PathBuf,
        #[source]
        source: PlanError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|f| Some(f.extension()) == ext)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// Lookup and parsing
// ===========================================================================

/// `dir/<base_name>.<ext>` for whichever supported extension exists.
/// `None` when there is none; an error when there is more than one.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base_name}.{}", f.extension())))
        .filter(|p| p.exists());

    match (present.next(), present.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (found, _) => Ok(found),
    }
}

pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

/// Parse `path` with the deserializer its extension names.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parsed = match format {
        Format::Ron => ron::from_str(&content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

/// Load and validate an engine config file.
pub fn load_config(path: &Path) -> Result<EngineConfig, DataLoadError> {
    let config: EngineConfig = deserialize_file(path)?;
    config.validate().map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Load a plan file and build it with `config`.
pub fn load_plan_file(path: &Path, config: EngineConfig) -> Result<BuiltPlan, DataLoadError> {
    let plan: PlanData = deserialize_file(path)?;
    tracing::debug!(file = %path.display(), "plan file parsed");
    build_plan(&plan, config).map_err(|source| DataLoadError::Plan {
        file: path.to_path_buf(),
        source,
    })
}

// ===========================================================================
// Directory loading
// ===========================================================================

/// A built plan together with the config and files it came from.
#[derive(Debug)]
pub struct LoadedPlan {
    pub plan: BuiltPlan,
    pub config: EngineConfig,
    pub plan_file: PathBuf,
    pub config_file: Option<PathBuf>,
}

/// Load `plan.{ron,toml,json}` from `dir`, using `config.{ron,toml,json}`
/// from the same directory when present and defaults otherwise.
pub fn load_plan_dir(dir: &Path) -> Result<LoadedPlan, DataLoadError> {
    let plan_file = require_data_file(dir, PLAN_FILE)?;
    let config_file = find_data_file(dir, CONFIG_FILE)?;
    let config = match &config_file {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let plan = load_plan_file(&plan_file, config.clone())?;
    Ok(LoadedPlan {
        plan,
        config,
        plan_file,
        config_file,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
