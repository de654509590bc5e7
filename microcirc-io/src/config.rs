//! Loader configuration.
//!
//! Mode flags are validated when the configuration is built, before any
//! file is opened: an unknown format version or repair stage never reaches
//! the readers. Verbosity is an explicit field threaded through the
//! loaders rather than an environment lookup.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Morphology file schema selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyFormat {
    /// Flat top-level `points` and 3-column `structure` tables.
    V1,
    /// Nested layout with per-stage point tables and a separate section
    /// type table.
    V2(RepairStage),
}

/// Which point variant a v2 morphology file is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairStage {
    /// Digitized points as reconstructed.
    #[default]
    Raw,
    /// Unraveled (straightened) points.
    Unraveled,
    /// Repaired (cut-corrected) points.
    Repaired,
}

impl RepairStage {
    /// Group name of the stage inside a v2 file.
    #[must_use]
    pub fn group_name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Unraveled => "unraveled",
            Self::Repaired => "repaired",
        }
    }
}

/// How much the loaders report through the `log` facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Warnings only.
    #[default]
    Quiet,
    /// Per-file progress.
    Info,
    /// Per-neuron detail.
    Debug,
}

impl Verbosity {
    /// Maximum `log` level this verbosity admits; callers hand it to their
    /// logger implementation.
    #[must_use]
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Self::Quiet => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Loader configuration with a JSON schema and full defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Morphology file schema.
    pub format: MorphologyFormat,
    /// Reporting level threaded through the loaders.
    pub verbosity: Verbosity,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            format: MorphologyFormat::V1,
            verbosity: Verbosity::Quiet,
        }
    }
}

// Intermediate structs for the JSON schema; string fields are validated
// into the enums above so unknown values fail before any file I/O.
#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonConfig {
    morphology: JsonMorphology,
    verbosity: u8,
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonMorphology {
    version: String,
    stage: String,
}

impl Default for JsonMorphology {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            stage: "raw".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns a configuration error for unknown version or stage strings,
    /// or an I/O/parse error for an unreadable file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json: JsonConfig = serde_json::from_reader(reader)
            .map_err(|e| Error::Config(format!("malformed config: {e}")))?;
        Self::from_json_config(&json)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns a configuration error for unknown version or stage strings.
    pub fn from_json(json: &str) -> Result<Self> {
        let json: JsonConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("malformed config: {e}")))?;
        Self::from_json_config(&json)
    }

    fn from_json_config(json: &JsonConfig) -> Result<Self> {
        let stage = match json.morphology.stage.as_str() {
            "raw" => RepairStage::Raw,
            "unraveled" => RepairStage::Unraveled,
            "repaired" => RepairStage::Repaired,
            other => {
                return Err(Error::Config(format!(
                    "unknown morphology repair stage '{other}'"
                )))
            }
        };

        let format = match json.morphology.version.as_str() {
            "v1" => MorphologyFormat::V1,
            "v2" => MorphologyFormat::V2(stage),
            other => {
                return Err(Error::Config(format!(
                    "unknown morphology format version '{other}'"
                )))
            }
        };

        let verbosity = match json.verbosity {
            0 => Verbosity::Quiet,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        };

        Ok(Self { format, verbosity })
    }
}
