use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::BinningError;
use crate::scheme::BinningScheme;

/// Built-in binning schemes that can be named in a config file.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SchemePreset {
    /// [`BinningScheme::standard`]
    Ucsc,
    /// [`BinningScheme::bam`]
    Bam,
}

/// A binning scheme as written in a TOML config file.
///
/// A config either names a `preset`, or gives all four scheme parameters:
///
/// ```toml
/// max_position = 536870911
/// level_offsets = [585, 73, 9, 1, 0]
/// shift_first = 17
/// shift_next = 3
/// ```
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct SchemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<SchemePreset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_offsets: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_first: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_next: Option<u32>,
}

#[derive(Error, Debug)]
pub enum SchemeConfigError {
    #[error(
        "Incomplete scheme config. It must set a `preset`, or all of `max_position`, `level_offsets`, `shift_first` and `shift_next`"
    )]
    IncompleteConfig,
    #[error("Scheme config sets both a `preset` and explicit scheme parameters")]
    ConflictingConfig,
    #[error(transparent)]
    Scheme(#[from] BinningError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type SchemeConfigResult<T> = std::result::Result<T, SchemeConfigError>;

impl SchemeConfig {
    /// A config naming one of the built-in schemes.
    pub fn preset(preset: SchemePreset) -> Self {
        SchemeConfig {
            preset: Some(preset),
            ..Default::default()
        }
    }

    /// Write the config as TOML.
    pub fn to_toml_string(&self) -> SchemeConfigResult<String> {
        Ok(toml::to_string(self)?)
    }

    fn has_explicit_parameters(&self) -> bool {
        self.max_position.is_some()
            || self.level_offsets.is_some()
            || self.shift_first.is_some()
            || self.shift_next.is_some()
    }
}

impl FromStr for SchemeConfig {
    type Err = SchemeConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl TryFrom<&Path> for SchemeConfig {
    type Error = SchemeConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        info!("Loading binning scheme config from {}", path.display());
        let toml_str = read_to_string(path)?;
        toml_str.parse()
    }
}

impl From<&BinningScheme> for SchemeConfig {
    fn from(scheme: &BinningScheme) -> Self {
        SchemeConfig {
            preset: None,
            max_position: Some(scheme.max_position()),
            level_offsets: Some(scheme.level_offsets().to_vec()),
            shift_first: Some(scheme.shift_first()),
            shift_next: Some(scheme.shift_next()),
        }
    }
}

impl TryFrom<SchemeConfig> for BinningScheme {
    type Error = SchemeConfigError;

    fn try_from(config: SchemeConfig) -> Result<Self, Self::Error> {
        if let Some(preset) = config.preset {
            if config.has_explicit_parameters() {
                return Err(SchemeConfigError::ConflictingConfig);
            }
            return Ok(match preset {
                SchemePreset::Ucsc => BinningScheme::standard(),
                SchemePreset::Bam => BinningScheme::bam(),
            });
        }

        match config {
            SchemeConfig {
                max_position: Some(max_position),
                level_offsets: Some(level_offsets),
                shift_first: Some(shift_first),
                shift_next: Some(shift_next),
                ..
            } => Ok(BinningScheme::new(
                max_position,
                level_offsets,
                shift_first,
                shift_next,
            )?),
            _ => Err(SchemeConfigError::IncompleteConfig),
        }
    }
}

impl BinningScheme {
    ///
    /// Load a binning scheme from a TOML config file.
    /// # Arguments
    /// * `path` - path to the config file
    /// # Returns
    /// * `BinningScheme` - the validated scheme described by the file
    ///
    pub fn from_config_file(path: &Path) -> SchemeConfigResult<Self> {
        let config = SchemeConfig::try_from(path)?;
        BinningScheme::try_from(config)
    }
}
