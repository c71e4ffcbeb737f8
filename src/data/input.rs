//! Scenario files: warehouses, agents and the ordered package list.
//! JSON by default, YAML for `.yaml`/`.yml` paths.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{
    process, validate_input, DelaySource, DispatchError, LocationTable, Package, Report,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInput {
    pub warehouses: LocationTable,
    pub agents: LocationTable,
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl DeliveryInput {
    pub fn validate(&self) -> Result<(), DispatchError> {
        validate_input(&self.warehouses, &self.agents, &self.packages)
    }

    pub fn dispatch<D: DelaySource>(&self, delay: D) -> Result<Report, DispatchError> {
        process(&self.warehouses, &self.agents, &self.packages, delay)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read input '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse input JSON '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to parse input YAML '{path}': {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
}

pub fn parse_json_input(raw: &str) -> Result<DeliveryInput, serde_json::Error> {
    serde_json::from_str(raw)
}

pub fn parse_yaml_input(raw: &str) -> Result<DeliveryInput, serde_yaml::Error> {
    serde_yaml::from_str(raw)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

pub fn load_input(path: impl AsRef<Path>) -> Result<DeliveryInput, LoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: display.clone(),
        source,
    })?;

    if is_yaml(path) {
        parse_yaml_input(&raw).map_err(|source| LoadError::Yaml {
            path: display,
            source,
        })
    } else {
        parse_json_input(&raw).map_err(|source| LoadError::Json {
            path: display,
            source,
        })
    }
}
