use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::dispatch::engine::BEST_AGENT_KEY;

/// Round to two decimal places. Exact halves go to the even cent.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Final per-agent numbers. `total_distance` and `efficiency` are already rounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    #[serde(skip)]
    pub agent: String,
    pub packages_delivered: u64,
    pub total_distance: f64,
    pub efficiency: f64,
}

/// Outcome of the delivered-count check run after aggregation. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageValidation {
    Successful,
    Mismatch { expected: usize, delivered: u64 },
}

impl PackageValidation {
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Successful)
    }
}

impl fmt::Display for PackageValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Successful => write!(f, "Package validation successful"),
            Self::Mismatch { .. } => write!(f, "WARNING: Package count mismatch!"),
        }
    }
}

/// Snapshot produced by one dispatch pass.
///
/// Serializes as a JSON object keyed by agent (in agent table order) with a
/// trailing `best_agent` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub(crate) agents: Vec<AgentSummary>,
    pub(crate) best_agent: Option<usize>,
    pub(crate) validation: PackageValidation,
}

impl Report {
    pub fn agents(&self) -> &[AgentSummary] {
        &self.agents
    }

    pub fn agent(&self, key: &str) -> Option<&AgentSummary> {
        self.agents.iter().find(|summary| summary.agent == key)
    }

    pub fn best_agent(&self) -> Option<&str> {
        self.best_agent
            .map(|slot| self.agents[slot].agent.as_str())
    }

    /// Best agent key and its rounded efficiency, as the CSV export wants them.
    pub fn best_agent_row(&self) -> Option<(&str, f64)> {
        self.best_agent.map(|slot| {
            let summary = &self.agents[slot];
            (summary.agent.as_str(), summary.efficiency)
        })
    }

    pub fn total_delivered(&self) -> u64 {
        self.agents.iter().map(|summary| summary.packages_delivered).sum()
    }

    pub fn validation(&self) -> PackageValidation {
        self.validation
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.agents.len() + 1))?;
        for summary in &self.agents {
            map.serialize_entry(&summary.agent, summary)?;
        }
        map.serialize_entry(BEST_AGENT_KEY, &self.best_agent())?;
        map.end()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "agent\tpackages_delivered\ttotal_distance\tefficiency")?;
        for summary in &self.agents {
            writeln!(
                f,
                "{}\t{}\t{:.2}\t{:.2}",
                summary.agent, summary.packages_delivered, summary.total_distance, summary.efficiency
            )?;
        }
        write!(f, "best_agent\t{}", self.best_agent().unwrap_or("-"))
    }
}
