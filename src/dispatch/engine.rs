//! Nearest-agent assignment and per-agent aggregation.
//!
//! One pass over the packages in input order: each package goes to the agent
//! closest to its warehouse (first agent wins on ties), and that agent's
//! running totals grow by the delivery distance plus one delay term. Totals
//! stay at full precision until `finalize` rounds them into a [`Report`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatch::delay::DelaySource;
use crate::dispatch::geometry::{distance, Location, LocationTable};
use crate::dispatch::report::{round2, AgentSummary, PackageValidation, Report};

/// A package waiting at a warehouse, bound for `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub warehouse: String,
    pub destination: Location,
}

impl Package {
    pub fn new(warehouse: impl Into<String>, destination: Location) -> Self {
        Self {
            warehouse: warehouse.into(),
            destination,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("no agents available to assign packages to")]
    NoAgents,
    #[error("package #{package_index} references unknown warehouse '{warehouse}'")]
    UnknownWarehouse {
        package_index: usize,
        warehouse: String,
    },
    #[error("{entity} '{key}' has a non-finite location")]
    NonFiniteLocation { entity: &'static str, key: String },
    #[error("agent key '{0}' is reserved for the report's best agent entry")]
    ReservedAgentKey(String),
    #[error("package #{package_index}: no agent can reach warehouse '{warehouse}'")]
    UnreachableWarehouse {
        package_index: usize,
        warehouse: String,
    },
}

/// Report key holding the best agent; no agent may use it.
pub const BEST_AGENT_KEY: &str = "best_agent";

fn is_finite(location: Location) -> bool {
    location.x.is_finite() && location.y.is_finite()
}

fn check_finite(entity: &'static str, table: &LocationTable) -> Result<(), DispatchError> {
    match table.iter().find(|(_, location)| !is_finite(*location)) {
        Some((key, _)) => Err(DispatchError::NonFiniteLocation {
            entity,
            key: key.to_string(),
        }),
        None => Ok(()),
    }
}

/// Running totals for one agent during the pass.
#[derive(Debug, Clone, Copy, Default)]
struct AgentTally {
    packages_delivered: u64,
    total_distance: f64,
}

/// Checks that a pass over these inputs can run to completion.
///
/// Nothing is mutated, so a failing input never yields a partial report.
pub fn validate_input(
    warehouses: &LocationTable,
    agents: &LocationTable,
    packages: &[Package],
) -> Result<(), DispatchError> {
    if agents.is_empty() {
        return Err(DispatchError::NoAgents);
    }
    if agents.contains_key(BEST_AGENT_KEY) {
        return Err(DispatchError::ReservedAgentKey(BEST_AGENT_KEY.to_string()));
    }
    check_finite("agent", agents)?;
    check_finite("warehouse", warehouses)?;
    if let Some((package_index, package)) = packages
        .iter()
        .enumerate()
        .find(|(_, package)| !warehouses.contains_key(&package.warehouse))
    {
        return Err(DispatchError::UnknownWarehouse {
            package_index,
            warehouse: package.warehouse.clone(),
        });
    }
    if let Some(package_index) = packages
        .iter()
        .position(|package| !is_finite(package.destination))
    {
        return Err(DispatchError::NonFiniteLocation {
            entity: "package",
            key: format!("#{package_index}"),
        });
    }
    Ok(())
}

/// Index and distance of the agent closest to `target`.
///
/// Strict `<` against a running minimum that starts at infinity: the first
/// agent wins ties, and NaN or infinite distances never win. `None` when no
/// agent has a finite distance.
pub fn nearest_agent(agents: &LocationTable, target: Location) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (slot, (_, location)) in agents.iter().enumerate() {
        let dist = distance(location, target);
        if dist < best.map_or(f64::INFINITY, |(_, min_dist)| min_dist) {
            best = Some((slot, dist));
        }
    }
    best
}

/// Assigns every package to its nearest agent and builds the report.
pub fn process<D: DelaySource>(
    warehouses: &LocationTable,
    agents: &LocationTable,
    packages: &[Package],
    mut delay: D,
) -> Result<Report, DispatchError> {
    validate_input(warehouses, agents, packages)?;

    let agent_locations: Vec<(&str, Location)> = agents.iter().collect();
    let mut tallies = vec![AgentTally::default(); agent_locations.len()];

    for (package_index, package) in packages.iter().enumerate() {
        let warehouse_location =
            warehouses
                .get(&package.warehouse)
                .ok_or_else(|| DispatchError::UnknownWarehouse {
                    package_index,
                    warehouse: package.warehouse.clone(),
                })?;
        let (slot, to_warehouse) = nearest_agent(agents, warehouse_location).ok_or_else(|| {
            DispatchError::UnreachableWarehouse {
                package_index,
                warehouse: package.warehouse.clone(),
            }
        })?;

        let to_destination = distance(warehouse_location, package.destination);
        let delivery_distance = to_warehouse + to_destination + delay.next_delay();

        let tally = &mut tallies[slot];
        tally.packages_delivered += 1;
        tally.total_distance += delivery_distance;

        debug!(
            package = package_index,
            warehouse = %package.warehouse,
            agent = agent_locations[slot].0,
            distance = delivery_distance,
            "package assigned"
        );
    }

    let report = finalize(&agent_locations, &tallies, packages.len());
    info!(
        packages = packages.len(),
        agents = agent_locations.len(),
        best_agent = report.best_agent().unwrap_or("none"),
        "dispatch pass complete"
    );
    Ok(report)
}

fn finalize(agents: &[(&str, Location)], tallies: &[AgentTally], expected: usize) -> Report {
    let delivered: u64 = tallies.iter().map(|tally| tally.packages_delivered).sum();
    let validation = if delivered == expected as u64 {
        PackageValidation::Successful
    } else {
        warn!(expected, delivered, "package count mismatch");
        PackageValidation::Mismatch {
            expected,
            delivered,
        }
    };

    let mut best_agent: Option<(usize, f64)> = None;
    let mut summaries = Vec::with_capacity(agents.len());

    for (slot, ((key, _), tally)) in agents.iter().zip(tallies).enumerate() {
        let efficiency = if tally.packages_delivered > 0 {
            tally.total_distance / tally.packages_delivered as f64
        } else {
            0.0
        };

        // Idle agents are never the best agent; their zero efficiency is a placeholder.
        if tally.packages_delivered > 0 {
            if efficiency < best_agent.map_or(f64::INFINITY, |(_, best)| best) {
                best_agent = Some((slot, efficiency));
            }
        }

        summaries.push(AgentSummary {
            agent: (*key).to_string(),
            packages_delivered: tally.packages_delivered,
            total_distance: round2(tally.total_distance),
            efficiency: round2(efficiency),
        });
    }

    Report {
        agents: summaries,
        best_agent: best_agent.map(|(slot, _)| slot),
        validation,
    }
}
