pub mod delay;
pub mod engine;
pub mod geometry;
pub mod report;

pub use delay::{DelaySource, FixedDelay, NoDelay, UniformDelay, DELAY_MAX, DELAY_MIN};
pub use engine::{
    nearest_agent, process, validate_input, DispatchError, Package, BEST_AGENT_KEY,
};
pub use geometry::{distance, Location, LocationTable};
pub use report::{round2, AgentSummary, PackageValidation, Report};
