//! Schedule generator: validation, locked placement, greedy assignment,
//! local-search optimization and result assembly.

mod core;
mod metrics;
mod optimizer;
mod state;

pub use core::{ScheduleGenerator, SchedulerError, FEATURE_WARNING_SCORE_THRESHOLD};
pub use metrics::{average_capacity_utilization, compute_metrics};
pub use optimizer::{optimize_schedule, OptimizationOutcome};
pub use state::RunState;
