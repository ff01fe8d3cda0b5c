//! Simulation-and-inference engine for coded distributed computing.
//!
//! Connects the external solver and evaluator collaborators with the
//! order-statistics delay model: dispatches per-configuration evaluation with
//! disk caching, aggregates batches concurrently, and infers closed-form
//! completion-time distributions from Monte Carlo samples.

mod batch;
mod cache;
mod cancel;
mod contract;
mod dispatch;
mod inference;
mod table;

pub use batch::{set_load, simulate_parameter_list, BatchOptions, LoadStrategy, PhaseDelay};
pub use cache::{cache_path, load as load_cached, store as store_cached};
pub use cancel::CancelToken;
pub use contract::{Assignment, AssignmentEvaluator, AssignmentKind, ParameterEvaluator, Solver};
pub use dispatch::{simulate, EvaluationMode, SimulateOptions};
pub use inference::{
    cdf_from_samples, delay_samples, infer_completion_cdf, DelayModel, OrderDistribution,
};
pub use table::Table;
