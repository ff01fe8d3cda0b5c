//! Trait contracts for the external solver and evaluator collaborators.

use cdc_core::errors::CdcError;
use cdc_core::SystemParameters;
use serde::{Deserialize, Serialize};

use crate::table::Table;

/// Storage representation requested from the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssignmentKind {
    /// Sparse assignment matrix.
    #[default]
    Sparse,
    /// Dense assignment matrix.
    Dense,
}

/// A solver-produced mapping of servers to the coded rows they store.
///
/// Owned by the evaluation call that created it; the core never retains one
/// beyond the trial it was solved for.
pub trait Assignment: Send + Sync {
    /// True when every row is covered and no server exceeds its storage.
    fn is_valid(&self) -> bool;
}

/// Produces an assignment for a configuration.
pub trait Solver: Send + Sync {
    /// Solves for an assignment in the requested storage representation.
    fn solve(
        &self,
        parameters: &SystemParameters,
        kind: AssignmentKind,
    ) -> Result<Box<dyn Assignment>, CdcError>;
}

/// Scores the performance of a solved assignment.
pub trait AssignmentEvaluator: Send + Sync {
    /// Returns one or more performance sample rows for the assignment.
    fn evaluate(
        &self,
        parameters: &SystemParameters,
        assignment: &dyn Assignment,
    ) -> Result<Table, CdcError>;
}

/// Analytic baseline: scores a configuration without an assignment.
pub trait ParameterEvaluator: Send + Sync {
    /// Returns one or more performance sample rows for the configuration.
    fn evaluate(&self, parameters: &SystemParameters) -> Result<Table, CdcError>;
}
