//! Evaluation dispatcher: cache-first simulation of one configuration.

use std::fs;
use std::path::PathBuf;

use cdc_core::errors::{CdcError, ErrorInfo};
use cdc_core::SystemParameters;

use crate::cache;
use crate::cancel::CancelToken;
use crate::contract::{AssignmentEvaluator, AssignmentKind, ParameterEvaluator, Solver};
use crate::table::Table;

/// How a configuration is evaluated. The two strategies are mutually
/// exclusive by construction.
pub enum EvaluationMode<'a> {
    /// Solve for an assignment each trial and score it.
    Solver {
        /// Assignment solver.
        solver: &'a dyn Solver,
        /// Scores the solved assignments.
        evaluator: &'a dyn AssignmentEvaluator,
        /// Storage representation requested from the solver.
        kind: AssignmentKind,
    },
    /// Score the configuration directly with an analytic model.
    Analytic {
        /// Scores the configuration without an assignment.
        evaluator: &'a dyn ParameterEvaluator,
    },
}

/// Options for [`simulate`].
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Directory holding the result cache, created if absent.
    pub directory: PathBuf,
    /// Re-run and overwrite even when a cached table exists.
    pub rerun: bool,
    /// Number of trials to simulate.
    pub samples: usize,
    /// Cooperative cancellation handle.
    pub cancel: CancelToken,
}

impl SimulateOptions {
    /// Options with caching enabled and no cancellation.
    pub fn new(directory: impl Into<PathBuf>, samples: usize) -> Self {
        Self {
            directory: directory.into(),
            rerun: false,
            samples,
            cancel: CancelToken::new(),
        }
    }
}

/// Simulates one configuration, caching the result on disk.
///
/// Cache-first: with `rerun` unset and a readable entry under the
/// configuration's identifier, the cached table is returned without invoking
/// the solver or evaluator. A missing entry falls through to a fresh run; a
/// corrupt or unreadable one is an error. Fresh results are always written
/// back before returning, and the configuration's fields are merged in as
/// columns on every return path.
///
/// An invalid assignment is a per-trial condition: the trial is logged and
/// contributes no rows, and the run continues.
pub fn simulate(
    parameters: &SystemParameters,
    mode: &EvaluationMode<'_>,
    opts: &SimulateOptions,
) -> Result<Table, CdcError> {
    if opts.samples == 0 {
        return Err(CdcError::Usage(ErrorInfo::new(
            "samples-zero",
            "at least one sample is required",
        )));
    }
    let identifier = parameters.identifier();
    tracing::info!(
        directory = %opts.directory.display(),
        identifier = %identifier,
        "running simulations"
    );
    fs::create_dir_all(&opts.directory).map_err(|err| {
        CdcError::Cache(
            ErrorInfo::new("cache-dir", "failed to create results directory")
                .with_context("path", opts.directory.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let path = cache::cache_path(&opts.directory, parameters);

    if !opts.rerun {
        if let Some(mut table) = cache::load(&path)? {
            tracing::debug!(identifier = %identifier, "returning cached result");
            attach_parameters(&mut table, parameters);
            return Ok(table);
        }
    }

    let mut table = Table::new();
    for trial in 0..opts.samples {
        opts.cancel.check("simulate")?;
        let mut rows = match mode {
            EvaluationMode::Solver {
                solver,
                evaluator,
                kind,
            } => {
                let assignment = solver.solve(parameters, *kind)?;
                if !assignment.is_valid() {
                    tracing::error!(
                        identifier = %identifier,
                        trial,
                        "assignment invalid, trial contributes no samples"
                    );
                    continue;
                }
                evaluator.evaluate(parameters, assignment.as_ref())?
            }
            EvaluationMode::Analytic { evaluator } => evaluator.evaluate(parameters)?,
        };
        rows.set_scalar("assignment", trial as f64);
        table.vstack(&rows);
    }

    cache::store(&path, &table)?;
    attach_parameters(&mut table, parameters);
    Ok(table)
}

fn attach_parameters(table: &mut Table, parameters: &SystemParameters) {
    for (name, value) in parameters.to_columns() {
        table.set_scalar(name, value);
    }
}
