use std::sync::atomic::{AtomicUsize, Ordering};

use cdc_core::errors::ErrorInfo;
use cdc_core::{CdcError, SystemParameters};
use cdc_sim::{
    simulate, Assignment, AssignmentEvaluator, AssignmentKind, CancelToken, EvaluationMode,
    SimulateOptions, Solver, Table,
};

fn sample_parameters() -> SystemParameters {
    SystemParameters::new(6, 4, 120, 180, 3, 5, 5, 0.25).unwrap()
}

struct StubAssignment {
    valid: bool,
}

impl Assignment for StubAssignment {
    fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Returns an invalid assignment on every second call.
#[derive(Default)]
struct FlakySolver {
    calls: AtomicUsize,
}

impl Solver for FlakySolver {
    fn solve(
        &self,
        _parameters: &SystemParameters,
        _kind: AssignmentKind,
    ) -> Result<Box<dyn Assignment>, CdcError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubAssignment {
            valid: call % 2 == 0,
        }))
    }
}

#[derive(Default)]
struct CountingAssignmentEvaluator {
    calls: AtomicUsize,
}

impl AssignmentEvaluator for CountingAssignmentEvaluator {
    fn evaluate(
        &self,
        _parameters: &SystemParameters,
        _assignment: &dyn Assignment,
    ) -> Result<Table, CdcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Table::from_columns([("servers", vec![4.0]), ("delay", vec![1.0])])
    }
}

struct FailingSolver;

impl Solver for FailingSolver {
    fn solve(
        &self,
        _parameters: &SystemParameters,
        _kind: AssignmentKind,
    ) -> Result<Box<dyn Assignment>, CdcError> {
        Err(CdcError::Evaluation(ErrorInfo::new(
            "solver-stub",
            "no assignment found",
        )))
    }
}

#[test]
fn invalid_assignments_contribute_nothing_but_the_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let parameters = sample_parameters();
    let solver = FlakySolver::default();
    let evaluator = CountingAssignmentEvaluator::default();
    let mode = EvaluationMode::Solver {
        solver: &solver,
        evaluator: &evaluator,
        kind: AssignmentKind::Sparse,
    };
    let opts = SimulateOptions::new(dir.path(), 4);

    let table = simulate(&parameters, &mode, &opts).unwrap();
    assert_eq!(solver.calls.load(Ordering::SeqCst), 4);
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 2);
    assert_eq!(table.num_rows(), 2);
    // surviving trials keep their original indices for provenance
    assert_eq!(table.column("assignment").unwrap(), &[0.0, 2.0]);
}

#[test]
fn solver_errors_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let parameters = sample_parameters();
    let evaluator = CountingAssignmentEvaluator::default();
    let mode = EvaluationMode::Solver {
        solver: &FailingSolver,
        evaluator: &evaluator,
        kind: AssignmentKind::Sparse,
    };
    let opts = SimulateOptions::new(dir.path(), 2);
    assert!(matches!(
        simulate(&parameters, &mode, &opts),
        Err(CdcError::Evaluation(_))
    ));
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn cancellation_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let parameters = sample_parameters();
    let solver = FlakySolver::default();
    let evaluator = CountingAssignmentEvaluator::default();
    let mode = EvaluationMode::Solver {
        solver: &solver,
        evaluator: &evaluator,
        kind: AssignmentKind::Sparse,
    };
    let cancel = CancelToken::new();
    cancel.cancel();
    let opts = SimulateOptions {
        cancel,
        ..SimulateOptions::new(dir.path(), 8)
    };
    assert!(matches!(
        simulate(&parameters, &mode, &opts),
        Err(CdcError::Cancelled(_))
    ));
    assert_eq!(solver.calls.load(Ordering::SeqCst), 0);
}
