use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use cdc_core::{CdcError, SystemParameters};
use cdc_sim::{
    cache_path, simulate, EvaluationMode, ParameterEvaluator, SimulateOptions, Table,
};

fn sample_parameters() -> SystemParameters {
    SystemParameters::new(6, 4, 120, 180, 3, 5, 5, 0.25).unwrap()
}

#[derive(Default)]
struct CountingEvaluator {
    calls: AtomicUsize,
}

impl ParameterEvaluator for CountingEvaluator {
    fn evaluate(&self, _parameters: &SystemParameters) -> Result<Table, CdcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Table::from_columns([
            ("servers", vec![4.0]),
            ("unicast_load_1", vec![10.0]),
            ("multicast_load_1", vec![2.0]),
            ("unicast_load_2", vec![12.0]),
            ("multicast_load_2", vec![0.0]),
            ("delay", vec![1.5]),
        ])
    }
}

fn tables_close(left: &Table, right: &Table) -> bool {
    left.num_rows() == right.num_rows()
        && left.column_names().all(|name| {
            match (left.column(name), right.column(name)) {
                (Some(a), Some(b)) => a
                    .iter()
                    .zip(b)
                    .all(|(x, y)| (x.is_nan() && y.is_nan()) || (x - y).abs() < 1e-9),
                _ => false,
            }
        })
}

#[test]
fn second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let parameters = sample_parameters();
    let evaluator = CountingEvaluator::default();
    let mode = EvaluationMode::Analytic {
        evaluator: &evaluator,
    };
    let opts = SimulateOptions::new(dir.path(), 3);

    let first = simulate(&parameters, &mode, &opts).unwrap();
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 3);
    assert_eq!(first.num_rows(), 3);
    assert_eq!(first.column("assignment").unwrap(), &[0.0, 1.0, 2.0]);
    // configuration fields are merged in as columns
    assert_eq!(first.column("q").unwrap(), &[4.0, 4.0, 4.0]);
    assert!(cache_path(dir.path(), &parameters).exists());

    let second = simulate(&parameters, &mode, &opts).unwrap();
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 3, "cache hit must not evaluate");
    assert!(tables_close(&first, &second));
}

#[test]
fn rerun_overwrites_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let parameters = sample_parameters();
    let evaluator = CountingEvaluator::default();
    let mode = EvaluationMode::Analytic {
        evaluator: &evaluator,
    };
    let mut opts = SimulateOptions::new(dir.path(), 2);

    simulate(&parameters, &mode, &opts).unwrap();
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 2);

    opts.rerun = true;
    simulate(&parameters, &mode, &opts).unwrap();
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 4, "rerun must re-evaluate");
}

#[test]
fn corrupt_cache_is_a_distinct_error() {
    let dir = tempfile::tempdir().unwrap();
    let parameters = sample_parameters();
    let evaluator = CountingEvaluator::default();
    let mode = EvaluationMode::Analytic {
        evaluator: &evaluator,
    };
    let opts = SimulateOptions::new(dir.path(), 2);

    simulate(&parameters, &mode, &opts).unwrap();
    fs::write(cache_path(dir.path(), &parameters), "servers,delay\n4,oops\n").unwrap();

    let result = simulate(&parameters, &mode, &opts);
    assert!(matches!(result, Err(CdcError::Cache(_))));
    // the corrupt entry must not be silently recomputed over
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("results").join("run-1");
    let parameters = sample_parameters();
    let evaluator = CountingEvaluator::default();
    let mode = EvaluationMode::Analytic {
        evaluator: &evaluator,
    };
    let opts = SimulateOptions::new(&nested, 1);

    simulate(&parameters, &mode, &opts).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn zero_samples_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let parameters = sample_parameters();
    let evaluator = CountingEvaluator::default();
    let mode = EvaluationMode::Analytic {
        evaluator: &evaluator,
    };
    let opts = SimulateOptions::new(dir.path(), 0);
    assert!(matches!(
        simulate(&parameters, &mode, &opts),
        Err(CdcError::Usage(_))
    ));
}
