use cdc_complexity::{map_complexity_uncoded, CostModel};
use cdc_core::{CdcError, SystemParameters};
use cdc_sim::{
    set_load, simulate, simulate_parameter_list, BatchOptions, EvaluationMode, LoadStrategy,
    ParameterEvaluator, PhaseDelay, SimulateOptions, Table,
};
use cdc_stats::order_mean_shiftexp;

fn sample_parameters() -> SystemParameters {
    SystemParameters::new(6, 4, 120, 180, 3, 5, 5, 0.25).unwrap()
}

/// Analytic baseline stub returning one fixed performance row.
struct FixedEvaluator;

impl ParameterEvaluator for FixedEvaluator {
    fn evaluate(&self, _parameters: &SystemParameters) -> Result<Table, CdcError> {
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

fn run_batch(
    encode: &PhaseDelay<'_>,
    reduce: &PhaseDelay<'_>,
    opts: &BatchOptions,
) -> Result<Table, CdcError> {
    let dir = tempfile::tempdir().unwrap();
    let parameter_list = vec![sample_parameters()];
    let evaluator = FixedEvaluator;
    let mode = EvaluationMode::Analytic {
        evaluator: &evaluator,
    };
    let sim_opts = SimulateOptions::new(dir.path(), 3);
    let cost = CostModel::default();
    let map_complexity =
        move |parameters: &SystemParameters| map_complexity_uncoded(&cost, parameters);
    simulate_parameter_list(
        &parameter_list,
        |parameters: &SystemParameters| simulate(parameters, &mode, &sim_opts),
        &map_complexity,
        encode,
        reduce,
        opts,
    )
}

#[test]
fn analytic_baseline_aggregates_end_to_end() {
    let table = run_batch(
        &PhaseDelay::Zero,
        &PhaseDelay::Zero,
        &BatchOptions::default(),
    )
    .unwrap();
    assert_eq!(table.num_rows(), 1);
    // best-of-strategies load: min(10 + 2, 12 + 0)
    assert_eq!(table.column("load").unwrap(), &[12.0]);
    // uncoded map complexity is 20 rows * 3 columns * 5 outputs = 300
    assert_eq!(table.column("delay").unwrap(), &[1.5 * 300.0]);
    assert_eq!(table.column("encode").unwrap(), &[0.0]);
    assert_eq!(table.column("reduce").unwrap(), &[0.0]);
    assert_eq!(table.column("overall_delay").unwrap(), &[1.5 * 300.0]);
}

#[test]
fn computed_phase_delays_are_added_to_the_overall_delay() {
    let encode_fun = |_: &SystemParameters| 7.0;
    let reduce_fun = |_: &SystemParameters| 11.0;
    let table = run_batch(
        &PhaseDelay::Compute(&encode_fun),
        &PhaseDelay::Compute(&reduce_fun),
        &BatchOptions::default(),
    )
    .unwrap();
    assert_eq!(table.column("encode").unwrap(), &[7.0]);
    assert_eq!(table.column("reduce").unwrap(), &[11.0]);
    assert_eq!(table.column("overall_delay").unwrap(), &[450.0 + 7.0 + 11.0]);
}

#[test]
fn missing_phase_column_fails_with_a_descriptive_error() {
    let result = run_batch(
        &PhaseDelay::FromSamples,
        &PhaseDelay::Zero,
        &BatchOptions::default(),
    );
    match result {
        Err(CdcError::Usage(info)) => {
            assert_eq!(info.context.get("column").map(String::as_str), Some("encode"));
        }
        other => panic!("expected a usage error, got {other:?}"),
    }
}

#[test]
fn tail_scale_recomputes_the_map_delay_analytically() {
    let opts = BatchOptions {
        tail_scale: Some(0.5),
        ..BatchOptions::default()
    };
    let table = run_batch(&PhaseDelay::Zero, &PhaseDelay::Zero, &opts).unwrap();
    // every sample waited for 4 of 6 servers at 300 units of map complexity
    let expected = order_mean_shiftexp(6, 4, 300.0, Some(0.5)).unwrap();
    let delay = table.column("delay").unwrap()[0];
    assert!((delay - expected).abs() < 1e-9, "delay {delay} vs {expected}");
    assert_eq!(table.column("overall_delay").unwrap(), &[delay]);
}

#[test]
fn load_strategies_can_be_pinned() {
    let mut table = Table::from_columns([
        ("unicast_load_1", vec![10.0]),
        ("multicast_load_1", vec![5.0]),
        ("unicast_load_2", vec![9.0]),
        ("multicast_load_2", vec![2.0]),
    ])
    .unwrap();
    set_load(&mut table, LoadStrategy::L1).unwrap();
    assert_eq!(table.column("load").unwrap(), &[15.0]);

    let mut table = Table::from_columns([
        ("unicast_load_1", vec![10.0]),
        ("multicast_load_1", vec![5.0]),
        ("unicast_load_2", vec![9.0]),
        ("multicast_load_2", vec![2.0]),
    ])
    .unwrap();
    set_load(&mut table, LoadStrategy::L2).unwrap();
    assert_eq!(table.column("load").unwrap(), &[11.0]);

    let mut table = Table::from_columns([
        ("unicast_load_1", vec![10.0]),
        ("multicast_load_1", vec![5.0]),
        ("unicast_load_2", vec![9.0]),
        ("multicast_load_2", vec![2.0]),
    ])
    .unwrap();
    set_load(&mut table, LoadStrategy::Best).unwrap();
    assert_eq!(table.column("load").unwrap(), &[11.0]);
}

#[test]
fn precomputed_load_columns_are_preserved() {
    let mut table = Table::from_columns([("load", vec![3.5])]).unwrap();
    set_load(&mut table, LoadStrategy::Best).unwrap();
    assert_eq!(table.column("load").unwrap(), &[3.5]);
}

#[test]
fn load_requires_the_strategy_columns() {
    let mut table = Table::from_columns([("delay", vec![1.0])]).unwrap();
    assert!(matches!(
        set_load(&mut table, LoadStrategy::Best),
        Err(CdcError::Usage(_))
    ));
}
