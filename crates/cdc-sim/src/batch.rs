//! Batch runner: concurrent evaluation of a configuration list and
//! aggregation into one row per configuration.

use cdc_core::errors::{CdcError, ErrorInfo};
use cdc_core::SystemParameters;
use cdc_stats::computational_delay;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::table::Table;

/// Data shuffling strategy used to derive the communication load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStrategy {
    /// Unicast plus multicast load of strategy 1.
    L1,
    /// Unicast plus multicast load of strategy 2.
    L2,
    /// Row-wise minimum of the two strategies. This is not a strategy chosen
    /// a priori: each configuration is credited with the cheaper of the two
    /// loads available to it.
    #[default]
    Best,
}

/// Source of the encode or reduce delay column.
///
/// Replaces the overloaded disabled-phase sentinel: a phase is either taken
/// from the cached samples, declared genuinely absent, or computed from the
/// configuration.
pub enum PhaseDelay<'a> {
    /// The column must already exist in the per-configuration samples;
    /// missing data is an error rather than a silent zero.
    FromSamples,
    /// The scheme has no such phase; the column is zero.
    Zero,
    /// Compute the column from the configuration, overwriting any cached
    /// value.
    Compute(&'a (dyn Fn(&SystemParameters) -> f64 + Sync)),
}

/// Options for [`simulate_parameter_list`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Ratio between the shift and tail scale of the shifted exponential.
    /// When set, the map delay is recomputed analytically at this ratio
    /// instead of using the simulated `delay` column; the two modes are
    /// mutually exclusive per invocation.
    pub tail_scale: Option<f64>,
    /// Worker pool size. Evaluations are I/O-bound, so this sizes for
    /// overlap rather than CPU parallelism; 1 is a valid degenerate pool.
    pub concurrency: usize,
    /// Shuffling strategy for the derived `load` column.
    pub load_strategy: LoadStrategy,
    /// Cooperative cancellation handle.
    pub cancel: CancelToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            tail_scale: None,
            concurrency: 1,
            load_strategy: LoadStrategy::default(),
            cancel: CancelToken::new(),
        }
    }
}

/// Evaluates every configuration and aggregates the results into one table
/// with a row per configuration, in input order.
///
/// Evaluations run on a pool owned by this call and dropped before it
/// returns; results are reordered after the concurrent phase, so completion
/// order never leaks into the output. Each per-configuration sample table is
/// reduced to its column-wise mean, the communication load and phase delay
/// columns are attached, and `overall_delay = delay + encode + reduce`.
pub fn simulate_parameter_list<F>(
    parameter_list: &[SystemParameters],
    simulate_fn: F,
    map_complexity_fun: &(dyn Fn(&SystemParameters) -> f64 + Sync),
    encode_delay_fun: &PhaseDelay<'_>,
    reduce_delay_fun: &PhaseDelay<'_>,
    opts: &BatchOptions,
) -> Result<Table, CdcError>
where
    F: Fn(&SystemParameters) -> Result<Table, CdcError> + Sync,
{
    tracing::info!(
        configurations = parameter_list.len(),
        concurrency = opts.concurrency,
        "running batch evaluation"
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.concurrency.max(1))
        .build()
        .map_err(|err| {
            CdcError::Usage(
                ErrorInfo::new("thread-pool", "failed to build worker pool")
                    .with_hint(err.to_string()),
            )
        })?;

    let results: Result<Vec<(usize, Table)>, CdcError> = pool.install(|| {
        parameter_list
            .par_iter()
            .enumerate()
            .map(|(index, parameters)| {
                opts.cancel.check("batch")?;
                simulate_fn(parameters).map(|table| (index, table))
            })
            .collect()
    });
    let mut ordered = results?;
    ordered.sort_by_key(|(index, _)| *index);
    let mut tables: Vec<Table> = ordered.into_iter().map(|(_, table)| table).collect();

    if let Some(tail_scale) = opts.tail_scale {
        for (parameters, table) in parameter_list.iter().zip(tables.iter_mut()) {
            recompute_map_delay(table, parameters, tail_scale, map_complexity_fun)?;
        }
    }

    let mut aggregated = Table::new();
    for table in &tables {
        let row = table.mean_row();
        aggregated.push_row(row.iter().map(|(name, value)| (name.as_str(), *value)));
    }

    set_load(&mut aggregated, opts.load_strategy)?;

    // the simulated delay is per unit of map complexity; scale it to absolute
    // time unless the analytic recomputation already did
    if opts.tail_scale.is_none() {
        let delay = required_column(&aggregated, "delay")?.to_vec();
        let scaled: Vec<f64> = delay
            .iter()
            .zip(parameter_list)
            .map(|(value, parameters)| value * map_complexity_fun(parameters))
            .collect();
        aggregated.insert_column("delay", scaled)?;
    }

    apply_phase_delay(&mut aggregated, "encode", encode_delay_fun, parameter_list)?;
    apply_phase_delay(&mut aggregated, "reduce", reduce_delay_fun, parameter_list)?;

    let delay = required_column(&aggregated, "delay")?;
    let encode = required_column(&aggregated, "encode")?;
    let reduce = required_column(&aggregated, "reduce")?;
    let overall: Vec<f64> = delay
        .iter()
        .zip(encode)
        .zip(reduce)
        .map(|((d, e), r)| d + e + r)
        .collect();
    aggregated.insert_column("overall_delay", overall)?;

    Ok(aggregated)
}

/// Attaches the `load` column when absent.
///
/// Requires the unicast/multicast columns of both shuffling strategies unless
/// the samples already carry a `load` column computed by other means.
pub fn set_load(table: &mut Table, strategy: LoadStrategy) -> Result<(), CdcError> {
    if table.contains_column("load") {
        return Ok(());
    }
    let load_1 = strategy_load(table, "unicast_load_1", "multicast_load_1")?;
    let load_2 = strategy_load(table, "unicast_load_2", "multicast_load_2")?;
    let load = match strategy {
        LoadStrategy::L1 => load_1,
        LoadStrategy::L2 => load_2,
        LoadStrategy::Best => load_1
            .into_iter()
            .zip(load_2)
            .map(|(a, b)| a.min(b))
            .collect(),
    };
    table.insert_column("load", load)
}

fn strategy_load(table: &Table, unicast: &str, multicast: &str) -> Result<Vec<f64>, CdcError> {
    let unicast = required_column(table, unicast)?;
    let multicast = required_column(table, multicast)?;
    Ok(unicast.iter().zip(multicast).map(|(u, m)| u + m).collect())
}

fn recompute_map_delay(
    table: &mut Table,
    parameters: &SystemParameters,
    tail_scale: f64,
    map_complexity_fun: &(dyn Fn(&SystemParameters) -> f64 + Sync),
) -> Result<(), CdcError> {
    let parameter = map_complexity_fun(parameters);
    let servers = required_column(table, "servers")?.to_vec();
    let mut delays = Vec::with_capacity(servers.len());
    for value in servers {
        let order = value.round();
        if !(order >= 1.0) {
            return Err(CdcError::Usage(
                ErrorInfo::new("servers-column", "servers column must hold positive counts")
                    .with_context("value", value.to_string()),
            ));
        }
        delays.push(computational_delay(
            parameters,
            order as usize,
            parameter,
            Some(tail_scale),
        )?);
    }
    table.insert_column("delay", delays)
}

fn apply_phase_delay(
    table: &mut Table,
    column: &str,
    delay: &PhaseDelay<'_>,
    parameter_list: &[SystemParameters],
) -> Result<(), CdcError> {
    match delay {
        PhaseDelay::Compute(fun) => {
            let values: Vec<f64> = parameter_list.iter().map(|p| fun(p)).collect();
            table.insert_column(column, values)
        }
        PhaseDelay::Zero => {
            table.set_scalar(column, 0.0);
            Ok(())
        }
        PhaseDelay::FromSamples => {
            if table.contains_column(column) {
                Ok(())
            } else {
                Err(CdcError::Usage(
                    ErrorInfo::new(
                        "phase-column-missing",
                        "samples must carry the phase delay column when it is not computed",
                    )
                    .with_context("column", column)
                    .with_hint(
                        "supply PhaseDelay::Compute, or PhaseDelay::Zero for schemes without \
                         this phase",
                    ),
                ))
            }
        }
    }
}

fn required_column<'a>(table: &'a Table, name: &str) -> Result<&'a [f64], CdcError> {
    table.column(name).ok_or_else(|| {
        CdcError::Usage(
            ErrorInfo::new("column-missing", "required column absent from table")
                .with_context("column", name),
        )
    })
}
