//! Per-scheme map phase complexities.
//!
//! Each function returns the arithmetic cost of one server's share of the map
//! phase: a matrix-vector product over its stored rows, repeated for every
//! output vector. The schemes differ only in the fraction of the source rows
//! a server stores.

use cdc_core::SystemParameters;

use crate::cost::{matrix_vector_complexity, CostModel};

fn map_complexity(cost: &CostModel, parameters: &SystemParameters, server_storage: f64) -> f64 {
    let rows_per_server = server_storage * parameters.num_source_rows() as f64;
    let per_output = matrix_vector_complexity(cost, rows_per_server, parameters.num_columns() as f64);
    per_output * parameters.num_outputs() as f64
}

/// Uncoded scheme: the source rows are split evenly over all servers.
pub fn map_complexity_uncoded(cost: &CostModel, parameters: &SystemParameters) -> f64 {
    map_complexity(cost, parameters, 1.0 / parameters.num_servers() as f64)
}

/// Coded MapReduce: each row is replicated at `muq` servers.
pub fn map_complexity_cmapred(cost: &CostModel, parameters: &SystemParameters) -> f64 {
    map_complexity(
        cost,
        parameters,
        parameters.muq() / parameters.num_servers() as f64,
    )
}

/// Straggler coding only: an erasure code absorbs stragglers, so each server
/// stores a `1/q` fraction.
pub fn map_complexity_stragglerc(cost: &CostModel, parameters: &SystemParameters) -> f64 {
    map_complexity(cost, parameters, 1.0 / parameters.q() as f64)
}

/// Unified scheme: storage fraction taken directly from the configuration.
pub fn map_complexity_unified(cost: &CostModel, parameters: &SystemParameters) -> f64 {
    map_complexity(cost, parameters, parameters.server_storage())
}
