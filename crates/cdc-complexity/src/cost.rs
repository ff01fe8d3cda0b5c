//! Arithmetic operation counts for encoding and decoding.

use cdc_core::errors::{CdcError, ErrorInfo};
use cdc_core::SystemParameters;
use serde::{Deserialize, Serialize};

/// Unit costs of field operations.
///
/// The default models hardware where additions are free relative to
/// multiplications; asymmetric-cost hardware plugs in different weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Cost of one addition.
    pub addition: f64,
    /// Cost of one multiplication.
    pub multiplication: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            addition: 0.0,
            multiplication: 1.0,
        }
    }
}

impl CostModel {
    fn combine(&self, additions: f64, multiplications: f64) -> f64 {
        self.addition * additions + self.multiplication * multiplications
    }
}

/// Cost of multiplying a `rows` by `cols` matrix with a vector.
///
/// `rows * cols` multiplications and `rows * cols - 1` additions. Fractional
/// row counts are allowed; schemes routinely assign a fractional share of the
/// source rows to each server.
pub fn matrix_vector_complexity(cost: &CostModel, rows: f64, cols: f64) -> f64 {
    cost.combine(rows * cols - 1.0, rows * cols)
}

/// Cost of decoding a Reed-Solomon code over the packet erasure channel with
/// the Berlekamp-Massey algorithm, in the asymptotic regime where the packet
/// size grows without bound.
pub fn rs_decoding_complexity(
    cost: &CostModel,
    code_length: f64,
    packet_size: f64,
    erasure_prob: f64,
) -> f64 {
    let additions = code_length * (erasure_prob * code_length - 1.0) * packet_size;
    let multiplications = code_length * code_length * erasure_prob * packet_size;
    cost.combine(additions, multiplications)
}

/// Cost of decoding a block-diagonal code: `partitions` independent
/// Reed-Solomon decodes of length `code_length / partitions`.
///
/// Errors unless `partitions` divides `code_length`.
pub fn block_diagonal_decoding_complexity(
    cost: &CostModel,
    code_length: usize,
    packet_size: f64,
    erasure_prob: f64,
    partitions: usize,
) -> Result<f64, CdcError> {
    if partitions == 0 || code_length % partitions != 0 {
        return Err(CdcError::Usage(
            ErrorInfo::new("partition-divide", "partitions must divide code_length")
                .with_context("code_length", code_length.to_string())
                .with_context("partitions", partitions.to_string()),
        ));
    }
    if !(0.0..=1.0).contains(&erasure_prob) {
        return Err(CdcError::Usage(
            ErrorInfo::new("erasure-prob", "erasure probability must lie in [0, 1]")
                .with_context("erasure_prob", erasure_prob.to_string()),
        ));
    }
    let partition_length = (code_length / partitions) as f64;
    let per_partition = rs_decoding_complexity(cost, partition_length, packet_size, erasure_prob);
    Ok(per_partition * partitions as f64)
}

/// Cost of erasure-encoding all coded rows from generator blocks of
/// `num_source_rows / partitions` source rows each.
///
/// `partitions` may be fractional: the straggler-coding scheme partitions by
/// `num_source_rows / q`, which need not be an integer count of blocks.
pub fn block_diagonal_encoding_complexity(
    cost: &CostModel,
    parameters: &SystemParameters,
    partitions: Option<f64>,
) -> Result<f64, CdcError> {
    let partitions = partitions.unwrap_or(parameters.num_partitions() as f64);
    if !partitions.is_finite() || partitions <= 0.0 {
        return Err(CdcError::Usage(
            ErrorInfo::new("partition-count", "partitions must be positive")
                .with_context("partitions", partitions.to_string()),
        ));
    }
    let rows_per_block = parameters.num_source_rows() as f64 / partitions;
    let coded = (parameters.num_coded_rows() * parameters.num_columns()) as f64;
    Ok(cost.combine((rows_per_block - 1.0) * coded, rows_per_block * coded))
}

/// Encoding cost for a generator matrix with the given non-zero density.
pub fn encoding_complexity_from_density(
    cost: &CostModel,
    parameters: &SystemParameters,
    density: f64,
) -> Result<f64, CdcError> {
    if !(density > 0.0 && density <= 1.0) {
        return Err(CdcError::Usage(
            ErrorInfo::new("density-bound", "density must lie in (0, 1]")
                .with_context("density", density.to_string()),
        ));
    }
    let nonzero_rows = parameters.num_source_rows() as f64 * density;
    let coded = (parameters.num_coded_rows() * parameters.num_columns()) as f64;
    Ok(cost.combine((nonzero_rows - 1.0) * coded, nonzero_rows * coded))
}
