//! Encode and reduce phase delays under the shifted-exponential model.

use cdc_core::errors::CdcError;
use cdc_core::SystemParameters;
use cdc_stats::order_mean_shiftexp;

use crate::cost::{block_diagonal_decoding_complexity, block_diagonal_encoding_complexity, CostModel};

/// Delay of the encode phase for the partitioned scheme.
///
/// All servers participate and every one must finish, so the delay is the
/// full-population order-statistic mean scaled by the total encoding
/// complexity. Each coded row is stored at `muq` servers and therefore
/// encoded `muq` times; the work splits evenly over all servers.
pub fn partitioned_encode_delay(
    cost: &CostModel,
    parameters: &SystemParameters,
    partitions: Option<f64>,
) -> Result<f64, CdcError> {
    let servers = parameters.num_servers();
    let mut delay = order_mean_shiftexp(servers, servers, 1.0, None)?;
    delay *= block_diagonal_encoding_complexity(cost, parameters, partitions)?;
    delay *= parameters.muq();
    delay /= servers as f64;
    Ok(delay)
}

/// Encode delay when an erasure code handles stragglers without coded
/// multicasting: one partition per `q` source rows.
pub fn stragglerc_encode_delay(
    cost: &CostModel,
    parameters: &SystemParameters,
) -> Result<f64, CdcError> {
    let partitions = parameters.num_source_rows() as f64 / parameters.q() as f64;
    partitioned_encode_delay(cost, parameters, Some(partitions))
}

/// Per-server decoding complexity of the reduce phase for the partitioned
/// scheme.
pub fn partitioned_reduce_complexity(
    cost: &CostModel,
    parameters: &SystemParameters,
    partitions: Option<usize>,
) -> Result<f64, CdcError> {
    let partitions = partitions.unwrap_or(parameters.num_partitions());
    let complexity = block_diagonal_decoding_complexity(
        cost,
        parameters.num_coded_rows(),
        1.0,
        parameters.erasure_probability(),
        partitions,
    )?;
    Ok(complexity * parameters.num_outputs() as f64 / parameters.q() as f64)
}

/// Delay of the reduce phase for the partitioned scheme: the `q` decoding
/// servers all must finish, scaled by the per-server decoding complexity.
pub fn partitioned_reduce_delay(
    cost: &CostModel,
    parameters: &SystemParameters,
    partitions: Option<usize>,
) -> Result<f64, CdcError> {
    let q = parameters.q();
    let delay = order_mean_shiftexp(q, q, 1.0, None)?;
    Ok(delay * partitioned_reduce_complexity(cost, parameters, partitions)?)
}

/// Reduce delay for the straggler-coding-only scheme: a single
/// length-`num_servers` code over packets of `num_source_rows / q` rows.
pub fn stragglerc_reduce_delay(
    cost: &CostModel,
    parameters: &SystemParameters,
) -> Result<f64, CdcError> {
    let q = parameters.q();
    let mut delay = order_mean_shiftexp(q, q, 1.0, None)?;
    let rows_per_server = parameters.num_source_rows() as f64 / q as f64;
    delay *= block_diagonal_decoding_complexity(
        cost,
        parameters.num_servers(),
        rows_per_server,
        parameters.erasure_probability(),
        1,
    )?;
    delay *= parameters.num_outputs() as f64 / q as f64;
    Ok(delay)
}
