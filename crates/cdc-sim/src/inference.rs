//! Monte Carlo inference of the overall completion-time distribution.
//!
//! Overall delay is the sum of three independent phases. Encode and reduce
//! always wait for their full worker population; the map phase waits for a
//! random number of servers, so map samples are apportioned across the
//! discrete distribution of that number before the phases are added.

use std::collections::BTreeMap;

use cdc_core::errors::{CdcError, ErrorInfo};
use cdc_core::SystemParameters;
use cdc_stats::{GammaFit, MixtureCdf, ShiftexpOrder};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::table::Table;

/// Discrete distribution over the number of servers needed to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDistribution {
    values: Vec<usize>,
    probabilities: Vec<f64>,
}

impl OrderDistribution {
    /// Creates a distribution from explicit order values and probabilities.
    pub fn new(values: Vec<usize>, probabilities: Vec<f64>) -> Result<Self, CdcError> {
        if values.is_empty() || values.len() != probabilities.len() {
            return Err(CdcError::Usage(
                ErrorInfo::new(
                    "order-lengths",
                    "order values and probabilities must be non-empty and of equal length",
                )
                .with_context("values", values.len().to_string())
                .with_context("probabilities", probabilities.len().to_string()),
            ));
        }
        if values.iter().any(|&v| v == 0) {
            return Err(CdcError::Usage(ErrorInfo::new(
                "order-zero",
                "order values must be positive server counts",
            )));
        }
        for &p in &probabilities {
            if !p.is_finite() || p < 0.0 {
                return Err(CdcError::Usage(
                    ErrorInfo::new("order-probability", "probabilities must be non-negative")
                        .with_context("probability", p.to_string()),
                ));
            }
        }
        if probabilities.iter().sum::<f64>() <= 0.0 {
            return Err(CdcError::Usage(ErrorInfo::new(
                "order-mass",
                "probabilities must carry positive total mass",
            )));
        }
        Ok(Self {
            values,
            probabilities,
        })
    }

    /// Infers the empirical distribution from the `servers` column of a
    /// sample table, normalized to relative frequencies and ordered by
    /// descending frequency (ties by ascending order value).
    pub fn from_table(table: &Table) -> Result<Self, CdcError> {
        let servers = table.column("servers").ok_or_else(|| {
            CdcError::Usage(ErrorInfo::new(
                "servers-missing",
                "sample table carries no servers column",
            ))
        })?;
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        let mut total = 0usize;
        for &value in servers {
            if !value.is_finite() || value.round() < 1.0 {
                return Err(CdcError::Usage(
                    ErrorInfo::new("servers-value", "servers column must hold positive counts")
                        .with_context("value", value.to_string()),
                ));
            }
            *counts.entry(value.round() as usize).or_insert(0) += 1;
            total += 1;
        }
        if total == 0 {
            return Err(CdcError::Usage(ErrorInfo::new(
                "servers-empty",
                "sample table holds no rows to infer the order distribution from",
            )));
        }
        let mut entries: Vec<(usize, usize)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let values = entries.iter().map(|(value, _)| *value).collect();
        let probabilities = entries
            .iter()
            .map(|(_, count)| *count as f64 / total as f64)
            .collect();
        Ok(Self {
            values,
            probabilities,
        })
    }

    /// Order values.
    pub fn values(&self) -> &[usize] {
        &self.values
    }

    /// Probability of each order value.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

/// Phase complexity functions for one configuration.
///
/// Encode and reduce are optional: `None` means the scheme has no such phase
/// and it contributes nothing to the composed samples.
pub struct DelayModel<'a> {
    /// System configuration the delays are modelled for.
    pub parameters: &'a SystemParameters,
    /// Map phase complexity per worker.
    pub map_complexity: &'a (dyn Fn(&SystemParameters) -> f64 + Sync),
    /// Total encode phase complexity, split over all servers.
    pub encode_complexity: Option<&'a (dyn Fn(&SystemParameters) -> f64 + Sync)>,
    /// Total reduce phase complexity, split over the decoding servers.
    pub reduce_complexity: Option<&'a (dyn Fn(&SystemParameters) -> f64 + Sync)>,
}

impl<'a> DelayModel<'a> {
    fn encode_distribution(&self) -> Result<Option<ShiftexpOrder>, CdcError> {
        let servers = self.parameters.num_servers();
        self.encode_complexity
            .map(|fun| {
                ShiftexpOrder::new(fun(self.parameters) / servers as f64, servers, servers)
            })
            .transpose()
    }

    fn reduce_distribution(&self) -> Result<Option<ShiftexpOrder>, CdcError> {
        let q = self.parameters.q();
        self.reduce_complexity
            .map(|fun| ShiftexpOrder::new(fun(self.parameters) / q as f64, q, q))
            .transpose()
    }

    fn map_distribution(&self, order: usize) -> Result<ShiftexpOrder, CdcError> {
        ShiftexpOrder::new(
            (self.map_complexity)(self.parameters),
            self.parameters.num_servers(),
            order,
        )
    }

    fn normalization(&self) -> f64 {
        (self.parameters.num_source_rows() * self.parameters.num_outputs()) as f64
    }
}

/// Splits `num_samples` across the order buckets proportionally to their
/// probabilities, carrying rounding residue forward. Every bucket receives a
/// non-negative count and the counts sum to exactly `num_samples`; residue
/// left by probabilities summing below one goes to the last bucket.
fn allocate_order_counts(num_samples: usize, probabilities: &[f64]) -> Vec<usize> {
    let mut counts = vec![0usize; probabilities.len()];
    let mut assigned = 0usize;
    let mut carry = 0.0;
    for (slot, probability) in counts.iter_mut().zip(probabilities) {
        carry += probability * num_samples as f64;
        let take = (carry.round().max(0.0) as usize).min(num_samples - assigned);
        *slot = take;
        assigned += take;
        carry -= take as f64;
    }
    if assigned < num_samples {
        if let Some(last) = counts.last_mut() {
            *last += num_samples - assigned;
        }
    }
    counts
}

/// Draws `num_samples` realizations of the overall delay distribution by
/// composing encode, map and reduce order-statistics samples, normalized by
/// `num_source_rows * num_outputs`.
pub fn delay_samples<R: Rng + ?Sized>(
    rng: &mut R,
    model: &DelayModel<'_>,
    orders: &OrderDistribution,
    num_samples: usize,
) -> Result<Vec<f64>, CdcError> {
    if num_samples == 0 {
        return Err(CdcError::Usage(ErrorInfo::new(
            "samples-zero",
            "at least one sample is required",
        )));
    }
    let mut samples = vec![0.0; num_samples];
    if let Some(distribution) = model.encode_distribution()? {
        distribution.add_samples(rng, &mut samples);
    }
    if let Some(distribution) = model.reduce_distribution()? {
        distribution.add_samples(rng, &mut samples);
    }

    let counts = allocate_order_counts(num_samples, orders.probabilities());
    let mut offset = 0usize;
    for (&order, &count) in orders.values().iter().zip(&counts) {
        if count == 0 {
            continue;
        }
        let distribution = model.map_distribution(order)?;
        distribution.add_samples(rng, &mut samples[offset..offset + count]);
        offset += count;
    }

    let normalization = model.normalization();
    for sample in &mut samples {
        *sample /= normalization;
    }
    Ok(samples)
}

/// Fits a closed-form CDF to delay samples. The sum of exponential phase
/// delays is gamma distributed, so a gamma is fitted with its location
/// anchored at the smallest observed sample.
pub fn cdf_from_samples(samples: &[f64]) -> Result<GammaFit, CdcError> {
    let fit = GammaFit::fit(samples)?;
    tracing::info!(
        shape = fit.shape(),
        location = fit.location(),
        scale = fit.scale(),
        "fitted gamma distribution"
    );
    Ok(fit)
}

/// Infers the completion-time CDF as a mixture of per-order gamma fits.
///
/// For each possible number of servers to wait for, composes
/// encode + map + reduce samples at that order, fits a gamma, and weights it
/// by the order probability. A bucket whose fit degenerates contributes its
/// full probability mass, keeping the mixture well-defined.
pub fn infer_completion_cdf<R: Rng + ?Sized>(
    rng: &mut R,
    model: &DelayModel<'_>,
    orders: &OrderDistribution,
    num_samples: usize,
) -> Result<MixtureCdf, CdcError> {
    if num_samples == 0 {
        return Err(CdcError::Usage(ErrorInfo::new(
            "samples-zero",
            "at least one sample is required",
        )));
    }
    let encode_distribution = model.encode_distribution()?;
    let reduce_distribution = model.reduce_distribution()?;
    let normalization = model.normalization();

    let mut components = Vec::with_capacity(orders.values().len());
    let mut min_sample = f64::INFINITY;
    let mut max_sample = f64::NEG_INFINITY;
    let mut samples = vec![0.0; num_samples];
    for (&order, &probability) in orders.values().iter().zip(orders.probabilities()) {
        samples.iter_mut().for_each(|sample| *sample = 0.0);
        if let Some(distribution) = &encode_distribution {
            distribution.add_samples(rng, &mut samples);
        }
        if let Some(distribution) = &reduce_distribution {
            distribution.add_samples(rng, &mut samples);
        }
        model.map_distribution(order)?.add_samples(rng, &mut samples);
        for sample in &mut samples {
            *sample /= normalization;
        }
        min_sample = min_sample.min(samples.iter().copied().fold(f64::INFINITY, f64::min));
        max_sample = max_sample.max(samples.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        components.push((probability, GammaFit::fit(&samples)?));
    }
    MixtureCdf::new(components, min_sample, max_sample)
}
