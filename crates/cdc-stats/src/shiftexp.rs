//! Shifted-exponential order statistics for straggler delay modelling.

use cdc_core::errors::{CdcError, ErrorInfo};
use cdc_core::SystemParameters;
use rand::Rng;
use rand_distr::{Distribution, Exp};

/// The n-th harmonic number `H(n) = sum_{i=1..n} 1/i`, with `H(0) = 0`.
pub fn harmonic(n: usize) -> f64 {
    (1..=n).map(|i| 1.0 / i as f64).sum()
}

/// Closed-form mean of the `order`-th smallest of `total` i.i.d.
/// shifted-exponential delays with shift `parameter` and exponential tail
/// scale `tail_scale` (defaults to the shift).
///
/// Waiting for the `order` fastest of `total` workers costs
/// `shift + scale * (H(total) - H(total - order))`.
pub fn order_mean_shiftexp(
    total: usize,
    order: usize,
    parameter: f64,
    tail_scale: Option<f64>,
) -> Result<f64, CdcError> {
    check_order(total, order)?;
    check_parameter(parameter)?;
    let scale = tail_scale.unwrap_or(parameter);
    check_parameter(scale)?;
    Ok(parameter + scale * (harmonic(total) - harmonic(total - order)))
}

/// Mean delay of the map phase when waiting for `servers` of the
/// configuration's workers, each loaded with `parameter` units of work.
pub fn computational_delay(
    parameters: &SystemParameters,
    servers: usize,
    parameter: f64,
    tail_scale: Option<f64>,
) -> Result<f64, CdcError> {
    order_mean_shiftexp(parameters.num_servers(), servers, parameter, tail_scale)
}

/// Distribution of the `order`-th smallest of `total` i.i.d.
/// shifted-exponential random variables.
///
/// Each variable is `parameter + Exp(scale = parameter)`: a deterministic
/// startup shift plus an exponential straggling tail. The distribution is
/// stateless; every call to [`ShiftexpOrder::sample`] draws an independent
/// realization. A zero parameter denotes the degenerate all-zero
/// distribution used for phases with zero complexity.
#[derive(Debug, Clone, Copy)]
pub struct ShiftexpOrder {
    parameter: f64,
    total: usize,
    order: usize,
    tail: Option<Exp<f64>>,
}

impl ShiftexpOrder {
    /// Creates the distribution, validating `1 <= order <= total` and
    /// `parameter >= 0`.
    pub fn new(parameter: f64, total: usize, order: usize) -> Result<Self, CdcError> {
        check_order(total, order)?;
        check_parameter(parameter)?;
        let tail = if parameter > 0.0 {
            Some(Exp::new(1.0 / parameter).map_err(|err| {
                CdcError::Stats(
                    ErrorInfo::new("exp-rate", "invalid exponential rate")
                        .with_context("parameter", parameter.to_string())
                        .with_hint(err.to_string()),
                )
            })?)
        } else {
            None
        };
        Ok(Self {
            parameter,
            total,
            order,
            tail,
        })
    }

    /// Scale parameter (shift and exponential tail scale).
    pub fn parameter(&self) -> f64 {
        self.parameter
    }

    /// Population size `n`.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Order statistic index `k`.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Draws one realization of the order statistic.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let Some(tail) = &self.tail else {
            return 0.0;
        };
        let mut delays: Vec<f64> = (0..self.total)
            .map(|_| self.parameter + tail.sample(rng))
            .collect();
        let (_, kth, _) = delays.select_nth_unstable_by(self.order - 1, f64::total_cmp);
        *kth
    }

    /// Adds one independent realization to every slot of `out`.
    pub fn add_samples<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        if self.tail.is_none() {
            return;
        }
        for slot in out.iter_mut() {
            *slot += self.sample(rng);
        }
    }

    /// Closed-form mean of the distribution. Sampling converges to this
    /// value as the sample count grows.
    pub fn mean(&self) -> f64 {
        self.parameter + self.parameter * (harmonic(self.total) - harmonic(self.total - self.order))
    }
}

fn check_order(total: usize, order: usize) -> Result<(), CdcError> {
    if order == 0 || order > total {
        return Err(CdcError::Stats(
            ErrorInfo::new("order-bound", "order must lie in 1..=total")
                .with_context("order", order.to_string())
                .with_context("total", total.to_string()),
        ));
    }
    Ok(())
}

fn check_parameter(parameter: f64) -> Result<(), CdcError> {
    if !parameter.is_finite() || parameter < 0.0 {
        return Err(CdcError::Stats(
            ErrorInfo::new("parameter-bound", "scale parameter must be finite and non-negative")
                .with_context("parameter", parameter.to_string()),
        ));
    }
    Ok(())
}
