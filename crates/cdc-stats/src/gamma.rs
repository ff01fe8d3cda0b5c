//! Gamma fits to empirical delay samples and mixtures of fitted CDFs.

use cdc_core::errors::{CdcError, ErrorInfo};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Gamma};

/// Gamma distribution fitted to a set of delay samples.
///
/// The sum of exponentially distributed phase delays is gamma distributed, so
/// overall completion times are fitted with a three-parameter gamma: shape,
/// location and scale. The location is anchored at the minimum observed
/// sample, which respects the physical floor of non-negative delay. Shape and
/// scale are estimated from the first two moments of the shifted samples.
///
/// A fit can degenerate (all samples equal, as for zero-complexity phases).
/// Degenerate fits saturate [`GammaFit::cdf`] to 1 so that downstream mixture
/// math never sees NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaFit {
    shape: f64,
    location: f64,
    scale: f64,
}

impl GammaFit {
    /// Fits a gamma distribution to the samples, anchoring the location at
    /// the sample minimum. Errors on an empty or non-finite sample set.
    pub fn fit(samples: &[f64]) -> Result<Self, CdcError> {
        if samples.is_empty() {
            return Err(CdcError::Stats(ErrorInfo::new(
                "fit-empty",
                "cannot fit a distribution to zero samples",
            )));
        }
        if samples.iter().any(|x| !x.is_finite()) {
            return Err(CdcError::Stats(ErrorInfo::new(
                "fit-non-finite",
                "samples must be finite",
            )));
        }
        let location = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let n = samples.len() as f64;
        let mean = samples.iter().map(|x| x - location).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|x| {
                let d = (x - location) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let (shape, scale) = if mean > 0.0 && variance > 0.0 {
            (mean * mean / variance, variance / mean)
        } else {
            // constant samples: no spread to fit, mark the fit degenerate
            (f64::NAN, f64::NAN)
        };
        Ok(Self {
            shape,
            location,
            scale,
        })
    }

    /// Fitted shape parameter.
    pub fn shape(&self) -> f64 {
        self.shape
    }

    /// Fitted location (the minimum observed sample).
    pub fn location(&self) -> f64 {
        self.location
    }

    /// Fitted scale parameter.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// True when the fit carries no usable shape/scale information.
    pub fn is_degenerate(&self) -> bool {
        !(self.shape.is_finite() && self.shape > 0.0 && self.scale.is_finite() && self.scale > 0.0)
    }

    /// Probability that the completion time is at most `x`.
    ///
    /// Degenerate fits and NaN evaluations saturate to 1 ("certainly
    /// complete") so mixtures stay well-defined.
    pub fn cdf(&self, x: f64) -> f64 {
        if self.is_degenerate() {
            return 1.0;
        }
        if x < self.location {
            return 0.0;
        }
        let value = match Gamma::new(self.shape, 1.0 / self.scale) {
            Ok(gamma) => gamma.cdf(x - self.location),
            Err(_) => return 1.0,
        };
        if value.is_nan() {
            1.0
        } else {
            value
        }
    }
}

/// Probability-weighted mixture of per-order gamma fits.
///
/// One component per distinct "wait for k servers" outcome; the overall CDF
/// is `F(t) = sum_k p_k * F_k(t)`. Degenerate components contribute their
/// full probability mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureCdf {
    components: Vec<(f64, GammaFit)>,
    min_sample: f64,
    max_sample: f64,
}

impl MixtureCdf {
    /// Builds a mixture from `(probability, fit)` components and the extreme
    /// sample values observed while fitting.
    pub fn new(
        components: Vec<(f64, GammaFit)>,
        min_sample: f64,
        max_sample: f64,
    ) -> Result<Self, CdcError> {
        if components.is_empty() {
            return Err(CdcError::Stats(ErrorInfo::new(
                "mixture-empty",
                "a mixture needs at least one component",
            )));
        }
        for (probability, _) in &components {
            if !probability.is_finite() || *probability < 0.0 {
                return Err(CdcError::Stats(
                    ErrorInfo::new("mixture-weight", "component probabilities must be non-negative")
                        .with_context("probability", probability.to_string()),
                ));
            }
        }
        Ok(Self {
            components,
            min_sample,
            max_sample,
        })
    }

    /// Probability that the completion time is at most `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        self.components
            .iter()
            .map(|(probability, fit)| probability * fit.cdf(x))
            .sum()
    }

    /// Mixture components as `(probability, fit)` pairs.
    pub fn components(&self) -> &[(f64, GammaFit)] {
        &self.components
    }

    /// Smallest sample value observed while fitting.
    pub fn min_sample(&self) -> f64 {
        self.min_sample
    }

    /// Largest sample value observed while fitting.
    pub fn max_sample(&self) -> f64 {
        self.max_sample
    }
}
