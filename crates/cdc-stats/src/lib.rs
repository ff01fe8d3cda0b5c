//! Order-statistics delay model and distribution fitting for the CDC simulator.

mod gamma;
mod shiftexp;

pub use gamma::{GammaFit, MixtureCdf};
pub use shiftexp::{computational_delay, harmonic, order_mean_shiftexp, ShiftexpOrder};
