#![deny(missing_docs)]
#![doc = "Core configuration and error types for the CDC performance simulator."]

pub mod errors;
pub mod parameters;
pub mod rng;

pub use errors::{CdcError, ErrorInfo};
pub use parameters::{SystemParameters, PARAMETERS_SCHEMA_VERSION};
pub use rng::{derive_trial_seed, RngHandle};
