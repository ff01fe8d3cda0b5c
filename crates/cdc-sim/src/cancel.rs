//! Cooperative cancellation for long-running sweeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cdc_core::errors::{CdcError, ErrorInfo};

/// Shared flag checked between trials and between configurations.
///
/// Cloning yields another handle on the same flag. A solver call already in
/// flight is not interrupted; cancellation takes effect at the next check.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation on every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self, stage: &str) -> Result<(), CdcError> {
        if self.is_cancelled() {
            Err(CdcError::Cancelled(
                ErrorInfo::new("cancelled", "run cancelled by caller").with_context("stage", stage),
            ))
        } else {
            Ok(())
        }
    }
}
