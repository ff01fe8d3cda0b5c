//! Immutable description of one coded-computing system instance.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{CdcError, ErrorInfo};

/// Version token embedded in every identifier. Bump whenever the meaning of a
/// cached result column changes, so stale cache files stop resolving.
pub const PARAMETERS_SCHEMA_VERSION: u32 = 1;

/// Immutable description of one system instance.
///
/// `num_servers` workers jointly compute `num_outputs` matrix-vector products
/// over a `num_source_rows` by `num_columns` matrix that has been erasure
/// coded into `num_coded_rows` rows split over `num_partitions` partitions.
/// Any `q` of the servers suffice to decode. Each server stores a
/// `server_storage` fraction of the source rows.
///
/// Constructed through [`SystemParameters::new`], which validates the field
/// invariants; the fields never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemParameters {
    num_servers: usize,
    q: usize,
    num_source_rows: usize,
    num_coded_rows: usize,
    num_columns: usize,
    num_outputs: usize,
    num_partitions: usize,
    server_storage: f64,
}

impl SystemParameters {
    /// Creates a validated parameter set.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num_servers: usize,
        q: usize,
        num_source_rows: usize,
        num_coded_rows: usize,
        num_columns: usize,
        num_outputs: usize,
        num_partitions: usize,
        server_storage: f64,
    ) -> Result<Self, CdcError> {
        let positive = [
            ("num_servers", num_servers),
            ("q", q),
            ("num_source_rows", num_source_rows),
            ("num_coded_rows", num_coded_rows),
            ("num_columns", num_columns),
            ("num_outputs", num_outputs),
            ("num_partitions", num_partitions),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(CdcError::Parameters(
                    ErrorInfo::new("field-zero", "all count fields must be positive")
                        .with_context("field", name),
                ));
            }
        }
        if q > num_servers {
            return Err(CdcError::Parameters(
                ErrorInfo::new("quorum-bound", "q must not exceed num_servers")
                    .with_context("q", q.to_string())
                    .with_context("num_servers", num_servers.to_string()),
            ));
        }
        // the erasure code stretches m source rows to m * K / q coded rows
        if num_coded_rows * q != num_source_rows * num_servers {
            return Err(CdcError::Parameters(
                ErrorInfo::new(
                    "redundancy-mismatch",
                    "num_coded_rows is inconsistent with the code rate q / num_servers",
                )
                .with_context("num_coded_rows", num_coded_rows.to_string())
                .with_context("expected", (num_source_rows * num_servers / q).to_string()),
            ));
        }
        if num_coded_rows % num_partitions != 0 {
            return Err(CdcError::Parameters(
                ErrorInfo::new(
                    "partition-mismatch",
                    "num_partitions must divide num_coded_rows",
                )
                .with_context("num_coded_rows", num_coded_rows.to_string())
                .with_context("num_partitions", num_partitions.to_string()),
            ));
        }
        let min_storage = 1.0 / q as f64;
        if !server_storage.is_finite() || server_storage < min_storage || server_storage > 1.0 {
            return Err(CdcError::Parameters(
                ErrorInfo::new(
                    "storage-bound",
                    "server_storage must lie in [1/q, 1]",
                )
                .with_context("server_storage", server_storage.to_string())
                .with_context("minimum", min_storage.to_string()),
            ));
        }
        Ok(Self {
            num_servers,
            q,
            num_source_rows,
            num_coded_rows,
            num_columns,
            num_outputs,
            num_partitions,
            server_storage,
        })
    }

    /// Number of servers in the system.
    pub fn num_servers(&self) -> usize {
        self.num_servers
    }

    /// Number of servers needed to decode.
    pub fn q(&self) -> usize {
        self.q
    }

    /// Number of source matrix rows.
    pub fn num_source_rows(&self) -> usize {
        self.num_source_rows
    }

    /// Number of coded matrix rows.
    pub fn num_coded_rows(&self) -> usize {
        self.num_coded_rows
    }

    /// Number of matrix columns.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Number of output vectors.
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Number of erasure code partitions.
    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    /// Fraction of the source rows stored by each server.
    pub fn server_storage(&self) -> f64 {
        self.server_storage
    }

    /// Per-server storage multiple: each coded row is stored at `muq` servers.
    pub fn muq(&self) -> f64 {
        self.server_storage * self.q as f64
    }

    /// Erasure probability `1 - q / num_servers` of the induced packet
    /// erasure channel.
    pub fn erasure_probability(&self) -> f64 {
        1.0 - self.q as f64 / self.num_servers as f64
    }

    /// Deterministic, collision-resistant identifier used as the cache key.
    ///
    /// Combines a human readable field prefix with the truncated SHA-256
    /// digest of the canonical encoding of all fields and the schema version.
    /// Two parameter sets share an identifier only if every field matches.
    pub fn identifier(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(PARAMETERS_SCHEMA_VERSION.to_le_bytes());
        // serde field order is fixed, so the JSON encoding is canonical here
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(&bytes);
        }
        let digest = hasher.finalize();
        format!(
            "m{}_K{}_q{}_N{}_T{}_v{}_{:02x}{:02x}{:02x}{:02x}",
            self.num_source_rows,
            self.num_servers,
            self.q,
            self.num_outputs,
            self.num_partitions,
            PARAMETERS_SCHEMA_VERSION,
            digest[0],
            digest[1],
            digest[2],
            digest[3],
        )
    }

    /// Exposes every scalar field as a named column value, in declaration
    /// order, so cached tables can be re-annotated on load.
    pub fn to_columns(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("num_servers", self.num_servers as f64),
            ("q", self.q as f64),
            ("num_source_rows", self.num_source_rows as f64),
            ("num_coded_rows", self.num_coded_rows as f64),
            ("num_columns", self.num_columns as f64),
            ("num_outputs", self.num_outputs as f64),
            ("num_partitions", self.num_partitions as f64),
            ("server_storage", self.server_storage),
            ("muq", self.muq()),
        ]
    }
}
