//! Price-per-millisecond tables keyed by memory size.
//!
//! The built-in catalog carries the Ireland (eu-west-1) on-demand prices. A
//! catalog can also be loaded from a JSON document so price updates do not
//! require a rebuild.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::Architecture;

const X86_64_PRICES: [(u32, f64); 13] = [
    (128, 0.0000000021),
    (512, 0.0000000083),
    (1024, 0.0000000167),
    (1536, 0.0000000250),
    (2048, 0.0000000333),
    (3072, 0.0000000500),
    (4096, 0.0000000667),
    (5120, 0.0000000833),
    (6144, 0.0000001000),
    (7168, 0.0000001167),
    (8192, 0.0000001333),
    (9216, 0.0000001500),
    (10240, 0.0000001667),
];

const ARM64_PRICES: [(u32, f64); 13] = [
    (128, 0.0000000017),
    (512, 0.0000000067),
    (1024, 0.0000000133),
    (1536, 0.0000000200),
    (2048, 0.0000000267),
    (3072, 0.0000000400),
    (4096, 0.0000000533),
    (5120, 0.0000000667),
    (6144, 0.0000000800),
    (7168, 0.0000000933),
    (8192, 0.0000001067),
    (9216, 0.0000001200),
    (10240, 0.0000001333),
];

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("failed to read pricing file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed pricing document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("pricing table for {0} is empty")]
    EmptyTable(Architecture),
    #[error("pricing table for {architecture} has invalid memory size {memory_size}")]
    InvalidMemorySize {
        architecture: Architecture,
        memory_size: u32,
    },
    #[error("pricing table for {architecture} has non-positive price {price} at {memory_size} MB")]
    InvalidPrice {
        architecture: Architecture,
        memory_size: u32,
        price: f64,
    },
}

/// Memory size (MB) to price per millisecond (USD), iterated in ascending
/// memory order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    prices: BTreeMap<u32, f64>,
}

impl PricingTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, f64)>) -> Self {
        Self {
            prices: entries.into_iter().collect(),
        }
    }

    pub fn price_per_ms(&self, memory_size: u32) -> Option<f64> {
        self.prices.get(&memory_size).copied()
    }

    pub fn memory_sizes(&self) -> Vec<u32> {
        self.prices.keys().copied().collect()
    }

    fn validate(&self, architecture: Architecture) -> Result<(), PricingError> {
        if self.prices.is_empty() {
            return Err(PricingError::EmptyTable(architecture));
        }

        for (&memory_size, &price) in &self.prices {
            if memory_size == 0 {
                return Err(PricingError::InvalidMemorySize {
                    architecture,
                    memory_size,
                });
            }
            if !(price.is_finite() && price > 0.0) {
                return Err(PricingError::InvalidPrice {
                    architecture,
                    memory_size,
                    price,
                });
            }
        }

        Ok(())
    }
}

/// One pricing table per architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingCatalog {
    pub x86_64: PricingTable,
    pub arm64: PricingTable,
}

impl Default for PricingCatalog {
    fn default() -> Self {
        Self {
            x86_64: PricingTable::from_entries(X86_64_PRICES),
            arm64: PricingTable::from_entries(ARM64_PRICES),
        }
    }
}

impl PricingCatalog {
    /// Parses `{"x86_64": {"128": 2.1e-9, ...}, "arm64": {...}}`.
    pub fn from_json_str(document: &str) -> Result<Self, PricingError> {
        let catalog: Self = serde_json::from_str(document)?;
        catalog.x86_64.validate(Architecture::X86_64)?;
        catalog.arm64.validate(Architecture::Arm64)?;
        Ok(catalog)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PricingError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| PricingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&document)
    }

    pub fn table(&self, architecture: Architecture) -> &PricingTable {
        match architecture {
            Architecture::X86_64 => &self.x86_64,
            Architecture::Arm64 => &self.arm64,
        }
    }

    /// Unrecognized labels resolve to the x86_64 table.
    pub fn lookup(&self, label: &str) -> &PricingTable {
        self.table(Architecture::from_label(label))
    }
}

/// Looks up the built-in table for an architecture label.
pub fn lookup(label: &str) -> PricingTable {
    PricingCatalog::default().lookup(label).clone()
}
