//! # Dataset Descriptors
//!
//! A descriptor names one input table and where to fetch it from. The set
//! of descriptors is fixed for the lifetime of the process.

use serde::{Deserialize, Serialize};

use crate::identity::DatasetName;

/// Static description of a dataset: logical name plus source identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Logical name, unique within the registry.
    pub name: DatasetName,
    /// Source identifier (file name or path relative to the data source).
    pub source: String,
}

impl DatasetDescriptor {
    /// Build a descriptor from an already-validated name.
    pub fn new(name: DatasetName, source: impl Into<String>) -> Self {
        Self {
            name,
            source: source.into(),
        }
    }
}

/// The four Consumer Duty datasets loaded by default.
///
/// | Name | Source |
/// |------|--------|
/// | `ProductData` | `ProductPerformance.csv` |
/// | `PricingData` | `PriceValue.csv` |
/// | `CommData` | `ConsumerUnderstanding.csv` |
/// | `SupportData` | `ConsumerSupport.csv` |
pub fn default_datasets() -> Vec<DatasetDescriptor> {
    [
        ("ProductData", "ProductPerformance.csv"),
        ("PricingData", "PriceValue.csv"),
        ("CommData", "ConsumerUnderstanding.csv"),
        ("SupportData", "ConsumerSupport.csv"),
    ]
    .into_iter()
    .filter_map(|(name, source)| {
        DatasetName::new(name)
            .ok()
            .map(|name| DatasetDescriptor::new(name, source))
    })
    .collect()
}
