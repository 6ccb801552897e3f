//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the keys the dashboard works with. A `DatasetName`
//! cannot be passed where a `CustomerId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CdutyError;

/// Logical name of a dataset (e.g. `ProductData`).
///
/// Unique within a dataset registry. Must be non-empty and contain no
/// whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetName(String);

impl DatasetName {
    /// Create a validated dataset name.
    pub fn new(name: impl Into<String>) -> Result<Self, CdutyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CdutyError::InvalidIdentifier(
                "dataset name must not be empty".to_string(),
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(CdutyError::InvalidIdentifier(format!(
                "dataset name must not contain whitespace: {name:?}"
            )));
        }
        Ok(Self(name))
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DatasetName {
    type Error = CdutyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DatasetName> for String {
    fn from(name: DatasetName) -> Self {
        name.0
    }
}

impl std::fmt::Display for DatasetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable unique identifier of a customer within an uploaded snapshot.
///
/// Surrounding whitespace is trimmed; the trimmed value must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Create a validated customer identifier.
    pub fn new(id: impl AsRef<str>) -> Result<Self, CdutyError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CdutyError::InvalidIdentifier(
                "customer id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CustomerId {
    type Error = CdutyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CustomerId> for String {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single load attempt of one dataset.
///
/// Issued when a dataset enters `loading`; the completing transition must
/// present the same id, so a stale completion cannot overwrite a newer
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub Uuid);

impl AttemptId {
    /// Generate a new random attempt identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attempt:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_name_accepts_simple_names() {
        let name = DatasetName::new("ProductData").unwrap();
        assert_eq!(name.as_str(), "ProductData");
        assert_eq!(name.to_string(), "ProductData");
    }

    #[test]
    fn dataset_name_rejects_empty() {
        assert!(matches!(
            DatasetName::new(""),
            Err(CdutyError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn dataset_name_rejects_whitespace() {
        assert!(DatasetName::new("Product Data").is_err());
        assert!(DatasetName::new("ProductData\n").is_err());
    }

    #[test]
    fn customer_id_trims_and_rejects_blank() {
        assert_eq!(CustomerId::new("  C-001 ").unwrap().as_str(), "C-001");
        assert!(CustomerId::new("   ").is_err());
    }

    #[test]
    fn attempt_ids_are_unique_and_prefixed() {
        let a = AttemptId::new();
        let b = AttemptId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("attempt:"));
    }

    #[test]
    fn dataset_name_deserialization_is_validated() {
        let ok: DatasetName = serde_json::from_str("\"PricingData\"").unwrap();
        assert_eq!(ok.as_str(), "PricingData");
        assert!(serde_json::from_str::<DatasetName>("\"\"").is_err());
    }
}
