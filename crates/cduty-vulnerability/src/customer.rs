//! # Customer Model
//!
//! One [`CustomerRecord`] per uploaded row, held in an immutable
//! [`CustomerSnapshot`]. Nothing in the core mutates a record after upload;
//! filtered, classified and ranked views are recomputed from the snapshot.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cduty_core::{CustomerId, Timestamp};

// ─── Errors ──────────────────────────────────────────────────────────

/// A customer attribute failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustomerError {
    #[error("vulnerability score must be finite, got {0}")]
    NonFiniteScore(f64),

    #[error("product category must not be empty")]
    EmptyCategory,

    #[error("unknown vulnerability indicator {0:?}")]
    UnknownIndicator(String),
}

// ─── Score ───────────────────────────────────────────────────────────

/// A present, finite vulnerability score.
///
/// An absent score is `Option::None` at the use site, never a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct VulnerabilityScore(f64);

impl VulnerabilityScore {
    pub fn new(value: f64) -> Result<Self, CustomerError> {
        if !value.is_finite() {
            return Err(CustomerError::NonFiniteScore(value));
        }
        // Fold -0.0 into 0.0 so ordering by total_cmp agrees with `==`.
        Ok(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for VulnerabilityScore {
    type Error = CustomerError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VulnerabilityScore> for f64 {
    fn from(score: VulnerabilityScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for VulnerabilityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Category ────────────────────────────────────────────────────────

/// Product category (e.g. `Mortgages`).
///
/// An open set: uploads may carry categories beyond the standard three.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCategory(String);

impl ProductCategory {
    pub const MORTGAGES: &'static str = "Mortgages";
    pub const LOANS: &'static str = "Loans";
    pub const SAVER_PLANS: &'static str = "Saver plans";

    /// Categories offered by the category selector.
    pub const STANDARD: [&'static str; 3] = [Self::MORTGAGES, Self::LOANS, Self::SAVER_PLANS];

    pub fn new(name: impl AsRef<str>) -> Result<Self, CustomerError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CustomerError::EmptyCategory);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The standard categories, in selector order.
    pub fn standard() -> Vec<ProductCategory> {
        Self::STANDARD
            .iter()
            .map(|s| ProductCategory(s.to_string()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductCategory {
    type Error = CustomerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductCategory> for String {
    fn from(category: ProductCategory) -> Self {
        category.0
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Indicators ──────────────────────────────────────────────────────

/// Drivers of vulnerability recorded against a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityIndicator {
    Health,
    LifeEvents,
    Resilience,
    Capability,
}

impl VulnerabilityIndicator {
    pub const ALL: [VulnerabilityIndicator; 4] = [
        Self::Health,
        Self::LifeEvents,
        Self::Resilience,
        Self::Capability,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::LifeEvents => "Life Events",
            Self::Resilience => "Resilience",
            Self::Capability => "Capability",
        }
    }
}

impl std::fmt::Display for VulnerabilityIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VulnerabilityIndicator {
    type Err = CustomerError;

    /// Case-insensitive; spaces, `_` and `-` are ignored
    /// (`Life Events`, `life_events`, `LIFE-EVENTS`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "health" => Ok(Self::Health),
            "lifeevents" => Ok(Self::LifeEvents),
            "resilience" => Ok(Self::Resilience),
            "capability" => Ok(Self::Capability),
            _ => Err(CustomerError::UnknownIndicator(s.to_string())),
        }
    }
}

// ─── Record ──────────────────────────────────────────────────────────

/// One customer row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    id: CustomerId,
    name: String,
    score: Option<VulnerabilityScore>,
    category: ProductCategory,
    product: String,
    #[serde(default)]
    indicators: BTreeSet<VulnerabilityIndicator>,
    /// Remaining uploaded columns, in column order.
    #[serde(default)]
    extra: Vec<(String, String)>,
}

impl CustomerRecord {
    pub fn new(
        id: CustomerId,
        name: impl Into<String>,
        score: Option<VulnerabilityScore>,
        category: ProductCategory,
        product: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            score,
            category,
            product: product.into(),
            indicators: BTreeSet::new(),
            extra: Vec::new(),
        }
    }

    pub fn with_indicator(mut self, indicator: VulnerabilityIndicator) -> Self {
        self.indicators.insert(indicator);
        self
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((column.into(), value.into()));
        self
    }

    pub fn id(&self) -> &CustomerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> Option<VulnerabilityScore> {
        self.score
    }

    /// Score used for ranking: absent counts as 0.
    pub fn rank_score(&self) -> f64 {
        self.score.map_or(0.0, VulnerabilityScore::value)
    }

    pub fn category(&self) -> &ProductCategory {
        &self.category
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn indicators(&self) -> &BTreeSet<VulnerabilityIndicator> {
        &self.indicators
    }

    /// Passthrough columns for detail views.
    pub fn extra_fields(&self) -> &[(String, String)] {
        &self.extra
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────

/// A validated upload: every customer, in upload order.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSnapshot {
    customers: Vec<CustomerRecord>,
    columns: Vec<String>,
    uploaded_at: Timestamp,
}

impl CustomerSnapshot {
    pub(crate) fn new(customers: Vec<CustomerRecord>, columns: Vec<String>) -> Self {
        Self {
            customers,
            columns,
            uploaded_at: Timestamp::now(),
        }
    }

    pub fn customers(&self) -> &[CustomerRecord] {
        &self.customers
    }

    /// Header row of the upload, as written.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn uploaded_at(&self) -> Timestamp {
        self.uploaded_at
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn get(&self, id: &CustomerId) -> Option<&CustomerRecord> {
        self.customers.iter().find(|c| c.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rejects_non_finite() {
        assert!(VulnerabilityScore::new(f64::NAN).is_err());
        assert!(VulnerabilityScore::new(f64::INFINITY).is_err());
        assert_eq!(VulnerabilityScore::new(72.5).unwrap().value(), 72.5);
    }

    #[test]
    fn negative_zero_score_is_zero() {
        let s = VulnerabilityScore::new(-0.0).unwrap();
        assert!(s.value().is_sign_positive());
    }

    #[test]
    fn absent_score_ranks_as_zero() {
        let c = CustomerRecord::new(
            CustomerId::new("C-1").unwrap(),
            "Ada",
            None,
            ProductCategory::new("Loans").unwrap(),
            "Personal Loan",
        );
        assert_eq!(c.score(), None);
        assert_eq!(c.rank_score(), 0.0);
    }

    #[test]
    fn category_is_trimmed_and_non_empty() {
        assert_eq!(ProductCategory::new(" Loans ").unwrap().as_str(), "Loans");
        assert_eq!(ProductCategory::new("  "), Err(CustomerError::EmptyCategory));
        assert_eq!(ProductCategory::standard().len(), 3);
    }

    #[test]
    fn indicator_parsing_is_lenient_about_spelling() {
        for s in ["Life Events", "life_events", "LIFE-EVENTS", "lifeevents"] {
            assert_eq!(
                s.parse::<VulnerabilityIndicator>().unwrap(),
                VulnerabilityIndicator::LifeEvents
            );
        }
        assert!("bereavement".parse::<VulnerabilityIndicator>().is_err());
    }

    #[test]
    fn passthrough_fields_keep_order() {
        let c = CustomerRecord::new(
            CustomerId::new("C-2").unwrap(),
            "Grace",
            Some(VulnerabilityScore::new(81.0).unwrap()),
            ProductCategory::new("Mortgages").unwrap(),
            "Fixed Rate",
        )
        .with_field("Region", "North")
        .with_field("Age", "67");
        assert_eq!(c.extra_fields()[0].0, "Region");
        assert_eq!(c.field("Age"), Some("67"));
        assert_eq!(c.field("Missing"), None);
    }

    #[test]
    fn score_deserialization_is_validated() {
        let ok: VulnerabilityScore = serde_json::from_str("55.5").unwrap();
        assert_eq!(ok.value(), 55.5);
    }
}
