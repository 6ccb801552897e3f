//! # Filter and Rank
//!
//! Cascading selection over the vulnerable subset of a customer snapshot.
//!
//! ```text
//!   customers ─▶ is_vulnerable ─▶ category ─▶ product ─▶ score band ─▶ sort by score desc
//! ```
//!
//! The product choices offered to the user are the distinct products of
//! the vulnerable customers in the selected category, so a product
//! selection can never point outside its category. Changing the category
//! resets the product selection.
//!
//! [`filter_and_rank`] is pure: it borrows the customers and the filter
//! state and returns references in rank order.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use cduty_core::CdutyError;

use crate::classifier::VulnerabilityClassifier;
use crate::customer::{CustomerRecord, ProductCategory, VulnerabilityScore};

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("invalid score band {band:?}: {reason}")]
    InvalidScoreBand { band: String, reason: String },

    #[error("product {product:?} is not offered to vulnerable customers in category {category}")]
    ProductNotInCategory { product: String, category: String },

    #[error("select a product category before selecting product {0:?}")]
    ProductWithoutCategory(String),
}

impl From<FilterError> for CdutyError {
    fn from(err: FilterError) -> Self {
        CdutyError::Filter(err.to_string())
    }
}

// ─── Selection ───────────────────────────────────────────────────────

/// A selector value: everything, or one specific choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T> Selection<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn as_only(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::All, Self::Only)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(v) => write!(f, "{v}"),
        }
    }
}

// ─── Score Band ──────────────────────────────────────────────────────

/// Inclusive score range, written `"<min>-<max>"` (e.g. `80-90`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBand {
    min: f64,
    max: f64,
}

impl ScoreBand {
    /// Bands offered by the score band selector.
    pub const STANDARD: [&'static str; 5] = ["50-60", "60-70", "70-80", "80-90", "90-100"];

    pub fn new(min: f64, max: f64) -> Result<Self, FilterError> {
        let band = format!("{min}-{max}");
        if !min.is_finite() || !max.is_finite() {
            return Err(FilterError::InvalidScoreBand {
                band,
                reason: "bounds must be finite".into(),
            });
        }
        if min > max {
            return Err(FilterError::InvalidScoreBand {
                band,
                reason: "min must not exceed max".into(),
            });
        }
        Ok(Self { min, max })
    }

    /// The standard bands, in selector order.
    pub fn standard() -> Vec<ScoreBand> {
        Self::STANDARD
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, score: VulnerabilityScore) -> bool {
        let v = score.value();
        v >= self.min && v <= self.max
    }
}

impl FromStr for ScoreBand {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| FilterError::InvalidScoreBand {
            band: s.to_string(),
            reason: reason.to_string(),
        };
        let (min, max) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| invalid("expected <min>-<max>"))?;
        let min: f64 = min
            .trim()
            .parse()
            .map_err(|_| invalid("min is not a number"))?;
        let max: f64 = max
            .trim()
            .parse()
            .map_err(|_| invalid("max is not a number"))?;
        Self::new(min, max).map_err(|e| match e {
            FilterError::InvalidScoreBand { reason, .. } => invalid(&reason),
            other => other,
        })
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

// ─── Filter State ────────────────────────────────────────────────────

/// Current category, product and score band selections.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterState {
    category: Selection<ProductCategory>,
    product: Selection<String>,
    band: Selection<ScoreBand>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> &Selection<ProductCategory> {
        &self.category
    }

    pub fn product(&self) -> &Selection<String> {
        &self.product
    }

    pub fn band(&self) -> &Selection<ScoreBand> {
        &self.band
    }

    /// Select a category. Always resets the product to all.
    pub fn select_category(&mut self, category: Selection<ProductCategory>) {
        self.category = category;
        self.product = Selection::All;
    }

    /// Select a product without checking it against the data. Use
    /// [`VulnerabilityView::select_product`](crate::view::VulnerabilityView::select_product)
    /// to validate against the available products.
    pub fn select_product(&mut self, product: Selection<String>) {
        self.product = product;
    }

    pub fn select_band(&mut self, band: Selection<ScoreBand>) {
        self.band = band;
    }

    /// Reset every selection to all.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn has_active_filters(&self) -> bool {
        !(self.category.is_all() && self.product.is_all() && self.band.is_all())
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────

fn matches_filters(customer: &CustomerRecord, state: &FilterState) -> bool {
    if let Selection::Only(category) = &state.category {
        if customer.category() != category {
            return false;
        }
    }
    if let Selection::Only(product) = &state.product {
        if customer.product() != product {
            return false;
        }
    }
    if let Selection::Only(band) = &state.band {
        // Any band excludes customers with no score.
        if !customer.score().is_some_and(|s| band.contains(s)) {
            return false;
        }
    }
    true
}

/// The vulnerable customers, in input order.
pub fn vulnerable<'a, C>(customers: &'a [CustomerRecord], classifier: &C) -> Vec<&'a CustomerRecord>
where
    C: VulnerabilityClassifier + ?Sized,
{
    customers
        .iter()
        .filter(|c| classifier.is_vulnerable(c))
        .collect()
}

/// Filter the vulnerable customers by `state` and rank them by score,
/// highest first. Absent scores rank as 0. Ties keep input order.
pub fn filter_and_rank<'a, C>(
    customers: &'a [CustomerRecord],
    classifier: &C,
    state: &FilterState,
) -> Vec<&'a CustomerRecord>
where
    C: VulnerabilityClassifier + ?Sized,
{
    let mut ranked: Vec<&CustomerRecord> = customers
        .iter()
        .filter(|c| classifier.is_vulnerable(c))
        .filter(|c| matches_filters(c, state))
        .collect();
    ranked.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
    tracing::debug!(
        input = customers.len(),
        shown = ranked.len(),
        active = state.has_active_filters(),
        "filtered vulnerable customers"
    );
    ranked
}

/// Distinct products of the vulnerable customers in `category`, in first
/// appearance order. Empty when the category is all.
pub fn available_products<C>(
    customers: &[CustomerRecord],
    classifier: &C,
    category: &Selection<ProductCategory>,
) -> Vec<String>
where
    C: VulnerabilityClassifier + ?Sized,
{
    let Selection::Only(category) = category else {
        return Vec::new();
    };
    let mut products: Vec<String> = Vec::new();
    for c in customers {
        if c.category() == category
            && classifier.is_vulnerable(c)
            && !products.iter().any(|p| p == c.product())
        {
            products.push(c.product().to_string());
        }
    }
    products
}
