//! # Vulnerability Classification
//!
//! Whether a customer counts as vulnerable is decided in exactly one place:
//! an implementation of [`VulnerabilityClassifier`]. The filter pipeline and
//! every view go through the trait; none re-derive the rule.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use cduty_core::DashboardConfig;

use crate::customer::{CustomerRecord, VulnerabilityScore};

/// Default threshold: the floor of the lowest standard score band.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("vulnerability threshold must be a finite number in [0, 100], got {0}")]
    InvalidThreshold(f64),
}

/// Pure predicate over customer records.
///
/// Implementations must be total (defined for every record, including one
/// with no score) and deterministic.
pub trait VulnerabilityClassifier: Send + Sync + fmt::Debug {
    fn is_vulnerable(&self, customer: &CustomerRecord) -> bool;
}

impl<C: VulnerabilityClassifier + ?Sized> VulnerabilityClassifier for &C {
    fn is_vulnerable(&self, customer: &CustomerRecord) -> bool {
        (**self).is_vulnerable(customer)
    }
}

impl<C: VulnerabilityClassifier + ?Sized> VulnerabilityClassifier for Box<C> {
    fn is_vulnerable(&self, customer: &CustomerRecord) -> bool {
        (**self).is_vulnerable(customer)
    }
}

/// Vulnerable when the score reaches the threshold, or when any indicator
/// is recorded. A customer with no score and no indicators is not
/// vulnerable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdClassifier {
    threshold: f64,
}

impl ThresholdClassifier {
    pub fn new(threshold: f64) -> Result<Self, ClassifierError> {
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(ClassifierError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, ClassifierError> {
        Self::new(config.vulnerability_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl VulnerabilityClassifier for ThresholdClassifier {
    fn is_vulnerable(&self, customer: &CustomerRecord) -> bool {
        let by_score = customer
            .score()
            .is_some_and(|s| s.value() >= self.threshold);
        by_score || !customer.indicators().is_empty()
    }
}

// ─── Severity ────────────────────────────────────────────────────────

/// Display severity of a score, for list badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSeverity {
    Low,
    Elevated,
    High,
}

impl ScoreSeverity {
    /// `>= 80` high, `>= 60` elevated, otherwise low.
    pub fn of(score: VulnerabilityScore) -> Self {
        let v = score.value();
        if v >= 80.0 {
            Self::High
        } else if v >= 60.0 {
            Self::Elevated
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ScoreSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Elevated => "elevated",
            Self::High => "high",
        };
        f.write_str(s)
    }
}
