//! The vulnerable customer list as a view model.
//!
//! Bundles a validated snapshot, the classifier and the current filter
//! state. Product selections are checked against the products actually
//! available in the selected category.

use serde::Serialize;

use crate::classifier::VulnerabilityClassifier;
use crate::customer::{CustomerRecord, CustomerSnapshot, ProductCategory};
use crate::filter::{
    available_products, filter_and_rank, vulnerable, FilterError, FilterState, ScoreBand,
    Selection,
};

/// Shown when the filters match no vulnerable customer.
pub const EMPTY_STATE_MESSAGE: &str = "No vulnerable customers found matching the current filters.";

/// Shown instead of the list until a customer upload has been validated.
pub const DATA_REQUIRED_MESSAGE: &str =
    "Please upload the vulnerability dataset to view customer list.";

/// Counts behind the list header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewSummary {
    pub shown: usize,
    pub total_vulnerable: usize,
    pub has_active_filters: bool,
}

impl ViewSummary {
    /// `"Filtered from N total"`, only while a filter is active.
    pub fn filtered_from(&self) -> Option<String> {
        self.has_active_filters
            .then(|| format!("Filtered from {} total", self.total_vulnerable))
    }

    /// The empty state message when nothing is shown.
    pub fn empty_state(&self) -> Option<&'static str> {
        (self.shown == 0).then_some(EMPTY_STATE_MESSAGE)
    }
}

/// Vulnerable customer list over one snapshot.
#[derive(Debug)]
pub struct VulnerabilityView<'a, C: ?Sized> {
    snapshot: &'a CustomerSnapshot,
    classifier: &'a C,
    filters: FilterState,
}

impl<'a, C> VulnerabilityView<'a, C>
where
    C: VulnerabilityClassifier + ?Sized,
{
    pub fn new(snapshot: &'a CustomerSnapshot, classifier: &'a C) -> Self {
        Self {
            snapshot,
            classifier,
            filters: FilterState::new(),
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn select_category(&mut self, category: Selection<ProductCategory>) {
        self.filters.select_category(category);
    }

    /// Select a product offered in the current category.
    ///
    /// # Errors
    ///
    /// [`FilterError::ProductWithoutCategory`] when no category is selected,
    /// [`FilterError::ProductNotInCategory`] when the product is not among
    /// [`Self::available_products`]. The selection is unchanged on error.
    pub fn select_product(&mut self, product: Selection<String>) -> Result<(), FilterError> {
        if let Selection::Only(name) = &product {
            let Selection::Only(category) = self.filters.category() else {
                return Err(FilterError::ProductWithoutCategory(name.clone()));
            };
            if !self.available_products().iter().any(|p| p == name) {
                return Err(FilterError::ProductNotInCategory {
                    product: name.clone(),
                    category: category.to_string(),
                });
            }
        }
        self.filters.select_product(product);
        Ok(())
    }

    pub fn select_band(&mut self, band: Selection<ScoreBand>) {
        self.filters.select_band(band);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Product choices for the current category.
    pub fn available_products(&self) -> Vec<String> {
        available_products(
            self.snapshot.customers(),
            self.classifier,
            self.filters.category(),
        )
    }

    /// Every vulnerable customer, unfiltered, in upload order.
    pub fn vulnerable(&self) -> Vec<&'a CustomerRecord> {
        vulnerable(self.snapshot.customers(), self.classifier)
    }

    /// The filtered, ranked rows.
    pub fn rows(&self) -> Vec<&'a CustomerRecord> {
        filter_and_rank(self.snapshot.customers(), self.classifier, &self.filters)
    }

    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            shown: self.rows().len(),
            total_vulnerable: self.vulnerable().len(),
            has_active_filters: self.filters.has_active_filters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ThresholdClassifier;
    use crate::upload::parse_customers_str;

    const CSV: &str = "\
Customer ID,Customer Name,Vulnerability Score,Product Category,Product,Vulnerability Flags
C1,Ada,85,Mortgages,Fixed Rate,
C2,Ben,62,Mortgages,Tracker,
C3,Cy,20,Mortgages,Offset,
C4,Di,,Loans,Car Finance,Health
C5,Ed,91,Saver plans,ISA,
";

    fn category(s: &str) -> Selection<ProductCategory> {
        Selection::Only(ProductCategory::new(s).unwrap())
    }

    #[test]
    fn summary_without_filters() {
        let snapshot = parse_customers_str(CSV).unwrap();
        let classifier = ThresholdClassifier::default();
        let view = VulnerabilityView::new(&snapshot, &classifier);
        let summary = view.summary();
        assert_eq!(summary.shown, 4);
        assert_eq!(summary.total_vulnerable, 4);
        assert_eq!(summary.filtered_from(), None);
        assert_eq!(summary.empty_state(), None);
    }

    #[test]
    fn product_must_belong_to_selected_category() {
        let snapshot = parse_customers_str(CSV).unwrap();
        let classifier = ThresholdClassifier::default();
        let mut view = VulnerabilityView::new(&snapshot, &classifier);

        assert_eq!(
            view.select_product(Selection::Only("ISA".into())),
            Err(FilterError::ProductWithoutCategory("ISA".into()))
        );

        view.select_category(category("Mortgages"));
        assert_eq!(view.available_products(), vec!["Fixed Rate", "Tracker"]);
        // Offset exists in Mortgages but only for a non-vulnerable customer.
        assert!(matches!(
            view.select_product(Selection::Only("Offset".into())),
            Err(FilterError::ProductNotInCategory { .. })
        ));
        assert!(view.filters().product().is_all());

        view.select_product(Selection::Only("Tracker".into())).unwrap();
        let rows = view.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name(), "Ben");
        assert_eq!(
            view.summary().filtered_from().as_deref(),
            Some("Filtered from 4 total")
        );
    }

    #[test]
    fn empty_state_when_nothing_matches() {
        let snapshot = parse_customers_str(CSV).unwrap();
        let classifier = ThresholdClassifier::default();
        let mut view = VulnerabilityView::new(&snapshot, &classifier);
        view.select_category(category("Saver plans"));
        view.select_band(Selection::Only("50-60".parse().unwrap()));
        let summary = view.summary();
        assert_eq!(summary.shown, 0);
        assert_eq!(summary.empty_state(), Some(EMPTY_STATE_MESSAGE));

        view.clear_filters();
        assert_eq!(view.summary().shown, 4);
    }
}
