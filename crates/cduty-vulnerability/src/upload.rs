//! # Customer Upload
//!
//! Parses an uploaded CSV into a [`CustomerSnapshot`]. Validation is
//! all-or-nothing: the first invalid row rejects the whole file and no
//! customer from it is admitted.
//!
//! ## Columns
//!
//! | Column | Required | Rule |
//! |--------|----------|------|
//! | `Customer ID` | yes | non-empty, unique |
//! | `Customer Name` | yes | any |
//! | `Vulnerability Score` | yes | empty (absent) or a number in `[0, 100]` |
//! | `Product Category` | yes | non-empty |
//! | `Product` | yes | non-empty |
//! | `Vulnerability Flags` | no | `;`-separated indicators |
//!
//! Every other column is kept as passthrough data, in column order.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use cduty_core::{CdutyError, CustomerId};

use crate::customer::{
    CustomerRecord, CustomerSnapshot, ProductCategory, VulnerabilityIndicator, VulnerabilityScore,
};

pub const COLUMN_ID: &str = "Customer ID";
pub const COLUMN_NAME: &str = "Customer Name";
pub const COLUMN_SCORE: &str = "Vulnerability Score";
pub const COLUMN_CATEGORY: &str = "Product Category";
pub const COLUMN_PRODUCT: &str = "Product";
pub const COLUMN_FLAGS: &str = "Vulnerability Flags";

/// Columns every upload must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COLUMN_ID,
    COLUMN_NAME,
    COLUMN_SCORE,
    COLUMN_CATEGORY,
    COLUMN_PRODUCT,
];

// ─── Errors ──────────────────────────────────────────────────────────

/// Why an upload was rejected. Rows are 1-based data rows (the header is
/// not counted).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("cannot read upload: {0}")]
    Read(String),

    #[error("malformed CSV: {0}")]
    Csv(String),

    #[error("missing required column {0:?}")]
    MissingColumn(String),

    #[error("column {0:?} appears more than once")]
    DuplicateColumn(String),

    #[error("upload contains no customer rows")]
    NoRows,

    #[error("row {row}: {column} must not be empty")]
    MissingValue { row: usize, column: String },

    #[error("row {row}: customer {id} already appears in row {first_row}")]
    DuplicateCustomer {
        row: usize,
        id: String,
        first_row: usize,
    },

    #[error("row {row}: invalid vulnerability score {value:?}: {reason}")]
    InvalidScore {
        row: usize,
        value: String,
        reason: String,
    },

    #[error("row {row}: unknown vulnerability flag {value:?}")]
    UnknownIndicator { row: usize, value: String },
}

impl From<UploadError> for CdutyError {
    fn from(err: UploadError) -> Self {
        CdutyError::Upload(err.to_string())
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────

struct Columns {
    id: usize,
    name: usize,
    score: usize,
    category: usize,
    product: usize,
    flags: Option<usize>,
}

impl Columns {
    fn resolve(headers: &[String]) -> Result<Self, UploadError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            if index.insert(h.as_str(), i).is_some() {
                return Err(UploadError::DuplicateColumn(h.clone()));
            }
        }
        let required = |column: &str| {
            index
                .get(column)
                .copied()
                .ok_or_else(|| UploadError::MissingColumn(column.to_string()))
        };
        Ok(Self {
            id: required(COLUMN_ID)?,
            name: required(COLUMN_NAME)?,
            score: required(COLUMN_SCORE)?,
            category: required(COLUMN_CATEGORY)?,
            product: required(COLUMN_PRODUCT)?,
            flags: index.get(COLUMN_FLAGS).copied(),
        })
    }

    fn is_known(&self, i: usize) -> bool {
        [self.id, self.name, self.score, self.category, self.product].contains(&i)
            || self.flags == Some(i)
    }
}

fn parse_score(row: usize, raw: &str) -> Result<Option<VulnerabilityScore>, UploadError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = |reason: &str| UploadError::InvalidScore {
        row,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let value: f64 = raw.parse().map_err(|_| invalid("not a number"))?;
    let score = VulnerabilityScore::new(value).map_err(|_| invalid("not finite"))?;
    if !(0.0..=100.0).contains(&score.value()) {
        return Err(invalid("outside [0, 100]"));
    }
    Ok(Some(score))
}

fn parse_indicators(row: usize, raw: &str) -> Result<Vec<VulnerabilityIndicator>, UploadError> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| UploadError::UnknownIndicator {
                row,
                value: s.to_string(),
            })
        })
        .collect()
}

/// Parse and validate a customer upload.
pub fn parse_customers<R: Read>(reader: R) -> Result<CustomerSnapshot, UploadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| UploadError::Csv(e.to_string()))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let columns = Columns::resolve(&headers)?;

    let mut customers = Vec::new();
    let mut seen: HashMap<CustomerId, usize> = HashMap::new();

    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 1;
        let record = result.map_err(|e| UploadError::Csv(format!("row {row}: {e}")))?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let required = |i: usize, column: &str| {
            let value = field(i);
            if value.is_empty() {
                Err(UploadError::MissingValue {
                    row,
                    column: column.to_string(),
                })
            } else {
                Ok(value)
            }
        };

        let id = CustomerId::new(required(columns.id, COLUMN_ID)?).map_err(|_| {
            UploadError::MissingValue {
                row,
                column: COLUMN_ID.to_string(),
            }
        })?;
        if let Some(&first_row) = seen.get(&id) {
            return Err(UploadError::DuplicateCustomer {
                row,
                id: id.to_string(),
                first_row,
            });
        }
        let score = parse_score(row, field(columns.score))?;
        let category = ProductCategory::new(required(columns.category, COLUMN_CATEGORY)?)
            .map_err(|_| UploadError::MissingValue {
                row,
                column: COLUMN_CATEGORY.to_string(),
            })?;
        let product = required(columns.product, COLUMN_PRODUCT)?;
        let indicators = match columns.flags {
            Some(i) => parse_indicators(row, field(i))?,
            None => Vec::new(),
        };

        let mut customer =
            CustomerRecord::new(id.clone(), field(columns.name), score, category, product);
        for indicator in indicators {
            customer = customer.with_indicator(indicator);
        }
        for (i, column) in headers.iter().enumerate() {
            if !columns.is_known(i) {
                customer = customer.with_field(column.as_str(), field(i));
            }
        }

        seen.insert(id, row);
        customers.push(customer);
    }

    if customers.is_empty() {
        return Err(UploadError::NoRows);
    }
    Ok(CustomerSnapshot::new(customers, headers))
}

/// Parse an upload held in memory.
pub fn parse_customers_str(csv: &str) -> Result<CustomerSnapshot, UploadError> {
    parse_customers(csv.as_bytes())
}

// ─── Store ───────────────────────────────────────────────────────────

/// Holds the validated customer snapshot for the session.
///
/// The upload path is the only writer. Readers take an `Arc` to the
/// snapshot and are unaffected by later uploads.
#[derive(Debug, Default)]
pub struct CustomerStore {
    snapshot: Option<Arc<CustomerSnapshot>>,
}

impl CustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once an upload has passed validation.
    pub fn is_validated(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<Arc<CustomerSnapshot>> {
        self.snapshot.clone()
    }

    /// Validate and install an upload. On error the store is unchanged.
    pub fn upload<R: Read>(&mut self, reader: R) -> Result<Arc<CustomerSnapshot>, UploadError> {
        match parse_customers(reader) {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                tracing::info!(
                    customers = snapshot.len(),
                    columns = snapshot.columns().len(),
                    "customer upload validated"
                );
                self.snapshot = Some(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(error = %e, "customer upload rejected");
                Err(e)
            }
        }
    }

    pub fn upload_str(&mut self, csv: &str) -> Result<Arc<CustomerSnapshot>, UploadError> {
        self.upload(csv.as_bytes())
    }

    pub fn upload_path(&mut self, path: &Path) -> Result<Arc<CustomerSnapshot>, UploadError> {
        let file = std::fs::File::open(path)
            .map_err(|e| UploadError::Read(format!("{}: {e}", path.display())))?;
        self.upload(file)
    }
}
