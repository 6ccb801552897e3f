//! Tabular payload parsing.
//!
//! Payloads are newline-delimited text whose first line is a header. The
//! row count is the number of lines after the header once surrounding
//! whitespace has been trimmed.

use thiserror::Error;

/// The payload was fetched but cannot be counted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Nothing but whitespace: not even a header line.
    #[error("payload is empty (no header row)")]
    Empty,
}

/// Count the data rows of a tabular payload, excluding the header.
///
/// `\r\n` line endings are accepted. Blank lines between rows count as rows;
/// only leading and trailing whitespace is ignored.
pub fn count_rows(payload: &str) -> Result<u64, PayloadError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(PayloadError::Empty);
    }
    let lines = trimmed.split('\n').count() as u64;
    Ok(lines - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn header_only_is_zero_rows() {
        assert_eq!(count_rows("id,name"), Ok(0));
        assert_eq!(count_rows("id,name\n"), Ok(0));
    }

    #[test]
    fn counts_data_lines() {
        assert_eq!(count_rows("id,name\n1,a\n2,b\n3,c"), Ok(3));
    }

    #[test]
    fn trailing_newlines_and_crlf_are_ignored() {
        assert_eq!(count_rows("id,name\r\n1,a\r\n2,b\r\n\r\n"), Ok(2));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert_eq!(count_rows(""), Err(PayloadError::Empty));
        assert_eq!(count_rows(" \n\t\n"), Err(PayloadError::Empty));
    }

    proptest! {
        #[test]
        fn count_matches_number_of_rows_written(rows in 0usize..200) {
            let mut payload = String::from("Customer ID,Score\n");
            for i in 0..rows {
                payload.push_str(&format!("C-{i},{}\n", i % 100));
            }
            prop_assert_eq!(count_rows(&payload), Ok(rows as u64));
        }
    }
}
