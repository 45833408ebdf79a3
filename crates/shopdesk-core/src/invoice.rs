//! # Invoice Numbers
//!
//! Year-scoped sequential invoice identifiers: `INV-2025-000042`.
//!
//! This module only formats, parses and advances numbers. Allocation under
//! concurrency (per-year counter row, unique constraint, retry) happens in
//! shopdesk-db inside the sale transaction.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Prefix shared by every invoice number.
pub const INVOICE_PREFIX: &str = "INV";

/// Minimum number of digits in the sequence part.
pub const SEQUENCE_WIDTH: usize = 6;

/// A parsed invoice number.
///
/// Ordering is by year, then sequence, which matches issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvoiceNumber {
    year: i32,
    sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceParseError {
    #[error("invoice number '{0}' does not start with {INVOICE_PREFIX}-")]
    MissingPrefix(String),

    #[error("invoice number '{0}' has an invalid year")]
    InvalidYear(String),

    #[error("invoice number '{0}' has an invalid sequence")]
    InvalidSequence(String),
}

impl InvoiceNumber {
    pub const fn new(year: i32, sequence: u64) -> Self {
        InvoiceNumber { year, sequence }
    }

    /// The first invoice of a year.
    pub const fn first(year: i32) -> Self {
        InvoiceNumber { year, sequence: 1 }
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The number issued right after this one.
    pub const fn next(&self) -> Self {
        InvoiceNumber {
            year: self.year,
            sequence: self.sequence + 1,
        }
    }

    /// `INV-<year>-`, the prefix every number of `year` starts with.
    pub fn year_prefix(year: i32) -> String {
        format!("{}-{}-", INVOICE_PREFIX, year)
    }
}

/// Next number for `year`, given the highest number already issued in it.
///
/// ## Example
/// ```rust
/// use shopdesk_core::invoice::{next_invoice_number, InvoiceNumber};
///
/// assert_eq!(next_invoice_number(2025, None).to_string(), "INV-2025-000001");
///
/// let last = InvoiceNumber::new(2025, 41);
/// assert_eq!(next_invoice_number(2025, Some(last)).to_string(), "INV-2025-000042");
/// ```
///
/// A highest number from another year restarts the sequence at 1.
pub fn next_invoice_number(year: i32, highest: Option<InvoiceNumber>) -> InvoiceNumber {
    match highest {
        Some(last) if last.year == year => last.next(),
        _ => InvoiceNumber::first(year),
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:0width$}",
            INVOICE_PREFIX,
            self.year,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for InvoiceNumber {
    type Err = InvoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');

        if parts.next() != Some(INVOICE_PREFIX) {
            return Err(InvoiceParseError::MissingPrefix(s.to_string()));
        }

        let year = parts
            .next()
            .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(|| InvoiceParseError::InvalidYear(s.to_string()))?;

        let sequence = parts
            .next()
            .filter(|seq| seq.len() >= SEQUENCE_WIDTH && seq.chars().all(|c| c.is_ascii_digit()))
            .and_then(|seq| seq.parse::<u64>().ok())
            .filter(|seq| *seq > 0)
            .ok_or_else(|| InvoiceParseError::InvalidSequence(s.to_string()))?;

        Ok(InvoiceNumber { year, sequence })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
