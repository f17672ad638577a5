//! The price-range histogram behind the dashboard bar chart.

use std::fmt::Display;

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use time::Month;

use crate::{Error, transaction::TransactionFilter};

/// The label used for the upper bound of the open-ended price range.
pub const UNBOUNDED_LABEL: &str = "Infinity";

/// A price range that includes both of its bounds.
///
/// A `max` of `None` means the range has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    /// The lowest price in the range.
    pub min: u32,
    /// The highest price in the range, if any.
    pub max: Option<u32>,
}

impl PriceRange {
    const fn new(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    const fn starting_at(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Whether `price` lies within the range, the in-memory twin of
    /// [PriceRange::sql_condition].
    ///
    /// Prices between two adjacent ranges, e.g. 100.5, belong to neither.
    #[cfg(test)]
    fn contains(&self, price: f64) -> bool {
        price >= f64::from(self.min) && self.max.is_none_or(|max| price <= f64::from(max))
    }

    /// The SQL condition matching prices in this range.
    fn sql_condition(&self) -> String {
        match self.max {
            Some(max) => format!("price BETWEEN {} AND {}", self.min, max),
            None => format!("price >= {}", self.min),
        }
    }
}

impl Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "{} - {}", self.min, max),
            None => write!(f, "{} - {}", self.min, UNBOUNDED_LABEL),
        }
    }
}

/// The fixed histogram buckets, in display order.
pub const PRICE_RANGES: [PriceRange; 10] = [
    PriceRange::new(0, 100),
    PriceRange::new(101, 200),
    PriceRange::new(201, 300),
    PriceRange::new(301, 400),
    PriceRange::new(401, 500),
    PriceRange::new(501, 600),
    PriceRange::new(601, 700),
    PriceRange::new(701, 800),
    PriceRange::new(801, 900),
    PriceRange::starting_at(901),
];

/// The number of transactions in one price range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRangeCount {
    /// The range label, e.g. "101 - 200".
    pub range: String,
    /// The number of transactions priced within the range.
    pub count: u64,
}

/// Count the transactions of `month` in each of the [PRICE_RANGES].
///
/// Every range is returned, in order, even when it is empty.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn get_price_range_counts(
    month: Month,
    connection: &Connection,
) -> Result<Vec<PriceRangeCount>, Error> {
    let (condition, params) = TransactionFilter::for_month(month).where_clause();

    let count_columns = PRICE_RANGES
        .iter()
        .map(|range| {
            format!(
                "COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0)",
                range.sql_condition()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let counts = connection
        .prepare(&format!(
            "SELECT {count_columns} FROM sale_transaction WHERE {condition}"
        ))?
        .query_row(params_from_iter(params), |row| {
            (0..PRICE_RANGES.len())
                .map(|index| row.get::<_, u64>(index))
                .collect::<Result<Vec<_>, _>>()
        })?;

    Ok(PRICE_RANGES
        .iter()
        .zip(counts)
        .map(|(range, count)| PriceRangeCount {
            range: range.to_string(),
            count,
        })
        .collect())
}
