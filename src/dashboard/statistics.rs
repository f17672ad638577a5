//! Sales totals for a month.

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use time::Month;

use crate::{Error, transaction::TransactionFilter};

/// The sales totals for one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatistics {
    /// The sum of the prices of every transaction in the month.
    pub total_amount: f64,
    /// The number of products that were sold.
    pub total_items_sold: u64,
    /// The number of products that were not sold.
    pub total_items_not_sold: u64,
}

/// Calculate the sales totals for `month`.
///
/// A month without transactions yields all zeros.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn get_monthly_statistics(
    month: Month,
    connection: &Connection,
) -> Result<MonthlyStatistics, Error> {
    let (condition, params) = TransactionFilter::for_month(month).where_clause();

    connection
        .prepare(&format!(
            "SELECT
                COALESCE(SUM(price), 0.0),
                COALESCE(SUM(CASE WHEN sold THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN sold THEN 0 ELSE 1 END), 0)
            FROM sale_transaction
            WHERE {condition}"
        ))?
        .query_row(params_from_iter(params), |row| {
            Ok(MonthlyStatistics {
                total_amount: row.get(0)?,
                total_items_sold: row.get(1)?,
                total_items_not_sold: row.get(2)?,
            })
        })
        .map_err(|error| error.into())
}
