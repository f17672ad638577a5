//! Database query helpers for the monthly transaction list.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::Serialize;

use crate::{Error, pagination::PageRequest};

use super::{
    core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
    filter::TransactionFilter,
};

/// One page of the transactions that match a filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// The transactions on the requested page.
    pub transactions: Vec<Transaction>,
    /// The number of matching transactions across all pages.
    pub total: u64,
    /// The requested page number.
    pub current_page: u64,
    /// The number of pages needed to show every matching transaction.
    pub total_pages: u64,
}

/// Count the transactions that match `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_matching_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (condition, params) = filter.where_clause();

    connection
        .prepare(&format!(
            "SELECT COUNT(id) FROM sale_transaction WHERE {condition}"
        ))?
        .query_row(params_from_iter(params), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Get the transactions that match `filter` on the page described by `page`.
///
/// Transactions are ordered by ID, i.e. in the order they were loaded, so
/// that consecutive pages neither skip nor repeat transactions.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Transaction row mapping fails
pub(crate) fn get_transactions_page(
    filter: &TransactionFilter,
    page: PageRequest,
    connection: &Connection,
) -> Result<TransactionPage, Error> {
    let total = count_matching_transactions(filter, connection)?;

    let (condition, mut params) = filter.where_clause();
    params.push(Value::Integer(clamp_to_i64(page.page_size)));
    params.push(Value::Integer(clamp_to_i64(page.offset())));

    let transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM sale_transaction \
            WHERE {condition} \
            ORDER BY id ASC \
            LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(params), map_transaction_row)?
        .collect::<Result<Vec<Transaction>, rusqlite::Error>>()?;

    Ok(TransactionPage {
        transactions,
        total,
        current_page: page.page,
        total_pages: page.page_count(total),
    })
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
