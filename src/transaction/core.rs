//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// A sale of a single product.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: i64,
    /// The name of the product.
    pub title: String,
    /// A longer text description of the product.
    pub description: String,
    /// The sale price, never negative.
    pub price: f64,
    /// The product category, e.g. "electronics".
    pub category: String,
    /// When the sale happened, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub date_of_sale: OffsetDateTime,
    /// Whether the product was sold.
    pub sold: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        title: &str,
        price: f64,
        category: &str,
        date_of_sale: OffsetDateTime,
    ) -> NewTransaction {
        NewTransaction {
            title: title.to_owned(),
            description: String::new(),
            price,
            category: category.to_owned(),
            date_of_sale,
            sold: false,
        }
    }
}

/// A transaction that has not been stored yet.
///
/// Optional fields default to an empty description and an unsold product.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// use crate::transaction::Transaction;
///
/// let transaction = Transaction::build(
///         "Mens Casual Slim Fit",
///         15.99,
///         "men's clothing",
///         datetime!(2021-03-27 20:29:54 +05:30),
///     )
///     .description("The color could be slightly different")
///     .sold(true);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    /// The name of the product.
    pub title: String,
    /// A longer text description of the product.
    pub description: String,
    /// The sale price.
    ///
    /// Must be finite and not negative, see [NewTransaction::validate].
    pub price: f64,
    /// The product category. Must not be empty.
    pub category: String,
    /// When the sale happened.
    ///
    /// Any offset is accepted, the date is converted to UTC when it is stored
    /// and the calendar month used for filtering is taken from the UTC date.
    pub date_of_sale: OffsetDateTime,
    /// Whether the product was sold.
    pub sold: bool,
}

impl NewTransaction {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set whether the product was sold.
    pub fn sold(mut self, sold: bool) -> Self {
        self.sold = sold;
        self
    }

    /// Check the record invariants.
    ///
    /// # Errors
    /// Returns a description of the first broken invariant.
    pub fn validate(&self) -> Result<(), String> {
        if !self.price.is_finite() {
            return Err(format!("price {} is not a finite number", self.price));
        }

        if self.price < 0.0 {
            return Err(format!("price {} is negative", self.price));
        }

        if self.category.trim().is_empty() {
            return Err("category is empty".to_owned());
        }

        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of a [Transaction] in the order expected by [map_transaction_row].
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, title, description, price, category, date_of_sale, sold";

/// Insert a new transaction into the database.
///
/// The caller is responsible for validating `transaction` first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let date_of_sale = transaction.date_of_sale.to_offset(UtcOffset::UTC);

    let transaction = connection
        .prepare_cached(&format!(
            "INSERT INTO sale_transaction
                (title, description, price, category, date_of_sale, sale_month, sold,
                 title_folded, description_folded)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                &transaction.title,
                &transaction.description,
                transaction.price,
                &transaction.category,
                date_of_sale,
                u8::from(date_of_sale.month()),
                transaction.sold,
                fold_case(&transaction.title),
                fold_case(&transaction.description),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Lowercase `text` for case-insensitive search.
///
/// SQLite only folds ASCII letters, so the folded copies of the searchable
/// columns are computed here with Unicode case rules.
pub(crate) fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM sale_transaction;", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// `sale_month` holds the calendar month (1-12) of `date_of_sale` so that
/// monthly queries can use an index. `title_folded` and `description_folded`
/// hold the lowercased text that searches match against.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS sale_transaction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL CHECK (price >= 0),
                category TEXT NOT NULL CHECK (category <> ''),
                date_of_sale TEXT NOT NULL,
                sale_month INTEGER NOT NULL CHECK (sale_month BETWEEN 1 AND 12),
                sold INTEGER NOT NULL,
                title_folded TEXT NOT NULL,
                description_folded TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_sale_transaction_month ON sale_transaction(sale_month);",
        (),
    )?;

    // Add composite index used by the category breakdown.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_sale_transaction_month_category \
        ON sale_transaction(sale_month, category);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let description = row.get(2)?;
    let price = row.get(3)?;
    let category = row.get(4)?;
    let date_of_sale = row.get(5)?;
    let sold = row.get(6)?;

    Ok(Transaction {
        id,
        title,
        description,
        price,
        category,
        date_of_sale,
        sold,
    })
}

// ============================================================================
// TESTS
// ============================================================================
