//! Transaction storage and the monthly transaction list.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` builder
//! - The month/search filter shared by all monthly queries
//! - Database functions for storing, replacing and paging transactions
//! - The route handler for the transaction list

mod bulk_load;
mod core;
mod filter;
mod list_endpoint;
mod query;

pub use bulk_load::replace_all_transactions;
pub(crate) use bulk_load::replace_all_transactions_before;
pub use core::{NewTransaction, Transaction, count_transactions, create_transaction_table};
pub(crate) use filter::{MonthQuery, TransactionFilter, parse_month};
pub use list_endpoint::get_transactions;

#[cfg(test)]
pub use core::create_transaction;
