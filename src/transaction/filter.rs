//! The filter shared by every monthly transaction query.
//!
//! A [TransactionFilter] is an immutable value. Queries render it into a SQL
//! `WHERE` clause with [TransactionFilter::where_clause], so the count and the
//! page of a list request are built from the same conditions without sharing a
//! query builder.

use rusqlite::types::Value;
use serde::Deserialize;
use time::Month;

use crate::Error;

use super::core::fold_case;

/// The query parameters shared by all monthly endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// The calendar month, 1 to 12.
    pub month: Option<String>,
}

/// Parse the required `month` query parameter.
///
/// # Errors
/// Returns:
/// - [Error::MissingMonth] if `month` is absent or blank,
/// - or [Error::InvalidMonth] if it is not an integer from 1 to 12.
pub(crate) fn parse_month(month: Option<&str>) -> Result<Month, Error> {
    let month = month
        .map(str::trim)
        .filter(|month| !month.is_empty())
        .ok_or(Error::MissingMonth)?;

    month
        .parse::<u8>()
        .ok()
        .and_then(|number| Month::try_from(number).ok())
        .ok_or_else(|| Error::InvalidMonth(month.to_owned()))
}

/// How a search term narrows the transactions of a month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SearchTerm {
    /// Match transactions whose price is exactly this value.
    Price(f64),
    /// Match transactions whose title or description contains this text,
    /// ignoring case.
    Text(String),
}

impl SearchTerm {
    /// Interpret a raw search string.
    ///
    /// A string that parses as a finite number searches by price, anything
    /// else searches the text fields. Blank strings yield `None`.
    pub(crate) fn parse(search: &str) -> Option<Self> {
        let search = search.trim();

        if search.is_empty() {
            return None;
        }

        match search.parse::<f64>() {
            Ok(price) if price.is_finite() => Some(Self::Price(price)),
            _ => Some(Self::Text(search.to_owned())),
        }
    }
}

/// Selects the transactions sold in a calendar month of any year, optionally
/// narrowed by a search term.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransactionFilter {
    pub month: Month,
    pub search: Option<SearchTerm>,
}

impl TransactionFilter {
    /// A filter for every transaction in `month`.
    pub(crate) fn for_month(month: Month) -> Self {
        Self {
            month,
            search: None,
        }
    }

    /// Narrow the filter with a raw search string, see [SearchTerm::parse].
    pub(crate) fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search.and_then(SearchTerm::parse);
        self
    }

    /// Render the filter as a SQL condition and its positional parameters.
    ///
    /// The condition uses `?` placeholders, so it can be combined with
    /// further conditions as long as their parameters are appended in order.
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clause = "sale_month = ?".to_owned();
        let mut params = vec![Value::Integer(u8::from(self.month).into())];

        match &self.search {
            None => {}
            Some(SearchTerm::Price(price)) => {
                clause.push_str(" AND price = ?");
                params.push(Value::Real(*price));
            }
            Some(SearchTerm::Text(text)) => {
                // `instr` matches literally, so `%` and `_` need no escaping.
                clause.push_str(
                    " AND (instr(title_folded, ?) > 0 OR instr(description_folded, ?) > 0)",
                );
                let needle = fold_case(text);
                params.push(Value::Text(needle.clone()));
                params.push(Value::Text(needle));
            }
        }

        (clause, params)
    }
}
