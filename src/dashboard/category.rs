//! The category breakdown behind the dashboard pie chart.

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use time::Month;

use crate::{Error, transaction::TransactionFilter};

/// The number of transactions in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    /// The category name.
    pub category: String,
    /// The number of transactions in the category.
    pub items: u64,
}

/// Count the transactions of `month` per category.
///
/// Only categories with at least one transaction in the month are returned.
/// Callers must not rely on the order of the result.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn get_category_counts(
    month: Month,
    connection: &Connection,
) -> Result<Vec<CategoryCount>, Error> {
    let (condition, params) = TransactionFilter::for_month(month).where_clause();

    connection
        .prepare(&format!(
            "SELECT category, COUNT(id) FROM sale_transaction \
            WHERE {condition} \
            GROUP BY category"
        ))?
        .query_map(params_from_iter(params), |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                items: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<CategoryCount>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Month, macros::datetime};

    use crate::{
        db::initialize,
        transaction::{Transaction, create_transaction},
    };

    use super::{CategoryCount, get_category_counts};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn counts_per_category() {
        let conn = get_test_connection();
        let date = datetime!(2022-11-11 11:11:11 UTC);
        let categories = [
            "electronics",
            "jewelery",
            "electronics",
            "men's clothing",
            "electronics",
        ];
        for category in categories {
            create_transaction(&Transaction::build("Product", 1.0, category, date), &conn).unwrap();
        }
        create_transaction(
            &Transaction::build(
                "Product",
                1.0,
                "women's clothing",
                datetime!(2022-12-01 00:00:00 UTC),
            ),
            &conn,
        )
        .unwrap();

        let mut got = get_category_counts(Month::November, &conn).unwrap();
        got.sort_by(|a, b| a.category.cmp(&b.category));

        assert_eq!(
            got,
            vec![
                CategoryCount {
                    category: "electronics".to_owned(),
                    items: 3
                },
                CategoryCount {
                    category: "jewelery".to_owned(),
                    items: 1
                },
                CategoryCount {
                    category: "men's clothing".to_owned(),
                    items: 1
                },
            ]
        );
    }

    #[test]
    fn empty_month_has_no_categories() {
        let conn = get_test_connection();

        let got = get_category_counts(Month::November, &conn).unwrap();

        assert!(got.is_empty());
    }
}
