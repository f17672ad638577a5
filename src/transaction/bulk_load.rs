//! Replaces the whole transaction store in one go.

use rusqlite::Connection;

use crate::{Error, db::Deadline};

use super::core::{NewTransaction, create_transaction};

/// Replace every stored transaction with `transactions`.
///
/// The old rows are deleted and the new rows inserted inside a single SQLite
/// transaction, so other connections see either the old or the new set.
/// Loading the same input twice leaves the same records, although the IDs
/// keep counting up.
///
/// Returns the number of transactions inserted.
///
/// # Errors
/// Returns:
/// - [Error::InvalidRecord] if any transaction breaks a record invariant, in
///   which case the store is left untouched,
/// - or [Error::SqlError] if the delete or an insert fails.
pub fn replace_all_transactions(
    transactions: &[NewTransaction],
    connection: &mut Connection,
) -> Result<usize, Error> {
    replace_all(transactions, None, connection)
}

/// Like [replace_all_transactions], but rolls back instead of committing if
/// `deadline` passes before the new rows are in place.
///
/// # Errors
/// Returns [Error::QueryTimeout] if `deadline` passed, in which case the store
/// is left untouched, or any error [replace_all_transactions] returns.
pub(crate) fn replace_all_transactions_before(
    transactions: &[NewTransaction],
    deadline: Deadline,
    connection: &mut Connection,
) -> Result<usize, Error> {
    replace_all(transactions, Some(deadline), connection)
}

fn replace_all(
    transactions: &[NewTransaction],
    deadline: Option<Deadline>,
    connection: &mut Connection,
) -> Result<usize, Error> {
    for (index, transaction) in transactions.iter().enumerate() {
        transaction
            .validate()
            .map_err(|reason| Error::InvalidRecord { index, reason })?;
    }

    let check_deadline = || deadline.as_ref().map_or(Ok(()), Deadline::check);

    // Dropping `sql_transaction` without committing rolls it back.
    let sql_transaction = connection.transaction()?;

    let deleted = sql_transaction.execute("DELETE FROM sale_transaction", ())?;

    for transaction in transactions {
        check_deadline()?;
        create_transaction(transaction, &sql_transaction)?;
    }

    check_deadline()
        .inspect_err(|_| tracing::warn!("bulk load ran out of time, rolling back"))?;

    sql_transaction.commit()?;

    tracing::info!(
        "Replaced {deleted} stored transactions with {} new transactions",
        transactions.len()
    );

    Ok(transactions.len())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::{Deadline, initialize},
        transaction::{Transaction, count_transactions, create_transaction},
    };

    use super::{replace_all_transactions, replace_all_transactions_before};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn sample_transactions() -> Vec<crate::NewTransaction> {
        vec![
            Transaction::build(
                "Backpack",
                109.95,
                "men's clothing",
                datetime!(2021-11-27 20:29:54 UTC),
            ),
            Transaction::build("Ring", 695.0, "jewelery", datetime!(2022-03-01 00:00:00 UTC))
                .sold(true),
        ]
    }

    #[test]
    fn replaces_existing_transactions() {
        let mut conn = get_test_connection();
        create_transaction(
            &Transaction::build("Old", 1.0, "electronics", datetime!(2020-01-01 00:00:00 UTC)),
            &conn,
        )
        .unwrap();

        let inserted = replace_all_transactions(&sample_transactions(), &mut conn).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(count_transactions(&conn).unwrap(), 2);
        let old_count: u64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sale_transaction WHERE title = 'Old'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(old_count, 0);
    }

    #[test]
    fn repeated_loads_converge() {
        let mut conn = get_test_connection();

        replace_all_transactions(&sample_transactions(), &mut conn).unwrap();
        replace_all_transactions(&sample_transactions(), &mut conn).unwrap();

        assert_eq!(count_transactions(&conn).unwrap(), 2);
    }

    #[test]
    fn empty_input_empties_the_store() {
        let mut conn = get_test_connection();
        replace_all_transactions(&sample_transactions(), &mut conn).unwrap();

        let inserted = replace_all_transactions(&[], &mut conn).unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn invalid_record_leaves_store_untouched() {
        let mut conn = get_test_connection();
        replace_all_transactions(&sample_transactions(), &mut conn).unwrap();
        let mut transactions = sample_transactions();
        transactions.push(Transaction::build(
            "Broken",
            5.0,
            "",
            datetime!(2022-01-01 00:00:00 UTC),
        ));

        let result = replace_all_transactions(&transactions, &mut conn);

        assert_eq!(
            result,
            Err(Error::InvalidRecord {
                index: 2,
                reason: "category is empty".to_owned()
            })
        );
        assert_eq!(count_transactions(&conn).unwrap(), 2);
    }

    #[test]
    fn expired_deadline_rolls_back() {
        let mut conn = get_test_connection();
        replace_all_transactions(&sample_transactions(), &mut conn).unwrap();
        let replacement = vec![Transaction::build(
            "Replacement",
            1.0,
            "electronics",
            datetime!(2022-01-01 00:00:00 UTC),
        )];

        let result = replace_all_transactions_before(
            &replacement,
            Deadline::after(Duration::ZERO),
            &mut conn,
        );

        assert_eq!(result, Err(Error::QueryTimeout(Duration::ZERO)));
        assert_eq!(count_transactions(&conn).unwrap(), 2);
    }

    #[test]
    fn loads_within_deadline() {
        let mut conn = get_test_connection();

        let inserted = replace_all_transactions_before(
            &sample_transactions(),
            Deadline::after(Duration::from_secs(60)),
            &mut conn,
        )
        .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(count_transactions(&conn).unwrap(), 2);
    }
}
