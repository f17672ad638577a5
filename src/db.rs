//! Database setup and the helper that runs store queries off the async executor.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use rusqlite::Connection;

use crate::{Error, transaction::create_transaction_table};

/// Create the tables for the domain models if they do not exist yet.
///
/// # Errors
/// Returns an [Error::SqlError] if a table or index cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    create_transaction_table(connection)?;

    Ok(())
}

/// The point in time by which a store operation must have finished.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    budget: Duration,
    expires_at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub(crate) fn after(budget: Duration) -> Self {
        Self {
            budget,
            expires_at: Instant::now() + budget,
        }
    }

    /// Check that the deadline has not passed yet.
    ///
    /// # Errors
    /// Returns [Error::QueryTimeout] once the deadline has passed.
    pub(crate) fn check(&self) -> Result<(), Error> {
        if Instant::now() >= self.expires_at {
            Err(Error::QueryTimeout(self.budget))
        } else {
            Ok(())
        }
    }
}

/// Run `query` against the shared connection on a blocking thread.
///
/// The database lock is held for the whole of `query`, so a bulk load run
/// through this function excludes every read until it has finished.
///
/// The caller stops waiting once `deadline` passes. If the lock only becomes
/// free after that, `query` is skipped. A query that writes should also check
/// `deadline` itself before committing.
///
/// # Errors
/// Returns:
/// - [Error::QueryTimeout] if `query` does not finish before `deadline`,
/// - [Error::DatabaseLockError] if the lock is poisoned,
/// - [Error::TaskFailed] if the blocking task panicked,
/// - or any error returned by `query`.
pub(crate) async fn run_query<T, F>(
    db_connection: Arc<Mutex<Connection>>,
    deadline: Deadline,
    query: F,
) -> Result<T, Error>
where
    F: FnOnce(&mut Connection) -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || {
        let mut connection = db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        deadline
            .check()
            .inspect_err(|_| tracing::warn!("skipping store query, its deadline passed"))?;

        query(&mut *connection)
    });

    let expires_at = tokio::time::Instant::from_std(deadline.expires_at);

    match tokio::time::timeout_at(expires_at, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            tracing::error!("store query task failed: {join_error}");
            Err(Error::TaskFailed(join_error.to_string()))
        }
        Err(_) => {
            tracing::error!("store query timed out after {:?}", deadline.budget);
            Err(Error::QueryTimeout(deadline.budget))
        }
    }
}
