//! Sales Dashboard is a web API for browsing monthly sales transactions.
//!
//! The library provides a JSON REST API that lists a month's transactions
//! with search and pagination, and serves the aggregates behind the dashboard
//! charts: monthly statistics, a price-range histogram and a category
//! breakdown.

#![warn(missing_docs)]

use std::{fmt, net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod dashboard;
mod db;
mod endpoints;
mod logging;
mod pagination;
mod routing;
mod seed;
mod transaction;

pub use app_state::{AppState, DEFAULT_QUERY_TIMEOUT};
pub use dashboard::{
    CategoryCount, CombinedDashboard, MonthlyStatistics, PRICE_RANGES, PriceRange,
    PriceRangeCount, UNBOUNDED_LABEL,
};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use seed::{DEFAULT_SEED_URL, load_seed_file};
pub use transaction::{NewTransaction, Transaction, count_transactions, replace_all_transactions};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The operations the API serves, used to tell the client which one failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Replacing the store with the seed dataset.
    Initialize,
    /// Listing a month's transactions.
    ListTransactions,
    /// The monthly sales totals.
    Statistics,
    /// The price-range histogram.
    BarChart,
    /// The category breakdown.
    PieChart,
    /// The statistics, histogram and category breakdown together.
    Combined,
}

impl Operation {
    /// The message sent to the client when the operation fails on the server.
    fn failure_message(self) -> &'static str {
        match self {
            Operation::Initialize => "Error initializing database",
            Operation::ListTransactions => "Error fetching transactions",
            Operation::Statistics => "Error fetching statistics",
            Operation::BarChart => "Error fetching bar chart data",
            Operation::PieChart => "Error fetching pie chart data",
            Operation::Combined => "Error fetching combined data",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Initialize => "initialize the database",
            Operation::ListTransactions => "list transactions",
            Operation::Statistics => "get statistics",
            Operation::BarChart => "get bar chart data",
            Operation::PieChart => "get pie chart data",
            Operation::Combined => "get combined data",
        };

        f.write_str(name)
    }
}

/// The errors that may occur in the application.
///
/// Validation errors are the client's fault and are reported with status 400.
/// Every other error is logged on the server and reported to the client as a
/// generic 500 response.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The `month` query parameter was not provided.
    #[error("month parameter is required")]
    MissingMonth,

    /// The `month` query parameter was not an integer from 1 to 12.
    #[error("invalid month \"{0}\"")]
    InvalidMonth(String),

    /// The seed dataset could not be downloaded.
    #[error("could not fetch seed data: {0}")]
    SeedFetch(String),

    /// The seed dataset was not valid JSON or did not have the expected shape.
    #[error("could not decode seed data: {0}")]
    SeedDecode(String),

    /// The seed dataset file could not be read.
    #[error("could not read seed file: {0}")]
    SeedFile(String),

    /// A record in a bulk load broke one of the record invariants.
    ///
    /// `index` is the position of the offending record in the input.
    #[error("record {index} is invalid: {reason}")]
    InvalidRecord {
        /// The position of the record in the input list.
        index: usize,
        /// Which invariant the record broke.
        reason: String,
    },

    /// The requested route does not exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A store query did not finish within the configured budget.
    #[error("the query did not finish within {0:?}")]
    QueryTimeout(Duration),

    /// The blocking task running a store query panicked or was cancelled.
    #[error("the query task failed: {0}")]
    TaskFailed(String),

    /// A server-side error while serving an API operation.
    #[error("could not {operation}: {error}")]
    OperationFailed {
        /// The operation that failed.
        operation: Operation,
        /// What went wrong.
        error: Box<Error>,
    },
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl Error {
    /// Attribute a server-side error to `operation` so the client is told
    /// which operation failed. Client errors are returned unchanged.
    pub(crate) fn during(self, operation: Operation) -> Self {
        if matches!(self, Error::OperationFailed { .. })
            || self.status_and_message().0.is_client_error()
        {
            return self;
        }

        Error::OperationFailed {
            operation,
            error: Box::new(self),
        }
    }

    /// The HTTP status code and the message that is safe to show the client.
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Error::MissingMonth => (StatusCode::BAD_REQUEST, "Month parameter is required"),
            Error::InvalidMonth(_) => (
                StatusCode::BAD_REQUEST,
                "Month must be an integer from 1 to 12",
            ),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            Error::SeedFetch(_)
            | Error::SeedDecode(_)
            | Error::SeedFile(_)
            | Error::InvalidRecord { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error initializing database",
            ),
            Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::QueryTimeout(_)
            | Error::TaskFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching transaction data",
            ),
            Error::OperationFailed { operation, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                operation.failure_message(),
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Server error details are logged and never sent to the client.
        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}
