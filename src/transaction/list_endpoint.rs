//! Defines the route handler that lists a month's transactions.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, Operation,
    db::{Deadline, run_query},
    pagination::{PageRequest, PaginationConfig},
};

use super::{
    filter::{TransactionFilter, parse_month},
    query::{TransactionPage, get_transactions_page},
};

/// The state needed for listing transactions.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls the default page and page size.
    pub pagination_config: PaginationConfig,
    /// The time budget for each store query.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// The query parameters for the transaction list.
///
/// Every field is read as a string so that a malformed page or page size can
/// fall back to its default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    /// The calendar month, 1 to 12.
    pub month: Option<String>,
    /// A price to match exactly, or text to find in the title or description.
    pub search: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
    /// The number of transactions per page.
    pub per_page: Option<String>,
}

/// List the transactions sold in a month, one page at a time.
pub async fn get_transactions(
    State(state): State<TransactionListState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionPage>, Error> {
    let month = parse_month(query.month.as_deref())?;
    let filter = TransactionFilter::for_month(month).with_search(query.search.as_deref());
    let page = PageRequest::from_query(
        query.page.as_deref(),
        query.per_page.as_deref(),
        &state.pagination_config,
    );

    let deadline = Deadline::after(state.query_timeout);

    run_query(state.db_connection, deadline, move |connection| {
        get_transactions_page(&filter, page, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not list transactions: {error}"))
    .map(Json)
    .map_err(|error| error.during(Operation::ListTransactions))
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        endpoints,
        pagination::PaginationConfig,
        transaction::{Transaction, create_transaction},
    };

    use super::{TransactionListState, get_transactions};

    fn get_test_state() -> TransactionListState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        TransactionListState {
            db_connection: Arc::new(Mutex::new(conn)),
            pagination_config: PaginationConfig::default(),
            query_timeout: Duration::from_secs(5),
        }
    }

    fn get_test_server(state: TransactionListState) -> TestServer {
        let app = Router::new()
            .route(endpoints::TRANSACTIONS, get(get_transactions))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn insert_march_transactions(state: &TransactionListState, count: usize) {
        let conn = state.db_connection.lock().unwrap();
        for i in 0..count {
            create_transaction(
                &Transaction::build(
                    &format!("Product #{i}"),
                    (i * 10) as f64,
                    "electronics",
                    datetime!(2022-03-15 10:00:00 UTC),
                ),
                &conn,
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn lists_first_page_with_defaults() {
        let state = get_test_state();
        insert_march_transactions(&state, 25);
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "3")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["transactions"].as_array().unwrap().len(), 10);
        assert_eq!(body["total"], 25);
        assert_eq!(body["currentPage"], 1);
        assert_eq!(body["totalPages"], 3);
        assert_eq!(body["transactions"][0]["title"], "Product #0");
        assert_eq!(body["transactions"][0]["dateOfSale"], "2022-03-15T10:00:00Z");
    }

    #[tokio::test]
    async fn honours_page_and_per_page() {
        let state = get_test_state();
        insert_march_transactions(&state, 25);
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "3")
            .add_query_param("page", "3")
            .add_query_param("perPage", "10")
            .await;

        let body: Value = response.json();
        assert_eq!(body["transactions"].as_array().unwrap().len(), 5);
        assert_eq!(body["currentPage"], 3);
    }

    #[tokio::test]
    async fn malformed_paging_falls_back_to_defaults() {
        let state = get_test_state();
        insert_march_transactions(&state, 25);
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "3")
            .add_query_param("page", "first")
            .add_query_param("perPage", "lots")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["transactions"].as_array().unwrap().len(), 10);
        assert_eq!(body["currentPage"], 1);
    }

    #[tokio::test]
    async fn searches_by_price() {
        let state = get_test_state();
        insert_march_transactions(&state, 25);
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "3")
            .add_query_param("search", "120")
            .await;

        let body: Value = response.json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["transactions"][0]["title"], "Product #12");
    }

    #[tokio::test]
    async fn missing_month_is_rejected() {
        let server = get_test_server(get_test_state());

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "Month parameter is required");
    }

    #[tokio::test]
    async fn missing_month_never_touches_the_store() {
        let state = get_test_state();
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DROP TABLE sale_transaction", ())
            .unwrap();
        let server = get_test_server(state);

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_names_the_list() {
        let state = get_test_state();
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DROP TABLE sale_transaction", ())
            .unwrap();
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "3")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["message"], "Error fetching transactions");
    }

    #[tokio::test]
    async fn out_of_range_month_is_rejected() {
        let server = get_test_server(get_test_state());

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "13")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
