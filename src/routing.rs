//! Application router configuration.

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    dashboard::{get_bar_chart, get_combined, get_pie_chart, get_statistics},
    endpoints,
    seed::initialize_transactions,
    transaction::get_transactions,
};

/// Return a router with all the app's routes.
///
/// Any origin may call the API so that the dashboard front end can be served
/// from a different host.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::INITIALIZE, get(initialize_transactions))
        .route(endpoints::TRANSACTIONS, get(get_transactions))
        .route(endpoints::STATISTICS, get(get_statistics))
        .route(endpoints::BAR_CHART, get(get_bar_chart))
        .route(endpoints::PIE_CHART, get(get_pie_chart))
        .route(endpoints::COMBINED, get(get_combined))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod router_tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::{
        AppState, build_router, endpoints,
        pagination::PaginationConfig,
        transaction::{Transaction, replace_all_transactions},
    };

    fn get_test_server() -> (TestServer, AppState) {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(
            conn,
            "http://127.0.0.1:9/unused",
            PaginationConfig::default(),
            Duration::from_secs(5),
        )
        .expect("Could not create app state");

        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

        (server, state)
    }

    #[tokio::test]
    async fn serves_every_read_endpoint() {
        let (server, state) = get_test_server();
        replace_all_transactions(
            &[Transaction::build("Ring", 10.0, "jewelery", datetime!(2022-03-01 12:00:00 UTC))],
            &mut state.db_connection.lock().unwrap(),
        )
        .unwrap();

        for endpoint in [
            endpoints::TRANSACTIONS,
            endpoints::STATISTICS,
            endpoints::BAR_CHART,
            endpoints::PIE_CHART,
            endpoints::COMBINED,
        ] {
            server
                .get(endpoint)
                .add_query_param("month", "3")
                .await
                .assert_status_ok();
        }
    }

    #[tokio::test]
    async fn missing_month_is_rejected_on_every_read_endpoint() {
        let (server, _) = get_test_server();

        for endpoint in [
            endpoints::TRANSACTIONS,
            endpoints::STATISTICS,
            endpoints::BAR_CHART,
            endpoints::PIE_CHART,
            endpoints::COMBINED,
        ] {
            let response = server.get(endpoint).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["message"], "Month parameter is required", "{endpoint}");
        }
    }

    #[tokio::test]
    async fn empty_store_returns_empty_results() {
        let (server, _) = get_test_server();

        for month in 1..=12 {
            let month = month.to_string();

            let list: Value = server
                .get(endpoints::TRANSACTIONS)
                .add_query_param("month", &month)
                .await
                .json();
            assert_eq!(list["total"], 0);
            assert_eq!(list["transactions"].as_array().unwrap().len(), 0);

            let statistics: Value = server
                .get(endpoints::STATISTICS)
                .add_query_param("month", &month)
                .await
                .json();
            assert_eq!(statistics["totalItemsSold"], 0);
            assert_eq!(statistics["totalItemsNotSold"], 0);
        }
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _) = get_test_server();

        let response = server.get("/transactions/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["message"], "Not found");
    }
}
