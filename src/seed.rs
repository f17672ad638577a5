//! Loading the seed dataset into the transaction store.
//!
//! The seed dataset is a JSON array of product sales. It can be downloaded by
//! the initialize endpoint or read from a file by the `load_seed` binary.

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error, Operation,
    db::{Deadline, run_query},
    transaction::{NewTransaction, Transaction, replace_all_transactions_before},
};

/// The public product transaction dataset.
pub const DEFAULT_SEED_URL: &str = "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

/// One sale in the seed dataset.
///
/// Fields that the store does not keep, such as `id` and `image`, are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedRecord {
    title: String,
    #[serde(default)]
    description: String,
    price: f64,
    category: String,
    #[serde(with = "time::serde::rfc3339")]
    date_of_sale: OffsetDateTime,
    sold: bool,
}

impl SeedRecord {
    fn into_new_transaction(self) -> NewTransaction {
        Transaction::build(&self.title, self.price, &self.category, self.date_of_sale)
            .description(&self.description)
            .sold(self.sold)
    }
}

/// Parse the seed dataset from its JSON text.
///
/// # Errors
/// Returns [Error::SeedDecode] if `json` is not an array of seed records.
pub(crate) fn parse_seed_records(json: &str) -> Result<Vec<NewTransaction>, Error> {
    let records: Vec<SeedRecord> =
        serde_json::from_str(json).map_err(|error| Error::SeedDecode(error.to_string()))?;

    Ok(records
        .into_iter()
        .map(SeedRecord::into_new_transaction)
        .collect())
}

/// Download the seed dataset from `url`.
///
/// # Errors
/// Returns:
/// - [Error::SeedFetch] if the request fails or the server does not reply with a success status,
/// - or [Error::SeedDecode] if the body is not an array of seed records.
pub(crate) async fn fetch_seed_records(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<NewTransaction>, Error> {
    tracing::info!("Fetching seed data from {url}");

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|error| Error::SeedFetch(error.to_string()))?;

    let body = response
        .text()
        .await
        .map_err(|error| Error::SeedFetch(error.to_string()))?;

    parse_seed_records(&body)
}

/// Read the seed dataset from a JSON file.
///
/// # Errors
/// Returns:
/// - [Error::SeedFile] if the file cannot be read,
/// - or [Error::SeedDecode] if it is not an array of seed records.
pub fn load_seed_file(path: &Path) -> Result<Vec<NewTransaction>, Error> {
    let json = std::fs::read_to_string(path)
        .map_err(|error| Error::SeedFile(format!("{}: {error}", path.display())))?;

    parse_seed_records(&json)
}

/// The state needed for initializing the database.
#[derive(Debug, Clone)]
pub struct SeedState {
    /// The database connection for replacing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where to download the seed dataset from.
    pub seed_url: String,
    /// The HTTP client for downloading the seed dataset.
    pub http_client: reqwest::Client,
    /// The time budget for the bulk load.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for SeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            seed_url: state.seed_url.clone(),
            http_client: state.http_client.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// The reply to a successful initialization.
#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    /// A human readable confirmation.
    pub message: &'static str,
}

/// Replace the stored transactions with the seed dataset.
///
/// The dataset is downloaded in full before the store is touched, so a failed
/// download leaves the existing transactions in place. The load must finish
/// within the query budget, otherwise it is rolled back.
pub async fn initialize_transactions(
    State(state): State<SeedState>,
) -> Result<Json<InitializeResponse>, Error> {
    let transactions = fetch_seed_records(&state.http_client, &state.seed_url)
        .await
        .inspect_err(|error| tracing::error!("could not fetch seed data: {error}"))
        .map_err(|error| error.during(Operation::Initialize))?;

    let deadline = Deadline::after(state.query_timeout);

    run_query(state.db_connection, deadline, move |connection| {
        replace_all_transactions_before(&transactions, deadline, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not load seed data: {error}"))
    .map_err(|error| error.during(Operation::Initialize))?;

    Ok(Json(InitializeResponse {
        message: "Database initialized with seed data",
    }))
}
