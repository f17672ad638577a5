//! Implements a struct that holds the state of the REST server.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

/// How long a single store query may run before the request is failed.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the seed dataset download may take.
const SEED_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The config that controls how to page transaction lists.
    pub pagination_config: PaginationConfig,

    /// Where the initialize endpoint downloads the seed dataset from.
    pub seed_url: String,

    /// The HTTP client used to download the seed dataset.
    pub http_client: reqwest::Client,

    /// The time budget for each store query.
    pub query_timeout: Duration,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the HTTP
    /// client cannot be built.
    pub fn new(
        db_connection: Connection,
        seed_url: &str,
        pagination_config: PaginationConfig,
        query_timeout: Duration,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let http_client = reqwest::Client::builder()
            .timeout(SEED_FETCH_TIMEOUT)
            .build()
            .map_err(|error| Error::SeedFetch(error.to_string()))?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            pagination_config,
            seed_url: seed_url.to_owned(),
            http_client,
            query_timeout,
        })
    }
}
