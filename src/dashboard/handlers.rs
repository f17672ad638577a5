//! Dashboard HTTP handlers.
//!
//! Each handler validates the month before touching the database, then runs
//! its aggregate query through [run_query].

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, Operation,
    db::{Deadline, run_query},
    transaction::{MonthQuery, parse_month},
};

use super::{
    category::{CategoryCount, get_category_counts},
    price_range::{PriceRangeCount, get_price_range_counts},
    statistics::{MonthlyStatistics, get_monthly_statistics},
};

/// The state needed for the dashboard endpoints.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The time budget for each store query.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// Everything the dashboard shows for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedDashboard {
    /// The sales totals.
    pub statistics: MonthlyStatistics,
    /// The price-range histogram.
    pub bar_chart_data: Vec<PriceRangeCount>,
    /// The category breakdown.
    pub pie_chart_data: Vec<CategoryCount>,
}

/// Get the sales totals for a month.
pub async fn get_statistics(
    State(state): State<DashboardState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyStatistics>, Error> {
    let month = parse_month(query.month.as_deref())?;

    run_aggregate(&state, move |connection| get_monthly_statistics(month, connection))
        .await
        .inspect_err(|error| tracing::error!("could not get statistics for {month}: {error}"))
        .map(Json)
        .map_err(|error| error.during(Operation::Statistics))
}

/// Get the price-range histogram for a month.
pub async fn get_bar_chart(
    State(state): State<DashboardState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<PriceRangeCount>>, Error> {
    let month = parse_month(query.month.as_deref())?;

    run_aggregate(&state, move |connection| get_price_range_counts(month, connection))
        .await
        .inspect_err(|error| tracing::error!("could not get price ranges for {month}: {error}"))
        .map(Json)
        .map_err(|error| error.during(Operation::BarChart))
}

/// Get the category breakdown for a month.
pub async fn get_pie_chart(
    State(state): State<DashboardState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<CategoryCount>>, Error> {
    let month = parse_month(query.month.as_deref())?;

    run_aggregate(&state, move |connection| get_category_counts(month, connection))
        .await
        .inspect_err(|error| tracing::error!("could not get categories for {month}: {error}"))
        .map(Json)
        .map_err(|error| error.during(Operation::PieChart))
}

/// Get the statistics, histogram and category breakdown for a month in one response.
///
/// The three aggregates are independent of each other but run under a single
/// hold of the database lock, so a bulk load cannot commit between them and
/// their counts always describe the same set of transactions. If any of them
/// fails the whole request fails.
pub async fn get_combined(
    State(state): State<DashboardState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<CombinedDashboard>, Error> {
    let month = parse_month(query.month.as_deref())?;

    run_aggregate(&state, move |connection| {
        Ok(CombinedDashboard {
            statistics: get_monthly_statistics(month, connection)?,
            bar_chart_data: get_price_range_counts(month, connection)?,
            pie_chart_data: get_category_counts(month, connection)?,
        })
    })
    .await
    .inspect_err(|error| tracing::error!("could not get combined data for {month}: {error}"))
    .map(Json)
    .map_err(|error| error.during(Operation::Combined))
}

/// Run a read-only aggregate within the state's query budget.
async fn run_aggregate<T, F>(state: &DashboardState, aggregate: F) -> Result<T, Error>
where
    F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    run_query(
        state.db_connection.clone(),
        Deadline::after(state.query_timeout),
        move |connection| aggregate(&*connection),
    )
    .await
}
