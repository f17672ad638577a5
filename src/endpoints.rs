//! The API endpoints URIs.

/// The route that replaces the stored transactions with the seed dataset.
pub const INITIALIZE: &str = "/transactions/initialize";
/// The route that lists a month's transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for a month's sales totals.
pub const STATISTICS: &str = "/transactions/statistics";
/// The route for a month's price-range histogram.
pub const BAR_CHART: &str = "/transactions/bar-chart";
/// The route for a month's category breakdown.
pub const PIE_CHART: &str = "/transactions/pie-chart";
/// The route for the statistics, histogram and category breakdown together.
pub const COMBINED: &str = "/transactions/combined";
