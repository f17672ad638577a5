//! Monthly aggregates for the sales dashboard.
//!
//! This module is organized into:
//! - `statistics`: Sales totals and sold/unsold counts
//! - `price_range`: The fixed price ranges and the histogram query
//! - `category`: The per-category breakdown
//! - `handlers`: HTTP route handlers, including the combined view

mod category;
mod handlers;
mod price_range;
mod statistics;

pub use category::CategoryCount;
pub use handlers::{CombinedDashboard, get_bar_chart, get_combined, get_pie_chart, get_statistics};
pub use price_range::{PRICE_RANGES, PriceRange, PriceRangeCount, UNBOUNDED_LABEL};
pub use statistics::MonthlyStatistics;
