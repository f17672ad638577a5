//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// A validated page selection.
///
/// Both `page` and `page_size` are at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of items on a page.
    pub page_size: u64,
}

impl PageRequest {
    /// Build a page request from raw query parameters.
    ///
    /// Parsing is lenient: a missing, unparseable or zero value silently
    /// falls back to the default in `config`.
    pub(crate) fn from_query(
        page: Option<&str>,
        page_size: Option<&str>,
        config: &PaginationConfig,
    ) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(config.default_page.max(1)),
            page_size: parse_positive(page_size).unwrap_or(config.default_page_size.max(1)),
        }
    }

    /// The number of items to skip to reach the start of this page.
    pub(crate) fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// The number of pages needed to show `total` items.
    pub(crate) fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|&value| value > 0)
}
