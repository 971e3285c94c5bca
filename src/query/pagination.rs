use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use crate::models::Incident;
use crate::query::IncidentFilter;
use crate::state::{IncidentStore, SortOrder};
use serde::Serialize;

/// A validated page request. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Result<Self> {
        if page == 0 {
            return Err(AppError::InvalidPagination(
                "page must be at least 1".to_string(),
            ));
        }
        if limit == 0 {
            return Err(AppError::InvalidPagination(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(Self { page, limit })
    }

    /// Parse raw query values. Missing or blank values take the defaults;
    /// anything non-numeric, non-positive or above the configured maximum
    /// is rejected.
    pub fn parse(page: Option<&str>, limit: Option<&str>, config: &ApiConfig) -> Result<Self> {
        let page = parse_positive(page, "page")?.unwrap_or(1);
        let limit = parse_positive(limit, "limit")?.unwrap_or(config.default_page_limit);

        if limit > config.max_page_limit {
            return Err(AppError::InvalidPagination(format!(
                "limit must not exceed {}",
                config.max_page_limit
            )));
        }

        Self::new(page, limit)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

fn parse_positive(raw: Option<&str>, field: &str) -> Result<Option<u64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .ok()
            .filter(|n| *n >= 1)
            .map(Some)
            .ok_or_else(|| {
                AppError::InvalidPagination(format!("{} must be a positive integer, got '{}'", field, s))
            }),
    }
}

/// `ceil(total / limit)`
pub fn page_count(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit)
}

/// One page of results plus the metadata needed to navigate the rest
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Number of items on this page
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// Fetch one page of incidents, newest first, plus the total match count
pub async fn paginate(
    store: &dyn IncidentStore,
    filter: &IncidentFilter,
    request: PageRequest,
) -> Result<Page<Incident>> {
    let items = store
        .find_incidents(filter, SortOrder::NewestFirst, request.offset(), request.limit())
        .await?;
    let total = store.count_incidents(filter).await?;

    tracing::debug!(
        page = request.page(),
        limit = request.limit(),
        returned = items.len(),
        total,
        "Incident page fetched"
    );

    Ok(Page {
        items,
        total,
        page: request.page(),
        pages: page_count(total, request.limit()),
    })
}
