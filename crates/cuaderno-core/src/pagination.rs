//! Pagination utilities for list endpoints.
//!
//! Both offset-based (`limit` + `offset`) and page-based (`limit` + `page`)
//! pagination are accepted. When `page` is provided it takes precedence over
//! `offset`.
//!
//! Every paginated endpoint answers with the same envelope:
//!
//! ```json
//! {
//!   "data": [...],
//!   "meta": { "total": 42, "limit": 10, "offset": 20, "page": 3, "has_more": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::serde::deserialize_optional;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Maximum items per page (the limit that was applied)
    pub limit: i64,
    /// Number of items skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Current page number (only present if page-based pagination was used)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    /// Builds the metadata for a page fetched with `params` out of `total` rows.
    #[must_use]
    pub fn from_params(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();

        Self {
            total,
            limit,
            offset: Some(offset),
            page: params.page(),
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// Query parameters for pagination.
///
/// - `limit` is clamped to the range [1, 100]
/// - `offset` is clamped to a minimum of 0
/// - `page` is clamped to a minimum of 1
///
/// Empty query values (`?limit=`) are treated as absent.
#[derive(Debug, Clone, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0, ignored if `page` is set)
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub offset: Option<i64>,
    /// Page number (1-indexed)
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub page: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_LIMIT),
            offset: Some(0),
            page: None,
        }
    }
}

impl PaginationParams {
    /// Returns the effective limit, clamped to [1, 100].
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Returns the effective offset, derived from `page` when present.
    #[must_use]
    pub fn offset(&self) -> i64 {
        if let Some(page) = self.page {
            let page = page.max(1);
            (page - 1).saturating_mul(self.limit())
        } else {
            self.offset.unwrap_or(0).max(0)
        }
    }

    /// Returns the page number if provided, clamped to a minimum of 1.
    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}
