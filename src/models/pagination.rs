use serde::{Deserialize, Serialize};

use super::Recommendation;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// `?page=&limit=` query of the paginated collection view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    /// Number of rows to skip. Negative for pages below 1, which the store rejects.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Pagination metadata returned alongside a page of recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_recommendations: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(total_recommendations: i64, query: &PageQuery) -> Self {
        // Ceiling division that cannot overflow
        let total_pages = if query.limit > 0 {
            total_recommendations / query.limit
                + i64::from(total_recommendations % query.limit != 0)
        } else {
            0
        };

        Self {
            total_recommendations,
            total_pages,
            current_page: query.page,
            limit: query.limit,
        }
    }
}

/// One page of a collection's recommendations
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationPage {
    pub recommendations: Vec<Recommendation>,
    pub pagination: Pagination,
}
