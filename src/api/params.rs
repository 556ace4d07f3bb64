//! Query-string parameters
//!
//! Numeric fields are signed so out-of-range values reach `Pagination`
//! and get its messages rather than a deserializer error.

use crate::error::Result;
use crate::types::{DateRange, Pagination, MAX_EXPORT_LIMIT, MAX_PAGE_LIMIT};
use serde::Deserialize;

fn default_list_limit() -> i64 {
    100
}

fn default_summary_limit() -> i64 {
    10
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

impl ListParams {
    pub fn window(&self) -> Result<Pagination> {
        Pagination::new(self.skip, self.limit, MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub liked: Option<bool>,
}

impl FeedbackListParams {
    pub fn window(&self) -> Result<Pagination> {
        Pagination::new(self.skip, self.limit, MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QaLogListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: Option<String>,
}

impl QaLogListParams {
    pub fn window(&self) -> Result<Pagination> {
        Pagination::new(self.skip, self.limit, MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LowRelevanceParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl LowRelevanceParams {
    pub fn window(&self) -> Result<Pagination> {
        Pagination::new(self.skip, self.limit, MAX_PAGE_LIMIT)
    }

    pub fn range(&self) -> Result<DateRange> {
        DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

/// `limit` for top-N summaries
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryParams {
    #[serde(default = "default_summary_limit")]
    pub limit: i64,
}

impl SummaryParams {
    pub fn limit(&self) -> Result<u32> {
        Pagination::new(0, self.limit, MAX_PAGE_LIMIT).map(|w| w.limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoResultSummaryParams {
    #[serde(default = "default_summary_limit")]
    pub limit: i64,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl NoResultSummaryParams {
    pub fn limit(&self) -> Result<u32> {
        Pagination::new(0, self.limit, MAX_EXPORT_LIMIT).map(|w| w.limit)
    }

    pub fn range(&self) -> Result<DateRange> {
        DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncStatsParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: i64,
}

impl SyncStatsParams {
    pub fn window(&self) -> Result<Pagination> {
        Pagination::from_page(self.page, self.page_size, MAX_PAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: serde::de::DeserializeOwned>(query: &str) -> T {
        let uri: axum::http::Uri = format!("/?{}", query).parse().unwrap();
        axum::extract::Query::<T>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_list_defaults() {
        let params: ListParams = parse("");
        assert_eq!(params.window().unwrap(), Pagination { skip: 0, limit: 100 });

        let params: ListParams = parse("skip=-1");
        assert_eq!(
            params.window().unwrap_err().to_string(),
            "Skip value cannot be negative"
        );
    }

    #[test]
    fn test_feedback_liked_filter() {
        let params: FeedbackListParams = parse("liked=false&limit=5");
        assert_eq!(params.liked, Some(false));
        assert_eq!(params.window().unwrap().limit, 5);
    }

    #[test]
    fn test_summary_limits() {
        let params: SummaryParams = parse("");
        assert_eq!(params.limit().unwrap(), 10);
        let params: SummaryParams = parse("limit=101");
        assert!(params.limit().is_err());

        let params: NoResultSummaryParams = parse("limit=1000");
        assert_eq!(params.limit().unwrap(), 1000);
        let params: NoResultSummaryParams = parse("limit=1001");
        assert!(params.limit().is_err());
    }

    #[test]
    fn test_sync_stats_page_size_rename() {
        let params: SyncStatsParams = parse("page=2&pageSize=25");
        assert_eq!(params.window().unwrap(), Pagination { skip: 25, limit: 25 });

        let params: SyncStatsParams = parse("");
        assert_eq!(params.window().unwrap(), Pagination { skip: 0, limit: 10 });
    }
}
