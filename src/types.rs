//! Core data types for the feedback reporting backend
//!
//! Records mirror the persisted tables, `*Create` types are the write payloads
//! accepted from the QA pipeline, and the summary types are the shapes the
//! dashboard reads. Pagination and date-range parameters live here too so
//! every layer validates them the same way.

use crate::error::{FeedbackError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default upper bound for `limit` on list and summary endpoints
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Upper bound for `limit` on the no-result export endpoint
pub const MAX_EXPORT_LIMIT: u32 = 1000;

/// Administrator or dashboard user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

/// Payload for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Bearer token handed out by `/login`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Thumbs up/down left on an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub id: i64,
    /// Logical join key onto `QaLog::task_id`
    pub message_id: String,
    pub liked: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackCreate {
    pub message_id: String,
    pub liked: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Feedback joined with the QA exchange it refers to
///
/// `query` and `response` are absent when no QA log carries the message id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackDetail {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub query: Option<String>,
    pub response: Option<String>,
}

/// Per-query satisfaction counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackSummary {
    pub query: String,
    pub satisfied_count: i64,
    pub unsatisfied_count: i64,
    pub total_count: i64,
}

/// Most recent feedback for one distinct query text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentFeedback {
    pub id: i64,
    pub message_id: String,
    pub query: String,
    pub liked: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackDashboardSummary {
    pub total_feedback: i64,
    pub positive_count: i64,
    pub negative_count: i64,
    pub recent_feedback: Vec<RecentFeedback>,
}

/// Recorded question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaLog {
    pub id: i64,
    pub task_id: String,
    pub query: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
    /// Ordered by relevance, highest first
    #[serde(default)]
    pub rerank_results: Vec<RerankResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QaLogCreate {
    pub task_id: String,
    pub query: String,
    pub response: String,
}

/// One candidate's score during reranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankResult {
    pub id: i64,
    pub task_id: String,
    pub original_index: i64,
    pub content: Option<String>,
    pub similarity: Option<f64>,
    pub relevance: f64,
    /// Producer-defined payload
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RerankResultCreate {
    pub task_id: String,
    pub original_index: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub similarity: Option<f64>,
    pub relevance: f64,
    #[serde(default, alias = "metadata_")]
    pub metadata: Option<serde_json::Value>,
}

/// Retrieval candidate that scored below the relevance threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowRelevanceResult {
    pub id: i64,
    pub query: String,
    pub original_index: i64,
    pub relevance_score: f64,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LowRelevanceResultCreate {
    pub query: String,
    pub original_index: i64,
    pub relevance_score: f64,
    #[serde(default)]
    pub content: Option<String>,
}

/// Low-relevance rows rolled up by query text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowRelevanceGroup {
    pub query: String,
    pub count: i64,
    pub avg_relevance_score: f64,
    pub latest_created_at: DateTime<Utc>,
    /// Every matching row in the range, newest first
    pub results: Vec<LowRelevanceResult>,
}

/// Query that retrieved nothing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoResultLog {
    pub id: i64,
    pub query: String,
    pub task_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoResultLogCreate {
    pub query: String,
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoResultSummary {
    pub query: String,
    pub count: i64,
}

/// Action recorded by the OneNote sync job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncAction {
    Created,
    Updated,
    Deleted,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Created => "CREATED",
            SyncAction::Updated => "UPDATED",
            SyncAction::Deleted => "DELETED",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CREATED" => Ok(SyncAction::Created),
            "UPDATED" => Ok(SyncAction::Updated),
            "DELETED" => Ok(SyncAction::Deleted),
            other => Err(FeedbackError::Validation(format!(
                "Unknown sync action type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogEntry {
    pub log_id: i64,
    pub sync_run_id: String,
    pub page_id: String,
    pub action_type: SyncAction,
    pub log_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogCreate {
    pub sync_run_id: String,
    pub page_id: String,
    pub action_type: SyncAction,
    /// Server time when omitted
    #[serde(default)]
    pub log_timestamp: Option<DateTime<Utc>>,
}

/// Latest known metadata for a OneNote page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub page_id: String,
    pub last_modified_time: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub section_name: Option<String>,
}

/// Body of `PUT /onenote-sync/pages/{page_id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadataUpdate {
    #[serde(default)]
    pub last_modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
}

impl PageMetadataUpdate {
    pub fn into_metadata(self, page_id: String) -> PageMetadata {
        PageMetadata {
            page_id,
            last_modified_time: self.last_modified_time,
            title: self.title,
            section_name: self.section_name,
        }
    }
}

/// Per-run action counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunStats {
    pub sync_run_id: String,
    /// Earliest log timestamp in the run
    pub sync_date: DateTime<Utc>,
    pub created_count: i64,
    pub updated_count: i64,
    pub deleted_count: i64,
}

/// Page touched by a sync run, resolved against page metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncPage {
    pub page_id: String,
    pub title: String,
    pub section_name: String,
    pub last_modified_time: Option<DateTime<Utc>>,
    pub log_timestamp: DateTime<Utc>,
}

/// Placeholder title for pages without metadata
pub const UNKNOWN_PAGE_TITLE: &str = "N/A";

/// Placeholder section for pages without metadata
pub const UNKNOWN_PAGE_SECTION: &str = "Info unavailable";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunDetails {
    pub sync_run_id: String,
    pub created_pages: Vec<SyncPage>,
    pub updated_pages: Vec<SyncPage>,
    pub deleted_pages: Vec<SyncPage>,
}

impl SyncRunDetails {
    pub fn is_empty(&self) -> bool {
        self.created_pages.is_empty() && self.updated_pages.is_empty() && self.deleted_pages.is_empty()
    }
}

/// Filtered total plus one window of rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub total: i64,
    pub data: Vec<T>,
}

/// Page-numbered sync statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsPage {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub data: Vec<SyncRunStats>,
}

/// Validated offset/limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u32,
    pub limit: u32,
}

impl Pagination {
    /// Validate `skip >= 0` and `1 <= limit <= max_limit`
    pub fn new(skip: i64, limit: i64, max_limit: u32) -> Result<Self> {
        if skip < 0 {
            return Err(FeedbackError::Validation(
                "Skip value cannot be negative".to_string(),
            ));
        }
        if limit < 1 || limit > i64::from(max_limit) {
            return Err(FeedbackError::Validation(format!(
                "Limit must be between 1 and {}",
                max_limit
            )));
        }
        let skip = u32::try_from(skip).map_err(|_| {
            FeedbackError::Validation(format!("Skip value too large: {}", skip))
        })?;

        Ok(Self {
            skip,
            limit: limit as u32,
        })
    }

    /// Page-numbered variant: `page >= 1`, `1 <= page_size <= max_limit`
    pub fn from_page(page: i64, page_size: i64, max_limit: u32) -> Result<Self> {
        if page < 1 {
            return Err(FeedbackError::Validation(
                "Page must be at least 1".to_string(),
            ));
        }
        if page_size < 1 || page_size > i64::from(max_limit) {
            return Err(FeedbackError::Validation(format!(
                "Page size must be between 1 and {}",
                max_limit
            )));
        }
        let skip = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| FeedbackError::Validation("Page out of range".to_string()))?;
        Self::new(skip, page_size, max_limit)
    }
}

/// Optional inclusive creation-time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

impl DateRange {
    /// Parse ISO-8601 bounds; a bare `end` date covers its whole day
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_iso8601(s, Bound::Start))
            .transpose()?;
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_iso8601(s, Bound::End))
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(FeedbackError::Validation(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }

        Ok(Self { start, end })
    }
}

fn parse_iso8601(raw: &str, bound: Bound) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => NaiveTime::MIN,
            Bound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
                .unwrap_or(NaiveTime::MIN),
        };
        return Ok(date.and_time(time).and_utc());
    }

    Err(FeedbackError::Validation(format!(
        "Invalid date '{}': expected ISO-8601 (YYYY-MM-DD or RFC 3339)",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pagination_bounds() {
        assert_eq!(
            Pagination::new(0, 1, MAX_PAGE_LIMIT).unwrap(),
            Pagination { skip: 0, limit: 1 }
        );
        assert!(Pagination::new(0, 100, MAX_PAGE_LIMIT).is_ok());
        assert!(Pagination::new(-1, 10, MAX_PAGE_LIMIT).is_err());
        assert!(Pagination::new(0, 0, MAX_PAGE_LIMIT).is_err());
        assert!(Pagination::new(0, 101, MAX_PAGE_LIMIT).is_err());
        assert!(Pagination::new(0, 1000, MAX_EXPORT_LIMIT).is_ok());
        assert!(Pagination::new(0, 1001, MAX_EXPORT_LIMIT).is_err());
    }

    #[test]
    fn test_pagination_messages() {
        let err = Pagination::new(-5, 10, MAX_PAGE_LIMIT).unwrap_err();
        assert_eq!(err.to_string(), "Skip value cannot be negative");

        let err = Pagination::new(0, 500, MAX_PAGE_LIMIT).unwrap_err();
        assert_eq!(err.to_string(), "Limit must be between 1 and 100");
    }

    #[test]
    fn test_page_numbers() {
        let window = Pagination::from_page(3, 20, MAX_PAGE_LIMIT).unwrap();
        assert_eq!(window, Pagination { skip: 40, limit: 20 });
        assert!(Pagination::from_page(0, 20, MAX_PAGE_LIMIT).is_err());
        assert!(Pagination::from_page(1, 0, MAX_PAGE_LIMIT).is_err());
    }

    #[test]
    fn test_date_range_formats() {
        let range = DateRange::parse(Some("2024-03-01"), Some("2024-03-02")).unwrap();
        assert_eq!(range.start, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        let end = range.end.unwrap();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");

        let range = DateRange::parse(Some("2024-03-01T10:00:00+02:00"), None).unwrap();
        assert_eq!(range.start, Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        assert!(range.end.is_none());

        let range = DateRange::parse(Some("2024-03-01T10:00:00"), Some("")).unwrap();
        assert_eq!(range.start, Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()));
        assert!(range.end.is_none());
    }

    #[test]
    fn test_date_range_rejects_garbage() {
        assert!(DateRange::parse(Some("yesterday"), None).is_err());
        assert!(DateRange::parse(Some("2024-03-05"), Some("2024-03-01")).is_err());
        assert_eq!(DateRange::parse(None, None).unwrap(), DateRange::default());
    }

    #[test]
    fn test_sync_action_round_trip() {
        for action in [SyncAction::Created, SyncAction::Updated, SyncAction::Deleted] {
            assert_eq!(action.as_str().parse::<SyncAction>().unwrap(), action);
        }
        assert!("MOVED".parse::<SyncAction>().is_err());
        assert_eq!(
            serde_json::to_string(&SyncAction::Deleted).unwrap(),
            "\"DELETED\""
        );
    }

    #[test]
    fn test_sync_bodies_are_camel_case() {
        let details = SyncRunDetails {
            sync_run_id: "run-1".to_string(),
            created_pages: vec![SyncPage {
                page_id: "p1".to_string(),
                title: UNKNOWN_PAGE_TITLE.to_string(),
                section_name: UNKNOWN_PAGE_SECTION.to_string(),
                last_modified_time: None,
                log_timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            }],
            updated_pages: Vec::new(),
            deleted_pages: Vec::new(),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["syncRunId"], "run-1");
        assert_eq!(json["createdPages"][0]["sectionName"], UNKNOWN_PAGE_SECTION);
        assert!(json["deletedPages"].as_array().unwrap().is_empty());
        assert!(json.get("sync_run_id").is_none());

        let create: SyncLogCreate = serde_json::from_str(
            r#"{"syncRunId":"run-1","pageId":"p1","actionType":"UPDATED"}"#,
        )
        .unwrap();
        assert_eq!(create.action_type, SyncAction::Updated);
        assert!(create.log_timestamp.is_none());
    }

    #[test]
    fn test_user_hash_never_serialized() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            full_name: None,
            is_admin: false,
            created_at: Utc::now(),
            password_hash: "$2b$12$secret".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_rerank_metadata_alias() {
        let create: RerankResultCreate = serde_json::from_str(
            r#"{"task_id":"t1","original_index":2,"relevance":0.4,"metadata_":{"source":"wiki"}}"#,
        )
        .unwrap();
        assert_eq!(create.metadata.unwrap()["source"], "wiki");
        assert!(create.similarity.is_none());
    }
}
