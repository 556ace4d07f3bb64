//! Storage layer for the feedback reporting backend
//!
//! Provides the reporting/recording contract and its SQLite implementation.
//! Every call is one round trip to the database; isolation between
//! concurrent requests is left to SQLite.

pub mod schema;
pub mod sqlite;

use crate::error::Result;
use crate::types::{
    DateRange, Feedback, FeedbackCreate, FeedbackDashboardSummary, FeedbackDetail,
    FeedbackSummary, LowRelevanceGroup, LowRelevanceResult, LowRelevanceResultCreate, NoResultLog,
    NoResultLogCreate, NoResultSummary, Page, PageMetadata, Pagination, QaLog, QaLogCreate,
    RerankResult, RerankResultCreate, SyncLogCreate, SyncLogEntry, SyncRunDetails, SyncRunStats,
    User, UserCreate,
};
use async_trait::async_trait;

pub use sqlite::SqliteStorage;

/// Storage backend trait defining all required operations
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Cheap connectivity check
    async fn ping(&self) -> Result<()>;

    /// Look up a user by username
    async fn get_user(&self, username: &str) -> Result<Option<User>>;

    /// Insert a user with an already-hashed password
    ///
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: &UserCreate, password_hash: &str) -> Result<User>;

    async fn list_users(&self, window: Pagination) -> Result<Page<User>>;

    /// Insert feedback; repeated message ids create independent rows
    async fn record_feedback(&self, feedback: &FeedbackCreate) -> Result<Feedback>;

    /// Feedback joined with QA logs, newest first
    async fn list_feedback(
        &self,
        window: Pagination,
        liked: Option<bool>,
    ) -> Result<Page<FeedbackDetail>>;

    /// Whole-table counts plus the latest feedback per distinct query
    async fn feedback_dashboard_summary(&self, recent_limit: u32)
        -> Result<FeedbackDashboardSummary>;

    /// Satisfaction counts per query, most unsatisfied first
    async fn feedback_summary_by_query(&self, limit: u32) -> Result<Vec<FeedbackSummary>>;

    /// Insert a QA log; fails with `Conflict` on a duplicate task id
    async fn record_qa_log(&self, qa_log: &QaLogCreate) -> Result<QaLog>;

    /// QA logs newest first, each with its rerank results
    async fn list_qa_logs(&self, window: Pagination, search: Option<&str>) -> Result<Page<QaLog>>;

    async fn record_rerank_result(&self, result: &RerankResultCreate) -> Result<RerankResult>;

    async fn record_low_relevance_result(
        &self,
        result: &LowRelevanceResultCreate,
    ) -> Result<LowRelevanceResult>;

    /// Low-relevance rows grouped by query, most recently seen first
    async fn low_relevance_summary(
        &self,
        window: Pagination,
        range: DateRange,
    ) -> Result<Page<LowRelevanceGroup>>;

    async fn record_no_result(&self, log: &NoResultLogCreate) -> Result<NoResultLog>;

    /// No-result counts per query, highest count first
    async fn no_result_summary(&self, limit: u32, range: DateRange)
        -> Result<Vec<NoResultSummary>>;

    async fn record_sync_log(&self, log: &SyncLogCreate) -> Result<SyncLogEntry>;

    /// Insert or overwrite the metadata row for a page
    async fn upsert_page_metadata(&self, metadata: &PageMetadata) -> Result<PageMetadata>;

    /// Per-run action counts, run ids descending
    async fn sync_stats(&self, window: Pagination) -> Result<Page<SyncRunStats>>;

    /// Pages touched by a run; fails with `NotFound` when the run logged nothing
    async fn sync_run_details(&self, sync_run_id: &str) -> Result<SyncRunDetails>;
}
