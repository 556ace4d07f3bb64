//! SQLite storage backend implementation
//!
//! Uses rusqlite behind a deadpool-sqlite connection pool. Each operation
//! checks out one pooled connection and runs its SQL inside `interact`, so
//! blocking SQLite calls never run on the async executor.

use crate::error::{FeedbackError, Result};
use crate::storage::{schema::SCHEMA, ReportStorage};
use crate::types::{
    DateRange, Feedback, FeedbackCreate, FeedbackDashboardSummary, FeedbackDetail,
    FeedbackSummary, LowRelevanceGroup, LowRelevanceResult, LowRelevanceResultCreate, NoResultLog,
    NoResultLogCreate, NoResultSummary, Page, PageMetadata, Pagination, QaLog, QaLogCreate,
    RecentFeedback, RerankResult, RerankResultCreate, SyncAction, SyncLogCreate, SyncLogEntry,
    SyncPage, SyncRunDetails, SyncRunStats, User, UserCreate, UNKNOWN_PAGE_SECTION,
    UNKNOWN_PAGE_TITLE,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_sqlite::{Config, Pool, PoolConfig, Runtime};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default connection pool size
const DEFAULT_POOL_SIZE: usize = 16;

/// Fixed-width so lexical order matches chronological order
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

const USER_COLUMNS: &str = "id, username, password, full_name, is_admin, created_at";
const FEEDBACK_COLUMNS: &str = "id, message_id, liked, reason, created_at";
const QA_LOG_COLUMNS: &str = "id, task_id, query, response, created_at";
const RERANK_COLUMNS: &str =
    "id, task_id, original_index, content, similarity, relevance, metadata, created_at";
const LOW_RELEVANCE_COLUMNS: &str =
    "id, query, original_index, relevance_score, content, created_at";
const NO_RESULT_COLUMNS: &str = "id, query, task_id, created_at";
const SYNC_LOG_COLUMNS: &str = "log_id, sync_run_id, page_id, action_type, log_timestamp";
const PAGE_METADATA_COLUMNS: &str = "page_id, last_modified_time, title, section_name";

/// SQLite storage backend
pub struct SqliteStorage {
    pool: Pool,
}

impl SqliteStorage {
    /// Create a storage backend for the database file at `db_path`
    ///
    /// # Example
    /// ```ignore
    /// let storage = SqliteStorage::new("feedback.db")?;
    /// storage.init_schema().await?;
    /// ```
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_pool_size(db_path, DEFAULT_POOL_SIZE)
    }

    /// Create a storage backend with a custom pool size
    pub fn with_pool_size<P: AsRef<Path>>(db_path: P, pool_size: usize) -> Result<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let path_str = path.to_string_lossy().to_string();
        info!(
            "Creating SQLite pool at: {} (pool_size: {})",
            path_str, pool_size
        );

        let mut config = Config::new(path_str);
        config.pool = Some(PoolConfig::new(pool_size.max(1)));
        let pool = config.create_pool(Runtime::Tokio1).map_err(|e| {
            FeedbackError::Database(format!("Failed to create connection pool: {}", e))
        })?;

        Ok(Self { pool })
    }

    /// Create tables and indexes (safe to call repeatedly)
    pub async fn init_schema(&self) -> Result<()> {
        info!("Applying database schema...");

        self.run("init_schema", |conn| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        info!("Database schema ready");
        Ok(())
    }

    /// Run `op` on a pooled connection with foreign keys enforced
    ///
    /// Database failures are logged with the operation name and returned
    /// unchanged.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.pool.get().await.map_err(|e| {
            error!("{}: failed to get connection from pool: {}", op, e);
            FeedbackError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        let result = conn
            .interact(move |conn| {
                conn.busy_timeout(Duration::from_secs(5))?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                register_casefold(conn)?;
                f(conn)
            })
            .await
            .map_err(|e| FeedbackError::Database(format!("Pool interaction failed: {}", e)))?;

        if let Err(FeedbackError::Database(ref msg)) = result {
            error!("{} failed: {}", op, msg);
        }

        result
    }
}

/// `casefold(text)`: Unicode lowercase, NULL-preserving
///
/// SQLite's own LIKE only folds ASCII letters.
fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn now_sql() -> String {
    ts_to_sql(&Utc::now())
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn ts_column(row: &Row<'_>, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let idx = row.as_ref().column_index(name)?;
    let raw: String = row.get(idx)?;
    parse_ts(idx, &raw)
}

fn opt_ts_column(row: &Row<'_>, name: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let idx = row.as_ref().column_index(name)?;
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse_ts(idx, &raw)).transpose()
}

fn range_params(range: &DateRange) -> [Value; 2] {
    let bound = |ts: Option<DateTime<Utc>>| match ts {
        Some(ts) => Value::Text(ts_to_sql(&ts)),
        None => Value::Null,
    };
    [bound(range.start), bound(range.end)]
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Run a query carrying `COUNT(*) OVER () AS total` and collect one window
///
/// `filters` bind the leading parameters of both statements; limit and
/// offset are appended for `select_sql`. When the window is empty the
/// total comes from `count_sql`.
fn windowed<T>(
    conn: &Connection,
    select_sql: &str,
    count_sql: &str,
    filters: Vec<Value>,
    window: Pagination,
    map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Page<T>> {
    let mut bound = filters.clone();
    bound.push(Value::Integer(i64::from(window.limit)));
    bound.push(Value::Integer(i64::from(window.skip)));

    let mut stmt = conn.prepare(select_sql)?;
    let mut rows = stmt.query(params_from_iter(bound.iter()))?;

    let mut total = None;
    let mut data = Vec::new();
    while let Some(row) = rows.next()? {
        total = Some(row.get::<_, i64>("total")?);
        data.push(map(row)?);
    }

    let total = match total {
        Some(total) => total,
        None => conn.query_row(count_sql, params_from_iter(filters.iter()), |row| row.get(0))?,
    };

    Ok(Page { total, data })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        full_name: row.get("full_name")?,
        is_admin: row.get("is_admin")?,
        created_at: ts_column(row, "created_at")?,
        password_hash: row.get("password")?,
    })
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get("id")?,
        message_id: row.get("message_id")?,
        liked: row.get("liked")?,
        reason: row.get("reason")?,
        created_at: ts_column(row, "created_at")?,
    })
}

fn qa_log_from_row(row: &Row<'_>) -> rusqlite::Result<QaLog> {
    Ok(QaLog {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        query: row.get("query")?,
        response: row.get("response")?,
        created_at: ts_column(row, "created_at")?,
        rerank_results: Vec::new(),
    })
}

fn rerank_from_row(row: &Row<'_>) -> rusqlite::Result<RerankResult> {
    let metadata_idx = row.as_ref().column_index("metadata")?;
    let metadata: Option<String> = row.get(metadata_idx)?;
    let metadata = metadata
        .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(metadata_idx, Type::Text, Box::new(e))
        })?;

    Ok(RerankResult {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        original_index: row.get("original_index")?,
        content: row.get("content")?,
        similarity: row.get("similarity")?,
        relevance: row.get("relevance")?,
        metadata,
        created_at: ts_column(row, "created_at")?,
    })
}

fn low_relevance_from_row(row: &Row<'_>) -> rusqlite::Result<LowRelevanceResult> {
    Ok(LowRelevanceResult {
        id: row.get("id")?,
        query: row.get("query")?,
        original_index: row.get("original_index")?,
        relevance_score: row.get("relevance_score")?,
        content: row.get("content")?,
        created_at: ts_column(row, "created_at")?,
    })
}

fn no_result_from_row(row: &Row<'_>) -> rusqlite::Result<NoResultLog> {
    Ok(NoResultLog {
        id: row.get("id")?,
        query: row.get("query")?,
        task_id: row.get("task_id")?,
        created_at: ts_column(row, "created_at")?,
    })
}

fn sync_action_column(row: &Row<'_>, name: &str) -> rusqlite::Result<SyncAction> {
    let idx = row.as_ref().column_index(name)?;
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn sync_log_from_row(row: &Row<'_>) -> rusqlite::Result<SyncLogEntry> {
    Ok(SyncLogEntry {
        log_id: row.get("log_id")?,
        sync_run_id: row.get("sync_run_id")?,
        page_id: row.get("page_id")?,
        action_type: sync_action_column(row, "action_type")?,
        log_timestamp: ts_column(row, "log_timestamp")?,
    })
}

fn page_metadata_from_row(row: &Row<'_>) -> rusqlite::Result<PageMetadata> {
    Ok(PageMetadata {
        page_id: row.get("page_id")?,
        last_modified_time: opt_ts_column(row, "last_modified_time")?,
        title: row.get("title")?,
        section_name: row.get("section_name")?,
    })
}

#[async_trait]
impl ReportStorage for SqliteStorage {
    async fn ping(&self) -> Result<()> {
        self.run("ping", |conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        debug!("Fetching user: {}", username);
        let username = username.to_string();

        self.run("get_user", move |conn| {
            let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
            Ok(conn
                .query_row(&sql, params![username], user_from_row)
                .optional()?)
        })
        .await
    }

    async fn create_user(&self, user: &UserCreate, password_hash: &str) -> Result<User> {
        debug!("Creating user: {}", user.username);
        let user = user.clone();
        let password_hash = password_hash.to_string();

        self.run("create_user", move |conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                params![user.username],
                |row| row.get(0),
            )?;
            if exists {
                return Err(FeedbackError::Conflict(
                    "Username already registered".to_string(),
                ));
            }

            tx.execute(
                "INSERT INTO users (username, password, full_name, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.username,
                    password_hash,
                    user.full_name,
                    user.is_admin,
                    now_sql()
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FeedbackError::Conflict("Username already registered".to_string())
                } else {
                    e.into()
                }
            })?;

            let id = tx.last_insert_rowid();
            let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
            let created = tx.query_row(&sql, params![id], user_from_row)?;
            tx.commit()?;

            Ok(created)
        })
        .await
    }

    async fn list_users(&self, window: Pagination) -> Result<Page<User>> {
        self.run("list_users", move |conn| {
            let sql = format!(
                "SELECT {}, COUNT(*) OVER () AS total FROM users
                 ORDER BY id ASC
                 LIMIT ?1 OFFSET ?2",
                USER_COLUMNS
            );
            windowed(
                conn,
                &sql,
                "SELECT COUNT(*) FROM users",
                Vec::new(),
                window,
                user_from_row,
            )
        })
        .await
    }

    async fn record_feedback(&self, feedback: &FeedbackCreate) -> Result<Feedback> {
        debug!("Recording feedback for message: {}", feedback.message_id);
        let feedback = feedback.clone();

        self.run("record_feedback", move |conn| {
            conn.execute(
                "INSERT INTO feedback (message_id, liked, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![feedback.message_id, feedback.liked, feedback.reason, now_sql()],
            )?;

            let sql = format!("SELECT {} FROM feedback WHERE id = ?1", FEEDBACK_COLUMNS);
            Ok(conn.query_row(&sql, params![conn.last_insert_rowid()], feedback_from_row)?)
        })
        .await
    }

    async fn list_feedback(
        &self,
        window: Pagination,
        liked: Option<bool>,
    ) -> Result<Page<FeedbackDetail>> {
        self.run("list_feedback", move |conn| {
            let liked = match liked {
                Some(liked) => Value::Integer(i64::from(liked)),
                None => Value::Null,
            };

            windowed(
                conn,
                "SELECT f.id, f.message_id, f.liked, f.reason, f.created_at,
                        q.query, q.response, COUNT(*) OVER () AS total
                 FROM feedback f
                 LEFT JOIN qa_logs q ON q.task_id = f.message_id
                 WHERE (?1 IS NULL OR f.liked = ?1)
                 ORDER BY f.created_at DESC, f.id DESC
                 LIMIT ?2 OFFSET ?3",
                "SELECT COUNT(*) FROM feedback f WHERE (?1 IS NULL OR f.liked = ?1)",
                vec![liked],
                window,
                |row| {
                    Ok(FeedbackDetail {
                        feedback: feedback_from_row(row)?,
                        query: row.get("query")?,
                        response: row.get("response")?,
                    })
                },
            )
        })
        .await
    }

    async fn feedback_dashboard_summary(
        &self,
        recent_limit: u32,
    ) -> Result<FeedbackDashboardSummary> {
        self.run("feedback_dashboard_summary", move |conn| {
            let tx = conn.transaction()?;

            let (total_feedback, positive_count, negative_count) = tx.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN liked = 1 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN liked = 0 THEN 1 ELSE 0 END), 0)
                 FROM feedback",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            let recent_feedback = {
                let mut stmt = tx.prepare(
                    "SELECT id, message_id, query, liked, reason, created_at FROM (
                         SELECT f.id, f.message_id, q.query, f.liked, f.reason, f.created_at,
                                ROW_NUMBER() OVER (
                                    PARTITION BY q.query
                                    ORDER BY f.created_at DESC, f.id DESC
                                ) AS rn
                         FROM feedback f
                         JOIN qa_logs q ON q.task_id = f.message_id
                     )
                     WHERE rn = 1
                     ORDER BY query ASC, created_at DESC
                     LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![recent_limit], |row| {
                    Ok(RecentFeedback {
                        id: row.get("id")?,
                        message_id: row.get("message_id")?,
                        query: row.get("query")?,
                        liked: row.get("liked")?,
                        reason: row.get("reason")?,
                        created_at: ts_column(row, "created_at")?,
                    })
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };

            tx.commit()?;

            Ok(FeedbackDashboardSummary {
                total_feedback,
                positive_count,
                negative_count,
                recent_feedback,
            })
        })
        .await
    }

    async fn feedback_summary_by_query(&self, limit: u32) -> Result<Vec<FeedbackSummary>> {
        self.run("feedback_summary_by_query", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT q.query AS query,
                        SUM(CASE WHEN f.liked = 1 THEN 1 ELSE 0 END) AS satisfied_count,
                        SUM(CASE WHEN f.liked = 0 THEN 1 ELSE 0 END) AS unsatisfied_count,
                        COUNT(f.id) AS total_count
                 FROM qa_logs q
                 JOIN feedback f ON q.task_id = f.message_id
                 GROUP BY q.query
                 ORDER BY unsatisfied_count DESC, total_count DESC, q.query ASC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(FeedbackSummary {
                    query: row.get("query")?,
                    satisfied_count: row.get("satisfied_count")?,
                    unsatisfied_count: row.get("unsatisfied_count")?,
                    total_count: row.get("total_count")?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn record_qa_log(&self, qa_log: &QaLogCreate) -> Result<QaLog> {
        debug!("Recording QA log: {}", qa_log.task_id);
        let qa_log = qa_log.clone();

        self.run("record_qa_log", move |conn| {
            conn.execute(
                "INSERT INTO qa_logs (task_id, query, response, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![qa_log.task_id, qa_log.query, qa_log.response, now_sql()],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FeedbackError::Conflict(format!(
                        "QA log already recorded for task {}",
                        qa_log.task_id
                    ))
                } else {
                    e.into()
                }
            })?;

            let sql = format!("SELECT {} FROM qa_logs WHERE id = ?1", QA_LOG_COLUMNS);
            Ok(conn.query_row(&sql, params![conn.last_insert_rowid()], qa_log_from_row)?)
        })
        .await
    }

    async fn list_qa_logs(&self, window: Pagination, search: Option<&str>) -> Result<Page<QaLog>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        self.run("list_qa_logs", move |conn| {
            let filter = pattern.map(Value::Text).unwrap_or(Value::Null);
            let select = format!(
                r"SELECT {}, COUNT(*) OVER () AS total FROM qa_logs
                  WHERE (?1 IS NULL OR casefold(query) LIKE casefold(?1) ESCAPE '\')
                  ORDER BY created_at DESC, id DESC
                  LIMIT ?2 OFFSET ?3",
                QA_LOG_COLUMNS
            );
            let mut page = windowed(
                conn,
                &select,
                r"SELECT COUNT(*) FROM qa_logs
                  WHERE (?1 IS NULL OR casefold(query) LIKE casefold(?1) ESCAPE '\')",
                vec![filter],
                window,
                qa_log_from_row,
            )?;

            if page.data.is_empty() {
                return Ok(page);
            }

            let task_ids: Vec<Value> = page
                .data
                .iter()
                .map(|log| Value::Text(log.task_id.clone()))
                .collect();
            let sql = format!(
                "SELECT {} FROM rerank_results WHERE task_id IN ({})
                 ORDER BY relevance DESC, id ASC",
                RERANK_COLUMNS,
                placeholders(task_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let results = stmt
                .query_map(params_from_iter(task_ids.iter()), rerank_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut by_task: HashMap<String, Vec<RerankResult>> = HashMap::new();
            for result in results {
                by_task.entry(result.task_id.clone()).or_default().push(result);
            }
            for log in &mut page.data {
                log.rerank_results = by_task.remove(&log.task_id).unwrap_or_default();
            }

            Ok(page)
        })
        .await
    }

    async fn record_rerank_result(&self, result: &RerankResultCreate) -> Result<RerankResult> {
        debug!("Recording rerank result for task: {}", result.task_id);
        let result = result.clone();
        let metadata = result
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.run("record_rerank_result", move |conn| {
            conn.execute(
                "INSERT INTO rerank_results
                     (task_id, original_index, content, similarity, relevance, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    result.task_id,
                    result.original_index,
                    result.content,
                    result.similarity,
                    result.relevance,
                    metadata,
                    now_sql()
                ],
            )?;

            let sql = format!("SELECT {} FROM rerank_results WHERE id = ?1", RERANK_COLUMNS);
            Ok(conn.query_row(&sql, params![conn.last_insert_rowid()], rerank_from_row)?)
        })
        .await
    }

    async fn record_low_relevance_result(
        &self,
        result: &LowRelevanceResultCreate,
    ) -> Result<LowRelevanceResult> {
        let result = result.clone();

        self.run("record_low_relevance_result", move |conn| {
            conn.execute(
                "INSERT INTO low_relevance_results
                     (query, original_index, relevance_score, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    result.query,
                    result.original_index,
                    result.relevance_score,
                    result.content,
                    now_sql()
                ],
            )?;

            let sql = format!(
                "SELECT {} FROM low_relevance_results WHERE id = ?1",
                LOW_RELEVANCE_COLUMNS
            );
            Ok(conn.query_row(&sql, params![conn.last_insert_rowid()], low_relevance_from_row)?)
        })
        .await
    }

    async fn low_relevance_summary(
        &self,
        window: Pagination,
        range: DateRange,
    ) -> Result<Page<LowRelevanceGroup>> {
        self.run("low_relevance_summary", move |conn| {
            let [start, end] = range_params(&range);

            let page = windowed(
                conn,
                "SELECT query,
                        COUNT(*) AS hits,
                        AVG(relevance_score) AS avg_relevance_score,
                        MAX(created_at) AS latest_created_at,
                        COUNT(*) OVER () AS total
                 FROM low_relevance_results
                 WHERE (?1 IS NULL OR created_at >= ?1)
                   AND (?2 IS NULL OR created_at <= ?2)
                 GROUP BY query
                 ORDER BY latest_created_at DESC, query ASC
                 LIMIT ?3 OFFSET ?4",
                "SELECT COUNT(DISTINCT query) FROM low_relevance_results
                 WHERE (?1 IS NULL OR created_at >= ?1)
                   AND (?2 IS NULL OR created_at <= ?2)",
                vec![start.clone(), end.clone()],
                window,
                |row| {
                    Ok(LowRelevanceGroup {
                        query: row.get("query")?,
                        count: row.get("hits")?,
                        avg_relevance_score: row.get("avg_relevance_score")?,
                        latest_created_at: ts_column(row, "latest_created_at")?,
                        results: Vec::new(),
                    })
                },
            )?;

            if page.data.is_empty() {
                return Ok(Page {
                    total: page.total,
                    data: Vec::new(),
                });
            }

            let mut bound: Vec<Value> = page
                .data
                .iter()
                .map(|group| Value::Text(group.query.clone()))
                .collect();
            let sql = format!(
                "SELECT {} FROM low_relevance_results
                 WHERE query IN ({})
                   AND (? IS NULL OR created_at >= ?)
                   AND (? IS NULL OR created_at <= ?)
                 ORDER BY created_at DESC, id DESC",
                LOW_RELEVANCE_COLUMNS,
                placeholders(bound.len())
            );
            bound.extend([start.clone(), start, end.clone(), end]);

            let mut stmt = conn.prepare(&sql)?;
            let details = stmt
                .query_map(params_from_iter(bound.iter()), low_relevance_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut by_query: HashMap<String, Vec<LowRelevanceResult>> = HashMap::new();
            for detail in details {
                by_query.entry(detail.query.clone()).or_default().push(detail);
            }

            let data = page
                .data
                .into_iter()
                .map(|mut group| {
                    group.results = by_query.remove(&group.query).unwrap_or_default();
                    group
                })
                .collect();

            Ok(Page {
                total: page.total,
                data,
            })
        })
        .await
    }

    async fn record_no_result(&self, log: &NoResultLogCreate) -> Result<NoResultLog> {
        let log = log.clone();

        self.run("record_no_result", move |conn| {
            conn.execute(
                "INSERT INTO no_result_logs (query, task_id, created_at) VALUES (?1, ?2, ?3)",
                params![log.query, log.task_id, now_sql()],
            )?;

            let sql = format!("SELECT {} FROM no_result_logs WHERE id = ?1", NO_RESULT_COLUMNS);
            Ok(conn.query_row(&sql, params![conn.last_insert_rowid()], no_result_from_row)?)
        })
        .await
    }

    async fn no_result_summary(
        &self,
        limit: u32,
        range: DateRange,
    ) -> Result<Vec<NoResultSummary>> {
        self.run("no_result_summary", move |conn| {
            let [start, end] = range_params(&range);
            let mut stmt = conn.prepare(
                "SELECT query, COUNT(*) AS hits
                 FROM no_result_logs
                 WHERE (?1 IS NULL OR created_at >= ?1)
                   AND (?2 IS NULL OR created_at <= ?2)
                 GROUP BY query
                 ORDER BY hits DESC, query ASC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![start, end, limit], |row| {
                Ok(NoResultSummary {
                    query: row.get("query")?,
                    count: row.get("hits")?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn record_sync_log(&self, log: &SyncLogCreate) -> Result<SyncLogEntry> {
        let log = log.clone();

        self.run("record_sync_log", move |conn| {
            let timestamp = log
                .log_timestamp
                .as_ref()
                .map(ts_to_sql)
                .unwrap_or_else(now_sql);
            conn.execute(
                "INSERT INTO onenote_sync_log (sync_run_id, page_id, action_type, log_timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![log.sync_run_id, log.page_id, log.action_type.as_str(), timestamp],
            )?;

            let sql = format!(
                "SELECT {} FROM onenote_sync_log WHERE log_id = ?1",
                SYNC_LOG_COLUMNS
            );
            Ok(conn.query_row(&sql, params![conn.last_insert_rowid()], sync_log_from_row)?)
        })
        .await
    }

    async fn upsert_page_metadata(&self, metadata: &PageMetadata) -> Result<PageMetadata> {
        let metadata = metadata.clone();

        self.run("upsert_page_metadata", move |conn| {
            conn.execute(
                "INSERT INTO onenote_pages_metadata (page_id, last_modified_time, title, section_name)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(page_id) DO UPDATE SET
                     last_modified_time = excluded.last_modified_time,
                     title = excluded.title,
                     section_name = excluded.section_name",
                params![
                    metadata.page_id,
                    metadata.last_modified_time.as_ref().map(ts_to_sql),
                    metadata.title,
                    metadata.section_name
                ],
            )?;

            let sql = format!(
                "SELECT {} FROM onenote_pages_metadata WHERE page_id = ?1",
                PAGE_METADATA_COLUMNS
            );
            Ok(conn.query_row(&sql, params![metadata.page_id], page_metadata_from_row)?)
        })
        .await
    }

    async fn sync_stats(&self, window: Pagination) -> Result<Page<SyncRunStats>> {
        self.run("sync_stats", move |conn| {
            windowed(
                conn,
                "SELECT sync_run_id,
                        MIN(log_timestamp) AS sync_date,
                        SUM(CASE WHEN action_type = 'CREATED' THEN 1 ELSE 0 END) AS created_count,
                        SUM(CASE WHEN action_type = 'UPDATED' THEN 1 ELSE 0 END) AS updated_count,
                        SUM(CASE WHEN action_type = 'DELETED' THEN 1 ELSE 0 END) AS deleted_count,
                        COUNT(*) OVER () AS total
                 FROM onenote_sync_log
                 GROUP BY sync_run_id
                 ORDER BY sync_run_id DESC
                 LIMIT ?1 OFFSET ?2",
                "SELECT COUNT(DISTINCT sync_run_id) FROM onenote_sync_log",
                Vec::new(),
                window,
                |row| {
                    Ok(SyncRunStats {
                        sync_run_id: row.get("sync_run_id")?,
                        sync_date: ts_column(row, "sync_date")?,
                        created_count: row.get("created_count")?,
                        updated_count: row.get("updated_count")?,
                        deleted_count: row.get("deleted_count")?,
                    })
                },
            )
        })
        .await
    }

    async fn sync_run_details(&self, sync_run_id: &str) -> Result<SyncRunDetails> {
        let sync_run_id = sync_run_id.to_string();

        self.run("sync_run_details", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT l.page_id AS page_id, l.action_type AS action_type,
                        l.log_timestamp AS log_timestamp, m.title AS title,
                        m.section_name AS section_name,
                        m.last_modified_time AS last_modified_time
                 FROM onenote_sync_log l
                 LEFT JOIN onenote_pages_metadata m ON m.page_id = l.page_id
                 WHERE l.sync_run_id = ?1
                 ORDER BY l.log_timestamp ASC, l.log_id ASC",
            )?;
            let rows = stmt
                .query_map(params![sync_run_id], |row| {
                    let title: Option<String> = row.get("title")?;
                    let section_name: Option<String> = row.get("section_name")?;
                    let page = SyncPage {
                        page_id: row.get("page_id")?,
                        title: title.unwrap_or_else(|| UNKNOWN_PAGE_TITLE.to_string()),
                        section_name: section_name
                            .unwrap_or_else(|| UNKNOWN_PAGE_SECTION.to_string()),
                        last_modified_time: opt_ts_column(row, "last_modified_time")?,
                        log_timestamp: ts_column(row, "log_timestamp")?,
                    };
                    Ok((sync_action_column(row, "action_type")?, page))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut details = SyncRunDetails {
                sync_run_id: sync_run_id.clone(),
                created_pages: Vec::new(),
                updated_pages: Vec::new(),
                deleted_pages: Vec::new(),
            };
            for (action, page) in rows {
                match action {
                    SyncAction::Created => details.created_pages.push(page),
                    SyncAction::Updated => details.updated_pages.push(page),
                    SyncAction::Deleted => details.deleted_pages.push(page),
                }
            }

            if details.is_empty() {
                return Err(FeedbackError::NotFound(format!(
                    "Sync run not found: {}",
                    sync_run_id
                )));
            }

            Ok(details)
        })
        .await
    }
}
