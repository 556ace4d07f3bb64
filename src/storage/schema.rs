//! Embedded SQLite schema
//!
//! Applied idempotently on startup and by `feedback-backend init`.
//! Timestamps are fixed-width RFC 3339 UTC text so lexical order is
//! chronological order.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    full_name TEXT,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_users_username ON users(username);

-- message_id is a logical join key onto qa_logs.task_id; feedback may be
-- recorded before the QA log lands, so there is no foreign key
CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id TEXT NOT NULL,
    liked INTEGER NOT NULL,
    reason TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_feedback_message_id ON feedback(message_id);
CREATE INDEX IF NOT EXISTS ix_feedback_created_at ON feedback(created_at);
CREATE INDEX IF NOT EXISTS ix_feedback_message_id_liked ON feedback(message_id, liked);

CREATE TABLE IF NOT EXISTS qa_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id TEXT NOT NULL UNIQUE,
    query TEXT NOT NULL,
    response TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_qa_logs_created_at ON qa_logs(created_at);
CREATE INDEX IF NOT EXISTS ix_qa_logs_query ON qa_logs(query);

CREATE TABLE IF NOT EXISTS rerank_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id TEXT NOT NULL REFERENCES qa_logs(task_id),
    original_index INTEGER NOT NULL,
    content TEXT,
    similarity REAL,
    relevance REAL NOT NULL,
    metadata TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_rerank_results_task_id ON rerank_results(task_id);

CREATE TABLE IF NOT EXISTS low_relevance_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    original_index INTEGER NOT NULL,
    relevance_score REAL NOT NULL,
    content TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_low_relevance_results_score ON low_relevance_results(relevance_score);
CREATE INDEX IF NOT EXISTS ix_low_relevance_results_query ON low_relevance_results(query, created_at);

CREATE TABLE IF NOT EXISTS no_result_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    task_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_no_result_logs_task_id ON no_result_logs(task_id);
CREATE INDEX IF NOT EXISTS ix_no_result_logs_created_at ON no_result_logs(created_at);
CREATE INDEX IF NOT EXISTS ix_no_result_logs_query ON no_result_logs(query);

CREATE TABLE IF NOT EXISTS onenote_sync_log (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sync_run_id TEXT NOT NULL,
    page_id TEXT NOT NULL,
    action_type TEXT NOT NULL CHECK(action_type IN ('CREATED', 'UPDATED', 'DELETED')),
    log_timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_onenote_sync_log_run_id ON onenote_sync_log(sync_run_id);
CREATE INDEX IF NOT EXISTS ix_onenote_sync_log_page_id ON onenote_sync_log(page_id);

CREATE TABLE IF NOT EXISTS onenote_pages_metadata (
    page_id TEXT PRIMARY KEY NOT NULL,
    last_modified_time TEXT,
    title TEXT,
    section_name TEXT
);
"#;
