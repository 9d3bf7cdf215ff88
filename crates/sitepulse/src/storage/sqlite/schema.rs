//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O. Timestamps are stored as fixed-width RFC 3339 UTC
//! strings so range filters can compare them lexically.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    open_id TEXT NOT NULL UNIQUE,
    name TEXT,
    email TEXT,
    login_method TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_signed_in TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS analytics_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE,
    user_id INTEGER,
    user_agent TEXT,
    ip_address TEXT,
    country TEXT,
    city TEXT,
    device TEXT,
    browser TEXT,
    os TEXT,
    referrer TEXT,
    landing_page TEXT,
    created_at TEXT NOT NULL,
    last_activity TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_analytics_sessions_created_at ON analytics_sessions(created_at);

CREATE TABLE IF NOT EXISTS analytics_pageviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    path TEXT NOT NULL,
    title TEXT,
    referrer TEXT,
    duration INTEGER,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_analytics_pageviews_created_at ON analytics_pageviews(created_at);

CREATE TABLE IF NOT EXISTS analytics_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    event_name TEXT,
    element_id TEXT,
    element_class TEXT,
    element_text TEXT,
    path TEXT NOT NULL,
    metadata TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_analytics_events_type_created_at ON analytics_events(event_type, created_at);

CREATE TABLE IF NOT EXISTS analytics_heatmap (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    path TEXT NOT NULL,
    event_type TEXT NOT NULL,
    x INTEGER,
    y INTEGER,
    scroll_depth INTEGER,
    viewport_width INTEGER,
    viewport_height INTEGER,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_analytics_heatmap_path_type ON analytics_heatmap(path, event_type);
"#;

pub const UPSERT_USER: &str = r#"
INSERT INTO users (open_id, name, email, login_method, role, created_at, updated_at, last_signed_in)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(open_id) DO UPDATE SET
    name = CASE WHEN ? THEN excluded.name ELSE users.name END,
    email = CASE WHEN ? THEN excluded.email ELSE users.email END,
    login_method = CASE WHEN ? THEN excluded.login_method ELSE users.login_method END,
    role = COALESCE(?, users.role),
    updated_at = excluded.updated_at,
    last_signed_in = excluded.last_signed_in
"#;

pub const SELECT_USER_BY_OPEN_ID: &str = r#"
SELECT id, open_id, name, email, login_method, role, created_at, updated_at, last_signed_in
FROM users WHERE open_id = ?
"#;

pub const INSERT_SESSION: &str = r#"
INSERT INTO analytics_sessions
    (session_id, user_id, user_agent, ip_address, country, city, device, browser, os, referrer, landing_page, created_at, last_activity)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub const TOUCH_SESSION: &str =
    "UPDATE analytics_sessions SET last_activity = ? WHERE session_id = ?";

pub const INSERT_PAGEVIEW: &str = r#"
INSERT INTO analytics_pageviews (session_id, path, title, referrer, duration, created_at)
VALUES (?, ?, ?, ?, ?, ?)
"#;

pub const INSERT_EVENT: &str = r#"
INSERT INTO analytics_events
    (session_id, event_type, event_name, element_id, element_class, element_text, path, metadata, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub const INSERT_HEATMAP: &str = r#"
INSERT INTO analytics_heatmap
    (session_id, path, event_type, x, y, scroll_depth, viewport_width, viewport_height, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Range filter appended to queries over a `created_at` column. Binds the
/// lower bound twice, then the upper bound twice; a NULL bound is open.
pub const RANGE_FILTER: &str = "(? IS NULL OR created_at >= ?) AND (? IS NULL OR created_at <= ?)";

pub const SELECT_HEATMAP: &str = r#"
SELECT id, session_id, path, event_type, x, y, scroll_depth, viewport_width, viewport_height, created_at
FROM analytics_heatmap
WHERE path = ? AND event_type = ?
LIMIT 10000
"#;

pub const SELECT_RECENT_SESSIONS: &str = r#"
SELECT id, session_id, user_id, user_agent, ip_address, country, city, device, browser, os,
       referrer, landing_page, created_at, last_activity
FROM analytics_sessions
ORDER BY created_at DESC, id DESC
LIMIT ?
"#;
