//! SQLite schema for invitation lists.
//!
//! - `invitation_lists` holds one row per generation run
//! - `invitation_list_pages` stores the worklist by page identity, never by
//!   title, so renames between enqueue and scoring are harmless
//! - `invitation_list_users` holds the scored candidates by author identity
//! - `store_meta` records the applied schema version

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS invitation_lists (
    list_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    event_id INTEGER,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'ready')),
    creator_id INTEGER NOT NULL,
    source TEXT NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS invitation_list_pages (
    list_id INTEGER NOT NULL REFERENCES invitation_lists(list_id) ON DELETE CASCADE,
    source TEXT NOT NULL,
    page_id INTEGER NOT NULL CHECK (page_id > 0),
    position INTEGER NOT NULL,
    PRIMARY KEY (list_id, source, page_id)
);

CREATE TABLE IF NOT EXISTS invitation_list_users (
    list_id INTEGER NOT NULL REFERENCES invitation_lists(list_id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL,
    score INTEGER NOT NULL CHECK (score >= 0),
    PRIMARY KEY (list_id, author_id)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_invitation_lists_event_created
    ON invitation_lists(event_id, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_invitation_list_pages_position
    ON invitation_list_pages(list_id, position);

CREATE INDEX IF NOT EXISTS idx_invitation_list_users_score
    ON invitation_list_users(list_id, score DESC, author_id);
";

/// Indexes expected by the store's read paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_invitation_lists_event_created",
    "idx_invitation_list_pages_position",
    "idx_invitation_list_users_score",
];
