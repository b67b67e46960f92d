//! Invitation list persistence.
//!
//! The store carries no business rules beyond the status ordering. Worklist
//! pages are written by identity and re-resolved on read; candidates are
//! written by author identity and read back score-descending.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::ErrorCode;
use crate::model::ids::{AuthorId, EventId, ListId, PageId, Score, SourceId};
use crate::model::list::{InvitationList, ListStatus, ScoredInvitee};
use crate::model::page::PageRef;
use crate::model::worklist::Worklist;
use crate::services::PageResolver;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invitation list {0} not found")]
    NotFound(ListId),

    #[error("invitation list {id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        id: ListId,
        from: ListStatus,
        to: ListStatus,
    },

    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("page lookup failed: {0:#}")]
    Resolver(#[source] anyhow::Error),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::ListNotFound,
            Self::InvalidStatusTransition { .. } => ErrorCode::InvalidStatusTransition,
            Self::Corrupt { .. } | Self::Sqlite(_) => ErrorCode::StorageFailure,
            Self::Resolver(_) => ErrorCode::CollaboratorFailure,
        }
    }
}

const LIST_COLUMNS: &str =
    "list_id, name, event_id, status, creator_id, source, created_at_us";

pub struct InvitationListStore {
    conn: Connection,
    local_source: SourceId,
    pages: Arc<dyn PageResolver>,
    clock: Arc<dyn Clock>,
}

impl InvitationListStore {
    /// Wrap an already-migrated connection.
    #[must_use]
    pub fn new(
        conn: Connection,
        local_source: SourceId,
        pages: Arc<dyn PageResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            conn,
            local_source,
            pages,
            clock,
        }
    }

    /// Open the database at `path`, creating and migrating it as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(
        path: &Path,
        local_source: SourceId,
        pages: Arc<dyn PageResolver>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let conn = super::open_store_db(path)?;
        Ok(Self::new(conn, local_source, pages, clock))
    }

    /// Store backed by a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn in_memory(
        local_source: SourceId,
        pages: Arc<dyn PageResolver>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let conn = super::open_in_memory()?;
        Ok(Self::new(conn, local_source, pages, clock))
    }

    /// Source (wiki) new lists are attributed to.
    #[must_use]
    pub const fn local_source(&self) -> &SourceId {
        &self.local_source
    }

    /// Insert a PENDING list stamped with the current time and local source.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_invitation_list(
        &self,
        name: &str,
        event: Option<EventId>,
        creator: AuthorId,
    ) -> Result<ListId, StoreError> {
        let id = self.insert_list(&self.conn, name, event, creator)?;
        info!(list_id = id.0, source = %self.local_source, "created invitation list");
        Ok(id)
    }

    /// Insert a PENDING list and its worklist in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails; nothing is committed then.
    pub fn create_invitation_list_with_worklist(
        &self,
        name: &str,
        event: Option<EventId>,
        creator: AuthorId,
        worklist: &Worklist,
    ) -> Result<ListId, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let id = self.insert_list(&tx, name, event, creator)?;
        write_pages(&tx, id, worklist)?;
        tx.commit()?;

        info!(
            list_id = id.0,
            source = %self.local_source,
            pages = worklist.page_count(),
            "created invitation list"
        );
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no list has this ID.
    pub fn get_invitation_list(&self, id: ListId) -> Result<InvitationList, StoreError> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM invitation_lists WHERE list_id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id.0], ListRow::from_row)
            .optional()?;

        row.ok_or(StoreError::NotFound(id))?.into_list()
    }

    /// Lists created for `event`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn list_invitation_lists_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<InvitationList>, StoreError> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM invitation_lists \
             WHERE event_id = ?1 \
             ORDER BY created_at_us DESC, list_id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![event.0], ListRow::from_row)?;

        let mut lists = Vec::new();
        for row in rows {
            lists.push(row?.into_list()?);
        }
        Ok(lists)
    }

    /// Write `status`. Writing the current status again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown list and
    /// [`StoreError::InvalidStatusTransition`] for `ready -> pending`.
    pub fn update_status(&self, id: ListId, status: ListStatus) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let current: Option<String> = tx
            .query_row(
                "SELECT status FROM invitation_lists WHERE list_id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;

        let current = parse_status(&current.ok_or(StoreError::NotFound(id))?)?;
        if current == status {
            return Ok(());
        }
        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidStatusTransition {
                id,
                from: current,
                to: status,
            });
        }

        tx.execute(
            "UPDATE invitation_lists SET status = ?2 WHERE list_id = ?1",
            params![id.0, status.as_str()],
        )?;
        tx.commit()?;

        debug!(list_id = id.0, status = %status, "updated invitation list status");
        Ok(())
    }

    /// Replace the stored worklist of a list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown list.
    pub fn store_worklist(&self, id: ListId, worklist: &Worklist) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_list_exists(&tx, id)?;
        write_pages(&tx, id, worklist)?;
        tx.commit()?;
        Ok(())
    }

    /// Read a list's worklist, re-resolving each page to its current title.
    ///
    /// Renamed pages come back under their new title; deleted pages are
    /// omitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown list, or
    /// [`StoreError::Resolver`] if page lookups fail.
    pub fn get_worklist(&self, id: ListId) -> Result<Worklist, StoreError> {
        ensure_list_exists(&self.conn, id)?;

        let mut stmt = self.conn.prepare(
            "SELECT source, page_id FROM invitation_list_pages \
             WHERE list_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![id.0], |row| {
            Ok(PageRef {
                source: SourceId::new(row.get::<_, String>(0)?),
                page_id: PageId(row.get(1)?),
            })
        })?;

        let mut refs = Vec::new();
        for row in rows {
            refs.push(row?);
        }

        Worklist::rehydrate(refs, self.pages.as_ref()).map_err(StoreError::Resolver)
    }

    /// Replace the scored candidates of a list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown list.
    pub fn store_invitation_list_users(
        &self,
        id: ListId,
        users: &HashMap<AuthorId, Score>,
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_list_exists(&tx, id)?;

        tx.execute(
            "DELETE FROM invitation_list_users WHERE list_id = ?1",
            params![id.0],
        )?;

        let mut sorted: Vec<(&AuthorId, &Score)> = users.iter().collect();
        sorted.sort_unstable_by_key(|(author, _)| **author);
        {
            let mut insert = tx.prepare(
                "INSERT INTO invitation_list_users (list_id, author_id, score) \
                 VALUES (?1, ?2, ?3)",
            )?;
            for (author, score) in sorted {
                insert.execute(params![id.0, author.0, score])?;
            }
        }
        tx.commit()?;

        debug!(list_id = id.0, users = users.len(), "stored invitation list users");
        Ok(())
    }

    /// Candidates of a list, score-descending, ties by ascending author ID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown list.
    pub fn get_invitation_list_users(&self, id: ListId) -> Result<Vec<ScoredInvitee>, StoreError> {
        ensure_list_exists(&self.conn, id)?;

        let mut stmt = self.conn.prepare(
            "SELECT author_id, score FROM invitation_list_users \
             WHERE list_id = ?1 \
             ORDER BY score DESC, author_id ASC",
        )?;
        let rows = stmt.query_map(params![id.0], |row| {
            Ok(ScoredInvitee {
                author: AuthorId(row.get(0)?),
                score: row.get(1)?,
            })
        })?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    fn insert_list(
        &self,
        conn: &Connection,
        name: &str,
        event: Option<EventId>,
        creator: AuthorId,
    ) -> Result<ListId, StoreError> {
        conn.execute(
            "INSERT INTO invitation_lists \
             (name, event_id, status, creator_id, source, created_at_us) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                event.map(|event| event.0),
                ListStatus::Pending.as_str(),
                creator.0,
                self.local_source.as_str(),
                self.clock.now().timestamp_micros(),
            ],
        )?;
        Ok(ListId(conn.last_insert_rowid()))
    }
}

fn ensure_list_exists(conn: &Connection, id: ListId) -> Result<(), StoreError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM invitation_lists WHERE list_id = ?1)",
        params![id.0],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::NotFound(id))
    }
}

fn write_pages(conn: &Connection, id: ListId, worklist: &Worklist) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM invitation_list_pages WHERE list_id = ?1",
        params![id.0],
    )?;

    let mut insert = conn.prepare(
        "INSERT INTO invitation_list_pages (list_id, source, page_id, position) \
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, page) in worklist.pages().enumerate() {
        let position = i64::try_from(position).map_err(|_| StoreError::Corrupt {
            table: "invitation_list_pages",
            detail: format!("position {position} out of range"),
        })?;
        insert.execute(params![id.0, page.source.as_str(), page.id.0, position])?;
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<ListStatus, StoreError> {
    raw.parse().map_err(|error: crate::model::list::UnknownStatus| StoreError::Corrupt {
        table: "invitation_lists",
        detail: error.to_string(),
    })
}

/// Raw `invitation_lists` row before status/timestamp decoding.
struct ListRow {
    id: i64,
    name: String,
    event: Option<u32>,
    status: String,
    creator: u32,
    source: String,
    created_at_us: i64,
}

impl ListRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            event: row.get(2)?,
            status: row.get(3)?,
            creator: row.get(4)?,
            source: row.get(5)?,
            created_at_us: row.get(6)?,
        })
    }

    fn into_list(self) -> Result<InvitationList, StoreError> {
        let created_at: DateTime<Utc> = DateTime::from_timestamp_micros(self.created_at_us)
            .ok_or_else(|| StoreError::Corrupt {
                table: "invitation_lists",
                detail: format!("created_at_us {} out of range", self.created_at_us),
            })?;

        Ok(InvitationList {
            id: ListId(self.id),
            name: self.name,
            event: self.event.map(EventId),
            status: parse_status(&self.status)?,
            creator: AuthorId(self.creator),
            source: SourceId::new(self.source),
            created_at,
        })
    }
}
