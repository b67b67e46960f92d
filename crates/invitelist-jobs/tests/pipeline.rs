//! Whole flow against an on-disk store: parse titles, create the list, drain
//! the queue from a separate connection, read the ranked invitees back.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use invitelist_core::config::{EngineConfig, load_config};
use invitelist_core::services::{
    Capability, EventLookup, EventRegistration, IdentityLookup, PageResolver, PermissionChecker,
    Requester, TitleLookup,
};
use invitelist_core::{
    AuthorId, EventId, FixedClock, InvitationListStore, ListId, ListStatus, Page, PageId,
    SourceId, WorklistParser,
};
use invitelist_jobs::{InvitationListGenerator, JobEnv, JobPayload, MemoryJobQueue, run_pending};
use invitelist_jobs::queue::JobQueue;
use invitelist_triage::{Revision, RevisionSource};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0)
        .single()
        .expect("valid date")
}

/// Two wikis; a page can be renamed or deleted between list creation and
/// the job run.
struct Wikis {
    pages: Mutex<Vec<Page>>,
}

impl Wikis {
    fn new() -> Self {
        let en = SourceId::new("enwiki");
        let de = SourceId::new("dewiki");
        Self {
            pages: Mutex::new(vec![
                Page::article(en.clone(), PageId(1), "Otters"),
                Page::article(en.clone(), PageId(2), "Beavers"),
                Page::article(en, PageId(3), "Badgers"),
                Page::article(de, PageId(1), "Fischotter"),
            ]),
        }
    }

    fn delete(&self, source: &str, id: u32) {
        self.pages
            .lock()
            .expect("pages lock")
            .retain(|p| !(p.source.as_str() == source && p.id == PageId(id)));
    }
}

impl PageResolver for Wikis {
    fn resolve(&self, source: &SourceId, title: &str) -> Result<TitleLookup> {
        if title.is_empty() {
            return Ok(TitleLookup::InvalidTitle);
        }
        Ok(self
            .pages
            .lock()
            .expect("pages lock")
            .iter()
            .find(|p| &p.source == source && p.title == title)
            .map_or(TitleLookup::NotFound, |p| TitleLookup::Found(p.clone())))
    }

    fn current_page(&self, source: &SourceId, id: PageId) -> Result<Option<Page>> {
        Ok(self
            .pages
            .lock()
            .expect("pages lock")
            .iter()
            .find(|p| &p.source == source && p.id == id)
            .cloned())
    }
}

struct Everyone;

impl PermissionChecker for Everyone {
    fn requester_can(&self, _capability: Capability, _requester: &Requester) -> bool {
        true
    }

    fn is_organizer(&self, _event: EventId, _requester: &Requester) -> Result<bool> {
        Ok(true)
    }
}

struct NoEvents;

impl EventLookup for NoEvents {
    fn registration_for_page(&self, _page: &Page) -> Result<Option<EventRegistration>> {
        Ok(None)
    }
}

struct History(Vec<(SourceId, Revision)>);

impl RevisionSource for History {
    fn revisions_since(
        &self,
        source: &SourceId,
        pages: &[PageId],
        since: DateTime<Utc>,
    ) -> Result<Vec<Revision>> {
        Ok(self
            .0
            .iter()
            .filter(|(s, r)| s == source && pages.contains(&r.page_id) && r.timestamp >= since)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn edit_counts(&self, authors: &[String]) -> Result<HashMap<String, u64>> {
        Ok(authors.iter().map(|a| (a.clone(), 100)).collect())
    }
}

struct Accounts;

impl IdentityLookup for Accounts {
    fn resolve_names(&self, names: &[String]) -> Result<HashMap<String, Option<AuthorId>>> {
        Ok(names
            .iter()
            .map(|name| {
                let id = match name.as_str() {
                    "Mara" => Some(AuthorId(11)),
                    "Jonas" => Some(AuthorId(12)),
                    "Priya" => Some(AuthorId(13)),
                    _ => None,
                };
                (name.clone(), id)
            })
            .collect())
    }
}

fn edit(source: &str, id: u64, page: u32, author: &str, days_ago: i64) -> (SourceId, Revision) {
    (
        SourceId::new(source),
        Revision {
            id,
            page_id: PageId(page),
            author: Some(author.to_string()),
            author_is_bot: false,
            timestamp: now() - Duration::days(days_ago),
            size_delta: 120,
        },
    )
}

fn raw(entries: &[(&str, &[&str])]) -> BTreeMap<SourceId, Vec<String>> {
    entries
        .iter()
        .map(|(source, titles)| {
            (
                SourceId::new(*source),
                titles.iter().map(ToString::to_string).collect(),
            )
        })
        .collect()
}

#[test]
fn list_is_generated_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config: EngineConfig = load_config(dir.path()).expect("defaults");
    let db_path = dir.path().join(".invitelist").join("lists.sqlite3");

    let wikis = Arc::new(Wikis::new());
    let clock = Arc::new(FixedClock(now()));
    let queue = Arc::new(MemoryJobQueue::new());

    // Request side.
    let request_store =
        InvitationListStore::open(&db_path, SourceId::new("enwiki"), wikis.clone(), clock.clone())
            .expect("open request store");
    let parser = WorklistParser::new(wikis.clone(), config.worklist.articles_limit);
    let worklist = parser
        .parse_worklist(&raw(&[
            ("enwiki", &["Otters", "Beavers", "Badgers"]),
            ("dewiki", &["Fischotter"]),
        ]))
        .expect("valid worklist");

    let generator = InvitationListGenerator::new(
        &request_store,
        Arc::new(Everyone),
        wikis.clone(),
        Arc::new(NoEvents),
        queue.clone(),
        clock.clone(),
        config.lists,
    );
    let list_id = generator
        .create_if_allowed(
            "Mustelids",
            None,
            &worklist,
            &Requester::new(AuthorId(1), "Organizer"),
        )
        .expect("created");

    // Badgers is deleted before the job runs; edits to it no longer count.
    wikis.delete("enwiki", 3);

    // Worker side, with its own connection.
    let worker_store =
        InvitationListStore::open(&db_path, SourceId::new("enwiki"), wikis.clone(), clock.clone())
            .expect("open worker store");
    let history = Arc::new(History(vec![
        edit("enwiki", 1, 1, "Mara", 4),
        edit("enwiki", 2, 2, "Mara", 9),
        edit("dewiki", 3, 1, "Mara", 12),
        edit("enwiki", 4, 1, "Jonas", 20),
        edit("enwiki", 5, 3, "Priya", 2),
        edit("dewiki", 6, 1, "192.0.2.7", 1),
    ]));
    let env = JobEnv {
        store: &worker_store,
        pages: wikis.clone(),
        revisions: history,
        identities: Arc::new(Accounts),
        clock,
        scoring: config.scoring,
    };

    let report = run_pending(&queue, &env).expect("drain");
    assert!(report.is_clean());
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].list_id, list_id);
    assert_eq!(report.completed[0].candidates, 3);
    assert_eq!(report.completed[0].stored, 2);

    let list = request_store.get_invitation_list(list_id).expect("list");
    assert_eq!(list.status, ListStatus::Ready);

    let users = request_store
        .get_invitation_list_users(list_id)
        .expect("users");
    let authors: Vec<AuthorId> = users.iter().map(|u| u.author).collect();
    assert_eq!(authors, vec![AuthorId(11), AuthorId(12)]);
    assert!(users[0].score > users[1].score);

    let remaining = request_store.get_worklist(list_id).expect("worklist");
    assert_eq!(remaining.page_count(), 3);
}

#[test]
fn drain_collects_failures_and_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let wikis = Arc::new(Wikis::new());
    let clock = Arc::new(FixedClock(now()));
    let store = InvitationListStore::open(
        &dir.path().join("lists.sqlite3"),
        SourceId::new("enwiki"),
        wikis.clone(),
        clock.clone(),
    )
    .expect("open store");
    let good = store
        .create_invitation_list("Good", None, AuthorId(1))
        .expect("create");

    let queue = MemoryJobQueue::new();
    queue
        .enqueue(JobPayload {
            list_id: Some(ListId(999)),
            serialized_worklist: None,
        })
        .expect("enqueue");
    queue
        .enqueue(JobPayload::new(
            good,
            r#"{"version":1,"pages":[]}"#.to_string(),
        ))
        .expect("enqueue");

    let env = JobEnv {
        store: &store,
        pages: wikis,
        revisions: Arc::new(History(Vec::new())),
        identities: Arc::new(Accounts),
        clock,
        scoring: invitelist_core::config::ScoringConfig::default(),
    };
    let report = run_pending(&queue, &env).expect("drain");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, Some(ListId(999)));
    assert_eq!(report.completed.len(), 1);
    assert_eq!(
        store.get_invitation_list(good).expect("list").status,
        ListStatus::Ready
    );
    assert!(queue.is_empty().expect("is_empty"));
}
