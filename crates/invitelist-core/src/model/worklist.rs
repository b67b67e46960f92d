//! The validated page set an invitation list is generated from.
//!
//! A [`Worklist`] groups existing main-namespace pages by source. It is built
//! once, either by [`crate::parser::WorklistParser`] from raw titles or by
//! [`Worklist::rehydrate`] from stored page identities, and never mutated.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use anyhow::{Context, Result};
use tracing::debug;

use super::ids::{PageId, SourceId};
use super::page::{Page, PageRef};
use crate::services::PageResolver;

/// Invariant violations rejected by [`Worklist::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorklistError {
    /// A source was present with no pages.
    #[error("worklist source '{0}' has no pages")]
    EmptySource(SourceId),

    /// A page was filed under a source other than its own.
    #[error("page {page_id} belongs to '{actual}' but was listed under '{expected}'")]
    SourceMismatch {
        expected: SourceId,
        actual: SourceId,
        page_id: PageId,
    },

    /// A page without an identity (not an existing page).
    #[error("page '{title}' on '{wiki}' does not exist")]
    MissingPage { wiki: SourceId, title: String },

    /// A page outside the main namespace.
    #[error("page '{title}' on '{wiki}' is in namespace {namespace}, not the main namespace")]
    NotMainspace {
        wiki: SourceId,
        title: String,
        namespace: i32,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worklist {
    pages: BTreeMap<SourceId, Vec<Page>>,
}

impl Worklist {
    /// Validate and wrap a source → pages mapping.
    ///
    /// Repeated page IDs within one source keep their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns the first [`WorklistError`] found, checking sources in
    /// ascending order.
    pub fn new(pages: BTreeMap<SourceId, Vec<Page>>) -> Result<Self, WorklistError> {
        let mut validated = BTreeMap::new();

        for (source, list) in pages {
            if list.is_empty() {
                return Err(WorklistError::EmptySource(source));
            }

            let mut kept: Vec<Page> = Vec::with_capacity(list.len());
            for page in list {
                if page.source != source {
                    return Err(WorklistError::SourceMismatch {
                        expected: source,
                        actual: page.source,
                        page_id: page.id,
                    });
                }
                if page.id.0 == 0 {
                    return Err(WorklistError::MissingPage {
                        wiki: source,
                        title: page.title,
                    });
                }
                if !page.is_mainspace() {
                    return Err(WorklistError::NotMainspace {
                        wiki: source,
                        title: page.title,
                        namespace: page.namespace,
                    });
                }
                if !kept.iter().any(|existing| existing.id == page.id) {
                    kept.push(page);
                }
            }

            validated.insert(source, kept);
        }

        Ok(Self { pages: validated })
    }

    /// Rebuild a worklist from stored identities, looking up each page's
    /// current title.
    ///
    /// Pages that no longer exist, or that have left the main namespace, are
    /// dropped. Sources left without pages are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver fails.
    pub fn rehydrate(
        refs: impl IntoIterator<Item = PageRef>,
        resolver: &dyn PageResolver,
    ) -> Result<Self> {
        let mut grouped: BTreeMap<SourceId, Vec<Page>> = BTreeMap::new();

        for page_ref in refs {
            let current = resolver
                .current_page(&page_ref.source, page_ref.page_id)
                .with_context(|| {
                    format!(
                        "look up page {} on '{}'",
                        page_ref.page_id, page_ref.source
                    )
                })?;

            let Some(page) = current else {
                debug!(
                    source = %page_ref.source,
                    page_id = page_ref.page_id.0,
                    "dropping deleted worklist page"
                );
                continue;
            };

            if !page.is_mainspace() {
                debug!(
                    source = %page_ref.source,
                    page_id = page_ref.page_id.0,
                    namespace = page.namespace,
                    "dropping worklist page moved out of the main namespace"
                );
                continue;
            }

            let page = Page {
                source: page_ref.source.clone(),
                id: page_ref.page_id,
                ..page
            };

            match grouped.entry(page_ref.source) {
                Entry::Occupied(mut entry) => entry.get_mut().push(page),
                Entry::Vacant(entry) => {
                    entry.insert(vec![page]);
                }
            }
        }

        Self::new(grouped).context("rebuild worklist from stored pages")
    }

    #[must_use]
    pub const fn pages_by_source(&self) -> &BTreeMap<SourceId, Vec<Page>> {
        &self.pages
    }

    /// Pages of one source, if present.
    #[must_use]
    pub fn source_pages(&self, source: &SourceId) -> Option<&[Page]> {
        self.pages.get(source).map(Vec::as_slice)
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.pages.keys()
    }

    /// All pages, grouped by ascending source, in stored order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values().flatten()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Title-free identities in iteration order.
    #[must_use]
    pub fn page_refs(&self) -> Vec<PageRef> {
        self.pages().map(Page::to_ref).collect()
    }
}
