//! Raw title input → validated [`Worklist`].
//!
//! Validation runs in two tiers:
//!
//! 1. **Shape**: the total page count must be within the configured limit
//!    and the input must not be empty. Either failure is reported alone and
//!    no titles are resolved.
//! 2. **Resolution**: every title is resolved on its source and classified
//!    as invalid, nonexistent, outside the main namespace, or valid. All
//!    failures of one category merge into one [`WorklistIssue`]; categories
//!    are reported in that order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::model::ids::SourceId;
use crate::model::page::Page;
use crate::model::worklist::Worklist;
use crate::services::{PageResolver, TitleLookup};

/// A title as the user typed it, with the source it was given for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTitle {
    pub source: SourceId,
    pub title: String,
}

impl fmt::Display for SourceTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.title)
    }
}

fn render_titles(titles: &[SourceTitle]) -> String {
    titles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One category of worklist validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorklistIssue {
    #[error("worklist has {actual} pages, more than the limit of {limit}")]
    TooLarge { limit: usize, actual: usize },

    #[error("worklist is empty")]
    Empty,

    #[error("{} invalid titles: {}", .0.len(), render_titles(.0))]
    InvalidTitles(Vec<SourceTitle>),

    #[error("{} pages do not exist: {}", .0.len(), render_titles(.0))]
    NonexistentPages(Vec<SourceTitle>),

    #[error("{} pages are not in the main namespace: {}", .0.len(), render_titles(.0))]
    NonMainspacePages(Vec<SourceTitle>),
}

impl WorklistIssue {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TooLarge { .. } => ErrorCode::WorklistTooLarge,
            Self::Empty => ErrorCode::WorklistEmpty,
            Self::InvalidTitles(_) => ErrorCode::InvalidTitles,
            Self::NonexistentPages(_) => ErrorCode::NonexistentPages,
            Self::NonMainspacePages(_) => ErrorCode::NonMainspacePages,
        }
    }

    /// Offending titles; empty for the shape issues.
    #[must_use]
    pub fn titles(&self) -> &[SourceTitle] {
        match self {
            Self::TooLarge { .. } | Self::Empty => &[],
            Self::InvalidTitles(titles)
            | Self::NonexistentPages(titles)
            | Self::NonMainspacePages(titles) => titles,
        }
    }

    /// Number of pages the issue is about.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::TooLarge { actual, .. } => *actual,
            Self::Empty => 0,
            _ => self.titles().len(),
        }
    }
}

/// Every validation failure found in one parse, in reporting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklistReport {
    pub issues: Vec<WorklistIssue>,
}

impl WorklistReport {
    #[must_use]
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.issues.iter().map(WorklistIssue::code).collect()
    }
}

impl fmt::Display for WorklistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {issue}", issue.code())?;
        }
        Ok(())
    }
}

impl std::error::Error for WorklistReport {}

#[derive(Debug, thiserror::Error)]
pub enum WorklistParseError {
    /// The input failed validation.
    #[error("invalid worklist: {0}")]
    Report(WorklistReport),

    /// The page resolver could not be queried.
    #[error("page resolution failed: {0:#}")]
    Resolver(#[source] anyhow::Error),
}

impl WorklistParseError {
    #[must_use]
    pub const fn report(&self) -> Option<&WorklistReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::Resolver(_) => None,
        }
    }

    fn single(issue: WorklistIssue) -> Self {
        Self::Report(WorklistReport {
            issues: vec![issue],
        })
    }
}

pub struct WorklistParser {
    pages: Arc<dyn PageResolver>,
    articles_limit: usize,
}

impl WorklistParser {
    #[must_use]
    pub fn new(pages: Arc<dyn PageResolver>, articles_limit: usize) -> Self {
        Self {
            pages,
            articles_limit,
        }
    }

    /// Validate raw titles grouped by source and build a [`Worklist`].
    ///
    /// # Errors
    ///
    /// Returns [`WorklistParseError::Report`] listing every category of
    /// invalid input, or [`WorklistParseError::Resolver`] if a lookup fails.
    #[instrument(skip(self, raw), fields(sources = raw.len()))]
    pub fn parse_worklist(
        &self,
        raw: &BTreeMap<SourceId, Vec<String>>,
    ) -> Result<Worklist, WorklistParseError> {
        let total: usize = raw.values().map(Vec::len).sum();
        if total > self.articles_limit {
            return Err(WorklistParseError::single(WorklistIssue::TooLarge {
                limit: self.articles_limit,
                actual: total,
            }));
        }
        if total == 0 {
            return Err(WorklistParseError::single(WorklistIssue::Empty));
        }

        let mut invalid = Vec::new();
        let mut nonexistent = Vec::new();
        let mut non_mainspace = Vec::new();
        let mut valid: BTreeMap<SourceId, Vec<Page>> = BTreeMap::new();

        for (source, titles) in raw {
            for title in titles {
                let lookup = self
                    .pages
                    .resolve(source, title)
                    .map_err(WorklistParseError::Resolver)?;
                let offending = || SourceTitle {
                    source: source.clone(),
                    title: title.clone(),
                };

                match lookup {
                    TitleLookup::InvalidTitle => invalid.push(offending()),
                    TitleLookup::NotFound => nonexistent.push(offending()),
                    TitleLookup::Found(page) if !page.is_mainspace() => {
                        non_mainspace.push(offending());
                    }
                    TitleLookup::Found(page) => {
                        valid.entry(source.clone()).or_default().push(page);
                    }
                }
            }
        }

        let issues: Vec<WorklistIssue> = [
            (!invalid.is_empty()).then(|| WorklistIssue::InvalidTitles(invalid)),
            (!nonexistent.is_empty()).then(|| WorklistIssue::NonexistentPages(nonexistent)),
            (!non_mainspace.is_empty()).then(|| WorklistIssue::NonMainspacePages(non_mainspace)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !issues.is_empty() {
            debug!(categories = issues.len(), "worklist rejected");
            return Err(WorklistParseError::Report(WorklistReport { issues }));
        }

        Worklist::new(valid)
            .map_err(|error| WorklistParseError::Resolver(anyhow::Error::new(error)))
    }
}
