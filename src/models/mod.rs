//! Persisted record types.
//!
//! All records are integer-keyed and reference each other through
//! one-directional foreign keys; reverse relationships are resolved by
//! scans in the store, never by back-pointers.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type SiteId = i64;
pub type PageId = i64;
pub type LemmaId = i64;
pub type EntryId = i64;

/// Indexing state of one configured site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    Indexing,
    Indexed,
    Failed,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Indexing => "INDEXING",
            SiteStatus::Indexed => "INDEXED",
            SiteStatus::Failed => "FAILED",
        }
    }
}

/// One configured crawl origin and its run outcome.
#[derive(Debug, Clone)]
pub struct Site {
    pub id: SiteId,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

/// One fetched document. At most one live page per (site, path).
#[derive(Debug, Clone)]
pub struct Page {
    pub id: PageId,
    pub site_id: SiteId,
    /// URL with the site origin stripped, `/` for the root.
    pub path: String,
    pub code: u16,
    pub content: String,
}

impl Page {
    /// True when the stored HTTP status is an error class and the page
    /// text must not be indexed.
    pub fn is_error_status(&self) -> bool {
        self.code >= 400
    }
}

/// A canonical normalized word form.
///
/// `frequency` counts distinct pages currently containing the lemma, not
/// in-page occurrences; those live on [`IndexEntry::weight`].
#[derive(Debug, Clone)]
pub struct Lemma {
    pub id: LemmaId,
    /// Site the lemma was first seen on.
    pub site_id: SiteId,
    pub term: String,
    pub frequency: u32,
}

/// A (lemma, page) association carrying the in-page occurrence count.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: EntryId,
    pub lemma_id: LemmaId,
    pub page_id: PageId,
    pub weight: f32,
}
