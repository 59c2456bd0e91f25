//! Posting catalog with cached match results and filter/sort queries.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{CandidateProfile, JobPosting, MatchResult, PostingId};
use super::scoring;
use super::tracker::ApplicationStatus;

/// Caller errors raised by catalog queries.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown sort key '{0}', expected one of: score, company, posted_at")]
    InvalidSort(String),
}

/// Supported orderings for [`MatchCatalog::query`]. Every ordering breaks
/// ties on posting id so query output is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Score descending.
    #[default]
    Score,
    /// Company name ascending.
    Company,
    /// Posting date ascending.
    PostedAt,
}

impl SortKey {
    /// Parses a caller-supplied sort key. Unknown keys are a caller error,
    /// never a silent fallback.
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "score" | "match_score" => Ok(Self::Score),
            "company" => Ok(Self::Company),
            "posted_at" | "posted_date" => Ok(Self::PostedAt),
            _ => Err(CatalogError::InvalidSort(raw.trim().to_string())),
        }
    }
}

/// Restricts query results by application state for the posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Postings with no application on record.
    NotApplied,
    /// Postings whose most recent application is in the given status.
    InStatus(ApplicationStatus),
}

/// Query parameters for [`MatchCatalog::query`]. Filters are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    /// Case-insensitive substring match over title and company.
    pub search: Option<String>,
    /// Excludes results scoring below the threshold (and unscored postings).
    pub score_floor: Option<u8>,
    pub status: Option<StatusFilter>,
    pub sort: SortKey,
}

/// One query result: the posting plus its cached match result, if a profile
/// has been ingested.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRow {
    pub posting: JobPosting,
    pub result: Option<MatchResult>,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    posting: JobPosting,
    result: Option<MatchResult>,
}

/// Owns the posting set and the per-posting match result cache. Results are
/// invalidated and recomputed in one step whenever the profile changes.
#[derive(Debug, Default)]
pub struct MatchCatalog {
    entries: BTreeMap<PostingId, CatalogEntry>,
}

impl MatchCatalog {
    /// Upserts a posting and (re)computes its result against the current
    /// profile, if any.
    pub fn upsert(&mut self, posting: JobPosting, profile: Option<&CandidateProfile>) {
        let result = profile.map(|profile| scoring::score(profile, &posting));
        self.entries
            .insert(posting.id.clone(), CatalogEntry { posting, result });
    }

    /// Drops every cached result and recomputes against `profile`. Called
    /// under the session lock together with the profile replacement so
    /// readers never see scores for a stale profile.
    pub fn rescore(&mut self, profile: &CandidateProfile) {
        for entry in self.entries.values_mut() {
            entry.result = Some(scoring::score(profile, &entry.posting));
        }
    }

    pub fn posting(&self, id: &PostingId) -> Option<&JobPosting> {
        self.entries.get(id).map(|entry| &entry.posting)
    }

    pub fn result(&self, id: &PostingId) -> Option<&MatchResult> {
        self.entries.get(id).and_then(|entry| entry.result.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filters and sorts the catalog. `status_of` resolves a posting's
    /// current application status; the catalog itself holds no back-reference
    /// into the tracker.
    pub fn query<F>(&self, query: &MatchQuery, status_of: F) -> Vec<MatchRow>
    where
        F: Fn(&PostingId) -> Option<ApplicationStatus>,
    {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);

        let mut rows: Vec<MatchRow> = self
            .entries
            .values()
            .filter(|entry| match &needle {
                Some(needle) => {
                    entry.posting.title.to_lowercase().contains(needle)
                        || entry.posting.company.to_lowercase().contains(needle)
                }
                None => true,
            })
            .filter(|entry| match query.score_floor {
                Some(floor) => entry
                    .result
                    .as_ref()
                    .is_some_and(|result| result.score >= floor),
                None => true,
            })
            .filter(|entry| match query.status {
                Some(StatusFilter::NotApplied) => status_of(&entry.posting.id).is_none(),
                Some(StatusFilter::InStatus(status)) => {
                    status_of(&entry.posting.id) == Some(status)
                }
                None => true,
            })
            .map(|entry| MatchRow {
                posting: entry.posting.clone(),
                result: entry.result.clone(),
            })
            .collect();

        match query.sort {
            SortKey::Score => rows.sort_by(|a, b| {
                let score_a = a.result.as_ref().map_or(-1, |result| result.score as i16);
                let score_b = b.result.as_ref().map_or(-1, |result| result.score as i16);
                score_b
                    .cmp(&score_a)
                    .then_with(|| a.posting.id.cmp(&b.posting.id))
            }),
            SortKey::Company => rows.sort_by(|a, b| {
                a.posting
                    .company
                    .cmp(&b.posting.company)
                    .then_with(|| a.posting.id.cmp(&b.posting.id))
            }),
            SortKey::PostedAt => rows.sort_by(|a, b| {
                a.posting
                    .posted_at
                    .cmp(&b.posting.posted_at)
                    .then_with(|| a.posting.id.cmp(&b.posting.id))
            }),
        }

        rows
    }
}
