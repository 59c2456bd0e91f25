use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings supplied by the job source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostingId(pub String);

/// Highest education level attained or required, ordered from least to most
/// advanced so qualification checks can compare directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    #[default]
    None,
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    /// Maps the free-text labels emitted by the structured-extraction
    /// collaborator ("Bachelor's degree", "PhD", ...) onto the ordered enum.
    /// Unrecognized text degrades to `None` rather than failing ingestion.
    pub fn parse(raw: &str) -> Self {
        let label = raw.trim().to_ascii_lowercase();
        if label.contains("doctor") || label.contains("phd") {
            Self::Doctorate
        } else if label.contains("master") || label.contains("mba") {
            Self::Master
        } else if label.contains("bachelor") {
            Self::Bachelor
        } else if label.contains("associate") {
            Self::Associate
        } else if label.contains("high school") || label.contains("ged") {
            Self::HighSchool
        } else {
            Self::None
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::HighSchool => "high school",
            Self::Associate => "associate",
            Self::Bachelor => "bachelor",
            Self::Master => "master",
            Self::Doctorate => "doctorate",
        }
    }
}

/// Structured representation of a resume after ingestion. Immutable once
/// produced; the session replaces it wholesale on re-upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub skills: BTreeSet<String>,
    pub experience_years: f32,
    pub education_level: EducationLevel,
    pub titles: Vec<String>,
    pub summary: String,
    pub strengths: Vec<String>,
}

/// An open role with required/preferred skills and qualification thresholds.
/// Reference data owned by the job source; the core never mutates a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: PostingId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub salary_range: String,
    pub description: String,
    pub required_skills: BTreeSet<String>,
    pub preferred_skills: BTreeSet<String>,
    pub experience_required_years: f32,
    pub education_required: EducationLevel,
    pub posted_at: DateTime<Utc>,
}

/// Raw upload handed to the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeDocument {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Score plus explanation for one candidate/posting pair. Derived data: a
/// pure function of its inputs, recomputed whenever the profile changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub posting_id: PostingId,
    pub score: u8,
    pub matched_required: Vec<String>,
    pub missing_required: Vec<String>,
    pub matched_preferred: Vec<String>,
    pub missing_preferred: Vec<String>,
    pub reasons: Vec<String>,
    pub gaps: Vec<String>,
}
