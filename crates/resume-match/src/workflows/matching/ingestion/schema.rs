//! Fixed, versioned contract for the structured-extraction collaborator and
//! local validation of what it returns.

use std::collections::BTreeSet;

use serde_json::Value;

use super::IngestionError;
use crate::workflows::matching::domain::{CandidateProfile, EducationLevel};

/// Expected JSON type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    StringArray,
}

#[derive(Debug, Clone, Copy)]
pub struct SchemaField {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// The resume analysis schema handed to the collaborator. All fields are
/// mandatory; the pipeline re-validates the response against this set.
#[derive(Debug)]
pub struct ResumeSchema {
    pub version: &'static str,
    pub fields: &'static [SchemaField],
}

const V1_FIELDS: [SchemaField; 6] = [
    SchemaField {
        name: "skills",
        kind: FieldKind::StringArray,
    },
    SchemaField {
        name: "experience_years",
        kind: FieldKind::Number,
    },
    SchemaField {
        name: "education_level",
        kind: FieldKind::String,
    },
    SchemaField {
        name: "job_titles",
        kind: FieldKind::StringArray,
    },
    SchemaField {
        name: "summary",
        kind: FieldKind::String,
    },
    SchemaField {
        name: "strengths",
        kind: FieldKind::StringArray,
    },
];

static V1: ResumeSchema = ResumeSchema {
    version: "resume-analysis/v1",
    fields: &V1_FIELDS,
};

impl ResumeSchema {
    pub fn v1() -> &'static Self {
        &V1
    }
}

fn violation(reason: String) -> IngestionError {
    IngestionError::AnalysisFailed {
        reason: format!("schema violation: {reason}"),
    }
}

fn string_field(object: &Value, name: &str) -> Result<String, IngestionError> {
    object
        .get(name)
        .ok_or_else(|| violation(format!("missing field '{name}'")))?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| violation(format!("field '{name}' must be a string")))
}

fn number_field(object: &Value, name: &str) -> Result<f64, IngestionError> {
    object
        .get(name)
        .ok_or_else(|| violation(format!("missing field '{name}'")))?
        .as_f64()
        .ok_or_else(|| violation(format!("field '{name}' must be a number")))
}

fn string_array_field(object: &Value, name: &str) -> Result<Vec<String>, IngestionError> {
    let items = object
        .get(name)
        .ok_or_else(|| violation(format!("missing field '{name}'")))?
        .as_array()
        .ok_or_else(|| violation(format!("field '{name}' must be an array")))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| violation(format!("field '{name}' must contain only strings")))
        })
        .collect()
}

/// Validates a collaborator response against the v1 schema and builds the
/// candidate profile from it.
pub(crate) fn profile_from_analysis(raw: Value) -> Result<CandidateProfile, IngestionError> {
    if !raw.is_object() {
        return Err(violation("response is not a JSON object".to_string()));
    }

    let skills = string_array_field(&raw, "skills")?;
    let experience_years = number_field(&raw, "experience_years")?;
    let education_label = string_field(&raw, "education_level")?;
    let titles = string_array_field(&raw, "job_titles")?;
    let summary = string_field(&raw, "summary")?;
    let strengths = string_array_field(&raw, "strengths")?;

    if !experience_years.is_finite() || experience_years < 0.0 {
        return Err(violation(format!(
            "field 'experience_years' must be a non-negative number, got {experience_years}"
        )));
    }

    let skills: BTreeSet<String> = skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect();

    Ok(CandidateProfile {
        skills,
        experience_years: experience_years as f32,
        education_level: EducationLevel::parse(&education_label),
        titles,
        summary,
        strengths,
    })
}
