//! Pure match scoring: a candidate profile against one job posting.
//!
//! Weights are fixed: 60 points for required-skill coverage, 20 for
//! preferred-skill coverage, 15 for experience fit, 5 for education fit.
//! Identical inputs always produce an identical [`MatchResult`].

use std::collections::BTreeSet;

use super::domain::{CandidateProfile, EducationLevel, JobPosting, MatchResult};

const REQUIRED_SKILLS_WEIGHT: f64 = 60.0;
const PREFERRED_SKILLS_WEIGHT: f64 = 20.0;
const EXPERIENCE_WEIGHT: f64 = 15.0;
const EDUCATION_WEIGHT: f64 = 5.0;

/// Scores `profile` against `posting`, emitting the numeric score together
/// with ordered supporting reasons and gap statements: required-skill
/// statements first, then preferred-skill, then experience, then education.
pub fn score(profile: &CandidateProfile, posting: &JobPosting) -> MatchResult {
    let (matched_required, missing_required) =
        skill_coverage(&profile.skills, &posting.required_skills);
    let (matched_preferred, missing_preferred) =
        skill_coverage(&profile.skills, &posting.preferred_skills);

    let required_points = coverage_points(
        matched_required.len(),
        posting.required_skills.len(),
        REQUIRED_SKILLS_WEIGHT,
    );
    let preferred_points = coverage_points(
        matched_preferred.len(),
        posting.preferred_skills.len(),
        PREFERRED_SKILLS_WEIGHT,
    );
    let experience_points = experience_points(
        profile.experience_years,
        posting.experience_required_years,
    );
    let education_points = if profile.education_level >= posting.education_required {
        EDUCATION_WEIGHT
    } else {
        0.0
    };

    let total = required_points + preferred_points + experience_points + education_points;
    let score = total.round().clamp(0.0, 100.0) as u8;

    let mut reasons = Vec::new();
    if !matched_required.is_empty() {
        reasons.push(format!(
            "Covers {}/{} required skills: {}",
            matched_required.len(),
            posting.required_skills.len(),
            matched_required.join(", ")
        ));
    }
    if !matched_preferred.is_empty() {
        reasons.push(format!(
            "Brings {}/{} preferred skills: {}",
            matched_preferred.len(),
            posting.preferred_skills.len(),
            matched_preferred.join(", ")
        ));
    }
    if posting.experience_required_years > 0.0
        && profile.experience_years >= posting.experience_required_years
    {
        let margin = profile.experience_years - posting.experience_required_years;
        if margin > 0.0 {
            reasons.push(format!(
                "{} years of experience exceeds the {}-year requirement by {} years",
                fmt_years(profile.experience_years),
                fmt_years(posting.experience_required_years),
                fmt_years(margin)
            ));
        } else {
            reasons.push(format!(
                "{} years of experience meets the {}-year requirement",
                fmt_years(profile.experience_years),
                fmt_years(posting.experience_required_years)
            ));
        }
    }
    if posting.education_required > EducationLevel::None
        && profile.education_level >= posting.education_required
    {
        reasons.push(format!(
            "Education level {} satisfies the {} requirement",
            profile.education_level.label(),
            posting.education_required.label()
        ));
    }

    let mut gaps = Vec::new();
    for skill in &missing_required {
        gaps.push(format!("Missing required skill: {skill}"));
    }
    for skill in &missing_preferred {
        gaps.push(format!("Preferred skill not evidenced: {skill}"));
    }
    if profile.experience_years < posting.experience_required_years {
        let shortfall = posting.experience_required_years - profile.experience_years;
        gaps.push(format!(
            "Experience falls {} years short of the {}-year requirement",
            fmt_years(shortfall),
            fmt_years(posting.experience_required_years)
        ));
    }
    if profile.education_level < posting.education_required {
        gaps.push(format!(
            "Education level {} is below the required {}",
            profile.education_level.label(),
            posting.education_required.label()
        ));
    }

    MatchResult {
        posting_id: posting.id.clone(),
        score,
        matched_required,
        missing_required,
        matched_preferred,
        missing_preferred,
        reasons,
        gaps,
    }
}

/// Splits `wanted` into matched and missing skills. Comparison is
/// case-insensitive on trimmed tokens; output keeps the posting's spelling in
/// lexicographic order so results are reproducible.
fn skill_coverage(
    candidate: &BTreeSet<String>,
    wanted: &BTreeSet<String>,
) -> (Vec<String>, Vec<String>) {
    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for skill in wanted {
        let hit = candidate
            .iter()
            .any(|owned| owned.trim().eq_ignore_ascii_case(skill.trim()));
        if hit {
            matched.push(skill.clone());
        } else {
            missing.push(skill.clone());
        }
    }
    (matched, missing)
}

/// An empty requirement set counts as full coverage.
fn coverage_points(matched: usize, total: usize, weight: f64) -> f64 {
    if total == 0 {
        weight
    } else {
        weight * matched as f64 / total as f64
    }
}

/// Full credit at or above the requirement, linear down to zero credit at
/// zero years.
fn experience_points(years: f32, required: f32) -> f64 {
    if years >= required || required <= 0.0 {
        EXPERIENCE_WEIGHT
    } else {
        EXPERIENCE_WEIGHT * (years as f64 / required as f64)
    }
}

fn fmt_years(years: f32) -> String {
    if years.fract() == 0.0 {
        format!("{}", years as i64)
    } else {
        format!("{years:.1}")
    }
}
