use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use resume_match::workflows::matching::{
    EducationLevel, ExtractionError, JobPosting, MatchboardService, ObjectStore, PostingId,
    ProfileExtractor, ProgressObserver, ResumeSchema, StorageError, StorageReference,
    StructuredExtractor, TextExtractor,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local object store. A deployment would swap in a blob-storage
/// client behind the same trait.
#[derive(Default, Clone)]
pub(crate) struct InMemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl ObjectStore for InMemoryObjectStore {
    fn store(&self, bytes: &[u8], key: &str) -> Result<StorageReference, StorageError> {
        let mut guard = self.objects.lock().expect("object store mutex poisoned");
        guard.insert(key.to_string(), bytes.to_vec());
        Ok(StorageReference(format!("memory://{key}")))
    }
}

/// Treats the uploaded bytes as UTF-8 text. Stands in for a real PDF/Word
/// text-extraction backend.
pub(crate) struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

const KNOWN_SKILLS: [&str; 24] = [
    "React",
    "TypeScript",
    "JavaScript",
    "CSS",
    "HTML",
    "Node.js",
    "Next.js",
    "Tailwind CSS",
    "GraphQL",
    "Jest",
    "MongoDB",
    "Express",
    "AWS",
    "Docker",
    "Redis",
    "Git",
    "Redux",
    "Figma",
    "Java",
    "Spring Boot",
    "SQL",
    "REST APIs",
    "Kubernetes",
    "Agile",
];

const KNOWN_TITLES: [&str; 6] = [
    "Senior Frontend Developer",
    "Frontend Developer",
    "Full Stack Developer",
    "Software Engineer",
    "React Developer",
    "UI/UX Developer",
];

const EDUCATION_MARKERS: [(&str, &str); 5] = [
    ("phd", "PhD"),
    ("master", "Master's degree"),
    ("bachelor", "Bachelor's degree"),
    ("associate", "Associate degree"),
    ("high school", "High school diploma"),
];

/// Keyword-scanning analyzer that fills the structured resume schema from
/// extracted text. Stands in for an LLM or parsing service; the pipeline
/// re-validates its output either way.
pub(crate) struct KeywordProfileAnalyzer;

impl StructuredExtractor for KeywordProfileAnalyzer {
    fn extract(&self, text: &str, _schema: &ResumeSchema) -> Result<Value, ExtractionError> {
        let haystack = text.to_lowercase();

        let skills: Vec<&str> = KNOWN_SKILLS
            .iter()
            .copied()
            .filter(|skill| haystack.contains(&skill.to_lowercase()))
            .collect();
        let titles: Vec<&str> = KNOWN_TITLES
            .iter()
            .copied()
            .filter(|title| haystack.contains(&title.to_lowercase()))
            .collect();

        let education_level = EDUCATION_MARKERS
            .iter()
            .find(|(marker, _)| haystack.contains(marker))
            .map(|(_, label)| *label)
            .unwrap_or("");

        let summary = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("Profile generated from resume text")
            .to_string();

        let strengths: Vec<String> = skills
            .iter()
            .take(3)
            .map(|skill| format!("Hands-on {skill} experience"))
            .collect();

        Ok(json!({
            "skills": skills,
            "experience_years": years_of_experience(&haystack),
            "education_level": education_level,
            "job_titles": titles,
            "summary": summary,
            "strengths": strengths,
        }))
    }
}

/// Picks the number immediately preceding the first "year(s)" token, the way
/// resumes phrase it ("6 years of experience").
fn years_of_experience(haystack: &str) -> f32 {
    let tokens: Vec<&str> = haystack.split_whitespace().collect();
    for (index, token) in tokens.iter().enumerate().skip(1) {
        if token.starts_with("year") {
            let candidate: String = tokens[index - 1]
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if let Ok(years) = candidate.parse::<f32>() {
                return years;
            }
        }
    }
    0.0
}

pub(crate) fn build_matchboard(observer: Option<Arc<dyn ProgressObserver>>) -> MatchboardService {
    let store = Arc::new(InMemoryObjectStore::default());
    let text = Arc::new(PlainTextExtractor);
    let analyzer = Arc::new(KeywordProfileAnalyzer);
    let extractor = match observer {
        Some(observer) => ProfileExtractor::with_observer(store, text, analyzer, observer),
        None => ProfileExtractor::new(store, text, analyzer),
    };
    MatchboardService::new(extractor)
}

fn skills(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Fixture catalog loaded at startup until a live job source is wired in.
pub(crate) fn seed_postings() -> Vec<JobPosting> {
    vec![
        JobPosting {
            id: PostingId("job-1".to_string()),
            title: "Senior Frontend Developer".to_string(),
            company: "TechCorp Inc.".to_string(),
            location: "San Francisco, CA".to_string(),
            employment_type: "Full-time".to_string(),
            salary_range: "$120,000 - $160,000".to_string(),
            description: "We are looking for a Senior Frontend Developer to join our team and help build amazing user experiences.".to_string(),
            required_skills: skills(&["React", "TypeScript", "JavaScript", "CSS", "HTML"]),
            preferred_skills: skills(&["Next.js", "Tailwind CSS", "GraphQL", "Jest"]),
            experience_required_years: 5.0,
            education_required: EducationLevel::Bachelor,
            posted_at: Utc.with_ymd_and_hms(2024, 1, 13, 9, 0, 0).single().expect("valid date"),
        },
        JobPosting {
            id: PostingId("job-2".to_string()),
            title: "Full Stack Developer".to_string(),
            company: "StartupXYZ".to_string(),
            location: "Remote".to_string(),
            employment_type: "Full-time".to_string(),
            salary_range: "$90,000 - $130,000".to_string(),
            description: "Join our fast-growing startup as a Full Stack Developer and help shape the future of our platform.".to_string(),
            required_skills: skills(&["JavaScript", "Node.js", "React", "MongoDB", "Express"]),
            preferred_skills: skills(&["AWS", "Docker", "Redis", "TypeScript"]),
            experience_required_years: 3.0,
            education_required: EducationLevel::Bachelor,
            posted_at: Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).single().expect("valid date"),
        },
        JobPosting {
            id: PostingId("job-3".to_string()),
            title: "React Developer".to_string(),
            company: "Digital Agency Pro".to_string(),
            location: "New York, NY".to_string(),
            employment_type: "Contract".to_string(),
            salary_range: "$80 - $100/hour".to_string(),
            description: "We need a skilled React Developer for a 6-month contract to build client applications.".to_string(),
            required_skills: skills(&["React", "JavaScript", "CSS", "Git"]),
            preferred_skills: skills(&["Redux", "Styled Components", "Webpack"]),
            experience_required_years: 3.0,
            education_required: EducationLevel::None,
            posted_at: Utc.with_ymd_and_hms(2024, 1, 12, 9, 0, 0).single().expect("valid date"),
        },
        JobPosting {
            id: PostingId("job-4".to_string()),
            title: "UI/UX Developer".to_string(),
            company: "Design Studio".to_string(),
            location: "Los Angeles, CA".to_string(),
            employment_type: "Part-time".to_string(),
            salary_range: "$60,000 - $80,000".to_string(),
            description: "Looking for a UI/UX Developer to bridge the gap between design and development.".to_string(),
            required_skills: skills(&["HTML", "CSS", "JavaScript", "Figma", "Adobe Creative Suite"]),
            preferred_skills: skills(&["React", "Vue.js", "SASS", "Animation"]),
            experience_required_years: 2.0,
            education_required: EducationLevel::Bachelor,
            posted_at: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).single().expect("valid date"),
        },
        JobPosting {
            id: PostingId("job-5".to_string()),
            title: "Software Engineer".to_string(),
            company: "Enterprise Solutions".to_string(),
            location: "Chicago, IL".to_string(),
            employment_type: "Full-time".to_string(),
            salary_range: "$100,000 - $140,000".to_string(),
            description: "Join our enterprise team to build scalable software solutions for Fortune 500 clients.".to_string(),
            required_skills: skills(&["Java", "Spring Boot", "SQL", "REST APIs"]),
            preferred_skills: skills(&["Microservices", "Kubernetes", "Jenkins", "Agile"]),
            experience_required_years: 4.0,
            education_required: EducationLevel::Bachelor,
            posted_at: Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).single().expect("valid date"),
        },
    ]
}
