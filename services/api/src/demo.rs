use crate::infra::{build_matchboard, seed_postings};
use chrono::{Duration, Utc};
use clap::Args;
use resume_match::error::AppError;
use resume_match::workflows::matching::{
    IngestionPhase, MatchQuery, ProgressObserver, ProgressUpdate, ResumeDocument,
    ResumeUploadOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;

const SAMPLE_RESUME: &str = "\
Jordan Avery - Senior Frontend Developer
Product-focused frontend engineer with 6 years of experience building web applications.
Skills: React, TypeScript, JavaScript, CSS, HTML, Node.js, Jest, Git
Education: Bachelor of Science in Computer Science
Strengths: component architecture, design systems, mentoring
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Resume file to ingest. Defaults to a bundled sample resume.
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
    /// Skip the application-tracking portion of the demo.
    #[arg(long)]
    pub(crate) skip_applications: bool,
}

struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn progress(&self, update: ProgressUpdate) {
        let phase = match update.phase {
            IngestionPhase::Transfer => "transfer",
            IngestionPhase::Extraction => "extraction",
        };
        println!("  [{phase}] {}%", update.percent);
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        resume,
        skip_applications,
    } = args;

    println!("Resume matchboard demo");

    let service = Arc::new(build_matchboard(Some(Arc::new(ConsoleProgress))));
    for posting in seed_postings() {
        service.add_or_replace_posting(posting);
    }

    let document = match resume {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            let media_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("resume")
                .to_string();
            ResumeDocument {
                file_name,
                media_type,
                bytes,
            }
        }
        None => ResumeDocument {
            file_name: "sample-resume.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            bytes: SAMPLE_RESUME.as_bytes().to_vec(),
        },
    };

    println!("\nIngesting {}", document.file_name);
    let profile = match service.upload_resume(document)? {
        ResumeUploadOutcome::Accepted(profile) => profile,
        ResumeUploadOutcome::Superseded => {
            println!("Upload superseded by a newer submission");
            return Ok(());
        }
    };

    println!("\nExtracted profile");
    println!(
        "- Skills: {}",
        profile.skills.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!("- Experience: {} years", profile.experience_years);
    println!("- Education: {}", profile.education_level.label());
    if !profile.titles.is_empty() {
        println!("- Titles: {}", profile.titles.join(", "));
    }
    if let Some(reference) = service.resume_reference() {
        println!("- Stored at {}", reference.0);
    }

    println!("\nMatches (best first)");
    let rows = service.query_matches(&MatchQuery::default());
    for row in &rows {
        match &row.result {
            Some(result) => println!(
                "- {} at {} | score {}",
                row.posting.title, row.posting.company, result.score
            ),
            None => println!(
                "- {} at {} | not scored",
                row.posting.title, row.posting.company
            ),
        }
    }

    let top = match rows.first() {
        Some(row) => row,
        None => {
            println!("No postings in the catalog");
            return Ok(());
        }
    };
    if let Some(result) = &top.result {
        println!("\nWhy {} leads", top.posting.title);
        for reason in &result.reasons {
            println!("  + {reason}");
        }
        for gap in &result.gaps {
            println!("  - {gap}");
        }
    }

    if skip_applications {
        return Ok(());
    }

    println!("\nApplication walkthrough");
    let application = service.apply_to(&top.posting.id)?;
    println!(
        "- Applied to {} -> {} ({}%)",
        top.posting.title,
        application.status.label(),
        application.status.progress()
    );

    let application = service.mark_under_review(&application.id)?;
    println!(
        "- Recruiter screening -> {} ({}%)",
        application.status.label(),
        application.status.progress()
    );

    let interview_at = Utc::now() + Duration::days(7);
    let application = service.schedule_interview(&application.id, interview_at)?;
    service.append_note(&application.id, "Panel interview confirmed by email")?;
    service.set_next_step(&application.id, Some("Prepare a portfolio review".to_string()))?;
    println!(
        "- Interview on {} -> {} ({}%)",
        interview_at.format("%Y-%m-%d"),
        application.status.label(),
        application.status.progress()
    );

    if let Some(tracked) = service.application(&application.id) {
        match serde_json::to_string_pretty(&tracked) {
            Ok(json) => println!("\nTracked application:\n{json}"),
            Err(err) => println!("\nTracked application unavailable: {err}"),
        }
    }

    let stats = service.stats();
    println!(
        "\nStats: {} total | {} pending | {} interviews | {} offers",
        stats.total, stats.pending, stats.interviews, stats.offers
    );

    Ok(())
}
