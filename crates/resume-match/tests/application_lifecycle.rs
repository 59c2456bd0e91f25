//! Application lifecycle specifications: the transition table, duplicate
//! guards, terminal states, and derived statistics.

use chrono::{TimeZone, Utc};
use resume_match::workflows::matching::domain::PostingId;
use resume_match::workflows::matching::tracker::{
    ApplicationError, ApplicationId, ApplicationStatus, ApplicationTracker,
};

fn posting(id: &str) -> PostingId {
    PostingId(id.to_string())
}

fn applied_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
}

#[test]
fn happy_path_walks_submitted_to_offer() {
    let mut tracker = ApplicationTracker::new();
    let id = tracker
        .apply(posting("job-1"), applied_at())
        .expect("apply")
        .id
        .clone();
    assert_eq!(id, ApplicationId("app-000001".to_string()));

    assert_eq!(
        tracker.mark_under_review(&id).expect("review").status,
        ApplicationStatus::UnderReview
    );
    let interview_at = Utc.with_ymd_and_hms(2024, 2, 10, 15, 0, 0).unwrap();
    let scheduled = tracker
        .schedule_interview(&id, interview_at)
        .expect("schedule");
    assert_eq!(scheduled.status, ApplicationStatus::InterviewScheduled);
    assert_eq!(scheduled.interview_at, Some(interview_at));

    let offered = tracker.receive_offer(&id).expect("offer");
    assert_eq!(offered.status, ApplicationStatus::OfferReceived);
    assert!(offered.status.is_terminal());
}

#[test]
fn transitions_outside_the_table_are_refused() {
    let mut tracker = ApplicationTracker::new();
    let id = tracker
        .apply(posting("job-1"), applied_at())
        .expect("apply")
        .id
        .clone();

    // Submitted cannot jump straight to an interview or an offer.
    assert!(matches!(
        tracker.schedule_interview(&id, applied_at()),
        Err(ApplicationError::InvalidTransition { .. })
    ));
    assert!(matches!(
        tracker.receive_offer(&id),
        Err(ApplicationError::InvalidTransition { .. })
    ));

    tracker.mark_under_review(&id).expect("review");
    assert!(matches!(
        tracker.mark_under_review(&id),
        Err(ApplicationError::InvalidTransition { .. })
    ));
    assert!(matches!(
        tracker.receive_offer(&id),
        Err(ApplicationError::InvalidTransition { .. })
    ));
}

#[test]
fn terminal_states_accept_no_further_events() {
    let mut tracker = ApplicationTracker::new();
    let id = tracker
        .apply(posting("job-1"), applied_at())
        .expect("apply")
        .id
        .clone();
    tracker.reject(&id).expect("reject");

    assert!(matches!(
        tracker.mark_under_review(&id),
        Err(ApplicationError::InvalidTransition { .. })
    ));
    assert!(matches!(
        tracker.reject(&id),
        Err(ApplicationError::InvalidTransition { .. })
    ));
    assert!(matches!(
        tracker.receive_offer(&id),
        Err(ApplicationError::InvalidTransition { .. })
    ));
}

#[test]
fn rejection_is_allowed_from_every_active_status() {
    for advance in 0..3 {
        let mut tracker = ApplicationTracker::new();
        let id = tracker
            .apply(posting("job-1"), applied_at())
            .expect("apply")
            .id
            .clone();
        if advance >= 1 {
            tracker.mark_under_review(&id).expect("review");
        }
        if advance >= 2 {
            tracker
                .schedule_interview(&id, applied_at())
                .expect("schedule");
        }

        let rejected = tracker.reject(&id).expect("reject");
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
    }
}

#[test]
fn duplicate_applications_are_refused_until_the_first_is_terminal() {
    let mut tracker = ApplicationTracker::new();
    let id = tracker
        .apply(posting("job-1"), applied_at())
        .expect("apply")
        .id
        .clone();

    let err = tracker.apply(posting("job-1"), applied_at()).unwrap_err();
    assert!(matches!(err, ApplicationError::DuplicateApplication(_)));
    assert_eq!(
        err.to_string(),
        "an active application already exists for posting 'job-1'"
    );

    // A terminal outcome frees the posting for a fresh application; the old
    // record is kept for history.
    tracker.reject(&id).expect("reject");
    let second = tracker
        .apply(posting("job-1"), applied_at())
        .expect("re-apply");
    assert_eq!(second.id, ApplicationId("app-000002".to_string()));
    assert_eq!(tracker.all().count(), 2);
    assert_eq!(
        tracker.status_for(&posting("job-1")),
        Some(ApplicationStatus::Submitted)
    );
}

#[test]
fn unknown_application_ids_are_not_found() {
    let mut tracker = ApplicationTracker::new();
    let ghost = ApplicationId("app-999999".to_string());
    assert!(matches!(
        tracker.mark_under_review(&ghost),
        Err(ApplicationError::NotFound)
    ));
    assert!(matches!(
        tracker.append_note(&ghost, "ping"),
        Err(ApplicationError::NotFound)
    ));
}

#[test]
fn notes_accumulate_and_next_step_replaces() {
    let mut tracker = ApplicationTracker::new();
    let id = tracker
        .apply(posting("job-1"), applied_at())
        .expect("apply")
        .id
        .clone();

    tracker.append_note(&id, "Sent follow-up email").expect("note");
    tracker.append_note(&id, "Recruiter replied").expect("note");
    tracker
        .set_next_step(&id, Some("Prepare portfolio".to_string()))
        .expect("next step");
    tracker
        .set_next_step(&id, Some("Phone screen Friday".to_string()))
        .expect("next step");

    let application = tracker.get(&id).expect("tracked");
    assert_eq!(application.notes, "Sent follow-up email\nRecruiter replied");
    assert_eq!(
        application.next_step.as_deref(),
        Some("Phone screen Friday")
    );
}

#[test]
fn progress_is_a_pure_projection_of_status() {
    assert_eq!(ApplicationStatus::Submitted.progress(), 25);
    assert_eq!(ApplicationStatus::UnderReview.progress(), 50);
    assert_eq!(ApplicationStatus::InterviewScheduled.progress(), 75);
    assert_eq!(ApplicationStatus::OfferReceived.progress(), 100);
    assert_eq!(ApplicationStatus::Rejected.progress(), 0);
}

#[test]
fn stats_count_the_live_application_set() {
    let mut tracker = ApplicationTracker::new();

    tracker.apply(posting("job-1"), applied_at()).expect("apply");

    let reviewing = tracker.apply(posting("job-2"), applied_at()).expect("apply").id.clone();
    tracker.mark_under_review(&reviewing).expect("review");

    let interviewing = tracker.apply(posting("job-3"), applied_at()).expect("apply").id.clone();
    tracker.mark_under_review(&interviewing).expect("review");
    tracker
        .schedule_interview(&interviewing, applied_at())
        .expect("schedule");

    let offered = tracker.apply(posting("job-4"), applied_at()).expect("apply").id.clone();
    tracker.mark_under_review(&offered).expect("review");
    tracker.schedule_interview(&offered, applied_at()).expect("schedule");
    tracker.receive_offer(&offered).expect("offer");

    let rejected = tracker.apply(posting("job-5"), applied_at()).expect("apply").id.clone();
    tracker.reject(&rejected).expect("reject");

    let stats = tracker.stats();
    assert_eq!(stats.total, 5);
    // Interview-scheduled applications are still pending and also counted as
    // interviews.
    assert_eq!(stats.pending, 3);
    assert_eq!(stats.interviews, 1);
    assert_eq!(stats.offers, 1);
}
