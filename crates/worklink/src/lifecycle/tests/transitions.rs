use super::common::*;
use crate::lifecycle::domain::{ApplicationStatus, PostingStatus};
use crate::lifecycle::engine::{LifecycleError, TransitionRequest};
use crate::lifecycle::repository::{ApplicationRepository, RepositoryError};

#[test]
fn apply_creates_received_application_with_seeded_history() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);

    let application = engine.apply(&seeker(), &posting.id).expect("apply");
    assert_eq!(application.status, ApplicationStatus::Received);
    assert_eq!(application.applicant_id, seeker().id);
    assert_eq!(application.history.len(), 1);
    assert_eq!(application.history[0].status, ApplicationStatus::Received);
    assert!(application.reject_reason.is_none());
    assert!(application.interview.is_none());
}

#[test]
fn apply_requires_an_active_posting() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    engine
        .set_posting_status(&employer(), &posting.id, PostingStatus::Hold)
        .expect("hold posting");

    assert!(matches!(
        engine.apply(&seeker(), &posting.id),
        Err(LifecycleError::InvalidTransition(_))
    ));
}

#[test]
fn apply_twice_for_the_same_pair_conflicts() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);

    engine.apply(&seeker(), &posting.id).expect("first apply");
    assert!(matches!(
        engine.apply(&seeker(), &posting.id),
        Err(LifecycleError::Conflict(_))
    ));

    // A different seeker still gets through.
    engine
        .apply(&second_seeker(), &posting.id)
        .expect("second seeker applies");
}

#[test]
fn apply_requires_the_job_seeker_role() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);

    assert!(matches!(
        engine.apply(&employer(), &posting.id),
        Err(LifecycleError::Forbidden(_))
    ));
    assert!(matches!(
        engine.apply(&staff(), &posting.id),
        Err(LifecycleError::Forbidden(_))
    ));
}

#[test]
fn happy_path_walks_received_review_interview_offered() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");

    let reviewed = transition_to(
        &engine,
        &employer(),
        &application.id,
        ApplicationStatus::UnderReview,
    );
    assert_eq!(reviewed.status, ApplicationStatus::UnderReview);

    let scheduled = engine
        .schedule_interview(&employer(), &application.id, future_interview())
        .expect("interview books");
    assert_eq!(scheduled.status, ApplicationStatus::InterviewScheduled);
    assert!(scheduled.interview.is_some());

    let offered = transition_to(
        &engine,
        &employer(),
        &application.id,
        ApplicationStatus::Offered,
    );
    assert_eq!(offered.status, ApplicationStatus::Offered);
    assert_eq!(
        offered
            .history
            .iter()
            .map(|change| change.status)
            .collect::<Vec<_>>(),
        vec![
            ApplicationStatus::Received,
            ApplicationStatus::UnderReview,
            ApplicationStatus::InterviewScheduled,
            ApplicationStatus::Offered,
        ]
    );
}

#[test]
fn received_may_jump_straight_to_interview() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");

    let scheduled = engine
        .schedule_interview(&employer(), &application.id, future_interview())
        .expect("interview books from received");
    assert_eq!(scheduled.status, ApplicationStatus::InterviewScheduled);
}

#[test]
fn received_cannot_be_offered_directly() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");

    assert!(matches!(
        engine.transition(
            &employer(),
            &application.id,
            TransitionRequest::to(ApplicationStatus::Offered),
        ),
        Err(LifecycleError::InvalidTransition(_))
    ));
}

#[test]
fn rejection_requires_a_non_empty_reason() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");

    for reason in [None, Some("".to_string()), Some("   ".to_string())] {
        let result = engine.transition(
            &employer(),
            &application.id,
            TransitionRequest {
                status: ApplicationStatus::Rejected,
                reject_reason: reason,
                interview: None,
            },
        );
        assert!(matches!(result, Err(LifecycleError::Validation(_))));
    }

    let rejected = engine
        .transition(
            &employer(),
            &application.id,
            TransitionRequest {
                status: ApplicationStatus::Rejected,
                reject_reason: Some("  Position filled internally  ".to_string()),
                interview: None,
            },
        )
        .expect("rejection with reason succeeds");
    assert_eq!(rejected.status, ApplicationStatus::Rejected);
    assert_eq!(
        rejected.reject_reason.as_deref(),
        Some("Position filled internally")
    );
}

#[test]
fn terminal_states_accept_no_further_transitions() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");
    transition_to(
        &engine,
        &employer(),
        &application.id,
        ApplicationStatus::UnderReview,
    );
    transition_to(
        &engine,
        &employer(),
        &application.id,
        ApplicationStatus::Offered,
    );

    for next in ApplicationStatus::ALL {
        let result = engine.transition(
            &employer(),
            &application.id,
            TransitionRequest {
                status: next,
                reject_reason: Some("any".to_string()),
                interview: Some(future_interview()),
            },
        );
        assert!(
            matches!(result, Err(LifecycleError::InvalidTransition(_))),
            "offered application accepted a move to {next:?}"
        );
    }
}

#[test]
fn withdrawal_is_applicant_only_and_reachable_from_any_open_state() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");
    engine
        .schedule_interview(&employer(), &application.id, future_interview())
        .expect("interview books");

    // Neither the posting owner nor staff may withdraw for the seeker.
    for actor in [employer(), staff()] {
        assert!(matches!(
            engine.transition(
                &actor,
                &application.id,
                TransitionRequest::to(ApplicationStatus::Withdrawn),
            ),
            Err(LifecycleError::Forbidden(_))
        ));
    }

    let withdrawn = transition_to(
        &engine,
        &seeker(),
        &application.id,
        ApplicationStatus::Withdrawn,
    );
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    // Interview survives withdrawal for audit.
    assert!(withdrawn.interview.is_some());
}

#[test]
fn status_moves_by_foreign_employer_are_forbidden() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");

    assert!(matches!(
        engine.transition(
            &rival_employer(),
            &application.id,
            TransitionRequest::to(ApplicationStatus::UnderReview),
        ),
        Err(LifecycleError::Forbidden(_))
    ));
}

#[test]
fn reject_reason_stays_empty_on_non_rejection_moves() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");

    let reviewed = transition_to(
        &engine,
        &employer(),
        &application.id,
        ApplicationStatus::UnderReview,
    );
    assert!(reviewed.reject_reason.is_none());
}

#[test]
fn stale_version_writes_lose_the_race() {
    let (engine, _, applications, _) = build_engine();
    let posting = seeded_posting(&engine);
    let application = engine.apply(&seeker(), &posting.id).expect("apply");

    // Two writers read the same version; the second commit must fail.
    let snapshot = applications
        .fetch(&application.id)
        .expect("fetch succeeds")
        .expect("present");

    let mut first = snapshot.clone();
    first.status = ApplicationStatus::Offered;
    applications
        .update(first, snapshot.version)
        .expect("first CAS wins");

    let mut second = snapshot.clone();
    second.status = ApplicationStatus::Rejected;
    assert!(matches!(
        applications.update(second, snapshot.version),
        Err(RepositoryError::Conflict)
    ));

    // The winning write is what remains.
    let stored = applications
        .fetch(&application.id)
        .expect("fetch succeeds")
        .expect("present");
    assert_eq!(stored.status, ApplicationStatus::Offered);
}

#[test]
fn recent_applications_filters_by_latest_change() {
    let (engine, _, _, _) = build_engine();
    let posting = seeded_posting(&engine);
    engine.apply(&seeker(), &posting.id).expect("apply");

    let long_ago = chrono::Utc::now() - chrono::Duration::days(30);
    let recent = engine
        .recent_applications(&employer(), &posting.id, long_ago)
        .expect("window query");
    assert_eq!(recent.len(), 1);

    let tomorrow = chrono::Utc::now() + chrono::Duration::days(1);
    let none = engine
        .recent_applications(&employer(), &posting.id, tomorrow)
        .expect("window query");
    assert!(none.is_empty());
}

#[test]
fn status_metadata_covers_every_literal_once() {
    let (engine, _, _, _) = build_engine();

    let statuses = engine.application_statuses();
    let values: Vec<&str> = statuses.iter().map(|descriptor| descriptor.value).collect();
    assert_eq!(
        values,
        vec![
            "RECEIVED",
            "UNDER_REVIEW",
            "INTERVIEW_SCHEDULED",
            "OFFERED",
            "REJECTED",
            "WITHDRAWN",
        ]
    );

    let posting_values: Vec<&str> = engine
        .posting_statuses()
        .iter()
        .map(|descriptor| descriptor.value)
        .collect();
    assert_eq!(posting_values, vec!["ACTIVE", "INACTIVE", "HOLD", "DELETED"]);
}
