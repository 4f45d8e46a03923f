use crate::infra::{
    InMemoryApplicationRepository, InMemoryPostingRepository, LoopbackGateway,
};
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use worklink::error::AppError;
use worklink::lifecycle::{
    Actor, ApplicationStatus, InterviewRequest, InterviewType, JobType, LifecycleEngine,
    PostingDraft, Role, TransitionRequest,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the offline/outbox portion of the demo.
    #[arg(long)]
    pub(crate) skip_offline: bool,
}

type DemoEngine =
    LifecycleEngine<InMemoryPostingRepository, InMemoryApplicationRepository, LoopbackGateway>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let postings = Arc::new(InMemoryPostingRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let gateway = Arc::new(LoopbackGateway::default());
    let engine: DemoEngine =
        LifecycleEngine::new(postings, applications, gateway.clone());

    let employer = Actor::new("emp-demo", vec![Role::Employer]);
    let seeker = Actor::new("seeker-demo", vec![Role::JobSeeker]);
    let second_seeker = Actor::new("seeker-demo-2", vec![Role::JobSeeker]);

    println!("Job application lifecycle demo");

    let posting = engine.create_posting(
        &employer,
        PostingDraft {
            title: "CNC Machinist".to_string(),
            company_name: Some("Cedar Valley Tooling".to_string()),
            description: "Program and run 3- and 5-axis mills.".to_string(),
            location: "Waterloo, IA".to_string(),
            job_type: Some(JobType::FullTime),
            min_salary: Some(52_000.0),
            max_salary: Some(68_000.0),
            required_skills: vec!["G-code".to_string(), "Blueprint reading".to_string()],
        },
    )?;
    println!(
        "- Posting {} created ({}, {})",
        posting.id.0,
        posting.title,
        posting.status.descriptor().label
    );

    let application = engine.apply(&seeker, &posting.id)?;
    println!(
        "- Application {} received from {}",
        application.id.0, application.applicant_id.0
    );

    let reviewed = engine.transition(
        &employer,
        &application.id,
        TransitionRequest::to(ApplicationStatus::UnderReview),
    )?;
    println!("  Status: {}", reviewed.status.descriptor().label);

    let scheduled = engine.schedule_interview(
        &employer,
        &application.id,
        InterviewRequest {
            scheduled_at: Utc::now() + Duration::days(3),
            interview_type: InterviewType::VideoCall,
            location: "https://meet.example.com/cedar-valley".to_string(),
            notes: Some("Bring recent part prints".to_string()),
        },
    )?;
    let interview = scheduled
        .interview
        .as_ref()
        .expect("interview attached on the scheduling edge");
    println!(
        "  Interview {} booked for {}",
        interview.id.0, interview.scheduled_at
    );

    let offered = engine.transition(
        &employer,
        &application.id,
        TransitionRequest::to(ApplicationStatus::Offered),
    )?;
    println!("  Status: {} (terminal)", offered.status.descriptor().label);

    let second = engine.apply(&second_seeker, &posting.id)?;
    let rejected = engine.transition(
        &employer,
        &second.id,
        TransitionRequest {
            status: ApplicationStatus::Rejected,
            reject_reason: Some("Offer extended to another candidate".to_string()),
            interview: None,
        },
    )?;
    println!(
        "- Application {} rejected: {}",
        rejected.id.0,
        rejected.reject_reason.as_deref().unwrap_or_default()
    );

    println!("\nStatus metadata served to the dashboards:");
    for descriptor in engine.application_statuses() {
        println!(
            "  - {} | {} | {}",
            descriptor.value,
            descriptor.label,
            serde_json::to_string(&descriptor.color).unwrap_or_default()
        );
    }

    match serde_json::to_string_pretty(&offered) {
        Ok(json) => println!("\nFinal application payload:\n{json}"),
        Err(err) => println!("\nFinal application payload unavailable: {err}"),
    }

    if args.skip_offline {
        return Ok(());
    }

    println!("\nOffline pass (backend unreachable)");
    gateway.set_online(false);
    let offline_posting = engine.create_posting(
        &employer,
        PostingDraft {
            title: "Shipping Clerk".to_string(),
            company_name: Some("Cedar Valley Tooling".to_string()),
            description: "Own outbound freight paperwork.".to_string(),
            location: "Waterloo, IA".to_string(),
            job_type: Some(JobType::PartTime),
            min_salary: None,
            max_salary: None,
            required_skills: Vec::new(),
        },
    )?;
    println!(
        "- Posting {} committed locally, unsynced={}",
        offline_posting.id.0, offline_posting.unsynced
    );
    println!("  Outbox depth: {}", engine.pending_sync().len());

    gateway.set_online(true);
    let report = engine.flush_outbox()?;
    println!(
        "- Backend restored; flush reconciled {} record(s), {} still pending",
        report.reconciled, report.still_pending
    );

    Ok(())
}
