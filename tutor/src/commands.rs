//! Subcommand handlers. Each prints a human-readable result to stdout.

use crate::cli::{Commands, MarksCommands, Position, StudentCommands};
use crate::setup;
use anyhow::{Context, Result, bail};
use attendance::{AttemptOutcome, AttendanceBackend, FixedLocation};
use chrono::{DateTime, FixedOffset};
use client::marks::to_display_date;
use client::{ApiClient, MarksEntry, Student, StudentUpdate};
use geofence::{Coordinate, EligibilityResult, distance};
use tokio_util::sync::CancellationToken;
use util::config::AppConfig;
use util::http::is_url_alive;

pub async fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Distance {
            from_lat,
            from_lng,
            to_lat,
            to_lng,
        } => run_distance(from_lat, from_lng, to_lat, to_lng),
        Commands::Check { position, at } => {
            println!("{}", check_report(config, position, at.as_deref())?);
            Ok(())
        }
        Commands::Mark {
            position,
            skip_sync,
        } => run_mark(config, position, skip_sync).await,
        Commands::Status => run_status(config).await,
        Commands::Diagnostics => run_diagnostics(config).await,
        Commands::Announcements { all } => run_announcements(config, all).await,
        Commands::Students { command } => run_students(config, command).await,
        Commands::Marks { command } => run_marks(config, command).await,
    }
}

fn api(config: &AppConfig) -> Result<ApiClient> {
    if config.api_token.trim().is_empty() {
        tracing::warn!("API_TOKEN is not set; authenticated calls will be refused");
    }
    ApiClient::from_config(config).context("building API client")
}

fn run_distance(from_lat: f64, from_lng: f64, to_lat: f64, to_lng: f64) -> Result<()> {
    let a = Coordinate::new(from_lat, from_lng)?;
    let b = Coordinate::new(to_lat, to_lng)?;
    println!("{:.2} m", distance(a, b));
    Ok(())
}

fn parse_at(at: Option<&str>, config: &AppConfig) -> Result<DateTime<FixedOffset>> {
    let offset = setup::utc_offset(config);
    match at {
        Some(text) => Ok(DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("--at {text}"))?
            .with_timezone(&offset)),
        None => Ok(chrono::Utc::now().with_timezone(&offset)),
    }
}

/// Local eligibility at `position`, without contacting the backend.
fn check_report(config: &AppConfig, position: Position, at: Option<&str>) -> Result<String> {
    let location = FixedLocation::from_parts(position.lat, position.lng);
    let session = setup::session(config, location, ApiClient::from_config(config)?)?;

    Ok(match session.preview(location.position(), parse_at(at, config)?) {
        EligibilityResult::Allowed { distance_m } => format!(
            "Allowed: {:.1}m from {} (radius {}m)",
            distance_m,
            config.center_name,
            session.policy().radius_m
        ),
        EligibilityResult::Denied(denial) => format!("{}: {}", denial.title(), denial),
    })
}

async fn run_mark(config: &AppConfig, position: Position, skip_sync: bool) -> Result<()> {
    let session = setup::session(
        config,
        FixedLocation::from_parts(position.lat, position.lng),
        api(config)?,
    )?;

    if let Err(e) = session.refresh_policy().await {
        tracing::warn!(error = %e, "could not refresh attendance policy");
    }
    let now = session.now();
    if !skip_sync {
        match session.sync_today(now).await {
            Ok(true) => tracing::info!("backend reports attendance already recorded today"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "could not read today's attendance"),
        }
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    match session.mark_attendance(now, &cancel).await? {
        AttemptOutcome::Marked(receipt) => println!("Success: {}", receipt.message),
        AttemptOutcome::AlreadyMarked(_) => println!("Attendance Marked Successfully"),
        AttemptOutcome::InProgress => println!("Attendance is already being submitted"),
        AttemptOutcome::Denied(denial) => {
            println!("{}: {}", denial.title(), denial);
            if denial.suggests_retry() {
                println!("You can try again.");
            }
        }
        AttemptOutcome::Failed(failure) => {
            println!("{}: {}", failure.title(), failure);
            if failure.is_retryable() {
                println!("Please try again.");
            }
        }
        AttemptOutcome::Cancelled => println!("Cancelled"),
    }
    Ok(())
}

async fn run_status(config: &AppConfig) -> Result<()> {
    let api = api(config)?;
    let enabled = api.button_status().await?;
    println!(
        "Attendance button: {}",
        if enabled { "enabled" } else { "disabled by Admin" }
    );

    let recent = api.recent_attendance().await?;
    match recent.first() {
        Some(record) => println!("Today: marked ({record})"),
        None => println!("Today: not marked"),
    }
    Ok(())
}

async fn run_diagnostics(config: &AppConfig) -> Result<()> {
    println!("Environment: {}", config.env);
    println!("API: {}", config.api_base_url);
    println!(
        "Token: {}",
        if config.api_token.trim().is_empty() { "missing" } else { "present" }
    );

    match is_url_alive(&config.api_base_url, config.request_timeout_secs).await {
        Ok(true) => println!("Reachable: yes"),
        Ok(false) => println!("Reachable: no"),
        Err(e) => println!("Reachable: no ({e})"),
    }

    match api(config)?.check_version().await {
        Ok(check) if check.update_required() => println!(
            "Version {}: update required ({}) {}",
            config.app_version,
            check.current_version.as_deref().unwrap_or("unknown"),
            check.message
        ),
        Ok(check) => println!("Version {}: {}", config.app_version, check.message),
        Err(e) => println!("Version check failed: {e}"),
    }

    let policy = setup::policy(config)?;
    let center = setup::center(config);
    println!("Radius: {}m", policy.radius_m);
    println!("Sunday blocked: {}", policy.sunday_blocked);
    match &policy.window {
        Some(window) => println!("Window: {window}"),
        None => println!("Window: none"),
    }
    match center.coordinates {
        Some(c) => println!("Center: {} {c}", center.name),
        None => println!("Center: {} (location unavailable)", center.name),
    }
    Ok(())
}

async fn run_announcements(config: &AppConfig, all: bool) -> Result<()> {
    let announcements = api(config)?.announcements().await?;
    if announcements.is_empty() {
        println!("No announcements");
        return Ok(());
    }
    let shown = if all { announcements.len() } else { 1 };
    for a in announcements.iter().take(shown) {
        let date = a.created_at.as_deref().map(to_display_date).unwrap_or_default();
        match &a.title {
            Some(title) => println!("[{date}] {title}\n{}\n", a.body),
            None => println!("[{date}] {}\n", a.body),
        }
    }
    Ok(())
}

fn print_student(s: &Student) {
    println!("{}  {}", s.id, s.name);
    println!("  Father's Name: {}", s.father_name.as_deref().unwrap_or("-"));
    println!("  Contact: {}", s.contact.as_deref().unwrap_or("-"));
    println!("  Status: {}", s.status.as_deref().unwrap_or("active"));
    println!("  Medium: {}", s.medium.as_deref().unwrap_or("-"));
    if let Some(remarks) = s.remarks.as_deref().filter(|r| !r.is_empty()) {
        println!("  Remarks: {remarks}");
    }
}

async fn run_students(config: &AppConfig, command: Option<StudentCommands>) -> Result<()> {
    let api = api(config)?;
    match command.unwrap_or(StudentCommands::List) {
        StudentCommands::List => {
            if config.tutor_id.trim().is_empty() {
                bail!("TUTOR_ID is not set");
            }
            let students = api.tutor_students(&config.tutor_id).await?;
            if students.is_empty() {
                println!("No students assigned");
            }
            for s in students {
                println!(
                    "{}  {}  {}  {}",
                    s.id,
                    s.name,
                    s.father_name.as_deref().unwrap_or("-"),
                    s.status.as_deref().unwrap_or("-")
                );
            }
        }
        StudentCommands::Show { student_id } => print_student(&api.student(&student_id).await?),
        StudentCommands::Edit {
            student_id,
            name,
            father_name,
            contact,
            status,
            medium,
            remarks,
        } => {
            let current = api.student(&student_id).await?;
            let mut update = StudentUpdate::from_student(&current);
            let trimmed = |v: String| v.trim().to_string();
            if let Some(v) = name {
                update.name = trimmed(v);
            }
            if let Some(v) = father_name {
                update.father_name = trimmed(v);
            }
            if let Some(v) = contact {
                update.contact = trimmed(v);
            }
            if let Some(v) = status {
                update.status = v;
            }
            if let Some(v) = medium {
                update.medium = Some(trimmed(v));
            }
            if let Some(v) = remarks {
                update.remarks = Some(trimmed(v));
            }

            let stored = api.update_student(&student_id, &update).await?;
            println!("Student updated successfully");
            print_student(&stored);
        }
    }
    Ok(())
}

async fn run_marks(config: &AppConfig, command: MarksCommands) -> Result<()> {
    let api = api(config)?;
    match command {
        MarksCommands::List { student_id } => {
            for record in api.student_subjects(&student_id).await? {
                println!("{} ({})", record.subject.subject_name, record.subject.id);
                for mark in &record.marks_percentage {
                    let date = mark
                        .exam_date
                        .as_deref()
                        .or(mark.recorded_at.as_deref())
                        .map(to_display_date)
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {}  {}%  {}",
                        mark.id.as_deref().unwrap_or("-"),
                        mark.percentage,
                        date
                    );
                }
                if let Some(avg) = record.average() {
                    println!("  average {avg:.2}%");
                }
            }
        }
        MarksCommands::Add {
            student_id,
            subject_id,
            percentage,
            exam_date,
        } => {
            let entry = MarksEntry::parse(&percentage, &exam_date)?;
            api.add_marks(&student_id, &subject_id, &entry).await?;
            println!("Marks added successfully!");
        }
        MarksCommands::Update {
            student_id,
            subject_id,
            percentage,
            exam_date,
        } => {
            let entry = MarksEntry::parse(&percentage, &exam_date)?;
            api.update_marks(&student_id, &subject_id, &entry).await?;
            println!("Marks record updated successfully!");
        }
        MarksCommands::Delete {
            mark_id,
            subject_id,
        } => {
            api.delete_marks(&mark_id, &subject_id).await?;
            println!("Marks record deleted successfully!");
        }
    }
    Ok(())
}
