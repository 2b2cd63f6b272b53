use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use tracing::Level;

use attendance_tracker_app::config::AppConfig;
use attendance_tracker_app::domain::commands::attendance::RegisterAttendanceCommand;
use attendance_tracker_app::domain::models::Attendance;
use attendance_tracker_app::domain::{EndOfDayStart, IncompleteResolution};
use attendance_tracker_app::{initialize_app, AppState};
use shared::{TreatmentType, TIME_FORMAT};

#[derive(Parser)]
#[command(
    name = "attendance-tracker",
    about = "Clinic attendance management client",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the agenda for a day
    Day {
        /// Date (YYYY-MM-DD); defaults to today
        date: Option<NaiveDate>,
    },
    /// Register a patient for one or more treatments
    Register {
        #[arg(long)]
        patient_id: String,
        #[arg(long)]
        name: String,
        /// Date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Time of day (HH:MM)
        #[arg(long, default_value = "09:00")]
        time: String,
        /// Treatment types: spiritual, light-bath, rod (repeatable)
        #[arg(long = "treatment", required = true)]
        treatments: Vec<String>,
        /// Check the patient in immediately after creation
        #[arg(long)]
        check_in: bool,
    },
    /// Check a patient in for an attendance
    CheckIn {
        attendance_id: String,
        /// Date the attendance is scheduled on; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark an attendance's treatment session as started
    Begin {
        attendance_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark an attendance completed
    Complete {
        attendance_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run the end-of-day reconciliation for a date
    EndOfDay {
        /// Date (YYYY-MM-DD); defaults to today
        date: Option<NaiveDate>,
        /// Re-queue unfinished sessions instead of completing them
        #[arg(long)]
        reschedule_unfinished: bool,
        /// Apply the decisions; without this flag only the summary is shown
        #[arg(long)]
        apply: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = AppConfig::from_env()?;
    let state = initialize_app(&config)?;

    match Cli::parse().command {
        Command::Day { date } => show_day(&state, date.unwrap_or_else(today)).await,
        Command::Register {
            patient_id,
            name,
            date,
            time,
            treatments,
            check_in,
        } => {
            register(
                &state,
                &config,
                patient_id,
                name,
                date.unwrap_or_else(today),
                &time,
                treatments,
                check_in,
            )
            .await
        }
        Command::CheckIn {
            attendance_id,
            date,
        } => {
            let attendance = find_attendance(&state, date.unwrap_or_else(today), &attendance_id).await?;
            let updated = state.attendance_service.check_in(&attendance).await?;
            println!("{} checked in ({})", updated.patient_name, updated.id);
            Ok(())
        }
        Command::Begin {
            attendance_id,
            date,
        } => {
            let attendance = find_attendance(&state, date.unwrap_or_else(today), &attendance_id).await?;
            let updated = state.attendance_service.begin_treatment(&attendance).await?;
            println!(
                "Session started for {} ({})",
                updated.patient_name, updated.id
            );
            Ok(())
        }
        Command::Complete {
            attendance_id,
            date,
        } => {
            let attendance = find_attendance(&state, date.unwrap_or_else(today), &attendance_id).await?;
            let updated = state.attendance_service.complete(&attendance).await?;
            println!(
                "Session completed for {} ({})",
                updated.patient_name, updated.id
            );
            Ok(())
        }
        Command::EndOfDay {
            date,
            reschedule_unfinished,
            apply,
        } => end_of_day(&state, date.unwrap_or_else(today), reschedule_unfinished, apply).await,
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn show_day(state: &AppState, date: NaiveDate) -> Result<()> {
    let store = state.attendance_service.load_day(date).await?;
    let agenda = state.agenda_service.day_agenda(&store);

    println!("Agenda for {}", agenda.date);
    if agenda.sections.is_empty() {
        println!("  (no attendances)");
    }
    for section in &agenda.sections {
        println!("\n{}:", section.treatment_type);
        for entry in &section.entries {
            println!(
                "  {}  {:<30} {:<12} {}",
                entry.time.format(TIME_FORMAT),
                entry.patient_name,
                entry.status.label(),
                entry.attendance_id
            );
        }
    }

    let totals = agenda.totals;
    println!(
        "\n{} scheduled, {} present, {} completed, {} missed, {} cancelled",
        totals.scheduled, totals.present, totals.completed, totals.missed, totals.cancelled
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn register(
    state: &AppState,
    config: &AppConfig,
    patient_id: String,
    name: String,
    date: NaiveDate,
    time: &str,
    treatments: Vec<String>,
    check_in: bool,
) -> Result<()> {
    let time = NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map_err(|_| anyhow!("Time must be in HH:MM format"))?;
    let treatment_types = treatments
        .iter()
        .map(|s| s.parse::<TreatmentType>().map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()?;

    let result = state
        .attendance_service
        .register(RegisterAttendanceCommand {
            patient_id,
            patient_name: name,
            date,
            time,
            treatment_types,
            check_in: check_in || config.check_in_on_register,
        })
        .await?;

    for registered in &result.registered {
        let attendance = &registered.attendance;
        println!(
            "Registered {} for {} on {} at {} ({})",
            attendance.patient_name,
            attendance.treatment_type,
            attendance.scheduled_date,
            attendance.scheduled_time.format(TIME_FORMAT),
            attendance.id
        );
        if let Some(ref error) = registered.check_in_error {
            println!("  warning: created but check-in failed: {}", error);
        }
    }
    for failure in &result.failures {
        println!(
            "Failed to register {}: {}",
            failure.treatment_type, failure.error
        );
    }

    if !result.success() {
        return Err(anyhow!(
            "{} of {} registrations failed",
            result.failures.len(),
            result.failures.len() + result.registered.len()
        ));
    }
    Ok(())
}

async fn find_attendance(
    state: &AppState,
    date: NaiveDate,
    attendance_id: &str,
) -> Result<Attendance> {
    let store = state.attendance_service.load_day(date).await?;
    store
        .all()
        .into_iter()
        .find(|a| a.id == attendance_id)
        .cloned()
        .ok_or_else(|| anyhow!("No attendance {} on {}", attendance_id, date))
}

async fn end_of_day(
    state: &AppState,
    date: NaiveDate,
    reschedule_unfinished: bool,
    apply: bool,
) -> Result<()> {
    let mut flow = match state.end_of_day_service.start(date).await? {
        EndOfDayStart::AlreadyComplete(completion) => {
            println!(
                "Day {} already reconciled: {} patient(s), {} completed, {} missed",
                date, completion.total_patients, completion.completed, completion.missed
            );
            return Ok(());
        }
        EndOfDayStart::InProgress(flow) => flow,
    };

    // Non-interactive pass: one action for every unfinished session, every
    // absence left on its default (unjustified, no notes).
    let resolution = if reschedule_unfinished {
        IncompleteResolution::Reschedule
    } else {
        IncompleteResolution::Complete
    };
    let incomplete_ids: Vec<String> = flow.incomplete().iter().map(|a| a.id.clone()).collect();
    for id in &incomplete_ids {
        flow.resolve(id, resolution);
    }
    while flow.advance() {}

    let summary = flow.summary();
    println!(
        "End of day {}: {} to complete, {} to reschedule, {} justified, {} unjustified absence(s)",
        date, summary.to_complete, summary.to_reschedule, summary.justified, summary.unjustified
    );

    if !apply {
        println!("Dry run; pass --apply to commit these decisions.");
        return Ok(());
    }

    let outcome = state.end_of_day_service.submit(date, flow).await?;
    for batch in [
        ("completed", &outcome.report.completed),
        ("rescheduled", &outcome.report.rescheduled),
        ("absences", &outcome.report.absences),
    ] {
        if let (label, Some(result)) = batch {
            println!(
                "{}: {} applied, {} failed",
                label,
                result.succeeded(),
                result.failed()
            );
            for record in result.results.iter().filter(|r| !r.success) {
                println!(
                    "  {} ({}): {}",
                    record.patient_name,
                    record.attendance_id,
                    record.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    let completion = outcome.completion;
    println!(
        "Day {} finalized: {} patient(s), {} completed, {} missed",
        date, completion.total_patients, completion.completed, completion.missed
    );
    if !outcome.report.success() {
        return Err(anyhow!("Some updates failed; re-run to retry them"));
    }
    Ok(())
}
