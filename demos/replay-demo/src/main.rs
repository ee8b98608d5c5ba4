//! RepSense Replay Demo
//!
//! Runs one live session end to end:
//! - Synthetic subject sweeping through reps in front of a fake camera
//! - Progress printed from the session's snapshot stream
//! - Automatic rest and next set on set completion
//! - JSON report written on workout completion
//!
//! Usage: replay-demo [PLAN.json] [--config RUNTIME.json] [--json]

mod reports;
mod subject;

use std::path::PathBuf;
use std::time::Duration;

use repsense_core::{ExerciseId, ProfileTable};
use repsense_runtime::telemetry::{self, LogFormat};
use repsense_runtime::{LiveSession, RuntimeConfig};
use repsense_session::{SessionPhase, SessionPlan};

use reports::JsonFileReports;
use subject::SyntheticSubject;

/// Pause between sets
const REST: Duration = Duration::from_secs(3);

/// Subject's pace
const REP_PERIOD: Duration = Duration::from_millis(2400);

#[derive(Debug, Default)]
struct DemoArgs {
    plan: Option<PathBuf>,
    config: Option<PathBuf>,
    log_format: LogFormat,
}

impl DemoArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = DemoArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => parsed.log_format = LogFormat::Json,
                "--config" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    parsed.config = Some(path.into());
                }
                flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}")),
                path => parsed.plan = Some(path.into()),
            }
        }
        Ok(parsed)
    }
}

fn load_plan(path: Option<&PathBuf>) -> Result<SessionPlan, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(SessionPlan::new(ExerciseId::Squat, 5, 2).with_patient("DEMO-1", "Demo Patient")),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RuntimeConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(RuntimeConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = DemoArgs::parse(std::env::args().skip(1))?;
    telemetry::init(args.log_format)?;

    let plan = load_plan(args.plan.as_ref())?;
    let config = load_config(args.config.as_ref())?;
    let table = ProfileTable::standard();
    let profile = table.resolve(plan.exercise)?;

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║              RepSense Replay Demo                          ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!(
        "Patient {} ({}), {}: {} sets of {} reps, capture every {}",
        plan.patient.name,
        plan.patient.id,
        plan.exercise.display_name(),
        plan.total_sets,
        plan.reps_target,
        humantime::format_duration(config.capture_interval),
    );
    println!();

    let subject = SyntheticSubject::new(profile, REP_PERIOD);
    let reports = JsonFileReports::new(std::env::temp_dir().join("repsense-reports"));
    let session = LiveSession::start(plan.clone(), config, &table, subject, reports)?;

    let mut updates = session.subscribe();
    let mut reps_seen = 0;
    let mut was_active = false;

    while updates.changed().await.is_ok() {
        let snap = updates.borrow_and_update().clone();

        if snap.is_active != was_active {
            was_active = snap.is_active;
            println!("  subject {}", if was_active { "in view" } else { "out of view" });
        }
        if snap.state.total_reps != reps_seen {
            reps_seen = snap.state.total_reps;
            println!(
                "  set {}/{}  rep {}/{}  angle {:>5.1}°  stage {}  elapsed {}s",
                snap.state.current_set,
                plan.total_sets,
                snap.state.reps_in_set,
                plan.reps_target,
                snap.angle_degrees,
                snap.stage,
                snap.state.elapsed_seconds,
            );
        }

        match snap.phase() {
            SessionPhase::Running => {}
            SessionPhase::SetComplete => {
                println!("Set {} complete, resting {}", snap.state.current_set, humantime::format_duration(REST));
                tokio::time::sleep(REST).await;
                session.start_next_set().await?;
            }
            SessionPhase::WorkoutComplete => break,
        }
    }

    let snap = session.snapshot();
    println!();
    println!("Workout complete");
    println!("  total reps:   {}/{}", snap.state.total_reps, plan.assigned_reps());
    println!(
        "  duration:     {}",
        humantime::format_duration(Duration::from_secs(snap.state.elapsed_seconds))
    );
    println!("  form score:   {:.2}", snap.form_score);
    println!("  frames:       {} processed, {} dropped", snap.frames_processed, snap.frames_dropped);

    match session.generate_report().await {
        Ok(locator) => println!("  report:       {locator}"),
        Err(e) => {
            tracing::warn!(error = %e, "No report this time");
            println!("  report:       unavailable ({e})");
        }
    }

    session.dismiss().await;
    Ok(())
}
