//! RepSense Clip Analyzer
//!
//! Counts reps in a recorded clip using bilateral joint angles.
//!
//! Usage: analyze-clip EXERCISE [CLIP.json]
//!
//! The clip is a JSON array of `{"at_ms": u64, "pose": {"keypoints": [...]}}`.
//! Without a clip a noisy synthetic one is generated.

use std::time::Duration;

use serde::Deserialize;

use repsense_core::{ExerciseId, PoseFrame, ProfileTable, Timestamp};
use repsense_motion::analyze_recording;
use repsense_runtime::telemetry::{self, LogFormat};
use repsense_test::PoseSynthesizer;

/// Synthetic clip frame rate
const CLIP_FRAME: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct ClipFrame {
    at_ms: u64,
    #[serde(default)]
    pose: PoseFrame,
}

fn synthetic_clip(poses: &mut PoseSynthesizer, reps: usize) -> Vec<ClipFrame> {
    let mut frames = Vec::new();
    let mut at = Duration::ZERO;
    for frame in poses.rep_frames(reps) {
        // Hold each extreme for a few frames like a real subject
        for _ in 0..5 {
            frames.push(ClipFrame {
                at_ms: at.as_millis() as u64,
                pose: frame.clone(),
            });
            at += CLIP_FRAME;
        }
    }
    frames
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init(LogFormat::Pretty)?;

    let mut args = std::env::args().skip(1);
    let exercise: ExerciseId = args
        .next()
        .ok_or("usage: analyze-clip EXERCISE [CLIP.json]")?
        .parse()?;
    let profile = ProfileTable::standard().resolve(exercise)?;

    let clip = match args.next() {
        Some(path) => serde_json::from_str::<Vec<ClipFrame>>(&std::fs::read_to_string(path)?)?,
        None => {
            let mut poses = PoseSynthesizer::new(profile.clone(), 7).with_noise(3.0);
            synthetic_clip(&mut poses, 6)
        }
    };

    let summary = analyze_recording(
        profile,
        clip.iter().map(|f| (Timestamp::from_millis(f.at_ms), &f.pose)),
    );

    println!("{}: {} reps", exercise.display_name(), summary.reps);
    println!(
        "  frames:         {} ({} with pose)",
        summary.frames, summary.frames_with_pose
    );
    println!("  duration:       {}", humantime::format_duration(summary.duration));
    match summary.mean_rep_interval {
        Some(interval) => println!("  rep interval:   {}", humantime::format_duration(interval)),
        None => println!("  rep interval:   n/a"),
    }
    Ok(())
}
