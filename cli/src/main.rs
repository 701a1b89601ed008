//! Scheduler Replay CLI
//!
//! Replays a recorded scheduler trace headlessly and prints frame snapshots
//! as JSON lines, one per `--every` frames.
//!
//! # Example
//!
//! ```bash
//! # Replay until every row is applied and all entities are at rest
//! sched-replay timelines/timeline0001.json --until-done --every 32
//!
//! # Fixed frame budget with a custom scene and a scripted pause
//! sched-replay trace.json --config replay.toml --frames 600 --at 120=toggle_pause
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use scheduler_replay_core_rs::{Command, EngineConfig, ReplayEngine, TraceLog};
use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Scheduler trace replay
///
/// Frames advance deterministically; nothing depends on wall-clock time.
#[derive(Parser, Debug)]
#[command(name = "sched-replay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Trace file: JSON array of rows
    trace: PathBuf,

    /// TOML file with engine settings (speeds, divisor, counts, layout)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(short, long, conflicts_with = "until_done")]
    frames: Option<u64>,

    /// Run until the trace is exhausted and every entity is at rest
    #[arg(long)]
    until_done: bool,

    /// Safety cap on frames for --until-done
    #[arg(long, default_value = "1000000")]
    max_frames: u64,

    /// Emit a snapshot every N frames (the final frame is always emitted)
    #[arg(short, long, default_value = "1")]
    every: u64,

    /// Override animation speed
    #[arg(long)]
    speed: Option<f64>,

    /// Override frames per simulated time unit
    #[arg(long)]
    clock_divisor: Option<u32>,

    /// Apply a command before a frame, e.g. `120=toggle_pause` (repeatable)
    #[arg(long = "at", value_parser = parse_scheduled_command)]
    scheduled: Vec<(u64, Command)>,
}

fn parse_scheduled_command(raw: &str) -> Result<(u64, Command), String> {
    let (frame, name) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FRAME=COMMAND, got '{}'", raw))?;
    let frame = frame
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid frame '{}': {}", frame, e))?;
    let command = name.trim().parse::<Command>().map_err(|e| e.to_string())?;
    Ok((frame, command))
}

/// A paused engine with nothing left to resume it will never change again
fn is_stalled(engine: &ReplayEngine, scheduled: &BTreeMap<u64, Vec<Command>>) -> bool {
    engine.is_paused() && scheduled.is_empty()
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn load_trace(path: &Path) -> Result<TraceLog> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    TraceLog::from_json_str(&text).with_context(|| format!("parsing trace {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,scheduler_replay_core_rs=info,sched_replay=info")),
        )
        .init();

    let args = Args::parse();
    if args.every == 0 {
        bail!("--every must be at least 1");
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(clock_divisor) = args.clock_divisor {
        config.clock_divisor = clock_divisor;
    }

    let log = load_trace(&args.trace)?;
    let mut engine = ReplayEngine::new(log, config).context("building replay engine")?;

    let budget = match (args.frames, args.until_done) {
        (Some(frames), _) => frames,
        (None, true) => args.max_frames,
        (None, false) => bail!("pass --frames N or --until-done"),
    };

    let mut scheduled: BTreeMap<u64, Vec<Command>> = BTreeMap::new();
    for (frame, command) in args.scheduled {
        scheduled.entry(frame).or_default().push(command);
    }

    info!(
        trace = %args.trace.display(),
        budget,
        round_robin = engine.is_round_robin(),
        quantum = ?engine.quantum(),
        "starting replay"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut frame = 0;
    while frame < budget {
        if let Some(commands) = scheduled.remove(&frame) {
            for command in commands {
                info!(frame, command = command.as_str(), "applying command");
                engine.apply(command);
            }
        }
        if engine.quit_requested() {
            info!(frame, "quit requested");
            break;
        }
        if is_stalled(&engine, &scheduled) {
            warn!(frame, "paused with no scheduled commands left; stopping");
            serde_json::to_writer(&mut out, &engine.snapshot())?;
            out.write_all(b"\n")?;
            break;
        }

        let result = engine.step(1);
        for diagnostic in &result.diagnostics {
            warn!(frame, "{}", diagnostic);
        }
        frame += 1;

        let done = args.until_done && engine.is_finished();
        if frame % args.every == 0 || done || frame == budget {
            serde_json::to_writer(&mut out, &engine.snapshot())?;
            out.write_all(b"\n")?;
        }
        if done {
            break;
        }
    }
    out.flush()?;

    if args.until_done && !engine.is_finished() {
        warn!(frames = frame, "frame cap reached before the replay finished");
    }
    info!(
        frames = frame,
        simulated_time = engine.simulated_time(),
        finished = engine.finished_order().len(),
        "replay complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheduled_command() {
        assert_eq!(
            parse_scheduled_command("120=toggle_pause"),
            Ok((120, Command::TogglePause))
        );
        assert!(parse_scheduled_command("toggle_pause").is_err());
        assert!(parse_scheduled_command("x=quit").is_err());
        assert!(parse_scheduled_command("5=jump").is_err());
    }

    #[test]
    fn test_paused_without_pending_commands_is_stalled() {
        let log = TraceLog::from_json_str(
            r#"[{"time": 0, "event_type": "arrival", "ready_queue": [1]},
                {"time": 50, "event_type": "arrival", "ready_queue": [1, 2]}]"#,
        )
        .unwrap();
        let mut engine = ReplayEngine::new(log, EngineConfig::default()).unwrap();
        let mut scheduled: BTreeMap<u64, Vec<Command>> = BTreeMap::new();

        assert!(!is_stalled(&engine, &scheduled));

        engine.apply(Command::TogglePause);
        scheduled.insert(10, vec![Command::TogglePause]);
        assert!(!is_stalled(&engine, &scheduled));

        scheduled.clear();
        assert!(is_stalled(&engine, &scheduled));
    }

    #[test]
    fn test_config_from_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            speed = 12.0
            clock_divisor = 8
            cpu_count = 2

            [layout]
            queue_pitch = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.speed, 12.0);
        assert_eq!(config.clock_divisor, 8);
        assert_eq!(config.cpu_count, Some(2));
        assert_eq!(config.layout.queue_pitch, 40);
        assert_eq!(config.layout.queue_inset, 30);
        assert_eq!(config.max_clock_divisor, 120);
    }
}
