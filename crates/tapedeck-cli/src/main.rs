//! `tapedeck` command-line player and exporter.

mod command;
mod sink;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tapedeck::dataset::Dataset;
use tapedeck::engine::{Controls, PlayerConfig};
use tapedeck::timeline::StopRegions;
use tapedeck::export::export_to_path;
use tapedeck::types::{SensorKind, SensorSet};
use tapedeck::Session;
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP};
use crate::sink::LogSink;

/// How often playback is checked for its end once stdin is closed.
const DRAIN_POLL: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Play(args) => run_play(args),
        Commands::Export { data_dir, output } => run_export(data_dir, output),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay multi-sensor driving recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a recording, reading control commands from stdin.
    Play(PlayArgs),
    /// Write the recording's IMU and lidar records to a binary file.
    Export {
        /// Recording root (the directory containing `sensor_data/`).
        data_dir: PathBuf,
        /// Output file. Defaults to `<DATA_DIR>/imu_lidar_output.tdck`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct PlayArgs {
    /// Recording root (the directory containing `sensor_data/`).
    data_dir: PathBuf,
    /// Playback speed multiplier.
    #[arg(short, long, default_value_t = 1.0)]
    rate: f64,
    /// Restart from the beginning when the timeline ends.
    #[arg(long = "loop")]
    looping: bool,
    /// Replay stop regions instead of skipping them.
    #[arg(long)]
    no_skip_stops: bool,
    /// Load and wait for `start` instead of playing immediately.
    #[arg(long)]
    paused: bool,
    /// Sensor to leave out (gps, imu, ouster/lidar, radar). Repeatable.
    #[arg(long = "disable", value_name = "SENSOR")]
    disabled: Vec<SensorKind>,
}

impl PlayArgs {
    fn config(&self) -> PlayerConfig {
        let enabled = self
            .disabled
            .iter()
            .fold(SensorSet::all(), |set, &sensor| set.without(sensor));
        PlayerConfig {
            rate: self.rate,
            looping: self.looping,
            skip_stops: !self.no_skip_stops,
            auto_start: !self.paused,
            enabled,
            ..PlayerConfig::default()
        }
    }
}

fn run_play(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(LogSink::new());
    let session = Session::open(&args.data_dir, sink.clone(), args.config())?;

    let report = session.dataset().report();
    if report.malformed_total() > 0 || report.unknown_tags > 0 {
        tracing::warn!(
            malformed = report.malformed_total(),
            unknown_tags = report.unknown_tags,
            "recording has unusable lines"
        );
    }

    let controls = session.controls();
    let stops = Arc::clone(session.dataset().stops());
    let quit = control_loop(&controls, &stops, io::stdin().lock());
    if !quit {
        wait_for_end(&controls);
    }

    let shutdown = session.shutdown();
    tracing::info!(
        emitted = sink.emitted(),
        dispatched = shutdown.entries_dispatched,
        threads = shutdown.threads_joined,
        panicked = shutdown.threads_panicked,
        ms = shutdown.total_ms,
        "stopped"
    );
    Ok(())
}

/// Apply control lines until `quit` (returns true) or end of input
/// (returns false).
fn control_loop(controls: &Controls, stops: &StopRegions, input: impl BufRead) -> bool {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed");
                return false;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e} (try 'help')");
                continue;
            }
        };
        match command {
            Command::Quit => return true,
            Command::Help => eprintln!("{HELP}"),
            Command::Status => eprintln!("{}", status(controls, stops)),
            other => {
                if let Err(e) = other.apply(controls) {
                    eprintln!("{e}");
                }
            }
        }
    }
    false
}

fn status(controls: &Controls, stops: &StopRegions) -> String {
    let state = match (controls.is_playing(), controls.is_paused()) {
        (false, _) => "stopped",
        (true, true) => "paused",
        (true, false) => "playing",
    };
    let stamp = controls.current_stamp();
    let mut line = format!(
        "{state} position={}/10000 stamp={stamp} offset={}ns rate={} loop={} skip={}",
        controls.position(),
        controls.processed_offset(),
        controls.rate(),
        controls.is_looping(),
        controls.skips_stops(),
    );
    if let Some(region) = stops.containing(stamp) {
        line.push_str(&format!(" stop={}..{}", region.start, region.end));
    }
    line
}

/// With stdin gone, keep playing until the timeline ends. A looping
/// player never ends on its own and needs a signal.
fn wait_for_end(controls: &Controls) {
    if controls.is_looping() {
        tracing::info!("input closed while looping; interrupt to stop");
    }
    while controls.is_playing() {
        thread::sleep(DRAIN_POLL);
    }
}

fn run_export(data_dir: PathBuf, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let sensors = SensorSet::empty()
        .with(SensorKind::Imu)
        .with(SensorKind::Lidar);
    let dataset = Dataset::load_with(data_dir, sensors)?;
    let output = output.unwrap_or_else(|| dataset.layout().default_export());
    let summary = export_to_path(&dataset, &output)?;
    eprintln!(
        "wrote {} imu and {} lidar frames to {} ({} files skipped)",
        summary.imu_frames,
        summary.lidar_frames,
        output.display(),
        summary.skipped_files
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "tapedeck",
            "play",
            "/data",
            "--rate",
            "2.5",
            "--loop",
            "--no-skip-stops",
            "--paused",
            "--disable",
            "radar",
            "--disable",
            "ouster",
        ]);
        let Commands::Play(args) = cli.command else {
            panic!("expected play");
        };
        let config = args.config();
        assert_eq!(config.rate, 2.5);
        assert!(config.looping);
        assert!(!config.skip_stops);
        assert!(!config.auto_start);
        assert!(config.enabled.contains(SensorKind::Gps));
        assert!(!config.enabled.contains(SensorKind::Lidar));
        assert!(!config.enabled.contains(SensorKind::Radar));
    }

    #[test]
    fn play_defaults() {
        let cli = Cli::parse_from(["tapedeck", "play", "/data"]);
        let Commands::Play(args) = cli.command else {
            panic!("expected play");
        };
        let config = args.config();
        assert_eq!(config.rate, 1.0);
        assert!(config.skip_stops && config.auto_start && !config.looping);
        assert_eq!(config.enabled, SensorSet::all());
    }

    #[test]
    fn unknown_sensor_is_a_usage_error() {
        assert!(Cli::try_parse_from(["tapedeck", "play", "/d", "--disable", "sonar"]).is_err());
    }

    #[test]
    fn status_names_the_enclosing_stop_region() {
        use tapedeck::engine::PlaybackState;
        use tapedeck::timeline::{StopRegion, Timeline, TimelineEntry};

        let timeline = Timeline::new(vec![
            TimelineEntry::new(100, SensorKind::Gps),
            TimelineEntry::new(200, SensorKind::Imu),
        ])
        .unwrap();
        let stops = StopRegions::new(vec![StopRegion::new(150, 250)]).unwrap();
        let state = Arc::new(PlaybackState::new(&PlayerConfig::default()));
        let controls = Controls::new(Arc::clone(&state), Arc::new(timeline));

        state.set_current_stamp(100);
        let line = status(&controls, &stops);
        assert!(line.starts_with("stopped position=0/10000 stamp=100"));
        assert!(!line.contains("stop="));

        state.set_current_stamp(200);
        assert!(status(&controls, &stops).ends_with(" stop=150..250"));
    }

    #[test]
    fn control_loop_stops_at_quit() {
        use tapedeck::engine::PlaybackState;
        use tapedeck::timeline::{Timeline, TimelineEntry};

        let timeline = Timeline::new(vec![TimelineEntry::new(100, SensorKind::Gps)]).unwrap();
        let state = Arc::new(PlaybackState::new(&PlayerConfig::default()));
        let controls = Controls::new(state, Arc::new(timeline));
        let input = "rate 3\n\nbogus\nloop on\nquit\nrate 5\n".as_bytes();
        assert!(control_loop(&controls, &StopRegions::none(), input));
        assert_eq!(controls.rate(), 3.0);
        assert!(controls.is_looping());
    }

    #[test]
    fn export_output_is_optional() {
        let cli = Cli::parse_from(["tapedeck", "export", "/data"]);
        assert!(matches!(cli.command, Commands::Export { output: None, .. }));
        let cli = Cli::parse_from(["tapedeck", "export", "/data", "-o", "/tmp/x.tdck"]);
        assert!(matches!(cli.command, Commands::Export { output: Some(_), .. }));
    }
}
