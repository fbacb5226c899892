//! `stancelink-cli` – StanceLink Command Line Interface
//!
//! Drives a simulated body from a pressure-insole stream.  It:
//!
//! 1. Loads `~/.stancelink/config.toml` (or `--config`), applying
//!    `STANCELINK_*` environment overrides and then command-line flags.
//! 2. Opens the sensor source (`-` for stdin, otherwise a file, FIFO or
//!    serial device node) and starts the sensor link thread.
//! 3. Runs the posture loop at a fixed tick rate, printing every committed
//!    posture and decode fault.
//! 4. Exits once the stream has closed and the body has settled, or on
//!    **Ctrl-C**, and prints a run summary.

mod config;

use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use stancelink_hal::SimBody;
use stancelink_middleware::{EventBus, SensorLink, Topic, TopicReceiver};
use stancelink_runtime::{PostureController, PostureLoop, init_tracing};
use stancelink_types::EventPayload;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "stancelink", version, about = "Foot-pressure posture controller")]
struct Cli {
    /// Config file (defaults to ~/.stancelink/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Sensor source path, or `-` for stdin.
    #[arg(long, value_name = "PATH")]
    source: Option<String>,

    /// Pressure threshold separating sitting from standing.
    #[arg(long)]
    threshold: Option<f32>,

    /// Simulation ticks per second.
    #[arg(long)]
    tick_hz: Option<u32>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _otel_guard = init_tracing("stancelink");

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut cfg = match config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            Config::default()
        }
    };
    apply_cli_overrides(&mut cfg, &cli);

    if cli.write_default_config {
        return match config::save_to(&cfg, &config_path) {
            Ok(()) => {
                println!(
                    "  {} Config written to {}",
                    "✓".green(),
                    config_path.display().to_string().bold()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{}: {}", "Config error".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    print_banner(&cfg);

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    let source = match open_source(&cfg.source) {
        Ok(source) => source,
        Err(e) => {
            println!("{}: cannot open {}: {}", "Sensor error".red(), cfg.source, e);
            return ExitCode::FAILURE;
        }
    };

    // ── Controller, loop and sensor link ──────────────────────────────────
    let bus = EventBus::default();
    let mut faults = bus.subscribe_to(Topic::Faults);
    let body = SimBody::new(0.0);
    let controller = PostureController::new(cfg.posture.clone(), Box::new(body), bus);
    let mut posture_loop = PostureLoop::new(controller);

    let link = match SensorLink::spawn(source, posture_loop.outbox()) {
        Ok(link) => link,
        Err(e) => {
            println!("{}: {}", "Sensor error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    run_loop(&mut posture_loop, &mut faults, &shutdown, cfg.tick_hz);

    // ── Teardown ──────────────────────────────────────────────────────────
    let mut ok = true;
    let mut frames = None;
    if link.is_finished() {
        match link.join() {
            Ok(n) => {
                info!(frames = n, "sensor link closed");
                frames = Some(n);
            }
            Err(e) => {
                println!("{}: {}", "Sensor error".red(), e);
                ok = false;
            }
        }
    } else {
        // A blocking read may never return; let the thread die with the process.
        link.disconnect();
    }

    print_summary(&posture_loop, frames);
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Command-line flags win over file and environment values.
fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(source) = &cli.source {
        cfg.source = source.clone();
    }
    if let Some(threshold) = cli.threshold {
        cfg.posture.threshold = threshold;
    }
    if let Some(hz) = cli.tick_hz {
        cfg.tick_hz = hz;
    }
}

fn open_source(source: &str) -> io::Result<Box<dyn Read + Send>> {
    if source == "-" {
        Ok(Box::new(io::stdin()))
    } else {
        Ok(Box::new(File::open(source)?))
    }
}

/// Tick at a fixed rate until the stream is exhausted and the body settled,
/// or until `shutdown` is raised.
fn run_loop(
    posture_loop: &mut PostureLoop,
    faults: &mut TopicReceiver,
    shutdown: &AtomicBool,
    tick_hz: u32,
) {
    let period = Duration::from_secs_f64(1.0 / f64::from(tick_hz.max(1)));
    let dt = period.as_secs_f32();
    let mut next = Instant::now();

    while !shutdown.load(Ordering::SeqCst) {
        let report = posture_loop.tick(dt);
        if let Some(posture) = report.committed {
            println!(
                "  {} {} (y = {:.2})",
                "▶".cyan(),
                posture.to_string().bold(),
                posture_loop.controller().vertical()
            );
        }
        while let Some(event) = faults.try_recv() {
            if let EventPayload::DecodeFault { raw, reason } = event.payload {
                println!("  {} {:?}: {}", "✗".red(), raw, reason.dimmed());
            }
        }

        if posture_loop.controller().link_closed() && posture_loop.is_settled() {
            break;
        }

        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            next = now;
        }
    }
}

fn print_banner(cfg: &Config) {
    println!("{}", "StanceLink".bold().cyan());
    println!(
        "  source {}  ({} @ {} baud)",
        cfg.source.bold(),
        cfg.port_label.dimmed(),
        cfg.baud_rate
    );
    println!(
        "  threshold {}  sitting {}  standing {}  move {}s  tick {} Hz",
        cfg.posture.threshold,
        cfg.posture.sitting_y,
        cfg.posture.standing_y,
        cfg.posture.move_duration_secs,
        cfg.tick_hz
    );
    println!();
}

fn print_summary(posture_loop: &PostureLoop, frames: Option<u64>) {
    let c = posture_loop.controller();
    let stats = c.stats();
    println!();
    println!("{}", "Summary".bold());
    match frames {
        Some(n) => println!("  frames       {}", n),
        None => println!("  frames       {}", "link still open".dimmed()),
    }
    println!("  ticks        {}", posture_loop.ticks());
    println!("  readings     {}", stats.readings);
    println!("  faults       {}", stats.decode_faults.to_string().yellow());
    println!("  ambiguous    {}", stats.ambiguous);
    println!("  transitions  {}", stats.transitions.to_string().green());
    println!("  posture      {}", c.posture().to_string().bold());
    println!("  y            {:.2}", c.vertical());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "stancelink",
            "--source",
            "/dev/ttyACM0",
            "--threshold",
            "300",
            "--tick-hz",
            "120",
        ]);
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.source, "/dev/ttyACM0");
        assert_eq!(cfg.tick_hz, 120);
        assert!((cfg.posture.threshold - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let cli = Cli::parse_from(["stancelink"]);
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg, Config::default());
        assert!(!cli.write_default_config);
    }

    #[test]
    fn open_source_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let missing = dir.path().join("no-such-device");
        assert!(open_source(&missing.to_string_lossy()).is_err());
    }

    #[test]
    fn run_loop_stops_when_stream_is_exhausted() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("frames.txt");
        std::fs::write(&path, "H;900,900,900,900;800,800,800,800\nbad\n").expect("write");

        let bus = EventBus::default();
        let mut faults = bus.subscribe_to(Topic::Faults);
        let controller = PostureController::new(
            stancelink_runtime::PostureConfig::default(),
            Box::new(SimBody::new(0.0)),
            bus,
        );
        let mut posture_loop = PostureLoop::new(controller);
        let source = open_source(&path.to_string_lossy()).expect("open");
        let link = SensorLink::spawn(source, posture_loop.outbox()).expect("spawn");

        run_loop(&mut posture_loop, &mut faults, &AtomicBool::new(false), 1000);

        assert_eq!(link.join().expect("join"), 2);
        let c = posture_loop.controller();
        assert_eq!(c.posture(), stancelink_types::Posture::Standing);
        assert_eq!(c.stats().decode_faults, 1);
    }

    #[test]
    fn run_loop_honours_shutdown_flag() {
        let controller = PostureController::new(
            stancelink_runtime::PostureConfig::default(),
            Box::new(SimBody::new(0.0)),
            EventBus::default(),
        );
        let mut posture_loop = PostureLoop::new(controller);
        let mut faults = EventBus::default().subscribe_to(Topic::Faults);
        run_loop(&mut posture_loop, &mut faults, &AtomicBool::new(true), 50);
        assert_eq!(posture_loop.ticks(), 0);
    }
}
