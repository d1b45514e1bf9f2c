//! filamentwatch — host entry point.
//!
//! Wires the monitor core to host-side adapters and drives it from stdin.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  SimGpio        LogPrinter         LogEventSink              │
//! │  (GpioPort)     (PrintActionSink)  (EventSink)               │
//! │  JsonSettingsStore (SettingsPort)                            │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  PrintLifecycleCoordinator                             │  │
//! │  │  SensorMonitor (nonuniform) · SensorMonitor (overfill) │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  EdgeRuntime (debounce tasks, own thread)                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands, one per line:
//!
//! | Command                          | Effect                               |
//! |----------------------------------|--------------------------------------|
//! | `PrintStarted`, `PrintDone`, ... | host lifecycle event                 |
//! | `status`                         | status JSON and snapshot per sensor  |
//! | `set <sensor> <0\|1>`            | drive the simulated pin level        |
//! | `reload`                         | re-read the settings file            |
//! | `quit`                           | disarm and exit                      |
//!
//! Simulated inputs are pulled up and idle high.  A switch that is closed
//! while filament is fine therefore wants `"switch": 0` in the settings file;
//! with the default `1` the sensor reads fault at rest and every
//! `PrintStarted` is cancelled until `set <sensor> 0` drives it low.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::digital::PinState;
use log::{info, warn};

use filamentwatch::adapters::log_sink::{LogEventSink, LogPrinter};
use filamentwatch::adapters::settings_file::JsonSettingsStore;
use filamentwatch::adapters::sim_gpio::SimGpio;
use filamentwatch::app::coordinator::PrintLifecycleCoordinator;
use filamentwatch::app::ports::SettingsPort;
use filamentwatch::config::PluginSettings;
use filamentwatch::runtime::EdgeRuntime;
use filamentwatch::sensors::SensorKind;
use filamentwatch::sensors::monitor::MonitorPorts;

/// Debounced filament sensor monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (JSON)
    #[arg(default_value = "filamentwatch.json")]
    settings: PathBuf,

    /// enable debug messages
    #[arg(short, long)]
    verbose: bool,
}

// ── Commands ──────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Status,
    Set(SensorKind, PinState),
    Reload,
    Quit,
    /// Anything else is passed to the coordinator as a host event name.
    Host(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("status") => Ok(Self::Status),
            Some("reload") => Ok(Self::Reload),
            Some("quit" | "exit") => Ok(Self::Quit),
            Some("set") => {
                let usage = || "usage: set <nonuniform|overfill> <0|1>".to_string();
                let kind = words.next().and_then(SensorKind::from_name).ok_or_else(usage)?;
                let level = match words.next() {
                    Some("0") => PinState::Low,
                    Some("1") => PinState::High,
                    _ => return Err(usage()),
                };
                Ok(Self::Set(kind, level))
            }
            Some(name) => Ok(Self::Host(name)),
            None => Err(String::new()),
        }
    }
}

fn load_settings(store: &JsonSettingsStore) -> PluginSettings {
    store.load().unwrap_or_else(|e| {
        warn!(
            "settings load from {} failed ({}), using defaults",
            store.path().display(),
            e
        );
        PluginSettings::default()
    })
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    // ── 1. Logging ────────────────────────────────────────────
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  filamentwatch v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Settings ───────────────────────────────────────────
    let store = JsonSettingsStore::new(args.settings.clone());
    let settings = load_settings(&store);

    // ── 3. Adapters and runtime ───────────────────────────────
    let runtime = EdgeRuntime::start().context("edge runtime")?;
    let gpio = Arc::new(SimGpio::new());
    let ports = MonitorPorts {
        gpio: gpio.clone(),
        actions: Arc::new(LogPrinter::new()),
        events: Arc::new(LogEventSink::new()),
    };

    // ── 4. Coordinator ────────────────────────────────────────
    let mut coordinator = PrintLifecycleCoordinator::new(settings, ports, runtime);
    info!("ready, reading commands from stdin");

    // ── 5. Command loop ───────────────────────────────────────
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(usage) => {
                if !usage.is_empty() {
                    warn!("{}", usage);
                }
                continue;
            }
        };

        match command {
            Command::Status => {
                for kind in SensorKind::ALL {
                    println!("{}: {}", kind, coordinator.status_json(kind));
                }
                for snapshot in coordinator.snapshots() {
                    println!("{:?}", snapshot);
                }
            }
            Command::Set(kind, level) => {
                let pin = coordinator.monitor(kind).config().pin;
                if coordinator.monitor(kind).is_enabled() {
                    gpio.set_level(pin, level);
                } else {
                    warn!("{} sensor has no pin configured", kind);
                }
            }
            Command::Reload => coordinator.apply_settings(load_settings(&store)),
            Command::Quit => break,
            Command::Host(name) => coordinator.on_host_event(name),
        }
    }

    coordinator.shutdown();
    Ok(())
}
