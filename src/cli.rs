// src/cli.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use anyhow::{bail, Context, Result};
use clap::Parser;
use crate::config::MonitorConfig;
use crate::drivers::{
    encode_command, list_ports, Programmer, ProgrammingSnapshot, SerialTransport,
};
use crate::engine::{spawn_ingest, CancelToken, IngestContext};
use crate::session::{MemorySessionStore, SessionStore};
use crate::types::{MonitorCommand, MonitorEvent};
use crate::waveform::{Channel, ChannelSelection, EgramDisplay, WaveformView};
#[derive(clap::Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON file with monitor settings; defaults are used for anything missing.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}
#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List serial ports the OS knows about.
    Ports,
    /// Check a programming file and print every problem found.
    Validate(ProgramFile),
    /// Validate, then print the command frame that would be sent.
    Encode(ProgramFile),
    /// Validate, encode and send a programming file to the device.
    Program(ProgramArgs),
    /// Stream telemetry from the device and print a live summary.
    Monitor(MonitorArgs),
}
#[derive(Debug, clap::Args)]
pub struct ProgramFile {
    /// JSON with `mode`, `parameters` and an optional `activity_threshold`.
    pub file: PathBuf,
}
#[derive(Debug, clap::Args)]
pub struct ProgramArgs {
    #[command(flatten)]
    pub input: ProgramFile,
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long)]
    pub baud: Option<u32>,
}
#[derive(Debug, clap::Args)]
pub struct MonitorArgs {
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long)]
    pub baud: Option<u32>,
    #[arg(long)]
    pub patient: Option<String>,
    /// atrial, ventricular, both or surface.
    #[arg(long)]
    pub channels: Option<ChannelSelection>,
    /// Stop after this many seconds; runs until interrupted otherwise.
    #[arg(long)]
    pub seconds: Option<u64>,
    /// Write decoded telemetry to this CSV file.
    #[arg(long)]
    pub record: Option<PathBuf>,
    /// Write the finished session as JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}
impl Command {
    pub fn run(self, config: MonitorConfig) -> Result<()> {
        match self {
            Command::Ports => ports(),
            Command::Validate(file) => validate(&file.file),
            Command::Encode(file) => encode(&file.file),
            Command::Program(args) => program(args, config),
            Command::Monitor(args) => monitor(args, config),
        }
    }
}
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = MonitorConfig::load(cli.config.as_deref())?;
    cli.command.run(config)
}
fn load_snapshot(path: &Path) -> Result<ProgrammingSnapshot> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
fn ports() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        println!("{port}");
    }
    Ok(())
}
fn validate(path: &Path) -> Result<()> {
    let snapshot = load_snapshot(path)?;
    let report = snapshot.validate();
    if report.is_valid() {
        println!("OK: {} parameter(s) valid", snapshot.parameters.len());
        return Ok(());
    }
    for issue in report.issues() {
        println!("- {issue}");
    }
    bail!("{} validation issue(s)", report.issues().len())
}
fn encode(path: &Path) -> Result<()> {
    let snapshot = load_snapshot(path)?;
    snapshot.validate().into_result()?;
    if snapshot.parsed_mode().is_none() {
        log::warn!("unknown mode '{}', encoding as AOO with no fields", snapshot.mode);
    }
    println!("{}", encode_command(&snapshot).to_hex());
    Ok(())
}
fn resolve_port(cli: Option<String>, config: &MonitorConfig) -> Result<String> {
    cli.or_else(|| config.port.clone())
        .context("no serial port given; use --port or set `port` in the config")
}
fn program(args: ProgramArgs, config: MonitorConfig) -> Result<()> {
    let snapshot = load_snapshot(&args.input.file)?;
    let port = resolve_port(args.port, &config)?;
    let link = SerialTransport::open(&port, args.baud.unwrap_or(config.baud), config.timeout())?;
    let mut programmer = Programmer::new(link).with_response_wait(config.response_wait());
    let outcome = programmer.send(&snapshot)?;
    println!("sent: {}", outcome.frame.to_hex());
    if outcome.response.is_empty() {
        println!("no response");
    } else {
        let hex: Vec<String> = outcome.response.iter().map(|b| format!("{b:02X}")).collect();
        println!("response: {}", hex.join(" "));
    }
    Ok(())
}
fn print_summary(view: &WaveformView) {
    let mut line = format!("[{:>7} .. {:>7} ms]", view.xlim.0, view.xlim.1);
    for channel in &view.channels {
        let latest = channel
            .samples
            .iter()
            .rev()
            .find_map(|s| s.value)
            .map(|v| format!("{v:+.1} mV"))
            .unwrap_or_else(|| "--".to_string());
        line.push_str(&format!("  {}: {latest}", channel.channel.title()));
        if let Some(word) = channel.telemetry_word {
            line.push_str(&format!(" (0x{word:04X})"));
        }
    }
    if !view.markers.is_empty() {
        let labels: Vec<String> = view.markers.iter().map(|m| m.label()).collect();
        line.push_str(&format!("  markers: {}", labels.join(" ")));
    }
    println!("{line}");
}
fn monitor(args: MonitorArgs, mut config: MonitorConfig) -> Result<()> {
    if let Some(patient) = args.patient {
        config.patient_id = patient;
    }
    if let Some(channels) = args.channels {
        config.channels_selected = channels;
    }
    let port = resolve_port(args.port, &config)?;
    let link = SerialTransport::open(&port, args.baud.unwrap_or(config.baud), config.timeout())?;
    let mut store = MemorySessionStore::new();
    let session = store.create_or_resume_session(&config.patient_id, config.session_settings())?;
    let mut display = EgramDisplay::new(config.time_window());
    display.set_egm_gain(config.egm_gain);
    display.set_ecg_gain(config.ecg_gain);
    display.set_selection(config.channels_selected);
    display.set_markers_enabled(config.markers_enabled);
    let display = Arc::new(RwLock::new(display));
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let cancel = CancelToken::new();
    if let Some(path) = args.record {
        cmd_tx.send(MonitorCommand::StartRecording(path)).ok();
    }
    let handle = spawn_ingest(
        link,
        store,
        IngestContext {
            session_id: session.session_id.clone(),
            display: display.clone(),
            events: event_tx,
            commands: cmd_rx,
            cancel: cancel.clone(),
            poll_interval: config.poll_interval(),
        },
    );
    let deadline = args.seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let tick = Duration::from_millis(500);
    'ui: loop {
        while let Ok(event) = event_rx.try_recv() {
            match event {
                MonitorEvent::Log(msg) => log::info!("{msg}"),
                MonitorEvent::TransportError(msg) => log::warn!("{msg}"),
                MonitorEvent::Stopped { .. } => break 'ui,
                _ => {}
            }
        }
        match display.read() {
            Ok(d) => print_summary(&d.view()),
            Err(_) => bail!("display state poisoned"),
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        std::thread::sleep(tick);
    }
    cancel.cancel();
    drop(cmd_tx);
    let mut store = handle
        .join()
        .map_err(|_| anyhow::anyhow!("telemetry worker panicked"))?;
    let finished = store.finish_session(&session.session_id)?;
    println!(
        "session {} finished: {} atrial / {} ventricular samples",
        finished.session_id,
        finished.samples(Channel::Atrial).len(),
        finished.samples(Channel::Ventricular).len()
    );
    if let Some(path) = args.export {
        let json = serde_json::to_string_pretty(&store)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("session exported to {}", path.display());
    }
    Ok(())
}
