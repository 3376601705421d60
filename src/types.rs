// src/types.rs
use std::path::PathBuf;
use crate::session::TelemetryStatus;
use crate::waveform::{Channel, ChannelSelection, Gain, TimeWindow};
/// Commands from the UI side to the ingestion worker. The worker applies them
/// between polls so it stays the only writer of the display state.
#[derive(Clone, Debug)]
pub enum MonitorCommand {
    Stop,
    SetEgmGain(Gain),
    SetEcgGain(Gain),
    SetSelection(ChannelSelection),
    SetMarkersEnabled(bool),
    /// Resizes every channel window; samples now outside it are dropped.
    SetWindow(TimeWindow),
    /// Manual annotation, stamped with the worker's clock on arrival.
    AddMarker {
        channel: Channel,
        abbreviation: String,
        modifier: Option<String>,
    },
    Reset,
    StartRecording(PathBuf),
    StopRecording,
}
/// Messages from the worker back to the UI.
#[derive(Clone, Debug)]
pub enum MonitorEvent {
    Log(String),
    Status(TelemetryStatus),
    /// Summary of one non-empty poll; values are from the newest frame.
    Telemetry {
        t_ms: i64,
        frames: usize,
        atrial_mv: Option<f64>,
        ventricular_mv: Option<f64>,
        word: u16,
    },
    TransportError(String),
    RecordingStatus(bool),
    Stopped {
        frames_decoded: u64,
        bytes_discarded: u64,
    },
}
