// src/config.rs
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::drivers::DEFAULT_BAUD;
use crate::session::SessionSettings;
use crate::waveform::{ChannelSelection, Gain, TimeWindow};
/// Runtime settings for the monitor and programmer. Every field has a default,
/// so a config file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub port: Option<String>,
    pub baud: u32,
    /// Serial read timeout.
    pub timeout_ms: u64,
    /// Sleep between polls when no bytes are waiting.
    pub poll_interval_ms: u64,
    /// Pause between writing a programming frame and reading the reply.
    pub response_wait_ms: u64,
    pub patient_id: String,
    pub window_seconds: f64,
    pub sampling_rate_hz: u32,
    pub egm_gain: Gain,
    pub ecg_gain: Gain,
    pub channels_selected: ChannelSelection,
    pub markers_enabled: bool,
    pub high_pass_filter: bool,
}
impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: DEFAULT_BAUD,
            timeout_ms: 100,
            poll_interval_ms: 1,
            response_wait_ms: 50,
            patient_id: "anonymous".to_string(),
            window_seconds: 5.0,
            sampling_rate_hz: 500,
            egm_gain: Gain::Unity,
            ecg_gain: Gain::Unity,
            channels_selected: ChannelSelection::Both,
            markers_enabled: true,
            high_pass_filter: false,
        }
    }
}
impl MonitorConfig {
    /// Reads `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::from_seconds(self.window_seconds)
    }
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
    pub fn response_wait(&self) -> Duration {
        Duration::from_millis(self.response_wait_ms)
    }
    /// Settings recorded on a new session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            egm_gain: self.egm_gain,
            ecg_gain: self.ecg_gain,
            high_pass_filter: self.high_pass_filter,
            window_seconds: self.window_seconds,
            sampling_rate_hz: self.sampling_rate_hz,
            channels_selected: self.channels_selected,
            markers_enabled: self.markers_enabled,
        }
    }
}
