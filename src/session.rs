// src/session.rs
//! Electrogram session records and the store the ingestion worker reports into.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use crate::drivers::LinkError;
use crate::waveform::{Channel, ChannelSelection, Gain, Marker, Sample};
static NEXT_SESSION: Lazy<AtomicU32> = Lazy::new(|| {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(0);
    AtomicU32::new(seed)
});
fn next_session_id() -> String {
    format!("EGRAM_{:08X}", NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
}
/// Wall clock in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryStatus {
    Created,
    Connected,
    Disconnected,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub time_ms: u64,
    pub status: TelemetryStatus,
}
/// Display settings captured when the session starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub egm_gain: Gain,
    pub ecg_gain: Gain,
    pub high_pass_filter: bool,
    pub window_seconds: f64,
    pub sampling_rate_hz: u32,
    pub channels_selected: ChannelSelection,
    pub markers_enabled: bool,
}
impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            egm_gain: Gain::Unity,
            ecg_gain: Gain::Unity,
            high_pass_filter: false,
            window_seconds: 5.0,
            sampling_rate_hz: 500,
            channels_selected: ChannelSelection::Both,
            markers_enabled: true,
        }
    }
}
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub enabled: bool,
    pub samples: Vec<Sample>,
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub patient_id: String,
    pub start_time_ms: u64,
    pub end_time_ms: Option<u64>,
    pub telemetry_status_log: Vec<StatusEntry>,
    pub settings: SessionSettings,
    pub channels: BTreeMap<Channel, ChannelRecord>,
    pub markers: Vec<Marker>,
}
impl Session {
    pub fn new(patient_id: &str, settings: SessionSettings) -> Self {
        let now = now_ms();
        let channels = Channel::ALL
            .into_iter()
            .map(|ch| {
                let record = ChannelRecord {
                    enabled: ch.is_intracardiac(),
                    samples: Vec::new(),
                };
                (ch, record)
            })
            .collect();
        Self {
            session_id: next_session_id(),
            patient_id: patient_id.to_string(),
            start_time_ms: now,
            end_time_ms: None,
            telemetry_status_log: vec![StatusEntry {
                time_ms: now,
                status: TelemetryStatus::Created,
            }],
            settings,
            channels,
            markers: Vec::new(),
        }
    }
    pub fn is_finished(&self) -> bool {
        self.end_time_ms.is_some()
    }
    pub fn latest_status(&self) -> Option<TelemetryStatus> {
        self.telemetry_status_log.last().map(|e| e.status)
    }
    pub fn samples(&self, channel: Channel) -> &[Sample] {
        self.channels
            .get(&channel)
            .map(|c| c.samples.as_slice())
            .unwrap_or(&[])
    }
}
/// Durable home for electrogram sessions. The core calls into it on every decoded
/// batch but never owns the storage itself.
pub trait SessionStore: Send {
    /// Last unfinished session for `patient_id`, or a fresh one with `settings`.
    fn create_or_resume_session(
        &mut self,
        patient_id: &str,
        settings: SessionSettings,
    ) -> Result<Session, LinkError>;
    /// Appends to a channel and marks it enabled.
    fn append_samples(
        &mut self,
        session_id: &str,
        channel: Channel,
        samples: &[Sample],
    ) -> Result<(), LinkError>;
    fn append_marker(&mut self, session_id: &str, marker: Marker) -> Result<(), LinkError>;
    fn set_telemetry_status(
        &mut self,
        session_id: &str,
        status: TelemetryStatus,
    ) -> Result<(), LinkError>;
    /// Stamps the end time and returns the final record.
    fn finish_session(&mut self, session_id: &str) -> Result<Session, LinkError>;
}
/// Keeps sessions in memory, in creation order. Serializes to JSON for export.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemorySessionStore {
    #[serde(rename = "egram_sessions")]
    sessions: Vec<Session>,
}
impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }
    pub fn sessions_for(&self, patient_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.patient_id == patient_id)
            .collect()
    }
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
    fn session_mut(&mut self, session_id: &str) -> Result<&mut Session, LinkError> {
        self.sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .ok_or_else(|| LinkError::SessionNotFound(session_id.to_string()))
    }
}
impl SessionStore for MemorySessionStore {
    fn create_or_resume_session(
        &mut self,
        patient_id: &str,
        settings: SessionSettings,
    ) -> Result<Session, LinkError> {
        if let Some(open) = self
            .sessions
            .iter()
            .rev()
            .find(|s| s.patient_id == patient_id && !s.is_finished())
        {
            log::info!("resuming session {} for {patient_id}", open.session_id);
            return Ok(open.clone());
        }
        let session = Session::new(patient_id, settings);
        log::info!("created session {} for {patient_id}", session.session_id);
        self.sessions.push(session.clone());
        Ok(session)
    }
    fn append_samples(
        &mut self,
        session_id: &str,
        channel: Channel,
        samples: &[Sample],
    ) -> Result<(), LinkError> {
        let session = self.session_mut(session_id)?;
        let record = session.channels.entry(channel).or_default();
        record.enabled = true;
        record.samples.extend_from_slice(samples);
        Ok(())
    }
    fn append_marker(&mut self, session_id: &str, marker: Marker) -> Result<(), LinkError> {
        self.session_mut(session_id)?.markers.push(marker);
        Ok(())
    }
    fn set_telemetry_status(
        &mut self,
        session_id: &str,
        status: TelemetryStatus,
    ) -> Result<(), LinkError> {
        self.session_mut(session_id)?
            .telemetry_status_log
            .push(StatusEntry {
                time_ms: now_ms(),
                status,
            });
        Ok(())
    }
    fn finish_session(&mut self, session_id: &str) -> Result<Session, LinkError> {
        let session = self.session_mut(session_id)?;
        session.end_time_ms = Some(now_ms());
        log::info!("finished session {session_id}");
        Ok(session.clone())
    }
}
