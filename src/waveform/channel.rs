use std::collections::BTreeMap;
use super::{
    buffer::{xlim_for, ChannelWindow},
    config::{ChannelSelection, Gain, TimeWindow},
    view::{Channel, ChannelView, Marker, Sample, WaveformView},
};
use crate::drivers::DecodedTelemetry;
struct ChannelState {
    window: ChannelWindow,
    enabled: bool,
    telemetry_word: Option<u16>,
}
impl ChannelState {
    fn new(channel: Channel, time_window: TimeWindow) -> Self {
        Self {
            window: ChannelWindow::new(time_window),
            // the surface lead stays off until samples arrive for it
            enabled: channel.is_intracardiac(),
            telemetry_word: None,
        }
    }
}
/// Live electrogram display state for one telemetry session.
///
/// Owned by the ingestion worker; renderers only ever see [`WaveformView`]
/// snapshots.
pub struct EgramDisplay {
    time_window: TimeWindow,
    channels: BTreeMap<Channel, ChannelState>,
    markers: Vec<Marker>,
    egm_gain: Gain,
    ecg_gain: Gain,
    selection: ChannelSelection,
    markers_enabled: bool,
}
impl Default for EgramDisplay {
    fn default() -> Self {
        Self::new(TimeWindow::default())
    }
}
impl EgramDisplay {
    pub fn new(time_window: TimeWindow) -> Self {
        let channels = Channel::ALL
            .into_iter()
            .map(|ch| (ch, ChannelState::new(ch, time_window)))
            .collect();
        Self {
            time_window,
            channels,
            markers: Vec::new(),
            egm_gain: Gain::default(),
            ecg_gain: Gain::default(),
            selection: ChannelSelection::default(),
            markers_enabled: true,
        }
    }
    pub fn window_ms(&self) -> i64 {
        self.time_window.millis
    }
    pub fn set_time_window(&mut self, window: TimeWindow) {
        self.time_window = window;
        for state in self.channels.values_mut() {
            state.window.set_window(window);
        }
    }
    pub fn set_egm_gain(&mut self, gain: Gain) {
        self.egm_gain = gain;
    }
    pub fn set_ecg_gain(&mut self, gain: Gain) {
        self.ecg_gain = gain;
    }
    pub fn set_selection(&mut self, selection: ChannelSelection) {
        self.selection = selection;
    }
    pub fn selection(&self) -> ChannelSelection {
        self.selection
    }
    pub fn set_markers_enabled(&mut self, enabled: bool) {
        self.markers_enabled = enabled;
    }
    pub fn gain_for(&self, channel: Channel) -> Gain {
        if channel.is_intracardiac() {
            self.egm_gain
        } else {
            self.ecg_gain
        }
    }
    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.channels.get(&channel).is_some_and(|s| s.enabled)
    }
    /// Gain-applied append for one channel. Enables the channel.
    pub fn update_samples(&mut self, channel: Channel, samples: &[Sample]) {
        let gain = self.gain_for(channel);
        if let Some(state) = self.channels.get_mut(&channel) {
            state.enabled = true;
            state.window.push(samples, gain);
        }
    }
    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }
    /// Stores `word` as the latest readout on every channel the selection routes
    /// it to.
    pub fn record_telemetry_word(&mut self, word: u16) {
        for channel in self.selection.word_targets() {
            if let Some(state) = self.channels.get_mut(channel) {
                state.telemetry_word = Some(word);
            }
        }
    }
    /// Applies one stamped decode: both intracardiac channels, markers and the word.
    pub fn ingest(&mut self, decoded: &DecodedTelemetry) {
        self.update_samples(Channel::Atrial, &decoded.atrial);
        self.update_samples(Channel::Ventricular, &decoded.ventricular);
        self.markers.extend(decoded.markers.iter().cloned());
        self.record_telemetry_word(decoded.word);
    }
    pub fn samples(&self, channel: Channel) -> &[Sample] {
        self.channels
            .get(&channel)
            .map(|s| s.window.samples())
            .unwrap_or(&[])
    }
    pub fn telemetry_word(&self, channel: Channel) -> Option<u16> {
        self.channels.get(&channel).and_then(|s| s.telemetry_word)
    }
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
    /// Clears every buffer, every marker and the word readouts.
    pub fn reset(&mut self) {
        for state in self.channels.values_mut() {
            state.window.clear();
            state.telemetry_word = None;
        }
        self.markers.clear();
        log::debug!("egram display reset");
    }
    /// Shared x-axis across all channel buffers, visible or not.
    pub fn xlim(&self) -> (i64, i64) {
        xlim_for(
            self.channels.values().map(|s| s.window.samples()),
            self.time_window.millis,
        )
    }
    pub fn view(&self) -> WaveformView {
        let xlim = self.xlim();
        let channels = self
            .selection
            .visible()
            .iter()
            .filter_map(|ch| {
                let state = self.channels.get(ch)?;
                if !state.enabled {
                    return None;
                }
                Some(ChannelView {
                    channel: *ch,
                    samples: state.window.samples().to_vec(),
                    telemetry_word: state.telemetry_word,
                })
            })
            .collect::<Vec<_>>();
        let markers = if self.markers_enabled {
            self.markers
                .iter()
                .filter(|m| channels.iter().any(|c| c.channel == m.channel))
                .filter(|m| m.timestamp_ms >= xlim.0)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        WaveformView {
            window_ms: self.time_window.millis,
            xlim,
            channels,
            markers,
        }
    }
}
