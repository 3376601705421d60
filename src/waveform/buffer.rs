use super::config::{Gain, TimeWindow};
use super::view::Sample;
/// Copies `samples`, scaling every present value by the gain named `label`.
///
/// Unknown labels act as `1X`. Gaps stay gaps.
pub fn apply_gain(samples: &[Sample], label: &str) -> Vec<Sample> {
    scale(samples, Gain::from_label(label))
}
pub fn scale(samples: &[Sample], gain: Gain) -> Vec<Sample> {
    let factor = gain.factor();
    samples
        .iter()
        .map(|s| Sample {
            t: s.t,
            value: s.value.map(|v| v * factor),
        })
        .collect()
}
/// Drops every sample older than `latest - window_ms`, where `latest` is the last
/// sample's time. The input is assumed ordered and is not re-sorted.
pub fn trim_window(mut samples: Vec<Sample>, window_ms: i64) -> Vec<Sample> {
    let Some(latest) = samples.last().map(|s| s.t) else {
        return samples;
    };
    let threshold = latest - window_ms;
    samples.retain(|s| s.t >= threshold);
    samples
}
/// New buffer holding `existing` followed by `new_samples`, trimmed to the window.
/// Neither input is modified.
pub fn append_and_trim(existing: &[Sample], new_samples: &[Sample], window_ms: i64) -> Vec<Sample> {
    let mut combined = Vec::with_capacity(existing.len() + new_samples.len());
    combined.extend_from_slice(existing);
    combined.extend_from_slice(new_samples);
    trim_window(combined, window_ms)
}
/// Shared x-axis for a set of buffers: right edge at the newest sample across all
/// of them, left edge one window earlier but never below zero.
pub fn xlim_for<'a>(buffers: impl IntoIterator<Item = &'a [Sample]>, window_ms: i64) -> (i64, i64) {
    let right = buffers
        .into_iter()
        .flat_map(|b| b.iter().map(|s| s.t))
        .fold(0, i64::max);
    ((right - window_ms).max(0), right)
}
/// Rolling, time-bounded sample buffer for one channel.
pub struct ChannelWindow {
    samples: Vec<Sample>,
    window: TimeWindow,
}
impl ChannelWindow {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            samples: Vec::new(),
            window,
        }
    }
    pub fn window_ms(&self) -> i64 {
        self.window.millis
    }
    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
        let current = std::mem::take(&mut self.samples);
        self.samples = trim_window(current, window.millis);
    }
    /// Applies `gain`, appends, then evicts anything outside the window.
    pub fn push(&mut self, new_samples: &[Sample], gain: Gain) {
        let scaled = scale(new_samples, gain);
        self.samples = append_and_trim(&self.samples, &scaled, self.window.millis);
    }
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
    pub fn latest_t(&self) -> Option<i64> {
        self.samples.last().map(|s| s.t)
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
