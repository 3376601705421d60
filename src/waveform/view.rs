use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::drivers::LinkError;
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the session started.
    pub t: i64,
    /// Millivolts after gain; `None` marks a gap the renderer should skip.
    pub value: Option<f64>,
}
impl Sample {
    pub fn new(t: i64, value: f64) -> Self {
        Self {
            t,
            value: Some(value),
        }
    }
    pub fn gap(t: i64) -> Self {
        Self { t, value: None }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Atrial,
    Ventricular,
    Surface,
}
impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Atrial, Channel::Ventricular, Channel::Surface];
    pub fn name(self) -> &'static str {
        match self {
            Channel::Atrial => "atrial",
            Channel::Ventricular => "ventricular",
            Channel::Surface => "surface",
        }
    }
    /// Plot title used by renderers.
    pub fn title(self) -> &'static str {
        match self {
            Channel::Atrial => "Atrial EGM",
            Channel::Ventricular => "Ventricular EGM",
            Channel::Surface => "Surface ECG",
        }
    }
    /// Intracardiac channels share the EGM gain; the surface lead uses the ECG gain.
    pub fn is_intracardiac(self) -> bool {
        !matches!(self, Channel::Surface)
    }
}
impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl FromStr for Channel {
    type Err = LinkError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Channel::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LinkError::UnknownChannel(wanted.to_string()))
    }
}
/// Annotated event on one channel. Never changed once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub channel: Channel,
    pub timestamp_ms: i64,
    #[serde(rename = "abbr")]
    pub abbreviation: String,
    #[serde(default)]
    pub modifier: Option<String>,
}
impl Marker {
    pub fn new(channel: Channel, timestamp_ms: i64, abbreviation: impl Into<String>) -> Self {
        Self {
            channel,
            timestamp_ms,
            abbreviation: abbreviation.into(),
            modifier: None,
        }
    }
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }
    /// Text drawn next to the marker, e.g. `AS` or `VP+`.
    pub fn label(&self) -> String {
        match &self.modifier {
            Some(m) => format!("{}{}", self.abbreviation, m),
            None => self.abbreviation.clone(),
        }
    }
}
#[derive(Clone, Debug)]
pub struct ChannelView {
    pub channel: Channel,
    pub samples: Vec<Sample>,
    /// Latest raw telemetry word routed to this channel, if any.
    pub telemetry_word: Option<u16>,
}
impl ChannelView {
    /// `(t, value)` pairs for plotting, gaps skipped.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .filter_map(|s| s.value.map(|v| [s.t as f64, v]))
            .collect()
    }
}
/// Read-only snapshot handed to the renderer on each tick.
#[derive(Clone, Debug)]
pub struct WaveformView {
    pub window_ms: i64,
    /// Shared x-axis limits `(left, right)` in milliseconds.
    pub xlim: (i64, i64),
    pub channels: Vec<ChannelView>,
    pub markers: Vec<Marker>,
}
