use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::waveform::Channel;
/// Display-time amplitude multiplier, independent of the device's pacing amplitude.
///
/// Deserializes through [`Gain::from_label`], so unknown labels load as `1X`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Gain {
    #[serde(rename = "0.5X")]
    Half,
    #[default]
    #[serde(rename = "1X")]
    Unity,
    #[serde(rename = "2X")]
    Double,
}
impl Gain {
    /// Unknown labels fall back to unity gain rather than failing.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "0.5X" => Gain::Half,
            "1X" => Gain::Unity,
            "2X" => Gain::Double,
            _ => Gain::Unity,
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            Gain::Half => "0.5X",
            Gain::Unity => "1X",
            Gain::Double => "2X",
        }
    }
    pub fn factor(self) -> f64 {
        match self {
            Gain::Half => 0.5,
            Gain::Unity => 1.0,
            Gain::Double => 2.0,
        }
    }
}
impl From<String> for Gain {
    fn from(label: String) -> Self {
        Gain::from_label(&label)
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub millis: i64,
}
impl TimeWindow {
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            millis: ((seconds * 1000.0).round() as i64).max(1),
        }
    }
    pub fn from_millis(millis: i64) -> Self {
        Self {
            millis: millis.max(1),
        }
    }
}
impl Default for TimeWindow {
    fn default() -> Self {
        // the monitor opens with a five second sweep
        TimeWindow { millis: 5_000 }
    }
}
/// Which traces the monitor shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSelection {
    Atrial,
    Ventricular,
    #[default]
    Both,
    Surface,
}
impl ChannelSelection {
    pub fn name(self) -> &'static str {
        match self {
            ChannelSelection::Atrial => "atrial",
            ChannelSelection::Ventricular => "ventricular",
            ChannelSelection::Both => "both",
            ChannelSelection::Surface => "surface",
        }
    }
    pub fn visible(self) -> &'static [Channel] {
        match self {
            ChannelSelection::Atrial => &[Channel::Atrial],
            ChannelSelection::Ventricular => &[Channel::Ventricular],
            ChannelSelection::Both => &[Channel::Atrial, Channel::Ventricular],
            ChannelSelection::Surface => &[Channel::Surface],
        }
    }
    /// Channels whose readout receives the raw telemetry word. The surface lead
    /// never does.
    pub fn word_targets(self) -> &'static [Channel] {
        match self {
            ChannelSelection::Surface => &[],
            other => other.visible(),
        }
    }
}
impl FromStr for ChannelSelection {
    type Err = crate::drivers::LinkError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atrial" => Ok(ChannelSelection::Atrial),
            "ventricular" => Ok(ChannelSelection::Ventricular),
            "both" => Ok(ChannelSelection::Both),
            "surface" => Ok(ChannelSelection::Surface),
            other => Err(crate::drivers::LinkError::UnknownChannel(other.to_string())),
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn gain_labels() {
        assert_eq!(Gain::from_label("0.5X").factor(), 0.5);
        assert_eq!(Gain::from_label("2X").factor(), 2.0);
        assert_eq!(Gain::from_label("3X"), Gain::Unity);
        assert_eq!(Gain::from_label(""), Gain::Unity);
    }
    #[test]
    fn gain_json_uses_the_same_fallback() {
        let gains: Vec<Gain> = serde_json::from_str(r#"["0.5X", "2X", "3X", ""]"#).unwrap();
        assert_eq!(gains, vec![Gain::Half, Gain::Double, Gain::Unity, Gain::Unity]);
        assert_eq!(serde_json::to_string(&Gain::Half).unwrap(), r#""0.5X""#);
    }
    #[test]
    fn selection_routes_the_word() {
        assert_eq!(
            ChannelSelection::Both.word_targets(),
            &[Channel::Atrial, Channel::Ventricular]
        );
        assert_eq!(ChannelSelection::Ventricular.word_targets(), &[Channel::Ventricular]);
        assert!(ChannelSelection::Surface.word_targets().is_empty());
        assert_eq!("BOTH".parse::<ChannelSelection>().unwrap(), ChannelSelection::Both);
    }
    #[test]
    fn window_never_collapses_to_zero() {
        assert_eq!(TimeWindow::from_seconds(5.0).millis, 5_000);
        assert_eq!(TimeWindow::from_millis(0).millis, 1);
    }
}
