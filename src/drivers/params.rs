//! Pacing modes, parameter keys and the per-mode allow-list.
//!
//! Everything the encoder and validator need to know about a field lives in
//! data tables here, so adding a field or mode does not touch control flow.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use crate::drivers::LinkError;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Aoo,
    Voo,
    Aai,
    Vvi,
    Aoor,
    Voor,
    Aair,
    Vvir,
}
impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Aoo,
        Mode::Voo,
        Mode::Aai,
        Mode::Vvi,
        Mode::Aoor,
        Mode::Voor,
        Mode::Aair,
        Mode::Vvir,
    ];
    /// Wire value of the mode byte, `AOO = 1` through `VVIR = 8`.
    pub fn ordinal(self) -> u8 {
        match self {
            Mode::Aoo => 1,
            Mode::Voo => 2,
            Mode::Aai => 3,
            Mode::Vvi => 4,
            Mode::Aoor => 5,
            Mode::Voor => 6,
            Mode::Aair => 7,
            Mode::Vvir => 8,
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            Mode::Aoo => "AOO",
            Mode::Voo => "VOO",
            Mode::Aai => "AAI",
            Mode::Vvi => "VVI",
            Mode::Aoor => "AOOR",
            Mode::Voor => "VOOR",
            Mode::Aair => "AAIR",
            Mode::Vvir => "VVIR",
        }
    }
    pub fn allowed_fields(self) -> &'static BTreeSet<ParamKey> {
        &MODE_TABLE[&self]
    }
    pub fn allows(self, key: ParamKey) -> bool {
        self.allowed_fields().contains(&key)
    }
}
impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
impl FromStr for Mode {
    type Err = LinkError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.label() == s)
            .ok_or_else(|| LinkError::UnknownMode(s.to_string()))
    }
}
/// Mode byte for free-form mode text. Only the exact upper-case label is
/// recognised; anything else programs as `AOO`.
pub fn mode_byte(text: &str) -> u8 {
    text.parse::<Mode>().map(Mode::ordinal).unwrap_or(1)
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    LowerRateLimit,
    UpperRateLimit,
    MaximumSensorRate,
    AtrialAmplitude,
    VentricularAmplitude,
    AtrialPulseWidth,
    VentricularPulseWidth,
    Arp,
    Vrp,
    AtrialSensitivity,
    VentricularSensitivity,
    Pvarp,
    Hysteresis,
    RateSmoothing,
    ActivityThreshold,
    ReactionTime,
    ResponseFactor,
    RecoveryTime,
}
impl ParamKey {
    pub const ALL: [ParamKey; 18] = [
        ParamKey::LowerRateLimit,
        ParamKey::UpperRateLimit,
        ParamKey::MaximumSensorRate,
        ParamKey::AtrialAmplitude,
        ParamKey::VentricularAmplitude,
        ParamKey::AtrialPulseWidth,
        ParamKey::VentricularPulseWidth,
        ParamKey::Arp,
        ParamKey::Vrp,
        ParamKey::AtrialSensitivity,
        ParamKey::VentricularSensitivity,
        ParamKey::Pvarp,
        ParamKey::Hysteresis,
        ParamKey::RateSmoothing,
        ParamKey::ActivityThreshold,
        ParamKey::ReactionTime,
        ParamKey::ResponseFactor,
        ParamKey::RecoveryTime,
    ];
    /// Storage key, e.g. `lower_rate_limit`.
    pub fn key(self) -> &'static str {
        match self {
            ParamKey::LowerRateLimit => "lower_rate_limit",
            ParamKey::UpperRateLimit => "upper_rate_limit",
            ParamKey::MaximumSensorRate => "maximum_sensor_rate",
            ParamKey::AtrialAmplitude => "atrial_amplitude",
            ParamKey::VentricularAmplitude => "ventricular_amplitude",
            ParamKey::AtrialPulseWidth => "atrial_pulse_width",
            ParamKey::VentricularPulseWidth => "ventricular_pulse_width",
            ParamKey::Arp => "arp",
            ParamKey::Vrp => "vrp",
            ParamKey::AtrialSensitivity => "atrial_sensitivity",
            ParamKey::VentricularSensitivity => "ventricular_sensitivity",
            ParamKey::Pvarp => "pvarp",
            ParamKey::Hysteresis => "hysteresis",
            ParamKey::RateSmoothing => "rate_smoothing",
            ParamKey::ActivityThreshold => "activity_threshold",
            ParamKey::ReactionTime => "reaction_time",
            ParamKey::ResponseFactor => "response_factor",
            ParamKey::RecoveryTime => "recovery_time",
        }
    }
    /// Clinician-facing name, used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            ParamKey::LowerRateLimit => "Lower Rate Limit",
            ParamKey::UpperRateLimit => "Upper Rate Limit",
            ParamKey::MaximumSensorRate => "Maximum Sensor Rate",
            ParamKey::AtrialAmplitude => "Atrial Amplitude",
            ParamKey::VentricularAmplitude => "Ventricular Amplitude",
            ParamKey::AtrialPulseWidth => "Atrial Pulse Width",
            ParamKey::VentricularPulseWidth => "Ventricular Pulse Width",
            ParamKey::Arp => "ARP",
            ParamKey::Vrp => "VRP",
            ParamKey::AtrialSensitivity => "Atrial Sensitivity",
            ParamKey::VentricularSensitivity => "Ventricular Sensitivity",
            ParamKey::Pvarp => "PVARP",
            ParamKey::Hysteresis => "Hysteresis",
            ParamKey::RateSmoothing => "Rate Smoothing",
            ParamKey::ActivityThreshold => "Activity Threshold",
            ParamKey::ReactionTime => "Reaction Time",
            ParamKey::ResponseFactor => "Response Factor",
            ParamKey::RecoveryTime => "Recovery Time",
        }
    }
}
impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
impl FromStr for ParamKey {
    type Err = LinkError;
    /// Accepts either the storage key or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ParamKey::ALL
            .into_iter()
            .find(|k| k.key() == wanted || k.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LinkError::UnknownParameter(wanted.to_string()))
    }
}
/// Which fields each mode may edit and transmit.
pub const MODE_PARAMETERS: [(Mode, &[ParamKey]); 8] = {
    use ParamKey::*;
    [
        (
            Mode::Aoo,
            &[LowerRateLimit, UpperRateLimit, AtrialAmplitude, AtrialPulseWidth],
        ),
        (
            Mode::Voo,
            &[
                LowerRateLimit,
                UpperRateLimit,
                VentricularAmplitude,
                VentricularPulseWidth,
            ],
        ),
        (
            Mode::Aai,
            &[
                LowerRateLimit,
                UpperRateLimit,
                AtrialAmplitude,
                AtrialPulseWidth,
                AtrialSensitivity,
                Arp,
                Pvarp,
                Hysteresis,
                RateSmoothing,
            ],
        ),
        (
            Mode::Vvi,
            &[
                LowerRateLimit,
                UpperRateLimit,
                VentricularAmplitude,
                VentricularPulseWidth,
                VentricularSensitivity,
                Vrp,
                Hysteresis,
                RateSmoothing,
            ],
        ),
        (
            Mode::Aoor,
            &[
                LowerRateLimit,
                UpperRateLimit,
                MaximumSensorRate,
                AtrialAmplitude,
                AtrialPulseWidth,
                ActivityThreshold,
                ReactionTime,
                ResponseFactor,
                RecoveryTime,
            ],
        ),
        (
            Mode::Voor,
            &[
                LowerRateLimit,
                UpperRateLimit,
                MaximumSensorRate,
                VentricularAmplitude,
                VentricularPulseWidth,
                ActivityThreshold,
                ReactionTime,
                ResponseFactor,
                RecoveryTime,
            ],
        ),
        (
            Mode::Aair,
            &[
                LowerRateLimit,
                UpperRateLimit,
                MaximumSensorRate,
                AtrialAmplitude,
                AtrialSensitivity,
                Arp,
                Pvarp,
                Hysteresis,
                RateSmoothing,
                AtrialPulseWidth,
                ActivityThreshold,
                ReactionTime,
                ResponseFactor,
                RecoveryTime,
            ],
        ),
        (
            Mode::Vvir,
            &[
                LowerRateLimit,
                UpperRateLimit,
                MaximumSensorRate,
                VentricularAmplitude,
                VentricularPulseWidth,
                VentricularSensitivity,
                Vrp,
                Hysteresis,
                RateSmoothing,
                ActivityThreshold,
                ReactionTime,
                ResponseFactor,
                RecoveryTime,
            ],
        ),
    ]
};
static MODE_TABLE: Lazy<HashMap<Mode, BTreeSet<ParamKey>>> = Lazy::new(|| {
    MODE_PARAMETERS
        .iter()
        .map(|(mode, keys)| (*mode, keys.iter().copied().collect()))
        .collect()
});
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityThreshold {
    #[serde(rename = "V-Low")]
    VeryLow,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Med-Low")]
    MedLow,
    #[serde(rename = "Med")]
    Med,
    #[serde(rename = "Med-High")]
    MedHigh,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "V-High")]
    VeryHigh,
}
impl ActivityThreshold {
    pub const ALL: [ActivityThreshold; 7] = [
        ActivityThreshold::VeryLow,
        ActivityThreshold::Low,
        ActivityThreshold::MedLow,
        ActivityThreshold::Med,
        ActivityThreshold::MedHigh,
        ActivityThreshold::High,
        ActivityThreshold::VeryHigh,
    ];
    pub fn label(self) -> &'static str {
        match self {
            ActivityThreshold::VeryLow => "V-Low",
            ActivityThreshold::Low => "Low",
            ActivityThreshold::MedLow => "Med-Low",
            ActivityThreshold::Med => "Med",
            ActivityThreshold::MedHigh => "Med-High",
            ActivityThreshold::High => "High",
            ActivityThreshold::VeryHigh => "V-High",
        }
    }
    /// `V-Low = 1` through `V-High = 7`.
    pub fn ordinal(self) -> u8 {
        Self::ALL
            .iter()
            .position(|t| *t == self)
            .map(|i| i as u8 + 1)
            .unwrap_or(0)
    }
    /// Exact, case-sensitive match against the category labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}
/// Permitted Rate Smoothing settings, as entered.
pub const RATE_SMOOTHING_VALUES: [&str; 9] = ["0", "3", "6", "9", "12", "15", "18", "21", "25"];
/// Field values as entered, keyed by parameter. Blank entries read as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ParamKey, RawValue>",
    into = "BTreeMap<ParamKey, String>"
)]
pub struct ParameterSet {
    values: BTreeMap<ParamKey, String>,
}
/// JSON parameter files may hold numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Number(f64),
}
impl From<BTreeMap<ParamKey, RawValue>> for ParameterSet {
    fn from(raw: BTreeMap<ParamKey, RawValue>) -> Self {
        let values = raw
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    RawValue::Text(s) => s,
                    RawValue::Number(n) => n.to_string(),
                };
                (k, text)
            })
            .collect();
        Self { values }
    }
}
impl From<ParameterSet> for BTreeMap<ParamKey, String> {
    fn from(params: ParameterSet) -> Self {
        params.values
    }
}
impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, key: ParamKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
    pub fn set(&mut self, key: ParamKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }
    /// Trimmed value, or `None` when missing or blank.
    pub fn get(&self, key: ParamKey) -> Option<&str> {
        self.values
            .get(&key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
    pub fn number(&self, key: ParamKey) -> Option<f64> {
        self.get(key).and_then(|v| v.parse().ok())
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
impl FromIterator<(ParamKey, String)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (ParamKey, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn mode_ordinals_follow_enumeration_order() {
        for (i, mode) in Mode::ALL.iter().enumerate() {
            assert_eq!(mode.ordinal() as usize, i + 1);
        }
        assert_eq!(mode_byte("VVIR"), 8);
        assert_eq!(mode_byte("vvir"), 1);
        assert_eq!(mode_byte(" VVI"), 1);
        assert_eq!(mode_byte("DDD"), 1);
        assert_eq!(mode_byte(""), 1);
    }
    #[test]
    fn allow_lists_match_mode_letters() {
        assert!(Mode::Aoo.allows(ParamKey::AtrialAmplitude));
        assert!(!Mode::Aoo.allows(ParamKey::VentricularAmplitude));
        assert!(Mode::Vvi.allows(ParamKey::Vrp));
        assert!(!Mode::Vvi.allows(ParamKey::Arp));
        assert!(Mode::Aair.allows(ParamKey::ActivityThreshold));
        assert!(!Mode::Aai.allows(ParamKey::ActivityThreshold));
        assert_eq!(Mode::Vvir.allowed_fields().len(), 13);
    }
    #[test]
    fn activity_threshold_ordinals() {
        assert_eq!(ActivityThreshold::VeryLow.ordinal(), 1);
        assert_eq!(ActivityThreshold::Med.ordinal(), 4);
        assert_eq!(ActivityThreshold::VeryHigh.ordinal(), 7);
        assert_eq!(ActivityThreshold::from_label("Med-High"), Some(ActivityThreshold::MedHigh));
        assert_eq!(ActivityThreshold::from_label("med"), None);
    }
    #[test]
    fn param_keys_parse_from_key_or_label() {
        assert_eq!("lower_rate_limit".parse::<ParamKey>().unwrap(), ParamKey::LowerRateLimit);
        assert_eq!("VRP".parse::<ParamKey>().unwrap(), ParamKey::Vrp);
        assert!("pace_harder".parse::<ParamKey>().is_err());
    }
    #[test]
    fn parameter_json_accepts_numbers_and_strings() {
        let params: ParameterSet = serde_json::from_str(
            r#"{"lower_rate_limit": 60, "atrial_amplitude": "3.5", "hysteresis": "Off", "vrp": " "}"#,
        )
        .unwrap();
        assert_eq!(params.get(ParamKey::LowerRateLimit), Some("60"));
        assert_eq!(params.number(ParamKey::AtrialAmplitude), Some(3.5));
        assert_eq!(params.get(ParamKey::Hysteresis), Some("Off"));
        assert_eq!(params.get(ParamKey::Vrp), None);
    }
}
