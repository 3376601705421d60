use serde::{Deserialize, Serialize};
use crate::drivers::params::{mode_byte, ActivityThreshold, Mode, ParamKey, ParameterSet};
use crate::drivers::validator::{validate_parameters, ValidationReport};
/// First two bytes of every outbound command frame.
pub const COMMAND_MAGIC: [u8; 2] = [0x16, 0x55];
pub const COMMAND_FRAME_LEN: usize = 18;
/// How a stored field value becomes its wire byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scale {
    /// Amplitudes and sensitivities travel in tenths (`value * 10`).
    Tenths,
    /// Refractory periods travel in tens of milliseconds (`value / 10`).
    Tens,
    /// Integer part of the value.
    Unit,
    /// Ordinal of an [`ActivityThreshold`] category.
    Category,
    /// Always zero on the wire.
    Zero,
}
#[derive(Clone, Copy, Debug)]
pub struct FieldSlot {
    pub key: ParamKey,
    pub scale: Scale,
    pub clamp: (u8, u8),
}
const fn slot(key: ParamKey, scale: Scale) -> FieldSlot {
    FieldSlot {
        key,
        scale,
        clamp: (0, 255),
    }
}
/// Clinical fields in wire order, starting at byte 3.
///
/// The trailing PVARP slot lands past the 18-byte boundary and is cut off with the
/// rest of any overflow; the device does not take PVARP over this link.
/// Reordering this table changes the protocol.
pub const COMMAND_FIELDS: [FieldSlot; 16] = [
    slot(ParamKey::LowerRateLimit, Scale::Unit),
    slot(ParamKey::UpperRateLimit, Scale::Unit),
    slot(ParamKey::MaximumSensorRate, Scale::Unit),
    slot(ParamKey::AtrialAmplitude, Scale::Tenths),
    slot(ParamKey::VentricularAmplitude, Scale::Tenths),
    slot(ParamKey::AtrialPulseWidth, Scale::Unit),
    slot(ParamKey::VentricularPulseWidth, Scale::Unit),
    slot(ParamKey::AtrialSensitivity, Scale::Tenths),
    slot(ParamKey::VentricularSensitivity, Scale::Tenths),
    slot(ParamKey::Vrp, Scale::Tens),
    slot(ParamKey::Arp, Scale::Tens),
    slot(ParamKey::ActivityThreshold, Scale::Category),
    slot(ParamKey::ReactionTime, Scale::Unit),
    slot(ParamKey::ResponseFactor, Scale::Unit),
    slot(ParamKey::RecoveryTime, Scale::Unit),
    slot(ParamKey::Pvarp, Scale::Zero),
];
/// Immutable copy of the programming form at the moment "send" was pressed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProgrammingSnapshot {
    /// Mode as entered; unknown text programs as `AOO` with nothing enabled.
    pub mode: String,
    pub parameters: ParameterSet,
    /// Selected Activity Threshold category. Falls back to the value stored in
    /// `parameters` when not set.
    #[serde(default)]
    pub activity_threshold: Option<String>,
}
impl ProgrammingSnapshot {
    pub fn new(mode: Mode, parameters: ParameterSet) -> Self {
        Self {
            mode: mode.label().to_string(),
            parameters,
            activity_threshold: None,
        }
    }
    pub fn with_activity_threshold(mut self, category: impl Into<String>) -> Self {
        self.activity_threshold = Some(category.into());
        self
    }
    pub fn parsed_mode(&self) -> Option<Mode> {
        self.mode.parse().ok()
    }
    fn activity_category(&self) -> Option<&str> {
        self.activity_threshold
            .as_deref()
            .map(str::trim)
            .or_else(|| self.parameters.get(ParamKey::ActivityThreshold))
    }
    /// Parameters exactly as they will be encoded, with the selected Activity
    /// Threshold category in place of any stored one.
    pub fn effective_parameters(&self) -> ParameterSet {
        let mut params = self.parameters.clone();
        if let Some(category) = &self.activity_threshold {
            params.set(ParamKey::ActivityThreshold, category.clone());
        }
        params
    }
    /// Validates what [`encode_command`] will put on the wire.
    pub fn validate(&self) -> ValidationReport {
        validate_parameters(&self.effective_parameters())
    }
}
/// Fixed-size outbound programming packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandFrame([u8; COMMAND_FRAME_LEN]);
impl CommandFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
    pub fn mode_byte(&self) -> u8 {
        self.0[2]
    }
    /// Space separated `0xNN` rendering for logs and the CLI.
    pub fn to_hex(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("0x{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
fn clamp_byte(value: f64, (low, high): (u8, u8)) -> u8 {
    value.clamp(f64::from(low), f64::from(high)) as u8
}
/// Wire byte for one textual value. Unparseable input encodes as zero.
pub fn encode_value(raw: &str, slot: &FieldSlot) -> u8 {
    let Ok(value) = raw.trim().parse::<f64>() else {
        return 0;
    };
    let scaled = match slot.scale {
        Scale::Tenths => value * 10.0,
        Scale::Tens => value / 10.0,
        Scale::Unit => value,
        Scale::Category | Scale::Zero => return 0,
    };
    if !scaled.is_finite() {
        return 0;
    }
    clamp_byte(scaled.trunc(), slot.clamp)
}
/// Builds the 18-byte programming packet for `snapshot`.
///
/// Never fails: fields the mode does not use, blank fields and unparseable text
/// all become zero bytes.
pub fn encode_command(snapshot: &ProgrammingSnapshot) -> CommandFrame {
    let mode = snapshot.parsed_mode();
    let mut packet = Vec::with_capacity(COMMAND_FRAME_LEN + 1);
    packet.extend_from_slice(&COMMAND_MAGIC);
    packet.push(mode_byte(&snapshot.mode));
    for slot in &COMMAND_FIELDS {
        let allowed = mode.is_some_and(|m| m.allows(slot.key));
        let byte = match slot.scale {
            _ if !allowed => 0,
            Scale::Zero => 0,
            Scale::Category => snapshot
                .activity_category()
                .and_then(ActivityThreshold::from_label)
                .map(ActivityThreshold::ordinal)
                .unwrap_or(0),
            _ => snapshot
                .parameters
                .get(slot.key)
                .map(|raw| encode_value(raw, slot))
                .unwrap_or(0),
        };
        log::debug!(
            "byte {}: {} -> {byte}{}",
            packet.len() + 1,
            slot.key,
            if allowed { "" } else { " (not used by mode)" }
        );
        packet.push(byte);
    }
    packet.resize(COMMAND_FRAME_LEN, 0);
    let mut frame = [0u8; COMMAND_FRAME_LEN];
    frame.copy_from_slice(&packet);
    CommandFrame(frame)
}
#[cfg(test)]
mod tests {
    use super::*;
    fn aoo_snapshot() -> ProgrammingSnapshot {
        let params = ParameterSet::new()
            .with(ParamKey::LowerRateLimit, "60")
            .with(ParamKey::UpperRateLimit, "120")
            .with(ParamKey::AtrialAmplitude, "3.5")
            .with(ParamKey::AtrialPulseWidth, "100");
        ProgrammingSnapshot::new(Mode::Aoo, params)
    }
    #[test]
    fn aoo_packet_matches_device_layout() {
        let frame = encode_command(&aoo_snapshot());
        assert_eq!(
            frame.as_bytes(),
            &[0x16, 0x55, 1, 60, 120, 0, 35, 0, 100, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }
    #[test]
    fn fields_outside_the_mode_are_zeroed() {
        let mut snapshot = aoo_snapshot();
        snapshot.parameters.set(ParamKey::VentricularAmplitude, "4.0");
        snapshot.parameters.set(ParamKey::Vrp, "250");
        snapshot.parameters.set(ParamKey::ReactionTime, "30");
        let frame = encode_command(&snapshot);
        assert_eq!(frame.as_bytes()[7], 0);
        assert_eq!(frame.as_bytes()[12], 0);
        assert_eq!(frame.as_bytes()[15], 0);
    }
    #[test]
    fn vvir_scaling_and_category() {
        let params = ParameterSet::new()
            .with(ParamKey::LowerRateLimit, "60")
            .with(ParamKey::UpperRateLimit, "120")
            .with(ParamKey::MaximumSensorRate, "150")
            .with(ParamKey::VentricularAmplitude, "5.0")
            .with(ParamKey::VentricularPulseWidth, "1")
            .with(ParamKey::VentricularSensitivity, "2.5")
            .with(ParamKey::Vrp, "320")
            .with(ParamKey::Pvarp, "250")
            .with(ParamKey::ReactionTime, "30")
            .with(ParamKey::ResponseFactor, "8")
            .with(ParamKey::RecoveryTime, "5");
        let snapshot =
            ProgrammingSnapshot::new(Mode::Vvir, params).with_activity_threshold("Med-High");
        let frame = encode_command(&snapshot);
        assert_eq!(
            frame.as_bytes(),
            &[0x16, 0x55, 8, 60, 120, 150, 0, 50, 0, 1, 0, 25, 32, 0, 5, 30, 8, 5]
        );
    }
    #[test]
    fn unknown_category_and_bad_numbers_become_zero() {
        let params = ParameterSet::new()
            .with(ParamKey::LowerRateLimit, "sixty")
            .with(ParamKey::UpperRateLimit, "inf")
            .with(ParamKey::AtrialAmplitude, "NaN");
        let snapshot = ProgrammingSnapshot::new(Mode::Aoor, params).with_activity_threshold("Huge");
        let frame = encode_command(&snapshot);
        assert_eq!(&frame.as_bytes()[3..], &[0u8; 15]);
        assert_eq!(frame.mode_byte(), 5);
    }
    #[test]
    fn values_clamp_into_a_byte() {
        let params = ParameterSet::new()
            .with(ParamKey::LowerRateLimit, "-20")
            .with(ParamKey::UpperRateLimit, "999")
            .with(ParamKey::AtrialAmplitude, "30")
            .with(ParamKey::AtrialPulseWidth, "-0.5");
        let frame = encode_command(&ProgrammingSnapshot::new(Mode::Aoo, params));
        assert_eq!(&frame.as_bytes()[3..9], &[0, 255, 0, 255, 0, 0]);
    }
    #[test]
    fn unknown_mode_text_programs_as_aoo_with_nothing_enabled() {
        let mut snapshot = aoo_snapshot();
        snapshot.mode = "DDDR".into();
        let frame = encode_command(&snapshot);
        assert_eq!(frame.mode_byte(), 1);
        assert_eq!(&frame.as_bytes()[3..], &[0u8; 15]);
    }
    #[test]
    fn activity_threshold_falls_back_to_stored_value() {
        let params = ParameterSet::new().with(ParamKey::ActivityThreshold, "V-Low");
        let frame = encode_command(&ProgrammingSnapshot::new(Mode::Voor, params));
        assert_eq!(frame.as_bytes()[14], 1);
    }
    #[test]
    fn lower_case_mode_text_is_not_a_mode() {
        let mut snapshot = aoo_snapshot();
        snapshot.mode = "aoo".into();
        let frame = encode_command(&snapshot);
        assert_eq!(frame.mode_byte(), 1);
        assert_eq!(&frame.as_bytes()[3..], &[0u8; 15]);
        assert!(snapshot.parsed_mode().is_none());
    }
    #[test]
    fn selected_category_is_what_gets_validated() {
        let params = ParameterSet::new().with(ParamKey::ActivityThreshold, "Med");
        let snapshot = ProgrammingSnapshot::new(Mode::Aoor, params);
        assert!(snapshot.validate().is_valid());
        let overridden = snapshot.clone().with_activity_threshold("Bogus");
        assert_eq!(
            overridden.effective_parameters().get(ParamKey::ActivityThreshold),
            Some("Bogus")
        );
        assert!(overridden.validate().has_issue_for(ParamKey::ActivityThreshold));
    }
    #[test]
    fn hex_rendering() {
        let hex = encode_command(&aoo_snapshot()).to_hex();
        assert!(hex.starts_with("0x16 0x55 0x01 0x3C"));
    }
}
