use crate::drivers::frame::{TELEMETRY_FRAME_LEN, TELEMETRY_MAGIC};
use crate::drivers::LinkError;
use crate::waveform::{Marker, Sample};
/// Byte carrying the signed ventricular reading (tenths of a millivolt).
pub const VENTRICULAR_BYTE: usize = 18;
/// Byte carrying the signed atrial reading (tenths of a millivolt).
pub const ATRIAL_BYTE: usize = 19;
/// One telemetry frame worth of electrogram data.
///
/// Sample times are zero until the receiver stamps them with [`stamped`]; the
/// frame itself carries no clock.
///
/// [`stamped`]: DecodedTelemetry::stamped
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedTelemetry {
    pub atrial: Vec<Sample>,
    pub ventricular: Vec<Sample>,
    pub markers: Vec<Marker>,
    /// Bytes 18..20 read as one big-endian word for the secondary readout.
    pub word: u16,
}
impl DecodedTelemetry {
    pub fn stamped(mut self, t_ms: i64) -> Self {
        for sample in self.atrial.iter_mut().chain(self.ventricular.iter_mut()) {
            sample.t = t_ms;
        }
        for marker in &mut self.markers {
            marker.timestamp_ms = t_ms;
        }
        self
    }
    pub fn atrial_mv(&self) -> Option<f64> {
        self.atrial.last().and_then(|s| s.value)
    }
    pub fn ventricular_mv(&self) -> Option<f64> {
        self.ventricular.last().and_then(|s| s.value)
    }
}
fn raw_to_millivolts(raw: u8) -> f64 {
    f64::from(raw as i8) / 10.0
}
/// Big-endian unsigned view of bytes 18..20, independent of the millivolt decode.
pub fn telemetry_word(frame: &[u8]) -> Option<u16> {
    let hi = *frame.get(VENTRICULAR_BYTE)?;
    let lo = *frame.get(ATRIAL_BYTE)?;
    Some(u16::from_be_bytes([hi, lo]))
}
/// Decodes one 20-byte telemetry frame into channel samples.
pub fn decode_telemetry(frame: &[u8]) -> Result<DecodedTelemetry, LinkError> {
    if frame.len() != TELEMETRY_FRAME_LEN {
        return Err(LinkError::FrameLength {
            expected: TELEMETRY_FRAME_LEN,
            actual: frame.len(),
        });
    }
    if frame[..2] != TELEMETRY_MAGIC {
        return Err(LinkError::FrameHeader {
            found: [frame[0], frame[1]],
        });
    }
    let ventricular_mv = raw_to_millivolts(frame[VENTRICULAR_BYTE]);
    let atrial_mv = raw_to_millivolts(frame[ATRIAL_BYTE]);
    let word = u16::from_be_bytes([frame[VENTRICULAR_BYTE], frame[ATRIAL_BYTE]]);
    log::debug!("telemetry: atrial {atrial_mv} mV, ventricular {ventricular_mv} mV, word 0x{word:04X}");
    Ok(DecodedTelemetry {
        atrial: vec![Sample::new(0, atrial_mv)],
        ventricular: vec![Sample::new(0, ventricular_mv)],
        markers: Vec::new(),
        word,
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    fn frame_with(vent: u8, atr: u8) -> Vec<u8> {
        let mut frame = vec![0u8; TELEMETRY_FRAME_LEN];
        frame[..2].copy_from_slice(&TELEMETRY_MAGIC);
        frame[VENTRICULAR_BYTE] = vent;
        frame[ATRIAL_BYTE] = atr;
        frame
    }
    #[test]
    fn signed_bytes_become_millivolts() {
        let decoded = decode_telemetry(&frame_with(0x0A, 0xF6)).unwrap();
        assert_eq!(decoded.ventricular_mv(), Some(1.0));
        assert_eq!(decoded.atrial_mv(), Some(-1.0));
        assert_eq!(decoded.atrial[0].t, 0);
        assert!(decoded.markers.is_empty());
    }
    #[test]
    fn every_raw_byte_divides_by_ten() {
        for raw in 0..=255u8 {
            let decoded = decode_telemetry(&frame_with(raw, raw)).unwrap();
            let expected = f64::from(raw as i8) / 10.0;
            assert_eq!(decoded.ventricular_mv(), Some(expected));
            assert_eq!(decoded.atrial_mv(), Some(expected));
        }
    }
    #[test]
    fn word_reads_the_same_bytes_big_endian() {
        let frame = frame_with(0x0A, 0xF6);
        let decoded = decode_telemetry(&frame).unwrap();
        assert_eq!(decoded.word, 0x0AF6);
        assert_eq!(telemetry_word(&frame), Some(0x0AF6));
        assert_eq!(telemetry_word(&frame[..19]), None);
    }
    #[test]
    fn rejects_wrong_length_and_header() {
        assert!(matches!(
            decode_telemetry(&[0xAA, 0x22, 0x00]),
            Err(LinkError::FrameLength { actual: 3, .. })
        ));
        let mut frame = frame_with(1, 1);
        frame[1] = 0x23;
        assert!(matches!(
            decode_telemetry(&frame),
            Err(LinkError::FrameHeader { .. })
        ));
    }
    #[test]
    fn stamping_sets_receipt_time() {
        let decoded = decode_telemetry(&frame_with(5, 5)).unwrap().stamped(1234);
        assert_eq!(decoded.atrial[0].t, 1234);
        assert_eq!(decoded.ventricular[0].t, 1234);
    }
}
