use crate::drivers::error::LinkError;
use crate::drivers::frame::FrameScanner;
use crate::drivers::source::ByteSource;
use crate::drivers::telemetry::{decode_telemetry, DecodedTelemetry};
/// Pulls bytes from a source and turns them into stamped telemetry records.
pub struct TelemetryPipeline<S: ByteSource> {
    source: S,
    scanner: FrameScanner,
    frames_decoded: u64,
    frames_rejected: u64,
}
impl<S: ByteSource> TelemetryPipeline<S> {
    pub fn new(source: S) -> Self {
        Self::with_scanner(source, FrameScanner::telemetry())
    }
    pub fn with_scanner(source: S, scanner: FrameScanner) -> Self {
        Self {
            source,
            scanner,
            frames_decoded: 0,
            frames_rejected: 0,
        }
    }
    /// One poll: read whatever is buffered, extract every whole frame and decode
    /// it, stamping each record with `now_ms`.
    ///
    /// An idle source returns an empty batch. Malformed frames are logged and
    /// skipped; only transport failures are returned as errors.
    pub fn pump_once(&mut self, now_ms: i64) -> Result<Vec<DecodedTelemetry>, LinkError> {
        if !self.source.has_bytes_available()? {
            return Ok(Vec::new());
        }
        let bytes = self.source.read_available()?;
        let mut decoded = Vec::new();
        for frame in self.scanner.feed(&bytes) {
            match decode_telemetry(frame.as_bytes()) {
                Ok(record) => {
                    self.frames_decoded += 1;
                    decoded.push(record.stamped(now_ms));
                }
                Err(err) => {
                    self.frames_rejected += 1;
                    log::warn!("dropping telemetry frame: {err}");
                }
            }
        }
        Ok(decoded)
    }
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }
    /// Bytes thrown away while hunting for a frame header.
    pub fn bytes_discarded(&self) -> u64 {
        self.scanner.discarded()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::frame::{TELEMETRY_FRAME_LEN, TELEMETRY_MAGIC};
    use crate::drivers::source::ManualSource;
    fn frame(vent: u8, atr: u8) -> Vec<u8> {
        let mut f = vec![0u8; TELEMETRY_FRAME_LEN];
        f[..2].copy_from_slice(&TELEMETRY_MAGIC);
        f[18] = vent;
        f[19] = atr;
        f
    }
    #[test]
    fn pipeline_decodes_frames_split_across_reads() {
        let bytes = [vec![0x01, 0x02], frame(10, 20), frame(0xFB, 0x05)].concat();
        let (first, second) = bytes.split_at(13);
        let source = ManualSource::new(vec![first.to_vec(), second.to_vec()]);
        let mut pipeline = TelemetryPipeline::new(source);
        assert!(pipeline.pump_once(5).unwrap().is_empty());
        let batch = pipeline.pump_once(6).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].ventricular_mv(), Some(1.0));
        assert_eq!(batch[0].atrial[0].t, 6);
        assert_eq!(batch[1].ventricular_mv(), Some(-0.5));
        assert_eq!(pipeline.frames_decoded(), 2);
        assert_eq!(pipeline.bytes_discarded(), 2);
    }
    #[test]
    fn idle_source_yields_nothing() {
        let mut pipeline = TelemetryPipeline::new(ManualSource::default());
        assert!(pipeline.pump_once(0).unwrap().is_empty());
    }
    #[test]
    fn transport_errors_propagate_and_polling_can_continue() {
        let mut source = ManualSource::default();
        source.push_error(LinkError::Disconnected);
        source.push(frame(1, 1));
        let mut pipeline = TelemetryPipeline::new(source);
        assert!(pipeline.pump_once(0).unwrap_err().is_transport());
        assert_eq!(pipeline.pump_once(1).unwrap().len(), 1);
    }
    #[test]
    fn frames_of_the_wrong_length_are_skipped() {
        // a scanner sized for a shorter frame hands the decoder 10 bytes
        let source = ManualSource::new(vec![frame(1, 1)]);
        let mut pipeline =
            TelemetryPipeline::with_scanner(source, FrameScanner::new(TELEMETRY_MAGIC, 10));
        assert!(pipeline.pump_once(0).unwrap().is_empty());
        assert_eq!(pipeline.frames_rejected(), 1);
    }
}
