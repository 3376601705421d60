use std::collections::VecDeque;
/// Header carried by every inbound telemetry frame.
pub const TELEMETRY_MAGIC: [u8; 2] = [0xAA, 0x22];
/// Inbound telemetry frames are always this long, header included.
pub const TELEMETRY_FRAME_LEN: usize = 20;
/// One complete, magic-verified frame lifted out of the byte stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
}
impl RawFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
/// Extracts fixed-length, magic-prefixed frames from an append-only byte stream.
///
/// Bytes are buffered across reads, so a frame split over two serial reads is
/// reassembled. When the head of the buffer is not the magic, exactly one byte is
/// dropped before retrying; a header that starts one position later is never
/// skipped.
pub struct FrameScanner {
    buffer: VecDeque<u8>,
    magic: [u8; 2],
    frame_len: usize,
    discarded: u64,
}
impl FrameScanner {
    pub fn new(magic: [u8; 2], frame_len: usize) -> Self {
        let frame_len = frame_len.max(magic.len());
        Self {
            buffer: VecDeque::with_capacity(frame_len * 4),
            magic,
            frame_len,
            discarded: 0,
        }
    }
    /// Scanner for the 20-byte `0xAA 0x22` telemetry stream.
    pub fn telemetry() -> Self {
        Self::new(TELEMETRY_MAGIC, TELEMETRY_FRAME_LEN)
    }
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
    /// Bytes buffered but not yet emitted as part of a frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
    /// Total junk bytes dropped while resynchronizing.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes.iter().copied());
    }
    /// Pops the next whole frame, or `None` once fewer than `frame_len` bytes remain.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        while self.buffer.len() >= self.frame_len {
            if self.buffer[0] != self.magic[0] || self.buffer[1] != self.magic[1] {
                if let Some(junk) = self.buffer.pop_front() {
                    self.discarded += 1;
                    log::trace!("resync: dropped 0x{junk:02X}");
                }
                continue;
            }
            let bytes: Vec<u8> = self.buffer.drain(..self.frame_len).collect();
            return Some(RawFrame { bytes });
        }
        None
    }
    /// Appends `bytes` and returns every frame that is now complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<RawFrame> {
        self.extend(bytes);
        std::iter::from_fn(|| self.next_frame()).collect()
    }
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    fn telemetry_frame(fill: u8) -> Vec<u8> {
        let mut frame = vec![fill; TELEMETRY_FRAME_LEN];
        frame[0] = 0xAA;
        frame[1] = 0x22;
        frame
    }
    #[test]
    fn waits_for_a_whole_frame() {
        let mut scanner = FrameScanner::telemetry();
        let frame = telemetry_frame(7);
        assert!(scanner.feed(&frame[..12]).is_empty());
        assert_eq!(scanner.pending(), 12);
        let frames = scanner.feed(&frame[12..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), frame.as_slice());
        assert_eq!(scanner.pending(), 0);
    }
    #[test]
    fn junk_prefix_is_dropped_exactly() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for k in 0..40 {
            let mut scanner = FrameScanner::telemetry();
            let mut stream: Vec<u8> = (0..k)
                .map(|_| loop {
                    // never produce an accidental header inside the junk
                    let b: u8 = rng.gen();
                    if b != 0xAA {
                        break b;
                    }
                })
                .collect();
            stream.extend(telemetry_frame(3));
            let frames = scanner.feed(&stream);
            assert_eq!(frames.len(), 1, "junk length {k}");
            assert_eq!(&frames[0].as_bytes()[..2], &TELEMETRY_MAGIC);
            assert_eq!(scanner.discarded(), k as u64);
            assert_eq!(scanner.pending(), 0);
        }
    }
    #[test]
    fn header_one_byte_later_is_not_skipped() {
        let mut scanner = FrameScanner::telemetry();
        let mut stream = vec![0xAA];
        stream.extend(telemetry_frame(9));
        let frames = scanner.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes()[2], 9);
        assert_eq!(scanner.discarded(), 1);
    }
    #[test]
    fn several_frames_in_one_read() {
        let mut scanner = FrameScanner::telemetry();
        let mut stream = telemetry_frame(1);
        stream.extend([0x00, 0x13]);
        stream.extend(telemetry_frame(2));
        stream.extend(&telemetry_frame(3)[..5]);
        let frames = scanner.feed(&stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_bytes()[5], 2);
        assert_eq!(scanner.pending(), 5);
    }
    #[test]
    fn random_noise_never_yields_headerless_frames() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut scanner = FrameScanner::telemetry();
        for _ in 0..200 {
            let chunk: Vec<u8> = (0..rng.gen_range(0..64)).map(|_| rng.gen()).collect();
            for frame in scanner.feed(&chunk) {
                assert_eq!(frame.len(), TELEMETRY_FRAME_LEN);
                assert_eq!(&frame.as_bytes()[..2], &TELEMETRY_MAGIC);
            }
        }
    }
}
