use std::thread;
use std::time::Duration;
use crate::drivers::encoder::{encode_command, CommandFrame, ProgrammingSnapshot};
use crate::drivers::error::LinkError;
use crate::drivers::source::{ByteSink, ByteSource};
/// How long the device gets to answer a programming frame.
pub const DEFAULT_RESPONSE_WAIT: Duration = Duration::from_millis(50);
/// What came back from one successful send.
#[derive(Clone, Debug)]
pub struct ProgramOutcome {
    pub frame: CommandFrame,
    /// Raw reply bytes; empty when the device stayed quiet.
    pub response: Vec<u8>,
}
/// Sends validated parameter sets to the device.
pub struct Programmer<T> {
    link: T,
    response_wait: Duration,
}
impl<T: ByteSink + ByteSource> Programmer<T> {
    pub fn new(link: T) -> Self {
        Self {
            link,
            response_wait: DEFAULT_RESPONSE_WAIT,
        }
    }
    pub fn with_response_wait(mut self, wait: Duration) -> Self {
        self.response_wait = wait;
        self
    }
    /// Validates, encodes and writes one programming frame.
    ///
    /// Nothing is written when validation fails; the error carries every message.
    pub fn send(&mut self, snapshot: &ProgrammingSnapshot) -> Result<ProgramOutcome, LinkError> {
        snapshot.validate().into_result()?;
        let frame = encode_command(snapshot);
        log::info!("programming {} -> {}", snapshot.mode, frame.to_hex());
        self.link.write(frame.as_bytes())?;
        self.link.flush()?;
        if !self.response_wait.is_zero() {
            thread::sleep(self.response_wait);
        }
        let response = if self.link.has_bytes_available()? {
            self.link.read_available()?
        } else {
            Vec::new()
        };
        if response.is_empty() {
            log::debug!("no response to programming frame");
        } else {
            log::info!("device replied with {} bytes", response.len());
        }
        Ok(ProgramOutcome { frame, response })
    }
    pub fn into_inner(self) -> T {
        self.link
    }
}
