use std::collections::VecDeque;
use crate::drivers::LinkError;
/// Inbound half of a device link. Implementations must not block waiting for data.
pub trait ByteSource {
    fn has_bytes_available(&mut self) -> Result<bool, LinkError>;
    /// Everything currently buffered by the transport, possibly empty.
    fn read_available(&mut self) -> Result<Vec<u8>, LinkError>;
}
/// Outbound half of a device link.
pub trait ByteSink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError>;
    fn flush(&mut self) -> Result<(), LinkError> {
        Ok(())
    }
}
impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn has_bytes_available(&mut self) -> Result<bool, LinkError> {
        (**self).has_bytes_available()
    }
    fn read_available(&mut self) -> Result<Vec<u8>, LinkError> {
        (**self).read_available()
    }
}
impl<T: ByteSink + ?Sized> ByteSink for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        (**self).write(bytes)
    }
    fn flush(&mut self) -> Result<(), LinkError> {
        (**self).flush()
    }
}
/// In-memory source useful for tests and deterministic playback.
///
/// Each queued chunk is returned by one `read_available` call, which lets tests
/// split frames across read boundaries on purpose.
#[derive(Default)]
pub struct ManualSource {
    queue: VecDeque<Result<Vec<u8>, LinkError>>,
}
impl ManualSource {
    pub fn new(chunks: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            queue: chunks.into_iter().map(Ok).collect(),
        }
    }
    pub fn push(&mut self, chunk: Vec<u8>) {
        self.queue.push_back(Ok(chunk));
    }
    /// Queues a transport failure to be returned in place of a read.
    pub fn push_error(&mut self, error: LinkError) {
        self.queue.push_back(Err(error));
    }
}
impl ByteSource for ManualSource {
    fn has_bytes_available(&mut self) -> Result<bool, LinkError> {
        Ok(!self.queue.is_empty())
    }
    fn read_available(&mut self) -> Result<Vec<u8>, LinkError> {
        self.queue.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
/// Sink that keeps every write, plus canned bytes to answer with.
#[derive(Default)]
pub struct CaptureSink {
    pub written: Vec<Vec<u8>>,
    pub replies: ManualSource,
    pub fail_writes: bool,
}
impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }
}
impl ByteSink for CaptureSink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        if self.fail_writes {
            return Err(LinkError::Disconnected);
        }
        self.written.push(bytes.to_vec());
        Ok(bytes.len())
    }
}
impl ByteSource for CaptureSink {
    fn has_bytes_available(&mut self) -> Result<bool, LinkError> {
        self.replies.has_bytes_available()
    }
    fn read_available(&mut self) -> Result<Vec<u8>, LinkError> {
        self.replies.read_available()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn manual_source_replays_chunks_then_runs_dry() {
        let mut source = ManualSource::new(vec![vec![1, 2], vec![3]]);
        assert!(source.has_bytes_available().unwrap());
        assert_eq!(source.read_available().unwrap(), vec![1, 2]);
        assert_eq!(source.read_available().unwrap(), vec![3]);
        assert!(!source.has_bytes_available().unwrap());
        assert!(source.read_available().unwrap().is_empty());
    }
    #[test]
    fn queued_errors_surface_in_order() {
        let mut source = ManualSource::default();
        source.push_error(LinkError::Disconnected);
        source.push(vec![9]);
        assert!(source.read_available().is_err());
        assert_eq!(source.read_available().unwrap(), vec![9]);
    }
}
