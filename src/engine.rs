// src/engine.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use crate::drivers::{ByteSource, DecodedTelemetry, TelemetryPipeline};
use crate::recorder::DataRecorder;
use crate::session::{SessionStore, TelemetryStatus};
use crate::types::{MonitorCommand, MonitorEvent};
use crate::waveform::{Channel, EgramDisplay, Marker};
/// Stop flag shared with the ingestion worker, checked once per poll.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
/// Everything the worker needs besides its byte source and store.
pub struct IngestContext {
    pub session_id: String,
    pub display: Arc<RwLock<EgramDisplay>>,
    pub events: Sender<MonitorEvent>,
    pub commands: Receiver<MonitorCommand>,
    pub cancel: CancelToken,
    pub poll_interval: Duration,
}
struct Worker<St: SessionStore> {
    store: St,
    session_id: String,
    display: Arc<RwLock<EgramDisplay>>,
    tx: Sender<MonitorEvent>,
    recorder: DataRecorder,
    started: Instant,
}
impl<St: SessionStore> Worker<St> {
    fn now_ms(&self) -> i64 {
        self.started.elapsed().as_millis() as i64
    }
    fn set_status(&mut self, status: TelemetryStatus) {
        if let Err(err) = self.store.set_telemetry_status(&self.session_id, status) {
            log::warn!("status update failed: {err}");
        }
        self.tx.send(MonitorEvent::Status(status)).ok();
    }
    fn with_display(&self, f: impl FnOnce(&mut EgramDisplay)) {
        let mut display = self.display.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut display);
    }
    /// Returns `false` when the command asks the worker to stop.
    fn apply(&mut self, cmd: MonitorCommand) -> bool {
        match cmd {
            MonitorCommand::Stop => return false,
            MonitorCommand::SetEgmGain(gain) => self.with_display(|d| d.set_egm_gain(gain)),
            MonitorCommand::SetEcgGain(gain) => self.with_display(|d| d.set_ecg_gain(gain)),
            MonitorCommand::SetSelection(sel) => self.with_display(|d| d.set_selection(sel)),
            MonitorCommand::SetWindow(window) => {
                self.with_display(|d| d.set_time_window(window))
            }
            MonitorCommand::SetMarkersEnabled(on) => {
                self.with_display(|d| d.set_markers_enabled(on))
            }
            MonitorCommand::AddMarker {
                channel,
                abbreviation,
                modifier,
            } => {
                let mut marker = Marker::new(channel, self.now_ms(), abbreviation);
                marker.modifier = modifier;
                self.with_display(|d| d.add_marker(marker.clone()));
                if let Err(err) = self.store.append_marker(&self.session_id, marker) {
                    log::warn!("marker not stored: {err}");
                }
            }
            MonitorCommand::Reset => self.with_display(EgramDisplay::reset),
            MonitorCommand::StartRecording(path) => match self.recorder.start(&path) {
                Ok(()) => {
                    self.tx.send(MonitorEvent::RecordingStatus(true)).ok();
                }
                Err(err) => {
                    self.tx.send(MonitorEvent::Log(format!("recording failed: {err:#}"))).ok();
                }
            },
            MonitorCommand::StopRecording => {
                if let Err(err) = self.recorder.stop() {
                    log::warn!("{err:#}");
                }
                self.tx.send(MonitorEvent::RecordingStatus(false)).ok();
            }
        }
        true
    }
    fn persist(&mut self, record: &DecodedTelemetry) {
        let id = self.session_id.as_str();
        let stored = self
            .store
            .append_samples(id, Channel::Atrial, &record.atrial)
            .and_then(|_| {
                self.store
                    .append_samples(id, Channel::Ventricular, &record.ventricular)
            });
        if let Err(err) = stored {
            log::warn!("samples not stored: {err}");
        }
        for marker in &record.markers {
            if let Err(err) = self.store.append_marker(id, marker.clone()) {
                log::warn!("marker not stored: {err}");
            }
        }
        if let Err(err) = self.recorder.write_record(record) {
            log::warn!("recording write failed: {err:#}");
        }
    }
    fn handle_batch(&mut self, t_ms: i64, batch: Vec<DecodedTelemetry>) {
        self.with_display(|d| {
            for record in &batch {
                d.ingest(record);
            }
        });
        for record in &batch {
            self.persist(record);
        }
        if let Some(last) = batch.last() {
            self.tx
                .send(MonitorEvent::Telemetry {
                    t_ms,
                    frames: batch.len(),
                    atrial_mv: last.atrial_mv(),
                    ventricular_mv: last.ventricular_mv(),
                    word: last.word,
                })
                .ok();
        }
    }
}
/// Spawns the telemetry ingestion worker.
///
/// The worker owns `source` exclusively and is the only writer of the display.
/// It stops on [`CancelToken::cancel`], a [`MonitorCommand::Stop`], or when the
/// command sender is dropped; stop latency is bounded by one poll. The store is
/// handed back through the join handle.
pub fn spawn_ingest<S, St>(source: S, store: St, ctx: IngestContext) -> JoinHandle<St>
where
    S: ByteSource + Send + 'static,
    St: SessionStore + 'static,
{
    thread::spawn(move || {
        let IngestContext {
            session_id,
            display,
            events,
            commands,
            cancel,
            poll_interval,
        } = ctx;
        let mut pipeline = TelemetryPipeline::new(source);
        let mut worker = Worker {
            store,
            session_id,
            display,
            tx: events,
            recorder: DataRecorder::new(),
            started: Instant::now(),
        };
        worker
            .tx
            .send(MonitorEvent::Log(format!("telemetry session {} started", worker.session_id)))
            .ok();
        worker.set_status(TelemetryStatus::Connected);
        // reported once per distinct failure, not once per poll
        let mut link_error: Option<String> = None;
        'poll: loop {
            if cancel.is_cancelled() {
                break;
            }
            loop {
                match commands.try_recv() {
                    Ok(cmd) => {
                        if !worker.apply(cmd) {
                            break 'poll;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => break 'poll,
                }
            }
            let now = worker.now_ms();
            let polled = pipeline.pump_once(now);
            match (&polled, link_error.take()) {
                (Err(err), Some(previous)) if err.to_string() == previous => {
                    link_error = Some(previous);
                }
                (Err(err), _) => {
                    let message = err.to_string();
                    log::warn!("telemetry read failed: {message}");
                    worker.tx.send(MonitorEvent::TransportError(message.clone())).ok();
                    link_error = Some(message);
                }
                (Ok(_), Some(previous)) => {
                    log::info!("telemetry link recovered after: {previous}");
                    worker.tx.send(MonitorEvent::Log("telemetry link recovered".to_string())).ok();
                }
                (Ok(_), None) => {}
            }
            match polled {
                Ok(batch) if !batch.is_empty() => worker.handle_batch(now, batch),
                _ => thread::sleep(poll_interval),
            }
        }
        if let Err(err) = worker.recorder.stop() {
            log::warn!("{err:#}");
        }
        worker.set_status(TelemetryStatus::Disconnected);
        log::info!(
            "telemetry worker stopped: {} frames, {} junk bytes",
            pipeline.frames_decoded(),
            pipeline.bytes_discarded()
        );
        worker
            .tx
            .send(MonitorEvent::Stopped {
                frames_decoded: pipeline.frames_decoded(),
                bytes_discarded: pipeline.bytes_discarded(),
            })
            .ok();
        worker.store
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use crate::drivers::{LinkError, ManualSource, TELEMETRY_FRAME_LEN, TELEMETRY_MAGIC};
    use crate::session::{MemorySessionStore, SessionSettings};
    use crate::waveform::{ChannelSelection, Gain, TimeWindow};
    fn frame(vent: u8, atr: u8) -> Vec<u8> {
        let mut f = vec![0u8; TELEMETRY_FRAME_LEN];
        f[..2].copy_from_slice(&TELEMETRY_MAGIC);
        f[18] = vent;
        f[19] = atr;
        f
    }
    struct Harness {
        display: Arc<RwLock<EgramDisplay>>,
        cmd_tx: Sender<MonitorCommand>,
        event_rx: Receiver<MonitorEvent>,
        cancel: CancelToken,
        handle: JoinHandle<MemorySessionStore>,
        session_id: String,
    }
    fn start(source: ManualSource, before: Vec<MonitorCommand>) -> Harness {
        let mut store = MemorySessionStore::new();
        let session_id = store
            .create_or_resume_session("P100", SessionSettings::default())
            .unwrap()
            .session_id;
        let display = Arc::new(RwLock::new(EgramDisplay::default()));
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        for cmd in before {
            cmd_tx.send(cmd).unwrap();
        }
        let cancel = CancelToken::new();
        let handle = spawn_ingest(
            source,
            store,
            IngestContext {
                session_id: session_id.clone(),
                display: display.clone(),
                events: event_tx,
                commands: cmd_rx,
                cancel: cancel.clone(),
                poll_interval: Duration::from_millis(1),
            },
        );
        Harness {
            display,
            cmd_tx,
            event_rx,
            cancel,
            handle,
            session_id,
        }
    }
    fn wait_for(rx: &Receiver<MonitorEvent>, pred: impl Fn(&MonitorEvent) -> bool) -> MonitorEvent {
        loop {
            let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            if pred(&event) {
                return event;
            }
        }
    }
    #[test]
    fn worker_feeds_display_and_store() {
        let bytes = [vec![0x00, 0x13], frame(10, 0xF6), frame(20, 5)].concat();
        let h = start(
            ManualSource::new(vec![bytes]),
            vec![
                MonitorCommand::SetEgmGain(Gain::Double),
                MonitorCommand::SetSelection(ChannelSelection::Atrial),
                MonitorCommand::SetWindow(TimeWindow::from_millis(2_000)),
                MonitorCommand::AddMarker {
                    channel: Channel::Atrial,
                    abbreviation: "AS".into(),
                    modifier: None,
                },
            ],
        );
        let event = wait_for(&h.event_rx, |e| matches!(e, MonitorEvent::Telemetry { .. }));
        assert!(matches!(
            event,
            MonitorEvent::Telemetry { frames: 2, ventricular_mv: Some(v), .. } if v == 2.0
        ));
        h.cancel.cancel();
        let store = h.handle.join().unwrap();
        {
            let display = h.display.read().unwrap();
            let atrial = display.samples(Channel::Atrial);
            assert_eq!(atrial.len(), 2);
            assert_eq!(atrial[0].value, Some(-2.0));
            assert_eq!(display.telemetry_word(Channel::Atrial), Some(0x1405));
            assert_eq!(display.telemetry_word(Channel::Ventricular), None);
            assert_eq!(display.markers().len(), 1);
            assert_eq!(display.window_ms(), 2_000);
        }
        let session = store.get(&h.session_id).unwrap();
        assert_eq!(session.samples(Channel::Ventricular).len(), 2);
        assert_eq!(session.samples(Channel::Atrial)[0].value, Some(-1.0));
        assert_eq!(session.markers.len(), 1);
        assert_eq!(session.latest_status(), Some(TelemetryStatus::Disconnected));
    }
    #[test]
    fn transport_errors_do_not_stop_the_worker() {
        let mut source = ManualSource::default();
        source.push_error(LinkError::Disconnected);
        source.push(frame(1, 1));
        let h = start(source, Vec::new());
        wait_for(&h.event_rx, |e| matches!(e, MonitorEvent::TransportError(_)));
        wait_for(&h.event_rx, |e| matches!(e, MonitorEvent::Telemetry { .. }));
        h.cmd_tx.send(MonitorCommand::Stop).unwrap();
        let stopped = wait_for(&h.event_rx, |e| matches!(e, MonitorEvent::Stopped { .. }));
        assert!(matches!(stopped, MonitorEvent::Stopped { frames_decoded: 1, .. }));
        h.handle.join().unwrap();
    }
    #[test]
    fn a_failing_link_is_reported_once_until_it_recovers() {
        let mut source = ManualSource::default();
        for _ in 0..5 {
            source.push_error(LinkError::Disconnected);
        }
        source.push(frame(1, 1));
        source.push_error(LinkError::Disconnected);
        let h = start(source, Vec::new());
        let mut seen = Vec::new();
        loop {
            let event = h.event_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            let done = matches!(event, MonitorEvent::Telemetry { .. });
            seen.push(event);
            if done {
                break;
            }
        }
        let errors = seen
            .iter()
            .filter(|e| matches!(e, MonitorEvent::TransportError(_)))
            .count();
        assert_eq!(errors, 1);
        assert!(seen
            .iter()
            .any(|e| matches!(e, MonitorEvent::Log(m) if m.contains("recovered"))));
        // a fresh failure after recovery is reported again
        wait_for(&h.event_rx, |e| matches!(e, MonitorEvent::TransportError(_)));
        h.cancel.cancel();
        h.handle.join().unwrap();
    }
    #[test]
    fn dropping_the_command_sender_stops_the_worker() {
        let h = start(ManualSource::default(), vec![MonitorCommand::Reset]);
        drop(h.cmd_tx);
        let store = h.handle.join().unwrap();
        let session = store.get(&h.session_id).unwrap();
        let statuses: Vec<_> = session.telemetry_status_log.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                TelemetryStatus::Created,
                TelemetryStatus::Connected,
                TelemetryStatus::Disconnected
            ]
        );
    }
}
