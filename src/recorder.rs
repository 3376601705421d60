use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::drivers::DecodedTelemetry;
/// CSV capture of decoded telemetry, one row per frame.
pub struct DataRecorder {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
    rows: u64,
}
impl Default for DataRecorder {
    fn default() -> Self {
        Self::new()
    }
}
impl DataRecorder {
    pub fn new() -> Self {
        Self {
            writer: None,
            path: None,
            rows: 0,
        }
    }
    pub fn start(&mut self, path: &Path) -> Result<()> {
        self.stop()?;
        let file = File::create(path)
            .with_context(|| format!("creating recording {}", path.display()))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "t_ms,atrial_mv,ventricular_mv,telemetry_word")?;
        self.writer = Some(w);
        self.path = Some(path.to_path_buf());
        self.rows = 0;
        log::info!("recording started: {}", path.display());
        Ok(())
    }
    pub fn stop(&mut self) -> Result<()> {
        if let Some(mut w) = self.writer.take() {
            w.flush().context("flushing recording")?;
            if let Some(path) = self.path.take() {
                log::info!("recording saved: {} ({} rows)", path.display(), self.rows);
            }
        }
        Ok(())
    }
    pub fn write_record(&mut self, record: &DecodedTelemetry) -> Result<()> {
        let Some(w) = &mut self.writer else {
            return Ok(());
        };
        let t = record
            .atrial
            .last()
            .or(record.ventricular.last())
            .map(|s| s.t)
            .unwrap_or(0);
        let cell = |v: Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_default();
        writeln!(
            w,
            "{t},{},{},{}",
            cell(record.atrial_mv()),
            cell(record.ventricular_mv()),
            record.word
        )?;
        self.rows += 1;
        Ok(())
    }
    pub fn is_recording(&self) -> bool {
        self.writer.is_some()
    }
    pub fn rows(&self) -> u64 {
        self.rows
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::Sample;
    #[test]
    fn writes_header_and_rows() {
        let path = std::env::temp_dir().join(format!("pacelink_rec_{}.csv", std::process::id()));
        let mut recorder = DataRecorder::new();
        recorder.start(&path).unwrap();
        let record = DecodedTelemetry {
            atrial: vec![Sample::new(40, -1.0)],
            ventricular: vec![Sample::new(40, 1.0)],
            markers: Vec::new(),
            word: 0x0AF6,
        };
        recorder.write_record(&record).unwrap();
        assert_eq!(recorder.rows(), 1);
        recorder.stop().unwrap();
        assert!(!recorder.is_recording());
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "t_ms,atrial_mv,ventricular_mv,telemetry_word");
        assert_eq!(lines[1], "40,-1.0,1.0,2806");
    }
    #[test]
    fn idle_recorder_ignores_records() {
        let mut recorder = DataRecorder::new();
        let record = DecodedTelemetry {
            atrial: Vec::new(),
            ventricular: Vec::new(),
            markers: Vec::new(),
            word: 0,
        };
        recorder.write_record(&record).unwrap();
        assert_eq!(recorder.rows(), 0);
    }
}
