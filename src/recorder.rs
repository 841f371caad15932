//! Continuous acquisition into rotating data files
//!
//! The recorder drives an initialized [`Mma8451`] in a tight poll loop and
//! appends every sample to the active output file, rotating to a fresh file
//! once the size threshold is exceeded. The loop busy-polls; there is no
//! sleep between empty reads.

use crate::bus::RegisterBus;
use crate::common::unix_timestamp;
use crate::error::{AccelError, Result};
use crate::format::{DataFileWriter, FileHeader};
use crate::mma8451::{Mma8451, FIFO_CAPACITY};
use chrono::Utc;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// FIFO backlog level above which a warning is emitted
const BACKLOG_WARN_THRESHOLD: u8 = 10;

/// Default rotation threshold in bytes
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100_000;

/// Default output file name prefix
pub const DEFAULT_FILE_PREFIX: &str = "accelerometer";

/// Counters reported at the end of a recording run
#[derive(Debug, Clone, Default)]
pub struct RecordingSummary {
    pub samples_written: u64,
    pub files_created: u64,
    pub backlog_warnings: u64,
}

/// Drives continuous acquisition from an initialized sensor into rotating,
/// size-bounded output files.
///
/// The active file handle is exclusively owned here; the cancellation flag
/// is checked at the top of every loop iteration and always leads through
/// the flush-and-close path.
pub struct Recorder<B> {
    driver: Mma8451<B>,
    output_dir: PathBuf,
    file_prefix: String,
    max_file_size: u64,
    duration_limit: Option<Duration>,
    running: Arc<AtomicBool>,
    summary: RecordingSummary,
}

impl<B: RegisterBus> Recorder<B> {
    /// Create a recorder writing into `output_dir`. `running` is the
    /// cooperative cancellation flag: clearing it stops the loop after the
    /// current iteration and flushes the active file.
    pub fn new(driver: Mma8451<B>, output_dir: impl Into<PathBuf>, running: Arc<AtomicBool>) -> Self {
        Self {
            driver,
            output_dir: output_dir.into(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            duration_limit: None,
            running,
            summary: RecordingSummary::default(),
        }
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Rotate to a new file once the active one exceeds this many bytes.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Stop recording normally once this much wall-clock time has elapsed.
    pub fn duration_limit(mut self, limit: Duration) -> Self {
        self.duration_limit = Some(limit);
        self
    }

    /// Counters for the current or most recent run.
    pub fn summary(&self) -> &RecordingSummary {
        &self.summary
    }

    /// Run the acquisition loop until the duration limit elapses, the
    /// cancellation flag is cleared, or a fatal error occurs. The active
    /// file is flushed and closed on every exit path.
    pub fn run(&mut self) -> Result<RecordingSummary> {
        self.summary = RecordingSummary::default();
        let started_at = unix_timestamp();
        let mut writer = self.open_file(started_at)?;

        let result = self.acquisition_loop(&mut writer, started_at);
        match (result, writer.finish()) {
            (Ok(()), Ok(())) => Ok(self.summary.clone()),
            (Ok(()), Err(flush_err)) => Err(flush_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(flush_err)) => {
                warn!("failed to flush active file after error: {flush_err}");
                Err(err)
            }
        }
    }

    fn acquisition_loop(&mut self, writer: &mut DataFileWriter, started_at: f64) -> Result<()> {
        let mut last_timestamp = started_at;
        loop {
            if !self.running.load(Ordering::SeqCst) {
                return Ok(());
            }
            if let Some(limit) = self.duration_limit {
                if last_timestamp - started_at >= limit.as_secs_f64() {
                    return Ok(());
                }
            }

            let status = self.driver.poll_fifo()?;
            if status.pending_count >= FIFO_CAPACITY {
                // At capacity the FIFO halts and the hardware is already
                // dropping samples
                return Err(AccelError::BufferOverrun {
                    pending: status.pending_count,
                });
            }

            let Some(sample) = self.driver.read_sample()? else {
                continue;
            };
            last_timestamp = sample.timestamp;
            writer.append(&sample)?;
            self.summary.samples_written += 1;

            if status.pending_count > BACKLOG_WARN_THRESHOLD {
                self.summary.backlog_warnings += 1;
                warn!(
                    "sensor FIFO backlog at {} of {} samples, acquisition is falling behind",
                    status.pending_count, FIFO_CAPACITY
                );
            }

            if writer.bytes_written() > self.max_file_size {
                self.rotate(writer)?;
            }
        }
    }

    /// Close the active file and open a fresh one. The record that pushed
    /// the size over the threshold stays in the file being closed.
    fn rotate(&mut self, writer: &mut DataFileWriter) -> Result<()> {
        let next = self.open_file(unix_timestamp())?;
        let previous = std::mem::replace(writer, next);
        previous.finish()
    }

    fn open_file(&mut self, start_timestamp: f64) -> Result<DataFileWriter> {
        let path = self.next_file_path();
        let header = FileHeader {
            start_timestamp,
            sample_rate_hz: self.driver.config().rate.hz(),
        };
        let writer = DataFileWriter::create(&path, &header)?;
        info!("recording to {}", path.display());
        self.summary.files_created += 1;
        Ok(writer)
    }

    fn next_file_path(&self) -> PathBuf {
        loop {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
            let path = self
                .output_dir
                .join(format!("{stamp}_{}.dat", self.file_prefix));
            if !path.exists() {
                return path;
            }
            // Rotated twice within the same millisecond; wait for the clock
            thread::sleep(Duration::from_millis(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::read_data_file;
    use crate::mma8451::{OutputRate, Range, SensorConfig, REG_F_STATUS};
    use crate::testutil::MockBus;
    use std::path::Path;

    fn recorder_with(
        bus: MockBus,
        config: SensorConfig,
        dir: &Path,
        running: Arc<AtomicBool>,
    ) -> Recorder<MockBus> {
        let mut driver = Mma8451::new(bus, config);
        driver.initialize().unwrap();
        Recorder::new(driver, dir, running)
    }

    fn data_files(dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("dat"))
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn scripted_run_records_until_buffer_overrun() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let mut bus = MockBus::new();
        // One engine poll plus one availability poll per drained sample,
        // then the fatal at-capacity poll
        bus.statuses.extend([1, 1, 11, 11, 32]);
        bus.frames.push_back([0x20, 0x00, 0x10, 0x00, 0x00, 0x00]);
        bus.frames.push_back([0x00, 0x40, 0xF0, 0x00, 0x08, 0x00]);

        let config = SensorConfig {
            range: Range::G4,
            rate: OutputRate::Hz400,
            ..SensorConfig::default()
        };
        let mut recorder = recorder_with(bus, config, dir.path(), running);

        match recorder.run() {
            Err(AccelError::BufferOverrun { pending: 32 }) => {}
            other => panic!("expected BufferOverrun, got {other:?}"),
        }

        let summary = recorder.summary();
        assert_eq!(summary.samples_written, 2);
        assert_eq!(summary.backlog_warnings, 1);
        assert_eq!(summary.files_created, 1);

        let files = data_files(dir.path());
        assert_eq!(files.len(), 1);
        let (header, records) = read_data_file(&files[0]).unwrap();
        assert_eq!(header.sample_rate_hz, 400.0);
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].x, records[0].y, records[0].z), (1.0, 0.5, 0.0));
        assert_eq!(
            (records[1].x, records[1].y, records[1].z),
            (0.0078125, -0.5, 0.25)
        );
        assert!(records[0].timestamp <= records[1].timestamp);
    }

    #[test]
    fn backlog_of_eleven_warns_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let mut bus = MockBus::new();
        bus.statuses.extend([11, 11]);
        bus.frames.push_back([0x00, 0x04, 0x00, 0x00, 0x00, 0x00]);
        bus.stop_when_drained = Some(running.clone());

        let mut recorder =
            recorder_with(bus, SensorConfig::default(), dir.path(), running);
        recorder.run().unwrap();

        assert_eq!(recorder.summary().samples_written, 1);
        assert_eq!(recorder.summary().backlog_warnings, 1);
    }

    #[test]
    fn backlog_of_ten_does_not_warn() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let mut bus = MockBus::new();
        bus.statuses.extend([10, 10]);
        bus.frames.push_back([0x00, 0x04, 0x00, 0x00, 0x00, 0x00]);
        bus.stop_when_drained = Some(running.clone());

        let mut recorder =
            recorder_with(bus, SensorConfig::default(), dir.path(), running);
        recorder.run().unwrap();

        assert_eq!(recorder.summary().samples_written, 1);
        assert_eq!(recorder.summary().backlog_warnings, 0);
    }

    #[test]
    fn full_fifo_aborts_before_draining() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let mut bus = MockBus::new();
        bus.statuses.push_back(32);

        let mut recorder =
            recorder_with(bus, SensorConfig::default(), dir.path(), running);

        assert!(matches!(
            recorder.run(),
            Err(AccelError::BufferOverrun { pending: 32 })
        ));
        assert_eq!(recorder.summary().samples_written, 0);
    }

    #[test]
    fn rotation_keeps_triggering_record_in_closed_file() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let mut bus = MockBus::new();
        for _ in 0..4 {
            bus.statuses.extend([1, 1]);
        }
        for k in 1u16..=4 {
            let [msb, lsb] = (k << 2).to_be_bytes();
            bus.frames.push_back([msb, lsb, 0x00, 0x00, 0x00, 0x00]);
        }
        bus.stop_when_drained = Some(running.clone());

        // Header (12) + 4 records (96) = 108 bytes: the fourth record pushes
        // the file over the threshold and triggers exactly one rotation.
        let mut recorder = recorder_with(bus, SensorConfig::default(), dir.path(), running)
            .max_file_size(100);
        recorder.run().unwrap();

        assert_eq!(recorder.summary().samples_written, 4);
        assert_eq!(recorder.summary().files_created, 2);

        let files = data_files(dir.path());
        assert_eq!(files.len(), 2);

        let (first_header, first_records) = read_data_file(&files[0]).unwrap();
        let (second_header, second_records) = read_data_file(&files[1]).unwrap();
        assert_eq!(first_records.len(), 4);
        assert_eq!(second_records.len(), 0);
        assert!(second_header.start_timestamp >= first_header.start_timestamp);

        let xs: Vec<f32> = first_records.iter().map(|r| r.x).collect();
        let expected: Vec<f32> = (1..=4).map(|k| k as f32 / 4096.0).collect();
        assert_eq!(xs, expected);
    }

    #[test]
    fn duration_limit_exits_normally() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let mut recorder = recorder_with(
            MockBus::new(),
            SensorConfig::default(),
            dir.path(),
            running,
        )
        .duration_limit(Duration::ZERO);

        let summary = recorder.run().unwrap();
        assert_eq!(summary.samples_written, 0);
        assert_eq!(summary.files_created, 1);
    }

    #[test]
    fn bus_fault_mid_acquisition_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let mut bus = MockBus::new();
        bus.fail_register = Some(REG_F_STATUS);

        let mut recorder =
            recorder_with(bus, SensorConfig::default(), dir.path(), running);

        assert!(matches!(recorder.run(), Err(AccelError::Bus(_))));
    }

    #[test]
    fn cancelled_run_flushes_header_and_exits_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let running = Arc::new(AtomicBool::new(false));

        let mut recorder = recorder_with(
            MockBus::new(),
            SensorConfig::default(),
            dir.path(),
            running,
        );

        let summary = recorder.run().unwrap();
        assert_eq!(summary.samples_written, 0);

        let files = data_files(dir.path());
        assert_eq!(files.len(), 1);
        let (header, records) = read_data_file(&files[0]).unwrap();
        assert_eq!(header.sample_rate_hz, 400.0);
        assert!(records.is_empty());
    }
}
