//! Time-range readback across a directory of recorded files
//!
//! Files are selected by a header-only pass before any record is decoded: a
//! file spans from its own start timestamp up to the next file's start (the
//! newest file is open-ended), and only files whose span intersects the
//! requested window are read in full.

use crate::error::{AccelError, Result};
use crate::format::{read_data_file, read_file_header};
use crate::mma8451::CalibratedSample;
use std::fs;
use std::path::{Path, PathBuf};

/// Collect all samples in `dir` whose timestamp lies strictly within
/// `(start, stop)` (UNIX epoch seconds), in file order.
pub fn read_time_range<P: AsRef<Path>>(
    dir: P,
    start: f64,
    stop: f64,
) -> Result<Vec<CalibratedSample>> {
    let dir = dir.as_ref();
    let mut files: Vec<(f64, PathBuf)> = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| AccelError::file_io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| AccelError::file_io(dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("dat") {
            continue;
        }
        let header = read_file_header(&path)?;
        files.push((header.start_timestamp, path));
    }
    files.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut samples = Vec::new();
    for (index, (file_start, path)) in files.iter().enumerate() {
        let file_end = files
            .get(index + 1)
            .map(|(next_start, _)| *next_start)
            .unwrap_or(f64::INFINITY);
        if *file_start >= stop || file_end <= start {
            continue;
        }
        let (_, records) = read_data_file(path)?;
        samples.extend(
            records
                .into_iter()
                .filter(|r| r.timestamp > start && r.timestamp < stop),
        );
    }

    Ok(samples)
}
