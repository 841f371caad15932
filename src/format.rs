//! Binary file format for recorded samples
//!
//! Each output file is one 12-byte header followed by fixed 24-byte records
//! until EOF, everything little-endian:
//!
//! * header: `start_timestamp` f64, `sample_rate_hz` f32
//! * record: `x` f32, `y` f32, `z` f32, 4 padding bytes, `timestamp` f64
//!   at offset 16 (the f64 is 8-byte aligned within the record)
//!
//! Downstream readers parse by fixed offsets, so the layout is byte-exact by
//! contract. The expected record count of a file is
//! `(file_size - HEADER_SIZE) / RECORD_SIZE`; a trailing remainder means the
//! final record was truncated and is reported as a warning, not a failure.

use crate::error::{AccelError, Result};
use crate::mma8451::CalibratedSample;
use log::warn;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Size of the file header in bytes
pub const HEADER_SIZE: usize = 12;
/// Size of one sample record in bytes
pub const RECORD_SIZE: usize = 24;

/// Metadata written exactly once per file, before any record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileHeader {
    /// UNIX epoch seconds at file creation
    pub start_timestamp: f64,
    /// Configured output rate in Hz
    pub sample_rate_hz: f32,
}

impl FileHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.start_timestamp.to_le_bytes());
        buf[8..12].copy_from_slice(&self.sample_rate_hz.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> FileHeader {
        FileHeader {
            start_timestamp: read_f64(&buf[0..8]),
            sample_rate_hz: read_f32(&buf[8..12]),
        }
    }
}

/// Serialize one sample as a fixed-size record.
pub fn encode_record(sample: &CalibratedSample) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..4].copy_from_slice(&sample.x.to_le_bytes());
    buf[4..8].copy_from_slice(&sample.y.to_le_bytes());
    buf[8..12].copy_from_slice(&sample.z.to_le_bytes());
    // buf[12..16] stays zero: alignment padding before the f64
    buf[16..24].copy_from_slice(&sample.timestamp.to_le_bytes());
    buf
}

pub fn decode_record(buf: &[u8; RECORD_SIZE]) -> CalibratedSample {
    CalibratedSample {
        x: read_f32(&buf[0..4]),
        y: read_f32(&buf[4..8]),
        z: read_f32(&buf[8..12]),
        timestamp: read_f64(&buf[16..24]),
    }
}

fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_f64(bytes: &[u8]) -> f64 {
    f64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Append-only writer for one output file.
///
/// Writes the header at creation, then fixed-size records. Each record goes
/// out as a single buffered write, so a record is either fully present after
/// a flush or not present at all.
pub struct DataFileWriter {
    file: BufWriter<File>,
    path: PathBuf,
    bytes_written: u64,
}

impl DataFileWriter {
    /// Create the file and write its header.
    pub fn create<P: AsRef<Path>>(path: P, header: &FileHeader) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| AccelError::file_io(&path, e))?;
        let mut writer = Self {
            file: BufWriter::new(file),
            path,
            bytes_written: 0,
        };
        writer.write_bytes(&header.to_bytes())?;
        Ok(writer)
    }

    /// Append one sample record.
    pub fn append(&mut self, sample: &CalibratedSample) -> Result<()> {
        self.write_bytes(&encode_record(sample))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .write_all(bytes)
            .map_err(|e| AccelError::file_io(&self.path, e))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Total bytes written so far, header included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file.
    pub fn finish(mut self) -> Result<()> {
        self.file
            .flush()
            .map_err(|e| AccelError::file_io(&self.path, e))
    }
}

/// Read only the header of a data file.
pub fn read_file_header<P: AsRef<Path>>(path: P) -> Result<FileHeader> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| AccelError::file_io(path, e))?;
    let mut buf = [0u8; HEADER_SIZE];
    file.read_exact(&mut buf)
        .map_err(|e| AccelError::file_io(path, e))?;
    Ok(FileHeader::from_bytes(&buf))
}

/// Read an entire data file: header plus all complete records.
///
/// A trailing partial record indicates truncation or corruption; it is
/// logged as a warning and the complete records are still returned.
pub fn read_data_file<P: AsRef<Path>>(path: P) -> Result<(FileHeader, Vec<CalibratedSample>)> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| AccelError::file_io(path, e))?;
    if bytes.len() < HEADER_SIZE {
        return Err(AccelError::file_io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("file is {} bytes, shorter than the header", bytes.len()),
            ),
        ));
    }

    let mut header_buf = [0u8; HEADER_SIZE];
    header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = FileHeader::from_bytes(&header_buf);

    let body = &bytes[HEADER_SIZE..];
    let remainder = body.len() % RECORD_SIZE;
    if remainder != 0 {
        warn!(
            "{}: {} trailing bytes beyond {} complete records, possible truncation",
            path.display(),
            remainder,
            body.len() / RECORD_SIZE
        );
    }

    let mut records = Vec::with_capacity(body.len() / RECORD_SIZE);
    for chunk in body.chunks_exact(RECORD_SIZE) {
        let mut record_buf = [0u8; RECORD_SIZE];
        record_buf.copy_from_slice(chunk);
        records.push(decode_record(&record_buf));
    }

    Ok((header, records))
}
