//! Readback harness for recorded accelerometer files
//!
//! Usage:
//!   readback read-file 20240101_120000000_accelerometer.dat
//!   readback time-range /data 1704110400 1704110460

use clap::{Parser, Subcommand};
use mma8451_daq::{read_data_file, read_time_range, CalibratedSample};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "readback")]
#[command(about = "Inspect recorded accelerometer data files", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every sample in a single data file
    ReadFile {
        /// Data file to read
        path: PathBuf,
    },
    /// Print samples from all files in a directory within a time range
    TimeRange {
        /// Directory containing data files
        dir: PathBuf,
        /// UNIX timestamp of the start of the range
        start: f64,
        /// UNIX timestamp of the end of the range
        stop: f64,
    },
}

fn print_samples(samples: &[CalibratedSample]) {
    for s in samples {
        println!(
            "{:.6}  x: {:+.6}  y: {:+.6}  z: {:+.6}",
            s.timestamp, s.x, s.y, s.z
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::ReadFile { path } => {
            let (header, samples) = read_data_file(&path)?;
            println!("File: {}", path.display());
            println!("Start: {:.6}", header.start_timestamp);
            println!("Rate: {} Hz", header.sample_rate_hz);
            print_samples(&samples);
            println!("{} samples", samples.len());
        }
        Command::TimeRange { dir, start, stop } => {
            let samples = read_time_range(&dir, start, stop)?;
            print_samples(&samples);
            println!("{} samples in range", samples.len());
            if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
                println!("First: {:.6}, last: {:.6}", first.timestamp, last.timestamp);
            }
        }
    }

    Ok(())
}
