//! MMA8451 recorder - continuous acquisition to rotating binary files
//!
//! Usage:
//!   recorder --output-dir /data --range 2g --rate 400 --max-file-size 100000

use clap::Parser;
use linux_embedded_hal::I2cdev;
use mma8451_daq::{
    Mma8451, OutputRate, Range, Recorder, SensorConfig, DEFAULT_FILE_PREFIX, DEFAULT_MAX_FILE_SIZE,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "recorder")]
#[command(about = "Record MMA8451 accelerometer data to rotating binary files", long_about = None)]
struct Args {
    /// I2C device node the sensor is attached to
    #[arg(long, default_value = "/dev/i2c-1")]
    device: String,

    /// I2C address of the sensor (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0x1d", value_parser = parse_address)]
    address: u8,

    /// Measurement range: 2g, 4g, or 8g
    #[arg(long, default_value = "2g")]
    range: String,

    /// Output data rate in Hz: 50, 200, 400, or 800
    #[arg(long, default_value_t = 400)]
    rate: u16,

    /// Directory for output files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output file name prefix
    #[arg(long, default_value = DEFAULT_FILE_PREFIX)]
    prefix: String,

    /// Rotate to a new file once the active one exceeds this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Duration in seconds (optional, runs until Ctrl+C if omitted)
    #[arg(short, long)]
    duration: Option<u64>,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u8::from_str_radix(digits, radix).map_err(|e| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let range = Range::from_label(&args.range).ok_or("range must be 2g, 4g, or 8g")?;
    let rate = OutputRate::from_hz(args.rate).ok_or("rate must be 50, 200, 400, or 800 Hz")?;

    println!("MMA8451 Recorder");
    println!("================");
    println!("Device: {} (address 0x{:02X})", args.device, args.address);
    println!("Range: +/-{}, rate: {} Hz", range.label(), args.rate);
    println!("Output directory: {}", args.output_dir.display());
    println!("Max file size: {} bytes", args.max_file_size);
    if let Some(duration) = args.duration {
        println!("Duration: {} seconds", duration);
    } else {
        println!("Duration: continuous (Ctrl+C to stop)");
    }
    println!();

    println!("Initializing sensor...");
    let bus = I2cdev::new(&args.device)?;
    let config = SensorConfig {
        address: args.address,
        range,
        rate,
    };
    let mut driver = Mma8451::new(bus, config);
    driver.initialize()?;
    println!("Sensor initialized!\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping acquisition...");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut recorder = Recorder::new(driver, args.output_dir, running)
        .file_prefix(args.prefix)
        .max_file_size(args.max_file_size);
    if let Some(secs) = args.duration {
        recorder = recorder.duration_limit(Duration::from_secs(secs));
    }

    println!("Recording... (Ctrl+C to stop)\n");
    let started = std::time::Instant::now();

    match recorder.run() {
        Ok(summary) => {
            let elapsed = started.elapsed().as_secs_f64();
            let actual_rate = summary.samples_written as f64 / elapsed.max(f64::EPSILON);

            println!("Recording complete!");
            println!("Samples written: {}", summary.samples_written);
            println!("Files created: {}", summary.files_created);
            if summary.backlog_warnings > 0 {
                println!("Backlog warnings: {}", summary.backlog_warnings);
            }
            println!("Elapsed time: {:.2} seconds", elapsed);
            println!("Actual sample rate: {:.1} Hz", actual_rate);
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError during recording: {}", e);
            Err(e.into())
        }
    }
}
