use clap::Parser;
use log::{error, info};
use pcap_tcp::gaps::{GapConfig, GapDetector, DEFAULT_THRESHOLD};
use pcap_tcp::{CaptureFile, DecodedPacket};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const PROGRESS_INTERVAL: u64 = 1000;

/// Print TCP packets sent after a long idle period on their connection
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Capture file, in legacy pcap format
    file: PathBuf,

    /// Report gaps larger than this value, in seconds
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Only consider packets with one port below this value
    #[arg(long)]
    service_port_below: Option<u16>,

    /// Also consider packets without payload
    #[arg(long)]
    include_empty: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match find_slow_gaps(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {}", args.file.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn find_slow_gaps(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = GapConfig::default()
        .with_threshold(args.threshold)
        .with_skip_empty_payload(!args.include_empty)
        .with_service_port_below(args.service_port_below);
    let mut detector = GapDetector::new(config);

    let capture = CaptureFile::open(&args.file)?;
    info!(
        "{}: link type {}, {:?}",
        args.file.display(),
        capture.linktype(),
        capture.byte_order()
    );

    let mut num_packets = 0u64;
    for packet in capture.packets() {
        let packet = packet?;
        num_packets += 1;
        if num_packets % PROGRESS_INTERVAL == 0 {
            info!("{} packets", num_packets);
        }
        if let Some(alert) = detector.observe(&packet) {
            println!(
                "gap: {:.6} {:.6} {}  # {}",
                alert.gap,
                alert.timestamp,
                describe(&packet),
                printable_payload(&packet.payload)
            );
        }
    }
    info!(
        "{} packets, {} connections",
        num_packets,
        detector.connections()
    );
    Ok(())
}

fn describe(packet: &DecodedPacket) -> String {
    format!(
        "{}:{}-{}:{}",
        packet.source(),
        packet.source_port(),
        packet.destination(),
        packet.dest_port()
    )
}

fn printable_payload(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}
