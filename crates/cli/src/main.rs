use std::path::PathBuf;

use clap::Parser;
use esfeed::{DEFAULT_MAX_FRAMES, EsFeeder, VideoFormat, format};

#[derive(Parser)]
#[command(
    name = "esfeed",
    about = "Feed an Annex B H.264 elementary stream as decoder packets"
)]
struct Args {
    /// Path to a raw Annex B H.264 elementary stream
    file: PathBuf,

    /// Negotiated frame width in pixels
    #[arg(long, default_value_t = format::DEFAULT_WIDTH)]
    width: u32,

    /// Negotiated frame height in pixels
    #[arg(long, default_value_t = format::DEFAULT_HEIGHT)]
    height: u32,

    /// Frames per second (fixes the timestamp step)
    #[arg(long, default_value_t = format::DEFAULT_FPS)]
    fps: u32,

    /// Maximum number of frame indices to scan
    #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
    frames: usize,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let format = VideoFormat::new(args.width, args.height, args.fps);
    let mut feeder = EsFeeder::with_max_frames(&args.file, format, args.frames);

    let mut index = 0usize;
    let stats = match feeder.run(|packet| {
        index += 1;
        println!(
            "packet {:4}  {:7} bytes  pts {:8.3}s  {:?}",
            index,
            packet.len(),
            packet.pts_secs(),
            packet.flags
        );
    }) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Feed failed: {}", e);
            return;
        }
    };

    println!(
        "{} frames scanned, {} packets fed ({} bytes)",
        stats.frames_scanned, stats.packets_fed, stats.bytes_fed
    );
}
