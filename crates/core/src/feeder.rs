//! Feed driver: pull packets from a stream file, hand them to a consumer.
//!
//! The driver owns the session lifecycle around the
//! [`PacketAssembler`](crate::PacketAssembler):
//!
//! ```text
//! NotStarted --run()--> Feeding --loop ends/error--> Done
//! ```
//!
//! The stream file is opened once per feed, read with blocking synchronous
//! I/O on the calling thread, and closed when the feed ends. There is no
//! retry or partial-failure handling: an I/O error aborts the feed and
//! propagates to the caller.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::assembler::PacketAssembler;
use crate::error::{EsError, Result};
use crate::format::VideoFormat;
use crate::packet::EsPacket;
use crate::reader::PushbackReader;

/// Default bound on the number of frame indices scanned per feed.
pub const DEFAULT_MAX_FRAMES: usize = 600;

/// Feed lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Created, [`run`](EsFeeder::run) not yet called.
    NotStarted,
    /// [`run`](EsFeeder::run) is executing the feed loop.
    Feeding,
    /// The feed loop ended (end of file, frame bound reached, or error).
    Done,
}

/// Counters reported after a completed feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Frame indices scanned (assembler calls that saw stream data).
    pub frames_scanned: usize,
    /// Non-empty packets delivered to the sink.
    pub packets_fed: usize,
    /// Total payload bytes delivered to the sink.
    pub bytes_fed: u64,
}

/// Drives a feed session over an Annex B elementary stream file.
///
/// Packets are delivered to a caller-supplied sink, synchronously, on the
/// calling thread. Zero-length assembler results (parameter sets being
/// cached, unclassified units) are counted but never handed to the sink.
///
/// For pull-style consumption, [`packets`](Self::packets) returns a lazy
/// iterator over the same sequence; each call opens the file fresh with
/// new parser state, so the sequence is restartable.
#[derive(Debug)]
pub struct EsFeeder {
    path: PathBuf,
    format: VideoFormat,
    max_frames: usize,
    state: FeedState,
}

impl EsFeeder {
    /// Create a feeder with the default frame bound.
    pub fn new(path: &Path, format: VideoFormat) -> Self {
        Self::with_max_frames(path, format, DEFAULT_MAX_FRAMES)
    }

    /// Create a feeder with an explicit frame bound.
    pub fn with_max_frames(path: &Path, format: VideoFormat, max_frames: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            max_frames,
            state: FeedState::NotStarted,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Whether the feed has run to completion.
    pub fn is_done(&self) -> bool {
        self.state == FeedState::Done
    }

    /// Run the feed loop, invoking `sink` for every non-empty packet.
    ///
    /// Loops until the frame bound is reached or the stream is exhausted,
    /// whichever comes first. A feeder runs at most once: calling `run`
    /// while [`Feeding`](FeedState::Feeding) or after
    /// [`Done`](FeedState::Done) is an error.
    ///
    /// If opening the file fails, the feeder stays
    /// [`NotStarted`](FeedState::NotStarted). Once the loop starts, it
    /// ends in [`Done`](FeedState::Done) whether it completed or aborted
    /// on an I/O error.
    pub fn run<F>(&mut self, mut sink: F) -> Result<FeedStats>
    where
        F: FnMut(EsPacket),
    {
        match self.state {
            FeedState::Feeding => return Err(EsError::FeedInProgress),
            FeedState::Done => return Err(EsError::FeedFinished),
            FeedState::NotStarted => {}
        }

        let file = File::open(&self.path)?;
        self.state = FeedState::Feeding;

        tracing::info!(
            path = %self.path.display(),
            max_frames = self.max_frames,
            "feed started"
        );

        let result = self.feed_loop(file, &mut sink);
        self.state = FeedState::Done;

        match &result {
            Ok(stats) => tracing::info!(
                frames_scanned = stats.frames_scanned,
                packets_fed = stats.packets_fed,
                bytes_fed = stats.bytes_fed,
                "feed complete"
            ),
            Err(e) => tracing::warn!(error = %e, "feed aborted"),
        }

        result
    }

    fn feed_loop<F>(&self, file: File, sink: &mut F) -> Result<FeedStats>
    where
        F: FnMut(EsPacket),
    {
        let mut reader = PushbackReader::new(BufReader::new(file));
        let mut assembler = PacketAssembler::new(self.format.clone());
        let mut stats = FeedStats::default();

        for frame in 0..self.max_frames {
            let last_frame = frame + 1 == self.max_frames;
            match assembler.assemble(&mut reader, last_frame)? {
                None => {
                    tracing::debug!(frame, "end of stream");
                    break;
                }
                Some(packet) => {
                    stats.frames_scanned += 1;
                    if packet.is_empty() {
                        continue;
                    }
                    stats.packets_fed += 1;
                    stats.bytes_fed += packet.len() as u64;
                    sink(packet);
                }
            }
        }

        Ok(stats)
    }

    /// Lazy iterator over the non-empty packets of this session.
    ///
    /// Opens the file and creates fresh parser state on every call, so the
    /// returned sequence is finite and restartable — iterating twice
    /// yields identical packets. Independent of the [`run`](Self::run)
    /// state machine.
    pub fn packets(&self) -> Result<Packets> {
        let file = File::open(&self.path)?;
        Ok(Packets {
            reader: PushbackReader::new(BufReader::new(file)),
            assembler: PacketAssembler::new(self.format.clone()),
            max_frames: self.max_frames,
            frame: 0,
        })
    }
}

/// Iterator over the non-empty packets of a feed session.
///
/// Created by [`EsFeeder::packets`]. Yields `Err` once on a fatal I/O
/// error, then ends.
#[derive(Debug)]
pub struct Packets {
    reader: PushbackReader<BufReader<File>>,
    assembler: PacketAssembler,
    max_frames: usize,
    frame: usize,
}

impl Iterator for Packets {
    type Item = Result<EsPacket>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.frame < self.max_frames {
            let last_frame = self.frame + 1 == self.max_frames;
            self.frame += 1;
            match self.assembler.assemble(&mut self.reader, last_frame) {
                Err(e) => {
                    self.frame = self.max_frames;
                    return Some(Err(e));
                }
                Ok(None) => {
                    self.frame = self.max_frames;
                    return None;
                }
                Ok(Some(packet)) if packet.is_empty() => continue,
                Ok(Some(packet)) => return Some(Ok(packet)),
            }
        }
        None
    }
}
