//! Error types for the elementary stream feeder library.

/// Errors that can occur in the elementary stream feeder library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **I/O**: [`Io`](Self::Io) — file open/read failures. Fatal to a feed;
///   there is no retry or partial-result policy.
/// - **Feed driver**: [`FeedInProgress`](Self::FeedInProgress),
///   [`FeedFinished`](Self::FeedFinished) — state machine misuse.
/// - **Assembler**: [`PacketOverflow`](Self::PacketOverflow) — a unit (plus
///   its parameter set prefixes) did not fit the negotiated packet buffer.
///
/// Malformed bitstream data is deliberately *not* an error: missing start
/// codes and truncated units produce zero-length extractions that the
/// assembler reports as "nothing to feed this frame".
#[derive(Debug, thiserror::Error)]
pub enum EsError {
    /// Underlying I/O error from the stream file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// [`EsFeeder::run`](crate::EsFeeder::run) was called while a feed is already running.
    #[error("feed already in progress")]
    FeedInProgress,

    /// [`EsFeeder::run`](crate::EsFeeder::run) was called after the feed completed.
    #[error("feed already finished")]
    FeedFinished,

    /// An assembled packet exceeded the capacity negotiated via
    /// [`VideoFormat`](crate::VideoFormat).
    #[error("packet overflow: unit needs {needed} bytes, negotiated capacity is {capacity}")]
    PacketOverflow { needed: usize, capacity: usize },
}

/// Convenience alias for `Result<T, EsError>`.
pub type Result<T> = std::result::Result<T, EsError>;
