pub mod assembler;
pub mod error;
pub mod feeder;
pub mod format;
pub mod nal;
pub mod packet;
pub mod reader;

pub use assembler::PacketAssembler;
pub use error::{EsError, Result};
pub use feeder::{DEFAULT_MAX_FRAMES, EsFeeder, FeedState, FeedStats, Packets};
pub use format::VideoFormat;
pub use packet::{EsPacket, PacketFlags};
pub use reader::PushbackReader;
