//! Elementary stream packets handed to the downstream decoder.

use bitflags::bitflags;

bitflags! {
    /// Flag bits carried by an [`EsPacket`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PacketFlags: u32 {
        /// The buffer carries codec configuration (SPS/PPS) ahead of the
        /// slice data. Set on the first keyframe packet of a session.
        const CODEC_CONFIG = 1 << 0;
        /// The packet was produced at the last frame index of the session.
        const END_OF_STREAM = 1 << 1;
    }
}

/// One assembled packet of elementary stream data.
///
/// Produced by [`PacketAssembler`](crate::PacketAssembler), consumed by an
/// external decoder component. Ownership transfers to the caller; the
/// buffer is allocated per frame with the capacity negotiated via
/// [`VideoFormat`](crate::VideoFormat).
///
/// A zero-length packet means "nothing to feed this frame" — the scanner
/// saw a parameter set (cached, not emitted), an unclassified unit, or
/// malformed data. The feed driver skips these; the timestamp still
/// advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsPacket {
    /// Raw Annex B bytes: canonical start codes plus payload.
    pub data: Vec<u8>,
    /// Presentation timestamp in microseconds.
    pub pts_us: u64,
    /// Flag bits for the decoder.
    pub flags: PacketFlags,
}

impl EsPacket {
    /// Number of payload bytes written into the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether this packet carries nothing to feed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Presentation timestamp in seconds, as the decoder boundary expects.
    pub fn pts_secs(&self) -> f64 {
        self.pts_us as f64 / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_are_distinct() {
        assert_eq!(PacketFlags::CODEC_CONFIG.bits(), 0b01);
        assert_eq!(PacketFlags::END_OF_STREAM.bits(), 0b10);
        assert!(
            !PacketFlags::CODEC_CONFIG.intersects(PacketFlags::END_OF_STREAM)
        );
    }

    #[test]
    fn pts_microseconds_to_seconds() {
        let p = EsPacket {
            data: vec![1],
            pts_us: 2_500_000,
            flags: PacketFlags::empty(),
        };
        assert_eq!(p.pts_secs(), 2.5);
    }

    #[test]
    fn empty_packet() {
        let p = EsPacket {
            data: Vec::new(),
            pts_us: 0,
            flags: PacketFlags::empty(),
        };
        assert!(p.is_empty());
        assert_eq!(p.len(), 0);
    }
}
