//! Packet assembly: NAL units in, decoder-ready packets out.

use std::io::Read;

use crate::error::{EsError, Result};
use crate::format::VideoFormat;
use crate::nal::{self, NalUnitType, ScanOutcome};
use crate::packet::{EsPacket, PacketFlags};
use crate::reader::PushbackReader;

/// Assembles decoder packets from a NAL unit stream.
///
/// One [`assemble`](Self::assemble) call corresponds to one frame index of
/// the feed session. The assembler owns the parser state that persists
/// across frames:
///
/// - **SPS/PPS cache**: the most recently seen parameter set bytes. An IDR
///   slice packet is prefixed with the cached SPS then PPS (each only if
///   present, in that order) so the decoder always receives configuration
///   ahead of a keyframe.
/// - **Codec-config latch**: the first emitted keyframe packet of a session
///   is marked [`PacketFlags::CODEC_CONFIG`]; later keyframes are not.
/// - **Presentation clock**: the timestamp advances by the format's fixed
///   per-frame step on *every* call, whether or not a packet is emitted.
///
/// ## Per-call behavior
///
/// | Scanned unit | Result |
/// |--------------|--------|
/// | SPS / PPS    | cached; zero-length packet (skip, do not feed) |
/// | IDR slice    | emitted: `[SPS][PPS][slice]` |
/// | anything else | zero-length packet |
/// | end of stream | `None` |
///
/// Callers must treat a zero written length as "skip, do not feed".
#[derive(Debug)]
pub struct PacketAssembler {
    format: VideoFormat,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
    codec_config_sent: bool,
    next_pts_us: u64,
    // Scratch buffer reused across frames; extract_unit clears it.
    unit: Vec<u8>,
}

impl PacketAssembler {
    pub fn new(format: VideoFormat) -> Self {
        Self {
            format,
            sps: None,
            pps: None,
            codec_config_sent: false,
            next_pts_us: 0,
            unit: Vec::new(),
        }
    }

    /// Assemble the packet for the next frame index.
    ///
    /// `last_frame` marks the final frame index of the session; the packet
    /// produced there carries [`PacketFlags::END_OF_STREAM`].
    ///
    /// Returns `Ok(None)` when the stream is exhausted. I/O errors
    /// propagate and are fatal to the feed.
    pub fn assemble<R: Read>(
        &mut self,
        reader: &mut PushbackReader<R>,
        last_frame: bool,
    ) -> Result<Option<EsPacket>> {
        let outcome = nal::extract_unit(reader, &mut self.unit)?;
        if outcome == ScanOutcome::EndOfStream {
            return Ok(None);
        }

        let pts_us = self.next_pts_us;
        self.next_pts_us += self.format.pts_step_us();

        let mut flags = PacketFlags::empty();
        if last_frame {
            flags |= PacketFlags::END_OF_STREAM;
        }

        let data = match outcome {
            ScanOutcome::Unit {
                kind: NalUnitType::Sps,
                ..
            } => {
                tracing::debug!(bytes = self.unit.len(), "SPS captured from stream");
                self.sps = Some(self.unit.clone());
                Vec::new()
            }
            ScanOutcome::Unit {
                kind: NalUnitType::Pps,
                ..
            } => {
                tracing::debug!(bytes = self.unit.len(), "PPS captured from stream");
                self.pps = Some(self.unit.clone());
                Vec::new()
            }
            ScanOutcome::Unit {
                kind: NalUnitType::IdrSlice,
                ..
            } => {
                let capacity = self.format.buffer_capacity();
                let prefix_len = self.sps.as_ref().map_or(0, Vec::len)
                    + self.pps.as_ref().map_or(0, Vec::len);
                let needed = prefix_len + self.unit.len();
                if needed > capacity {
                    return Err(EsError::PacketOverflow { needed, capacity });
                }

                let mut data = Vec::with_capacity(capacity);
                if let Some(sps) = &self.sps {
                    data.extend_from_slice(sps);
                }
                if let Some(pps) = &self.pps {
                    data.extend_from_slice(pps);
                }
                data.extend_from_slice(&self.unit);

                if !self.codec_config_sent {
                    flags |= PacketFlags::CODEC_CONFIG;
                    self.codec_config_sent = true;
                }
                data
            }
            // Unclassified unit or malformed bytes: nothing to feed this
            // frame, but the clock has already advanced.
            ScanOutcome::Unit { .. } | ScanOutcome::NoStartCode => Vec::new(),
            ScanOutcome::EndOfStream => unreachable!(),
        };

        Ok(Some(EsPacket {
            data,
            pts_us,
            flags,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPS: &[u8] = &[0x67, 0x42, 0x00, 0x1e];
    const PPS: &[u8] = &[0x68, 0xCE, 0x38, 0x80];
    const IDR: &[u8] = &[0x65, 0x88, 0x84, 0x00];
    const NON_IDR: &[u8] = &[0x41, 0xAA];

    const SC: &[u8] = &nal::START_CODE;

    fn annexb(units: &[&[u8]]) -> Vec<u8> {
        let mut stream = Vec::new();
        for unit in units {
            stream.extend_from_slice(SC);
            stream.extend_from_slice(unit);
        }
        stream
    }

    fn make_assembler() -> PacketAssembler {
        PacketAssembler::new(VideoFormat::default())
    }

    const STEP: u64 = 33_333; // 30 fps

    #[test]
    fn parameter_sets_cached_not_emitted() {
        let stream = annexb(&[SPS, PPS]);
        let mut reader = PushbackReader::new(stream.as_slice());
        let mut a = make_assembler();

        let p1 = a.assemble(&mut reader, false).unwrap().unwrap();
        let p2 = a.assemble(&mut reader, false).unwrap().unwrap();
        assert!(p1.is_empty());
        assert!(p2.is_empty());
        assert_eq!(p1.pts_us, 0);
        assert_eq!(p2.pts_us, STEP);
    }

    #[test]
    fn idr_prefixed_with_cached_sps_then_pps() {
        let stream = annexb(&[SPS, PPS, IDR]);
        let mut reader = PushbackReader::new(stream.as_slice());
        let mut a = make_assembler();

        a.assemble(&mut reader, false).unwrap();
        a.assemble(&mut reader, false).unwrap();
        let p = a.assemble(&mut reader, false).unwrap().unwrap();

        let expected = annexb(&[SPS, PPS, IDR]);
        assert_eq!(p.data, expected);
        assert_eq!(p.len(), 3 * SC.len() + SPS.len() + PPS.len() + IDR.len());
        assert!(p.flags.contains(PacketFlags::CODEC_CONFIG));
        assert_eq!(p.pts_us, 2 * STEP);
    }

    #[test]
    fn codec_config_only_on_first_keyframe() {
        let stream = annexb(&[SPS, PPS, IDR, IDR]);
        let mut reader = PushbackReader::new(stream.as_slice());
        let mut a = make_assembler();

        a.assemble(&mut reader, false).unwrap();
        a.assemble(&mut reader, false).unwrap();
        let first = a.assemble(&mut reader, false).unwrap().unwrap();
        let second = a.assemble(&mut reader, false).unwrap().unwrap();

        assert!(first.flags.contains(PacketFlags::CODEC_CONFIG));
        assert!(!second.flags.contains(PacketFlags::CODEC_CONFIG));
        // The cache persists: later keyframes still carry the prefix.
        assert_eq!(second.data, annexb(&[SPS, PPS, IDR]));
    }

    #[test]
    fn idr_without_cached_parameters_emitted_alone() {
        let stream = annexb(&[IDR]);
        let mut reader = PushbackReader::new(stream.as_slice());
        let mut a = make_assembler();

        let p = a.assemble(&mut reader, false).unwrap().unwrap();
        assert_eq!(p.data, annexb(&[IDR]));
        assert!(p.flags.contains(PacketFlags::CODEC_CONFIG));
    }

    #[test]
    fn clock_advances_on_skipped_frames() {
        // Non-IDR slice (type 1) is scanned past; the clock still ticks.
        let stream = annexb(&[NON_IDR, IDR]);
        let mut reader = PushbackReader::new(stream.as_slice());
        let mut a = make_assembler();

        let skipped = a.assemble(&mut reader, false).unwrap().unwrap();
        assert!(skipped.is_empty());
        assert_eq!(skipped.pts_us, 0);

        let p = a.assemble(&mut reader, false).unwrap().unwrap();
        assert_eq!(p.pts_us, STEP);
    }

    #[test]
    fn end_of_stream_flag_on_last_frame() {
        let stream = annexb(&[IDR]);
        let mut reader = PushbackReader::new(stream.as_slice());
        let mut a = make_assembler();

        let p = a.assemble(&mut reader, true).unwrap().unwrap();
        assert!(p.flags.contains(PacketFlags::END_OF_STREAM));
    }

    #[test]
    fn exhausted_stream_returns_none() {
        let mut reader = PushbackReader::new(&[][..]);
        let mut a = make_assembler();
        assert!(a.assemble(&mut reader, false).unwrap().is_none());
    }

    #[test]
    fn oversized_unit_is_packet_overflow() {
        // Minimum negotiated capacity is 64 KiB; a 70 000-byte slice
        // cannot fit.
        let mut slice = vec![0x65];
        slice.extend(std::iter::repeat(0xAB).take(70_000));
        let stream = annexb(&[slice.as_slice()]);
        let mut reader = PushbackReader::new(stream.as_slice());
        let mut a = PacketAssembler::new(VideoFormat::new(16, 16, 30));

        match a.assemble(&mut reader, false) {
            Err(EsError::PacketOverflow { needed, capacity }) => {
                assert_eq!(needed, slice.len() + SC.len());
                assert_eq!(capacity, 64 * 1024);
            }
            other => panic!("expected PacketOverflow, got {:?}", other),
        }
    }
}
