//! NAL unit scanning for Annex B H.264 bitstreams.
//!
//! An Annex B elementary stream is a flat byte sequence in which each
//! NAL (Network Abstraction Layer) unit is introduced by a start code:
//!
//! ```text
//! 4-byte: 0x00 0x00 0x00 0x01
//! 3-byte: 0x00 0x00 0x01
//! ```
//!
//! [`extract_unit`] pulls one unit off a [`PushbackReader`], normalizing
//! whatever start code the source used to the canonical 4-byte form, and
//! leaves the stream positioned exactly at the next unit's start code.

use std::io::Read;

use crate::error::Result;
use crate::reader::PushbackReader;

/// Canonical start code written ahead of every extracted unit.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// NAL unit classification, from the low 5 bits of the unit's first byte.
///
/// Only the three kinds the feeder cares about are named; everything else
/// is carried as [`Other`](Self::Other) with the raw type number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    /// Sequence Parameter Set (type 7).
    Sps,
    /// Picture Parameter Set (type 8).
    Pps,
    /// Instantaneous Decoder Refresh slice, a keyframe (type 5).
    IdrSlice,
    /// Any other NAL unit type (0–31, excluding the above).
    Other(u8),
}

impl NalUnitType {
    /// Classify from the NAL header byte (`forbidden(1) | nal_ref_idc(2) | type(5)`).
    pub fn from_header(header: u8) -> Self {
        match header & 0x1f {
            7 => Self::Sps,
            8 => Self::Pps,
            5 => Self::IdrSlice,
            t => Self::Other(t),
        }
    }

    /// Whether the scanner keeps this unit's bytes.
    ///
    /// SPS, PPS, and IDR slices are retained; everything else is scanned
    /// past and reported with length 0.
    pub fn retained(self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Result of one [`extract_unit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A unit was scanned. `len` is the number of bytes written to the
    /// output buffer — 0 for kinds that are not retained.
    Unit { kind: NalUnitType, len: usize },
    /// The bytes at the current position do not form a start code.
    /// One byte was consumed, so repeated calls make progress.
    NoStartCode,
    /// End of stream before a complete unit.
    EndOfStream,
}

/// Extract one NAL unit from the stream into `out`.
///
/// `out` is cleared first. On success it holds the canonical 4-byte start
/// code followed by the unit's payload, byte for byte as it appeared in
/// the source (emulation-prevention bytes included — the downstream
/// decoder expects them intact).
///
/// ## Scan contract
///
/// - Leading zero bytes are consumed; at least two zeros followed by
///   `0x01` form a start code. Anything else is
///   [`NoStartCode`](ScanOutcome::NoStartCode).
/// - Payload bytes are copied while tracking a run of consecutive zeros.
///   A run of 2–4 zeros followed by `0x01` is the *next* unit's start
///   code: scanning stops and those `run + 1` bytes are pushed back so
///   the next call re-discovers the start code. A run of any other
///   length followed by `0x01` is flushed literally as payload — the
///   2–4 window is preserved source behavior, not an Annex B rule.
/// - End of stream while a zero run is pending flushes the pending zeros
///   literally and ends the unit.
///
/// Units whose type is not retained (see [`NalUnitType::retained`]) are
/// scanned past — the stream still advances to the next start code — but
/// their bytes are discarded and `len` is reported as 0.
pub fn extract_unit<R: Read>(
    reader: &mut PushbackReader<R>,
    out: &mut Vec<u8>,
) -> Result<ScanOutcome> {
    out.clear();

    // Consume the start code at the current position.
    let mut leading_zeros = 0usize;
    loop {
        match reader.read_byte()? {
            None => return Ok(ScanOutcome::EndOfStream),
            Some(0x00) => leading_zeros += 1,
            Some(0x01) if leading_zeros >= 2 => break,
            Some(_) => return Ok(ScanOutcome::NoStartCode),
        }
    }

    out.extend_from_slice(&START_CODE);

    // Classify from the first payload byte, then unread it so the copy
    // loop below handles every payload byte uniformly (a header byte of
    // 0x00 must participate in zero-run tracking).
    let kind = match reader.read_byte()? {
        None => return Ok(ScanOutcome::EndOfStream),
        Some(header) => {
            reader.unread(&[header]);
            NalUnitType::from_header(header)
        }
    };

    let mut zero_run = 0usize;
    loop {
        match reader.read_byte()? {
            None => {
                for _ in 0..zero_run {
                    out.push(0x00);
                }
                break;
            }
            Some(0x00) => zero_run += 1,
            Some(0x01) if (2..=4).contains(&zero_run) => {
                // Next unit's start code: push it back for the next call.
                let mut start = [0x00u8; 5];
                start[zero_run] = 0x01;
                reader.unread(&start[..=zero_run]);
                break;
            }
            Some(byte) => {
                for _ in 0..zero_run {
                    out.push(0x00);
                }
                zero_run = 0;
                out.push(byte);
            }
        }
    }

    if !kind.retained() {
        tracing::trace!(?kind, scanned = out.len(), "unclassified NAL unit discarded");
        out.clear();
        return Ok(ScanOutcome::Unit { kind, len: 0 });
    }

    tracing::trace!(?kind, len = out.len(), "NAL unit extracted");
    Ok(ScanOutcome::Unit {
        kind,
        len: out.len(),
    })
}
