//! Buffer decoding - the pure stage of the trace pipeline
//!
//! Every buffer delivered by the host starts with a 64-bit timestamp
//! split across its first elements; how many elements and how they are
//! reinterpreted depends on the buffer's [`WatcherKind`]. This module
//! strips and reconstructs that timestamp, classifies the remainder as
//! either a monitor event (single scalar) or a streamed trace, and
//! computes the staleness/fade gating used by the renderer.
//!
//! Everything here is free of graphics state so it can be unit tested
//! and benchmarked on its own; the render stage in
//! [`crate::frontend::traces`] consumes [`Classified`] values.
//!
//! # Timestamp layout
//!
//! The reconstructed timestamp is always `hi * 2^32 + lo` where `hi` and
//! `lo` are two reinterpreted 32-bit words:
//!
//! - `c`: the low bytes of the first 8 elements, packed into two words in
//!   platform byte order
//! - `j`/`i`: the first two elements, reinterpreted as unsigned words
//! - `f`: the bit patterns of the first two elements as 32-bit floats
//! - `d`: the two halves of the first element's 64-bit float bit pattern

use crate::types::WatcherKind;

/// Buffers older than this (relative to the shared clock, in ms) are
/// considered abandoned by the board and are not drawn.
pub const STALE_AFTER_MS: f64 = 2000.0;

/// Age (ms) at which a buffer starts fading towards transparent.
pub const FADE_START_MS: f64 = 1000.0;

/// A raw buffer as exposed by the host's live buffer store, one per
/// active channel. Re-read every rendered frame.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    /// Wire type code; `None` when talking to an old host runtime that
    /// does not tag buffers (see [`KindMemory`])
    pub kind_code: Option<char>,
    /// Raw ordered numeric samples, timestamp words included
    pub samples: Vec<f64>,
    /// Host-attached last-update marker on the shared clock
    pub updated_at_ms: f64,
}

/// A decoded buffer, classified by payload shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// A single timestamped scalar: rendered as a numeric readout
    Monitor { timestamp: u64, value: f64 },
    /// A streamed waveform: rendered as a polyline
    Trace { timestamp: u64, samples: Vec<f64> },
}

/// Reconstruct the leading 64-bit timestamp from the head of a buffer.
///
/// `head` must hold at least `kind.timestamp_len()` elements.
fn reconstruct_timestamp(kind: WatcherKind, head: &[f64]) -> u64 {
    let (hi, lo) = match kind {
        WatcherKind::Char => {
            let mut bytes = [0u8; 8];
            for (b, s) in bytes.iter_mut().zip(head) {
                *b = *s as u8;
            }
            let hi = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let lo = u32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            (hi, lo)
        }
        WatcherKind::U32 => (head[0] as u32, head[1] as u32),
        WatcherKind::I32 => ((head[0] as i32) as u32, (head[1] as i32) as u32),
        WatcherKind::F32 => ((head[0] as f32).to_bits(), (head[1] as f32).to_bits()),
        WatcherKind::F64 => {
            let bits = head[0].to_bits();
            ((bits >> 32) as u32, bits as u32)
        }
    };
    (u64::from(hi) << 32) | u64::from(lo)
}

/// Encode a timestamp into the head elements of a buffer, the inverse of
/// [`decode`]'s timestamp extraction. Used by the mock host and tests.
pub fn encode_timestamp(kind: WatcherKind, timestamp: u64) -> Vec<f64> {
    let hi = (timestamp >> 32) as u32;
    let lo = timestamp as u32;
    match kind {
        WatcherKind::Char => {
            let mut head = Vec::with_capacity(8);
            head.extend(hi.to_ne_bytes().iter().map(|b| f64::from(*b)));
            head.extend(lo.to_ne_bytes().iter().map(|b| f64::from(*b)));
            head
        }
        WatcherKind::U32 => vec![f64::from(hi), f64::from(lo)],
        WatcherKind::I32 => vec![f64::from(hi as i32), f64::from(lo as i32)],
        WatcherKind::F32 => vec![
            f64::from(f32::from_bits(hi)),
            f64::from(f32::from_bits(lo)),
        ],
        WatcherKind::F64 => vec![f64::from_bits(timestamp)],
    }
}

/// Decode a raw buffer: strip the timestamp words and classify the
/// payload. Returns `None` when the buffer is too short to carry a
/// timestamp.
pub fn decode(kind: WatcherKind, samples: &[f64]) -> Option<Classified> {
    let ts_len = kind.timestamp_len();
    if samples.len() < ts_len {
        return None;
    }
    let timestamp = reconstruct_timestamp(kind, &samples[..ts_len]);
    let payload = &samples[ts_len..];
    if payload.len() == 1 {
        Some(Classified::Monitor {
            timestamp,
            value: payload[0],
        })
    } else {
        Some(Classified::Trace {
            timestamp,
            samples: payload.to_vec(),
        })
    }
}

/// Compute the draw opacity for a trace buffer, or `None` when the
/// buffer is stale and must be skipped.
///
/// Buffers younger than [`FADE_START_MS`] draw fully opaque; between
/// 1000 and 2000 ms of age the opacity fades linearly to transparent.
pub fn fade_alpha(now_ms: f64, buffer_ts_ms: f64) -> Option<f32> {
    if now_ms - STALE_AFTER_MS > buffer_ts_ms {
        return None;
    }
    let alpha = 1.0 - (now_ms - FADE_START_MS - buffer_ts_ms) / FADE_START_MS;
    Some(alpha.clamp(0.0, 1.0) as f32)
}

/// Per-channel memory of the last seen element kind, covering hosts that
/// omit the type tag on buffers.
///
/// The first time the fallback is exercised the compat flag latches
/// permanently: from then on the kinds recorded from list responses are
/// kept per channel index and reused for untagged buffers.
#[derive(Debug, Default)]
pub struct KindMemory {
    last_kinds: Vec<Option<WatcherKind>>,
    compat_mode: bool,
}

impl KindMemory {
    /// Create an empty kind memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the backward-compatibility fallback has been exercised
    pub fn compat_mode(&self) -> bool {
        self.compat_mode
    }

    /// Record the kind reported for a channel index (from a list response)
    pub fn record(&mut self, index: usize, kind: Option<WatcherKind>) {
        if self.last_kinds.len() <= index {
            self.last_kinds.resize(index + 1, None);
        }
        self.last_kinds[index] = kind;
    }

    /// Resolve the kind for a buffer at `index` with wire code `code`.
    ///
    /// A missing code falls back to the last recorded kind for the
    /// channel and latches compat mode. An unknown code is logged and
    /// yields `None`; the caller skips the buffer.
    pub fn resolve(&mut self, index: usize, code: Option<char>) -> Option<WatcherKind> {
        match code {
            Some(c) => match WatcherKind::from_code(c) {
                Some(kind) => {
                    self.record(index, Some(kind));
                    Some(kind)
                }
                None => {
                    tracing::warn!("Unknown buffer type {:?} at channel {}", c, index);
                    None
                }
            },
            None => {
                self.compat_mode = true;
                self.last_kinds.get(index).copied().flatten()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: u64 = 5 * (1u64 << 32) + 7;

    #[test]
    fn test_timestamp_u32() {
        // first two raw elements are [hi, lo]
        let samples = [5.0, 7.0, 0.25, 0.5, 0.75];
        match decode(WatcherKind::U32, &samples).unwrap() {
            Classified::Trace { timestamp, samples } => {
                assert_eq!(timestamp, TS);
                assert_eq!(samples, vec![0.25, 0.5, 0.75]);
            }
            other => panic!("expected trace, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_i32() {
        let samples = [5.0, 7.0, 0.0, 0.0];
        match decode(WatcherKind::I32, &samples).unwrap() {
            Classified::Trace { timestamp, .. } => assert_eq!(timestamp, TS),
            other => panic!("expected trace, got {:?}", other),
        }
        // negative elements reinterpret, not saturate
        let neg = [-1.0, 0.0, 0.0, 0.0];
        match decode(WatcherKind::I32, &neg).unwrap() {
            Classified::Trace { timestamp, .. } => {
                assert_eq!(timestamp, 0xFFFF_FFFF_0000_0000);
            }
            other => panic!("expected trace, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_f32_bit_patterns() {
        let samples = [
            f64::from(f32::from_bits(5)),
            f64::from(f32::from_bits(7)),
            0.0,
            0.0,
        ];
        match decode(WatcherKind::F32, &samples).unwrap() {
            Classified::Trace { timestamp, .. } => assert_eq!(timestamp, TS),
            other => panic!("expected trace, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_f64_halves() {
        // reinterpreting the f64 bit pattern as two 32-bit halves and
        // combining equals hi * 2^32 + lo
        let samples = [f64::from_bits(TS), 0.0, 0.0];
        match decode(WatcherKind::F64, &samples).unwrap() {
            Classified::Trace { timestamp, .. } => assert_eq!(timestamp, TS),
            other => panic!("expected trace, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_char_bytes() {
        let mut samples = encode_timestamp(WatcherKind::Char, TS);
        samples.extend([0.1, 0.2]);
        match decode(WatcherKind::Char, &samples).unwrap() {
            Classified::Trace { timestamp, samples } => {
                assert_eq!(timestamp, TS);
                assert_eq!(samples.len(), 2);
            }
            other => panic!("expected trace, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for kind in [
            WatcherKind::Char,
            WatcherKind::U32,
            WatcherKind::I32,
            WatcherKind::F32,
            WatcherKind::F64,
        ] {
            let mut samples = encode_timestamp(kind, TS);
            samples.extend([0.0, 1.0]);
            match decode(kind, &samples).unwrap() {
                Classified::Trace { timestamp, .. } => {
                    assert_eq!(timestamp, TS, "kind {:?}", kind)
                }
                other => panic!("expected trace for {:?}, got {:?}", kind, other),
            }
        }
    }

    #[test]
    fn test_monitor_classification_every_kind() {
        // a payload of exactly one sample is a monitor event for every kind
        for kind in [
            WatcherKind::Char,
            WatcherKind::U32,
            WatcherKind::I32,
            WatcherKind::F32,
            WatcherKind::F64,
        ] {
            let mut samples = encode_timestamp(kind, 42);
            samples.push(3.0);
            match decode(kind, &samples).unwrap() {
                Classified::Monitor { timestamp, value } => {
                    assert_eq!(timestamp, 42);
                    assert_eq!(value, 3.0);
                }
                other => panic!("expected monitor for {:?}, got {:?}", kind, other),
            }
        }
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert_eq!(decode(WatcherKind::U32, &[1.0]), None);
        assert_eq!(decode(WatcherKind::Char, &[1.0; 7]), None);
    }

    #[test]
    fn test_empty_payload_is_trace() {
        // zero payload samples still classifies as a (degenerate) trace
        let samples = encode_timestamp(WatcherKind::F64, 1);
        match decode(WatcherKind::F64, &samples).unwrap() {
            Classified::Trace { samples, .. } => assert!(samples.is_empty()),
            other => panic!("expected trace, got {:?}", other),
        }
    }

    #[test]
    fn test_staleness_gating() {
        let now = 10_000.0;
        assert_eq!(fade_alpha(now, now - 2500.0), None);
        assert_eq!(fade_alpha(now, now - 500.0), Some(1.0));
        // between 1000 and 2000 units old the fade is linear
        let alpha = fade_alpha(now, now - 1500.0).unwrap();
        assert!((alpha - 0.5).abs() < 1e-6);
        assert_eq!(fade_alpha(now, now - 2000.0), Some(0.0));
    }

    #[test]
    fn test_kind_memory_fallback_latches_compat() {
        let mut mem = KindMemory::new();
        assert!(!mem.compat_mode());

        // tagged buffer records its kind
        assert_eq!(mem.resolve(0, Some('f')), Some(WatcherKind::F32));
        assert!(!mem.compat_mode());

        // untagged buffer reuses the recorded kind and latches compat
        assert_eq!(mem.resolve(0, None), Some(WatcherKind::F32));
        assert!(mem.compat_mode());

        // untagged buffer on an unseen channel has nothing to fall back to
        assert_eq!(mem.resolve(3, None), None);
    }

    #[test]
    fn test_kind_memory_unknown_code_skips() {
        let mut mem = KindMemory::new();
        assert_eq!(mem.resolve(0, Some('z')), None);
    }
}
