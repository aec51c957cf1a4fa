//! Link abstraction between the protocol code and the hardware.
//!
//! The protocol layer only sees two narrow traits:
//!
//! - [`LineSource`]: blocking line reads from the sensor board (serial).
//! - [`Transport`]: one logical packet per `send`, non-blocking `receive`.
//!
//! [`HalfDuplexLink`] implements [`Transport`] on top of any [`RadioDriver`],
//! taking care of the listen/transmit toggling and of splitting payloads that
//! do not fit one radio frame.
//!
//! # Chunking
//!
//! Payloads shorter than the transmission unit go out as a single bare frame.
//! Anything longer is cut into segments of `unit - 1` bytes, each prefixed with
//! one marker byte: [`SEGMENT_START`], [`SEGMENT_MORE`] or [`SEGMENT_END`].
//! Telemetry lines never begin with a control byte, so a bare frame is never
//! mistaken for part of a segmented payload. If a segment is lost the receiver
//! drops the partial payload at the next start or bare frame. If a segment fails
//! to send, a [`CHUNK_ABORT`] frame tells the receiver to drop it at once.

pub mod loopback;
pub mod stream;

pub use loopback::LoopbackRadio;
pub use stream::StreamLineSource;

use crate::error::TransportError;
use std::thread;
use std::time::Duration;

/// Largest frame the radio carries in one transmission (nRF24 payload).
pub const RADIO_PAYLOAD_SIZE: usize = 32;
/// Pause between the chunks of one segmented payload.
pub const INTER_CHUNK_DELAY: Duration = Duration::from_millis(5);
/// Marker of the first segment of a payload (ASCII SOH).
pub const SEGMENT_START: u8 = 0x01;
/// Marker of a middle segment (ASCII STX).
pub const SEGMENT_MORE: u8 = 0x02;
/// Marker of the segment that completes a payload (ASCII EOT).
pub const SEGMENT_END: u8 = 0x04;
/// Frame that discards a partially sent payload (ASCII CAN).
pub const CHUNK_ABORT: &[u8] = &[0x18];
/// Upper bound for a reassembled payload; longer input is discarded.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Source of newline-delimited sensor frames.
pub trait LineSource {
    /// Waits for the next line, up to the source's own timeout.
    ///
    /// - `Ok(Some(line))`: a complete line, without its terminator.
    /// - `Ok(None)`: nothing arrived in time; try again.
    /// - `Err(_)`: the connection is gone.
    fn read_line(&mut self) -> Result<Option<String>, TransportError>;
}

/// Packet-level access to the radio link.
pub trait Transport {
    /// Sends one logical packet. Returns `false` if the radio reported a
    /// failure; there is no acknowledgement from the far end either way.
    fn send(&mut self, payload: &[u8]) -> bool;

    /// Returns the next complete inbound payload, if any, without blocking.
    fn receive(&mut self) -> Option<Vec<u8>>;
}

/// Frame-level radio driver. Implemented per deployment target.
pub trait RadioDriver {
    fn start_listening(&mut self);
    fn stop_listening(&mut self);
    /// Transmits a single frame of at most the payload size.
    fn write_frame(&mut self, frame: &[u8]) -> bool;
    /// Next received frame, if one is waiting.
    fn read_frame(&mut self) -> Option<Vec<u8>>;
}

fn is_marker(byte: u8) -> bool {
    matches!(byte, SEGMENT_START | SEGMENT_MORE | SEGMENT_END) || byte == CHUNK_ABORT[0]
}

/// Splits `payload` into the frames that carry it over a radio of `unit`
/// bytes per frame.
pub fn segment(payload: &[u8], unit: usize) -> Vec<Vec<u8>> {
    let unit = unit.max(2);
    let bare = payload.len() < unit && payload.first().is_none_or(|b| !is_marker(*b));
    if bare {
        return vec![payload.to_vec()];
    }

    let bodies: Vec<&[u8]> = payload.chunks(unit - 1).collect();
    let mut frames = Vec::with_capacity(bodies.len() + 1);
    for (i, body) in bodies.iter().enumerate() {
        let marker = if i == 0 {
            SEGMENT_START
        } else if i + 1 == bodies.len() {
            SEGMENT_END
        } else {
            SEGMENT_MORE
        };
        let mut frame = Vec::with_capacity(body.len() + 1);
        frame.push(marker);
        frame.extend_from_slice(body);
        frames.push(frame);
    }
    if frames.len() == 1 {
        frames.push(vec![SEGMENT_END]);
    }
    frames
}

/// Receive-side state for segmented payloads.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    pending: Vec<u8>,
    in_progress: bool,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one frame; returns a payload once one is complete.
    pub fn accept(&mut self, frame: Vec<u8>) -> Option<Vec<u8>> {
        let Some(&first) = frame.first() else {
            return None;
        };
        if frame == CHUNK_ABORT {
            self.discard("aborted");
            return None;
        }
        match first {
            SEGMENT_START => {
                self.discard("incomplete");
                self.in_progress = true;
                self.extend(&frame[1..]);
                None
            }
            SEGMENT_MORE | SEGMENT_END => {
                if !self.in_progress {
                    log::warn!("Dropping segment of a payload whose start was lost");
                    return None;
                }
                self.extend(&frame[1..]);
                if first == SEGMENT_END && self.in_progress {
                    self.in_progress = false;
                    return Some(core::mem::take(&mut self.pending));
                }
                None
            }
            _ => {
                self.discard("incomplete");
                Some(frame)
            }
        }
    }

    fn extend(&mut self, body: &[u8]) {
        if self.pending.len() + body.len() > MAX_MESSAGE_LEN {
            log::warn!(
                "Segmented payload exceeds {} bytes, discarding",
                MAX_MESSAGE_LEN
            );
            self.pending.clear();
            self.in_progress = false;
            return;
        }
        self.pending.extend_from_slice(body);
    }

    fn discard(&mut self, reason: &str) {
        if self.in_progress {
            log::warn!(
                "Discarding {} bytes of {} payload",
                self.pending.len(),
                reason
            );
        }
        self.pending.clear();
        self.in_progress = false;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// [`Transport`] over a half-duplex radio.
///
/// The radio listens whenever it is not transmitting. Because `send` and
/// `receive` both take `&mut self`, whoever owns the link can never overlap
/// the two directions.
pub struct HalfDuplexLink<R: RadioDriver> {
    radio: R,
    unit: usize,
    inter_chunk_delay: Duration,
    assembler: ChunkAssembler,
}

impl<R: RadioDriver> HalfDuplexLink<R> {
    pub fn new(mut radio: R, unit: usize, inter_chunk_delay: Duration) -> Self {
        radio.start_listening();
        Self {
            radio,
            unit: unit.max(2),
            inter_chunk_delay,
            assembler: ChunkAssembler::new(),
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    fn transmit(&mut self, payload: &[u8]) -> bool {
        let frames = segment(payload, self.unit);
        let count = frames.len();
        for (i, frame) in frames.iter().enumerate() {
            if !self.radio.write_frame(frame) {
                if count > 1 {
                    self.radio.write_frame(CHUNK_ABORT);
                }
                return false;
            }
            if i + 1 < count {
                thread::sleep(self.inter_chunk_delay);
            }
        }
        true
    }
}

impl<R: RadioDriver> Transport for HalfDuplexLink<R> {
    fn send(&mut self, payload: &[u8]) -> bool {
        self.radio.stop_listening();
        let delivered = self.transmit(payload);
        self.radio.start_listening();
        delivered
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        while let Some(frame) = self.radio.read_frame() {
            if let Some(payload) = self.assembler.accept(frame) {
                return Some(payload);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(radio: LoopbackRadio) -> HalfDuplexLink<LoopbackRadio> {
        HalfDuplexLink::new(radio, 8, Duration::ZERO)
    }

    #[test]
    fn test_short_payload_is_one_frame() {
        let (a, b) = LoopbackRadio::pair();
        let mut tx = link(a);
        let mut rx = link(b);
        assert!(tx.send(b"01,1,2"));
        assert_eq!(tx.radio().sent_frames(), vec![b"01,1,2".to_vec()]);
        assert_eq!(rx.receive(), Some(b"01,1,2".to_vec()));
        assert_eq!(rx.receive(), None);
    }

    #[test]
    fn test_long_payload_is_segmented_and_reassembled() {
        let (a, b) = LoopbackRadio::pair();
        let mut tx = link(a);
        let mut rx = link(b);
        let payload = b"01,1023,25.0,101.3,150.2";
        assert!(tx.send(payload));

        let frames = tx.radio().sent_frames();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.len() <= 8));
        assert_eq!(frames[0], b"\x0101,1023");
        assert_eq!(frames[1][0], SEGMENT_MORE);
        assert_eq!(frames[3], b"\x040.2");
        assert_eq!(rx.receive(), Some(payload.to_vec()));
    }

    #[test]
    fn test_exact_unit_payload_is_segmented() {
        let (a, b) = LoopbackRadio::pair();
        let mut tx = link(a);
        let mut rx = link(b);
        assert!(tx.send(b"01,2,3,4"));
        assert_eq!(
            tx.radio().sent_frames(),
            vec![b"\x0101,2,3,".to_vec(), b"\x044".to_vec()]
        );
        assert_eq!(rx.receive(), Some(b"01,2,3,4".to_vec()));
    }

    #[test]
    fn test_short_payload_starting_with_marker_is_segmented() {
        let frames = segment(b"\x04ab", 8);
        assert_eq!(frames, vec![b"\x01\x04ab".to_vec(), vec![SEGMENT_END]]);

        let mut assembler = ChunkAssembler::new();
        assert_eq!(assembler.accept(frames[0].clone()), None);
        assert_eq!(assembler.accept(frames[1].clone()), Some(b"\x04ab".to_vec()));
    }

    #[test]
    fn test_failed_chunk_aborts_payload() {
        let (a, b) = LoopbackRadio::pair();
        let mut tx = link(a);
        let mut rx = link(b);
        tx.radio().fail_nth_write(2);
        assert!(!tx.send(b"01,1023,25.0,101.3"));
        assert_eq!(tx.radio().sent_frames().last(), Some(&CHUNK_ABORT.to_vec()));
        assert_eq!(rx.receive(), None);

        assert!(tx.send(b"02,1"));
        assert_eq!(rx.receive(), Some(b"02,1".to_vec()));
    }

    #[test]
    fn test_link_listens_between_sends() {
        let (a, _b) = LoopbackRadio::pair();
        let mut tx = link(a);
        assert!(tx.radio().is_listening());
        tx.send(b"01,1");
        assert!(tx.radio().is_listening());
    }

    #[test]
    fn test_lost_end_segment_does_not_swallow_later_packets() {
        let mut assembler = ChunkAssembler::new();
        let frames = segment(b"01,1023,25.0", 8);
        assert_eq!(frames.len(), 2);
        assert_eq!(assembler.accept(frames[0].clone()), None);
        // frames[1] never arrives

        assert_eq!(assembler.accept(b"02,1".to_vec()), Some(b"02,1".to_vec()));
        assert_eq!(assembler.pending_len(), 0);
        assert_eq!(assembler.accept(b"03,2".to_vec()), Some(b"03,2".to_vec()));
    }

    #[test]
    fn test_lost_start_segment_drops_orphans() {
        let mut assembler = ChunkAssembler::new();
        let frames = segment(b"01,1023,25.0,101.3", 8);
        assert_eq!(frames.len(), 3);
        assert_eq!(assembler.accept(frames[1].clone()), None);
        assert_eq!(assembler.accept(frames[2].clone()), None);
        assert_eq!(assembler.pending_len(), 0);

        for frame in segment(b"04,45.0,-93.0", 8) {
            if let Some(payload) = assembler.accept(frame) {
                assert_eq!(payload, b"04,45.0,-93.0");
                return;
            }
        }
        panic!("segmented payload after orphans was not delivered");
    }

    #[test]
    fn test_new_start_replaces_incomplete_payload() {
        let mut assembler = ChunkAssembler::new();
        assert_eq!(assembler.accept(b"\x01stale".to_vec()), None);
        assert_eq!(assembler.accept(b"\x01fresh".to_vec()), None);
        assert_eq!(assembler.accept(b"\x04!".to_vec()), Some(b"fresh!".to_vec()));
    }

    #[test]
    fn test_assembler_ignores_stray_end_and_abort() {
        let mut assembler = ChunkAssembler::new();
        assert_eq!(assembler.accept(vec![SEGMENT_END]), None);
        assert_eq!(assembler.accept(CHUNK_ABORT.to_vec()), None);
        assert_eq!(assembler.accept(Vec::new()), None);
        assert_eq!(assembler.accept(b"05,7".to_vec()), Some(b"05,7".to_vec()));
    }
}
