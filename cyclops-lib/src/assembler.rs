use crate::constants::SINGLE_PACKET_MARKER;
use crate::error::CyclopsError;
use crate::packet::{RawPacket, frame_len};
use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

/// Result of feeding one byte to the assembler.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStep {
    /// The current frame needs more bytes.
    Incomplete,
    /// A frame completed with this byte.
    Complete(RawPacket),
}

/// Resumable frame assembler for the serial byte stream.
///
/// Bytes are buffered until the frame classified from the first byte is
/// complete; the caller drives it one byte at a time and may stop and
/// resume at any point. The stream carries no length prefix, checksum
/// or resync marker, so after an unsizable frame (unknown command code)
/// or an externally abandoned one, recovery is lossy: bytes are skipped
/// until one with the marker bit set arrives and is taken as a
/// candidate single-byte packet start.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: BytesMut,
    expected: usize,
    resyncing: bool,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Errors leave the assembler resynchronizing but
    /// otherwise ready for more input.
    pub fn feed(&mut self, byte: u8) -> Result<FrameStep, CyclopsError> {
        if self.resyncing {
            if byte & SINGLE_PACKET_MARKER == 0 {
                trace!("resync: skipping byte {byte:#04x}");
                return Ok(FrameStep::Incomplete);
            }
            debug!("resync: taking {byte:#04x} as a candidate frame start");
            self.resyncing = false;
        }

        if self.buf.is_empty() {
            match frame_len(byte) {
                Ok((_, len)) => self.expected = len,
                Err(err) => {
                    self.resyncing = true;
                    return Err(err);
                }
            }
        }

        self.buf.put_u8(byte);
        if self.buf.len() < self.expected {
            return Ok(FrameStep::Incomplete);
        }

        let frame = self.buf.split().freeze();
        self.expected = 0;
        Ok(FrameStep::Complete(RawPacket::try_from(frame)?))
    }

    /// Abandon the in-progress frame (the transport's stalled-frame
    /// signal). Returns how many bytes were discarded; if any were, the
    /// assembler resynchronizes before accepting the next frame.
    pub fn abandon(&mut self) -> usize {
        let buffered = self.buf.len();
        self.buf.clear();
        self.expected = 0;
        if buffered > 0 {
            debug!(buffered, "abandoning partial frame");
            self.resyncing = true;
        }
        buffered
    }

    /// Bytes buffered for the in-progress frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn is_resyncing(&self) -> bool {
        self.resyncing
    }
}
