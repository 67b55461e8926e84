// Protocol constants for the Cyclops serial RPC link.
//
// Multi-byte argument fields are little-endian on the wire. Both ends of
// the link are built against this file; the byte order is fixed by the
// protocol, never inferred.

/// Every frame starts with a single header byte.
pub const HEADER_SIZE: usize = 1;

/// Bit 7 of the header byte: set for single-byte packets, clear for
/// multi-byte packets. This bit is the only framing signal.
pub const SINGLE_PACKET_MARKER: u8 = 0x80;

/// 3-bit command field of a single-byte header.
pub const SINGLE_COMMAND_MASK: u8 = 0x07;

/// 5-bit command field of a multi-byte header.
pub const MULTI_COMMAND_MASK: u8 = 0x1F;

/// Largest frame the protocol defines (u32-argument commands).
pub const MAX_FRAME_SIZE: usize = 5;
