use crate::constants::{HEADER_SIZE, MULTI_COMMAND_MASK, SINGLE_PACKET_MARKER};
use crate::error::CyclopsError;
use bytes::{BufMut, Bytes, BytesMut};
use modular_bitfield::prelude::*;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Header layout of a single-byte packet. The marker bit (bit 7) is
/// always set; the 4-bit channel field sits above the 3-bit command.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleHeader {
    pub command: B3,
    pub channel: B4,
    pub marker: bool,
}

/// Header layout of a multi-byte packet. The marker bit is always
/// clear; the 2-bit channel field sits above the 5-bit command.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiHeader {
    pub command: B5,
    pub channel: B2,
    pub marker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Single,
    Multi,
}

/// Commands carried by single-byte packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SingleCommand {
    Start = 0b000,
    Stop = 0b001,
    Reset = 0b010,
    Swap = 0b011,
    Identity = 0b111,
}

/// Commands carried by multi-byte packets. Each code maps to a fixed
/// total frame size; the stream carries no length field, so this table
/// is what makes the frames sizable at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MultiCommand {
    ChangeSourceLoop = 0b00000,
    ChangeSourceOneShot = 0b00001,
    ChangeSourceNShot = 0b00010,
    ChangeTimePeriod = 0b00011,
    TimeFactor = 0b00101,
    VoltageOffset = 0b00111,
    SquareOnTime = 0b01000,
    SquareOffTime = 0b01001,
}

impl MultiCommand {
    /// Total frame size in bytes, header included.
    pub fn frame_size(self) -> usize {
        match self {
            MultiCommand::ChangeSourceLoop | MultiCommand::ChangeSourceOneShot => 2,
            MultiCommand::ChangeSourceNShot | MultiCommand::VoltageOffset => 3,
            MultiCommand::ChangeTimePeriod
            | MultiCommand::TimeFactor
            | MultiCommand::SquareOnTime
            | MultiCommand::SquareOffTime => 5,
        }
    }
}

/// Classify the first byte of a frame into its packet kind and total
/// frame length. A single-byte packet is complete with just this byte,
/// regardless of anything that follows. For multi-byte packets the
/// length comes from the command's size table; an unknown code cannot
/// be sized and forces the caller to resynchronize.
pub fn frame_len(first: u8) -> Result<(PacketKind, usize), CyclopsError> {
    if first & SINGLE_PACKET_MARKER != 0 {
        return Ok((PacketKind::Single, 1));
    }
    let code = first & MULTI_COMMAND_MASK;
    let command = MultiCommand::try_from(code).map_err(|_| CyclopsError::UnknownCommand {
        kind: PacketKind::Multi,
        code,
    })?;
    Ok((PacketKind::Multi, command.frame_size()))
}

/// One complete frame, split into its header and argument bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPacket {
    Single { header: SingleHeader },
    Multi { header: MultiHeader, args: Bytes },
}

impl RawPacket {
    pub fn kind(&self) -> PacketKind {
        match self {
            RawPacket::Single { .. } => PacketKind::Single,
            RawPacket::Multi { .. } => PacketKind::Multi,
        }
    }

    /// Raw channel field of the header. Width differs by kind; for
    /// single-byte `swap` packets the field encodes a channel pair.
    pub fn channel(&self) -> u8 {
        match self {
            RawPacket::Single { header } => header.channel(),
            RawPacket::Multi { header, .. } => header.channel(),
        }
    }

    /// Size of the encoded frame in bytes.
    pub fn wire_len(&self) -> usize {
        match self {
            RawPacket::Single { .. } => HEADER_SIZE,
            RawPacket::Multi { args, .. } => HEADER_SIZE + args.len(),
        }
    }
}

impl TryFrom<Bytes> for RawPacket {
    type Error = CyclopsError;

    fn try_from(mut bytes: Bytes) -> Result<Self, Self::Error> {
        let first = *bytes
            .first()
            .ok_or_else(|| CyclopsError::InvalidPacket("empty frame".to_string()))?;
        let (kind, expected) = frame_len(first)?;
        match bytes.len() {
            len if len < expected => {
                return Err(CyclopsError::InsufficientData {
                    expected,
                    actual: len,
                });
            }
            len if len > expected => {
                return Err(CyclopsError::InvalidPacket(format!(
                    "{} trailing bytes after {kind:?} frame",
                    len - expected
                )));
            }
            _ => {}
        }
        let header_byte: [u8; 1] = [bytes.split_to(HEADER_SIZE)[0]];
        match kind {
            PacketKind::Single => Ok(RawPacket::Single {
                header: SingleHeader::from_bytes(header_byte),
            }),
            PacketKind::Multi => Ok(RawPacket::Multi {
                header: MultiHeader::from_bytes(header_byte),
                args: bytes,
            }),
        }
    }
}

impl From<RawPacket> for Bytes {
    fn from(packet: RawPacket) -> Bytes {
        match packet {
            RawPacket::Single { header } => Bytes::copy_from_slice(&header.into_bytes()),
            RawPacket::Multi { header, args } => {
                let mut buf = BytesMut::with_capacity(HEADER_SIZE + args.len());
                buf.put_u8(header.into_bytes()[0]);
                buf.extend_from_slice(&args);
                buf.freeze()
            }
        }
    }
}
