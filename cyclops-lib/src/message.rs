use crate::channel::Mode;
use crate::error::CyclopsError;
use crate::packet::{
    MultiCommand, MultiHeader, PacketKind, RawPacket, SingleCommand, SingleHeader,
};
use bytes::Bytes;
use zerocopy::byteorder::little_endian::{F32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// The two channels addressed by a `swap` command.
///
/// The single-byte header's 4-bit channel field packs two 2-bit channel
/// ids, high pair first: `first = (nibble >> 2) & 0b11`,
/// `second = nibble & 0b11`. This is the device integration convention;
/// a device with a different contract changes only this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapPair {
    pub first: u8,
    pub second: u8,
}

impl SwapPair {
    pub fn from_nibble(nibble: u8) -> Self {
        Self {
            first: (nibble >> 2) & 0b11,
            second: nibble & 0b11,
        }
    }

    pub fn to_nibble(self) -> u8 {
        ((self.first & 0b11) << 2) | (self.second & 0b11)
    }
}

// Argument payloads as they appear on the wire (little-endian).

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct SourceArgs {
    src_id: u8,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct NShotArgs {
    src_id: u8,
    shot_cycle: u8,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct WordArgs {
    value: U32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct FactorArgs {
    factor: F32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct OffsetArgs {
    offset_mv: U16,
}

/// A fully decoded RPC command, one variant per protocol command.
///
/// Unknown codes never reach this type; they fail at header decode with
/// an explicit error rather than falling through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Resume the device main control loop.
    Start,
    /// Pause the main control loop; channel state is preserved.
    Stop,
    /// Reinitialize all sources to their pre-configured defaults. Does
    /// not restore the initial configuration.
    Reset,
    /// Exchange the full state of two channels.
    Swap(SwapPair),
    /// Ask the device to emit its descriptor string.
    Identity,
    SourceLoopback { channel: u8, src_id: u8 },
    SourceOneShot { channel: u8, src_id: u8 },
    SourceNShot { channel: u8, src_id: u8, shot_cycle: u8 },
    TimePeriod { channel: u8, period_us: u32 },
    TimeFactor { channel: u8, factor: f32 },
    VoltageOffset { channel: u8, offset_mv: u16 },
    SquareOnTime { channel: u8, on_us: u32 },
    SquareOffTime { channel: u8, off_us: u32 },
}

fn bad_args(command: MultiCommand, args: &Bytes) -> CyclopsError {
    CyclopsError::InvalidPacket(format!(
        "{command:?} argument payload has {} bytes",
        args.len()
    ))
}

impl TryFrom<RawPacket> for Command {
    type Error = CyclopsError;

    fn try_from(raw: RawPacket) -> Result<Self, Self::Error> {
        match raw {
            RawPacket::Single { header } => {
                let code = header.command();
                let command =
                    SingleCommand::try_from(code).map_err(|_| CyclopsError::UnknownCommand {
                        kind: PacketKind::Single,
                        code,
                    })?;
                Ok(match command {
                    SingleCommand::Start => Command::Start,
                    SingleCommand::Stop => Command::Stop,
                    SingleCommand::Reset => Command::Reset,
                    SingleCommand::Swap => Command::Swap(SwapPair::from_nibble(header.channel())),
                    SingleCommand::Identity => Command::Identity,
                })
            }
            RawPacket::Multi { header, args } => {
                let code = header.command();
                let command =
                    MultiCommand::try_from(code).map_err(|_| CyclopsError::UnknownCommand {
                        kind: PacketKind::Multi,
                        code,
                    })?;
                let channel = header.channel();
                Ok(match command {
                    MultiCommand::ChangeSourceLoop => {
                        let a = SourceArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::SourceLoopback {
                            channel,
                            src_id: a.src_id,
                        }
                    }
                    MultiCommand::ChangeSourceOneShot => {
                        let a = SourceArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::SourceOneShot {
                            channel,
                            src_id: a.src_id,
                        }
                    }
                    MultiCommand::ChangeSourceNShot => {
                        let a = NShotArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::SourceNShot {
                            channel,
                            src_id: a.src_id,
                            shot_cycle: a.shot_cycle,
                        }
                    }
                    MultiCommand::ChangeTimePeriod => {
                        let a = WordArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::TimePeriod {
                            channel,
                            period_us: a.value.get(),
                        }
                    }
                    MultiCommand::TimeFactor => {
                        let a = FactorArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::TimeFactor {
                            channel,
                            factor: a.factor.get(),
                        }
                    }
                    MultiCommand::VoltageOffset => {
                        let a = OffsetArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::VoltageOffset {
                            channel,
                            offset_mv: a.offset_mv.get(),
                        }
                    }
                    MultiCommand::SquareOnTime => {
                        let a = WordArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::SquareOnTime {
                            channel,
                            on_us: a.value.get(),
                        }
                    }
                    MultiCommand::SquareOffTime => {
                        let a = WordArgs::read_from_bytes(args.as_ref())
                            .map_err(|_| bad_args(command, &args))?;
                        Command::SquareOffTime {
                            channel,
                            off_us: a.value.get(),
                        }
                    }
                })
            }
        }
    }
}

impl Command {
    /// The channel a multi-byte command addresses, if any.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Command::SourceLoopback { channel, .. }
            | Command::SourceOneShot { channel, .. }
            | Command::SourceNShot { channel, .. }
            | Command::TimePeriod { channel, .. }
            | Command::TimeFactor { channel, .. }
            | Command::VoltageOffset { channel, .. }
            | Command::SquareOnTime { channel, .. }
            | Command::SquareOffTime { channel, .. } => Some(channel),
            _ => None,
        }
    }

    /// The playback mode a `change_source_*` command selects, if any.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Command::SourceLoopback { .. } => Some(Mode::Loopback),
            Command::SourceOneShot { .. } => Some(Mode::OneShot),
            Command::SourceNShot { .. } => Some(Mode::NShot),
            _ => None,
        }
    }

    /// Encode this command as a raw packet with the exact wire layout.
    pub fn to_raw_packet(self) -> RawPacket {
        match self {
            Command::Start => single(SingleCommand::Start, 0),
            Command::Stop => single(SingleCommand::Stop, 0),
            Command::Reset => single(SingleCommand::Reset, 0),
            Command::Swap(pair) => single(SingleCommand::Swap, pair.to_nibble()),
            Command::Identity => single(SingleCommand::Identity, 0),
            Command::SourceLoopback { channel, src_id } => multi(
                MultiCommand::ChangeSourceLoop,
                channel,
                SourceArgs { src_id }.as_bytes(),
            ),
            Command::SourceOneShot { channel, src_id } => multi(
                MultiCommand::ChangeSourceOneShot,
                channel,
                SourceArgs { src_id }.as_bytes(),
            ),
            Command::SourceNShot {
                channel,
                src_id,
                shot_cycle,
            } => multi(
                MultiCommand::ChangeSourceNShot,
                channel,
                NShotArgs { src_id, shot_cycle }.as_bytes(),
            ),
            Command::TimePeriod { channel, period_us } => multi(
                MultiCommand::ChangeTimePeriod,
                channel,
                WordArgs {
                    value: U32::new(period_us),
                }
                .as_bytes(),
            ),
            Command::TimeFactor { channel, factor } => multi(
                MultiCommand::TimeFactor,
                channel,
                FactorArgs {
                    factor: F32::new(factor),
                }
                .as_bytes(),
            ),
            Command::VoltageOffset { channel, offset_mv } => multi(
                MultiCommand::VoltageOffset,
                channel,
                OffsetArgs {
                    offset_mv: U16::new(offset_mv),
                }
                .as_bytes(),
            ),
            Command::SquareOnTime { channel, on_us } => multi(
                MultiCommand::SquareOnTime,
                channel,
                WordArgs {
                    value: U32::new(on_us),
                }
                .as_bytes(),
            ),
            Command::SquareOffTime { channel, off_us } => multi(
                MultiCommand::SquareOffTime,
                channel,
                WordArgs {
                    value: U32::new(off_us),
                }
                .as_bytes(),
            ),
        }
    }

    /// Encode straight to wire bytes.
    pub fn encode(self) -> Bytes {
        self.to_raw_packet().into()
    }
}

fn single(command: SingleCommand, channel: u8) -> RawPacket {
    RawPacket::Single {
        header: SingleHeader::new()
            .with_marker(true)
            .with_channel(channel & 0x0F)
            .with_command(command.into()),
    }
}

fn multi(command: MultiCommand, channel: u8, args: &[u8]) -> RawPacket {
    RawPacket::Multi {
        header: MultiHeader::new()
            .with_marker(false)
            .with_channel(channel & 0b11)
            .with_command(command.into()),
        args: Bytes::copy_from_slice(args),
    }
}
