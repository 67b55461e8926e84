use std::io;
use thiserror::Error;

use crate::packet::PacketKind;

/// The primary error type for the `cyclops-lib` library.
///
/// Protocol errors are recoverable: the engine reports them as
/// diagnostics and keeps parsing. Only transport failures from the
/// host-side handle are terminal for their operation.
#[derive(Error, Debug)]
pub enum CyclopsError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unknown {kind:?} command code {code:#04x}")]
    UnknownCommand { kind: PacketKind, code: u8 },

    #[error("channel {0} outside the supported set")]
    InvalidChannel(u8),

    #[error("mutation rejected: {0}")]
    RejectedMutation(String),

    #[error("partial frame abandoned with {buffered} bytes buffered")]
    StalledFrame { buffered: usize },

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error("insufficient data: expected {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },
}
