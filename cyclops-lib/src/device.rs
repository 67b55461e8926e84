use crate::error::CyclopsError;
use crate::message::Command;
use bytes::Bytes;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BAUD: u32 = 115_200;

// The device answers identity requests within a few milliseconds; this
// bounds how long we wait for the descriptor to stop arriving.
const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// Host-side handle to a Cyclops device on a serial port.
pub struct Cyclops {
    port: Box<dyn SerialPort>,
}

impl Cyclops {
    /// Open the serial port the device is attached to.
    pub fn open(path: &str, baud: u32) -> Result<Self, CyclopsError> {
        info!("opening Cyclops on {path} at {baud} baud");
        let port = serialport::new(path, baud).timeout(REPLY_TIMEOUT).open()?;
        Ok(Self { port })
    }

    /// Encode and send one command frame.
    pub fn send(&mut self, command: Command) -> Result<(), CyclopsError> {
        let frame: Bytes = command.encode();
        self.port.write_all(&frame)?;
        self.port.flush()?;
        debug!("sent {} byte frame {:02x?}", frame.len(), frame.as_ref());
        Ok(())
    }

    /// Request the device descriptor string. Reads until the device
    /// goes quiet for the reply timeout.
    pub fn request_identity(&mut self) -> Result<String, CyclopsError> {
        self.send(Command::Identity)?;
        let mut descriptor = Vec::new();
        let mut chunk = [0u8; 64];
        loop {
            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => descriptor.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::TimedOut => break,
                Err(err) => return Err(err.into()),
            }
        }
        if descriptor.is_empty() {
            return Err(CyclopsError::Protocol(
                "device sent no identity reply".to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&descriptor)
            .trim_end_matches(['\0', '\r', '\n'])
            .to_string())
    }
}
