//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use cyclops_lib::assembler::{FrameAssembler, FrameStep};
#[allow(unused_imports)]
pub use cyclops_lib::channel::{ChannelRegistry, ChannelState, MAX_CHANNELS, Mode};
#[allow(unused_imports)]
pub use cyclops_lib::dispatch::{Action, DeviceControl, Dispatcher, SourceBank};
#[allow(unused_imports)]
pub use cyclops_lib::engine::{EngineEvent, RpcEngine};
#[allow(unused_imports)]
pub use cyclops_lib::error::CyclopsError;
#[allow(unused_imports)]
pub use cyclops_lib::message::{Command, SwapPair};
#[allow(unused_imports)]
pub use cyclops_lib::packet::{
    MultiCommand, MultiHeader, PacketKind, RawPacket, SingleCommand, SingleHeader, frame_len,
};
#[allow(unused_imports)]
pub use hex;

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

#[allow(dead_code)]
pub const TEST_DESCRIPTOR: &[u8] = b"Cyclops-4ch rev3";

/// Device-control stub that counts the global actions it receives.
#[derive(Debug, Default)]
pub struct RecordingControl {
    pub started: usize,
    pub stopped: usize,
    pub resets: usize,
}

impl DeviceControl for RecordingControl {
    fn start(&mut self) {
        self.started += 1;
    }

    fn stop(&mut self) {
        self.stopped += 1;
    }

    fn reset_all_sources(&mut self) {
        self.resets += 1;
    }

    fn identity(&self) -> &[u8] {
        TEST_DESCRIPTOR
    }
}

/// Source-bank stub that records every accepted operation and refuses
/// time-period changes on channels flagged as having a dynamic hold
/// time.
#[derive(Debug)]
pub struct RecordingBank {
    pub calls: Vec<String>,
    pub constant_hold_time: [bool; MAX_CHANNELS],
}

impl Default for RecordingBank {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            constant_hold_time: [true; MAX_CHANNELS],
        }
    }
}

impl SourceBank for RecordingBank {
    fn set_source(
        &mut self,
        channel: u8,
        src_id: u8,
        mode: Mode,
        shot_cycle: u8,
    ) -> Result<(), CyclopsError> {
        self.calls
            .push(format!("set_source {channel} {src_id} {mode} {shot_cycle}"));
        Ok(())
    }

    fn set_time_period(&mut self, channel: u8, period_us: u32) -> Result<(), CyclopsError> {
        if !self.constant_hold_time[channel as usize] {
            return Err(CyclopsError::RejectedMutation(format!(
                "channel {channel} hold time is not constant"
            )));
        }
        self.calls.push(format!("set_time_period {channel} {period_us}"));
        Ok(())
    }

    fn set_time_factor(&mut self, channel: u8, factor: f32) -> Result<(), CyclopsError> {
        self.calls.push(format!("set_time_factor {channel} {factor}"));
        Ok(())
    }

    fn set_voltage_offset(&mut self, channel: u8, offset_mv: u16) -> Result<(), CyclopsError> {
        self.calls
            .push(format!("set_voltage_offset {channel} {offset_mv}"));
        Ok(())
    }

    fn set_square_on_time(&mut self, channel: u8, on_us: u32) -> Result<(), CyclopsError> {
        self.calls.push(format!("set_square_on_time {channel} {on_us}"));
        Ok(())
    }

    fn set_square_off_time(&mut self, channel: u8, off_us: u32) -> Result<(), CyclopsError> {
        self.calls
            .push(format!("set_square_off_time {channel} {off_us}"));
        Ok(())
    }

    fn swap(&mut self, first: u8, second: u8) -> Result<(), CyclopsError> {
        self.calls.push(format!("swap {first} {second}"));
        Ok(())
    }
}

/// Engine over the recording stubs with all four channels populated.
#[allow(dead_code)]
pub fn test_engine() -> RpcEngine<RecordingControl, RecordingBank> {
    RpcEngine::new(
        RecordingControl::default(),
        RecordingBank::default(),
        ChannelRegistry::default(),
    )
}

#[allow(dead_code)]
pub fn test_engine_with(
    bank: RecordingBank,
    registry: ChannelRegistry,
) -> RpcEngine<RecordingControl, RecordingBank> {
    RpcEngine::new(RecordingControl::default(), bank, registry)
}
