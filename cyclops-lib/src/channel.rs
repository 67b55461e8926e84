use crate::error::CyclopsError;
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The protocol addresses channels with a 2-bit field, so a device can
/// expose at most four.
pub const MAX_CHANNELS: usize = 4;

/// Power-on update period, in device timer microseconds.
pub const DEFAULT_TIME_PERIOD_US: u32 = 1000;

/// Playback behavior of a channel's source. Set exclusively as a side
/// effect of a `change_source_*` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    #[default]
    #[strum(to_string = "LOOPBACK")]
    Loopback,
    #[strum(to_string = "ONE_SHOT")]
    OneShot,
    #[strum(to_string = "N_SHOT")]
    NShot,
}

/// Current configuration of one output channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelState {
    /// Id of the active source.
    pub src_id: u8,
    pub mode: Mode,
    /// Repeat count, meaningful only in N_SHOT mode.
    pub shot_cycle: u8,
    /// Update period in device timer microseconds.
    pub time_period_us: u32,
    /// Cumulative hold-time scale factor.
    pub time_factor: f32,
    /// DC offset added to the output voltage, in millivolts.
    pub voltage_offset_mv: u16,
    pub square_on_us: u32,
    pub square_off_us: u32,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            src_id: 0,
            mode: Mode::Loopback,
            shot_cycle: 0,
            time_period_us: DEFAULT_TIME_PERIOD_US,
            time_factor: 1.0,
            voltage_offset_mv: 0,
            square_on_us: 0,
            square_off_us: 0,
        }
    }
}

/// One total write against a channel's state. A mutation either updates
/// every targeted field or is rejected in entirety.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateMutation {
    SetSource {
        src_id: u8,
        mode: Mode,
        shot_cycle: u8,
    },
    SetTimePeriod(u32),
    ScaleTimeFactor(f32),
    SetVoltageOffset(u16),
    SetSquareOnTime(u32),
    SetSquareOffTime(u32),
}

impl StateMutation {
    /// Domain checks. Runs before any field is touched, so a failing
    /// mutation leaves the channel exactly as it was.
    pub fn validate(&self) -> Result<(), CyclopsError> {
        match *self {
            StateMutation::ScaleTimeFactor(factor) if !(factor.is_finite() && factor > 0.0) => {
                Err(CyclopsError::RejectedMutation(format!(
                    "time factor {factor} outside (0, inf)"
                )))
            }
            StateMutation::SetVoltageOffset(0) => Err(CyclopsError::RejectedMutation(
                "voltage offset must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Holds the current configuration of every populated channel. The
/// dispatcher is the sole writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRegistry {
    channels: Vec<ChannelState>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(MAX_CHANNELS)
    }
}

impl ChannelRegistry {
    /// `count` is the number of populated channels, `1..=MAX_CHANNELS`.
    ///
    /// # Panics
    /// Panics if `count` is zero or larger than the protocol's 2-bit
    /// address space allows.
    pub fn new(count: usize) -> Self {
        assert!(
            (1..=MAX_CHANNELS).contains(&count),
            "channel count out of range"
        );
        Self {
            channels: vec![ChannelState::default(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Read-only snapshot of one channel's state.
    pub fn get(&self, channel: u8) -> Result<&ChannelState, CyclopsError> {
        self.channels
            .get(channel as usize)
            .ok_or(CyclopsError::InvalidChannel(channel))
    }

    pub fn ensure_channel(&self, channel: u8) -> Result<(), CyclopsError> {
        self.get(channel).map(|_| ())
    }

    /// Apply one total mutation to the addressed channel.
    pub fn apply(&mut self, channel: u8, mutation: StateMutation) -> Result<(), CyclopsError> {
        mutation.validate()?;
        let state = self
            .channels
            .get_mut(channel as usize)
            .ok_or(CyclopsError::InvalidChannel(channel))?;
        match mutation {
            StateMutation::SetSource {
                src_id,
                mode,
                shot_cycle,
            } => {
                state.src_id = src_id;
                state.mode = mode;
                state.shot_cycle = shot_cycle;
            }
            StateMutation::SetTimePeriod(period_us) => state.time_period_us = period_us,
            StateMutation::ScaleTimeFactor(factor) => state.time_factor *= factor,
            StateMutation::SetVoltageOffset(offset_mv) => state.voltage_offset_mv = offset_mv,
            StateMutation::SetSquareOnTime(on_us) => state.square_on_us = on_us,
            StateMutation::SetSquareOffTime(off_us) => state.square_off_us = off_us,
        }
        Ok(())
    }

    /// Exchange the full state of two channels.
    pub fn swap_channels(&mut self, first: u8, second: u8) -> Result<(), CyclopsError> {
        self.ensure_channel(first)?;
        self.ensure_channel(second)?;
        self.channels.swap(first as usize, second as usize);
        Ok(())
    }
}
