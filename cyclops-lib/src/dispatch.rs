use crate::channel::{ChannelRegistry, Mode, StateMutation};
use crate::error::CyclopsError;
use crate::message::Command;
use bytes::Bytes;
use tracing::debug;

/// Device-global actions invoked by single-byte commands. Implemented
/// by the surrounding application; the engine only routes to it.
pub trait DeviceControl {
    /// Resume the main control loop.
    fn start(&mut self);
    /// Pause the main control loop. Channel state is preserved.
    fn stop(&mut self);
    /// Reinitialize every source to its pre-configured defaults.
    /// Channel assignments and registry state are left alone.
    fn reset_all_sources(&mut self);
    /// Static device descriptor bytes.
    fn identity(&self) -> &[u8];
}

/// Per-channel operations of the signal-source subsystem. Any of these
/// may refuse a change; a refusal rejects the whole mutation before the
/// registry is touched.
pub trait SourceBank {
    fn set_source(
        &mut self,
        channel: u8,
        src_id: u8,
        mode: Mode,
        shot_cycle: u8,
    ) -> Result<(), CyclopsError>;
    /// Fails when the active source's hold time is not constant.
    fn set_time_period(&mut self, channel: u8, period_us: u32) -> Result<(), CyclopsError>;
    fn set_time_factor(&mut self, channel: u8, factor: f32) -> Result<(), CyclopsError>;
    fn set_voltage_offset(&mut self, channel: u8, offset_mv: u16) -> Result<(), CyclopsError>;
    fn set_square_on_time(&mut self, channel: u8, on_us: u32) -> Result<(), CyclopsError>;
    fn set_square_off_time(&mut self, channel: u8, off_us: u32) -> Result<(), CyclopsError>;
    /// Exchange the source assignments of two channels.
    fn swap(&mut self, first: u8, second: u8) -> Result<(), CyclopsError>;
}

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The command's state mutation (or global action) was applied.
    Applied,
    /// The device descriptor, to be written back to the host by the
    /// transport layer. Read-only; no state was mutated.
    Identity(Bytes),
}

/// Routes decoded commands to the channel registry and the collaborator
/// traits. The registry is passed into every call rather than owned, so
/// multiple device instances and test harnesses can coexist.
#[derive(Debug)]
pub struct Dispatcher<C, S> {
    control: C,
    sources: S,
}

impl<C: DeviceControl, S: SourceBank> Dispatcher<C, S> {
    pub fn new(control: C, sources: S) -> Self {
        Self { control, sources }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    pub fn sources(&self) -> &S {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut S {
        &mut self.sources
    }

    /// Apply one decoded command. Exactly one total mutation per
    /// command; any error leaves the registry untouched.
    pub fn dispatch(
        &mut self,
        registry: &mut ChannelRegistry,
        command: Command,
    ) -> Result<Action, CyclopsError> {
        debug!(?command, "dispatching");
        match command {
            Command::Start => {
                self.control.start();
                Ok(Action::Applied)
            }
            Command::Stop => {
                self.control.stop();
                Ok(Action::Applied)
            }
            Command::Reset => {
                self.control.reset_all_sources();
                Ok(Action::Applied)
            }
            Command::Identity => Ok(Action::Identity(Bytes::copy_from_slice(
                self.control.identity(),
            ))),
            Command::Swap(pair) => {
                registry.ensure_channel(pair.first)?;
                registry.ensure_channel(pair.second)?;
                self.sources.swap(pair.first, pair.second)?;
                registry.swap_channels(pair.first, pair.second)?;
                Ok(Action::Applied)
            }
            Command::SourceLoopback { channel, src_id } => self.mutate(
                registry,
                channel,
                StateMutation::SetSource {
                    src_id,
                    mode: Mode::Loopback,
                    shot_cycle: 0,
                },
            ),
            Command::SourceOneShot { channel, src_id } => self.mutate(
                registry,
                channel,
                StateMutation::SetSource {
                    src_id,
                    mode: Mode::OneShot,
                    shot_cycle: 0,
                },
            ),
            Command::SourceNShot {
                channel,
                src_id,
                shot_cycle,
            } => self.mutate(
                registry,
                channel,
                StateMutation::SetSource {
                    src_id,
                    mode: Mode::NShot,
                    shot_cycle,
                },
            ),
            Command::TimePeriod { channel, period_us } => {
                self.mutate(registry, channel, StateMutation::SetTimePeriod(period_us))
            }
            Command::TimeFactor { channel, factor } => {
                self.mutate(registry, channel, StateMutation::ScaleTimeFactor(factor))
            }
            Command::VoltageOffset { channel, offset_mv } => {
                self.mutate(registry, channel, StateMutation::SetVoltageOffset(offset_mv))
            }
            Command::SquareOnTime { channel, on_us } => {
                self.mutate(registry, channel, StateMutation::SetSquareOnTime(on_us))
            }
            Command::SquareOffTime { channel, off_us } => {
                self.mutate(registry, channel, StateMutation::SetSquareOffTime(off_us))
            }
        }
    }

    /// Common path for per-channel mutations: validate the domain,
    /// validate the channel, let the source subsystem accept or refuse,
    /// and only then write the registry.
    fn mutate(
        &mut self,
        registry: &mut ChannelRegistry,
        channel: u8,
        mutation: StateMutation,
    ) -> Result<Action, CyclopsError> {
        mutation.validate()?;
        registry.ensure_channel(channel)?;
        match mutation {
            StateMutation::SetSource {
                src_id,
                mode,
                shot_cycle,
            } => self.sources.set_source(channel, src_id, mode, shot_cycle)?,
            StateMutation::SetTimePeriod(period_us) => {
                self.sources.set_time_period(channel, period_us)?
            }
            StateMutation::ScaleTimeFactor(factor) => {
                self.sources.set_time_factor(channel, factor)?
            }
            StateMutation::SetVoltageOffset(offset_mv) => {
                self.sources.set_voltage_offset(channel, offset_mv)?
            }
            StateMutation::SetSquareOnTime(on_us) => {
                self.sources.set_square_on_time(channel, on_us)?
            }
            StateMutation::SetSquareOffTime(off_us) => {
                self.sources.set_square_off_time(channel, off_us)?
            }
        }
        registry.apply(channel, mutation)?;
        Ok(Action::Applied)
    }
}
