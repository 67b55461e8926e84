use crate::assembler::{FrameAssembler, FrameStep};
use crate::channel::ChannelRegistry;
use crate::dispatch::{Action, DeviceControl, Dispatcher, SourceBank};
use crate::error::CyclopsError;
use crate::message::Command;
use bytes::Bytes;
use tracing::warn;

/// What one fed byte produced, if anything.
#[derive(Debug)]
pub enum EngineEvent {
    /// A command completed, dispatched, and mutated state (or ran a
    /// global action).
    Applied(Command),
    /// The device descriptor, ready to be written back to the host.
    Identity(Bytes),
    /// A recovered diagnostic: the frame (or its mutation) was dropped
    /// and parsing continues.
    Error(CyclopsError),
}

/// The streaming decode-and-dispatch cycle: bytes in, state mutations
/// out.
///
/// Single-threaded and cooperative. Commands are applied in the exact
/// order their frames complete on the wire, exactly once each; a
/// frame's mutation finishes before the next frame begins decoding.
/// Every protocol error is recovered locally and surfaced as an
/// [`EngineEvent::Error`].
pub struct RpcEngine<C, S> {
    assembler: FrameAssembler,
    dispatcher: Dispatcher<C, S>,
    registry: ChannelRegistry,
}

impl<C: DeviceControl, S: SourceBank> RpcEngine<C, S> {
    pub fn new(control: C, sources: S, registry: ChannelRegistry) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            dispatcher: Dispatcher::new(control, sources),
            registry,
        }
    }

    /// Feed one byte from the transport. Returns `None` while a frame
    /// is still incomplete.
    pub fn feed(&mut self, byte: u8) -> Option<EngineEvent> {
        let step = match self.assembler.feed(byte) {
            Ok(step) => step,
            Err(err) => {
                warn!(%err, "frame error, resynchronizing");
                return Some(EngineEvent::Error(err));
            }
        };
        let packet = match step {
            FrameStep::Incomplete => return None,
            FrameStep::Complete(packet) => packet,
        };
        let command = match Command::try_from(packet) {
            Ok(command) => command,
            Err(err) => {
                warn!(%err, "dropping undecodable frame");
                return Some(EngineEvent::Error(err));
            }
        };
        match self.dispatcher.dispatch(&mut self.registry, command) {
            Ok(Action::Applied) => Some(EngineEvent::Applied(command)),
            Ok(Action::Identity(descriptor)) => Some(EngineEvent::Identity(descriptor)),
            Err(err) => {
                warn!(%err, ?command, "mutation dropped");
                Some(EngineEvent::Error(err))
            }
        }
    }

    /// Feed a burst of bytes, collecting the events they produce in
    /// wire order.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Vec<EngineEvent> {
        bytes.iter().filter_map(|&byte| self.feed(byte)).collect()
    }

    /// External stalled-frame signal: discard the partial frame and
    /// resynchronize. Reports a diagnostic if bytes were buffered.
    pub fn abandon_frame(&mut self) -> Option<EngineEvent> {
        let buffered = self.assembler.abandon();
        (buffered > 0).then(|| EngineEvent::Error(CyclopsError::StalledFrame { buffered }))
    }

    /// Bytes buffered for an in-progress frame.
    pub fn pending(&self) -> usize {
        self.assembler.pending()
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn control(&self) -> &C {
        self.dispatcher.control()
    }

    pub fn sources(&self) -> &S {
        self.dispatcher.sources()
    }

    pub fn sources_mut(&mut self) -> &mut S {
        self.dispatcher.sources_mut()
    }
}
