pub mod assembler;
pub mod channel;
pub mod constants;
pub mod device;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod message;
pub mod packet;

// Re-export the host-side handle and the decode engine for easy access
pub use device::Cyclops;
pub use engine::{EngineEvent, RpcEngine};
