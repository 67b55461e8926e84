//! Decode hex-encoded RPC frames offline and print the resulting
//! actions, using stub collaborators in place of real hardware.
//!
//! ```text
//! decode_frames 0005 2500002040 87
//! ```

use cyclops_lib::channel::{ChannelRegistry, Mode};
use cyclops_lib::dispatch::{DeviceControl, SourceBank};
use cyclops_lib::engine::{EngineEvent, RpcEngine};
use cyclops_lib::error::CyclopsError;

struct PrintControl;

impl DeviceControl for PrintControl {
    fn start(&mut self) {
        println!("-> start main loop");
    }

    fn stop(&mut self) {
        println!("-> stop main loop");
    }

    fn reset_all_sources(&mut self) {
        println!("-> reset all sources");
    }

    fn identity(&self) -> &[u8] {
        b"Cyclops offline decoder"
    }
}

struct PrintBank;

impl SourceBank for PrintBank {
    fn set_source(
        &mut self,
        channel: u8,
        src_id: u8,
        mode: Mode,
        shot_cycle: u8,
    ) -> Result<(), CyclopsError> {
        println!("-> ch{channel}: source {src_id}, mode {mode}, shots {shot_cycle}");
        Ok(())
    }

    fn set_time_period(&mut self, channel: u8, period_us: u32) -> Result<(), CyclopsError> {
        println!("-> ch{channel}: time period {period_us} us");
        Ok(())
    }

    fn set_time_factor(&mut self, channel: u8, factor: f32) -> Result<(), CyclopsError> {
        println!("-> ch{channel}: time factor x{factor}");
        Ok(())
    }

    fn set_voltage_offset(&mut self, channel: u8, offset_mv: u16) -> Result<(), CyclopsError> {
        println!("-> ch{channel}: voltage offset {offset_mv} mV");
        Ok(())
    }

    fn set_square_on_time(&mut self, channel: u8, on_us: u32) -> Result<(), CyclopsError> {
        println!("-> ch{channel}: square on-time {on_us} us");
        Ok(())
    }

    fn set_square_off_time(&mut self, channel: u8, off_us: u32) -> Result<(), CyclopsError> {
        println!("-> ch{channel}: square off-time {off_us} us");
        Ok(())
    }

    fn swap(&mut self, first: u8, second: u8) -> Result<(), CyclopsError> {
        println!("-> swap ch{first} <-> ch{second}");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: decode_frames <hex-frame> [<hex-frame> ...]");
        std::process::exit(2);
    }

    let mut engine = RpcEngine::new(PrintControl, PrintBank, ChannelRegistry::default());
    for arg in &args {
        let bytes = hex::decode(arg.trim())?;
        for event in engine.feed_slice(&bytes) {
            match event {
                EngineEvent::Applied(command) => println!("applied: {command:?}"),
                EngineEvent::Identity(descriptor) => {
                    println!("identity: {}", String::from_utf8_lossy(&descriptor))
                }
                EngineEvent::Error(err) => println!("error: {err}"),
            }
        }
    }
    if engine.pending() > 0 {
        println!("note: {} bytes of an incomplete frame left over", engine.pending());
    }
    Ok(())
}
