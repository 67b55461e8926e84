use clap::{Parser, Subcommand, ValueEnum};
use cyclops_lib::Cyclops;
use cyclops_lib::device::DEFAULT_BAUD;
use cyclops_lib::message::{Command, SwapPair};

#[derive(Parser)]
#[command(
    name = "cyclops",
    about = "Drive a Cyclops signal generator over its serial RPC link"
)]
struct Cli {
    /// Serial port the device is attached to
    #[arg(short, long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Print the device descriptor
    Identity,
    /// Resume the device main loop
    Start,
    /// Pause the device main loop
    Stop,
    /// Reinitialize all sources to their pre-configured defaults
    Reset,
    /// Exchange the full state of two channels
    Swap { first: u8, second: u8 },
    /// Select the active source for a channel
    Source {
        channel: u8,
        src_id: u8,
        #[arg(value_enum, default_value = "loopback")]
        mode: ModeArg,
        /// Repeat count, n-shot mode only
        #[arg(long, default_value_t = 1)]
        shots: u8,
    },
    /// Set the update period in microseconds
    Period { channel: u8, micros: u32 },
    /// Scale hold times by a positive factor
    TimeFactor { channel: u8, factor: f32 },
    /// Add a DC offset in millivolts
    Offset { channel: u8, millivolts: u16 },
    /// Set the square-wave on-time in microseconds
    SquareOn { channel: u8, micros: u32 },
    /// Set the square-wave off-time in microseconds
    SquareOff { channel: u8, micros: u32 },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Loopback,
    OneShot,
    NShot,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut device = Cyclops::open(&cli.port, cli.baud)?;

    let command = match cli.command {
        CliCommand::Identity => {
            let descriptor = device.request_identity()?;
            println!("{descriptor}");
            return Ok(());
        }
        CliCommand::Start => Command::Start,
        CliCommand::Stop => Command::Stop,
        CliCommand::Reset => Command::Reset,
        CliCommand::Swap { first, second } => Command::Swap(SwapPair { first, second }),
        CliCommand::Source {
            channel,
            src_id,
            mode,
            shots,
        } => match mode {
            ModeArg::Loopback => Command::SourceLoopback { channel, src_id },
            ModeArg::OneShot => Command::SourceOneShot { channel, src_id },
            ModeArg::NShot => Command::SourceNShot {
                channel,
                src_id,
                shot_cycle: shots,
            },
        },
        CliCommand::Period { channel, micros } => Command::TimePeriod {
            channel,
            period_us: micros,
        },
        CliCommand::TimeFactor { channel, factor } => Command::TimeFactor { channel, factor },
        CliCommand::Offset {
            channel,
            millivolts,
        } => Command::VoltageOffset {
            channel,
            offset_mv: millivolts,
        },
        CliCommand::SquareOn { channel, micros } => Command::SquareOnTime {
            channel,
            on_us: micros,
        },
        CliCommand::SquareOff { channel, micros } => Command::SquareOffTime {
            channel,
            off_us: micros,
        },
    };

    let frame = command.encode();
    device.send(command)?;
    println!("sent {}", hex::encode(&frame));
    Ok(())
}
