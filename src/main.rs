mod channel;
mod dispatch;
mod identity;
mod relay_bank;
mod relay_cmd;
mod relay_types;
mod transport;

use crate::channel::serve;
use crate::identity::NodeInfo;
use crate::relay_bank::RelayBank;
use crate::transport::ConsoleSink;
use crate::transport::FrameSink;
use crate::transport::SerialSink;

use anyhow::Result;
use clap::Parser;
use log::info;
use log::warn;
use std::thread;
use std::time::Duration;

const RECONNECT_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(version, about = "Drives an 8-channel serial relay board from redis pub/sub")]
struct Cli {
    /// Redis server carrying the relay command and status topics
    #[arg(long, default_value = "redis://127.0.0.1/")]
    redis_url: String,

    /// Serial device the relay board is attached to
    #[arg(long, default_value = "/dev/ttyUSB0")]
    device: String,

    /// Network interface the node identity is derived from
    #[arg(long, default_value = "eth0")]
    interface: String,

    /// Length of a relay trigger pulse in milliseconds
    #[arg(long, default_value_t = crate::relay_bank::DEFAULT_PULSE_LENGTH.as_millis() as u64)]
    pulse_ms: u64,

    /// Log relay frames instead of writing them to the serial device
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    stderrlog::new()
        .module(module_path!())
        .quiet(cli.quiet)
        .verbosity(cli.verbose as usize + 1)
        .init()?;

    let sink: Box<dyn FrameSink> = match cli.dry_run {
        true => Box::new(ConsoleSink::new()),
        false => Box::new(SerialSink::open(&cli.device)?),
    };

    let mut bank = RelayBank::new(sink, Duration::from_millis(cli.pulse_ms));

    // The reset runs through the regular set path so every relay gets an
    // explicit off frame on boot.
    bank.reset_all()?;

    let client = redis::Client::open(cli.redis_url.as_str())?;
    let node = NodeInfo::detect(&cli.interface, &client)?;
    info!("Node identity is '{}' ({})", node.identity, node.address);

    loop {
        if let Err(e) = serve(&client, &mut bank, &node) {
            warn!(
                "Lost connection to '{}': {:#}, retrying in {}s",
                cli.redis_url,
                e,
                RECONNECT_DELAY.as_secs()
            );
            thread::sleep(RECONNECT_DELAY);
        }
    }
}
