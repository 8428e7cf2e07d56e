use std::{path::PathBuf, process};

use clap::Parser;
use log::error;

use lora_forwarder::{
    config::Config,
    forward::UdpTransport,
    gateway::Gateway,
    identity::GatewayIdentity,
    radio::linux,
    GatewayError,
};

/// Single-channel LoRa packet forwarder
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "global_conf.json")]
    config: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(&args.config)?;
    config.log_summary();

    let identity = GatewayIdentity::resolve(&config.gateway)?;
    let bus = linux::open(&config.hardware)?;
    let transport = UdpTransport::bind().map_err(GatewayError::from)?;

    let mut gateway = Gateway::start(bus, transport, &config, identity)?;
    match gateway.run()? {}
}
