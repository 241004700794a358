use anyhow::Result;
use clap::Parser;
use fdc1004_hal::protocol::{Packet, PacketKind, Request};

use cli::Commands;
use link::Link;

mod channel;
mod cli;
mod link;
mod sample_rate;
mod stream;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let level = if cli.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    if let Commands::Ports = cli.command {
        return link::list_ports();
    }
    let mut link = Link::open(cli.port.as_deref(), cli.baud)?;
    match cli.command {
        Commands::Ports => {}
        Commands::Info => info(&mut link)?,
        Commands::SampleRate(command) => sample_rate::action(&mut link, command)?,
        Commands::Channel { channel } => channel::read(&mut link, channel)?,
        Commands::Configure(args) => channel::configure(&mut link, args)?,
        Commands::Start { channels } => channel::start(&mut link, &channels)?,
        Commands::Stream { count } => stream::stream(&mut link, count)?,
        Commands::Rate { seconds } => stream::rate(&mut link, seconds)?,
    }
    Ok(())
}

fn info(link: &mut Link) -> Result<()> {
    link.request(Request::Identify)?;
    print!("{}", link.await_text()?);

    let id = |packet| match packet {
        Packet::ManufacturerId(Some(id)) | Packet::DeviceId(Some(id)) => format!("{id:#06X}"),
        _ => "unreadable".to_owned(),
    };
    let manufacturer = link.query(Request::ManufacturerId, PacketKind::ManufacturerId)?;
    println!("Manufacturer ID: {}", id(manufacturer));
    let device = link.query(Request::DeviceId, PacketKind::DeviceId)?;
    println!("Device ID:       {}", id(device));

    let present = link.query(Request::SensorCheck, PacketKind::SensorCheck)?;
    println!(
        "Sensor:          {}",
        if let Packet::SensorCheck(true) = present {
            "present"
        } else {
            "not found"
        }
    );
    match sample_rate::read(link) {
        Ok(rate) => println!("Sample rate:     {} Hz", rate.hertz()),
        Err(e) => println!("Sample rate:     {e}"),
    }
    Ok(())
}
