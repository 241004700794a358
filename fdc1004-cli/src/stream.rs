use std::time::{Duration, Instant};

use anyhow::Result;
use fdc1004_hal::protocol::Packet;

use crate::link::{Event, Link};

/// Print each measurement packet as one line of four capacitances.
pub(crate) fn stream(link: &mut Link, count: Option<u64>) -> Result<()> {
    let mut seen = 0;
    while count.is_none_or(|limit| seen < limit) {
        let deadline = Instant::now() + Duration::from_secs(1);
        match link.next_event(deadline)? {
            Some(Event::Packet(Packet::MeasurementData(samples))) => {
                let line = samples
                    .iter()
                    .map(|s| format!("{:10.4}", s.capacitance_pf()))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{line}");
                seen += 1;
            }
            Some(Event::Text(text)) => eprint!("{text}"),
            Some(Event::Packet(packet)) => log::debug!("Skipped {packet:?}"),
            None => log::info!("No measurement data in the last second"),
        }
    }
    Ok(())
}

/// Count measurement packets for `seconds` and print the rate.
pub(crate) fn rate(link: &mut Link, seconds: u64) -> Result<()> {
    let period = Duration::from_secs(seconds.max(1));
    let started = Instant::now();
    let deadline = started + period;
    let mut packets = 0u64;
    while let Some(event) = link.next_event(deadline)? {
        if let Event::Packet(Packet::MeasurementData(_)) = event {
            packets += 1;
        }
    }
    if packets == 0 {
        log::warn!("No measurement packets; the board may not be in repeat mode");
    }
    let elapsed = started.elapsed().as_secs_f64();
    println!(
        "{packets} packets in {elapsed:.1} s: {:.1} packets/s",
        packets as f64 / elapsed
    );
    Ok(())
}
