//! # Reply stream decoding example
//!
//! The board's output mixes binary packets with text: the banner, and the
//! notices sent after multi-byte commands. This builds such a stream from the
//! library's own encoders, as a board would send it, and splits it again with
//! [`PacketDecoder`], printing what a host would see.
//!
//! Text bytes are collected until the `$$$` end-of-transmission line.
use fdc1004_hal::protocol::notice::{BANNER, END_OF_TRANSMISSION};
use fdc1004_hal::protocol::{Decoded, Notice, Packet, PacketDecoder};
use fdc1004_hal::{MeasurementSample, SampleRate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stream: Vec<u8> = BANNER.as_bytes().to_vec();
    stream.extend_from_slice(Packet::ManufacturerId(Some(0x5449)).encode().as_bytes());
    Notice::SampleRateSet.write_to(&mut stream)?;
    stream.extend_from_slice(Packet::SampleRate(Some(SampleRate::Hz200)).encode().as_bytes());
    let samples = [
        MeasurementSample {
            raw: 0x0800_0000,
            capdac: 0,
        },
        MeasurementSample {
            raw: -0x0400_0000,
            capdac: 4,
        },
        MeasurementSample { raw: 0, capdac: 0 },
        MeasurementSample {
            raw: 0x0020_0000,
            capdac: 31,
        },
    ];
    stream.extend_from_slice(Packet::MeasurementData(samples).encode().as_bytes());

    let mut decoder = PacketDecoder::new();
    let mut text = Vec::new();
    for byte in stream {
        match decoder.push(byte)? {
            Some(Decoded::Packet(Packet::MeasurementData(samples))) => {
                for (n, sample) in samples.iter().enumerate() {
                    println!("MEAS{}: {:.4} pF", n + 1, sample.capacitance_pf());
                }
            }
            Some(Decoded::Packet(packet)) => println!("{packet:?}"),
            Some(Decoded::Text(byte)) => {
                text.push(byte);
                if text.ends_with(END_OF_TRANSMISSION.as_bytes()) {
                    print!("{}", String::from_utf8_lossy(&text));
                    text.clear();
                }
            }
            None => {}
        }
    }
    Ok(())
}
