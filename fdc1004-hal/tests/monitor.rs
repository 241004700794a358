//! The control loop with a simulated chip, serial port and clock.
mod common;

use common::{Led, LoopbackSerial, ManualClock, SimulatedFdc};
use fdc1004_hal::protocol::{Decoded, Notice, Packet, PacketDecoder, ProtocolConfig, State};
use fdc1004_hal::{
    Channel, ChipStatus, Error, FDC1004, FdcConfig, MeasurementSample, Monitor, Register,
    SampleRate, StartupConfig,
};

type TestMonitor = Monitor<SimulatedFdc, LoopbackSerial, ManualClock>;

fn monitor(chip: SimulatedFdc) -> (TestMonitor, LoopbackSerial, ManualClock) {
    let serial = LoopbackSerial::default();
    let clock = ManualClock::at(0);
    let monitor = Monitor::new(
        FDC1004::new(chip),
        serial.clone(),
        clock.clone(),
        ProtocolConfig::default(),
    );
    (monitor, serial, clock)
}

fn packets(bytes: &[u8]) -> Vec<Packet> {
    let mut decoder = PacketDecoder::new();
    bytes
        .iter()
        .filter_map(|&b| match decoder.push(b) {
            Ok(Some(Decoded::Packet(packet))) => Some(packet),
            Ok(_) => None,
            Err(e) => panic!("bad packet: {e}"),
        })
        .collect()
}

fn notice(notice: Notice) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    notice.write_to(&mut out).unwrap();
    out
}

#[test]
fn startup_prepares_the_chip() {
    let mut chip = SimulatedFdc::new();
    chip.set_register(Register::OffsetCalibration(Channel::Meas2), 0x1234);
    chip.set_register(Register::GainCalibration(Channel::Meas4), 0x0001);
    chip.set_register(Register::FdcConfig, 0x00F0);
    let (mut monitor, serial, _) = monitor(chip);
    let mut led = Led::default();

    assert_eq!(monitor.start(&mut led), Ok(ChipStatus::Ready));
    assert!(led.lit);
    assert_eq!(serial.take_output(), b"CapSense$$$\r\n");

    let (fdc, _, _) = monitor.release();
    let chip = fdc.release();
    // 100 Hz, no channel initiated.
    assert_eq!(chip.register(Register::FdcConfig), 0x0400);
    for channel in Channel::ALL {
        assert_eq!(chip.register(Register::OffsetCalibration(channel)), 0);
        assert_eq!(chip.register(Register::GainCalibration(channel)), 0x4000);
    }
}

#[test]
fn startup_without_a_chip_leaves_led_off() {
    let mut chip = SimulatedFdc::new();
    chip.present = false;
    let (mut monitor, serial, _) = monitor(chip);
    let mut led = Led::default();

    assert_eq!(monitor.start(&mut led), Ok(ChipStatus::Absent));
    assert!(!led.lit);
    assert_eq!(serial.take_output(), b"CapSense$$$\r\n");
}

#[test]
fn startup_rejects_a_chip_with_wrong_ids() {
    let mut chip = SimulatedFdc::new();
    chip.set_register(Register::ManufacturerId, 0x0000);
    chip.set_register(Register::DeviceId, 0x1000);
    let (mut monitor, serial, _) = monitor(chip);
    let mut led = Led::default();

    let status = monitor.start(&mut led);
    assert_eq!(status, Ok(ChipStatus::Unidentified(Error::DeviceNotFound)));
    assert!(!status.unwrap().is_ready());
    assert!(!led.lit);
    assert_eq!(serial.take_output(), b"CapSense$$$\r\n");
}

#[test]
fn startup_can_leave_all_channels_repeating() {
    let (monitor, _, _) = monitor(SimulatedFdc::new());
    let mut monitor = monitor.with_startup(StartupConfig::continuous(SampleRate::Hz400));
    let mut led = Led::default();
    assert_eq!(monitor.start(&mut led), Ok(ChipStatus::Ready));

    let (mut fdc, _, _) = monitor.release();
    let conf = fdc.read_fdc_config().unwrap();
    assert_eq!(conf.sample_rate_code(), 3);
    assert!(conf.repeat());
    for channel in Channel::ALL {
        assert!(conf.initiated(channel));
    }

    let chip = fdc.release();
    let last_conf_write = chip.writes.iter().rev().find(|(pointer, _)| *pointer == 0x0C);
    assert_eq!(last_conf_write, Some(&(0x0C, 0x0C00 | 0x0100 | 0x00F0)));
}

#[test]
fn default_startup_leaves_repeat_off() {
    assert_eq!(StartupConfig::default().repeat_channels, 0);
    assert_eq!(
        StartupConfig::continuous(SampleRate::Hz200).repeat_channels,
        FdcConfig::ALL_DONE
    );
}

#[test]
fn poll_answers_one_byte_at_a_time() {
    let (mut monitor, serial, _) = monitor(SimulatedFdc::new());
    serial.send(b"md");

    monitor.poll().unwrap();
    assert_eq!(serial.pending_input(), 1);
    assert_eq!(packets(&serial.take_output()), [Packet::ManufacturerId(Some(0x5449))]);

    monitor.poll().unwrap();
    assert_eq!(serial.pending_input(), 0);
    assert_eq!(packets(&serial.take_output()), [Packet::DeviceId(Some(0x1004))]);
}

#[test]
fn measurement_packet_only_when_all_channels_are_done() {
    let mut chip = SimulatedFdc::new();
    chip.set_result(Channel::Meas1, 0x0800_0000);
    chip.set_result(Channel::Meas4, 0xFFFF_FF00u32 as i32);
    chip.set_register(Register::MeasurementConfig(Channel::Meas2), 0x3C00 | (3 << 5));
    chip.set_done(0b1110);
    let (mut monitor, serial, _) = monitor(chip);

    monitor.poll().unwrap();
    assert!(serial.take_output().is_empty());

    let (fdc, serial_part, clock) = monitor.release();
    let mut chip = fdc.release();
    chip.set_done(0b0001);
    let mut monitor = Monitor::new(
        FDC1004::new(chip),
        serial_part,
        clock,
        ProtocolConfig::default(),
    );

    monitor.poll().unwrap();
    let expected = [
        MeasurementSample {
            raw: 0x0800_0000,
            capdac: 0,
        },
        MeasurementSample { raw: 0, capdac: 3 },
        MeasurementSample { raw: 0, capdac: 0 },
        MeasurementSample {
            raw: 0xFFFF_FF00u32 as i32,
            capdac: 0,
        },
    ];
    let output = serial.take_output();
    assert_eq!(output[0], 0xA1);
    assert_eq!(packets(&output), [Packet::MeasurementData(expected)]);
    assert_eq!(expected[0].capacitance_pf(), 1.0);
    assert_eq!(expected[1].capacitance_pf(), 9.375);
}

#[test]
fn poll_times_out_an_unfinished_command() {
    let (mut monitor, serial, clock) = monitor(SimulatedFdc::new());
    serial.send(b"x");
    monitor.poll().unwrap();
    assert!(serial.take_output().is_empty());

    clock.advance(999);
    monitor.poll().unwrap();
    assert!(serial.take_output().is_empty());

    clock.advance(1);
    monitor.poll().unwrap();
    assert_eq!(serial.take_output(), notice(Notice::Timeout));

    clock.advance(5000);
    monitor.poll().unwrap();
    assert!(serial.take_output().is_empty());
    assert_eq!(monitor.session().state(), State::Idle);
}

#[test]
fn pending_command_survives_a_16_bit_rollover() {
    // A 16-bit hardware counter, extended to 32 bits, crossing 0xFFFF.
    let (mut monitor, serial, clock) = monitor(SimulatedFdc::new());
    clock.advance(0xFFF0);
    serial.send(b"p");
    monitor.poll().unwrap();

    clock.advance(0x20);
    monitor.poll().unwrap();
    assert!(serial.take_output().is_empty());
    assert_ne!(monitor.session().state(), State::Idle);

    serial.send(b"2P");
    monitor.poll().unwrap();
    monitor.poll().unwrap();
    assert_eq!(serial.take_output(), notice(Notice::SampleRateSet));
}
