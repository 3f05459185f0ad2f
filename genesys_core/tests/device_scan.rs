use std::time::Duration;

use genesys_core::device::{SLOPE_TABLE_BASE_ADDRESS, SLOPE_TABLE_SLOT_STRIDE};
use genesys_core::motor::MAX_SLOPE_TABLE_SIZE;
use genesys_core::{
    DeviceOptions, GenesysError, Registry, ScannerDevice, SensorExposure, SetupParams,
};
use genesys_hardware::SimulatedScanner;
use genesys_traits::ManualClock;
use rstest::rstest;

fn gray(pixels: u32, lines: u32) -> SetupParams {
    SetupParams {
        pixels,
        lines,
        channels: 1,
        ..SetupParams::default()
    }
}

fn open(sim: &SimulatedScanner, clock: &ManualClock) -> ScannerDevice<SimulatedScanner> {
    ScannerDevice::open(sim.clone(), Registry::builtin(), "canon-lide-100")
        .unwrap()
        .with_clock(Box::new(clock.clone()))
}

#[test]
fn registers_are_written_in_address_order_then_slope_tables() {
    let sim = SimulatedScanner::new();
    let mut dev = open(&sim, &ManualClock::new());
    dev.setup_scan(&gray(300, 8)).unwrap();

    let expected: Vec<(u16, u8)> = dev.registers().iter().map(|r| (r.address, r.value)).collect();
    let writes = sim.register_writes();
    assert_eq!(&writes[..expected.len()], expected.as_slice());
    assert!(expected.windows(2).all(|w| w[0].0 < w[1].0));

    // each table: buffer address low, high, then the data
    let uploads = &writes[expected.len()..];
    assert_eq!(uploads.len(), 10);
    for (slot, pair) in uploads.chunks(2).enumerate() {
        let addr = (SLOPE_TABLE_BASE_ADDRESS + SLOPE_TABLE_SLOT_STRIDE * slot as u32) >> 4;
        assert_eq!(pair[0], (0x2b, (addr & 0xff) as u8));
        assert_eq!(pair[1], (0x2a, (addr >> 8) as u8));
    }

    let bulk = sim.bulk_writes();
    let addresses: Vec<u32> = bulk.iter().map(|w| w.address).collect();
    assert_eq!(addresses, vec![0x8000, 0x8800, 0x9000, 0x9800, 0xa000]);
    assert!(bulk.iter().all(|w| w.data.len() == 2 * MAX_SLOPE_TABLE_SIZE));
}

#[test]
fn full_scan_streams_every_byte_in_order() {
    let sim = SimulatedScanner::new();
    let mut dev = open(&sim, &ManualClock::new());
    dev.setup_scan(&gray(300, 8)).unwrap();
    dev.begin_scan().unwrap();
    assert!(sim.is_scanning());

    let mut image = Vec::new();
    for len in [1000, 1000, 400] {
        let mut out = vec![0u8; len];
        dev.read_data(&mut out).unwrap();
        image.extend_from_slice(&out);
    }
    assert_eq!(image.len(), 2400);
    assert!(image.iter().enumerate().all(|(i, &b)| b == (i % 251) as u8));
    assert_eq!(dev.remaining_bytes(), 0);

    let mut one = [0u8; 1];
    let err = dev.read_data(&mut one).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GenesysError>(),
        Some(GenesysError::NoMoreData { requested: 1, .. })
    ));
    dev.end_scan().unwrap();
    assert!(!sim.is_scanning());
}

#[test]
fn nominal_chunk_size_bounds_bulk_reads() {
    let sim = SimulatedScanner::new();
    let mut dev = open(&sim, &ManualClock::new()).with_options(DeviceOptions {
        read_chunk_bytes: Some(256),
        ..DeviceOptions::default()
    });
    dev.setup_scan(&gray(300, 8)).unwrap();
    dev.begin_scan().unwrap();
    let mut out = vec![0u8; 1000];
    dev.read_data(&mut out).unwrap();
    dev.read_data(&mut out).unwrap();
    dev.read_data(&mut out[..400]).unwrap();
    assert_eq!(out[399], (2399 % 251) as u8);

    let reads = sim.bulk_reads();
    assert!(reads.iter().all(|&n| n == 256), "{reads:?}");
    // 2400 bytes in 256-byte chunks, the last one padded
    assert_eq!(reads.len(), 10);
}

#[test]
fn stop_gives_up_after_max_polls() {
    let sim = SimulatedScanner::new().with_stop_after_polls(None);
    let clock = ManualClock::new();
    let mut dev = open(&sim, &clock);
    dev.setup_scan(&gray(300, 8)).unwrap();
    dev.begin_scan().unwrap();

    let err = dev.stop_action().unwrap_err();
    assert_eq!(
        err.downcast_ref::<GenesysError>(),
        Some(&GenesysError::StopTimeout { polls: 300 })
    );
    assert_eq!(clock.sleeps(), 300);
    assert_eq!(clock.elapsed(), Duration::from_secs(30));
    assert_eq!(sim.register(0x01).unwrap() & 0x01, 0);
}

#[test]
fn motor_power_follows_scan_start_and_stop() {
    let sim = SimulatedScanner::new().with_stop_after_polls(Some(2));
    let clock = ManualClock::new();
    let mut dev = open(&sim, &clock);
    dev.setup_scan(&gray(300, 8)).unwrap();
    assert_eq!(sim.register(0x02).unwrap() & 0x10, 0);

    dev.begin_scan().unwrap();
    assert_eq!(sim.register(0x01).unwrap() & 0x01, 0x01);
    assert_eq!(sim.register(0x02).unwrap() & 0x10, 0x10);
    let writes = sim.register_writes();
    let start = &writes[writes.len() - 3..];
    assert_eq!(start[0].0, 0x01);
    assert_eq!(start[1].0, 0x02);
    assert_eq!(start[2], (0x0f, 1));

    let before_stop = sim.register_writes().len();
    dev.stop_action().unwrap();
    assert_eq!(sim.register(0x01).unwrap() & 0x01, 0);
    assert_eq!(sim.register(0x02).unwrap() & 0x10, 0);
    let stop: Vec<u16> = sim.register_writes()[before_stop..]
        .iter()
        .map(|&(addr, _)| addr)
        .collect();
    assert_eq!(stop, vec![0x01, 0x02]);
}

#[rstest]
#[case(Some(1), 0)]
#[case(Some(5), 4)]
fn stop_returns_once_motor_is_idle(#[case] polls: Option<u32>, #[case] sleeps: u64) {
    let sim = SimulatedScanner::new().with_stop_after_polls(polls);
    let clock = ManualClock::new();
    let mut dev = open(&sim, &clock);
    dev.setup_scan(&gray(300, 8)).unwrap();
    dev.begin_scan().unwrap();
    dev.stop_action().unwrap();
    assert_eq!(clock.sleeps(), sleeps);
    assert!(!sim.is_scanning());
}

#[test]
fn stop_on_idle_device_touches_nothing() {
    let sim = SimulatedScanner::new();
    let clock = ManualClock::new();
    let mut dev = open(&sim, &clock);
    dev.stop_action().unwrap();
    assert!(sim.register_writes().is_empty());
    assert_eq!(clock.sleeps(), 0);
}

#[test]
fn disconnect_mid_scan_is_a_transport_error() {
    let sim = SimulatedScanner::new();
    let mut dev = open(&sim, &ManualClock::new());
    dev.setup_scan(&gray(300, 8)).unwrap();
    dev.begin_scan().unwrap();
    sim.disconnect();
    let mut out = vec![0u8; 16];
    let err = dev.read_data(&mut out).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GenesysError>(),
        Some(GenesysError::Transport(_))
    ));
}

#[test]
fn bulk_timeout_maps_to_timeout() {
    let sim = SimulatedScanner::new().with_bulk_read_failure_after(0);
    let mut dev = open(&sim, &ManualClock::new());
    dev.setup_scan(&gray(300, 8)).unwrap();
    dev.begin_scan().unwrap();
    let mut out = vec![0u8; 16];
    let err = dev.read_data(&mut out).unwrap_err();
    assert_eq!(err.downcast_ref::<GenesysError>(), Some(&GenesysError::Timeout));
}

#[test]
fn cached_calibration_is_reused_until_it_expires() {
    let sim = SimulatedScanner::new();
    let clock = ManualClock::new();
    let mut dev = open(&sim, &clock);
    let params = gray(300, 8);

    let table_sensor = dev.setup_scan(&params).unwrap().sensor.clone();
    let calibrated = table_sensor.with_calibrated_exposure(SensorExposure::new(11, 22, 33));
    dev.store_calibration(calibrated).unwrap();

    clock.advance(Duration::from_secs(30 * 60));
    let s = dev.setup_scan(&params).unwrap();
    assert_eq!(s.sensor.exposure, SensorExposure::new(11, 22, 33));

    clock.advance(Duration::from_secs(31 * 60));
    let s = dev.setup_scan(&params).unwrap();
    assert_eq!(s.sensor.exposure, table_sensor.exposure);
}
