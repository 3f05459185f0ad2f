use genesys_hardware::error::HwError;
use genesys_hardware::{ImageSource, SimulatedScanner};
use genesys_traits::Transport;
use rstest::rstest;

fn start(sim: &mut SimulatedScanner) {
    sim.write_register(0x01, 0x01).unwrap();
    sim.write_register(0x0f, 0x01).unwrap();
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(10)]
fn motor_stops_after_configured_polls(#[case] polls: u32) {
    let mut sim = SimulatedScanner::new().with_stop_after_polls(Some(polls));
    start(&mut sim);
    assert_eq!(sim.read_register(0x41).unwrap() & 0x08, 0, "head left home");

    sim.write_register(0x01, 0x00).unwrap();
    for _ in 1..polls {
        assert_ne!(sim.read_register(0x40).unwrap() & 0x03, 0);
    }
    assert_eq!(sim.read_register(0x40).unwrap(), 0);
    assert!(!sim.is_scanning());
    assert_eq!(sim.read_register(0x41).unwrap() & 0x08, 0x08);
}

#[test]
fn stuck_motor_never_reports_idle() {
    let mut sim = SimulatedScanner::new().with_stop_after_polls(None);
    start(&mut sim);
    sim.write_register(0x01, 0x00).unwrap();
    for _ in 0..1000 {
        assert_eq!(sim.read_register(0x40).unwrap(), 0x03);
    }
}

#[test]
fn fixed_image_fails_past_its_end() {
    let mut sim = SimulatedScanner::new().with_image(ImageSource::Bytes(vec![9; 10]));
    let mut buf = [0u8; 8];
    sim.bulk_read(&mut buf).unwrap();
    assert_eq!(buf, [9; 8]);
    let err = sim.bulk_read(&mut buf).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HwError>(),
        Some(HwError::ShortRead {
            requested: 8,
            available: 2
        })
    ));
}

#[test]
fn disconnected_link_fails_every_transfer() {
    let mut sim = SimulatedScanner::new();
    let probe = sim.clone();
    probe.disconnect();
    assert!(sim.read_register(0x40).is_err());
    assert!(sim.write_register(0x01, 0).is_err());
    assert!(sim.bulk_write(&[0]).is_err());
    let mut buf = [0u8; 1];
    let err = sim.bulk_read(&mut buf).unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Disconnected)));
}

#[test]
fn restarting_the_motor_rewinds_the_image() {
    let mut sim = SimulatedScanner::new();
    start(&mut sim);
    let mut buf = [0u8; 4];
    sim.bulk_read(&mut buf).unwrap();
    start(&mut sim);
    sim.bulk_read(&mut buf).unwrap();
    assert_eq!(buf, [0, 1, 2, 3]);
}
