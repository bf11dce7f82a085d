mod common;
pub(crate) use crate::common::*;

use ecsm::EcConfig;
use ecsm::event::KeyboardEvent;
use ecsm::input_device::{DEFAULT_POLL_INTERVAL, EcMatrixDevice, InputDevice};
use ecsm::types::threshold::ActuationProfile;
use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_time::{Duration, Instant, MockDriver};

#[test]
fn test_device_initialises_and_reports_changes() {
    let mut config: EcConfig<2, 2> = EcConfig::with_profile(ActuationProfile::fixed(100, 80));
    config.noise_floor_rounds = 2;
    let mut sensor = ScriptedSensor::<2, 2>::new(10);
    // Rest readings for both calibration rounds, then two keys go down together
    for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        sensor.push(row, col, &[10, 10]);
    }
    sensor.push(0, 1, &[200, 20]);
    sensor.push(1, 0, &[200, 200]);

    let matrix = ecsm::EcMatrix::new(sensor, config);
    let mut device = EcMatrixDevice::new(matrix, DEFAULT_POLL_INTERVAL);

    block_on(async {
        assert_eq!(device.read_event().await, KeyboardEvent::key(0, 1, true));
        assert!(device.matrix().is_initialized());
        assert_eq!(device.read_event().await, KeyboardEvent::key(1, 0, true));
        assert_eq!(device.state(), [0b10, 0b01]);
        // The next scan releases (0, 1) and keeps (1, 0) down
        assert_eq!(device.read_event().await, KeyboardEvent::key(0, 1, false));
        assert_eq!(device.state(), [0, 0b01]);
    });
}

#[test]
fn test_device_keeps_quiet_while_bottoming() {
    let mut config: EcConfig<1, 1> = EcConfig::with_profile(ActuationProfile::fixed(100, 80));
    config.noise_floor_rounds = 1;
    let mut matrix = ecsm::EcMatrix::new(ScriptedSensor::<1, 1>::new(10), config);
    matrix.init();
    let mut device = EcMatrixDevice::new(matrix, DEFAULT_POLL_INTERVAL);

    device.matrix_mut().enter_bottoming_calibration();
    device.matrix_mut().peripheral_mut().push(0, 0, &[900]);
    let mut state = device.state();
    assert!(!device.matrix_mut().scan(&mut state));
    assert_eq!(device.matrix().bottoming_reading(0, 0), 900);

    device.matrix_mut().exit_bottoming_calibration();
    device.matrix_mut().peripheral_mut().push(0, 0, &[900]);
    block_on(async {
        assert_eq!(device.read_event().await, KeyboardEvent::key(0, 0, true));
    });
}

#[test]
fn test_device_waits_poll_interval_after_quiet_scan() {
    let mut config: EcConfig<1, 1> = EcConfig::with_profile(ActuationProfile::fixed(100, 80));
    config.noise_floor_rounds = 1;
    let mut matrix = ecsm::EcMatrix::new(ScriptedSensor::<1, 1>::new(10), config);
    matrix.init();
    matrix.peripheral_mut().push(0, 0, &[10, 10, 200]);

    let interval = Duration::from_millis(5);
    let mut device = EcMatrixDevice::new(matrix, interval);
    let start = Instant::now();

    let (event, ()) = block_on(join(device.read_event(), async {
        // Each advance wakes the timer of one quiet scan
        MockDriver::get().advance(interval);
        embassy_futures::yield_now().await;
        MockDriver::get().advance(interval);
    }));

    assert_eq!(event, KeyboardEvent::key(0, 0, true));
    assert_eq!(Instant::now() - start, interval * 2);
    // Calibration round plus three scans
    assert_eq!(device.matrix().peripheral().reads.len(), 4);
}
