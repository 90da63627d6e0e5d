// tests/hal_integration.rs
//! Integration tests for the HAL driven by a wall clock

use scope_core::acquisition::{AcquisitionSession, WrapPolicy};
use scope_core::config::SystemConfig;
use scope_core::hal::simulator::{SignalShape, SimulatorClock, SimulatorConfig};
use scope_core::hal::{DeviceFactory, DeviceState, DeviceType, ScopeDevice};
use std::thread;
use std::time::Duration;

fn realtime_config(signal: SignalShape) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.acquisition.sample_rate_hz = 10_000;
    config.acquisition.buffer_capacity = 4096;
    config.acquisition.window_seconds = 5.0;
    config.acquisition.settle_time_ms = 0;
    config.acquisition.wrap_policy = WrapPolicy::Exact;
    config.hal.device_type = DeviceType::Simulator;
    config.hal.simulator = Some(SimulatorConfig {
        clock: SimulatorClock::Realtime,
        prefill_polls: 3,
        signal,
        ..SimulatorConfig::default()
    });
    config
}

#[test]
fn test_factory_device_runs_through_states() {
    let config = realtime_config(SignalShape::Counter);
    let mut device = DeviceFactory::create(&config.hal).expect("Failed to create simulator");

    for channel in config.channel_configs() {
        device.configure_channel(&channel).expect("Failed to configure channel");
    }
    assert_eq!(device.get_state().unwrap(), DeviceState::Configuring);

    device.start().expect("Failed to start");
    let mut states = Vec::new();
    for _ in 0..4 {
        states.push(device.get_state().unwrap());
    }
    assert_eq!(states.last(), Some(&DeviceState::Running));
    assert!(states[..3].iter().all(|s| s.awaiting_start()));

    device.close().unwrap();
    assert!(device.get_state().is_err());
}

#[test]
fn test_realtime_acquisition_is_continuous() {
    let config = realtime_config(SignalShape::Counter);
    let mut session = AcquisitionSession::from_config(&config).expect("Failed to open session");
    session.start().expect("Failed to start");

    thread::sleep(Duration::from_millis(100));
    let metrics = session.stop_and_join().expect("worker failed");
    assert!(metrics.not_ready_polls >= 3);
    assert!(metrics.samples_per_channel > 0);

    let drained = session.drain_all();
    for exported in drained.values() {
        assert!(!exported.is_empty());
        assert_eq!(exported.values[0], 0.0);
        for pair in exported.values.windows(2) {
            assert_eq!(pair[1] - pair[0], 1.0, "gap in acquired samples");
        }
    }
}

#[test]
fn test_realtime_sine_within_probe_range() {
    let config = realtime_config(SignalShape::Sine { frequency_hz: 250.0, amplitude_v: 2.0 });
    let mut session = AcquisitionSession::from_config(&config).expect("Failed to open session");
    session.start().expect("Failed to start");

    thread::sleep(Duration::from_millis(50));
    session.stop_and_join().expect("worker failed");

    let data = session.data_y();
    assert_eq!(data.len(), 2);
    for values in data.values() {
        assert!(values.iter().all(|v| v.abs() <= 2.0 + 1e-9));
    }
}
