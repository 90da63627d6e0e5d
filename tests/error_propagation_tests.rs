// tests/error_propagation_tests.rs
//! Error propagation from devices and configuration up to the session owner
//!
//! Checks that:
//! - Driver errors convert into `AcqError::Device` with their source kept
//! - Setup failures are reported as such and leave no session behind
//! - Error context survives the trip out of the worker thread

use scope_core::acquisition::{AcquisitionSession, WrapPolicy};
use scope_core::config::constants::acquisition::{
    MAX_RETENTION_SAMPLES, MAX_SAMPLE_RATE_HZ, MAX_WINDOW_SECONDS,
};
use scope_core::config::{ConfigError, SystemConfig};
use scope_core::error::{AcqError, AcqErrorBuilder, AcqResult, ErrorContext, IntoAcqError};
use scope_core::hal::simulator::{SimulatedFault, SimulatedScope, SimulatorConfig};
use scope_core::hal::{DeviceError, DeviceType};
use std::error::Error;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

fn quick_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.acquisition.sample_rate_hz = 1000;
    config.acquisition.buffer_capacity = 32;
    config.acquisition.settle_time_ms = 0;
    config.acquisition.wrap_policy = WrapPolicy::Exact;
    config.hal.simulator = Some(SimulatorConfig::manual());
    config
}

/// Test conversion of every driver error into the unified error
#[test]
fn test_device_error_conversion() {
    let errors = vec![
        DeviceError::CapacityMismatch { requested: 8192, actual: 4096 },
        DeviceError::InvalidChannel(9),
        DeviceError::ChannelNotConfigured(1),
        DeviceError::RangeOutOfBounds { start: 6, count: 4, capacity: 8 },
        DeviceError::Io { operation: "read".to_string(), reason: "usb stall".to_string() },
        DeviceError::Closed,
    ];

    for device_error in errors {
        let message = device_error.to_string();
        let acq_error = AcqError::device(DeviceType::Simulator, device_error, "read_samples");

        match &acq_error {
            AcqError::Device { device_type, error, context } => {
                assert_eq!(*device_type, DeviceType::Simulator);
                assert_eq!(error.to_string(), message);
                assert_eq!(context.component, "device");
                assert_eq!(context.operation, "read_samples");
            }
            _ => panic!("Expected Device error, got: {:?}", acq_error),
        }

        let display = acq_error.to_string();
        assert!(display.contains("SIMULATOR"));
        assert!(display.contains("Device error"));
        assert!(acq_error.source().is_some());
    }
}

/// `?` on a bare driver result still lands in the device variant
#[test]
fn test_from_device_error() {
    fn read() -> AcqResult<Vec<f64>> {
        let result: Result<Vec<f64>, DeviceError> = Err(DeviceError::Closed);
        Ok(result?)
    }

    match read() {
        Err(AcqError::Device { device_type, .. }) => {
            assert_eq!(device_type, DeviceType::Unknown("unspecified".to_string()));
        }
        other => panic!("Expected Device error, got: {:?}", other),
    }
}

#[test]
fn test_config_error_conversion() {
    let err: AcqError = ConfigError::ValidationError(vec!["bad rate".to_string()]).into();
    assert!(err.is_setup_failure());
    assert!(err.to_string().contains("[CONFIG]"));
}

/// Test error context preservation and debugging information
#[test]
fn test_error_context_preservation() {
    let context = ErrorContext::new("session", "configure_channel")
        .add_info("channel", "1")
        .add_info("capacity", "8192")
        .add_to_chain("capacity rejected by device");

    let error = AcqError::Configuration {
        component: "session".to_string(),
        reason: "device did not honor buffer capacity".to_string(),
        context,
    };

    match error {
        AcqError::Configuration { context, .. } => {
            assert_eq!(context.operation, "configure_channel");
            assert_eq!(context.additional_info.get("channel"), Some(&"1".to_string()));
            assert_eq!(context.chain.len(), 1);
            assert!(context.timestamp <= SystemTime::now());
        }
        _ => panic!("Expected Configuration error"),
    }
}

#[test]
fn test_builder_and_extension_trait() {
    let worker = AcqErrorBuilder::new("session", "join").worker("acquisition thread panicked");
    assert!(worker.to_string().contains("[WORKER]"));
    assert!(!worker.is_setup_failure());

    let io: Result<(), std::io::Error> = Err(std::io::Error::new(std::io::ErrorKind::Other, "no threads"));
    match io.acq_err("thread", "spawn") {
        Err(AcqError::System { subsystem, .. }) => assert_eq!(subsystem, "thread"),
        other => panic!("Expected System error, got: {:?}", other),
    }
}

/// Capacity not honored by the instrument blocks session creation
#[test]
fn test_capacity_mismatch_blocks_session() {
    let scope = SimulatedScope::new(SimulatorConfig {
        max_buffer_capacity: 16,
        ..SimulatorConfig::manual()
    })
    .unwrap();
    let handle = scope.handle();

    let err = match AcquisitionSession::open(scope, &quick_config()) {
        Ok(_) => panic!("session must not open with a shrunken buffer"),
        Err(e) => e,
    };

    assert!(err.is_setup_failure());
    let source = err.source().expect("device error kept as source");
    assert_eq!(
        source.downcast_ref::<DeviceError>(),
        Some(&DeviceError::CapacityMismatch { requested: 32, actual: 16 })
    );
    assert!(handle.is_closed());
    assert!(!handle.is_started());
}

#[test]
fn test_unknown_channel_blocks_session() {
    let mut config = quick_config();
    config.channels.enabled = vec![0, 5];
    let scope = SimulatedScope::new(SimulatorConfig::manual()).unwrap();

    match AcquisitionSession::open(scope, &config) {
        Err(AcqError::Device { error, context, .. }) => {
            assert_eq!(context.operation, "configure_channel");
            assert_eq!(error.downcast_ref::<DeviceError>(), Some(&DeviceError::InvalidChannel(5)));
        }
        Err(other) => panic!("Expected Device error, got: {:?}", other),
        Ok(_) => panic!("channel 5 does not exist on a two channel simulator"),
    }
}

/// A failing state poll ends the worker and reaches the joiner intact
#[test]
fn test_worker_error_crosses_thread_boundary() {
    let scope = SimulatedScope::new(SimulatorConfig::manual()).unwrap();
    let handle = scope.handle();
    handle.set_fault(Some(SimulatedFault::StatePoll));

    let mut session = AcquisitionSession::open(scope, &quick_config()).unwrap();
    session.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !session.is_finished() {
        assert!(Instant::now() < deadline, "worker kept running after a device fault");
        thread::sleep(Duration::from_millis(1));
    }

    let err = session.stop_and_join().unwrap_err();
    assert!(!err.is_setup_failure());
    assert_eq!(err.context().operation, "get_state");
    assert_eq!(err.context().thread_id.as_deref(), Some("scope-acquisition"));
    assert!(err.context().file.is_some_and(|f| f.ends_with("worker.rs")));
    assert!(!err.to_string().contains("unknown:0"));
    assert!(handle.is_closed());
}

/// Retention sized past the per-channel limit fails setup instead of allocating
#[test]
fn test_oversized_retention_blocks_session() {
    let mut config = quick_config();
    config.acquisition.sample_rate_hz = MAX_SAMPLE_RATE_HZ;
    config.acquisition.window_seconds = MAX_WINDOW_SECONDS;
    let scope = SimulatedScope::new(SimulatorConfig::manual()).unwrap();
    let handle = scope.handle();

    match AcquisitionSession::open(scope, &config) {
        Err(err @ AcqError::Configuration { .. }) => {
            assert!(err.is_setup_failure());
            assert!(err.to_string().contains("Retention"));
        }
        Err(other) => panic!("Expected Configuration error, got: {:?}", other),
        Ok(_) => panic!("retention beyond the limit must not open"),
    }
    assert!(handle.is_closed());
}

#[test]
fn test_largest_retention_opens_and_stops() {
    let mut config = quick_config();
    config.acquisition.sample_rate_hz = MAX_RETENTION_SAMPLES as u32;
    config.acquisition.window_seconds = 1.0;
    let scope = SimulatedScope::new(SimulatorConfig::manual()).unwrap();

    let mut session = AcquisitionSession::open(scope, &config).expect("largest valid retention");
    session.start().unwrap();
    session.stop_and_join().unwrap();
    assert!(session.drain_all().values().all(|exported| exported.is_empty()));
}

#[test]
fn test_error_clone_and_send() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<AcqError>();

    let original = AcqError::device(DeviceType::AnalogDiscovery, DeviceError::Closed, "get_write_cursor");
    let cloned = original.clone();
    assert_eq!(original.to_string(), cloned.to_string());
}
