// src/hal/tests.rs
//! Unit tests for HAL components

use crate::config::HalConfig;
use crate::hal::simulator::SimulatorConfig;
use crate::hal::{
    AcquisitionMode, ChannelConfig, DeviceFactory, DeviceInfo, DeviceState, DeviceType, ScopeDevice,
};

#[test]
fn test_device_info_creation() {
    let info = DeviceInfo {
        name: "Test Scope".to_string(),
        serial_number: "TEST123".to_string(),
        device_type: DeviceType::AnalogDiscovery,
        channel_count: 2,
        max_buffer_capacity: 8192,
    };

    assert_eq!(info.name, "Test Scope");
    assert_eq!(info.serial_number, "TEST123");
    assert_eq!(info.device_type.to_string(), "ANALOG-DISCOVERY");
}

#[test]
fn test_factory_builds_simulator() {
    let config = HalConfig {
        device_type: DeviceType::Simulator,
        simulator: Some(SimulatorConfig::manual()),
    };
    let mut device = DeviceFactory::create(&config).expect("simulator should open");

    assert_eq!(device.device_info().device_type, DeviceType::Simulator);
    device
        .configure_channel(&ChannelConfig {
            id: 0,
            voltage_range_v: 5.0,
            attenuation: 10.0,
            sample_rate_hz: 1000,
            buffer_capacity: 64,
            mode: AcquisitionMode::ScanScreen,
        })
        .unwrap();
    assert_eq!(device.buffer_capacity(), 64);
    assert_eq!(device.get_state().unwrap(), DeviceState::Configuring);
}

#[test]
fn test_factory_rejects_hardware_without_driver() {
    let config = HalConfig {
        device_type: DeviceType::AnalogDiscovery,
        simulator: None,
    };
    let err = DeviceFactory::create(&config).err().expect("no hardware driver is built in");
    assert!(err.is_setup_failure());
}

#[test]
fn test_device_type_serialization() {
    let device_type = DeviceType::Simulator;
    let json = serde_json::to_string(&device_type).expect("Failed to serialize");
    assert_eq!(json, "\"simulator\"");
    let deserialized: DeviceType = serde_json::from_str(&json).expect("Failed to deserialize");
    assert_eq!(device_type, deserialized);
}

#[test]
fn test_device_state_serialization() {
    let json = serde_json::to_string(&DeviceState::Prefilling).expect("Failed to serialize");
    assert_eq!(json, "\"prefilling\"");
}
