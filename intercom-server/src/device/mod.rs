//! Device network protocol
//!
//! Intercoms accept plain HTTP GET requests on a fixed port. This module
//! owns the wire format and the client that sends it.

pub mod trigger;

pub use trigger::{
    DeviceStatus, DeviceTrigger, HttpDeviceTrigger, SoundTrigger, TriggerError, DEVICE_PORT,
    TRIGGER_PRIORITY,
};
