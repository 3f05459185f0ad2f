//! Device tables as an explicit object.
//!
//! Everything the selectors look up (models, sensors, motors, motion
//! profiles) lives here and is passed by reference. Tests build their own
//! registry from [`Registry::empty`] instead of patching shared state.

use crate::error::{GenesysError, Result};
use crate::model::{Model, UsbDeviceEntry};
use crate::motor::{Motor, MotorId, MotorProfile};
use crate::sensor::{ScanMethod, Sensor, SensorId};
use crate::tables;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: Vec<Model>,
    usb_devices: Vec<UsbDeviceEntry>,
    sensors: Vec<Sensor>,
    motors: Vec<Motor>,
    motor_profiles: Vec<MotorProfile>,
}

impl Registry {
    /// Registry populated from the built-in tables.
    pub fn builtin() -> Self {
        let reg = Self {
            models: tables::builtin_models(),
            usb_devices: tables::builtin_usb_devices(),
            sensors: tables::builtin_sensors(),
            motors: tables::builtin_motors(),
            motor_profiles: tables::builtin_motor_profiles(),
        };
        tracing::debug!(
            models = reg.models.len(),
            sensors = reg.sensors.len(),
            motors = reg.motors.len(),
            profiles = reg.motor_profiles.len(),
            "registry built"
        );
        reg
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Drop every local modification and reload the built-in tables.
    pub fn reset(&mut self) {
        *self = Self::builtin();
    }

    pub fn push_model(&mut self, model: Model) -> &mut Self {
        self.models.push(model);
        self
    }

    pub fn push_usb_device(&mut self, entry: UsbDeviceEntry) -> &mut Self {
        self.usb_devices.push(entry);
        self
    }

    pub fn push_sensor(&mut self, sensor: Sensor) -> &mut Self {
        self.sensors.push(sensor);
        self
    }

    pub fn push_motor(&mut self, motor: Motor) -> &mut Self {
        self.motors.push(motor);
        self
    }

    pub fn push_motor_profile(&mut self, profile: MotorProfile) -> &mut Self {
        self.motor_profiles.push(profile);
        self
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn usb_devices(&self) -> &[UsbDeviceEntry] {
        &self.usb_devices
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn motors(&self) -> &[Motor] {
        &self.motors
    }

    pub fn motor_profiles(&self) -> &[MotorProfile] {
        &self.motor_profiles
    }

    pub fn model_by_name(&self, name: &str) -> Result<&Model> {
        self.models
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GenesysError::Config(format!("unknown model '{name}'")))
    }

    pub fn model_for_usb(&self, vendor_id: u16, product_id: u16) -> Result<&Model> {
        let entry = self
            .usb_devices
            .iter()
            .find(|e| e.vendor_id == vendor_id && e.product_id == product_id)
            .ok_or_else(|| {
                GenesysError::Config(format!(
                    "no model for usb device {vendor_id:04x}:{product_id:04x}"
                ))
            })?;
        self.model_by_name(entry.model)
    }

    pub fn motor(&self, id: MotorId) -> Result<&Motor> {
        self.motors
            .iter()
            .find(|m| m.id == id)
            .ok_or(GenesysError::MotorNotFound(id))
    }

    /// First sensor profile serving `dpi` with `channels` for `method`.
    pub fn find_sensor(
        &self,
        sensor_id: SensorId,
        dpi: u32,
        channels: u32,
        method: ScanMethod,
    ) -> Result<&Sensor> {
        self.sensors
            .iter()
            .find(|s| s.matches(sensor_id, dpi, channels, method))
            .ok_or(GenesysError::SensorNotFound {
                sensor_id,
                dpi,
                channels,
                method,
            })
    }

    pub fn has_sensor(&self, sensor_id: SensorId, dpi: u32, channels: u32, method: ScanMethod) -> bool {
        self.find_sensor(sensor_id, dpi, channels, method).is_ok()
    }

    /// Every profile of a sensor for one method, in table order.
    pub fn find_sensors_all(
        &self,
        sensor_id: SensorId,
        method: ScanMethod,
    ) -> impl Iterator<Item = &Sensor> {
        self.sensors
            .iter()
            .filter(move |s| s.sensor_id == sensor_id && s.method == method)
    }
}
