//! Built-in device tables used by [`crate::registry::Registry::builtin`].
//!
//! Values are representative of the real hardware, not calibrated dumps.

mod models;
mod motors;
mod sensors;

pub(crate) use models::{builtin_models, builtin_usb_devices};
pub(crate) use motors::{builtin_motor_profiles, builtin_motors};
pub(crate) use sensors::builtin_sensors;
