//! Permission infrastructure module

mod device;

pub use device::DevicePermission;
