//! Service layer between the HTTP boundary and the persistence ports.

pub mod device;
pub mod sensor_reading;

pub use device::DeviceService;
pub use sensor_reading::SensorReadingService;
