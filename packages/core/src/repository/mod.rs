//! Persistence ports and their SQLite adapters.
//!
//! Services only ever see the [`DeviceRepository`] and
//! [`SensorReadingRepository`] traits. The concrete adapters are built once
//! at startup and injected as `Arc<dyn ...>`.

mod device;
mod sensor_reading;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{Device, ReadingDraft, SensorReading};

pub use device::SqliteDeviceRepository;
pub use sensor_reading::SqliteSensorReadingRepository;

/// Storage operations for devices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Insert when `device.id` is empty (returning the generated identity),
    /// otherwise overwrite the stored row, `updated_at` included, with
    /// `device` as given.
    async fn save(&self, device: &Device) -> AppResult<String>;

    async fn find_by_id(&self, id: &str) -> AppResult<Device>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Devices by creation time, oldest first. A page past the end is empty.
    async fn list(&self, page: i64, page_size: i64) -> AppResult<Vec<Device>>;
}

/// Storage operations for sensor readings. Readings are append-only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SensorReadingRepository: Send + Sync {
    /// Insert a reading and return its store-assigned id.
    async fn save(&self, reading: &ReadingDraft) -> AppResult<i64>;

    async fn find_by_id(&self, id: i64) -> AppResult<SensorReading>;

    /// All readings for a device in insertion order. An empty result is
    /// `NotFound`, whether or not the device exists.
    async fn find_by_device(&self, device_id: &str) -> AppResult<Vec<SensorReading>>;

    async fn delete(&self, id: i64) -> AppResult<()>;

    /// Readings in insertion order. An empty page is `NotFound`.
    async fn list(&self, page: i64, page_size: i64) -> AppResult<Vec<SensorReading>>;
}

/// Acquire (and immediately release) one connection so a dead pool fails
/// at construction rather than on the first request.
async fn verify_connection(pool: &SqlitePool) -> AppResult<()> {
    pool.acquire()
        .await
        .map(drop)
        .map_err(|e| AppError::persistence(format!("failed to connect to the database: {}", e)))
}
