use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::{ReadingDraft, SensorReading};
use crate::repository::SensorReadingRepository;

/// Sensor reading lifecycle. Readings are append-only: there is no update.
///
/// Every call forwards to the repository unchanged; the service is the
/// seam where reading policy would go.
pub struct SensorReadingService {
    repository: Arc<dyn SensorReadingRepository>,
}

impl SensorReadingService {
    pub fn new(repository: Arc<dyn SensorReadingRepository>) -> Self {
        Self { repository }
    }

    /// Store a reading. `captured_at` is whatever the boundary stamped.
    pub async fn create_reading(&self, draft: ReadingDraft) -> AppResult<i64> {
        let id = self.repository.save(&draft).await?;
        info!(reading_id = id, device_id = %draft.device_id, "Sensor reading recorded");
        Ok(id)
    }

    pub async fn find_reading_by_id(&self, id: i64) -> AppResult<SensorReading> {
        self.repository.find_by_id(id).await
    }

    pub async fn find_readings_by_device(&self, device_id: &str) -> AppResult<Vec<SensorReading>> {
        let readings = self.repository.find_by_device(device_id).await?;
        debug!(device_id = %device_id, count = readings.len(), "Fetched readings for device");
        Ok(readings)
    }

    pub async fn fetch_readings(&self, page: i64, page_size: i64) -> AppResult<Vec<SensorReading>> {
        let readings = self.repository.list(page, page_size).await?;
        debug!(count = readings.len(), page, page_size, "Listed sensor readings");
        Ok(readings)
    }

    pub async fn delete_reading(&self, id: i64) -> AppResult<()> {
        self.repository.delete(id).await?;
        info!(reading_id = id, "Sensor reading deleted");
        Ok(())
    }
}
