use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::{now_micros, Device, DeviceDraft};
use crate::repository::DeviceRepository;

/// Device lifecycle: create, selective update, lookup, delete, listing.
///
/// `update_device` reads then writes in two separate statements. A
/// concurrent update landing between the two is overwritten.
pub struct DeviceService {
    repository: Arc<dyn DeviceRepository>,
}

impl DeviceService {
    pub fn new(repository: Arc<dyn DeviceRepository>) -> Self {
        Self { repository }
    }

    /// Persist a new device and return the identity the store assigned.
    pub async fn create_device(&self, draft: DeviceDraft) -> AppResult<String> {
        let device = Device::unsaved(draft);
        let id = self.repository.save(&device).await?;

        info!(device_id = %id, kind = %device.kind, "Device created");
        Ok(id)
    }

    /// Merge the non-empty updatable fields of `draft` onto the stored
    /// device and persist it. Returns the device as saved.
    pub async fn update_device(&self, id: &str, draft: DeviceDraft) -> AppResult<Device> {
        let mut device = self
            .repository
            .find_by_id(id)
            .await
            .map_err(|e| e.context(format!("updating device {}", id)))?;

        draft.merge_into(&mut device);
        device.updated_at = now_micros().max(device.updated_at);

        self.repository
            .save(&device)
            .await
            .map_err(|e| e.context(format!("updating device {}", id)))?;

        debug!(device_id = %id, "Device updated");
        Ok(device)
    }

    pub async fn find_device_by_id(&self, id: &str) -> AppResult<Device> {
        self.repository.find_by_id(id).await
    }

    /// Page through devices. Callers coerce `page`/`page_size` first.
    pub async fn fetch_devices(&self, page: i64, page_size: i64) -> AppResult<Vec<Device>> {
        let devices = self.repository.list(page, page_size).await?;
        debug!(count = devices.len(), page, page_size, "Listed devices");
        Ok(devices)
    }

    pub async fn delete_device(&self, id: &str) -> AppResult<()> {
        self.repository.delete(id).await?;
        info!(device_id = %id, "Device deleted");
        Ok(())
    }
}
