use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{verify_connection, DeviceRepository};
use crate::error::{AppError, AppResult};
use crate::models::{format_timestamp, now_micros, parse_timestamp, Device, Pagination};

/// SQLite implementation of [`DeviceRepository`].
#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Wrap `pool`, failing with `Persistence` if it cannot hand out a
    /// connection.
    pub async fn connect(pool: SqlitePool) -> AppResult<Self> {
        verify_connection(&pool).await?;
        Ok(Self { pool })
    }

    async fn insert(&self, device: &Device) -> AppResult<String> {
        device.validate_for_create()?;

        let id = Uuid::new_v4().to_string();
        let now = format_timestamp(&now_micros());

        sqlx::query(
            "INSERT INTO devices (id, name, kind, api_key, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&device.name)
        .bind(&device.kind)
        .bind(&device.api_key)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(device_id = %id, "Inserted device");
        Ok(id)
    }

    async fn update(&self, device: &Device) -> AppResult<String> {
        let updated_at = format_timestamp(&device.updated_at);

        let result = sqlx::query(
            "UPDATE devices SET name = ?, kind = ?, api_key = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&device.name)
        .bind(&device.kind)
        .bind(&device.api_key)
        .bind(&updated_at)
        .bind(&device.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("no device found with id: {}", device.id)));
        }

        debug!(device_id = %device.id, "Updated device");
        Ok(device.id.clone())
    }
}

fn device_from_row(row: &SqliteRow) -> AppResult<Device> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Device {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind: row.try_get("kind")?,
        api_key: row.try_get("api_key")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait]
impl DeviceRepository for SqliteDeviceRepository {
    #[instrument(skip(self, device), fields(device_id = %device.id))]
    async fn save(&self, device: &Device) -> AppResult<String> {
        if device.has_identity() {
            self.update(device).await
        } else {
            self.insert(device).await
        }
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> AppResult<Device> {
        let row = sqlx::query(
            "SELECT id, name, kind, api_key, created_at, updated_at FROM devices WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no device found with id: {}", id)))?;

        device_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("no device found with id: {}", id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, page: i64, page_size: i64) -> AppResult<Vec<Device>> {
        let page = Pagination::new(page, page_size)?;

        let rows = sqlx::query(
            "SELECT id, name, kind, api_key, created_at, updated_at
             FROM devices
             ORDER BY created_at ASC, rowid ASC
             LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(device_from_row).collect()
    }
}
