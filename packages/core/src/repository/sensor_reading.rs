use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use super::{verify_connection, SensorReadingRepository};
use crate::error::{AppError, AppResult};
use crate::models::{format_timestamp, parse_timestamp, Pagination, ReadingDraft, SensorReading};

/// SQLite implementation of [`SensorReadingRepository`].
#[derive(Clone)]
pub struct SqliteSensorReadingRepository {
    pool: SqlitePool,
}

impl SqliteSensorReadingRepository {
    pub async fn connect(pool: SqlitePool) -> AppResult<Self> {
        verify_connection(&pool).await?;
        Ok(Self { pool })
    }
}

fn reading_from_row(row: &SqliteRow) -> AppResult<SensorReading> {
    let timestamp: String = row.try_get("timestamp")?;

    Ok(SensorReading {
        id: row.try_get("id")?,
        device_id: row.try_get("device_id")?,
        metric_name: row.try_get("metric_name")?,
        metric_value: row.try_get("metric_value")?,
        timestamp: parse_timestamp(&timestamp)?,
    })
}

fn not_found_reading(id: i64) -> AppError {
    AppError::not_found(format!("no sensor reading found with id: {}", id))
}

#[async_trait]
impl SensorReadingRepository for SqliteSensorReadingRepository {
    #[instrument(skip(self, reading), fields(device_id = %reading.device_id, metric = %reading.metric_name))]
    async fn save(&self, reading: &ReadingDraft) -> AppResult<i64> {
        reading.validate()?;

        let result = sqlx::query(
            "INSERT INTO sensor_readings (device_id, metric_name, metric_value, timestamp)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&reading.device_id)
        .bind(&reading.metric_name)
        .bind(reading.metric_value)
        .bind(format_timestamp(&reading.captured_at))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(reading_id = id, "Inserted sensor reading");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> AppResult<SensorReading> {
        if id <= 0 {
            return Err(not_found_reading(id));
        }

        let row = sqlx::query(
            "SELECT id, device_id, metric_name, metric_value, timestamp
             FROM sensor_readings WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_reading(id))?;

        reading_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn find_by_device(&self, device_id: &str) -> AppResult<Vec<SensorReading>> {
        if device_id.is_empty() {
            return Err(AppError::validation("device id is required"));
        }

        let rows = sqlx::query(
            "SELECT id, device_id, metric_name, metric_value, timestamp
             FROM sensor_readings WHERE device_id = ? ORDER BY id ASC",
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::not_found(format!(
                "no sensor readings found for device: {}",
                device_id
            )));
        }

        rows.iter().map(reading_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> AppResult<()> {
        if id <= 0 {
            return Err(AppError::validation(format!("invalid sensor reading id: {}", id)));
        }

        let result = sqlx::query("DELETE FROM sensor_readings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_reading(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, page: i64, page_size: i64) -> AppResult<Vec<SensorReading>> {
        let page = Pagination::new(page, page_size)?;

        let rows = sqlx::query(
            "SELECT id, device_id, metric_name, metric_value, timestamp
             FROM sensor_readings ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::not_found(format!(
                "no sensor readings on page {} (page size {})",
                page.page, page.page_size
            )));
        }

        rows.iter().map(reading_from_row).collect()
    }
}
