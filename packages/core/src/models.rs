//! Entities exchanged between the HTTP boundary, services and repositories.

use chrono::{DateTime, Datelike, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Default page number applied by the boundary when none (or garbage) is given.
pub const DEFAULT_PAGE: i64 = 1;
/// Default page size applied by the boundary.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Upper bound the boundary clamps page sizes to.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Device fields an update is allowed to overwrite. `kind` is immutable
/// after creation.
pub const UPDATABLE_FIELDS: &[&str] = &["name", "apiKey"];

/// A registered device.
///
/// An empty `id` marks a device that has not been persisted yet; the
/// repository assigns one on first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Build an identity-less device from a draft. Timestamps are
    /// placeholders until the repository stamps them.
    pub fn unsaved(draft: DeviceDraft) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: draft.name,
            kind: draft.kind,
            api_key: draft.api_key,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }

    /// Name, kind and API key must all be present before insert.
    pub fn validate_for_create(&self) -> AppResult<()> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.kind.is_empty() {
            missing.push("kind");
        }
        if self.api_key.is_empty() {
            missing.push("apiKey");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "missing required device fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Caller-supplied device fields. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_key: String,
}

impl DeviceDraft {
    /// Selective merge: copy each of [`UPDATABLE_FIELDS`] that is non-empty
    /// on the draft onto `device`. Everything else is left as stored.
    pub fn merge_into(&self, device: &mut Device) {
        if !self.name.is_empty() {
            device.name = self.name.clone();
        }
        if !self.api_key.is_empty() {
            device.api_key = self.api_key.clone();
        }
    }
}

/// A single time-stamped metric sample reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub id: i64,
    pub device_id: String,
    pub metric_name: String,
    pub metric_value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A reading before the store has assigned its id.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingDraft {
    pub device_id: String,
    pub metric_name: String,
    pub metric_value: f64,
    /// Capture time, assigned by the boundary when the caller omits it.
    pub captured_at: DateTime<Utc>,
}

impl ReadingDraft {
    pub fn validate(&self) -> AppResult<()> {
        if self.device_id.is_empty() || self.metric_name.is_empty() {
            return Err(AppError::validation(
                "device id and metric name are required",
            ));
        }
        check_storable(&self.captured_at)
    }
}

/// A validated, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    /// Reject non-positive page numbers or sizes.
    pub fn new(page: i64, page_size: i64) -> AppResult<Self> {
        if page <= 0 {
            return Err(AppError::validation(format!("invalid page: {}", page)));
        }
        if page_size <= 0 {
            return Err(AppError::validation(format!(
                "invalid page size: {}",
                page_size
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Boundary-side coercion: absent or non-positive values fall back to
    /// the defaults, and the size is clamped to [`MAX_PAGE_SIZE`].
    pub fn coerce(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let page_size = page_size
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Latest year the text encoding can hold (four-digit RFC 3339 years).
pub const MAX_STORABLE_YEAR: i32 = 9999;

/// Current time at the precision the store keeps.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Reject instants that `format_timestamp` could write but
/// `parse_timestamp` could not read back.
pub fn check_storable(ts: &DateTime<Utc>) -> AppResult<()> {
    if (0..=MAX_STORABLE_YEAR).contains(&ts.year()) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "timestamp {} is outside years 0000-{}",
            ts, MAX_STORABLE_YEAR
        )))
    }
}

/// Fixed-precision RFC 3339 so stored timestamps sort lexically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::persistence(format!("invalid stored timestamp '{}': {}", raw, e)))
}
