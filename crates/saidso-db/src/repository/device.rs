//! SurrealDB implementation of [`DeviceRepository`].
//!
//! The record id is derived from the `(user, ip, device_class)`
//! composite so an UPSERT always lands on the same row.

use chrono::{DateTime, Utc};
use saidso_core::error::SaidsoResult;
use saidso_core::models::device::{DeviceRecord, UpsertDevice};
use saidso_core::repository::DeviceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct DeviceRow {
    user_id: String,
    ip_address: String,
    device_class: String,
    last_active_at: DateTime<Utc>,
}

impl DeviceRow {
    fn try_into_record(self) -> Result<DeviceRecord, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(DeviceRecord {
            user_id,
            ip_address: self.ip_address,
            device_class: self.device_class,
            last_active_at: self.last_active_at,
        })
    }
}

/// SurrealDB implementation of the Device repository.
#[derive(Clone)]
pub struct SurrealDeviceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDeviceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

fn composite_key(input: &UpsertDevice) -> String {
    format!(
        "{}:{}:{}",
        input.user_id, input.ip_address, input.device_class
    )
}

impl<C: Connection> DeviceRepository for SurrealDeviceRepository<C> {
    async fn upsert(&self, input: UpsertDevice) -> SaidsoResult<()> {
        let key = composite_key(&input);

        self.db
            .query(
                "UPSERT type::record('device', $id) SET \
                 user_id = $user_id, \
                 ip_address = $ip_address, \
                 device_class = $device_class, \
                 last_active_at = time::now()",
            )
            .bind(("id", key))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("ip_address", input.ip_address))
            .bind(("device_class", input.device_class))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> SaidsoResult<Vec<DeviceRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM device WHERE user_id = $user_id \
                 ORDER BY last_active_at DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;

        let records = rows
            .into_iter()
            .map(|row| row.try_into_record())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(records)
    }
}
