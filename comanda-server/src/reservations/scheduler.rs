//! ReservationScheduler - conflict checking and table auto-assignment
//!
//! # Booking Flow
//!
//! ```text
//! reserve(cmd)
//!     ├─ 1. Parse "YYYY-MM-DD HH:MM:SS" wall-clock time
//!     ├─ 2. Resolve restaurant (and table, if one was requested)
//!     ├─ 3. Conflict scan: requested table only, or every table in creation order
//!     ├─ 4. Persist the reservation
//!     └─ 5. Commit (scan and insert share one write txn)
//! ```
//!
//! 冲突判定和落库在同一个写事务里，redb 写事务互斥，
//! 两个并发预订不可能都看到"无冲突"然后双双写入同一张桌。

use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{DiningTable, Reservation};
use crate::db::{RestaurantStore, StorageError};
use crate::utils::AppError;

/// 预订固定时长两小时
pub const RESERVATION_DURATION_MS: i64 = 2 * 60 * 60 * 1000;

/// Wire format for reservation times
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reservation errors
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table '{0}' does not belong to this restaurant")]
    TableMismatch(String),

    #[error("Invalid time '{0}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidTime(String),

    #[error("Table {0} is already booked for this time.")]
    Conflict(String),

    #[error("No tables available for this time slot.")]
    NoAvailability,
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let message = err.to_string();
        match err {
            ReservationError::Storage(_) => AppError::Database(message),
            ReservationError::RestaurantNotFound(_) | ReservationError::TableNotFound(_) => {
                AppError::NotFound(message)
            }
            ReservationError::TableMismatch(_) | ReservationError::InvalidTime(_) => {
                AppError::Validation(message)
            }
            ReservationError::Conflict(_) => AppError::Conflict(message),
            ReservationError::NoAvailability => AppError::NoAvailability(message),
        }
    }
}

pub type ReservationResult<T> = Result<T, ReservationError>;

/// 预订请求
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveTable {
    pub restaurant_id: String,
    /// 不指定就自动分配
    #[serde(default)]
    pub table_id: Option<String>,
    /// "YYYY-MM-DD HH:MM:SS"
    pub time: String,
    #[serde(default = "default_guests")]
    pub guests: u32,
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

fn default_guests() -> u32 {
    2
}

/// A confirmed booking with the assigned table's name
#[derive(Debug)]
pub struct BookedReservation {
    pub reservation: Reservation,
    pub table_name: String,
    /// Normalized wall-clock time, echoed back to the caller
    pub time: String,
}

// ========== Overlap predicate ==========

/// Two-hour window conflict test
///
/// 既有场次的开始时间落在 (new - 2h, new + 2h) 开区间内即冲突。
/// 两端都是严格比较：恰好首尾相接的两场（相差整两小时）不算冲突。
pub fn overlaps(existing_start: i64, new_start: i64) -> bool {
    existing_start < new_start + RESERVATION_DURATION_MS
        && existing_start > new_start - RESERVATION_DURATION_MS
}

/// Parse a wall-clock reservation time into Unix millis
pub fn parse_reservation_time(value: &str) -> ReservationResult<i64> {
    let naive = NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| ReservationError::InvalidTime(value.to_string()))?;
    Ok(naive.and_utc().timestamp_millis())
}

/// Format Unix millis back into the wire format
pub fn format_reservation_time(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.naive_utc().format(TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

// ========== Scheduler ==========

/// Reservation scheduler over the restaurant store
#[derive(Clone)]
pub struct ReservationScheduler {
    store: RestaurantStore,
}

impl ReservationScheduler {
    pub fn new(store: RestaurantStore) -> Self {
        Self { store }
    }

    /// Book a table, either the requested one or the first free one
    pub fn reserve(&self, cmd: ReserveTable) -> ReservationResult<BookedReservation> {
        let start = parse_reservation_time(&cmd.time)?;

        let txn = self.store.begin_write()?;

        let restaurant = self
            .store
            .get_restaurant_txn(&txn, &cmd.restaurant_id)?
            .ok_or_else(|| ReservationError::RestaurantNotFound(cmd.restaurant_id.clone()))?;

        let table = match &cmd.table_id {
            Some(id) => {
                let table = self
                    .store
                    .get_table_txn(&txn, id)?
                    .ok_or_else(|| ReservationError::TableNotFound(id.clone()))?;
                if table.restaurant_id != restaurant.id {
                    return Err(ReservationError::TableMismatch(table.name));
                }
                if self.has_conflict(&txn, &table.id, start)? {
                    return Err(ReservationError::Conflict(table.name));
                }
                table
            }
            None => self.first_free_table(&txn, &restaurant.id, start)?,
        };

        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            seq: self.store.next_entity_seq(&txn)?,
            restaurant_id: restaurant.id,
            table_id: Some(table.id.clone()),
            customer_name: cmd.name,
            customer_phone: cmd.phone,
            reservation_time: start,
            guests: cmd.guests,
            created_at: Utc::now().timestamp_millis(),
        };
        self.store.put_reservation_txn(&txn, &reservation)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            table = %table.name,
            time = %cmd.time,
            guests = reservation.guests,
            "reservation booked"
        );
        Ok(BookedReservation {
            reservation,
            table_name: table.name,
            time: format_reservation_time(start),
        })
    }

    /// 按创建顺序找第一张无冲突的桌子
    fn first_free_table(
        &self,
        txn: &redb::WriteTransaction,
        restaurant_id: &str,
        start: i64,
    ) -> ReservationResult<DiningTable> {
        let tables = self.store.tables_for_restaurant_txn(txn, restaurant_id)?;
        for table in tables {
            if !self.has_conflict(txn, &table.id, start)? {
                return Ok(table);
            }
        }
        Err(ReservationError::NoAvailability)
    }

    fn has_conflict(
        &self,
        txn: &redb::WriteTransaction,
        table_id: &str,
        start: i64,
    ) -> ReservationResult<bool> {
        let existing = self.store.reservations_for_table_txn(txn, table_id)?;
        Ok(existing
            .iter()
            .any(|r| overlaps(r.reservation_time, start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Restaurant;

    fn scheduler() -> (ReservationScheduler, Restaurant) {
        let store = RestaurantStore::open_in_memory().unwrap();
        let restaurant = store.create_restaurant("Trattoria Roma", "Via Appia 1").unwrap();
        (ReservationScheduler::new(store), restaurant)
    }

    fn cmd(restaurant_id: &str, table_id: Option<&str>, time: &str) -> ReserveTable {
        ReserveTable {
            restaurant_id: restaurant_id.to_string(),
            table_id: table_id.map(|s| s.to_string()),
            time: time.to_string(),
            guests: 2,
            name: "Ana".to_string(),
            phone: "600123456".to_string(),
        }
    }

    #[test]
    fn test_overlap_boundaries() {
        let base = parse_reservation_time("2025-07-01 19:00:00").unwrap();
        let at = |time: &str| parse_reservation_time(time).unwrap();

        // 已有 19:00 场，新场次窗口两小时
        assert!(overlaps(base, at("2025-07-01 20:30:00")));
        assert!(overlaps(base, at("2025-07-01 18:30:00")));
        assert!(overlaps(base, at("2025-07-01 19:00:00")));
        // 恰好首尾相接不算冲突
        assert!(!overlaps(base, at("2025-07-01 21:00:00")));
        assert!(!overlaps(base, at("2025-07-01 17:00:00")));
        assert!(!overlaps(base, at("2025-07-01 12:00:00")));
    }

    #[test]
    fn test_specific_table_conflict() {
        let (scheduler, restaurant) = scheduler();
        let table = scheduler.store.create_table(&restaurant.id, "Mesa 1").unwrap();

        scheduler
            .reserve(cmd(&restaurant.id, Some(&table.id), "2025-07-01 19:00:00"))
            .unwrap();

        let err = scheduler
            .reserve(cmd(&restaurant.id, Some(&table.id), "2025-07-01 20:30:00"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Table Mesa 1 is already booked for this time."
        );

        // 两小时后整点开场没有冲突
        let booked = scheduler
            .reserve(cmd(&restaurant.id, Some(&table.id), "2025-07-01 21:00:00"))
            .unwrap();
        assert_eq!(booked.table_name, "Mesa 1");
        assert_eq!(booked.time, "2025-07-01 21:00:00");
    }

    #[test]
    fn test_auto_assign_picks_first_free_in_creation_order() {
        let (scheduler, restaurant) = scheduler();
        let first = scheduler.store.create_table(&restaurant.id, "Mesa 1").unwrap();
        let second = scheduler.store.create_table(&restaurant.id, "Mesa 2").unwrap();

        let booked = scheduler
            .reserve(cmd(&restaurant.id, None, "2025-07-01 19:00:00"))
            .unwrap();
        assert_eq!(booked.reservation.table_id.as_deref(), Some(first.id.as_str()));

        let booked = scheduler
            .reserve(cmd(&restaurant.id, None, "2025-07-01 19:30:00"))
            .unwrap();
        assert_eq!(booked.reservation.table_id.as_deref(), Some(second.id.as_str()));

        let err = scheduler
            .reserve(cmd(&restaurant.id, None, "2025-07-01 20:00:00"))
            .unwrap_err();
        assert_eq!(err.to_string(), "No tables available for this time slot.");
    }

    #[test]
    fn test_booking_does_not_occupy_table() {
        let (scheduler, restaurant) = scheduler();
        let table = scheduler.store.create_table(&restaurant.id, "Mesa 1").unwrap();

        scheduler
            .reserve(cmd(&restaurant.id, Some(&table.id), "2025-07-01 19:00:00"))
            .unwrap();

        let table = scheduler.store.get_table(&table.id).unwrap().unwrap();
        assert!(!table.is_occupied);
    }

    #[test]
    fn test_foreign_table_rejected() {
        let (scheduler, restaurant) = scheduler();
        let other = scheduler.store.create_restaurant("Otra Casa", "Calle 2").unwrap();
        let foreign = scheduler.store.create_table(&other.id, "T9").unwrap();

        let err = scheduler
            .reserve(cmd(&restaurant.id, Some(&foreign.id), "2025-07-01 19:00:00"))
            .unwrap_err();
        assert!(matches!(err, ReservationError::TableMismatch(_)));
    }

    #[test]
    fn test_invalid_time_rejected() {
        let (scheduler, restaurant) = scheduler();
        scheduler.store.create_table(&restaurant.id, "Mesa 1").unwrap();

        let err = scheduler
            .reserve(cmd(&restaurant.id, None, "tomorrow evening"))
            .unwrap_err();
        assert!(matches!(err, ReservationError::InvalidTime(_)));

        let err = scheduler
            .reserve(cmd(&restaurant.id, None, "2025-07-01T19:00:00"))
            .unwrap_err();
        assert!(matches!(err, ReservationError::InvalidTime(_)));
    }
}
