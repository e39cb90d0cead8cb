//! Availability store
//!
//! Row-level access to availability blocks and blocked days. Callers are
//! expected to run mutations inside [`Database::write`](super::Database::write)
//! and to validate with [`validate_block`](crate::domain::validate_block)
//! before inserting.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    AvailabilityBlock, BlockDraft, BlockId, BlockedDay, NotFoundError, VeterinarianId,
};
use crate::error::Result;

const BLOCK_COLUMNS: &str =
    "id, veterinarian_id, date, start_time, end_time, status, created_at, updated_at";

const DAY_COLUMNS: &str = "id, veterinarian_id, date, reason, created_at";

/// Availability blocks and blocked days
pub struct AvailabilityRepo<'c> {
    conn: &'c Connection,
}

impl<'c> AvailabilityRepo<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn block_from_row(row: &Row<'_>) -> rusqlite::Result<AvailabilityBlock> {
        Ok(AvailabilityBlock {
            id: row.get(0)?,
            veterinarian: row.get(1)?,
            date: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn day_from_row(row: &Row<'_>) -> rusqlite::Result<BlockedDay> {
        Ok(BlockedDay {
            id: row.get(0)?,
            veterinarian: row.get(1)?,
            date: row.get(2)?,
            reason: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    /// Gets a block by ID
    pub fn get_block(&self, id: BlockId) -> Result<Option<AvailabilityBlock>> {
        let block = self
            .conn
            .query_row(
                &format!("SELECT {} FROM availability_blocks WHERE id = ?1", BLOCK_COLUMNS),
                params![id],
                Self::block_from_row,
            )
            .optional()?;

        Ok(block)
    }

    /// Gets a block by ID, failing when absent
    pub fn require_block(&self, id: BlockId) -> Result<AvailabilityBlock> {
        self.get_block(id)?
            .ok_or_else(|| NotFoundError::Block(id).into())
    }

    /// All blocks of a veterinarian on one day, by start time
    pub fn blocks_for_day(
        &self,
        veterinarian: VeterinarianId,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityBlock>> {
        self.blocks_between(veterinarian, date, date)
    }

    /// Blocks of a veterinarian between two dates (inclusive)
    pub fn blocks_between(
        &self,
        veterinarian: VeterinarianId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityBlock>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM availability_blocks
             WHERE veterinarian_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date, start_time",
            BLOCK_COLUMNS
        ))?;

        let blocks = stmt
            .query_map(params![veterinarian, from, to], Self::block_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(blocks)
    }

    /// Inserts a block that has already been validated
    pub fn insert_block(&self, draft: &BlockDraft, now: NaiveDateTime) -> Result<AvailabilityBlock> {
        self.conn.execute(
            "INSERT INTO availability_blocks
                (veterinarian_id, date, start_time, end_time, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                draft.veterinarian,
                draft.date,
                draft.start_time,
                draft.end_time,
                draft.status,
                now,
            ],
        )?;

        Ok(AvailabilityBlock {
            id: BlockId::new(self.conn.last_insert_rowid()),
            veterinarian: draft.veterinarian,
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrites a block with a validated draft
    pub fn update_block(
        &self,
        id: BlockId,
        draft: &BlockDraft,
        now: NaiveDateTime,
    ) -> Result<AvailabilityBlock> {
        let changed = self.conn.execute(
            "UPDATE availability_blocks
             SET veterinarian_id = ?2, date = ?3, start_time = ?4, end_time = ?5,
                 status = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                id,
                draft.veterinarian,
                draft.date,
                draft.start_time,
                draft.end_time,
                draft.status,
                now,
            ],
        )?;

        if changed == 0 {
            return Err(NotFoundError::Block(id).into());
        }
        self.require_block(id)
    }

    /// Deletes a block
    pub fn delete_block(&self, id: BlockId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM availability_blocks WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(NotFoundError::Block(id).into());
        }
        Ok(())
    }

    /// Gets the blocked-day record of a veterinarian for a date
    pub fn blocked_day(
        &self,
        veterinarian: VeterinarianId,
        date: NaiveDate,
    ) -> Result<Option<BlockedDay>> {
        let day = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM blocked_days WHERE veterinarian_id = ?1 AND date = ?2",
                    DAY_COLUMNS
                ),
                params![veterinarian, date],
                Self::day_from_row,
            )
            .optional()?;

        Ok(day)
    }

    /// Returns true if the veterinarian has blocked the whole day
    pub fn is_day_blocked(&self, veterinarian: VeterinarianId, date: NaiveDate) -> Result<bool> {
        Ok(self.blocked_day(veterinarian, date)?.is_some())
    }

    /// Blocks a day; the caller checks it is not already blocked
    pub fn insert_blocked_day(
        &self,
        veterinarian: VeterinarianId,
        date: NaiveDate,
        reason: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<BlockedDay> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());

        self.conn.execute(
            "INSERT INTO blocked_days (veterinarian_id, date, reason, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![veterinarian, date, reason, now],
        )?;

        Ok(BlockedDay {
            id: crate::domain::BlockedDayId::new(self.conn.last_insert_rowid()),
            veterinarian,
            date,
            reason: reason.map(str::to_string),
            created_at: now,
        })
    }

    /// Unblocks a day, returning whether it was blocked
    pub fn delete_blocked_day(&self, veterinarian: VeterinarianId, date: NaiveDate) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM blocked_days WHERE veterinarian_id = ?1 AND date = ?2",
            params![veterinarian, date],
        )?;

        Ok(changed > 0)
    }

    /// Blocked days of a veterinarian between two dates, newest first
    pub fn blocked_days_between(
        &self,
        veterinarian: VeterinarianId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BlockedDay>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM blocked_days
             WHERE veterinarian_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date DESC",
            DAY_COLUMNS
        ))?;

        let days = stmt
            .query_map(params![veterinarian, from, to], Self::day_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AvailabilityStatus, NewStaff, StaffProfile};
    use crate::storage::{Database, RegistryRepo};
    use chrono::NaiveTime;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn setup() -> (Database, VeterinarianId) {
        let mut db = Database::open_in_memory().unwrap();
        let vet = db
            .write(|tx| {
                RegistryRepo::new(tx).insert_staff(
                    &NewStaff {
                        name: "Dra. Rojas".into(),
                        email: "rojas@pochita.cl".into(),
                        rut: String::new(),
                        phone: String::new(),
                        profile: StaffProfile::Veterinarian {
                            specialty: "General".into(),
                            shift: "AM".into(),
                        },
                    },
                    now(),
                )
            })
            .unwrap();
        (db, vet.id)
    }

    fn draft(vet: VeterinarianId, d: u32, start: NaiveTime, end: NaiveTime) -> BlockDraft {
        BlockDraft {
            veterinarian: vet,
            date: day(d),
            start_time: start,
            end_time: end,
            status: AvailabilityStatus::Available,
        }
    }

    #[test]
    fn insert_and_list_blocks_in_order() {
        let (mut db, vet) = setup();

        db.write(|tx| {
            let repo = AvailabilityRepo::new(tx);
            repo.insert_block(&draft(vet, 10, t(11, 0), t(12, 0)), now())?;
            repo.insert_block(&draft(vet, 10, t(9, 0), t(10, 0)), now())?;
            repo.insert_block(&draft(vet, 12, t(9, 0), t(10, 0)), now())?;
            Ok(())
        })
        .unwrap();

        let repo = AvailabilityRepo::new(db.conn());
        let day_blocks = repo.blocks_for_day(vet, day(10)).unwrap();
        assert_eq!(day_blocks.len(), 2);
        assert_eq!(day_blocks[0].start_time, t(9, 0));
        assert_eq!(day_blocks[1].start_time, t(11, 0));

        assert_eq!(repo.blocks_between(vet, day(1), day(30)).unwrap().len(), 3);
    }

    #[test]
    fn update_and_delete_missing_block_is_not_found() {
        let (mut db, vet) = setup();

        let result = db.write(|tx| {
            AvailabilityRepo::new(tx).update_block(BlockId::new(99), &draft(vet, 10, t(9, 0), t(10, 0)), now())
        });
        assert_eq!(result.unwrap_err().code(), "block_not_found");

        let result = db.write(|tx| AvailabilityRepo::new(tx).delete_block(BlockId::new(99)));
        assert_eq!(result.unwrap_err().code(), "block_not_found");
    }

    #[test]
    fn blocked_day_is_unique_per_veterinarian_and_date() {
        let (mut db, vet) = setup();

        db.write(|tx| AvailabilityRepo::new(tx).insert_blocked_day(vet, day(10), Some("Congreso"), now()))
            .unwrap();
        let dup = db.write(|tx| AvailabilityRepo::new(tx).insert_blocked_day(vet, day(10), None, now()));
        assert!(dup.is_err());

        let repo = AvailabilityRepo::new(db.conn());
        let blocked = repo.blocked_day(vet, day(10)).unwrap().unwrap();
        assert_eq!(blocked.reason.as_deref(), Some("Congreso"));
    }

    #[test]
    fn blocked_days_list_newest_first() {
        let (mut db, vet) = setup();

        db.write(|tx| {
            let repo = AvailabilityRepo::new(tx);
            repo.insert_blocked_day(vet, day(3), None, now())?;
            repo.insert_blocked_day(vet, day(20), Some("  "), now())?;
            Ok(())
        })
        .unwrap();

        let days = AvailabilityRepo::new(db.conn())
            .blocked_days_between(vet, day(1), day(30))
            .unwrap();
        assert_eq!(days.iter().map(|d| d.date).collect::<Vec<_>>(), vec![day(20), day(3)]);
        assert_eq!(days[0].reason, None);
    }

    #[test]
    fn delete_blocked_day_reports_whether_it_existed() {
        let (mut db, vet) = setup();

        db.write(|tx| AvailabilityRepo::new(tx).insert_blocked_day(vet, day(10), None, now()))
            .unwrap();

        assert!(db.write(|tx| AvailabilityRepo::new(tx).delete_blocked_day(vet, day(10))).unwrap());
        assert!(!db.write(|tx| AvailabilityRepo::new(tx).delete_blocked_day(vet, day(10))).unwrap());
    }
}
