//! The scheduler: availability and blocked days
//!
//! [`Scheduler`] owns the database handle, the clock and the scheduling
//! rules. Every mutation checks the actor's capability, then validates and
//! writes inside one [`Database::write`] transaction.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use tracing::{debug, info};

use super::actor::{Actor, Operation};
use crate::domain::{
    validate_block, validate_day_mutation, AvailabilityBlock, BlockDraft, BlockId, BlockedDay,
    Clock, DayToggle, Month, SystemClock, ValidationError, VeterinarianId,
};
use crate::error::{Error, Result};
use crate::storage::{AvailabilityRepo, Database, RegistryRepo, SchedulingConfig};

/// Scheduling service over one clinic database
pub struct Scheduler<C: Clock = SystemClock> {
    pub(super) db: Database,
    pub(super) clock: C,
    pub(super) config: SchedulingConfig,
}

impl Scheduler<SystemClock> {
    /// Scheduler on the wall clock
    pub fn open(db: Database, config: SchedulingConfig) -> Self {
        Self::new(db, SystemClock, config)
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn new(db: Database, clock: C, config: SchedulingConfig) -> Self {
        Self { db, clock, config }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Checks that the actor's registry record exists under the claimed role
    pub fn resolve(&self, actor: &Actor) -> Result<()> {
        resolve_actor(self.db.conn(), actor)
    }

    /// Resolves the actor and checks one capability
    pub(super) fn authorize(&self, actor: &Actor, operation: Operation<'_>) -> Result<()> {
        self.resolve(actor)?;
        actor.authorize(operation)
    }

    // --- availability blocks -----------------------------------------------

    /// Creates an availability block
    ///
    /// Fails with `invalid_range`, `past_date`, `overlap` or `blocked_day`.
    pub fn create_block(&mut self, actor: &Actor, draft: BlockDraft) -> Result<AvailabilityBlock> {
        self.authorize(actor, Operation::ManageAvailability { veterinarian: draft.veterinarian })?;
        let (today, now) = (self.clock.today(), self.clock.now());

        let block = self.db.write(|tx| {
            RegistryRepo::new(tx).require_veterinarian(draft.veterinarian)?;
            check_block(tx, &draft, None, today)?;
            AvailabilityRepo::new(tx).insert_block(&draft, now)
        })?;

        info!(
            block_id = %block.id,
            vet = %block.veterinarian,
            date = %block.date,
            "availability block created"
        );
        Ok(block)
    }

    /// Replaces a block's veterinarian, date, times and status
    ///
    /// Re-validated against every other block of the target veterinarian/day.
    pub fn update_block(
        &mut self,
        actor: &Actor,
        id: BlockId,
        draft: BlockDraft,
    ) -> Result<AvailabilityBlock> {
        self.resolve(actor)?;
        let (today, now) = (self.clock.today(), self.clock.now());

        let block = self.db.write(|tx| {
            let repo = AvailabilityRepo::new(tx);
            let current = repo.require_block(id)?;
            actor.authorize(Operation::ManageAvailability { veterinarian: current.veterinarian })?;
            actor.authorize(Operation::ManageAvailability { veterinarian: draft.veterinarian })?;

            RegistryRepo::new(tx).require_veterinarian(draft.veterinarian)?;
            check_block(tx, &draft, Some(id), today)?;
            repo.update_block(id, &draft, now)
        })?;

        info!(block_id = %block.id, date = %block.date, "availability block updated");
        Ok(block)
    }

    /// Deletes a block, returning it
    pub fn delete_block(&mut self, actor: &Actor, id: BlockId) -> Result<AvailabilityBlock> {
        self.resolve(actor)?;

        let block = self.db.write(|tx| {
            let repo = AvailabilityRepo::new(tx);
            let block = repo.require_block(id)?;
            actor.authorize(Operation::ManageAvailability { veterinarian: block.veterinarian })?;
            repo.delete_block(id)?;
            Ok(block)
        })?;

        info!(block_id = %id, vet = %block.veterinarian, "availability block deleted");
        Ok(block)
    }

    /// Gets one block
    pub fn block(&self, id: BlockId) -> Result<AvailabilityBlock> {
        AvailabilityRepo::new(self.db.conn()).require_block(id)
    }

    /// Blocks of a veterinarian between two dates, inclusive
    pub fn blocks_between(
        &self,
        veterinarian: VeterinarianId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityBlock>> {
        if to < from {
            return Err(ValidationError::InvalidFormat {
                field: "date range",
                value: format!("{} .. {}", from, to),
            }
            .into());
        }
        RegistryRepo::new(self.db.conn()).require_veterinarian(veterinarian)?;
        AvailabilityRepo::new(self.db.conn()).blocks_between(veterinarian, from, to)
    }

    /// Blocks of a veterinarian in one month
    pub fn blocks_for_month(
        &self,
        veterinarian: VeterinarianId,
        month: Month,
    ) -> Result<Vec<AvailabilityBlock>> {
        self.blocks_between(veterinarian, month.first_day(), month.last_day())
    }

    // --- blocked days ------------------------------------------------------

    /// Blocks the day if it is open, unblocks it if it is blocked
    pub fn toggle_day(
        &mut self,
        actor: &Actor,
        veterinarian: VeterinarianId,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<DayToggle> {
        self.authorize(actor, Operation::ManageAvailability { veterinarian })?;
        let (today, now) = (self.clock.today(), self.clock.now());

        let outcome = self.db.write(|tx| {
            validate_day_mutation(date, today)?;
            RegistryRepo::new(tx).require_veterinarian(veterinarian)?;

            let repo = AvailabilityRepo::new(tx);
            if repo.delete_blocked_day(veterinarian, date)? {
                Ok(DayToggle::Unblocked { veterinarian, date })
            } else {
                Ok(DayToggle::Blocked(repo.insert_blocked_day(veterinarian, date, reason, now)?))
            }
        })?;

        info!(vet = %veterinarian, %date, blocked = outcome.is_blocked(), "day toggled");
        Ok(outcome)
    }

    /// Blocks a day; a day that is already blocked is returned unchanged
    pub fn block_day(
        &mut self,
        actor: &Actor,
        veterinarian: VeterinarianId,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<BlockedDay> {
        self.authorize(actor, Operation::ManageAvailability { veterinarian })?;
        let (today, now) = (self.clock.today(), self.clock.now());

        self.db.write(|tx| {
            validate_day_mutation(date, today)?;
            RegistryRepo::new(tx).require_veterinarian(veterinarian)?;

            let repo = AvailabilityRepo::new(tx);
            if let Some(existing) = repo.blocked_day(veterinarian, date)? {
                debug!(vet = %veterinarian, %date, "day already blocked");
                return Ok(existing);
            }
            let day = repo.insert_blocked_day(veterinarian, date, reason, now)?;
            info!(vet = %veterinarian, %date, "day blocked");
            Ok(day)
        })
    }

    /// Unblocks a day, returning whether it was blocked
    pub fn unblock_day(
        &mut self,
        actor: &Actor,
        veterinarian: VeterinarianId,
        date: NaiveDate,
    ) -> Result<bool> {
        self.authorize(actor, Operation::ManageAvailability { veterinarian })?;
        let today = self.clock.today();

        let removed = self.db.write(|tx| {
            validate_day_mutation(date, today)?;
            RegistryRepo::new(tx).require_veterinarian(veterinarian)?;
            AvailabilityRepo::new(tx).delete_blocked_day(veterinarian, date)
        })?;

        if removed {
            info!(vet = %veterinarian, %date, "day unblocked");
        }
        Ok(removed)
    }

    /// Blocked days of a veterinarian in one month, newest first
    pub fn blocked_days_for_month(
        &self,
        veterinarian: VeterinarianId,
        month: Month,
    ) -> Result<Vec<BlockedDay>> {
        RegistryRepo::new(self.db.conn()).require_veterinarian(veterinarian)?;
        AvailabilityRepo::new(self.db.conn()).blocked_days_between(
            veterinarian,
            month.first_day(),
            month.last_day(),
        )
    }
}

/// Validates a block draft against the stored blocks and blocked days
fn check_block(
    conn: &Connection,
    draft: &BlockDraft,
    editing: Option<BlockId>,
    today: NaiveDate,
) -> Result<()> {
    let repo = AvailabilityRepo::new(conn);
    let existing = repo.blocks_for_day(draft.veterinarian, draft.date)?;

    if let Err(e) = validate_block(draft, &existing, editing, today) {
        debug!(vet = %draft.veterinarian, date = %draft.date, code = e.code(), "block rejected");
        return Err(e.into());
    }
    if repo.is_day_blocked(draft.veterinarian, draft.date)? {
        return Err(ValidationError::BlockedDay {
            veterinarian: draft.veterinarian,
            date: draft.date,
        }
        .into());
    }
    Ok(())
}

/// Checks the actor's record exists with the claimed role
fn resolve_actor(conn: &Connection, actor: &Actor) -> Result<()> {
    let registry = RegistryRepo::new(conn);
    match *actor {
        Actor::Operator => Ok(()),
        Actor::Client { id } => registry.require_client(id).map(|_| ()),
        Actor::Staff { id, role } => {
            let staff = registry.require_staff(id)?;
            if staff.role() != role {
                return Err(Error::Forbidden {
                    role,
                    operation: "act under another staff member's role",
                });
            }
            Ok(())
        }
    }
}
