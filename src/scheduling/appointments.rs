//! Booking, status changes and cancel-and-reschedule

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, info};

use super::actor::{Actor, Operation};
use super::Scheduler;
use crate::domain::{
    slot_end, Appointment, AppointmentId, AppointmentStatus, BookingRequest, Clock,
    RescheduleRequest, Rescheduled, StatusChange, TimeRange, ValidationError,
};
use crate::error::Result;
use crate::storage::{
    AvailabilityRepo, LedgerRepo, NewAppointment, RegistryRepo, SchedulingConfig,
};

impl<C: Clock> Scheduler<C> {
    /// Books a pending appointment
    ///
    /// The end time comes from the service duration rounded up to the slot
    /// size unless the request gives one. Availability blocks are not
    /// consulted.
    pub fn book(&mut self, actor: &Actor, request: BookingRequest) -> Result<Appointment> {
        self.authorize(
            actor,
            Operation::Book {
                client: request.client,
                veterinarian: request.veterinarian,
            },
        )?;
        let (today, now) = (self.clock.today(), self.clock.now());
        let config = &self.config;

        let appointment = self.db.write(|tx| {
            let new = prepare_booking(tx, config, today, &request)?;
            LedgerRepo::new(tx).insert(&new, now)
        })?;

        info!(
            appointment_id = %appointment.id,
            vet = %appointment.veterinarian,
            date = %appointment.date,
            start = %appointment.start_time.format("%H:%M"),
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Moves an appointment to a new status
    ///
    /// Cancelling records the reason (or the configured default) and the
    /// actor's role. Re-applying the current status changes nothing.
    pub fn set_status(&mut self, actor: &Actor, change: StatusChange) -> Result<Appointment> {
        let status: AppointmentStatus = change.status.parse()?;
        self.resolve(actor)?;
        let now = self.clock.now();
        let config = &self.config;

        let (appointment, changed) = self.db.write(|tx| {
            let ledger = LedgerRepo::new(tx);
            let current = ledger.require(change.appointment)?;
            actor.authorize(Operation::ChangeStatus {
                appointment: &current,
                status,
            })?;
            config.transition_policy.check(current.status, status)?;

            if current.status == status {
                return Ok((current, false));
            }

            let reason = cancellation_reason(
                change.reason.as_deref(),
                &config.default_cancellation_reason,
            );
            let cancellation =
                (status == AppointmentStatus::Cancelled).then(|| (reason, actor.role()));
            let updated = ledger.update_status(current.id, status, cancellation, now)?;
            Ok((updated, true))
        })?;

        if changed {
            info!(appointment_id = %appointment.id, status = %appointment.status, "status changed");
        } else {
            debug!(appointment_id = %appointment.id, status = %status, "status unchanged");
        }
        Ok(appointment)
    }

    /// Cancels an appointment and books its replacement in one transaction
    ///
    /// The replacement copies client, pet, service and notes; the
    /// veterinarian defaults to the original one and the end time is
    /// recomputed from the service. If the replacement cannot be booked the
    /// original is left untouched.
    pub fn cancel_and_reschedule(
        &mut self,
        actor: &Actor,
        request: RescheduleRequest,
    ) -> Result<Rescheduled> {
        self.resolve(actor)?;
        let (today, now) = (self.clock.today(), self.clock.now());
        let config = &self.config;

        let outcome = self.db.write(|tx| {
            let ledger = LedgerRepo::new(tx);
            let original = ledger.require(request.appointment)?;
            actor.authorize(Operation::Reschedule { appointment: &original })?;
            if original.status == AppointmentStatus::Cancelled {
                return Err(ValidationError::InvalidTransition {
                    from: original.status,
                    to: AppointmentStatus::Cancelled,
                }
                .into());
            }
            config
                .transition_policy
                .check(original.status, AppointmentStatus::Cancelled)?;

            let reason = cancellation_reason(request.reason.as_deref(), &config.reschedule_reason);
            let cancelled = ledger.update_status(
                original.id,
                AppointmentStatus::Cancelled,
                Some((reason, actor.role())),
                now,
            )?;

            let veterinarian = request.veterinarian.unwrap_or(original.veterinarian);
            if veterinarian != original.veterinarian {
                actor.authorize(Operation::Book {
                    client: original.client,
                    veterinarian,
                })?;
            }

            let replacement = BookingRequest {
                client: original.client,
                pet: original.pet,
                service: original.service,
                veterinarian,
                date: request.date,
                start_time: request.start_time,
                end_time: None,
                notes: original.notes.clone(),
            };
            let new = prepare_booking(tx, config, today, &replacement)?;
            let replacement = ledger.insert(&new, now)?;

            Ok(Rescheduled {
                cancelled,
                replacement,
            })
        })?;

        info!(
            cancelled = %outcome.cancelled.id,
            replacement = %outcome.replacement.id,
            date = %outcome.replacement.date,
            "appointment rescheduled"
        );
        Ok(outcome)
    }

    /// Gets one appointment the actor may see
    pub fn appointment(&self, actor: &Actor, id: AppointmentId) -> Result<Appointment> {
        self.resolve(actor)?;
        let appointment = LedgerRepo::new(self.db.conn()).require(id)?;
        actor.authorize(Operation::ViewAppointment { appointment: &appointment })?;
        Ok(appointment)
    }
}

/// Trimmed caller reason, or the fallback when blank
fn cancellation_reason<'a>(given: Option<&'a str>, fallback: &'a str) -> &'a str {
    given
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(fallback)
}

/// Resolves and validates a booking against the registry and clinic policy
fn prepare_booking(
    conn: &Connection,
    config: &SchedulingConfig,
    today: NaiveDate,
    request: &BookingRequest,
) -> Result<NewAppointment> {
    let registry = RegistryRepo::new(conn);
    registry.require_veterinarian(request.veterinarian)?;
    registry.require_client(request.client)?;

    let pet = registry.require_pet(request.pet)?;
    if pet.client != request.client {
        return Err(ValidationError::PetOwnership {
            pet: request.pet,
            client: request.client,
        }
        .into());
    }

    let duration = match request.service {
        Some(id) => Some(registry.require_service(id)?.duration_min),
        None => None,
    };
    let end_time = match request.end_time {
        Some(end) => TimeRange::new(request.start_time, end)?.end,
        None => slot_end(request.start_time, duration, config.slot_minutes)?,
    };

    if config.reject_past_bookings && request.date < today {
        return Err(ValidationError::PastDate {
            date: request.date,
            today,
        }
        .into());
    }
    if config.respect_blocked_days
        && AvailabilityRepo::new(conn).is_day_blocked(request.veterinarian, request.date)?
    {
        return Err(ValidationError::BlockedDay {
            veterinarian: request.veterinarian,
            date: request.date,
        }
        .into());
    }

    Ok(NewAppointment {
        veterinarian: request.veterinarian,
        client: request.client,
        pet: request.pet,
        service: request.service,
        date: request.date,
        start_time: request.start_time,
        end_time,
        notes: request.notes.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientId, PetId, Role, StaffId, TransitionPolicy};
    use crate::scheduling::testing::{date, t, Fixture};
    use crate::storage::LedgerRepo;

    fn request(f: &Fixture, d: NaiveDate, h: u32, m: u32) -> BookingRequest {
        BookingRequest {
            client: f.client,
            pet: f.pet,
            service: Some(f.service),
            veterinarian: f.vet,
            date: d,
            start_time: t(h, m),
            end_time: None,
            notes: "vacuna anual".into(),
        }
    }

    fn change(id: AppointmentId, status: &str, reason: Option<&str>) -> StatusChange {
        StatusChange {
            appointment: id,
            status: status.into(),
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn forty_minute_service_books_forty_five_minutes() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);

        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.start_time, t(9, 0));
        assert_eq!(appt.end_time, t(9, 45));
    }

    #[test]
    fn booking_without_service_takes_one_slot() {
        let mut f = Fixture::new();
        let mut req = request(&f, date(2025, 6, 10), 9, 0);
        req.service = None;

        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();
        assert_eq!(appt.end_time, t(9, 15));
    }

    #[test]
    fn explicit_end_must_follow_start() {
        let mut f = Fixture::new();
        let mut req = request(&f, date(2025, 6, 10), 9, 0);
        req.end_time = Some(t(8, 30));
        assert_eq!(f.scheduler.book(&Actor::Operator, req).unwrap_err().code(), "invalid_range");

        let mut req = request(&f, date(2025, 6, 10), 9, 0);
        req.end_time = Some(t(10, 0));
        assert_eq!(f.scheduler.book(&Actor::Operator, req).unwrap().end_time, t(10, 0));
    }

    #[test]
    fn pet_must_belong_to_client() {
        let mut f = Fixture::new();
        let mut req = request(&f, date(2025, 6, 10), 9, 0);
        req.pet = f.other_pet;

        let err = f.scheduler.book(&Actor::Operator, req).unwrap_err();
        assert_eq!(err.code(), "pet_ownership");
    }

    #[test]
    fn missing_references_are_not_found() {
        let mut f = Fixture::new();

        let mut req = request(&f, date(2025, 6, 10), 9, 0);
        req.pet = PetId::new(99);
        assert_eq!(f.scheduler.book(&Actor::Operator, req).unwrap_err().code(), "pet_not_found");

        let mut req = request(&f, date(2025, 6, 10), 9, 0);
        req.client = ClientId::new(99);
        assert_eq!(f.scheduler.book(&Actor::Operator, req).unwrap_err().code(), "client_not_found");

        let mut req = request(&f, date(2025, 6, 10), 9, 0);
        req.veterinarian = StaffId::new(99);
        assert_eq!(
            f.scheduler.book(&Actor::Operator, req).unwrap_err().code(),
            "veterinarian_not_found"
        );
    }

    #[test]
    fn past_and_blocked_days_are_rejected_by_policy() {
        let mut f = Fixture::new();
        let past = request(&f, date(2025, 5, 20), 9, 0);
        assert_eq!(f.scheduler.book(&Actor::Operator, past).unwrap_err().code(), "past_date");

        f.scheduler
            .block_day(&Actor::Operator, f.vet, date(2025, 6, 10), None)
            .unwrap();
        let blocked = request(&f, date(2025, 6, 10), 9, 0);
        assert_eq!(f.scheduler.book(&Actor::Operator, blocked).unwrap_err().code(), "blocked_day");
    }

    #[test]
    fn booking_policy_can_be_relaxed() {
        let mut f = Fixture::with_config(SchedulingConfig {
            reject_past_bookings: false,
            respect_blocked_days: false,
            ..Default::default()
        });
        f.scheduler
            .block_day(&Actor::Operator, f.vet, date(2025, 6, 10), None)
            .unwrap();

        let past = request(&f, date(2025, 5, 20), 9, 0);
        assert!(f.scheduler.book(&Actor::Operator, past).is_ok());
        let blocked = request(&f, date(2025, 6, 10), 9, 0);
        assert!(f.scheduler.book(&Actor::Operator, blocked).is_ok());
    }

    #[test]
    fn booking_ignores_availability_blocks() {
        let mut f = Fixture::new();
        let first = request(&f, date(2025, 6, 10), 9, 0);
        let same_slot = request(&f, date(2025, 6, 10), 9, 0);

        f.scheduler.book(&Actor::Operator, first).unwrap();
        assert!(f.scheduler.book(&Actor::Operator, same_slot).is_ok());
    }

    #[test]
    fn clients_book_only_for_themselves() {
        let mut f = Fixture::new();
        let own = request(&f, date(2025, 6, 10), 9, 0);
        assert!(f.scheduler.book(&Actor::client(f.client), own).is_ok());

        let mut foreign = request(&f, date(2025, 6, 10), 10, 0);
        foreign.client = f.other_client;
        foreign.pet = f.other_pet;
        let err = f.scheduler.book(&Actor::client(f.client), foreign).unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn strict_policy_follows_state_machine() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        let confirmed = f
            .scheduler
            .set_status(&Actor::Operator, change(appt.id, "confirmed", None))
            .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

        let attended = f
            .scheduler
            .set_status(&Actor::Operator, change(appt.id, "atendida", None))
            .unwrap();
        assert_eq!(attended.status, AppointmentStatus::Attended);
        assert_eq!(attended.cancellation_reason, None);

        let err = f
            .scheduler
            .set_status(&Actor::Operator, change(appt.id, "pending", None))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_transition");
    }

    #[test]
    fn permissive_policy_allows_any_move() {
        let mut f = Fixture::with_config(SchedulingConfig {
            transition_policy: TransitionPolicy::Permissive,
            ..Default::default()
        });
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        f.scheduler
            .set_status(&Actor::Operator, change(appt.id, "attended", None))
            .unwrap();
        let back = f
            .scheduler
            .set_status(&Actor::Operator, change(appt.id, "pending", None))
            .unwrap();
        assert_eq!(back.status, AppointmentStatus::Pending);
    }

    #[test]
    fn unknown_status_token_is_rejected() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        let err = f
            .scheduler
            .set_status(&Actor::Operator, change(appt.id, "lost", None))
            .unwrap_err();
        assert_eq!(err.code(), "unknown_status");
    }

    #[test]
    fn cancellation_records_reason_and_actor() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        let cancelled = f
            .scheduler
            .set_status(
                &Actor::receptionist(f.receptionist),
                change(appt.id, "cancelled", Some("cliente no puede asistir")),
            )
            .unwrap();
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("cliente no puede asistir"));
        assert_eq!(cancelled.cancelled_by, Some(Role::Receptionist));
    }

    #[test]
    fn cancellation_without_reason_uses_default() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        let cancelled = f
            .scheduler
            .set_status(&Actor::client(f.client), change(appt.id, "cancelada", Some("  ")))
            .unwrap();
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("Cancelada sin motivo especificado")
        );
        assert_eq!(cancelled.cancelled_by, Some(Role::Client));
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        f.set_now(date(2025, 6, 2), 9, 0);
        let same = f
            .scheduler
            .set_status(&Actor::Operator, change(appt.id, "pending", None))
            .unwrap();
        assert_eq!(same.updated_at, appt.updated_at);
    }

    #[test]
    fn client_cannot_confirm() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        let err = f
            .scheduler
            .set_status(&Actor::client(f.client), change(appt.id, "confirmed", None))
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn reschedule_cancels_and_books_replacement() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        let outcome = f
            .scheduler
            .cancel_and_reschedule(
                &Actor::Operator,
                RescheduleRequest {
                    appointment: appt.id,
                    veterinarian: Some(f.other_vet),
                    date: date(2025, 6, 12),
                    start_time: t(11, 0),
                    reason: None,
                },
            )
            .unwrap();

        assert_eq!(outcome.cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(outcome.cancelled.cancellation_reason.as_deref(), Some("Replanificada"));
        assert_eq!(outcome.cancelled.cancelled_by, Some(Role::Administrator));

        let new = &outcome.replacement;
        assert_eq!(new.status, AppointmentStatus::Pending);
        assert_eq!(new.veterinarian, f.other_vet);
        assert_eq!((new.client, new.pet, new.service), (appt.client, appt.pet, appt.service));
        assert_eq!(new.notes, "vacuna anual");
        assert_eq!((new.start_time, new.end_time), (t(11, 0), t(11, 45)));
    }

    #[test]
    fn reschedule_defaults_to_same_veterinarian() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        let outcome = f
            .scheduler
            .cancel_and_reschedule(
                &Actor::client(f.client),
                RescheduleRequest {
                    appointment: appt.id,
                    veterinarian: None,
                    date: date(2025, 6, 11),
                    start_time: t(9, 0),
                    reason: Some("viaje".into()),
                },
            )
            .unwrap();

        assert_eq!(outcome.replacement.veterinarian, f.vet);
        assert_eq!(outcome.cancelled.cancellation_reason.as_deref(), Some("viaje"));
    }

    #[test]
    fn failed_replacement_leaves_original_untouched() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        // The cancellation runs first, then the replacement fails
        let err = f
            .scheduler
            .cancel_and_reschedule(
                &Actor::Operator,
                RescheduleRequest {
                    appointment: appt.id,
                    veterinarian: Some(StaffId::new(404)),
                    date: date(2025, 6, 12),
                    start_time: t(11, 0),
                    reason: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "veterinarian_not_found");

        let err = f
            .scheduler
            .cancel_and_reschedule(
                &Actor::Operator,
                RescheduleRequest {
                    appointment: appt.id,
                    veterinarian: None,
                    date: date(2025, 5, 1),
                    start_time: t(11, 0),
                    reason: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "past_date");

        let ledger = LedgerRepo::new(f.scheduler.database().conn());
        let reloaded = ledger.require(appt.id).unwrap();
        assert_eq!(reloaded.status, AppointmentStatus::Pending);
        assert_eq!(reloaded.cancellation_reason, None);
        assert_eq!(ledger.for_client(f.client).unwrap().len(), 1);
    }

    #[test]
    fn terminal_appointment_cannot_be_rescheduled() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();
        f.scheduler
            .set_status(&Actor::Operator, change(appt.id, "cancelled", None))
            .unwrap();

        let err = f
            .scheduler
            .cancel_and_reschedule(
                &Actor::Operator,
                RescheduleRequest {
                    appointment: appt.id,
                    veterinarian: None,
                    date: date(2025, 6, 12),
                    start_time: t(11, 0),
                    reason: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "invalid_transition");
    }

    #[test]
    fn clients_only_see_their_own_appointments() {
        let mut f = Fixture::new();
        let req = request(&f, date(2025, 6, 10), 9, 0);
        let appt = f.scheduler.book(&Actor::Operator, req).unwrap();

        assert!(f.scheduler.appointment(&Actor::client(f.client), appt.id).is_ok());
        let err = f
            .scheduler
            .appointment(&Actor::client(f.other_client), appt.id)
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }
}
