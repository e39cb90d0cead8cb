//! Appointment ledger
//!
//! The ledger stores appointments and answers the reporting queries. It
//! knows nothing about availability blocks: booking policy is decided by
//! the scheduler before anything reaches this layer.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, ClientId, NotFoundError, PetId, Role,
    ServiceId, VeterinarianId,
};
use crate::error::Result;

const COLUMNS: &str = "id, veterinarian_id, client_id, pet_id, service_id, date, start_time, \
     end_time, status, notes, cancellation_reason, cancelled_by, created_at, updated_at";

/// Fully resolved appointment ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub veterinarian: VeterinarianId,
    pub client: ClientId,
    pub pet: PetId,
    pub service: Option<ServiceId>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: String,
}

/// Filters for the per-day agenda
#[derive(Debug, Clone, Copy, Default)]
pub struct AgendaFilter {
    pub veterinarian: Option<VeterinarianId>,
    pub service: Option<ServiceId>,
}

pub struct LedgerRepo<'c> {
    conn: &'c Connection,
}

impl<'c> LedgerRepo<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
        Ok(Appointment {
            id: row.get(0)?,
            veterinarian: row.get(1)?,
            client: row.get(2)?,
            pet: row.get(3)?,
            service: row.get(4)?,
            date: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            status: row.get(8)?,
            notes: row.get(9)?,
            cancellation_reason: row.get(10)?,
            cancelled_by: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Gets an appointment by ID
    pub fn get(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        let appointment = self
            .conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?1", COLUMNS),
                params![id],
                Self::from_row,
            )
            .optional()?;

        Ok(appointment)
    }

    /// Gets an appointment by ID, failing when absent
    pub fn require(&self, id: AppointmentId) -> Result<Appointment> {
        self.get(id)?
            .ok_or_else(|| NotFoundError::Appointment(id).into())
    }

    /// Inserts a new pending appointment
    pub fn insert(&self, new: &NewAppointment, now: NaiveDateTime) -> Result<Appointment> {
        self.conn.execute(
            "INSERT INTO appointments
                (veterinarian_id, client_id, pet_id, service_id, date, start_time, end_time,
                 status, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                new.veterinarian,
                new.client,
                new.pet,
                new.service,
                new.date,
                new.start_time,
                new.end_time,
                AppointmentStatus::Pending,
                new.notes,
                now,
            ],
        )?;

        self.require(AppointmentId::new(self.conn.last_insert_rowid()))
    }

    /// Writes a new status
    ///
    /// `cancellation` is recorded only when moving to cancelled; other moves
    /// leave the audit fields as they were.
    pub fn update_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
        cancellation: Option<(&str, Role)>,
        now: NaiveDateTime,
    ) -> Result<Appointment> {
        let changed = match cancellation {
            Some((reason, actor)) if status == AppointmentStatus::Cancelled => self.conn.execute(
                "UPDATE appointments
                 SET status = ?2, cancellation_reason = ?3, cancelled_by = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![id, status, reason, actor, now],
            )?,
            _ => self.conn.execute(
                "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, status, now],
            )?,
        };

        if changed == 0 {
            return Err(NotFoundError::Appointment(id).into());
        }
        self.require(id)
    }

    /// Appointments on one date, by start time
    pub fn for_date(&self, date: NaiveDate, filter: AgendaFilter) -> Result<Vec<Appointment>> {
        self.query(
            &format!(
                "SELECT {} FROM appointments
                 WHERE date = ?1
                   AND (?2 IS NULL OR veterinarian_id = ?2)
                   AND (?3 IS NULL OR service_id = ?3)
                 ORDER BY start_time, id",
                COLUMNS
            ),
            params![date, filter.veterinarian, filter.service],
        )
    }

    /// Cancelled appointments with a reason, updated at or after `since`, newest first
    pub fn cancelled_since(
        &self,
        since: NaiveDateTime,
        veterinarian: Option<VeterinarianId>,
    ) -> Result<Vec<Appointment>> {
        self.query(
            &format!(
                "SELECT {} FROM appointments
                 WHERE status = ?1
                   AND cancellation_reason IS NOT NULL
                   AND updated_at >= ?2
                   AND (?3 IS NULL OR veterinarian_id = ?3)
                 ORDER BY updated_at DESC, id DESC",
                COLUMNS
            ),
            params![AppointmentStatus::Cancelled, since, veterinarian],
        )
    }

    /// All appointments of a client, latest first
    pub fn for_client(&self, client: ClientId) -> Result<Vec<Appointment>> {
        self.query(
            &format!(
                "SELECT {} FROM appointments WHERE client_id = ?1
                 ORDER BY date DESC, start_time DESC, id DESC",
                COLUMNS
            ),
            params![client],
        )
    }

    /// Appointments of a veterinarian, in agenda order
    ///
    /// Both bounds are inclusive; a missing bound leaves that side open.
    pub fn for_veterinarian(
        &self,
        veterinarian: VeterinarianId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>> {
        self.query(
            &format!(
                "SELECT {} FROM appointments
                 WHERE veterinarian_id = ?1
                   AND (?2 IS NULL OR date >= ?2)
                   AND (?3 IS NULL OR date <= ?3)
                 ORDER BY date, start_time, id",
                COLUMNS
            ),
            params![veterinarian, from, to],
        )
    }

    /// Counts appointments by status
    pub fn status_counts(&self) -> Result<Vec<(AppointmentStatus, usize)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM appointments GROUP BY status ORDER BY status")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, AppointmentStatus>(0)?, row.get::<_, i64>(1)? as usize))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientRegistration, NewPet, NewService, NewStaff, StaffProfile};
    use crate::storage::{Database, RegistryRepo};

    struct Fixture {
        db: Database,
        vet: VeterinarianId,
        client: ClientId,
        pet: PetId,
        service: ServiceId,
    }

    fn stamp(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn setup() -> Fixture {
        let mut db = Database::open_in_memory().unwrap();
        let (vet, client, pet, service) = db
            .write(|tx| {
                let reg = RegistryRepo::new(tx);
                let vet = reg.insert_staff(
                    &NewStaff {
                        name: "Dr. Soto".into(),
                        email: "soto@pochita.cl".into(),
                        rut: String::new(),
                        phone: String::new(),
                        profile: StaffProfile::Veterinarian {
                            specialty: String::new(),
                            shift: String::new(),
                        },
                    },
                    stamp(1, 8),
                )?;
                let (client, pets) = reg.register_client(
                    &ClientRegistration {
                        name: "Ana".into(),
                        email: "ana@example.com".into(),
                        pets: vec![NewPet {
                            name: "Luna".into(),
                            species: "gato".into(),
                            breed: None,
                        }],
                        ..Default::default()
                    },
                    stamp(1, 8),
                )?;
                let service = reg.insert_service(&NewService {
                    name: "Vacuna".into(),
                    duration_min: 20,
                    price: None,
                })?;
                Ok((vet.id, client.id, pets[0].id, service.id))
            })
            .unwrap();

        Fixture { db, vet, client, pet, service }
    }

    fn new_appt(f: &Fixture, d: u32, start: NaiveTime, service: bool) -> NewAppointment {
        NewAppointment {
            veterinarian: f.vet,
            client: f.client,
            pet: f.pet,
            service: service.then_some(f.service),
            date: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(15),
            notes: String::new(),
        }
    }

    #[test]
    fn inserted_appointment_is_pending() {
        let mut f = setup();
        let new = new_appt(&f, 10, t(9, 0), true);

        let appt = f.db.write(|tx| LedgerRepo::new(tx).insert(&new, stamp(1, 9))).unwrap();

        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.service, Some(f.service));
        assert_eq!(appt.cancellation_reason, None);
        assert_eq!(appt.created_at, stamp(1, 9));
    }

    #[test]
    fn cancellation_records_audit_fields() {
        let mut f = setup();
        let new = new_appt(&f, 10, t(9, 0), false);
        let appt = f.db.write(|tx| LedgerRepo::new(tx).insert(&new, stamp(1, 9))).unwrap();

        let cancelled = f
            .db
            .write(|tx| {
                LedgerRepo::new(tx).update_status(
                    appt.id,
                    AppointmentStatus::Cancelled,
                    Some(("cliente no puede asistir", Role::Receptionist)),
                    stamp(2, 9),
                )
            })
            .unwrap();

        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("cliente no puede asistir"));
        assert_eq!(cancelled.cancelled_by, Some(Role::Receptionist));
        assert_eq!(cancelled.updated_at, stamp(2, 9));
    }

    #[test]
    fn day_agenda_is_ordered_and_filtered() {
        let mut f = setup();
        let late = new_appt(&f, 10, t(11, 0), true);
        let early = new_appt(&f, 10, t(9, 0), false);
        let other_day = new_appt(&f, 11, t(8, 0), true);

        f.db.write(|tx| {
            let ledger = LedgerRepo::new(tx);
            ledger.insert(&late, stamp(1, 9))?;
            ledger.insert(&early, stamp(1, 9))?;
            ledger.insert(&other_day, stamp(1, 9))?;
            Ok(())
        })
        .unwrap();

        let ledger = LedgerRepo::new(f.db.conn());
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        let all = ledger.for_date(date, AgendaFilter::default()).unwrap();
        assert_eq!(all.iter().map(|a| a.start_time).collect::<Vec<_>>(), vec![t(9, 0), t(11, 0)]);

        let with_service = ledger
            .for_date(date, AgendaFilter { service: Some(f.service), ..Default::default() })
            .unwrap();
        assert_eq!(with_service.len(), 1);
        assert_eq!(with_service[0].start_time, t(11, 0));
    }

    #[test]
    fn client_history_is_latest_first() {
        let mut f = setup();
        let first = new_appt(&f, 10, t(9, 0), false);
        let second = new_appt(&f, 10, t(15, 0), false);
        let third = new_appt(&f, 12, t(8, 0), false);

        f.db.write(|tx| {
            let ledger = LedgerRepo::new(tx);
            ledger.insert(&first, stamp(1, 9))?;
            ledger.insert(&second, stamp(1, 9))?;
            ledger.insert(&third, stamp(1, 9))?;
            Ok(())
        })
        .unwrap();

        let history = LedgerRepo::new(f.db.conn()).for_client(f.client).unwrap();
        let order: Vec<_> = history.iter().map(|a| (a.date.format("%d").to_string(), a.start_time)).collect();
        assert_eq!(
            order,
            vec![("12".to_string(), t(8, 0)), ("10".to_string(), t(15, 0)), ("10".to_string(), t(9, 0))]
        );
    }

    #[test]
    fn deleting_service_nulls_reference() {
        let mut f = setup();
        let new = new_appt(&f, 10, t(9, 0), true);
        let appt = f.db.write(|tx| LedgerRepo::new(tx).insert(&new, stamp(1, 9))).unwrap();

        let service = f.service;
        f.db.write(|tx| RegistryRepo::new(tx).delete_service(service)).unwrap();

        let reloaded = LedgerRepo::new(f.db.conn()).require(appt.id).unwrap();
        assert_eq!(reloaded.service, None);
    }

    #[test]
    fn deleting_client_cascades_to_appointments() {
        let mut f = setup();
        let new = new_appt(&f, 10, t(9, 0), true);
        let appt = f.db.write(|tx| LedgerRepo::new(tx).insert(&new, stamp(1, 9))).unwrap();

        let client = f.client;
        f.db.write(|tx| RegistryRepo::new(tx).delete_client(client)).unwrap();

        assert!(LedgerRepo::new(f.db.conn()).get(appt.id).unwrap().is_none());
    }

    #[test]
    fn missing_appointment_is_not_found() {
        let mut f = setup();
        let result = f.db.write(|tx| {
            LedgerRepo::new(tx).update_status(
                AppointmentId::new(42),
                AppointmentStatus::Confirmed,
                None,
                stamp(1, 9),
            )
        });
        assert_eq!(result.unwrap_err().code(), "appointment_not_found");
    }
}
