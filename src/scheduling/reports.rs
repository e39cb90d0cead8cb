//! Read-only views over the ledger

use chrono::{Duration, NaiveDate};

use super::actor::{Actor, Operation};
use super::Scheduler;
use crate::domain::{
    Appointment, AppointmentStatus, ClientId, Clock, ValidationError, VeterinarianId,
};
use crate::error::Result;
use crate::storage::{AgendaFilter, LedgerRepo, RegistryRepo};

impl<C: Clock> Scheduler<C> {
    /// Today's appointments by start time
    pub fn todays_appointments(
        &self,
        actor: &Actor,
        filter: AgendaFilter,
    ) -> Result<Vec<Appointment>> {
        self.agenda(actor, self.clock.today(), filter)
    }

    /// Appointments on one date by start time
    pub fn agenda(
        &self,
        actor: &Actor,
        date: NaiveDate,
        filter: AgendaFilter,
    ) -> Result<Vec<Appointment>> {
        self.authorize(actor, Operation::ViewAgenda)?;
        LedgerRepo::new(self.db.conn()).for_date(date, filter)
    }

    /// Cancelled appointments with a reason, touched within the alert window
    ///
    /// Newest first. The window is `scheduling.alert_window_days` back from now.
    pub fn cancellation_alerts(
        &self,
        actor: &Actor,
        veterinarian: Option<VeterinarianId>,
    ) -> Result<Vec<Appointment>> {
        self.authorize(actor, Operation::ViewAgenda)?;
        let since = self.clock.now() - Duration::days(i64::from(self.config.alert_window_days));
        LedgerRepo::new(self.db.conn()).cancelled_since(since, veterinarian)
    }

    /// Every appointment of a client, latest first
    pub fn client_history(&self, actor: &Actor, client: ClientId) -> Result<Vec<Appointment>> {
        self.authorize(actor, Operation::ViewClient { client })?;
        let conn = self.db.conn();
        RegistryRepo::new(conn).require_client(client)?;
        LedgerRepo::new(conn).for_client(client)
    }

    /// Appointments of a veterinarian in agenda order
    ///
    /// Without bounds the range is open on that side.
    pub fn veterinarian_appointments(
        &self,
        actor: &Actor,
        veterinarian: VeterinarianId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>> {
        self.authorize(actor, Operation::ViewAgenda)?;
        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(ValidationError::InvalidFormat {
                    field: "date range",
                    value: format!("{} .. {}", from, to),
                }
                .into());
            }
        }

        let conn = self.db.conn();
        RegistryRepo::new(conn).require_veterinarian(veterinarian)?;
        LedgerRepo::new(conn).for_veterinarian(veterinarian, from, to)
    }

    /// Number of appointments per status, every status listed
    pub fn appointment_counts(&self) -> Result<Vec<(AppointmentStatus, usize)>> {
        let stored = LedgerRepo::new(self.db.conn()).status_counts()?;
        Ok(AppointmentStatus::all()
            .iter()
            .map(|status| {
                let count = stored
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, n)| *n);
                (*status, count)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppointmentStatus, BookingRequest, StatusChange};
    use crate::scheduling::testing::{date, t, Fixture};

    fn book(f: &mut Fixture, d: NaiveDate, h: u32) -> Appointment {
        let request = BookingRequest {
            client: f.client,
            pet: f.pet,
            service: None,
            veterinarian: f.vet,
            date: d,
            start_time: t(h, 0),
            end_time: None,
            notes: String::new(),
        };
        f.scheduler.book(&Actor::Operator, request).unwrap()
    }

    fn cancel(f: &mut Fixture, appt: &Appointment, reason: &str) -> Appointment {
        f.scheduler
            .set_status(
                &Actor::Operator,
                StatusChange {
                    appointment: appt.id,
                    status: "cancelled".into(),
                    reason: Some(reason.into()),
                },
            )
            .unwrap()
    }

    #[test]
    fn today_lists_only_todays_appointments_in_order() {
        let mut f = Fixture::new();
        let today = date(2025, 6, 1);
        book(&mut f, today, 15);
        book(&mut f, today, 9);
        book(&mut f, date(2025, 6, 2), 8);

        let agenda = f
            .scheduler
            .todays_appointments(&Actor::veterinarian(f.vet), AgendaFilter::default())
            .unwrap();
        let starts: Vec<_> = agenda.iter().map(|a| a.start_time).collect();
        assert_eq!(starts, vec![t(9, 0), t(15, 0)]);
    }

    #[test]
    fn today_filters_by_veterinarian() {
        let mut f = Fixture::new();
        book(&mut f, date(2025, 6, 1), 9);

        let other = AgendaFilter {
            veterinarian: Some(f.other_vet),
            ..Default::default()
        };
        assert!(f
            .scheduler
            .todays_appointments(&Actor::Operator, other)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn cancelled_appointment_appears_in_alerts() {
        let mut f = Fixture::new();
        let appt = book(&mut f, date(2025, 6, 10), 9);

        f.set_now(date(2025, 6, 3), 10, 0);
        cancel(&mut f, &appt, "cliente no puede asistir");

        let alerts = f.scheduler.cancellation_alerts(&Actor::Operator, None).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, appt.id);
        assert_eq!(alerts[0].status, AppointmentStatus::Cancelled);
        assert_eq!(alerts[0].cancellation_reason.as_deref(), Some("cliente no puede asistir"));
    }

    #[test]
    fn alerts_drop_out_of_the_window() {
        let mut f = Fixture::new();
        let appt = book(&mut f, date(2025, 6, 10), 9);
        cancel(&mut f, &appt, "enfermedad");

        f.set_now(date(2025, 7, 1), 8, 0);
        assert_eq!(f.scheduler.cancellation_alerts(&Actor::Operator, None).unwrap().len(), 1);

        f.set_now(date(2025, 7, 2), 8, 0);
        assert!(f.scheduler.cancellation_alerts(&Actor::Operator, None).unwrap().is_empty());
    }

    #[test]
    fn alerts_are_newest_first() {
        let mut f = Fixture::new();
        let first = book(&mut f, date(2025, 6, 10), 9);
        let second = book(&mut f, date(2025, 6, 10), 10);

        f.set_now(date(2025, 6, 2), 8, 0);
        cancel(&mut f, &second, "a");
        f.set_now(date(2025, 6, 3), 8, 0);
        cancel(&mut f, &first, "b");

        let ids: Vec<_> = f
            .scheduler
            .cancellation_alerts(&Actor::Operator, None)
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn clients_cannot_see_alerts() {
        let f = Fixture::new();
        let err = f
            .scheduler
            .cancellation_alerts(&Actor::client(f.client), None)
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn history_is_latest_first_with_reasons() {
        let mut f = Fixture::new();
        let early = book(&mut f, date(2025, 6, 5), 9);
        book(&mut f, date(2025, 6, 9), 9);
        cancel(&mut f, &early, "viaje");

        let history = f
            .scheduler
            .client_history(&Actor::client(f.client), f.client)
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, date(2025, 6, 9));
        assert_eq!(history[1].cancellation_reason.as_deref(), Some("viaje"));

        let err = f
            .scheduler
            .client_history(&Actor::client(f.other_client), f.client)
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn veterinarian_listing_respects_bounds() {
        let mut f = Fixture::new();
        for d in [3, 10, 20] {
            book(&mut f, date(2025, 6, d), 9);
        }

        let all = f
            .scheduler
            .veterinarian_appointments(&Actor::Operator, f.vet, None, None)
            .unwrap();
        assert_eq!(all.len(), 3);

        let middle = f
            .scheduler
            .veterinarian_appointments(
                &Actor::Operator,
                f.vet,
                Some(date(2025, 6, 4)),
                Some(date(2025, 6, 19)),
            )
            .unwrap();
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].date, date(2025, 6, 10));
    }

    #[test]
    fn counts_cover_every_status() {
        let mut f = Fixture::new();
        book(&mut f, date(2025, 6, 5), 9);
        let cancelled = book(&mut f, date(2025, 6, 5), 10);
        cancel(&mut f, &cancelled, "viaje");

        let counts = f.scheduler.appointment_counts().unwrap();
        assert_eq!(counts.len(), 4);
        assert!(counts.contains(&(AppointmentStatus::Pending, 1)));
        assert!(counts.contains(&(AppointmentStatus::Cancelled, 1)));
        assert!(counts.contains(&(AppointmentStatus::Attended, 0)));
    }
}
