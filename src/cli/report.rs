//! Overview and reporting commands

use anyhow::{Context, Result};

use super::app::Session;
use super::appointment::print_table;
use super::output::Output;
use crate::domain::{ClientId, Role, ServiceId, StaffId};
use crate::storage::AgendaFilter;

/// Clinic overview: people, services and appointments by status
pub fn status(session: &Session, output: &Output) -> Result<()> {
    output.verbose("Gathering clinic status");
    let scheduler = &session.scheduler;

    let staff = scheduler.staff(None)?;
    let count_role = |role: Role| staff.iter().filter(|s| s.role() == role).count();
    let services = scheduler.services()?.len();
    let counts = scheduler.appointment_counts()?;
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    let info = &session.clinic.config().clinic.clinic;

    if output.is_json() {
        let by_status: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(status, n)| (status.as_str().to_string(), (*n).into()))
            .collect();
        output.data(&serde_json::json!({
            "clinic": info.name,
            "root": session.clinic.root().display().to_string(),
            "acting_as": session.actor.to_string(),
            "staff": {
                "veterinarians": count_role(Role::Veterinarian),
                "receptionists": count_role(Role::Receptionist),
                "administrators": count_role(Role::Administrator),
            },
            "services": services,
            "appointments": {
                "total": total,
                "by_status": by_status,
            },
        }));
    } else {
        println!("{}", info.name);
        println!("{}", "=".repeat(40));
        println!("Root:      {}", session.clinic.root().display());
        println!("Acting as: {}", session.actor);
        println!();
        println!(
            "Staff: {} veterinarians, {} receptionists, {} administrators",
            count_role(Role::Veterinarian),
            count_role(Role::Receptionist),
            count_role(Role::Administrator)
        );
        println!("Services: {}", services);
        println!();
        println!("Appointments: {}", total);
        for (status, n) in &counts {
            println!("  {:<10} {}", status.as_str(), n);
        }
    }

    Ok(())
}

/// Today's agenda
pub fn today(
    session: &Session,
    output: &Output,
    veterinarian: Option<StaffId>,
    service: Option<ServiceId>,
) -> Result<()> {
    let filter = AgendaFilter {
        veterinarian,
        service,
    };
    let appointments = session
        .scheduler
        .todays_appointments(&session.actor, filter)
        .context("Failed to load today's agenda")?;
    output.verbose_ctx("today", &format!("{} appointments", appointments.len()));

    if output.is_json() {
        output.data(&appointments);
    } else {
        println!("Agenda for {}", session.scheduler.today());
        print_table(&appointments);
    }
    Ok(())
}

/// Recent cancellations that need a follow-up call
pub fn alerts(session: &Session, output: &Output, veterinarian: Option<StaffId>) -> Result<()> {
    let alerts = session
        .scheduler
        .cancellation_alerts(&session.actor, veterinarian)
        .context("Failed to load cancellation alerts")?;

    if output.is_json() {
        output.data(&alerts);
        return Ok(());
    }

    if alerts.is_empty() {
        println!(
            "No cancellations in the last {} days",
            session.scheduler.config().alert_window_days
        );
        return Ok(());
    }

    println!("Cancellations ({}):", alerts.len());
    for appointment in &alerts {
        let by = appointment
            .cancelled_by
            .map(|role| format!(" by {}", role))
            .unwrap_or_default();
        println!(
            "  #{:<5} {} {} client #{}{}: {}",
            appointment.id,
            appointment.date,
            appointment.start_time.format("%H:%M"),
            appointment.client,
            by,
            appointment.cancellation_reason.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// A client's appointments, latest first
pub fn history(session: &Session, output: &Output, client: ClientId) -> Result<()> {
    let appointments = session
        .scheduler
        .client_history(&session.actor, client)
        .with_context(|| format!("Failed to load history of client {}", client))?;

    if output.is_json() {
        output.data(&appointments);
        return Ok(());
    }

    print_table(&appointments);
    for appointment in appointments.iter().filter(|a| a.needs_follow_up()) {
        if let Some(reason) = &appointment.cancellation_reason {
            println!("  #{} cancelled: {}", appointment.id, reason);
        }
    }
    Ok(())
}
