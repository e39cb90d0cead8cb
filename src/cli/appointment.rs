//! Appointment commands

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;

use super::app::Session;
use super::output::Output;
use crate::domain::{
    parse_time, Appointment, AppointmentId, AppointmentStatus, BookingRequest, ClientId, PetId,
    RescheduleRequest, ServiceId, StaffId, StatusChange,
};

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// Book an appointment
    ///
    /// Without --end the end time is the service duration rounded up to
    /// the next 15-minute slot.
    ///
    /// Example:
    ///   pochita appointment book --client 1 --pet 1 --vet 2 --date 2025-06-10 --start 09:00 --service 1
    Book {
        #[arg(long)]
        client: ClientId,

        #[arg(long)]
        pet: PetId,

        /// Veterinarian ID
        #[arg(long)]
        vet: StaffId,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,

        #[arg(long)]
        service: Option<ServiceId>,

        /// Explicit end time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Change an appointment's status
    Status {
        /// Appointment ID
        id: AppointmentId,

        /// pending, confirmed, attended or cancelled
        status: String,

        /// Cancellation reason
        #[arg(long)]
        reason: Option<String>,
    },

    /// Cancel an appointment
    Cancel {
        /// Appointment ID
        id: AppointmentId,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Cancel an appointment and book its replacement in one step
    Reschedule {
        /// Appointment ID
        id: AppointmentId,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// New start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,

        /// New veterinarian (defaults to the current one)
        #[arg(long)]
        vet: Option<StaffId>,

        /// Reason recorded on the cancelled appointment
        #[arg(long)]
        reason: Option<String>,
    },

    /// Show appointment details
    Show {
        /// Appointment ID
        id: AppointmentId,
    },

    /// List appointments of a veterinarian or a client
    #[command(group(
        clap::ArgGroup::new("owner").required(true).args(["vet", "client"])
    ))]
    List {
        #[arg(long)]
        vet: Option<StaffId>,

        #[arg(long)]
        client: Option<ClientId>,

        /// First date, inclusive (with --vet)
        #[arg(long, requires = "vet", conflicts_with = "client")]
        from: Option<NaiveDate>,

        /// Last date, inclusive (with --vet)
        #[arg(long, requires = "vet", conflicts_with = "client")]
        to: Option<NaiveDate>,
    },
}

pub fn run(cmd: &AppointmentCommands, session: &mut Session, output: &Output) -> Result<()> {
    match cmd {
        AppointmentCommands::Book {
            client,
            pet,
            vet,
            date,
            start,
            service,
            end,
            notes,
        } => {
            let request = BookingRequest {
                client: *client,
                pet: *pet,
                service: *service,
                veterinarian: *vet,
                date: *date,
                start_time: *start,
                end_time: *end,
                notes: notes.clone(),
            };
            let appointment = session
                .scheduler
                .book(&session.actor, request)
                .context("Failed to book appointment")?;

            if output.is_json() {
                output.data(&appointment);
            } else {
                output.success(&format!(
                    "Booked appointment #{}: {}",
                    appointment.id,
                    describe(&appointment)
                ));
            }
        }

        AppointmentCommands::Status { id, status, reason } => {
            change_status(session, output, *id, status, reason.clone())?;
        }

        AppointmentCommands::Cancel { id, reason } => {
            change_status(
                session,
                output,
                *id,
                AppointmentStatus::Cancelled.as_str(),
                reason.clone(),
            )?;
        }

        AppointmentCommands::Reschedule {
            id,
            date,
            start,
            vet,
            reason,
        } => {
            let request = RescheduleRequest {
                appointment: *id,
                veterinarian: *vet,
                date: *date,
                start_time: *start,
                reason: reason.clone(),
            };
            let outcome = session
                .scheduler
                .cancel_and_reschedule(&session.actor, request)
                .with_context(|| format!("Failed to reschedule appointment {}", id))?;

            if output.is_json() {
                output.data(&outcome);
            } else {
                output.success(&format!(
                    "Cancelled #{} and booked #{}: {}",
                    outcome.cancelled.id,
                    outcome.replacement.id,
                    describe(&outcome.replacement)
                ));
            }
        }

        AppointmentCommands::Show { id } => {
            let appointment = session.scheduler.appointment(&session.actor, *id)?;

            if output.is_json() {
                output.data(&appointment);
            } else {
                print_details(&appointment);
            }
        }

        AppointmentCommands::List {
            vet,
            client,
            from,
            to,
        } => {
            let appointments = match (vet, client) {
                (Some(vet), _) => {
                    session
                        .scheduler
                        .veterinarian_appointments(&session.actor, *vet, *from, *to)?
                }
                (None, Some(client)) => {
                    session.scheduler.client_history(&session.actor, *client)?
                }
                (None, None) => bail!("Specify --vet or --client"),
            };

            if output.is_json() {
                output.data(&appointments);
            } else {
                print_table(&appointments);
            }
        }
    }
    Ok(())
}

fn change_status(
    session: &mut Session,
    output: &Output,
    id: AppointmentId,
    status: &str,
    reason: Option<String>,
) -> Result<()> {
    let change = StatusChange {
        appointment: id,
        status: status.to_string(),
        reason,
    };
    let appointment = session
        .scheduler
        .set_status(&session.actor, change)
        .with_context(|| format!("Failed to change status of appointment {}", id))?;

    if output.is_json() {
        output.data(&appointment);
    } else {
        match &appointment.cancellation_reason {
            Some(reason) if appointment.status == AppointmentStatus::Cancelled => {
                output.success(&format!("Appointment #{} cancelled: {}", id, reason))
            }
            _ => output.success(&format!("Appointment #{} is {}", id, appointment.status)),
        }
    }
    Ok(())
}

fn describe(appointment: &Appointment) -> String {
    format!(
        "{} {}-{} with veterinarian #{} for pet #{}",
        appointment.date,
        appointment.start_time.format("%H:%M"),
        appointment.end_time.format("%H:%M"),
        appointment.veterinarian,
        appointment.pet
    )
}

pub(super) fn print_table(appointments: &[Appointment]) {
    if appointments.is_empty() {
        println!("No appointments");
        return;
    }

    println!(
        "{:<6} {:<12} {:<13} {:<5} {:<7} {:<5} STATUS",
        "ID", "DATE", "TIME", "VET", "CLIENT", "PET"
    );
    println!("{}", "-".repeat(64));
    for appointment in appointments {
        println!(
            "{:<6} {:<12} {:<13} {:<5} {:<7} {:<5} {}",
            appointment.id,
            appointment.date,
            format!(
                "{}-{}",
                appointment.start_time.format("%H:%M"),
                appointment.end_time.format("%H:%M")
            ),
            appointment.veterinarian,
            appointment.client,
            appointment.pet,
            appointment.status
        );
    }
}

fn print_details(appointment: &Appointment) {
    println!("Appointment #{}", appointment.id);
    println!("  Date:         {}", appointment.date);
    println!(
        "  Time:         {}-{}",
        appointment.start_time.format("%H:%M"),
        appointment.end_time.format("%H:%M")
    );
    println!("  Veterinarian: #{}", appointment.veterinarian);
    println!("  Client:       #{}", appointment.client);
    println!("  Pet:          #{}", appointment.pet);
    if let Some(service) = appointment.service {
        println!("  Service:      #{}", service);
    }
    println!("  Status:       {}", appointment.status);
    if !appointment.notes.is_empty() {
        println!("  Notes:        {}", appointment.notes);
    }
    if let Some(reason) = &appointment.cancellation_reason {
        match appointment.cancelled_by {
            Some(role) => println!("  Cancelled:    {} (by {})", reason, role),
            None => println!("  Cancelled:    {}", reason),
        }
    }
    println!("  Updated:      {}", appointment.updated_at.format("%Y-%m-%d %H:%M"));
}
