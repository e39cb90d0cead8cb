//! Availability block and blocked-day commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;

use super::app::Session;
use super::output::Output;
use crate::domain::{
    parse_time, AvailabilityBlock, AvailabilityStatus, BlockDraft, BlockId, BlockedDay, DayToggle,
    Month, StaffId,
};

#[derive(Subcommand)]
pub enum AvailabilityCommands {
    /// Add an availability block
    ///
    /// Example:
    ///   pochita availability add --vet 2 --date 2025-06-10 --start 09:00 --end 12:00
    Add {
        /// Veterinarian ID
        #[arg(long)]
        vet: StaffId,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: chrono::NaiveTime,

        /// End time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        end: chrono::NaiveTime,

        /// available, unavailable or blocked
        #[arg(long, default_value = "available")]
        status: AvailabilityStatus,
    },

    /// Change a block; omitted fields keep their value
    Update {
        /// Block ID
        id: BlockId,

        #[arg(long)]
        vet: Option<StaffId>,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_time)]
        start: Option<chrono::NaiveTime>,

        #[arg(long, value_parser = parse_time)]
        end: Option<chrono::NaiveTime>,

        #[arg(long)]
        status: Option<AvailabilityStatus>,
    },

    /// Delete a block
    Delete {
        /// Block ID
        id: BlockId,
    },

    /// List a veterinarian's blocks for a month
    List {
        /// Veterinarian ID
        #[arg(long)]
        vet: StaffId,

        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<Month>,
    },
}

#[derive(Subcommand)]
pub enum DayCommands {
    /// Block the day if open, unblock it if blocked
    Toggle {
        #[arg(long)]
        vet: StaffId,

        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Block a day (no-op when already blocked)
    Block {
        #[arg(long)]
        vet: StaffId,

        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Unblock a day (no-op when not blocked)
    Unblock {
        #[arg(long)]
        vet: StaffId,

        #[arg(long)]
        date: NaiveDate,
    },

    /// List a veterinarian's blocked days for a month
    List {
        #[arg(long)]
        vet: StaffId,

        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<Month>,
    },
}

pub fn run(cmd: &AvailabilityCommands, session: &mut Session, output: &Output) -> Result<()> {
    match cmd {
        AvailabilityCommands::Add {
            vet,
            date,
            start,
            end,
            status,
        } => {
            let draft = BlockDraft {
                veterinarian: *vet,
                date: *date,
                start_time: *start,
                end_time: *end,
                status: *status,
            };
            let block = session
                .scheduler
                .create_block(&session.actor, draft)
                .context("Failed to add availability block")?;

            if output.is_json() {
                output.data(&block);
            } else {
                output.success(&format!("Created block #{}: {}", block.id, describe_block(&block)));
            }
        }

        AvailabilityCommands::Update {
            id,
            vet,
            date,
            start,
            end,
            status,
        } => {
            let current = session.scheduler.block(*id)?;
            let draft = BlockDraft {
                veterinarian: vet.unwrap_or(current.veterinarian),
                date: date.unwrap_or(current.date),
                start_time: start.unwrap_or(current.start_time),
                end_time: end.unwrap_or(current.end_time),
                status: status.unwrap_or(current.status),
            };
            output.verbose_ctx("availability", &format!("Updating block #{}", id));

            let block = session
                .scheduler
                .update_block(&session.actor, *id, draft)
                .with_context(|| format!("Failed to update block {}", id))?;

            if output.is_json() {
                output.data(&block);
            } else {
                output.success(&format!("Updated block #{}: {}", block.id, describe_block(&block)));
            }
        }

        AvailabilityCommands::Delete { id } => {
            let block = session
                .scheduler
                .delete_block(&session.actor, *id)
                .with_context(|| format!("Failed to delete block {}", id))?;

            if output.is_json() {
                output.data(&serde_json::json!({ "deleted": block }));
            } else {
                output.success(&format!("Deleted block #{}", block.id));
            }
        }

        AvailabilityCommands::List { vet, month } => {
            let month = month.unwrap_or_else(|| Month::of(session.scheduler.today()));
            let blocks = session.scheduler.blocks_for_month(*vet, month)?;

            if output.is_json() {
                output.data(&blocks);
            } else if blocks.is_empty() {
                println!("No availability for veterinarian #{} in {}", vet, month);
            } else {
                println!("Availability of veterinarian #{} in {}:", vet, month);
                println!("{:<6} {:<12} {:<13} STATUS", "ID", "DATE", "TIME");
                println!("{}", "-".repeat(45));
                for block in &blocks {
                    println!(
                        "{:<6} {:<12} {:<13} {}",
                        block.id,
                        block.date,
                        format!(
                            "{}-{}",
                            block.start_time.format("%H:%M"),
                            block.end_time.format("%H:%M")
                        ),
                        block.status
                    );
                }
            }
        }
    }
    Ok(())
}

fn describe_block(block: &AvailabilityBlock) -> String {
    format!(
        "veterinarian #{} {} {}-{} ({})",
        block.veterinarian,
        block.date,
        block.start_time.format("%H:%M"),
        block.end_time.format("%H:%M"),
        block.status
    )
}

pub fn run_day(cmd: &DayCommands, session: &mut Session, output: &Output) -> Result<()> {
    match cmd {
        DayCommands::Toggle { vet, date, reason } => {
            let outcome = session
                .scheduler
                .toggle_day(&session.actor, *vet, *date, reason.as_deref())
                .with_context(|| format!("Failed to toggle {}", date))?;

            if output.is_json() {
                output.data(&outcome);
            } else {
                match outcome {
                    DayToggle::Blocked(day) => output.success(&format!("Blocked {}", describe_day(&day))),
                    DayToggle::Unblocked { veterinarian, date } => output.success(&format!(
                        "Unblocked {} for veterinarian #{}",
                        date, veterinarian
                    )),
                }
            }
        }

        DayCommands::Block { vet, date, reason } => {
            let day = session
                .scheduler
                .block_day(&session.actor, *vet, *date, reason.as_deref())
                .with_context(|| format!("Failed to block {}", date))?;

            if output.is_json() {
                output.data(&day);
            } else {
                output.success(&format!("Blocked {}", describe_day(&day)));
            }
        }

        DayCommands::Unblock { vet, date } => {
            let removed = session
                .scheduler
                .unblock_day(&session.actor, *vet, *date)
                .with_context(|| format!("Failed to unblock {}", date))?;

            if output.is_json() {
                output.data(&serde_json::json!({
                    "veterinarian": vet,
                    "date": date,
                    "was_blocked": removed,
                }));
            } else if removed {
                output.success(&format!("Unblocked {} for veterinarian #{}", date, vet));
            } else {
                output.success(&format!("{} was not blocked for veterinarian #{}", date, vet));
            }
        }

        DayCommands::List { vet, month } => {
            let month = month.unwrap_or_else(|| Month::of(session.scheduler.today()));
            let days = session.scheduler.blocked_days_for_month(*vet, month)?;

            if output.is_json() {
                output.data(&days);
            } else if days.is_empty() {
                println!("No blocked days for veterinarian #{} in {}", vet, month);
            } else {
                println!("Blocked days of veterinarian #{} in {}:", vet, month);
                for day in &days {
                    match &day.reason {
                        Some(reason) => println!("  {}  {}", day.date, reason),
                        None => println!("  {}", day.date),
                    }
                }
            }
        }
    }
    Ok(())
}

fn describe_day(day: &BlockedDay) -> String {
    match &day.reason {
        Some(reason) => format!("{} for veterinarian #{} ({})", day.date, day.veterinarian, reason),
        None => format!("{} for veterinarian #{}", day.date, day.veterinarian),
    }
}
