//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use super::output::{error_code, Output, OutputFormat, Reported};
use super::{appointment, availability, logging, registry_cmd, report};
use crate::scheduling::{Actor, Scheduler};
use crate::storage::{Clinic, Config};

#[derive(Parser)]
#[command(name = "pochita")]
#[command(author, version, about = "Appointment scheduling for a veterinary clinic")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Act as `role[:id]`, e.g. `receptionist:2` or `client:5`
    #[arg(long, global = true, env = "POCHITA_ACTOR")]
    pub actor: Option<String>,

    /// Clinic root (defaults to the nearest directory holding .pochita/)
    #[arg(long, global = true, env = "POCHITA_CLINIC")]
    pub clinic: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new clinic
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Clinic display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show clinic status overview
    Status,

    /// Manage clients
    #[command(subcommand)]
    Client(registry_cmd::ClientCommands),

    /// Manage pets
    #[command(subcommand)]
    Pet(registry_cmd::PetCommands),

    /// Manage clinic staff
    #[command(subcommand)]
    Staff(registry_cmd::StaffCommands),

    /// Manage services
    #[command(subcommand)]
    Service(registry_cmd::ServiceCommands),

    /// Manage veterinarian availability blocks
    #[command(subcommand, visible_alias = "avail")]
    Availability(availability::AvailabilityCommands),

    /// Block or unblock whole days
    #[command(subcommand)]
    Day(availability::DayCommands),

    /// Book and manage appointments
    #[command(subcommand, visible_alias = "appt")]
    Appointment(appointment::AppointmentCommands),

    /// Show today's appointments
    Today {
        /// Only this veterinarian
        #[arg(long)]
        vet: Option<crate::domain::StaffId>,

        /// Only this service
        #[arg(long)]
        service: Option<crate::domain::ServiceId>,
    },

    /// Show recent cancellations
    Alerts {
        /// Only this veterinarian
        #[arg(long)]
        vet: Option<crate::domain::StaffId>,
    },

    /// Show a client's appointment history
    History {
        /// Client ID
        client: crate::domain::ClientId,
    },
}

/// An open clinic with the scheduler and the acting user
pub struct Session {
    pub clinic: Clinic,
    pub scheduler: Scheduler,
    pub actor: Actor,
}

impl Session {
    /// Opens the clinic and resolves the actor
    pub fn open(cli_clinic: Option<&PathBuf>, cli_actor: Option<&str>) -> Result<Self> {
        let clinic = match cli_clinic {
            Some(root) => Clinic::open(root)?,
            None => Clinic::open_current()?,
        };

        let token = cli_actor
            .map(str::to_string)
            .or_else(|| clinic.config().global.default_actor.clone());
        let actor = match token {
            Some(token) => token
                .parse::<Actor>()
                .with_context(|| format!("Invalid actor '{}'", token))?,
            None => Actor::Operator,
        };

        let db = clinic.database()?;
        let scheduler = Scheduler::open(db, clinic.config().clinic.scheduling.clone());
        scheduler
            .resolve(&actor)
            .with_context(|| format!("Cannot act as {}", actor))?;

        Ok(Self {
            clinic,
            scheduler,
            actor,
        })
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => match Config::load_global() {
            Ok(global) => OutputFormat::from(global.default_format),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "ignoring unreadable global config");
                OutputFormat::default()
            }
        },
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("Pochita starting");

    match execute(&cli, &output) {
        Ok(()) => {
            output.verbose("Command completed successfully");
            Ok(())
        }
        Err(e) if output.is_json() => {
            output.error(&format!("{:#}", e), error_code(&e));
            Err(Reported(e.to_string()).into())
        }
        Err(e) => Err(e),
    }
}

fn execute(cli: &Cli, output: &Output) -> Result<()> {
    if let Commands::Init { path, name } = &cli.command {
        output.verbose_ctx("init", &format!("Initializing clinic at: {}", path.display()));
        let clinic = Clinic::init(path, name.as_deref())?;
        output.verbose_ctx(
            "init",
            &format!("Created .pochita directory at: {}", clinic.clinic_dir().display()),
        );
        output.success(&format!("Initialized pochita clinic at {}", clinic.root().display()));
        return Ok(());
    }

    let mut session = Session::open(cli.clinic.as_ref(), cli.actor.as_deref())?;
    output.verbose_ctx(
        "session",
        &format!("Clinic {} as {}", session.clinic.root().display(), session.actor),
    );

    match &cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Status => report::status(&session, output),
        Commands::Client(cmd) => registry_cmd::run_client(cmd, &mut session, output),
        Commands::Pet(cmd) => registry_cmd::run_pet(cmd, &mut session, output),
        Commands::Staff(cmd) => registry_cmd::run_staff(cmd, &mut session, output),
        Commands::Service(cmd) => registry_cmd::run_service(cmd, &mut session, output),
        Commands::Availability(cmd) => availability::run(cmd, &mut session, output),
        Commands::Day(cmd) => availability::run_day(cmd, &mut session, output),
        Commands::Appointment(cmd) => appointment::run(cmd, &mut session, output),
        Commands::Today { vet, service } => report::today(&session, output, *vet, *service),
        Commands::Alerts { vet } => report::alerts(&session, output, *vet),
        Commands::History { client } => report::history(&session, output, *client),
    }
}
