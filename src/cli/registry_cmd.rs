//! Client, pet, staff and service commands

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use super::app::Session;
use super::output::Output;
use crate::domain::{
    Client, ClientId, ClientRegistration, NewPet, NewService, NewStaff, Pet, Role, Service,
    ServiceId, Staff, StaffProfile, ValidationError,
};

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Register a client with their pets
    ///
    /// Example:
    ///   pochita client register --name "Ana Pérez" --email ana@example.com \
    ///       --pet Luna:gato --pet "Toby:perro:Beagle"
    Register(RegisterArgs),

    /// List clients
    List,

    /// Show a client and their pets
    Show {
        /// Client ID
        id: ClientId,
    },

    /// Delete a client with their pets and appointments
    Delete {
        /// Client ID
        id: ClientId,
    },
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    /// National id (RUT)
    #[arg(long, default_value = "")]
    rut: String,

    #[arg(long, default_value = "")]
    phone: String,

    #[arg(long, default_value = "")]
    address: String,

    /// Subscribe to clinic news
    #[arg(long)]
    news: bool,

    /// Pet as NAME:SPECIES[:BREED] (repeatable)
    #[arg(long = "pet", value_parser = parse_pet)]
    pets: Vec<NewPet>,
}

#[derive(Subcommand)]
pub enum PetCommands {
    /// Add a pet to a client
    Add {
        /// Owner client ID
        client: ClientId,

        #[arg(long)]
        name: String,

        #[arg(long)]
        species: String,

        #[arg(long)]
        breed: Option<String>,
    },

    /// List a client's pets
    List {
        /// Owner client ID
        client: ClientId,
    },
}

#[derive(Subcommand)]
pub enum StaffCommands {
    /// Add a staff member
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// veterinarian, receptionist or administrator
        #[arg(long)]
        role: Role,

        #[arg(long, default_value = "")]
        rut: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Veterinarian specialty
        #[arg(long, default_value = "")]
        specialty: String,

        /// Veterinarian shift
        #[arg(long, default_value = "")]
        shift: String,

        /// Administrator company
        #[arg(long, default_value = "")]
        company: String,
    },

    /// List staff members
    List {
        /// Only this role
        #[arg(long)]
        role: Option<Role>,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    /// Add a service
    Add {
        #[arg(long)]
        name: String,

        /// Duration in minutes
        #[arg(long, default_value = "15")]
        duration: u32,

        /// Price in pesos
        #[arg(long)]
        price: Option<i64>,
    },

    /// List services
    List,

    /// Delete a service; its appointments are kept
    Delete {
        /// Service ID
        id: ServiceId,
    },
}

/// Parses `NAME:SPECIES[:BREED]`
fn parse_pet(value: &str) -> Result<NewPet, ValidationError> {
    let mut parts = value.splitn(3, ':').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let species = parts.next().unwrap_or_default();
    let breed = parts.next().filter(|b| !b.is_empty()).map(str::to_string);

    if name.is_empty() || species.is_empty() {
        return Err(ValidationError::InvalidFormat {
            field: "pet",
            value: value.to_string(),
        });
    }
    Ok(NewPet {
        name: name.to_string(),
        species: species.to_string(),
        breed,
    })
}

pub fn run_client(cmd: &ClientCommands, session: &mut Session, output: &Output) -> Result<()> {
    match cmd {
        ClientCommands::Register(args) => register(session, output, args),
        ClientCommands::List => list_clients(session, output),
        ClientCommands::Show { id } => show_client(session, output, *id),
        ClientCommands::Delete { id } => {
            session
                .scheduler
                .delete_client(&session.actor, *id)
                .with_context(|| format!("Failed to delete client {}", id))?;
            if output.is_json() {
                output.data(&serde_json::json!({ "deleted": id }));
            } else {
                output.success(&format!("Deleted client #{} with their pets and appointments", id));
            }
            Ok(())
        }
    }
}

fn register(session: &mut Session, output: &Output, args: &RegisterArgs) -> Result<()> {
    let registration = ClientRegistration {
        name: args.name.clone(),
        email: args.email.clone(),
        rut: args.rut.clone(),
        phone: args.phone.clone(),
        address: args.address.clone(),
        receives_news: args.news,
        pets: args.pets.clone(),
    };
    output.verbose_ctx("client", &format!("Registering {} with {} pet(s)", args.email, args.pets.len()));

    let (client, pets) = session
        .scheduler
        .register_client(&registration)
        .context("Failed to register client")?;

    if output.is_json() {
        output.data(&serde_json::json!({ "client": client, "pets": pets }));
    } else {
        output.success(&format!("Registered client #{} {} <{}>", client.id, client.name, client.email));
        for pet in &pets {
            println!("  pet #{} {}", pet.id, describe_pet(pet));
        }
    }
    Ok(())
}

fn list_clients(session: &Session, output: &Output) -> Result<()> {
    let clients = session.scheduler.clients(&session.actor)?;

    if output.is_json() {
        output.data(&clients);
    } else if clients.is_empty() {
        println!("No clients");
    } else {
        println!("{:<6} {:<25} {:<30} PHONE", "ID", "NAME", "EMAIL");
        println!("{}", "-".repeat(75));
        for client in &clients {
            println!("{:<6} {:<25} {:<30} {}", client.id, client.name, client.email, client.phone);
        }
    }
    Ok(())
}

fn show_client(session: &Session, output: &Output, id: ClientId) -> Result<()> {
    let client = session.scheduler.client(&session.actor, id)?;
    let pets = session.scheduler.pets(&session.actor, id)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "client": client, "pets": pets }));
    } else {
        print_client(&client);
        if pets.is_empty() {
            println!("\nNo pets");
        } else {
            println!("\nPets:");
            for pet in &pets {
                println!("  #{:<5} {}", pet.id, describe_pet(pet));
            }
        }
    }
    Ok(())
}

fn print_client(client: &Client) {
    println!("Client: #{}", client.id);
    println!("Name: {}", client.name);
    println!("Email: {}", client.email);
    if !client.rut.is_empty() {
        println!("RUT: {}", client.rut);
    }
    if !client.phone.is_empty() {
        println!("Phone: {}", client.phone);
    }
    if !client.address.is_empty() {
        println!("Address: {}", client.address);
    }
    println!("News: {}", if client.receives_news { "yes" } else { "no" });
    println!("Registered: {}", client.created_at.format("%Y-%m-%d %H:%M"));
}

fn describe_pet(pet: &Pet) -> String {
    match &pet.breed {
        Some(breed) => format!("{} ({}, {})", pet.name, pet.species, breed),
        None => format!("{} ({})", pet.name, pet.species),
    }
}

pub fn run_pet(cmd: &PetCommands, session: &mut Session, output: &Output) -> Result<()> {
    match cmd {
        PetCommands::Add { client, name, species, breed } => {
            let pet = NewPet {
                name: name.clone(),
                species: species.clone(),
                breed: breed.clone(),
            };
            let pet = session
                .scheduler
                .add_pet(&session.actor, *client, &pet)
                .with_context(|| format!("Failed to add pet to client {}", client))?;

            if output.is_json() {
                output.data(&pet);
            } else {
                output.success(&format!("Added pet #{} {} to client #{}", pet.id, describe_pet(&pet), client));
            }
        }
        PetCommands::List { client } => {
            let pets = session.scheduler.pets(&session.actor, *client)?;

            if output.is_json() {
                output.data(&pets);
            } else if pets.is_empty() {
                println!("No pets for client #{}", client);
            } else {
                for pet in &pets {
                    println!("#{:<5} {}", pet.id, describe_pet(pet));
                }
            }
        }
    }
    Ok(())
}

pub fn run_staff(cmd: &StaffCommands, session: &mut Session, output: &Output) -> Result<()> {
    match cmd {
        StaffCommands::Add {
            name,
            email,
            role,
            rut,
            phone,
            specialty,
            shift,
            company,
        } => {
            let profile = match role {
                Role::Veterinarian => StaffProfile::Veterinarian {
                    specialty: specialty.clone(),
                    shift: shift.clone(),
                },
                Role::Receptionist => StaffProfile::Receptionist,
                Role::Administrator => StaffProfile::Administrator {
                    company: company.clone(),
                },
                Role::Client => bail!("Clients are added with 'pochita client register'"),
            };
            let staff = NewStaff {
                name: name.clone(),
                email: email.clone(),
                rut: rut.clone(),
                phone: phone.clone(),
                profile,
            };

            let staff = session
                .scheduler
                .add_staff(&session.actor, &staff)
                .context("Failed to add staff member")?;

            if output.is_json() {
                output.data(&staff);
            } else {
                output.success(&format!("Added {} #{} {}", staff.role(), staff.id, staff.name));
            }
        }
        StaffCommands::List { role } => {
            let staff = session.scheduler.staff(*role)?;

            if output.is_json() {
                output.data(&staff);
            } else if staff.is_empty() {
                println!("No staff");
            } else {
                println!("{:<6} {:<25} {:<14} DETAILS", "ID", "NAME", "ROLE");
                println!("{}", "-".repeat(70));
                for member in &staff {
                    println!(
                        "{:<6} {:<25} {:<14} {}",
                        member.id,
                        member.name,
                        member.role(),
                        staff_details(member)
                    );
                }
            }
        }
    }
    Ok(())
}

fn staff_details(staff: &Staff) -> String {
    match &staff.profile {
        StaffProfile::Veterinarian { specialty, shift } => {
            [specialty.as_str(), shift.as_str()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        }
        StaffProfile::Receptionist => String::new(),
        StaffProfile::Administrator { company } => company.clone(),
    }
}

pub fn run_service(cmd: &ServiceCommands, session: &mut Session, output: &Output) -> Result<()> {
    match cmd {
        ServiceCommands::Add { name, duration, price } => {
            let service = NewService {
                name: name.clone(),
                duration_min: *duration,
                price: *price,
            };
            let service = session
                .scheduler
                .add_service(&session.actor, &service)
                .context("Failed to add service")?;

            if output.is_json() {
                output.data(&service);
            } else {
                output.success(&format!(
                    "Added service #{} {} ({} min)",
                    service.id, service.name, service.duration_min
                ));
            }
        }
        ServiceCommands::List => {
            let services = session.scheduler.services()?;

            if output.is_json() {
                output.data(&services);
            } else if services.is_empty() {
                println!("No services");
            } else {
                println!("{:<6} {:<25} {:<10} PRICE", "ID", "NAME", "MINUTES");
                println!("{}", "-".repeat(50));
                for service in &services {
                    println!(
                        "{:<6} {:<25} {:<10} {}",
                        service.id,
                        service.name,
                        service.duration_min,
                        format_price(service)
                    );
                }
            }
        }
        ServiceCommands::Delete { id } => {
            session
                .scheduler
                .delete_service(&session.actor, *id)
                .with_context(|| format!("Failed to delete service {}", id))?;

            if output.is_json() {
                output.data(&serde_json::json!({ "deleted": id }));
            } else {
                output.success(&format!("Deleted service #{}", id));
            }
        }
    }
    Ok(())
}

fn format_price(service: &Service) -> String {
    service
        .price
        .map(|p| format!("${}", p))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pet_with_and_without_breed() {
        let luna = parse_pet("Luna:gato").unwrap();
        assert_eq!(luna.name, "Luna");
        assert_eq!(luna.species, "gato");
        assert_eq!(luna.breed, None);

        let toby = parse_pet("Toby : perro : Beagle").unwrap();
        assert_eq!(toby.breed.as_deref(), Some("Beagle"));
    }

    #[test]
    fn parse_pet_requires_species() {
        assert!(parse_pet("Luna").is_err());
        assert!(parse_pet(":gato").is_err());
    }
}
