//! Registry of clients, pets, staff and services

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::domain::{
    Client, ClientId, ClientRegistration, NewPet, NewService, NewStaff, NotFoundError, Pet,
    PetId, Role, Service, ServiceId, Staff, StaffId, StaffProfile, ValidationError,
};
use crate::error::Result;

const CLIENT_COLUMNS: &str = "id, name, email, rut, phone, address, receives_news, created_at";
const PET_COLUMNS: &str = "id, client_id, name, species, breed, created_at";
const STAFF_COLUMNS: &str =
    "id, name, email, rut, phone, role, specialty, shift, company, created_at";
const SERVICE_COLUMNS: &str = "id, name, duration_min, price";

pub struct RegistryRepo<'c> {
    conn: &'c Connection,
}

impl<'c> RegistryRepo<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
        Ok(Client {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            rut: row.get(3)?,
            phone: row.get(4)?,
            address: row.get(5)?,
            receives_news: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn pet_from_row(row: &Row<'_>) -> rusqlite::Result<Pet> {
        Ok(Pet {
            id: row.get(0)?,
            client: row.get(1)?,
            name: row.get(2)?,
            species: row.get(3)?,
            breed: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
        let role: Role = row.get(5)?;
        let profile = match role {
            Role::Veterinarian => StaffProfile::Veterinarian {
                specialty: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                shift: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            },
            Role::Administrator => StaffProfile::Administrator {
                company: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            },
            Role::Receptionist | Role::Client => StaffProfile::Receptionist,
        };

        Ok(Staff {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            rut: row.get(3)?,
            phone: row.get(4)?,
            profile,
            created_at: row.get(9)?,
        })
    }

    fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
        Ok(Service {
            id: row.get(0)?,
            name: row.get(1)?,
            duration_min: row.get(2)?,
            price: row.get(3)?,
        })
    }

    // --- clients -----------------------------------------------------------

    /// Registers a client together with their initial pets
    pub fn register_client(
        &self,
        registration: &ClientRegistration,
        now: NaiveDateTime,
    ) -> Result<(Client, Vec<Pet>)> {
        registration.validate()?;

        let email = registration.email.trim().to_lowercase();
        let taken: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM clients WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )?;
        if taken {
            return Err(ValidationError::DuplicateEmail(email).into());
        }

        self.conn.execute(
            "INSERT INTO clients (name, email, rut, phone, address, receives_news, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                registration.name.trim(),
                email,
                registration.rut.trim(),
                registration.phone.trim(),
                registration.address.trim(),
                registration.receives_news,
                now,
            ],
        )?;
        let client = self.require_client(ClientId::new(self.conn.last_insert_rowid()))?;

        let pets = registration
            .pets
            .iter()
            .map(|pet| self.insert_pet(client.id, pet, now))
            .collect::<Result<Vec<_>>>()?;

        info!(client = %client.id, pets = pets.len(), "client registered");
        Ok((client, pets))
    }

    pub fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        let client = self
            .conn
            .query_row(
                &format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS),
                params![id],
                Self::client_from_row,
            )
            .optional()?;
        Ok(client)
    }

    pub fn require_client(&self, id: ClientId) -> Result<Client> {
        self.get_client(id)?
            .ok_or_else(|| NotFoundError::Client(id).into())
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM clients ORDER BY name, id",
            CLIENT_COLUMNS
        ))?;
        let clients = stmt
            .query_map([], Self::client_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(clients)
    }

    /// Deletes a client; pets and appointments go with it
    pub fn delete_client(&self, id: ClientId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(NotFoundError::Client(id).into());
        }
        info!(client = %id, "client deleted");
        Ok(())
    }

    // --- pets --------------------------------------------------------------

    /// Adds a pet to an existing client
    pub fn insert_pet(&self, client: ClientId, pet: &NewPet, now: NaiveDateTime) -> Result<Pet> {
        pet.validate()?;
        self.require_client(client)?;

        let breed = pet.breed.as_deref().map(str::trim).filter(|b| !b.is_empty());
        self.conn.execute(
            "INSERT INTO pets (client_id, name, species, breed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![client, pet.name.trim(), pet.species.trim(), breed, now],
        )?;

        self.require_pet(PetId::new(self.conn.last_insert_rowid()))
    }

    pub fn get_pet(&self, id: PetId) -> Result<Option<Pet>> {
        let pet = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pets WHERE id = ?1", PET_COLUMNS),
                params![id],
                Self::pet_from_row,
            )
            .optional()?;
        Ok(pet)
    }

    pub fn require_pet(&self, id: PetId) -> Result<Pet> {
        self.get_pet(id)?.ok_or_else(|| NotFoundError::Pet(id).into())
    }

    /// Pets of a client, by name
    pub fn pets_for_client(&self, client: ClientId) -> Result<Vec<Pet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pets WHERE client_id = ?1 ORDER BY name, id",
            PET_COLUMNS
        ))?;
        let pets = stmt
            .query_map(params![client], Self::pet_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pets)
    }

    // --- staff -------------------------------------------------------------

    pub fn insert_staff(&self, staff: &NewStaff, now: NaiveDateTime) -> Result<Staff> {
        staff.validate()?;

        let (specialty, shift, company) = match &staff.profile {
            StaffProfile::Veterinarian { specialty, shift } => {
                (Some(specialty.as_str()), Some(shift.as_str()), None)
            }
            StaffProfile::Receptionist => (None, None, None),
            StaffProfile::Administrator { company } => (None, None, Some(company.as_str())),
        };

        self.conn.execute(
            "INSERT INTO staff (name, email, rut, phone, role, specialty, shift, company, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                staff.name.trim(),
                staff.email.trim().to_lowercase(),
                staff.rut.trim(),
                staff.phone.trim(),
                staff.profile.role(),
                specialty,
                shift,
                company,
                now,
            ],
        )?;

        let created = self.require_staff(StaffId::new(self.conn.last_insert_rowid()))?;
        info!(staff = %created.id, role = %created.role(), "staff member added");
        Ok(created)
    }

    pub fn get_staff(&self, id: StaffId) -> Result<Option<Staff>> {
        let staff = self
            .conn
            .query_row(
                &format!("SELECT {} FROM staff WHERE id = ?1", STAFF_COLUMNS),
                params![id],
                Self::staff_from_row,
            )
            .optional()?;
        Ok(staff)
    }

    pub fn require_staff(&self, id: StaffId) -> Result<Staff> {
        self.get_staff(id)?
            .ok_or_else(|| NotFoundError::Staff(id).into())
    }

    /// Resolves a veterinarian reference
    ///
    /// Fails with not-found when absent and `not_veterinarian` when the
    /// staff member has another role.
    pub fn require_veterinarian(&self, id: StaffId) -> Result<Staff> {
        let staff = self
            .get_staff(id)?
            .ok_or(NotFoundError::Veterinarian(id))?;
        if !staff.is_veterinarian() {
            return Err(ValidationError::NotVeterinarian(id).into());
        }
        Ok(staff)
    }

    pub fn list_staff(&self, role: Option<Role>) -> Result<Vec<Staff>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM staff WHERE (?1 IS NULL OR role = ?1) ORDER BY name, id",
            STAFF_COLUMNS
        ))?;
        let staff = stmt
            .query_map(params![role], Self::staff_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(staff)
    }

    // --- services ----------------------------------------------------------

    pub fn insert_service(&self, service: &NewService) -> Result<Service> {
        service.validate()?;

        self.conn.execute(
            "INSERT INTO services (name, duration_min, price) VALUES (?1, ?2, ?3)",
            params![service.name.trim(), service.duration_min, service.price],
        )?;

        self.require_service(ServiceId::new(self.conn.last_insert_rowid()))
    }

    pub fn get_service(&self, id: ServiceId) -> Result<Option<Service>> {
        let service = self
            .conn
            .query_row(
                &format!("SELECT {} FROM services WHERE id = ?1", SERVICE_COLUMNS),
                params![id],
                Self::service_from_row,
            )
            .optional()?;
        Ok(service)
    }

    pub fn require_service(&self, id: ServiceId) -> Result<Service> {
        self.get_service(id)?
            .ok_or_else(|| NotFoundError::Service(id).into())
    }

    pub fn list_services(&self) -> Result<Vec<Service>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM services ORDER BY name, id",
            SERVICE_COLUMNS
        ))?;
        let services = stmt
            .query_map([], Self::service_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(services)
    }

    /// Deletes a service; appointments keep existing without it
    pub fn delete_service(&self, id: ServiceId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM services WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(NotFoundError::Service(id).into());
        }
        info!(service = %id, "service deleted");
        Ok(())
    }
}
