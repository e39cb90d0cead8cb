//! Clients, pets, staff and services
//!
//! These records are owned by the registry; the scheduling core only
//! references them. Staff is a single entity with a role-specific
//! [`StaffProfile`] payload.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::id::{ClientId, PetId, ServiceId, StaffId};

/// Role of an authenticated actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Veterinarian,
    Receptionist,
    Administrator,
}

impl Role {
    /// Returns true for clinic staff roles
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Client)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Veterinarian => "veterinarian",
            Role::Receptionist => "receptionist",
            Role::Administrator => "administrator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" | "cliente" => Ok(Role::Client),
            "veterinarian" | "vet" | "veterinario" => Ok(Role::Veterinarian),
            "receptionist" | "recepcionista" | "recepcion" => Ok(Role::Receptionist),
            "administrator" | "admin" | "administrador" => Ok(Role::Administrator),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// Role-specific staff data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum StaffProfile {
    Veterinarian {
        #[serde(default)]
        specialty: String,
        #[serde(default)]
        shift: String,
    },
    Receptionist,
    Administrator {
        #[serde(default)]
        company: String,
    },
}

impl StaffProfile {
    pub fn role(&self) -> Role {
        match self {
            StaffProfile::Veterinarian { .. } => Role::Veterinarian,
            StaffProfile::Receptionist => Role::Receptionist,
            StaffProfile::Administrator { .. } => Role::Administrator,
        }
    }
}

/// Registered client (pet owner)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub rut: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub receives_news: bool,
    pub created_at: NaiveDateTime,
}

/// A client's pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub client: ClientId,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Clinic staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub rut: String,
    #[serde(default)]
    pub phone: String,
    #[serde(flatten)]
    pub profile: StaffProfile,
    pub created_at: NaiveDateTime,
}

impl Staff {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn is_veterinarian(&self) -> bool {
        self.role() == Role::Veterinarian
    }
}

/// Catalog service (consultation, vaccination, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub duration_min: u32,
    /// Price in minor currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

/// Pet submitted at registration or added later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
}

impl NewPet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingFields(vec!["pet.name"]));
        }
        Ok(())
    }
}

/// Client registration form
///
/// Registration creates the client profile and any initial pets in one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClientRegistration {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub rut: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub receives_news: bool,
    #[serde(default)]
    pub pets: Vec<NewPet>,
}

impl ClientRegistration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                value: self.email.clone(),
            });
        }
        self.pets.iter().try_for_each(NewPet::validate)
    }
}

/// New staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub rut: String,
    #[serde(default)]
    pub phone: String,
    #[serde(flatten)]
    pub profile: StaffProfile,
}

impl NewStaff {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }
}

/// Longest service the catalog accepts: one full day
pub const MAX_SERVICE_MINUTES: u32 = 24 * 60;

/// New catalog service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub duration_min: u32,
    #[serde(default)]
    pub price: Option<i64>,
}

impl NewService {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingFields(vec!["name"]));
        }
        if self.duration_min == 0 || self.duration_min > MAX_SERVICE_MINUTES {
            return Err(ValidationError::InvalidDuration(self.duration_min));
        }
        Ok(())
    }
}
