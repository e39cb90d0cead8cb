//! Actors and what they may do
//!
//! An actor is the role a request runs as plus the registry record behind
//! it. Capability checks are plain functions of the actor and the
//! operation; whether the record actually exists is checked separately by
//! the scheduler, against the database.

use std::fmt;
use std::str::FromStr;

use crate::domain::{Appointment, AppointmentStatus, ClientId, Role, StaffId, ValidationError};
use crate::error::{Error, Result};

/// Who is making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// A registered client
    Client { id: ClientId },

    /// A staff member acting under their own role
    Staff { id: StaffId, role: Role },

    /// The local clinic operator: an administrator without a staff record
    Operator,
}

impl Actor {
    pub fn client(id: ClientId) -> Self {
        Actor::Client { id }
    }

    pub fn veterinarian(id: StaffId) -> Self {
        Actor::Staff { id, role: Role::Veterinarian }
    }

    pub fn receptionist(id: StaffId) -> Self {
        Actor::Staff { id, role: Role::Receptionist }
    }

    pub fn administrator(id: StaffId) -> Self {
        Actor::Staff { id, role: Role::Administrator }
    }

    /// Role tag recorded in audit fields
    pub fn role(&self) -> Role {
        match self {
            Actor::Client { .. } => Role::Client,
            Actor::Staff { role, .. } => *role,
            Actor::Operator => Role::Administrator,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role().is_staff()
    }

    /// Receptionists and administrators act on every record
    fn is_front_desk(&self) -> bool {
        matches!(self.role(), Role::Receptionist | Role::Administrator)
    }

    fn is_veterinarian(&self, id: StaffId) -> bool {
        matches!(self, Actor::Staff { id: own, role: Role::Veterinarian } if *own == id)
    }

    fn is_client(&self, id: ClientId) -> bool {
        matches!(self, Actor::Client { id: own } if *own == id)
    }

    /// Checks a capability, failing with `Forbidden`
    pub fn authorize(&self, operation: Operation<'_>) -> Result<()> {
        if self.permits(&operation) {
            return Ok(());
        }
        Err(Error::Forbidden {
            role: self.role(),
            operation: operation.describe(),
        })
    }

    pub fn permits(&self, operation: &Operation<'_>) -> bool {
        if self.is_front_desk() {
            return true;
        }

        match *operation {
            Operation::ManageAvailability { veterinarian } => self.is_veterinarian(veterinarian),
            Operation::Book { client, veterinarian } => {
                self.is_client(client) || self.is_veterinarian(veterinarian)
            }
            Operation::ChangeStatus { appointment, status } => {
                self.is_veterinarian(appointment.veterinarian)
                    || (self.is_client(appointment.client) && status == AppointmentStatus::Cancelled)
            }
            Operation::Reschedule { appointment } | Operation::ViewAppointment { appointment } => {
                self.is_veterinarian(appointment.veterinarian) || self.is_client(appointment.client)
            }
            Operation::ViewAgenda => self.is_staff(),
            Operation::ViewClient { client } | Operation::AddPet { client } => {
                self.is_staff() || self.is_client(client)
            }
            Operation::ManageRegistry => false,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Client { id } => write!(f, "client:{}", id),
            Actor::Staff { id, role } => write!(f, "{}:{}", role, id),
            Actor::Operator => write!(f, "operator"),
        }
    }
}

impl FromStr for Actor {
    type Err = ValidationError;

    /// Parses `role[:id]`, e.g. `receptionist:2` or `admin`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("operator") {
            return Ok(Actor::Operator);
        }

        let (role, id) = match s.split_once(':') {
            Some((role, id)) => (role, Some(id)),
            None => (s, None),
        };
        let role: Role = role.parse()?;
        let invalid = || ValidationError::InvalidFormat {
            field: "actor",
            value: s.to_string(),
        };

        match (role, id) {
            (Role::Administrator, None) => Ok(Actor::Operator),
            (_, None) => Err(invalid()),
            (Role::Client, Some(id)) => Ok(Actor::client(id.parse().map_err(|_| invalid())?)),
            (role, Some(id)) => Ok(Actor::Staff {
                id: id.parse().map_err(|_| invalid())?,
                role,
            }),
        }
    }
}

/// An operation subject to capability checks
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    ManageAvailability { veterinarian: StaffId },
    Book { client: ClientId, veterinarian: StaffId },
    ChangeStatus { appointment: &'a Appointment, status: AppointmentStatus },
    Reschedule { appointment: &'a Appointment },
    ViewAppointment { appointment: &'a Appointment },
    ViewAgenda,
    ViewClient { client: ClientId },
    AddPet { client: ClientId },
    ManageRegistry,
}

impl Operation<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Operation::ManageAvailability { .. } => "manage this veterinarian's availability",
            Operation::Book { .. } => "book this appointment",
            Operation::ChangeStatus { status: AppointmentStatus::Cancelled, .. } => {
                "cancel this appointment"
            }
            Operation::ChangeStatus { .. } => "change this appointment's status",
            Operation::Reschedule { .. } => "reschedule this appointment",
            Operation::ViewAppointment { .. } => "view this appointment",
            Operation::ViewAgenda => "view the clinic agenda",
            Operation::ViewClient { .. } => "view this client",
            Operation::AddPet { .. } => "add pets to this client",
            Operation::ManageRegistry => "manage the clinic registry",
        }
    }
}
