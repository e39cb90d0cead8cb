//! Shared fixture for scheduler tests

use chrono::{NaiveDate, NaiveTime};

use super::Scheduler;
use crate::domain::{
    ClientId, ClientRegistration, FixedClock, NewPet, NewService, NewStaff, PetId, ServiceId,
    StaffId, StaffProfile,
};
use crate::storage::{Database, RegistryRepo, SchedulingConfig};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// A clinic frozen at 2025-06-01 08:00 with two veterinarians, a
/// receptionist, two clients with one pet each and a 40-minute service
pub struct Fixture {
    pub scheduler: Scheduler<FixedClock>,
    pub vet: StaffId,
    pub other_vet: StaffId,
    pub receptionist: StaffId,
    pub client: ClientId,
    pub pet: PetId,
    pub other_client: ClientId,
    pub other_pet: PetId,
    pub service: ServiceId,
}

pub fn staff(name: &str, email: &str, profile: StaffProfile) -> NewStaff {
    NewStaff {
        name: name.into(),
        email: email.into(),
        rut: String::new(),
        phone: String::new(),
        profile,
    }
}

pub fn vet_profile() -> StaffProfile {
    StaffProfile::Veterinarian {
        specialty: "General".into(),
        shift: "AM".into(),
    }
}

fn registration(name: &str, email: &str, pet: &str) -> ClientRegistration {
    ClientRegistration {
        name: name.into(),
        email: email.into(),
        pets: vec![NewPet {
            name: pet.into(),
            species: "perro".into(),
            breed: None,
        }],
        ..Default::default()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(SchedulingConfig::default())
    }

    pub fn with_config(config: SchedulingConfig) -> Self {
        let clock = FixedClock::at(date(2025, 6, 1), 8, 0);
        let now = clock.0;
        let mut db = Database::open_in_memory().unwrap();

        let ids = db
            .write(|tx| {
                let reg = RegistryRepo::new(tx);
                let vet = reg.insert_staff(&staff("Dra. Rojas", "rojas@pochita.cl", vet_profile()), now)?;
                let other_vet =
                    reg.insert_staff(&staff("Dr. Soto", "soto@pochita.cl", vet_profile()), now)?;
                let receptionist = reg.insert_staff(
                    &staff("Marta", "marta@pochita.cl", StaffProfile::Receptionist),
                    now,
                )?;
                let (client, pets) =
                    reg.register_client(&registration("Ana", "ana@example.com", "Luna"), now)?;
                let (other_client, other_pets) =
                    reg.register_client(&registration("Bruno", "bruno@example.com", "Toby"), now)?;
                let service = reg.insert_service(&NewService {
                    name: "Control".into(),
                    duration_min: 40,
                    price: Some(15_000),
                })?;
                Ok((
                    vet.id,
                    other_vet.id,
                    receptionist.id,
                    client.id,
                    pets[0].id,
                    other_client.id,
                    other_pets[0].id,
                    service.id,
                ))
            })
            .unwrap();

        let (vet, other_vet, receptionist, client, pet, other_client, other_pet, service) = ids;
        Self {
            scheduler: Scheduler::new(db, clock, config),
            vet,
            other_vet,
            receptionist,
            client,
            pet,
            other_client,
            other_pet,
            service,
        }
    }

    /// Moves the frozen clock
    pub fn set_now(&mut self, d: NaiveDate, h: u32, m: u32) {
        self.scheduler.clock = FixedClock::at(d, h, m);
    }
}
