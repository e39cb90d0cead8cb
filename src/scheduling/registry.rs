//! Registry operations with capability checks

use super::actor::{Actor, Operation};
use super::Scheduler;
use crate::domain::{
    Client, ClientId, ClientRegistration, Clock, NewPet, NewService, NewStaff, Pet, Role,
    Service, ServiceId, Staff,
};
use crate::error::Result;
use crate::storage::RegistryRepo;

impl<C: Clock> Scheduler<C> {
    /// Registers a client and their pets
    ///
    /// Open to anyone: this is how clients sign up.
    pub fn register_client(
        &mut self,
        registration: &ClientRegistration,
    ) -> Result<(Client, Vec<Pet>)> {
        let now = self.clock.now();
        self.db
            .write(|tx| RegistryRepo::new(tx).register_client(registration, now))
    }

    pub fn add_pet(&mut self, actor: &Actor, client: ClientId, pet: &NewPet) -> Result<Pet> {
        self.authorize(actor, Operation::AddPet { client })?;
        let now = self.clock.now();
        self.db
            .write(|tx| RegistryRepo::new(tx).insert_pet(client, pet, now))
    }

    pub fn client(&self, actor: &Actor, id: ClientId) -> Result<Client> {
        self.authorize(actor, Operation::ViewClient { client: id })?;
        RegistryRepo::new(self.db.conn()).require_client(id)
    }

    pub fn clients(&self, actor: &Actor) -> Result<Vec<Client>> {
        self.authorize(actor, Operation::ViewAgenda)?;
        RegistryRepo::new(self.db.conn()).list_clients()
    }

    pub fn pets(&self, actor: &Actor, client: ClientId) -> Result<Vec<Pet>> {
        self.authorize(actor, Operation::ViewClient { client })?;
        let registry = RegistryRepo::new(self.db.conn());
        registry.require_client(client)?;
        registry.pets_for_client(client)
    }

    /// Deletes a client with their pets and appointments
    pub fn delete_client(&mut self, actor: &Actor, id: ClientId) -> Result<()> {
        self.authorize(actor, Operation::ManageRegistry)?;
        self.db.write(|tx| RegistryRepo::new(tx).delete_client(id))
    }

    pub fn add_staff(&mut self, actor: &Actor, staff: &NewStaff) -> Result<Staff> {
        self.authorize(actor, Operation::ManageRegistry)?;
        let now = self.clock.now();
        self.db
            .write(|tx| RegistryRepo::new(tx).insert_staff(staff, now))
    }

    /// Staff members, optionally of one role
    pub fn staff(&self, role: Option<Role>) -> Result<Vec<Staff>> {
        RegistryRepo::new(self.db.conn()).list_staff(role)
    }

    pub fn add_service(&mut self, actor: &Actor, service: &NewService) -> Result<Service> {
        self.authorize(actor, Operation::ManageRegistry)?;
        self.db
            .write(|tx| RegistryRepo::new(tx).insert_service(service))
    }

    /// Deletes a service; its appointments keep existing without one
    pub fn delete_service(&mut self, actor: &Actor, id: ServiceId) -> Result<()> {
        self.authorize(actor, Operation::ManageRegistry)?;
        self.db.write(|tx| RegistryRepo::new(tx).delete_service(id))
    }

    pub fn services(&self) -> Result<Vec<Service>> {
        RegistryRepo::new(self.db.conn()).list_services()
    }
}
