//! Person management for the loan tracker.
//!
//! People are the parties of every entry: lenders, borrowers, group members
//! and payees. They carry no financial state of their own.

use anyhow::Result;
use log::{info, warn};
use shared::{CreatePersonRequest, IdKind, Person, UpdatePersonRequest};
use std::sync::Arc;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::errors::DomainError;
use crate::backend::storage::{Connection, EntryStorage, GroupStorage, PersonStorage};

/// Service for managing the people known to the tracker
#[derive(Clone)]
pub struct PersonService<C: Connection> {
    person_repository: C::PersonRepository,
    group_repository: C::GroupRepository,
    entry_repository: C::EntryRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> PersonService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            person_repository: connection.create_person_repository(),
            group_repository: connection.create_group_repository(),
            entry_repository: connection.create_entry_repository(),
            clock,
        }
    }

    pub async fn create_person(&self, request: CreatePersonRequest) -> Result<Person> {
        info!("Creating person: {} {}", request.first_name, request.last_name);

        let first_name = request.first_name.trim();
        if first_name.is_empty() {
            return Err(DomainError::validation("First name is required").into());
        }

        let now = self.clock.now().to_rfc3339();
        let person = Person {
            id: shared::generate_id(IdKind::Person),
            first_name: first_name.to_string(),
            last_name: request.last_name.trim().to_string(),
            contact: request.contact.trim().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.person_repository.store_person(&person).await?;
        info!("Created person {} ({})", person.display_name(), person.id);
        Ok(person)
    }

    pub async fn get_person(&self, person_id: &str) -> Result<Person> {
        self.person_repository
            .get_person(person_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Person", person_id).into())
    }

    pub async fn list_people(&self) -> Result<Vec<Person>> {
        self.person_repository.list_people().await
    }

    pub async fn update_person(&self, person_id: &str, request: UpdatePersonRequest) -> Result<Person> {
        info!("Updating person {}: {:?}", person_id, request);

        let mut person = self.get_person(person_id).await?;

        if let Some(first_name) = request.first_name {
            let first_name = first_name.trim();
            if first_name.is_empty() {
                return Err(DomainError::validation("First name is required").into());
            }
            person.first_name = first_name.to_string();
        }
        if let Some(last_name) = request.last_name {
            person.last_name = last_name.trim().to_string();
        }
        if let Some(contact) = request.contact {
            person.contact = contact.trim().to_string();
        }
        person.updated_at = self.clock.now().to_rfc3339();

        self.person_repository.update_person(&person).await?;
        Ok(person)
    }

    /// Delete a person nobody else refers to
    ///
    /// People who are party to an entry or members of a group stay, so that
    /// no entry is left pointing at nobody.
    pub async fn delete_person(&self, person_id: &str) -> Result<()> {
        info!("Deleting person {}", person_id);

        let entries = self.entry_repository.list_entries().await?;
        if entries
            .iter()
            .any(|e| e.lender_id == person_id || e.borrower_id.as_deref() == Some(person_id))
        {
            warn!("Refusing to delete person {} with entries", person_id);
            return Err(DomainError::validation("Person is a party to existing entries").into());
        }

        let groups = self.group_repository.list_groups().await?;
        if let Some(group) = groups.iter().find(|g| g.member_ids.iter().any(|m| m == person_id)) {
            warn!("Refusing to delete person {} in group {}", person_id, group.id);
            return Err(DomainError::validation(format!(
                "Person is a member of group '{}'",
                group.name
            ))
            .into());
        }

        if !self.person_repository.delete_person(person_id).await? {
            return Err(DomainError::not_found("Person", person_id).into());
        }
        Ok(())
    }
}
