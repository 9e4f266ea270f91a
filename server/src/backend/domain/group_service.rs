//! Group management for the loan tracker.
//!
//! A group is a named set of people that can borrow as a whole. The member
//! list only matters when a GROUP entry is created: the allocations are
//! drawn from the members at that moment and do not follow later edits.

use anyhow::Result;
use log::{info, warn};
use shared::{CreateGroupRequest, Group, IdKind, UpdateGroupRequest};
use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::errors::DomainError;
use crate::backend::storage::{Connection, EntryStorage, GroupStorage, PersonStorage};

#[derive(Clone)]
pub struct GroupService<C: Connection> {
    group_repository: C::GroupRepository,
    person_repository: C::PersonRepository,
    entry_repository: C::EntryRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> GroupService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            group_repository: connection.create_group_repository(),
            person_repository: connection.create_person_repository(),
            entry_repository: connection.create_entry_repository(),
            clock,
        }
    }

    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group> {
        info!("Creating group '{}' with {} members", request.name, request.member_ids.len());

        let name = self.validate_name(&request.name)?;
        self.validate_members(&request.member_ids).await?;

        let now = self.clock.now().to_rfc3339();
        let group = Group {
            id: shared::generate_id(IdKind::Group),
            name,
            member_ids: request.member_ids,
            created_at: now.clone(),
            updated_at: now,
        };

        self.group_repository.store_group(&group).await?;
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group> {
        self.group_repository
            .get_group(group_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Group", group_id).into())
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.group_repository.list_groups().await
    }

    pub async fn update_group(&self, group_id: &str, request: UpdateGroupRequest) -> Result<Group> {
        info!("Updating group {}: {:?}", group_id, request);

        let mut group = self.get_group(group_id).await?;

        if let Some(name) = request.name {
            group.name = self.validate_name(&name)?;
        }
        if let Some(member_ids) = request.member_ids {
            self.validate_members(&member_ids).await?;
            group.member_ids = member_ids;
        }
        group.updated_at = self.clock.now().to_rfc3339();

        self.group_repository.update_group(&group).await?;
        Ok(group)
    }

    /// Delete a group that no entry borrows through
    pub async fn delete_group(&self, group_id: &str) -> Result<()> {
        info!("Deleting group {}", group_id);

        let entries = self.entry_repository.list_entries().await?;
        if entries
            .iter()
            .any(|e| e.borrower_group_id.as_deref() == Some(group_id))
        {
            warn!("Refusing to delete group {} with entries", group_id);
            return Err(DomainError::validation("Group is the borrower of existing entries").into());
        }

        if !self.group_repository.delete_group(group_id).await? {
            return Err(DomainError::not_found("Group", group_id).into());
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Group name is required").into());
        }
        Ok(name.to_string())
    }

    /// Members must be known people, listed once each
    async fn validate_members(&self, member_ids: &[String]) -> Result<()> {
        if member_ids.is_empty() {
            return Err(DomainError::validation("A group needs at least one member").into());
        }

        let mut seen = HashSet::new();
        for member_id in member_ids {
            if !seen.insert(member_id.as_str()) {
                return Err(DomainError::validation(format!("Member {} is listed twice", member_id)).into());
            }
            if self.person_repository.get_person(member_id).await?.is_none() {
                return Err(DomainError::validation(format!("Unknown member {}", member_id)).into());
            }
        }
        Ok(())
    }
}
