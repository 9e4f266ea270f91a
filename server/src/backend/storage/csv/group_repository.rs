//! # YAML Group Repository
//!
//! Groups carry a member list, so they live in `groups.yaml` rather than a
//! CSV file:
//!
//! ```yaml
//! - id: group::5d1c...
//!   name: Flatmates
//!   member_ids:
//!     - person::0b8f...
//!     - person::77aa...
//!   created_at: 2024-01-01T10:00:00+00:00
//!   updated_at: 2024-01-01T10:00:00+00:00
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use shared::Group;

use super::connection::CsvConnection;
use crate::backend::storage::GroupStorage;

const GROUPS_FILE: &str = "groups.yaml";

#[derive(Clone)]
pub struct GroupRepository {
    connection: CsvConnection,
}

impl GroupRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl GroupStorage for GroupRepository {
    async fn store_group(&self, group: &Group) -> Result<()> {
        info!("Storing group {} with {} members", group.id, group.member_ids.len());
        self.connection.modify_yaml::<Group, _, _>(GROUPS_FILE, |groups| {
            if groups.iter().any(|g| g.id == group.id) {
                return Err(anyhow!("Group {} already exists", group.id));
            }
            groups.push(group.clone());
            Ok(())
        })
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        let groups = self.connection.read_yaml::<Group>(GROUPS_FILE)?;
        Ok(groups.into_iter().find(|g| g.id == group_id))
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let mut groups = self.connection.read_yaml::<Group>(GROUPS_FILE)?;
        groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(groups)
    }

    async fn update_group(&self, group: &Group) -> Result<()> {
        self.connection.modify_yaml::<Group, _, _>(GROUPS_FILE, |groups| {
            let existing = groups
                .iter_mut()
                .find(|g| g.id == group.id)
                .ok_or_else(|| anyhow!("Group {} not found", group.id))?;
            *existing = group.clone();
            Ok(())
        })
    }

    async fn delete_group(&self, group_id: &str) -> Result<bool> {
        self.connection.modify_yaml::<Group, _, _>(GROUPS_FILE, |groups| {
            let before = groups.len();
            groups.retain(|g| g.id != group_id);
            Ok(groups.len() != before)
        })
    }
}
