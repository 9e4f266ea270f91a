//! # CSV Person Repository
//!
//! People are kept in a single `people.csv` at the root of the data
//! directory:
//!
//! ```csv
//! id,first_name,last_name,contact,created_at,updated_at
//! person::0b8f...,Ana,Reyes,ana@example.com,2024-01-01T10:00:00+00:00,2024-01-01T10:00:00+00:00
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use shared::Person;

use super::connection::{CsvConnection, CsvRecord};
use crate::backend::storage::PersonStorage;

const PEOPLE_FILE: &str = "people.csv";

impl CsvRecord for Person {
    const HEADERS: &'static [&'static str] =
        &["id", "first_name", "last_name", "contact", "created_at", "updated_at"];
}

#[derive(Clone)]
pub struct PersonRepository {
    connection: CsvConnection,
}

impl PersonRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl PersonStorage for PersonRepository {
    async fn store_person(&self, person: &Person) -> Result<()> {
        info!("Storing person {}", person.id);
        self.connection.modify_csv::<Person, _, _>(PEOPLE_FILE, |people| {
            if people.iter().any(|p| p.id == person.id) {
                return Err(anyhow!("Person {} already exists", person.id));
            }
            people.push(person.clone());
            Ok(())
        })
    }

    async fn get_person(&self, person_id: &str) -> Result<Option<Person>> {
        let people = self.connection.read_csv::<Person>(PEOPLE_FILE)?;
        Ok(people.into_iter().find(|p| p.id == person_id))
    }

    async fn list_people(&self) -> Result<Vec<Person>> {
        let mut people = self.connection.read_csv::<Person>(PEOPLE_FILE)?;
        people.sort_by(|a, b| {
            a.first_name
                .to_lowercase()
                .cmp(&b.first_name.to_lowercase())
                .then_with(|| a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase()))
        });
        Ok(people)
    }

    async fn update_person(&self, person: &Person) -> Result<()> {
        self.connection.modify_csv::<Person, _, _>(PEOPLE_FILE, |people| {
            let existing = people
                .iter_mut()
                .find(|p| p.id == person.id)
                .ok_or_else(|| anyhow!("Person {} not found", person.id))?;
            *existing = person.clone();
            Ok(())
        })
    }

    async fn delete_person(&self, person_id: &str) -> Result<bool> {
        self.connection.modify_csv::<Person, _, _>(PEOPLE_FILE, |people| {
            let before = people.len();
            people.retain(|p| p.id != person_id);
            Ok(people.len() != before)
        })
    }
}
