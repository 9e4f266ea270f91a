use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{
    AllocationRepository, EntryRepository, GroupRepository, PaymentRepository, PersonRepository,
    TermRepository,
};
use crate::backend::storage::traits::Connection;

/// A row type stored in a CSV file
///
/// `HEADERS` lists the serialized field names in declaration order. They are
/// written even when the file holds no records.
pub trait CsvRecord: Serialize + DeserializeOwned {
    const HEADERS: &'static [&'static str];
}

/// CsvConnection owns the data directory and serializes every
/// read-modify-write cycle on the files inside it
///
/// ```text
/// data/
/// ├── people.csv
/// ├── groups.yaml
/// ├── entries.csv
/// ├── payments.csv
/// ├── terms.csv
/// └── allocations.csv
/// ```
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
            info!("Created data directory {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Read every record of a CSV file; a missing file reads as empty
    pub fn read_csv<R: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<R>> {
        let file_path = self.file_path(file_name);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = csv::Reader::from_reader(BufReader::new(file));

        let mut records = Vec::new();
        for result in csv_reader.deserialize() {
            let record: R = result
                .with_context(|| format!("Malformed record in {}", file_path.display()))?;
            records.push(record);
        }

        debug!("Read {} records from {}", records.len(), file_name);
        Ok(records)
    }

    /// Replace the contents of a CSV file
    ///
    /// Records are written to a temp file first and moved into place, so a
    /// reader never sees a half-written file. The header row is always
    /// written, so an emptied file keeps its columns.
    pub fn write_csv<R: CsvRecord>(&self, file_name: &str, records: &[R]) -> Result<()> {
        let file_path = self.file_path(file_name);
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let mut csv_writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(BufWriter::new(file));
            csv_writer.write_record(R::HEADERS)?;
            for record in records {
                csv_writer.serialize(record)?;
            }
            csv_writer.flush()?;
        }

        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} records to {}", records.len(), file_name);
        Ok(())
    }

    /// Read a CSV file, let `f` change the records, and write them back
    ///
    /// Nothing is written when `f` fails.
    pub fn modify_csv<R, T, F>(&self, file_name: &str, f: F) -> Result<T>
    where
        R: CsvRecord,
        F: FnOnce(&mut Vec<R>) -> Result<T>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("Storage lock poisoned"))?;

        let mut records = self.read_csv::<R>(file_name)?;
        let result = f(&mut records)?;
        self.write_csv(file_name, &records)?;
        Ok(result)
    }

    /// Read a YAML list; a missing file reads as empty
    pub fn read_yaml<R: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<R>> {
        let file_path = self.file_path(file_name);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let yaml_content = fs::read_to_string(&file_path)?;
        if yaml_content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<R> = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Malformed YAML in {}", file_path.display()))?;
        Ok(records)
    }

    /// YAML counterpart of [`CsvConnection::modify_csv`]
    pub fn modify_yaml<R, T, F>(&self, file_name: &str, f: F) -> Result<T>
    where
        R: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<R>) -> Result<T>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("Storage lock poisoned"))?;

        let mut records = self.read_yaml::<R>(file_name)?;
        let result = f(&mut records)?;

        let file_path = self.file_path(file_name);
        let temp_path = file_path.with_extension("tmp");
        fs::write(&temp_path, serde_yaml::to_string(&records)?)?;
        fs::rename(&temp_path, &file_path)?;

        Ok(result)
    }
}

impl Connection for CsvConnection {
    type PersonRepository = PersonRepository;
    type GroupRepository = GroupRepository;
    type EntryRepository = EntryRepository;
    type PaymentRepository = PaymentRepository;
    type TermRepository = TermRepository;
    type AllocationRepository = AllocationRepository;

    fn create_person_repository(&self) -> Self::PersonRepository {
        PersonRepository::new(self.clone())
    }

    fn create_group_repository(&self) -> Self::GroupRepository {
        GroupRepository::new(self.clone())
    }

    fn create_entry_repository(&self) -> Self::EntryRepository {
        EntryRepository::new(self.clone())
    }

    fn create_payment_repository(&self) -> Self::PaymentRepository {
        PaymentRepository::new(self.clone())
    }

    fn create_term_repository(&self) -> Self::TermRepository {
        TermRepository::new(self.clone())
    }

    fn create_allocation_repository(&self) -> Self::AllocationRepository {
        AllocationRepository::new(self.clone())
    }
}
