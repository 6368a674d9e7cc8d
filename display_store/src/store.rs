//! CSV-backed persistence for asset records.
//!
//! Every operation is a full read of the file followed, for mutations, by a full rewrite.
//! Concurrent writers are not coordinated; the last save wins.

use crate::StorageConfig;
use crate::error::StoreError;
use crate::record::{
    AssetRecord, AssetType, IdAllocator, RecordId, Status, format_date, parse_date,
};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// Column header of the persisted file, in order.
pub const RECORD_COLUMNS: [&str; 14] = [
    "id",
    "nummer",
    "bundesnummer",
    "strasse",
    "plz",
    "stadt",
    "typ",
    "letzte_kontrolle",
    "breitengrad",
    "laengengrad",
    "bild_pfad",
    "baujahr",
    "hersteller",
    "status",
];

/// One line of the persisted file. Every column is optional on read so that files
/// written by older revisions load with empty values instead of failing.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CsvRow {
    id: String,
    #[serde(rename = "nummer")]
    number: String,
    #[serde(rename = "bundesnummer")]
    federal_number: String,
    #[serde(rename = "strasse")]
    street: String,
    #[serde(rename = "plz")]
    postal_code: String,
    #[serde(rename = "stadt")]
    city: String,
    #[serde(rename = "typ")]
    asset_type: String,
    #[serde(rename = "letzte_kontrolle")]
    last_inspection: String,
    #[serde(rename = "breitengrad")]
    latitude: String,
    #[serde(rename = "laengengrad")]
    longitude: String,
    #[serde(rename = "bild_pfad")]
    photo_path: String,
    #[serde(rename = "baujahr")]
    build_year: String,
    #[serde(rename = "hersteller")]
    manufacturer: String,
    status: String,
}

fn parse_coordinate(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(0.0)
}

impl From<CsvRow> for AssetRecord {
    fn from(row: CsvRow) -> Self {
        let mut record = AssetRecord {
            id: RecordId::from(row.id),
            number: row.number,
            federal_number: row.federal_number,
            street: row.street,
            postal_code: row.postal_code,
            city: row.city,
            asset_type: AssetType::parse_lenient(&row.asset_type),
            last_inspection: parse_date(&row.last_inspection),
            latitude: parse_coordinate(&row.latitude),
            longitude: parse_coordinate(&row.longitude),
            photo_path: row.photo_path,
            build_year: row.build_year,
            manufacturer: row.manufacturer,
            status: Status::parse_lenient(&row.status),
        };
        record.normalize_coordinates();
        record
    }
}

impl From<&AssetRecord> for CsvRow {
    fn from(record: &AssetRecord) -> Self {
        let mut record = record.clone();
        record.normalize_coordinates();
        Self {
            id: record.id.to_string(),
            number: record.number,
            federal_number: record.federal_number,
            street: record.street,
            postal_code: record.postal_code,
            city: record.city,
            asset_type: record.asset_type.as_str().to_string(),
            last_inspection: format_date(record.last_inspection),
            latitude: record.latitude.to_string(),
            longitude: record.longitude.to_string(),
            photo_path: record.photo_path,
            build_year: record.build_year,
            manufacturer: record.manufacturer,
            status: record.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.records_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record. A missing file is created with the canonical header and
    /// reads as an empty table.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<AssetRecord>, StoreError> {
        if !self.path.exists() {
            info!(name: "store.created", "record file missing, creating empty table");
            self.save(&[])?;
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let records = reader
            .deserialize::<CsvRow>()
            .map(|row| row.map(AssetRecord::from))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = records.len(), "loaded records");
        Ok(records)
    }

    /// Overwrites the file with `records`. Each save writes its own temp file next to the
    /// target and renames it into place, so overlapping saves never interleave.
    #[instrument(skip(self, records), fields(path = %self.path.display(), count = records.len()))]
    pub fn save(&self, records: &[AssetRecord]) -> Result<(), StoreError> {
        ensure_unique_ids(records)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = WriterBuilder::new().from_writer(temp.as_file_mut());
            if records.is_empty() {
                writer.write_record(RECORD_COLUMNS)?;
            }
            for record in records {
                writer.serialize(CsvRow::from(record))?;
            }
            writer.flush()?;
        }
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!("saved records");
        Ok(())
    }

    pub fn get(&self, id: &RecordId) -> Result<Option<AssetRecord>, StoreError> {
        Ok(self.load()?.into_iter().find(|r| &r.id == id))
    }

    /// Appends `new_records` after the existing ones and saves once. Returns the appended
    /// records with their final ids.
    pub fn append(&self, new_records: Vec<AssetRecord>) -> Result<Vec<AssetRecord>, StoreError> {
        let mut records = self.load()?;
        let first_new = records.len();
        records.extend(new_records);
        assign_missing_ids(&mut records);
        self.save(&records)?;
        Ok(records.split_off(first_new))
    }

    /// Appends a single record, giving it a fresh id when it has none.
    pub fn insert(&self, mut record: AssetRecord) -> Result<AssetRecord, StoreError> {
        let mut records = self.load()?;
        if record.id.is_blank() {
            record.id = IdAllocator::new(records.iter().map(|r| &r.id)).next_id();
        }
        records.push(record.clone());
        self.save(&records)?;
        Ok(record)
    }

    /// Applies `change` to the record with `id` and saves the table.
    pub fn update<F>(&self, id: &RecordId, change: F) -> Result<AssetRecord, StoreError>
    where
        F: FnOnce(&mut AssetRecord),
    {
        let mut records = self.load()?;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::UnknownId(id.clone()))?;
        change(record);
        record.normalize_coordinates();
        let updated = record.clone();

        assign_missing_ids(&mut records);
        self.save(&records)?;
        Ok(updated)
    }

    /// Replaces the whole table with the edited grid. Rows flagged for deletion are
    /// dropped, rows without an id get a fresh one, and `photo_path` is always taken from
    /// the stored record since the grid does not edit it.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn replace_all(&self, rows: Vec<GridEdit>) -> Result<Vec<AssetRecord>, StoreError> {
        let mut photos: HashMap<RecordId, String> = self
            .load()?
            .into_iter()
            .map(|r| (r.id, r.photo_path))
            .collect();

        let mut deleted = 0;
        let mut records = Vec::with_capacity(rows.len());
        for GridEdit { mut record, delete } in rows {
            if delete {
                deleted += 1;
                continue;
            }
            record.photo_path = photos.remove(&record.id).unwrap_or_default();
            record.normalize_coordinates();
            records.push(record);
        }

        assign_missing_ids(&mut records);
        self.save(&records)?;
        info!(name: "store.replaced", kept = records.len(), deleted, "saved edited table");
        Ok(records)
    }

    pub fn set_status(&self, id: &RecordId, status: Status) -> Result<AssetRecord, StoreError> {
        self.update(id, |r| r.status = status)
    }

    pub fn set_photo(&self, id: &RecordId, photo_path: &Path) -> Result<AssetRecord, StoreError> {
        self.update(id, |r| r.photo_path = photo_path.display().to_string())
    }

    /// Hard delete; the row is dropped from the file.
    pub fn remove(&self, id: &RecordId) -> Result<AssetRecord, StoreError> {
        let mut records = self.load()?;
        let index = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::UnknownId(id.clone()))?;
        let removed = records.remove(index);
        assign_missing_ids(&mut records);

        self.save(&records)?;
        info!(name: "store.removed", id = %removed.id, "removed record");
        Ok(removed)
    }
}

/// One row of an edited table, with the delete mark the grid carries alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridEdit {
    pub record: AssetRecord,
    pub delete: bool,
}

/// Rows edited by hand can lose their id; give them a fresh one before saving.
fn assign_missing_ids(records: &mut [AssetRecord]) {
    if !records.iter().any(|r| r.id.is_blank()) {
        return;
    }

    let mut ids = IdAllocator::new(records.iter().map(|r| &r.id));
    for record in records.iter_mut().filter(|r| r.id.is_blank()) {
        record.id = ids.next_id();
        warn!(id = %record.id, "assigned id to record without one");
    }
}

fn ensure_unique_ids(records: &[AssetRecord]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if record.id.is_blank() {
            return Err(StoreError::BlankId);
        }
        if !seen.insert(&record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
    }
    Ok(())
}
