//! Bulk import of spreadsheet uploads into the record store.
//!
//! An import batch parses the whole upload first, geocodes row by row, then appends every
//! new record to the store with a single save. Any parse failure aborts the batch before
//! the store is touched.

mod columns;
mod sheet;

pub use columns::{COLUMN_KEYWORDS, ColumnMapping, ImportField};
pub use sheet::{SheetTable, UploadFormat};

use crate::error::ImportError;
use crate::geocoder::Geocode;
use crate::record::{AssetRecord, AssetType, IdAllocator, RecordId, Status};
use crate::store::RecordStore;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Ids of the created records, in upload order.
    pub created: Vec<RecordId>,
    pub geocoded: usize,
}

#[derive(Debug, Clone)]
pub struct Importer<G> {
    store: RecordStore,
    geocoder: G,
    default_city: String,
}

impl<G: Geocode> Importer<G> {
    pub fn new(store: RecordStore, geocoder: G, default_city: impl Into<String>) -> Self {
        Self {
            store,
            geocoder,
            default_city: default_city.into(),
        }
    }

    /// Parses `bytes` according to the extension of `file_name` and imports every row.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn import(&self, file_name: &str, bytes: &[u8]) -> Result<ImportReport, ImportError> {
        let table = SheetTable::parse(file_name, bytes)?;
        self.import_table(&table, Local::now().naive_local()).await
    }

    /// Imports an already parsed table, one record per row including rows without any
    /// value. `now` stamps the new ids and serves as the inspection date of every new
    /// record.
    pub async fn import_table(
        &self,
        table: &SheetTable,
        now: NaiveDateTime,
    ) -> Result<ImportReport, ImportError> {
        let mapping = ColumnMapping::resolve(&table.headers);
        debug!(?mapping, headers = ?table.headers, "resolved import columns");

        let mut report = ImportReport::default();
        let mut new_records = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut record = self.record_from_row(&mapping, row, now.date());
            if let Some(query) = record.address_query()
                && let Some(coordinates) = self.geocoder.geocode(&query).await.coordinates()
            {
                record.set_coordinates(Some(coordinates));
                report.geocoded += 1;
            }
            new_records.push(record);
        }

        let mut records = self.store.load()?;
        let mut ids = IdAllocator::at(now, records.iter().map(|r| &r.id));
        for record in &mut new_records {
            record.id = ids.next_id();
            report.created.push(record.id.clone());
        }
        records.extend(new_records);
        self.store.save(&records)?;

        info!(
            name: "import.completed",
            created = report.created.len(),
            geocoded = report.geocoded,
            "import batch saved"
        );
        Ok(report)
    }

    fn record_from_row(
        &self,
        mapping: &ColumnMapping,
        row: &[String],
        import_date: NaiveDate,
    ) -> AssetRecord {
        let city = match mapping.value(ImportField::City, row) {
            city if city.is_empty() => self.default_city.clone(),
            city => city,
        };

        AssetRecord {
            number: mapping.value(ImportField::Number, row),
            federal_number: mapping.value(ImportField::FederalNumber, row),
            street: mapping.value(ImportField::Street, row),
            postal_code: mapping.value(ImportField::PostalCode, row),
            city,
            asset_type: AssetType::DialogDisplay,
            last_inspection: Some(import_date),
            build_year: mapping.value(ImportField::BuildYear, row),
            manufacturer: mapping.value(ImportField::Manufacturer, row),
            status: Status::Functional,
            ..AssetRecord::default()
        }
    }
}
