use chrono::NaiveDate;
use display_store::record::{AssetRecord, AssetType, RecordId, Status};
use display_store::store::GridEdit;
use serde::Deserialize;

/// Editable fields of a record. `photoPath` is never taken from a client.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordFields {
    pub number: String,
    pub federal_number: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub last_inspection: Option<NaiveDate>,
    pub latitude: f64,
    pub longitude: f64,
    pub build_year: String,
    pub manufacturer: String,
    pub status: Status,
}

impl RecordFields {
    pub fn into_record(self, id: RecordId) -> AssetRecord {
        let mut record = AssetRecord {
            id,
            number: self.number,
            federal_number: self.federal_number,
            street: self.street,
            postal_code: self.postal_code,
            city: self.city,
            asset_type: self.asset_type,
            last_inspection: self.last_inspection,
            latitude: self.latitude,
            longitude: self.longitude,
            photo_path: String::new(),
            build_year: self.build_year,
            manufacturer: self.manufacturer,
            status: self.status,
        };
        record.normalize_coordinates();
        record
    }

    /// A record for the manual entry form, which dates the inspection `today` unless the
    /// user picked a date.
    pub fn into_new_record(self, today: NaiveDate) -> AssetRecord {
        let mut record = self.into_record(RecordId::default());
        if record.last_inspection.is_none() {
            record.last_inspection = Some(today);
        }
        record
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    /// Absent for rows added in the grid.
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(flatten)]
    pub fields: RecordFields,
    #[serde(default)]
    pub delete: bool,
}

impl From<GridRow> for GridEdit {
    fn from(row: GridRow) -> Self {
        Self {
            record: row.fields.into_record(row.id.unwrap_or_default()),
            delete: row.delete,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct StatusUpdate {
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grid_rows_deserialize_with_partial_fields() {
        let rows: Vec<GridRow> = serde_json::from_value(json!([
            {
                "id": "202405171230050000",
                "number": "A1",
                "street": "Heerstr. 12",
                "type": "None",
                "lastInspection": "2023-02-01",
                "latitude": 52.5,
                "longitude": 13.4,
                "status": "Defective",
                "photoPath": "/etc/passwd"
            },
            { "number": "A2", "delete": true }
        ]))
        .unwrap();

        let first = GridEdit::from(rows.into_iter().next().unwrap());
        assert!(!first.delete);
        assert_eq!(first.record.id.as_str(), "202405171230050000");
        assert_eq!(first.record.asset_type, AssetType::None);
        assert_eq!(first.record.status, Status::Defective);
        assert_eq!(first.record.last_inspection, NaiveDate::from_ymd_opt(2023, 2, 1));
        assert_eq!(first.record.photo_path, "");
    }

    #[test]
    fn manual_entry_defaults_inspection_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();

        let fields: RecordFields =
            serde_json::from_value(json!({ "street": "Heerstr. 12" })).unwrap();
        let record = fields.into_new_record(today);
        assert_eq!(record.last_inspection, Some(today));
        assert!(record.id.is_blank());

        let fields: RecordFields =
            serde_json::from_value(json!({ "lastInspection": "2023-02-01" })).unwrap();
        assert_eq!(
            fields.into_new_record(today).last_inspection,
            NaiveDate::from_ymd_opt(2023, 2, 1)
        );
    }

    #[test]
    fn new_grid_row_has_blank_id() {
        let row: GridRow = serde_json::from_value(json!({ "number": "A2", "delete": true })).unwrap();
        let edit = GridEdit::from(row);

        assert!(edit.delete);
        assert!(edit.record.id.is_blank());
        assert_eq!(edit.record.status, Status::Functional);
        assert_eq!(edit.record.coordinates(), None);
    }
}
