use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportField {
    FederalNumber,
    Number,
    Street,
    PostalCode,
    City,
    BuildYear,
    Manufacturer,
}

/// Header keywords per field, in resolution order. A column claimed by an earlier field
/// is not offered to later ones, which keeps `Bundesnummer` out of `number` and
/// `Standort-Nr` out of `city`.
pub const COLUMN_KEYWORDS: [(ImportField, &[&str]); 7] = [
    (ImportField::FederalNumber, &["bundes", "b-nr"]),
    (ImportField::Number, &["nummer", "nr.", "standort"]),
    (ImportField::Street, &["straße", "strasse", "adr"]),
    (ImportField::PostalCode, &["plz", "post"]),
    (ImportField::City, &["stadt", "ort", "bezirk"]),
    (ImportField::BuildYear, &["baujahr", "jahr"]),
    (ImportField::Manufacturer, &["hersteller", "firma"]),
];

/// Which upload column, if any, feeds each field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: HashMap<ImportField, usize>,
}

impl ColumnMapping {
    pub fn resolve(headers: &[String]) -> Self {
        let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let mut claimed = HashSet::new();
        let mut columns = HashMap::new();

        for (field, keywords) in COLUMN_KEYWORDS {
            let hit = lowered.iter().enumerate().find(|(index, header)| {
                !claimed.contains(index) && keywords.iter().any(|kw| header.contains(kw))
            });
            if let Some((index, _)) = hit {
                claimed.insert(index);
                columns.insert(field, index);
            }
        }

        Self { columns }
    }

    pub fn column(&self, field: ImportField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// The cleaned cell for `field` in `row`, or an empty string when the field has no
    /// column or the row is too short.
    pub fn value(&self, field: ImportField, row: &[String]) -> String {
        self.column(field)
            .and_then(|index| row.get(index))
            .map(|cell| clean_cell(cell))
            .unwrap_or_default()
    }
}

fn clean_cell(cell: &str) -> String {
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        cell.to_string()
    }
}
