//! The asset record model shared by the store, the importer and the API.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

pub const DEFAULT_CITY: &str = "Berlin";

const ID_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AssetType {
    #[default]
    DialogDisplay,
    None,
}

impl AssetType {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssetType::DialogDisplay => "DialogDisplay",
            AssetType::None => "None",
        }
    }

    /// Accepts the current spelling and the legacy German labels. Anything else,
    /// including a blank cell, is a dialog display.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "none" | "ohne" => AssetType::None,
            _ => AssetType::DialogDisplay,
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Functional,
    Defective,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Functional => "Functional",
            Status::Defective => "Defective",
        }
    }

    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "defective" | "defekt" => Status::Defective,
            _ => Status::Functional,
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: RecordId,
    pub number: String,
    pub federal_number: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// `None` when the stored date was missing or could not be parsed.
    pub last_inspection: Option<NaiveDate>,
    /// 0.0 together with `longitude` 0.0 means the location is unknown.
    pub latitude: f64,
    pub longitude: f64,
    pub photo_path: String,
    pub build_year: String,
    pub manufacturer: String,
    pub status: Status,
}

impl AssetRecord {
    pub fn coordinates(&self) -> Option<Coordinates> {
        if self.latitude == 0.0 && self.longitude == 0.0 {
            None
        } else {
            Some(Coordinates::new(self.latitude, self.longitude))
        }
    }

    pub fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
        let Coordinates {
            latitude,
            longitude,
        } = coordinates.unwrap_or(Coordinates::new(0.0, 0.0));
        self.latitude = latitude;
        self.longitude = longitude;
        self.normalize_coordinates();
    }

    /// Latitude and longitude are only ever populated together, so a non-finite
    /// half resets both to the sentinel.
    pub fn normalize_coordinates(&mut self) {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            self.latitude = 0.0;
            self.longitude = 0.0;
        }
    }

    /// Free-text query for the geocoder, or `None` when street or city is missing.
    pub fn address_query(&self) -> Option<String> {
        let street = self.street.trim();
        let city = self.city.trim();
        if street.is_empty() || city.is_empty() {
            return None;
        }

        let query = format!("{street}, {} {city}", self.postal_code.trim());
        Some(query.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Orders display numbers numerically when both are plain integers, otherwise
/// lexicographically. Empty numbers sort last.
pub fn compare_numbers(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

pub fn sort_by_number(records: &mut [AssetRecord]) {
    records.sort_by(|a, b| compare_numbers(&a.number, &b.number));
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parses the date spellings found in stored and imported files. Unparseable input
/// yields `None` rather than an error.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%d.%m.%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Hands out record ids of the form `YYYYMMDDHHMMSS` plus a four digit sequence.
///
/// All ids of one allocator share the timestamp it was created with. Candidates that
/// collide with an id passed in at construction, or one handed out earlier, are skipped.
#[derive(Debug)]
pub struct IdAllocator {
    stamp: String,
    next: u32,
    taken: HashSet<RecordId>,
}

impl IdAllocator {
    pub fn new<'a>(existing: impl IntoIterator<Item = &'a RecordId>) -> Self {
        Self::at(Local::now().naive_local(), existing)
    }

    pub fn at<'a>(now: NaiveDateTime, existing: impl IntoIterator<Item = &'a RecordId>) -> Self {
        Self {
            stamp: now.format(ID_TIMESTAMP_FORMAT).to_string(),
            next: 0,
            taken: existing.into_iter().cloned().collect(),
        }
    }

    pub fn next_id(&mut self) -> RecordId {
        loop {
            let candidate = RecordId(format!("{}{:04}", self.stamp, self.next));
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
