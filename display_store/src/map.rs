use crate::MapConfig;
use crate::record::{AssetRecord, AssetType, Coordinates, RecordId};
use serde::Serialize;

#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Blue,
    Gray,
}

impl From<AssetType> for MarkerColor {
    fn from(value: AssetType) -> Self {
        match value {
            AssetType::DialogDisplay => MarkerColor::Blue,
            AssetType::None => MarkerColor::Gray,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub id: RecordId,
    pub number: String,
    pub street: String,
    pub coordinates: Coordinates,
    pub color: MarkerColor,
    pub has_photo: bool,
}

#[derive(Serialize, Copy, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

/// What a map client needs to place every located record.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    /// Present only when there are at least two distinct points to fit.
    pub bounds: Option<Bounds>,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    pub fn from_records(records: &[AssetRecord], config: &MapConfig) -> Self {
        let markers: Vec<MapMarker> = records
            .iter()
            .filter_map(|record| {
                record.coordinates().map(|coordinates| MapMarker {
                    id: record.id.clone(),
                    number: record.number.clone(),
                    street: record.street.clone(),
                    coordinates,
                    color: record.asset_type.into(),
                    has_photo: !record.photo_path.trim().is_empty(),
                })
            })
            .collect();

        Self {
            center: Coordinates::new(config.center_lat, config.center_lon),
            zoom: config.zoom,
            bounds: bounds_of(&markers),
            markers,
        }
    }
}

fn bounds_of(markers: &[MapMarker]) -> Option<Bounds> {
    let first = markers.first()?.coordinates;
    if markers.iter().all(|m| m.coordinates == first) {
        return None;
    }

    let (mut south_west, mut north_east) = (first, first);
    for Coordinates { latitude, longitude } in markers.iter().map(|m| m.coordinates) {
        south_west.latitude = south_west.latitude.min(latitude);
        south_west.longitude = south_west.longitude.min(longitude);
        north_east.latitude = north_east.latitude.max(latitude);
        north_east.longitude = north_east.longitude.max(longitude);
    }

    Some(Bounds {
        south_west,
        north_east,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located(id: &str, latitude: f64, longitude: f64) -> AssetRecord {
        AssetRecord {
            id: RecordId::from(id),
            latitude,
            longitude,
            ..AssetRecord::default()
        }
    }

    #[test]
    fn sentinel_rows_are_left_off_the_map() {
        let records = vec![
            located("a", 52.50, 13.47),
            located("b", 0.0, 0.0),
            AssetRecord {
                asset_type: AssetType::None,
                photo_path: "data/images/c.png".into(),
                ..located("c", 52.53, 13.50)
            },
        ];

        let view = MapView::from_records(&records, &MapConfig::default());

        assert_eq!(view.markers.len(), 2);
        assert_eq!(view.markers[0].color, MarkerColor::Blue);
        assert_eq!(view.markers[1].color, MarkerColor::Gray);
        assert!(view.markers[1].has_photo);
        assert_eq!(
            view.bounds,
            Some(Bounds {
                south_west: Coordinates::new(52.50, 13.47),
                north_east: Coordinates::new(52.53, 13.50),
            })
        );
    }

    #[test]
    fn single_point_uses_default_view() {
        let records = vec![located("a", 52.5, 13.4), located("b", 52.5, 13.4)];
        let view = MapView::from_records(&records, &MapConfig::default());

        assert_eq!(view.bounds, None);
        assert_eq!(view.center, Coordinates::new(52.51, 13.48));
        assert_eq!(view.zoom, 13);
    }
}
