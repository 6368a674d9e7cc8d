use chrono::NaiveDate;
use display_store::error::StoreError;
use display_store::record::{AssetRecord, AssetType, RecordId, Status};
use display_store::store::{GridEdit, RECORD_COLUMNS, RecordStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> RecordStore {
    RecordStore::new(dir.path().join("data").join("locations.csv"))
}

fn record(id: &str, number: &str) -> AssetRecord {
    AssetRecord {
        id: RecordId::from(id),
        number: number.to_string(),
        city: "Berlin".to_string(),
        ..AssetRecord::default()
    }
}

#[test]
fn missing_file_is_created_with_header() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.load().unwrap().is_empty());

    let contents = fs::read_to_string(store.path()).unwrap();
    assert_eq!(contents.trim_end(), RECORD_COLUMNS.join(","));
}

#[test]
fn load_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.save(&[record("1", "A1"), record("2", "A2")]).unwrap();
    let before = fs::read(store.path()).unwrap();

    let first = store.load().unwrap();
    let second = store.load().unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn round_trip_keeps_every_field() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let original = AssetRecord {
        id: RecordId::from("202405171230050000"),
        number: " 17 ".to_string(),
        federal_number: "B-4711".to_string(),
        street: "Frankfurter Allee 1".to_string(),
        postal_code: "10247".to_string(),
        city: "Berlin".to_string(),
        asset_type: AssetType::None,
        last_inspection: NaiveDate::from_ymd_opt(2023, 2, 1),
        latitude: 52.5123456789,
        longitude: 13.4543210987,
        photo_path: "data/images/202405171230050000.jpg".to_string(),
        build_year: "2019".to_string(),
        manufacturer: "Wall AG, Berlin".to_string(),
        status: Status::Defective,
    };

    store.save(std::slice::from_ref(&original)).unwrap();
    assert_eq!(store.load().unwrap(), vec![original]);
}

#[test]
fn legacy_files_load_with_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(
        store.path(),
        "id,nummer,strasse,typ,letzte_kontrolle,breitengrad,status,notiz\n\
         1,A1,Heerstr. 12,Dialog Display,gestern,52.5,Defekt,x\n\
         2,A2,,Ohne,01.02.2023,kaputt,,\n",
    )
    .unwrap();

    let records = store.load().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].asset_type, AssetType::DialogDisplay);
    assert_eq!(records[0].status, Status::Defective);
    assert_eq!(records[0].last_inspection, None);
    assert_eq!(records[0].postal_code, "");
    assert_eq!(records[0].manufacturer, "");

    assert_eq!(records[1].asset_type, AssetType::None);
    assert_eq!(records[1].status, Status::Functional);
    assert_eq!(records[1].last_inspection, NaiveDate::from_ymd_opt(2023, 2, 1));
    assert_eq!(records[1].coordinates(), None);
}

#[test]
fn duplicate_and_blank_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(matches!(
        store.save(&[record("1", "A1"), record("1", "A2")]),
        Err(StoreError::DuplicateId(id)) if id.as_str() == "1"
    ));
    assert!(matches!(store.save(&[record("", "A1")]), Err(StoreError::BlankId)));
    assert!(!store.path().exists());
}

#[test]
fn single_record_operations() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let appended = store.append(vec![record("1", "A1"), record("", "A2")]).unwrap();
    assert!(!appended[1].id.is_blank());
    assert_eq!(store.load().unwrap(), appended);

    let inserted = store.insert(record("", "A3")).unwrap();
    assert!(!inserted.id.is_blank());
    assert_ne!(inserted.id, appended[1].id);
    assert_eq!(store.load().unwrap().len(), 3);

    let id = RecordId::from("1");
    assert_eq!(store.set_status(&id, Status::Defective).unwrap().status, Status::Defective);
    store.set_photo(&id, Path::new("data/images/1.png")).unwrap();
    let stored = store.get(&id).unwrap().unwrap();
    assert_eq!(stored.status, Status::Defective);
    assert_eq!(stored.photo_path, "data/images/1.png");

    assert_eq!(store.remove(&id).unwrap().number, "A1");
    assert_eq!(store.get(&id).unwrap(), None);
    assert!(matches!(store.remove(&id), Err(StoreError::UnknownId(_))));
    assert!(matches!(
        store.set_status(&id, Status::Functional),
        Err(StoreError::UnknownId(_))
    ));
}

#[test]
fn grid_save_drops_marked_rows_and_keeps_photos() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let mut with_photo = record("1", "A1");
    with_photo.photo_path = "data/images/1.jpg".to_string();
    store.save(&[with_photo, record("2", "A2")]).unwrap();

    let edited = vec![
        GridEdit {
            record: AssetRecord {
                street: "Möllendorffstr. 6".to_string(),
                photo_path: String::new(),
                ..record("1", "A1")
            },
            delete: false,
        },
        GridEdit {
            record: record("2", "A2"),
            delete: true,
        },
        GridEdit {
            record: record("", "A3"),
            delete: false,
        },
    ];

    let saved = store.replace_all(edited).unwrap();
    assert_eq!(saved, store.load().unwrap());
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].street, "Möllendorffstr. 6");
    assert_eq!(saved[0].photo_path, "data/images/1.jpg");
    assert_eq!(saved[1].number, "A3");
    assert!(!saved[1].id.is_blank());
    assert_eq!(store.get(&RecordId::from("2")).unwrap(), None);
}

#[test]
fn overlapping_saves_leave_one_complete_table() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let tables: Vec<Vec<AssetRecord>> = [50, 90, 130, 170]
        .into_iter()
        .enumerate()
        .map(|(writer, rows)| {
            (0..rows)
                .map(|n| record(&format!("{writer}-{n}"), &format!("W{writer}")))
                .collect()
        })
        .collect();
    let sizes: Vec<usize> = tables.iter().map(Vec::len).collect();
    let shared = &store;

    for _ in 0..25 {
        std::thread::scope(|scope| {
            let handles: Vec<_> = tables
                .iter()
                .map(|table| scope.spawn(move || shared.save(table)))
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }
        });

        let loaded = store.load().unwrap();
        assert!(sizes.contains(&loaded.len()), "unexpected table of {} rows", loaded.len());
        assert!(loaded.iter().all(|r| r.number == loaded[0].number));
    }

    let leftovers = fs::read_dir(store.path().parent().unwrap()).unwrap().count();
    assert_eq!(leftovers, 1);
}
