//! Fixture reader.
//!
//! Reads the per-entity CSV files (plain or bz2-compressed) of the train
//! domain and the nested JSON records of the hotel domain into flat record
//! lists. A file that cannot be read yields an empty list: the caller sees
//! "nothing to load", never an error.

use crate::codec;
use crate::config::LOG_FIRST_N;
use crate::models::{
    AccommodationRow, AddressRow, AmenityMapRow, AmenityRow, HotelFixtures, HotelRecord,
    HotelRow, PhotoRow, RoomRow, TrainFixtures,
};
use crate::ratelog::FirstN;
use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use chrono::{DateTime, NaiveDateTime};
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const TRAIN_DIR: &str = "train";
pub const HOTEL_DIR: &str = "hotel";
pub const HOTELS_FILE: &str = "hotels.json";

/// Storage format for route-leg timestamps.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Sentinel some exports write for an absent time.
const NULL_SENTINEL: &str = "NULL";

/// Finds `<base>.csv`, falling back to `<base>.csv.bz2`.
fn resolve_csv(dir: &Path, base: &str) -> Option<PathBuf> {
    let plain = dir.join(format!("{base}.csv"));
    if plain.exists() {
        return Some(plain);
    }
    let compressed = dir.join(format!("{base}.csv.bz2"));
    compressed.exists().then_some(compressed)
}

fn open_fixture(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open fixture: {}", path.display()))?;
    let is_bz2 = path.extension().is_some_and(|ext| ext == "bz2");
    if is_bz2 {
        Ok(Box::new(BzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Reads every record of `<dir>/<base>.csv[.bz2]`.
///
/// Missing or unreadable files give an empty list. Records that do not fit the
/// expected columns are skipped individually.
pub fn read_csv<T: DeserializeOwned>(dir: &Path, base: &str) -> Vec<T> {
    let Some(path) = resolve_csv(dir, base) else {
        warn!(fixture = base, dir = %dir.display(), "Fixture not found, nothing to load");
        return Vec::new();
    };

    match read_csv_file(&path, base) {
        Ok(rows) => {
            debug!(fixture = base, rows = rows.len(), "Fixture read");
            rows
        }
        Err(e) => {
            warn!(fixture = base, error = %format!("{e:#}"), "Failed to read fixture, nothing to load");
            Vec::new()
        }
    }
}

fn read_csv_file<T: DeserializeOwned>(path: &Path, base: &str) -> Result<Vec<T>> {
    let reader = open_fixture(path)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(BufReader::with_capacity(128 * 1024, reader));

    csv_reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;

    let mut rows = Vec::new();
    let mut bad_records = FirstN::new(LOG_FIRST_N);
    for result in csv_reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("Failed reading {}", path.display()));
            }
            Err(e) => bad_records.warn(base, format!("Skipping malformed record: {e}")),
        }
    }
    bad_records.summarize(base, "malformed records");
    Ok(rows)
}

/// Loads the train-domain CSV set from `<root>/train/`.
pub fn read_train_fixtures(root: &Path) -> TrainFixtures {
    let dir = root.join(TRAIN_DIR);
    let fixtures = TrainFixtures {
        vehicles: read_csv(&dir, "vehicles"),
        trains: read_csv(&dir, "trains"),
        stations: read_csv(&dir, "stations"),
        route_legs: read_csv(&dir, "vehicle_stations"),
        coaches: read_csv(&dir, "coaches"),
        seats: read_csv(&dir, "seats"),
    };
    info!(rows = fixtures.row_count(), dir = %dir.display(), "Train fixtures loaded");
    fixtures
}

/// Loads `<root>/hotel/hotels.json`, or the built-in dataset when the file is absent.
pub fn read_hotel_fixtures(root: &Path) -> HotelFixtures {
    let path = root.join(HOTEL_DIR).join(HOTELS_FILE);
    let records = if path.exists() {
        match read_hotel_records(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to read hotel fixture, nothing to load");
                Vec::new()
            }
        }
    } else {
        info!(path = %path.display(), "No hotel fixture file, using built-in dataset");
        builtin_hotels()
    };
    let fixtures = flatten_hotels(&records);
    info!(rows = fixtures.row_count(), hotels = records.len(), "Hotel fixtures loaded");
    fixtures
}

/// Parses the top-level array, then each record on its own so one bad record
/// is skipped instead of dropping the file.
fn read_hotel_records(path: &Path) -> Result<Vec<HotelRecord>> {
    let reader = BufReader::new(open_fixture(path)?);
    let values: Vec<serde_json::Value> = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut records = Vec::with_capacity(values.len());
    let mut bad_records = FirstN::new(LOG_FIRST_N);
    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<HotelRecord>(value) {
            Ok(record) => records.push(record),
            Err(e) => bad_records.warn(HOTELS_FILE, format!("Skipping malformed record {i}: {e}")),
        }
    }
    bad_records.summarize(HOTELS_FILE, "malformed records");
    Ok(records)
}

/// Splits nested hotel records into one row list per table.
///
/// Missing ids are generated here, once, so every child row agrees with its
/// parent. Amenities are keyed by name and shared across hotels.
pub fn flatten_hotels(records: &[HotelRecord]) -> HotelFixtures {
    let mut fx = HotelFixtures::default();
    let mut amenity_seen = FxHashSet::default();
    let mut map_seen = FxHashSet::default();

    for record in records {
        let accommodation_id = id_or_random(record.accommodation_id.as_deref());
        let address_id = id_or_random(record.address.address_id.as_deref());

        fx.addresses.push(AddressRow {
            address_id: address_id.clone(),
            street: record.address.street.clone(),
            city: record.address.city.clone(),
            state: record.address.state.clone(),
            country: record.address.country.clone(),
            pincode: record.address.pincode.clone(),
        });
        fx.accommodations.push(AccommodationRow {
            accommodation_id: accommodation_id.clone(),
            name: record.name.clone(),
            rating: record.rating.clone(),
            status: record.status.clone(),
            address_id,
        });
        fx.hotels.push(HotelRow {
            accommodation_id: accommodation_id.clone(),
            breakfast_included: record.breakfast_included,
            ac_type: record.ac_type.clone(),
        });
        for room in &record.rooms {
            fx.rooms.push(RoomRow {
                room_id: id_or_random(room.room_id.as_deref()),
                accommodation_id: accommodation_id.clone(),
                room_type: room.room_type.clone(),
                capacity: room.capacity.clone(),
                price: room.price.clone(),
            });
        }
        for photo in &record.photos {
            fx.photos.push(PhotoRow {
                photo_id: id_or_random(photo.photo_id.as_deref()),
                accommodation_id: accommodation_id.clone(),
                url: photo.url.clone(),
            });
        }
        for name in &record.amenities {
            let amenity_id = codec::amenity_id(name);
            if amenity_seen.insert(amenity_id.clone()) {
                fx.amenities.push(AmenityRow {
                    amenity_id: amenity_id.clone(),
                    name: name.trim().to_string(),
                });
            }
            if map_seen.insert((accommodation_id.clone(), amenity_id.clone())) {
                fx.amenity_maps.push(AmenityMapRow {
                    accommodation_id: accommodation_id.clone(),
                    amenity_id,
                });
            }
        }
    }
    fx
}

fn id_or_random(id: Option<&str>) -> String {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => codec::random_id(),
    }
}

fn is_absent(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(NULL_SENTINEL)
}

/// Integer column: empty means 0, anything else must parse.
pub fn int_or_zero(value: &str) -> Result<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .with_context(|| format!("Not an integer: {value:?}"))
}

/// Decimal column: empty means 0, anything else must be a finite number.
pub fn float_or_zero(value: &str) -> Result<f64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    let parsed: f64 = value
        .parse()
        .with_context(|| format!("Not a number: {value:?}"))?;
    if !parsed.is_finite() {
        bail!("Not a finite number: {value:?}");
    }
    Ok(parsed)
}

/// Nullable decimal column (coordinates).
pub fn optional_float(value: &str) -> Result<Option<f64>> {
    if is_absent(value) {
        return Ok(None);
    }
    float_or_zero(value).map(Some)
}

/// Nullable timestamp column, normalized to the storage format.
pub fn optional_datetime(value: &str) -> Result<Option<String>> {
    if is_absent(value) {
        return Ok(None);
    }
    let value = value.trim();
    for format in ACCEPTED_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(parsed.format(DATETIME_FORMAT).to_string()));
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(parsed.naive_utc().format(DATETIME_FORMAT).to_string()));
    }
    bail!("Not a datetime: {value:?}")
}

/// The static dataset used when no hotel fixture file is supplied.
pub fn builtin_hotels() -> Vec<HotelRecord> {
    use crate::models::{AddressRecord, PhotoRecord, RoomRecord};

    let rooms = |base: u32| -> Vec<RoomRecord> {
        [("Standard", 2, 0), ("Deluxe", 2, 1500), ("Suite", 4, 4000), ("Family", 5, 2500)]
            .into_iter()
            .map(|(room_type, capacity, premium)| RoomRecord {
                room_id: None,
                room_type: room_type.to_string(),
                capacity: capacity.to_string(),
                price: (base + premium).to_string(),
            })
            .collect()
    };
    let photos = |slug: &str| -> Vec<PhotoRecord> {
        ["lobby", "room", "pool", "exterior"]
            .into_iter()
            .map(|view| PhotoRecord {
                photo_id: None,
                url: format!("https://images.example.com/hotels/{slug}/{view}.jpg"),
            })
            .collect()
    };

    vec![
        HotelRecord {
            accommodation_id: Some("8d3f1c2a-5b4e-4f6a-9c7d-1e2f3a4b5c6d".to_string()),
            name: "Seaside Residency".to_string(),
            rating: "4.3".to_string(),
            status: "active".to_string(),
            breakfast_included: true,
            ac_type: "AC".to_string(),
            address: AddressRecord {
                address_id: Some("0a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d".to_string()),
                street: "12 Marine Drive".to_string(),
                city: "Mumbai".to_string(),
                state: "Maharashtra".to_string(),
                country: "India".to_string(),
                pincode: "400020".to_string(),
            },
            rooms: rooms(3500),
            photos: photos("seaside-residency"),
            amenities: vec![
                "Free WiFi".to_string(),
                "Swimming Pool".to_string(),
                "Restaurant".to_string(),
            ],
        },
        HotelRecord {
            accommodation_id: Some("2c9e7b1d-3f4a-4b5c-8d6e-7f8a9b0c1d2e".to_string()),
            name: "Hill View Inn".to_string(),
            rating: "3.9".to_string(),
            status: "active".to_string(),
            breakfast_included: false,
            ac_type: "Non-AC".to_string(),
            address: AddressRecord {
                address_id: Some("5e6f7a8b-9c0d-4e1f-a2b3-c4d5e6f7a8b9".to_string()),
                street: "4 Mall Road".to_string(),
                city: "Shimla".to_string(),
                state: "Himachal Pradesh".to_string(),
                country: "India".to_string(),
                pincode: "171001".to_string(),
            },
            rooms: rooms(2200),
            photos: photos("hill-view-inn"),
            amenities: vec![
                "Free WiFi".to_string(),
                "Parking".to_string(),
                "Room Service".to_string(),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoachRow, VehicleRow};
    use bzip2::write::BzEncoder;
    use bzip2::Compression;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn reads_camel_case_columns() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("vehicles.csv"),
            "vehicleId,status,availableSeats\n\
             11111111-1111-4111-8111-111111111111,active,72\n\
             22222222-2222-4222-8222-222222222222, inactive ,\n",
        )
        .unwrap();

        let rows: Vec<VehicleRow> = read_csv(dir.path(), "vehicles");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].available_seats, "72");
        assert_eq!(rows[1].status, "inactive");
        assert_eq!(rows[1].available_seats, "");
    }

    #[test]
    fn missing_columns_default_to_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("coaches.csv"),
            "coachId,vehicleId,coachType\nc1,v1,SL\n",
        )
        .unwrap();
        let rows: Vec<CoachRow> = read_csv(dir.path(), "coaches");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, "");
        assert_eq!(int_or_zero(&rows[0].seats_available).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let rows: Vec<VehicleRow> = read_csv(dir.path(), "vehicles");
        assert!(rows.is_empty());
    }

    #[test]
    fn reads_bz2_fixture() {
        let dir = TempDir::new().unwrap();
        let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
        encoder
            .write_all(b"vehicleId,status,availableSeats\nv1,active,10\nv2,active,20\n")
            .unwrap();
        fs::write(dir.path().join("vehicles.csv.bz2"), encoder.finish().unwrap()).unwrap();

        let rows: Vec<VehicleRow> = read_csv(dir.path(), "vehicles");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].vehicle_id, "v2");
    }

    #[test]
    fn corrupt_bz2_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vehicles.csv.bz2"), b"definitely not bzip2").unwrap();
        let rows: Vec<VehicleRow> = read_csv(dir.path(), "vehicles");
        assert!(rows.is_empty());
    }

    #[test]
    fn numeric_helpers() {
        assert_eq!(int_or_zero("").unwrap(), 0);
        assert_eq!(int_or_zero(" 42 ").unwrap(), 42);
        assert!(int_or_zero("forty").is_err());
        assert_eq!(float_or_zero("").unwrap(), 0.0);
        assert_eq!(float_or_zero("1250.50").unwrap(), 1250.5);
        assert!(float_or_zero("abc").is_err());
        assert!(float_or_zero("NaN").is_err());
        assert_eq!(optional_float("NULL").unwrap(), None);
        assert_eq!(optional_float("19.07").unwrap(), Some(19.07));
    }

    #[test]
    fn datetime_sentinel_and_formats() {
        assert_eq!(optional_datetime("NULL").unwrap(), None);
        assert_eq!(optional_datetime("null").unwrap(), None);
        assert_eq!(optional_datetime("").unwrap(), None);
        assert_eq!(
            optional_datetime("2024-03-01 06:05").unwrap().as_deref(),
            Some("2024-03-01 06:05:00")
        );
        assert_eq!(
            optional_datetime("2024-03-01T06:05:30").unwrap().as_deref(),
            Some("2024-03-01 06:05:30")
        );
        assert_eq!(
            optional_datetime("2024-03-01T06:05:30+05:30").unwrap().as_deref(),
            Some("2024-03-01 00:35:30")
        );
        assert!(optional_datetime("06:05 tomorrow").is_err());
    }

    #[test]
    fn builtin_dataset_shape() {
        let fx = flatten_hotels(&builtin_hotels());
        assert_eq!(fx.accommodations.len(), 2);
        assert_eq!(fx.addresses.len(), 2);
        assert_eq!(fx.hotels.len(), 2);
        assert_eq!(fx.rooms.len(), 8);
        assert_eq!(fx.photos.len(), 8);
        // "Free WiFi" is shared by both hotels
        assert_eq!(fx.amenities.len(), 5);
        assert_eq!(fx.amenity_maps.len(), 6);
    }

    #[test]
    fn flatten_links_children_to_parent() {
        let fx = flatten_hotels(&builtin_hotels());
        let first = &fx.accommodations[0];
        assert_eq!(first.address_id, fx.addresses[0].address_id);
        assert_eq!(
            fx.rooms
                .iter()
                .filter(|r| r.accommodation_id == first.accommodation_id)
                .count(),
            4
        );
        let room_ids: FxHashSet<_> = fx.rooms.iter().map(|r| r.room_id.clone()).collect();
        assert_eq!(room_ids.len(), 8);
    }

    #[test]
    fn hotel_json_accepts_numbers_and_strings() {
        let dir = TempDir::new().unwrap();
        let hotel_dir = dir.path().join(HOTEL_DIR);
        fs::create_dir_all(&hotel_dir).unwrap();
        fs::write(
            hotel_dir.join(HOTELS_FILE),
            r#"[{
                "name": "Lake Palace",
                "rating": 4.8,
                "status": "active",
                "breakfastIncluded": true,
                "acType": "AC",
                "address": {"street": "1 Lake Rd", "city": "Udaipur", "state": "Rajasthan",
                            "country": "India", "pincode": 313001},
                "rooms": [{"roomType": "Suite", "capacity": 2, "price": "9000"}],
                "photos": [{"url": "https://images.example.com/lake.jpg"}],
                "amenities": ["Spa"]
            }]"#,
        )
        .unwrap();

        let fx = read_hotel_fixtures(dir.path());
        assert_eq!(fx.accommodations.len(), 1);
        assert_eq!(fx.accommodations[0].rating, "4.8");
        assert_eq!(fx.addresses[0].pincode, "313001");
        assert_eq!(fx.rooms[0].capacity, "2");
        assert_eq!(fx.rooms[0].price, "9000");
        assert_eq!(fx.amenities[0].amenity_id, codec::amenity_id("Spa"));
    }

    #[test]
    fn malformed_hotel_record_is_skipped_alone() {
        let dir = TempDir::new().unwrap();
        let hotel_dir = dir.path().join(HOTEL_DIR);
        fs::create_dir_all(&hotel_dir).unwrap();
        fs::write(
            hotel_dir.join(HOTELS_FILE),
            r#"[
                {"name": "Lake Palace", "rating": 4.8, "status": "active",
                 "breakfastIncluded": true, "acType": "AC",
                 "address": {"street": "1 Lake Rd", "city": "Udaipur"},
                 "rooms": [{"roomType": "Suite", "capacity": 2, "price": 9000}]},
                {"name": "Broken Inn", "breakfastIncluded": "yes"}
            ]"#,
        )
        .unwrap();

        let fx = read_hotel_fixtures(dir.path());
        assert_eq!(fx.accommodations.len(), 1);
        assert_eq!(fx.accommodations[0].name, "Lake Palace");
        assert_eq!(fx.rooms.len(), 1);
    }

    #[test]
    fn unparseable_hotel_json_is_empty() {
        let dir = TempDir::new().unwrap();
        let hotel_dir = dir.path().join(HOTEL_DIR);
        fs::create_dir_all(&hotel_dir).unwrap();
        fs::write(hotel_dir.join(HOTELS_FILE), "{ not json").unwrap();
        let fx = read_hotel_fixtures(dir.path());
        assert_eq!(fx.row_count(), 0);
    }

    #[test]
    fn absent_hotel_file_uses_builtin() {
        let dir = TempDir::new().unwrap();
        let fx = read_hotel_fixtures(dir.path());
        assert_eq!(fx.accommodations.len(), 2);
    }
}
