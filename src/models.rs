//! Fixture records, as read from CSV/JSON before any conversion.
//!
//! Numeric and time columns stay as text so a single malformed value becomes
//! a row error at insert time instead of failing the whole file.

use serde::{Deserialize, Deserializer};

/// Anything the batch loader can insert, identified for logs and probing.
pub trait FixtureRow {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleRow {
    pub vehicle_id: String,
    pub status: String,
    pub available_seats: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainRow {
    pub vehicle_id: String,
    pub train_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StationRow {
    pub station_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub station_type: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteLegRow {
    pub vehicle_station_id: String,
    pub vehicle_id: String,
    pub station_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stoppage: String,
    pub station_order: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoachRow {
    pub coach_id: String,
    pub vehicle_id: String,
    pub coach_type: String,
    pub seats_available: String,
    pub price: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatRow {
    pub seat_id: String,
    pub vehicle_id: String,
    pub coach_id: String,
    pub seat_number: String,
}

impl FixtureRow for VehicleRow {
    fn id(&self) -> &str {
        &self.vehicle_id
    }
}

impl FixtureRow for TrainRow {
    fn id(&self) -> &str {
        &self.vehicle_id
    }
}

impl FixtureRow for StationRow {
    fn id(&self) -> &str {
        &self.station_id
    }
}

impl FixtureRow for RouteLegRow {
    fn id(&self) -> &str {
        &self.vehicle_station_id
    }
}

impl FixtureRow for CoachRow {
    fn id(&self) -> &str {
        &self.coach_id
    }
}

impl FixtureRow for SeatRow {
    fn id(&self) -> &str {
        &self.seat_id
    }
}

/// Train-domain fixture set.
#[derive(Debug, Clone, Default)]
pub struct TrainFixtures {
    pub vehicles: Vec<VehicleRow>,
    pub trains: Vec<TrainRow>,
    pub stations: Vec<StationRow>,
    pub route_legs: Vec<RouteLegRow>,
    pub coaches: Vec<CoachRow>,
    pub seats: Vec<SeatRow>,
}

impl TrainFixtures {
    pub fn row_count(&self) -> usize {
        self.vehicles.len()
            + self.trains.len()
            + self.stations.len()
            + self.route_legs.len()
            + self.coaches.len()
            + self.seats.len()
    }
}

// Hotel domain: nested JSON records, flattened by the fixture reader.

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

/// JSON fixtures write numbers as numbers; keep them as text like CSV columns.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        Some(TextOrNumber::Text(s)) => s,
        Some(TextOrNumber::Int(i)) => i.to_string(),
        Some(TextOrNumber::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HotelRecord {
    pub accommodation_id: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub rating: String,
    pub status: String,
    pub breakfast_included: bool,
    pub ac_type: String,
    pub address: AddressRecord,
    pub rooms: Vec<RoomRecord>,
    pub photos: Vec<PhotoRecord>,
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressRecord {
    pub address_id: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    #[serde(deserialize_with = "text_or_number")]
    pub pincode: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomRecord {
    pub room_id: Option<String>,
    pub room_type: String,
    #[serde(deserialize_with = "text_or_number")]
    pub capacity: String,
    #[serde(deserialize_with = "text_or_number")]
    pub price: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoRecord {
    pub photo_id: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct AddressRow {
    pub address_id: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

#[derive(Debug, Clone, Default)]
pub struct AccommodationRow {
    pub accommodation_id: String,
    pub name: String,
    pub rating: String,
    pub status: String,
    pub address_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct HotelRow {
    pub accommodation_id: String,
    pub breakfast_included: bool,
    pub ac_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct RoomRow {
    pub room_id: String,
    pub accommodation_id: String,
    pub room_type: String,
    pub capacity: String,
    pub price: String,
}

#[derive(Debug, Clone, Default)]
pub struct PhotoRow {
    pub photo_id: String,
    pub accommodation_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct AmenityRow {
    pub amenity_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct AmenityMapRow {
    pub accommodation_id: String,
    pub amenity_id: String,
}

impl FixtureRow for AddressRow {
    fn id(&self) -> &str {
        &self.address_id
    }
}

impl FixtureRow for AccommodationRow {
    fn id(&self) -> &str {
        &self.accommodation_id
    }
}

impl FixtureRow for HotelRow {
    fn id(&self) -> &str {
        &self.accommodation_id
    }
}

impl FixtureRow for RoomRow {
    fn id(&self) -> &str {
        &self.room_id
    }
}

impl FixtureRow for PhotoRow {
    fn id(&self) -> &str {
        &self.photo_id
    }
}

impl FixtureRow for AmenityRow {
    fn id(&self) -> &str {
        &self.amenity_id
    }
}

impl FixtureRow for AmenityMapRow {
    fn id(&self) -> &str {
        &self.accommodation_id
    }
}

/// Hotel-domain fixture set, one list per table.
#[derive(Debug, Clone, Default)]
pub struct HotelFixtures {
    pub addresses: Vec<AddressRow>,
    pub accommodations: Vec<AccommodationRow>,
    pub hotels: Vec<HotelRow>,
    pub rooms: Vec<RoomRow>,
    pub photos: Vec<PhotoRow>,
    pub amenities: Vec<AmenityRow>,
    pub amenity_maps: Vec<AmenityMapRow>,
}

impl HotelFixtures {
    pub fn row_count(&self) -> usize {
        self.addresses.len()
            + self.accommodations.len()
            + self.hotels.len()
            + self.rooms.len()
            + self.photos.len()
            + self.amenities.len()
            + self.amenity_maps.len()
    }
}
