//! Table definitions for the inventory schema.
//!
//! Written in the subset of SQL shared by MySQL and SQLite so the same
//! statements bootstrap a production database or a local test file.

pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS vehicle (
        vehicle_id BINARY(16) NOT NULL PRIMARY KEY,
        type VARCHAR(16) NOT NULL,
        status VARCHAR(32) NOT NULL,
        available_seats INT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS train (
        vehicle_id BINARY(16) NOT NULL PRIMARY KEY,
        train_name VARCHAR(128) NOT NULL,
        FOREIGN KEY (vehicle_id) REFERENCES vehicle (vehicle_id)
    )",
    "CREATE TABLE IF NOT EXISTS station (
        station_id BINARY(16) NOT NULL PRIMARY KEY,
        name VARCHAR(128) NOT NULL,
        type VARCHAR(32) NOT NULL,
        city VARCHAR(64) NOT NULL,
        state VARCHAR(64) NOT NULL,
        country VARCHAR(64) NOT NULL,
        latitude DOUBLE NULL,
        longitude DOUBLE NULL
    )",
    "CREATE TABLE IF NOT EXISTS vehicle_station (
        vehicle_station_id BINARY(16) NOT NULL PRIMARY KEY,
        vehicle_id BINARY(16) NOT NULL,
        station_id BINARY(16) NOT NULL,
        arrival_time DATETIME NULL,
        departure_time DATETIME NULL,
        stoppage INT NOT NULL DEFAULT 0,
        station_order INT NOT NULL,
        UNIQUE (vehicle_id, station_order),
        FOREIGN KEY (vehicle_id) REFERENCES vehicle (vehicle_id),
        FOREIGN KEY (station_id) REFERENCES station (station_id)
    )",
    "CREATE TABLE IF NOT EXISTS coach (
        coach_id BINARY(16) NOT NULL PRIMARY KEY,
        vehicle_id BINARY(16) NOT NULL,
        coach_type VARCHAR(32) NOT NULL,
        seats_available INT NOT NULL DEFAULT 0,
        price DECIMAL(10, 2) NOT NULL DEFAULT 0,
        FOREIGN KEY (vehicle_id) REFERENCES vehicle (vehicle_id)
    )",
    "CREATE TABLE IF NOT EXISTS seat (
        seat_id BINARY(16) NOT NULL PRIMARY KEY,
        vehicle_id BINARY(16) NOT NULL,
        coach_id BINARY(16) NOT NULL,
        seat_number VARCHAR(16) NOT NULL,
        FOREIGN KEY (vehicle_id) REFERENCES vehicle (vehicle_id),
        FOREIGN KEY (coach_id) REFERENCES coach (coach_id)
    )",
    "CREATE TABLE IF NOT EXISTS address (
        address_id BINARY(16) NOT NULL PRIMARY KEY,
        street VARCHAR(255) NOT NULL,
        city VARCHAR(64) NOT NULL,
        state VARCHAR(64) NOT NULL,
        country VARCHAR(64) NOT NULL,
        pincode VARCHAR(16) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS accommodation (
        accommodation_id BINARY(16) NOT NULL PRIMARY KEY,
        type VARCHAR(16) NOT NULL,
        name VARCHAR(255) NOT NULL,
        rating DOUBLE NOT NULL DEFAULT 0,
        status VARCHAR(32) NOT NULL,
        address_id BINARY(16) NULL,
        FOREIGN KEY (address_id) REFERENCES address (address_id)
    )",
    "CREATE TABLE IF NOT EXISTS hotel (
        accommodation_id BINARY(16) NOT NULL PRIMARY KEY,
        breakfast_included BOOLEAN NOT NULL DEFAULT FALSE,
        ac_type VARCHAR(16) NOT NULL,
        FOREIGN KEY (accommodation_id) REFERENCES accommodation (accommodation_id)
    )",
    "CREATE TABLE IF NOT EXISTS room (
        room_id BINARY(16) NOT NULL PRIMARY KEY,
        accommodation_id BINARY(16) NOT NULL,
        room_type VARCHAR(32) NOT NULL,
        capacity INT NOT NULL DEFAULT 0,
        price DECIMAL(10, 2) NOT NULL DEFAULT 0,
        FOREIGN KEY (accommodation_id) REFERENCES accommodation (accommodation_id)
    )",
    "CREATE TABLE IF NOT EXISTS photo (
        photo_id BINARY(16) NOT NULL PRIMARY KEY,
        accommodation_id BINARY(16) NOT NULL,
        url VARCHAR(512) NOT NULL,
        FOREIGN KEY (accommodation_id) REFERENCES accommodation (accommodation_id)
    )",
    "CREATE TABLE IF NOT EXISTS amenity (
        amenity_id BINARY(16) NOT NULL PRIMARY KEY,
        name VARCHAR(64) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS amenity_map (
        accommodation_id BINARY(16) NOT NULL,
        amenity_id BINARY(16) NOT NULL,
        PRIMARY KEY (accommodation_id, amenity_id),
        FOREIGN KEY (accommodation_id) REFERENCES accommodation (accommodation_id),
        FOREIGN KEY (amenity_id) REFERENCES amenity (amenity_id)
    )",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn position(table: &str) -> usize {
        let needle = format!("CREATE TABLE IF NOT EXISTS {table} (");
        CREATE_TABLES
            .iter()
            .position(|ddl| ddl.starts_with(&needle))
            .unwrap_or_else(|| panic!("no DDL for {table}"))
    }

    #[test]
    fn referenced_tables_are_created_first() {
        let edges = [
            ("train", "vehicle"),
            ("vehicle_station", "vehicle"),
            ("vehicle_station", "station"),
            ("coach", "vehicle"),
            ("seat", "coach"),
            ("accommodation", "address"),
            ("hotel", "accommodation"),
            ("room", "accommodation"),
            ("photo", "accommodation"),
            ("amenity_map", "amenity"),
        ];
        for (child, parent) in edges {
            assert!(position(parent) < position(child), "{parent} before {child}");
        }
    }
}
