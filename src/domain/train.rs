use super::{Domain, Entity, Phase, Stage, VerifyQuery};
use crate::clear::ClearStep;
use crate::codec;
use crate::fixtures::{self, float_or_zero, int_or_zero, optional_datetime, optional_float};
use crate::loader::Loader;
use crate::models::{CoachRow, RouteLegRow, SeatRow, StationRow, TrainFixtures, TrainRow, VehicleRow};
use crate::probe;
use crate::stats::LoadResult;
use crate::store::Store;
use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::Path;

/// Value of `vehicle.type` for rows this domain owns.
pub const VEHICLE_TYPE: &str = "train";

const TRAIN_VEHICLES: &str = "vehicle_id IN (SELECT vehicle_id FROM vehicle WHERE type = 'train')";

// A seat may hang off a train coach while naming another vehicle.
const TRAIN_SEATS: &str = "vehicle_id IN (SELECT vehicle_id FROM vehicle WHERE type = 'train') \
     OR coach_id IN (SELECT coach_id FROM coach WHERE vehicle_id IN \
     (SELECT vehicle_id FROM vehicle WHERE type = 'train'))";

const CLEAR_PLAN: &[ClearStep] = &[
    ClearStep::new("seat", TRAIN_SEATS),
    ClearStep::new("vehicle_station", TRAIN_VEHICLES),
    ClearStep::new("coach", TRAIN_VEHICLES),
    ClearStep::new("train", TRAIN_VEHICLES),
    ClearStep::new("vehicle", "type = 'train'"),
];

const VERIFY: &[VerifyQuery] = &[
    VerifyQuery { entity: Entity::Vehicle, scope: Some("type = 'train'") },
    VerifyQuery { entity: Entity::Train, scope: None },
    VerifyQuery { entity: Entity::Station, scope: None },
    VerifyQuery { entity: Entity::RouteLeg, scope: Some(TRAIN_VEHICLES) },
    VerifyQuery { entity: Entity::Coach, scope: Some(TRAIN_VEHICLES) },
    VerifyQuery { entity: Entity::Seat, scope: Some(TRAIN_SEATS) },
];

/// Trains: vehicles with their stations, route legs, coaches and seats.
pub struct TrainDomain;

impl Domain for TrainDomain {
    type Fixtures = TrainFixtures;

    const NAME: &'static str = "train";

    fn read_fixtures(root: &Path) -> TrainFixtures {
        fixtures::read_train_fixtures(root)
    }

    fn fixture_rows(fixtures: &TrainFixtures) -> usize {
        fixtures.row_count()
    }

    fn clear_plan() -> &'static [ClearStep] {
        CLEAR_PLAN
    }

    fn stages() -> Vec<Stage<TrainFixtures>> {
        vec![
            Stage::new(Entity::Vehicle, Phase::Parent, load_vehicles),
            Stage::new(Entity::Train, Phase::Parent, load_trains),
            Stage::new(Entity::Station, Phase::Independent, load_stations),
            Stage::new(Entity::RouteLeg, Phase::Join, load_route_legs),
            Stage::new(Entity::Coach, Phase::Child, load_coaches),
            Stage::new(Entity::Seat, Phase::Leaf, load_seats),
        ]
    }

    fn verify_queries() -> &'static [VerifyQuery] {
        VERIFY
    }

    fn input_rows(fixtures: &TrainFixtures, entity: Entity) -> usize {
        match entity {
            Entity::Vehicle => fixtures.vehicles.len(),
            Entity::Train => fixtures.trains.len(),
            Entity::Station => fixtures.stations.len(),
            Entity::RouteLeg => fixtures.route_legs.len(),
            Entity::Coach => fixtures.coaches.len(),
            Entity::Seat => fixtures.seats.len(),
            _ => 0,
        }
    }
}

fn load_vehicles<'a>(loader: &'a Loader, fx: &'a TrainFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_natural(Entity::Vehicle, &fx.vehicles, insert_vehicle)
        .boxed()
}

fn load_trains<'a>(loader: &'a Loader, fx: &'a TrainFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_unconditional(Entity::Train, &fx.trains, insert_train)
        .boxed()
}

fn load_stations<'a>(loader: &'a Loader, fx: &'a TrainFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_natural(Entity::Station, &fx.stations, insert_station)
        .boxed()
}

// Route legs and coaches carry no existence pre-check: a re-imported
// duplicate is rejected by the store and counted as a row error.
fn load_route_legs<'a>(loader: &'a Loader, fx: &'a TrainFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_unconditional(Entity::RouteLeg, &fx.route_legs, insert_route_leg)
        .boxed()
}

fn load_coaches<'a>(loader: &'a Loader, fx: &'a TrainFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_unconditional(Entity::Coach, &fx.coaches, insert_coach)
        .boxed()
}

fn load_seats<'a>(loader: &'a Loader, fx: &'a TrainFixtures) -> BoxFuture<'a, LoadResult> {
    async move {
        let valid_coaches = probe::all_ids(loader.store(), Entity::Coach, None).await;
        loader
            .load_checked(
                Entity::Seat,
                &fx.seats,
                &valid_coaches,
                |seat| seat.coach_id.as_str(),
                insert_seat,
            )
            .await
    }
    .boxed()
}

fn insert_vehicle<'a>(store: &'a Store, row: &'a VehicleRow) -> BoxFuture<'a, Result<()>> {
    async move {
        let available_seats = int_or_zero(&row.available_seats)?;
        sqlx::query(
            "INSERT INTO vehicle (vehicle_id, type, status, available_seats) VALUES (?, ?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.vehicle_id)?)
        .bind(VEHICLE_TYPE)
        .bind(row.status.as_str())
        .bind(available_seats)
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_train<'a>(store: &'a Store, row: &'a TrainRow) -> BoxFuture<'a, Result<()>> {
    async move {
        sqlx::query("INSERT INTO train (vehicle_id, train_name) VALUES (?, ?)")
            .bind(codec::to_bytes(&row.vehicle_id)?)
            .bind(row.train_name.as_str())
            .execute(store.pool())
            .await?;
        Ok(())
    }
    .boxed()
}

fn insert_station<'a>(store: &'a Store, row: &'a StationRow) -> BoxFuture<'a, Result<()>> {
    async move {
        let latitude = optional_float(&row.latitude)?;
        let longitude = optional_float(&row.longitude)?;
        sqlx::query(
            "INSERT INTO station (station_id, name, type, city, state, country, latitude, longitude) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.station_id)?)
        .bind(row.name.as_str())
        .bind(row.station_type.as_str())
        .bind(row.city.as_str())
        .bind(row.state.as_str())
        .bind(row.country.as_str())
        .bind(latitude)
        .bind(longitude)
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_route_leg<'a>(store: &'a Store, row: &'a RouteLegRow) -> BoxFuture<'a, Result<()>> {
    async move {
        let arrival = optional_datetime(&row.arrival_time)?;
        let departure = optional_datetime(&row.departure_time)?;
        let stoppage = int_or_zero(&row.stoppage)?;
        let station_order = int_or_zero(&row.station_order)?;
        sqlx::query(
            "INSERT INTO vehicle_station \
             (vehicle_station_id, vehicle_id, station_id, arrival_time, departure_time, stoppage, station_order) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.vehicle_station_id)?)
        .bind(codec::to_bytes(&row.vehicle_id)?)
        .bind(codec::to_bytes(&row.station_id)?)
        .bind(arrival)
        .bind(departure)
        .bind(stoppage)
        .bind(station_order)
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_coach<'a>(store: &'a Store, row: &'a CoachRow) -> BoxFuture<'a, Result<()>> {
    async move {
        let seats_available = int_or_zero(&row.seats_available)?;
        let price = float_or_zero(&row.price)?;
        sqlx::query(
            "INSERT INTO coach (coach_id, vehicle_id, coach_type, seats_available, price) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.coach_id)?)
        .bind(codec::to_bytes(&row.vehicle_id)?)
        .bind(row.coach_type.as_str())
        .bind(seats_available)
        .bind(price)
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_seat<'a>(store: &'a Store, row: &'a SeatRow) -> BoxFuture<'a, Result<()>> {
    async move {
        sqlx::query("INSERT INTO seat (seat_id, vehicle_id, coach_id, seat_number) VALUES (?, ?, ?, ?)")
            .bind(codec::to_bytes(&row.seat_id)?)
            .bind(codec::to_bytes(&row.vehicle_id)?)
            .bind(codec::to_bytes(&row.coach_id)?)
            .bind(row.seat_number.as_str())
            .execute(store.pool())
            .await?;
        Ok(())
    }
    .boxed()
}
