//! Domain definitions: which tables a domain owns, how to clear them and in
//! what order to load them.

pub mod hotel;
pub mod train;

use crate::clear::ClearStep;
use crate::loader::Loader;
use crate::stats::LoadResult;
use futures::future::BoxFuture;
use std::fmt;
use std::path::Path;

pub use hotel::HotelDomain;
pub use train::TrainDomain;

/// Every table the loader writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Vehicle,
    Train,
    Station,
    RouteLeg,
    Coach,
    Seat,
    Address,
    Accommodation,
    Hotel,
    Room,
    Photo,
    Amenity,
    AmenityMap,
}

impl Entity {
    pub fn table(self) -> &'static str {
        match self {
            Entity::Vehicle => "vehicle",
            Entity::Train => "train",
            Entity::Station => "station",
            Entity::RouteLeg => "vehicle_station",
            Entity::Coach => "coach",
            Entity::Seat => "seat",
            Entity::Address => "address",
            Entity::Accommodation => "accommodation",
            Entity::Hotel => "hotel",
            Entity::Room => "room",
            Entity::Photo => "photo",
            Entity::Amenity => "amenity",
            Entity::AmenityMap => "amenity_map",
        }
    }

    /// Primary key column, as probed by the existence checks.
    pub fn key_column(self) -> &'static str {
        match self {
            Entity::Vehicle | Entity::Train => "vehicle_id",
            Entity::Station => "station_id",
            Entity::RouteLeg => "vehicle_station_id",
            Entity::Coach => "coach_id",
            Entity::Seat => "seat_id",
            Entity::Address => "address_id",
            Entity::Accommodation | Entity::Hotel | Entity::AmenityMap => "accommodation_id",
            Entity::Room => "room_id",
            Entity::Photo => "photo_id",
            Entity::Amenity => "amenity_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Entity::Vehicle => "Vehicles",
            Entity::Train => "Trains",
            Entity::Station => "Stations",
            Entity::RouteLeg => "Route legs",
            Entity::Coach => "Coaches",
            Entity::Seat => "Seats",
            Entity::Address => "Addresses",
            Entity::Accommodation => "Accommodations",
            Entity::Hotel => "Hotels",
            Entity::Room => "Rooms",
            Entity::Photo => "Photos",
            Entity::Amenity => "Amenities",
            Entity::AmenityMap => "Amenity maps",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Load phases, in the order the orchestrator walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Parent,
    Independent,
    Join,
    Child,
    Leaf,
}

/// Loads one entity of a domain from that domain's fixtures.
pub type LoadFn<F> = for<'a> fn(&'a Loader, &'a F) -> BoxFuture<'a, LoadResult>;

pub struct Stage<F> {
    pub entity: Entity,
    pub phase: Phase,
    pub load: LoadFn<F>,
}

impl<F> Stage<F> {
    pub fn new(entity: Entity, phase: Phase, load: LoadFn<F>) -> Self {
        Self { entity, phase, load }
    }
}

/// Row count read back after loading, scoped to the domain.
pub struct VerifyQuery {
    pub entity: Entity,
    pub scope: Option<&'static str>,
}

/// A self-contained slice of the inventory that is cleared and reloaded as a unit.
pub trait Domain {
    type Fixtures: Send + Sync;

    const NAME: &'static str;

    fn read_fixtures(root: &Path) -> Self::Fixtures;

    /// Number of fixture rows, used to warn before clearing into an empty load.
    fn fixture_rows(fixtures: &Self::Fixtures) -> usize;

    /// Tables to empty, children first.
    fn clear_plan() -> &'static [ClearStep];

    /// Loader stages, parents first.
    fn stages() -> Vec<Stage<Self::Fixtures>>;

    fn verify_queries() -> &'static [VerifyQuery];

    /// Rows of `entity` the fixtures supply, for the per-stage progress bar.
    fn input_rows(fixtures: &Self::Fixtures, entity: Entity) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ordered<D: Domain>() {
        let phases: Vec<Phase> = D::stages().iter().map(|s| s.phase).collect();
        assert!(
            phases.windows(2).all(|w| w[0] <= w[1]),
            "{} stages out of phase order: {phases:?}",
            D::NAME
        );
    }

    #[test]
    fn train_stage_order() {
        assert_ordered::<TrainDomain>();
        let entities: Vec<Entity> = TrainDomain::stages().iter().map(|s| s.entity).collect();
        assert_eq!(
            entities,
            vec![
                Entity::Vehicle,
                Entity::Train,
                Entity::Station,
                Entity::RouteLeg,
                Entity::Coach,
                Entity::Seat,
            ]
        );
    }

    #[test]
    fn hotel_stage_order() {
        assert_ordered::<HotelDomain>();
        let entities: Vec<Entity> = HotelDomain::stages().iter().map(|s| s.entity).collect();
        assert_eq!(
            entities,
            vec![
                Entity::Address,
                Entity::Accommodation,
                Entity::Hotel,
                Entity::Amenity,
                Entity::Room,
                Entity::Photo,
                Entity::AmenityMap,
            ]
        );
    }

    #[test]
    fn clear_plans_empty_children_before_parents() {
        fn check<D: Domain>(edges: &[(&str, &str)]) {
            let pos = |table: &str| {
                D::clear_plan()
                    .iter()
                    .position(|s| s.table == table)
                    .unwrap_or_else(|| panic!("{} never clears {table}", D::NAME))
            };
            for (child, parent) in edges {
                assert!(pos(*child) < pos(*parent), "{child} must be cleared before {parent}");
            }
        }
        check::<TrainDomain>(&[
            ("seat", "coach"),
            ("seat", "vehicle"),
            ("vehicle_station", "vehicle"),
            ("coach", "vehicle"),
            ("train", "vehicle"),
        ]);
        check::<HotelDomain>(&[
            ("amenity_map", "accommodation"),
            ("photo", "accommodation"),
            ("room", "accommodation"),
            ("hotel", "accommodation"),
            ("accommodation", "address"),
        ]);
    }

    #[test]
    fn shared_natural_keys_are_never_cleared() {
        let tables: Vec<&str> = TrainDomain::clear_plan()
            .iter()
            .chain(HotelDomain::clear_plan())
            .map(|s| s.table)
            .collect();
        assert!(!tables.contains(&"station"));
        assert!(!tables.contains(&"amenity"));
    }
}
