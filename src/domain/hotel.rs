use super::{Domain, Entity, Phase, Stage, VerifyQuery};
use crate::clear::ClearStep;
use crate::codec;
use crate::fixtures::{self, float_or_zero, int_or_zero};
use crate::loader::Loader;
use crate::models::{
    AccommodationRow, AddressRow, AmenityMapRow, AmenityRow, HotelFixtures, HotelRow, PhotoRow,
    RoomRow,
};
use crate::probe;
use crate::stats::LoadResult;
use crate::store::Store;
use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::Path;

/// Value of `accommodation.type` for rows this domain owns.
pub const ACCOMMODATION_TYPE: &str = "hotel";

const HOTEL_ACCOMMODATIONS: &str =
    "accommodation_id IN (SELECT accommodation_id FROM accommodation WHERE type = 'hotel')";

const HOTEL_ADDRESSES: &str =
    "address_id IN (SELECT address_id FROM accommodation WHERE type = 'hotel')";

// Accommodations point at their address, so addresses go last and only once
// nothing references them any more.
const ORPHAN_ADDRESSES: &str =
    "address_id NOT IN (SELECT address_id FROM accommodation WHERE address_id IS NOT NULL)";

const CLEAR_PLAN: &[ClearStep] = &[
    ClearStep::new("amenity_map", HOTEL_ACCOMMODATIONS),
    ClearStep::new("photo", HOTEL_ACCOMMODATIONS),
    ClearStep::new("room", HOTEL_ACCOMMODATIONS),
    ClearStep::new("hotel", HOTEL_ACCOMMODATIONS),
    ClearStep::new("accommodation", "type = 'hotel'"),
    ClearStep::new("address", ORPHAN_ADDRESSES),
];

const VERIFY: &[VerifyQuery] = &[
    VerifyQuery { entity: Entity::Address, scope: Some(HOTEL_ADDRESSES) },
    VerifyQuery { entity: Entity::Accommodation, scope: Some("type = 'hotel'") },
    VerifyQuery { entity: Entity::Hotel, scope: None },
    VerifyQuery { entity: Entity::Amenity, scope: None },
    VerifyQuery { entity: Entity::Room, scope: Some(HOTEL_ACCOMMODATIONS) },
    VerifyQuery { entity: Entity::Photo, scope: Some(HOTEL_ACCOMMODATIONS) },
    VerifyQuery { entity: Entity::AmenityMap, scope: Some(HOTEL_ACCOMMODATIONS) },
];

/// Hotels: accommodations with their address, rooms, photos and amenities.
pub struct HotelDomain;

impl Domain for HotelDomain {
    type Fixtures = HotelFixtures;

    const NAME: &'static str = "hotel";

    fn read_fixtures(root: &Path) -> HotelFixtures {
        fixtures::read_hotel_fixtures(root)
    }

    fn fixture_rows(fixtures: &HotelFixtures) -> usize {
        fixtures.row_count()
    }

    fn clear_plan() -> &'static [ClearStep] {
        CLEAR_PLAN
    }

    fn stages() -> Vec<Stage<HotelFixtures>> {
        vec![
            Stage::new(Entity::Address, Phase::Parent, load_addresses),
            Stage::new(Entity::Accommodation, Phase::Parent, load_accommodations),
            Stage::new(Entity::Hotel, Phase::Parent, load_hotels),
            Stage::new(Entity::Amenity, Phase::Independent, load_amenities),
            Stage::new(Entity::Room, Phase::Child, load_rooms),
            Stage::new(Entity::Photo, Phase::Child, load_photos),
            Stage::new(Entity::AmenityMap, Phase::Leaf, load_amenity_maps),
        ]
    }

    fn verify_queries() -> &'static [VerifyQuery] {
        VERIFY
    }

    fn input_rows(fixtures: &HotelFixtures, entity: Entity) -> usize {
        match entity {
            Entity::Address => fixtures.addresses.len(),
            Entity::Accommodation => fixtures.accommodations.len(),
            Entity::Hotel => fixtures.hotels.len(),
            Entity::Room => fixtures.rooms.len(),
            Entity::Photo => fixtures.photos.len(),
            Entity::Amenity => fixtures.amenities.len(),
            Entity::AmenityMap => fixtures.amenity_maps.len(),
            _ => 0,
        }
    }
}

fn load_addresses<'a>(loader: &'a Loader, fx: &'a HotelFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_unconditional(Entity::Address, &fx.addresses, insert_address)
        .boxed()
}

fn load_accommodations<'a>(loader: &'a Loader, fx: &'a HotelFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_natural(Entity::Accommodation, &fx.accommodations, insert_accommodation)
        .boxed()
}

fn load_hotels<'a>(loader: &'a Loader, fx: &'a HotelFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_unconditional(Entity::Hotel, &fx.hotels, insert_hotel)
        .boxed()
}

fn load_amenities<'a>(loader: &'a Loader, fx: &'a HotelFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_natural(Entity::Amenity, &fx.amenities, insert_amenity)
        .boxed()
}

fn load_rooms<'a>(loader: &'a Loader, fx: &'a HotelFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_unconditional(Entity::Room, &fx.rooms, insert_room)
        .boxed()
}

fn load_photos<'a>(loader: &'a Loader, fx: &'a HotelFixtures) -> BoxFuture<'a, LoadResult> {
    loader
        .load_unconditional(Entity::Photo, &fx.photos, insert_photo)
        .boxed()
}

fn load_amenity_maps<'a>(loader: &'a Loader, fx: &'a HotelFixtures) -> BoxFuture<'a, LoadResult> {
    async move {
        let valid_amenities = probe::all_ids(loader.store(), Entity::Amenity, None).await;
        loader
            .load_checked(
                Entity::AmenityMap,
                &fx.amenity_maps,
                &valid_amenities,
                |map| map.amenity_id.as_str(),
                insert_amenity_map,
            )
            .await
    }
    .boxed()
}

fn insert_address<'a>(store: &'a Store, row: &'a AddressRow) -> BoxFuture<'a, Result<()>> {
    async move {
        sqlx::query(
            "INSERT INTO address (address_id, street, city, state, country, pincode) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.address_id)?)
        .bind(row.street.as_str())
        .bind(row.city.as_str())
        .bind(row.state.as_str())
        .bind(row.country.as_str())
        .bind(row.pincode.as_str())
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_accommodation<'a>(
    store: &'a Store,
    row: &'a AccommodationRow,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let rating = float_or_zero(&row.rating)?;
        sqlx::query(
            "INSERT INTO accommodation (accommodation_id, type, name, rating, status, address_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.accommodation_id)?)
        .bind(ACCOMMODATION_TYPE)
        .bind(row.name.as_str())
        .bind(rating)
        .bind(row.status.as_str())
        .bind(codec::to_bytes(&row.address_id)?)
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_hotel<'a>(store: &'a Store, row: &'a HotelRow) -> BoxFuture<'a, Result<()>> {
    async move {
        sqlx::query(
            "INSERT INTO hotel (accommodation_id, breakfast_included, ac_type) VALUES (?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.accommodation_id)?)
        .bind(row.breakfast_included)
        .bind(row.ac_type.as_str())
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_room<'a>(store: &'a Store, row: &'a RoomRow) -> BoxFuture<'a, Result<()>> {
    async move {
        let capacity = int_or_zero(&row.capacity)?;
        let price = float_or_zero(&row.price)?;
        sqlx::query(
            "INSERT INTO room (room_id, accommodation_id, room_type, capacity, price) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(codec::to_bytes(&row.room_id)?)
        .bind(codec::to_bytes(&row.accommodation_id)?)
        .bind(row.room_type.as_str())
        .bind(capacity)
        .bind(price)
        .execute(store.pool())
        .await?;
        Ok(())
    }
    .boxed()
}

fn insert_photo<'a>(store: &'a Store, row: &'a PhotoRow) -> BoxFuture<'a, Result<()>> {
    async move {
        sqlx::query("INSERT INTO photo (photo_id, accommodation_id, url) VALUES (?, ?, ?)")
            .bind(codec::to_bytes(&row.photo_id)?)
            .bind(codec::to_bytes(&row.accommodation_id)?)
            .bind(row.url.as_str())
            .execute(store.pool())
            .await?;
        Ok(())
    }
    .boxed()
}

fn insert_amenity<'a>(store: &'a Store, row: &'a AmenityRow) -> BoxFuture<'a, Result<()>> {
    async move {
        sqlx::query("INSERT INTO amenity (amenity_id, name) VALUES (?, ?)")
            .bind(codec::to_bytes(&row.amenity_id)?)
            .bind(row.name.as_str())
            .execute(store.pool())
            .await?;
        Ok(())
    }
    .boxed()
}

fn insert_amenity_map<'a>(store: &'a Store, row: &'a AmenityMapRow) -> BoxFuture<'a, Result<()>> {
    async move {
        sqlx::query("INSERT INTO amenity_map (accommodation_id, amenity_id) VALUES (?, ?)")
            .bind(codec::to_bytes(&row.accommodation_id)?)
            .bind(codec::to_bytes(&row.amenity_id)?)
            .execute(store.pool())
            .await?;
        Ok(())
    }
    .boxed()
}
