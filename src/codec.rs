//! Identifier codec for keys crossing the store boundary.
//!
//! Fixtures carry canonical dashed UUIDs (`8-4-4-4-12`). The store keeps them
//! in `BINARY(16)` columns, read back through `HEX(col)` as 32 hex digits.

use anyhow::{Context, Result};
use uuid::Uuid;

/// Offsets (in the 32-digit form) after which a dash is reinserted.
const DASH_AFTER: [usize; 4] = [8, 12, 16, 20];

/// Namespace for deterministic amenity ids.
const AMENITY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b9e_4a7d_4c35_9e0b_58d3_a1f2_7c40);

/// Strips separators from a dashed id.
pub fn to_storage(id: &str) -> String {
    id.chars().filter(|c| *c != '-').collect()
}

/// Reinserts separators into a 32-digit hex id and lowercases it.
pub fn to_dashed(hex: &str) -> String {
    let mut out = String::with_capacity(36);
    for (i, c) in hex.chars().enumerate() {
        if DASH_AFTER.contains(&i) {
            out.push('-');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// The 16-byte value bound to `BINARY(16)` key columns.
pub fn to_bytes(id: &str) -> Result<Vec<u8>> {
    let uuid = Uuid::try_parse(&to_storage(id))
        .with_context(|| format!("Malformed identifier: {id:?}"))?;
    Ok(uuid.as_bytes().to_vec())
}

/// Stable id for an amenity name, so amenities survive re-imports as natural keys.
pub fn amenity_id(name: &str) -> String {
    Uuid::new_v5(&AMENITY_NAMESPACE, name.trim().to_lowercase().as_bytes())
        .hyphenated()
        .to_string()
}

pub fn random_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
