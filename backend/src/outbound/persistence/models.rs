//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Row to record conversion lives here so
//! every repository rejects malformed rows the same way.

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::domain::ports::RecordStoreError;
use crate::domain::{
    Boat, BoatId, BoatName, Load, LoadId, Subject, User, UserId, Version,
};

use super::schema::{boats, loads, users};

fn corrupt(table: &str, id: i64, what: &str) -> RecordStoreError {
    RecordStoreError::query(format!("{table} row {id} has invalid {what}"))
}

fn positive_u32(table: &str, id: i64, what: &str, raw: i64) -> Result<u32, RecordStoreError> {
    u32::try_from(raw)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| corrupt(table, id, what))
}

// ---------------------------------------------------------------------------
// Boats
// ---------------------------------------------------------------------------

/// Row struct for reading from the boats table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = boats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BoatRow {
    pub id: i64,
    pub version: i64,
    pub owner_sub: String,
    pub name: String,
    pub boat_type: String,
    pub length: i64,
    pub is_public: bool,
    pub load_ids: Vec<i64>,
}

/// Insertable struct for creating boats; version and loads take defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = boats)]
pub(crate) struct NewBoatRow<'a> {
    pub owner_sub: &'a str,
    pub name: &'a str,
    pub boat_type: &'a str,
    pub length: i64,
    pub is_public: bool,
}

/// Changeset writing every mutable boat column, including the new version.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = boats)]
pub(crate) struct BoatUpdate<'a> {
    pub version: i64,
    pub name: &'a str,
    pub boat_type: &'a str,
    pub length: i64,
    pub is_public: bool,
    pub load_ids: Vec<i64>,
}

impl<'a> BoatUpdate<'a> {
    pub(crate) fn from_boat(boat: &'a Boat) -> Self {
        Self {
            version: boat.version.next().get(),
            name: boat.name.as_ref(),
            boat_type: boat.boat_type.as_str(),
            length: i64::from(boat.length),
            is_public: boat.public,
            load_ids: boat.loads.iter().map(|id| id.get()).collect(),
        }
    }
}

impl TryFrom<BoatRow> for Boat {
    type Error = RecordStoreError;

    fn try_from(row: BoatRow) -> Result<Self, Self::Error> {
        let id = BoatId::new(row.id).ok_or_else(|| corrupt("boats", row.id, "id"))?;
        let loads = row
            .load_ids
            .iter()
            .map(|raw| LoadId::new(*raw).ok_or_else(|| corrupt("boats", row.id, "load_ids")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            version: Version::from_stored(row.version),
            owner: Subject::new(row.owner_sub).map_err(|_| corrupt("boats", row.id, "owner"))?,
            name: BoatName::new(row.name).map_err(|_| corrupt("boats", row.id, "name"))?,
            boat_type: row.boat_type,
            length: positive_u32("boats", row.id, "length", row.length)?,
            public: row.is_public,
            loads,
        })
    }
}

// ---------------------------------------------------------------------------
// Loads
// ---------------------------------------------------------------------------

/// Row struct for reading from the loads table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = loads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoadRow {
    pub id: i64,
    pub version: i64,
    pub volume: i64,
    pub content: String,
    pub creation_date: NaiveDate,
    pub carrier_id: Option<i64>,
}

/// Insertable struct for creating loads; new loads have no carrier.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = loads)]
pub(crate) struct NewLoadRow<'a> {
    pub volume: i64,
    pub content: &'a str,
    pub creation_date: NaiveDate,
}

/// Changeset writing every mutable load column.
///
/// `treat_none_as_null` so clearing the carrier writes `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = loads)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct LoadUpdate<'a> {
    pub version: i64,
    pub volume: i64,
    pub content: &'a str,
    pub creation_date: NaiveDate,
    pub carrier_id: Option<i64>,
}

impl<'a> LoadUpdate<'a> {
    pub(crate) fn from_load(load: &'a Load) -> Self {
        Self {
            version: load.version.next().get(),
            volume: i64::from(load.volume),
            content: load.content.as_str(),
            creation_date: load.creation_date,
            carrier_id: load.carrier.map(BoatId::get),
        }
    }
}

impl TryFrom<LoadRow> for Load {
    type Error = RecordStoreError;

    fn try_from(row: LoadRow) -> Result<Self, Self::Error> {
        let carrier = row
            .carrier_id
            .map(|raw| BoatId::new(raw).ok_or_else(|| corrupt("loads", row.id, "carrier_id")))
            .transpose()?;
        Ok(Self {
            id: LoadId::new(row.id).ok_or_else(|| corrupt("loads", row.id, "id"))?,
            version: Version::from_stored(row.version),
            volume: positive_u32("loads", row.id, "volume", row.volume)?,
            content: row.content,
            creation_date: row.creation_date,
            carrier,
        })
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub sub: String,
    pub first_name: String,
    pub last_name: String,
    pub account_created: NaiveDate,
}

/// Insertable struct for registering users.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub sub: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub account_created: NaiveDate,
}

impl TryFrom<UserRow> for User {
    type Error = RecordStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id).ok_or_else(|| corrupt("users", row.id, "id"))?,
            sub: Subject::new(row.sub).map_err(|_| corrupt("users", row.id, "sub"))?,
            first_name: row.first_name,
            last_name: row.last_name,
            account_created: row.account_created,
        })
    }
}
