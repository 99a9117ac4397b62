//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate them with `diesel print-schema`
//! or update them by hand.

diesel::table! {
    /// Boats, including the ordered ids of the loads they carry.
    boats (id) {
        id -> Int8,
        /// Compare-and-swap token bumped on every write.
        version -> Int8,
        /// Identity subject of the creator; never projected.
        owner_sub -> Varchar,
        /// Unique by exact match (`boats_name_key`).
        name -> Varchar,
        boat_type -> Varchar,
        length -> Int8,
        is_public -> Bool,
        load_ids -> Array<Int8>,
    }
}

diesel::table! {
    /// Loads. `carrier_id` is the authoritative side of the assignment.
    loads (id) {
        id -> Int8,
        version -> Int8,
        volume -> Int8,
        content -> Varchar,
        creation_date -> Date,
        carrier_id -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Users registered on first login; `sub` is unique.
    users (id) {
        id -> Int8,
        sub -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        account_created -> Date,
    }
}

diesel::allow_tables_to_appear_in_same_query!(boats, loads, users);
