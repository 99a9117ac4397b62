//! Domain primitives, aggregates and services.
//!
//! Purpose: define the boat, load and user records, the assignment engine
//! that keeps `Boat::loads` and `Load::carrier` in agreement, and the record
//! services behind the driving ports. Nothing here knows about HTTP or SQL;
//! adapters reach the domain through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Boat / Load / User: stored records and their validated drafts.
//! - AssignmentService: the assignment engine, pair repair and
//!   reconciliation.
//! - BoatService / LoadService / UserService: record services.

pub mod assignment_reconcile;
pub mod assignment_service;
pub mod auth;
pub mod boat;
pub mod boat_service;
pub mod error;
pub mod load;
pub mod load_service;
pub mod ports;
pub mod record;
pub mod store_call_policy;
pub mod trace_id;
pub mod user;
pub mod user_service;

pub use self::assignment_reconcile::{RECONCILE_PAGE_SIZE, ReconcileReport};
pub use self::assignment_service::{
    AssignmentError, AssignmentService, MissingRecord, PairRepair,
};
pub use self::auth::{IdToken, IdTokenValidationError, IdentityClaims, Principal};
pub use self::boat::{
    BOAT_NAME_MAX, BOAT_TYPE_MAX, Boat, BoatDraft, BoatName, BoatPatch, BoatValidationError,
    HydratedBoat,
};
pub use self::boat_service::BoatService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::load::{
    CREATION_DATE_FORMAT, LOAD_CONTENT_MAX, Load, LoadDraft, LoadPatch, LoadValidationError,
};
pub use self::load_service::LoadService;
pub use self::record::{
    BoatId, LoadId, PageRequest, RecordIdParseError, RecordPage, UserId, Version,
};
pub use self::store_call_policy::{
    BackoffJitter, DEFAULT_STORE_ATTEMPTS, DEFAULT_STORE_BACKOFF, DEFAULT_STORE_TIMEOUT,
    NoJitter, RandomJitter, StoreCallPolicy,
};
pub use self::trace_id::TraceId;
pub use self::user::{NewUser, SUBJECT_MAX, Subject, User, UserValidationError};
pub use self::user_service::UserService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use harbour::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
