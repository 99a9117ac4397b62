//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations such as persisting or retrieving the subject a
//! caller logged in as.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, Subject};

pub(crate) const SUBJECT_KEY: &str = "sub";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated subject in the session cookie.
    pub fn persist_subject(&self, sub: &Subject) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(SUBJECT_KEY, sub.as_ref())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the subject stored in the session, if present.
    ///
    /// A cookie carrying a malformed subject is treated as anonymous.
    pub fn subject(&self) -> Result<Option<Subject>, Error> {
        let raw = self
            .0
            .get::<String>(SUBJECT_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| match Subject::new(raw) {
            Ok(sub) => Some(sub),
            Err(error) => {
                warn!(%error, "invalid subject in session cookie");
                None
            }
        }))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
