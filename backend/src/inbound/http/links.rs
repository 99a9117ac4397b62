//! Absolute resource links derived from the request's connection info.
//!
//! Projections carry `self` links of the form
//! `{scheme}://{host}/api/v1/{boats|loads}/{id}`. Scheme and host come from
//! actix's connection info, which honours `Forwarded` and `X-Forwarded-*`.

use actix_web::HttpRequest;
use url::Url;

use crate::domain::{BoatId, Error, LoadId};

/// Path prefix shared by every API resource.
pub const API_PREFIX: &str = "/api/v1";

/// Link builder bound to one request's scheme and host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    origin: String,
}

impl Links {
    /// Capture scheme and host from `req`.
    pub fn from_request(req: &HttpRequest) -> Self {
        let info = req.connection_info();
        Self {
            origin: format!("{}://{}", info.scheme(), info.host()),
        }
    }

    /// Link builder for an explicit origin such as `https://harbour.test`.
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    /// `self` link of a boat.
    ///
    /// # Examples
    /// ```
    /// use harbour::domain::BoatId;
    /// use harbour::inbound::http::links::Links;
    ///
    /// let links = Links::for_origin("https://harbour.test");
    /// let id = BoatId::new(1).expect("positive id");
    /// assert_eq!(links.boat(id), "https://harbour.test/api/v1/boats/1");
    /// ```
    pub fn boat(&self, id: BoatId) -> String {
        format!("{}{API_PREFIX}/boats/{id}", self.origin)
    }

    /// `self` link of a load.
    pub fn load(&self, id: LoadId) -> String {
        format!("{}{API_PREFIX}/loads/{id}", self.origin)
    }

    /// Absolute URL of the current request, used as the base of `next`
    /// links so unrelated query parameters survive.
    pub fn current(&self, req: &HttpRequest) -> Result<Url, Error> {
        let path = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.path().to_owned(), |pq| pq.as_str().to_owned());
        Url::parse(&format!("{}{path}", self.origin))
            .map_err(|err| Error::internal(format!("failed to build request URL: {err}")))
    }
}
