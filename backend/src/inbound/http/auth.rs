//! Principal extraction for HTTP handlers.
//!
//! A request authenticates with `Authorization: Bearer <id token>`, verified
//! through the [`LoginService`](crate::domain::ports::LoginService) port, or
//! with the session cookie set by `POST /login`. A bearer header that fails
//! verification is rejected outright rather than falling back to the cookie.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, IdToken, Principal};

use super::session::SessionContext;
use super::state::HttpState;

const BEARER: &str = "bearer";

/// Caller that must be authenticated; extraction fails with 401 otherwise.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    /// The authenticated caller.
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

/// Caller that may be anonymous.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Principal>);

impl MaybeAuthenticated {
    /// The caller, when one authenticated.
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

/// Pull the bearer credential out of the `Authorization` header.
///
/// Returns `Ok(None)` when the header is absent.
fn bearer_token(headers: &HeaderMap) -> Result<Option<IdToken>, Error> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let (scheme, credential) = value
        .split_once(' ')
        .ok_or_else(|| Error::unauthorized("malformed authorization header"))?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(Error::unauthorized("unsupported authorization scheme"));
    }
    IdToken::try_from_raw(credential.trim())
        .map(Some)
        .map_err(|_| Error::unauthorized("missing bearer token"))
}

async fn resolve_principal(
    state: Option<web::Data<HttpState>>,
    bearer: Result<Option<IdToken>, Error>,
    session: Result<SessionContext, actix_web::Error>,
) -> Result<Option<Principal>, Error> {
    if let Some(token) = bearer? {
        let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
        return state.login.authenticate(&token).await.map(Some);
    }
    match session {
        Ok(session) => Ok(session.subject()?.map(Principal::new)),
        // No session middleware on this route: nobody can be logged in.
        Err(_) => Ok(None),
    }
}

fn extract(
    req: &HttpRequest,
    payload: &mut Payload,
) -> LocalBoxFuture<'static, Result<Option<Principal>, Error>> {
    let state = req.app_data::<web::Data<HttpState>>().cloned();
    let bearer = bearer_token(req.headers());
    let session = SessionContext::from_request(req, payload);
    Box::pin(async move { resolve_principal(state, bearer, session.await).await })
}

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let principal = extract(req, payload);
        Box::pin(async move {
            principal
                .await?
                .map(Authenticated)
                .ok_or_else(|| Error::unauthorized("login required").into())
        })
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let principal = extract(req, payload);
        Box::pin(async move { Ok(MaybeAuthenticated(principal.await?)) })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::http::header::HeaderValue;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    use crate::inbound::http::test_utils::{memory_state, test_session_middleware};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("header"));
        headers
    }

    #[rstest]
    #[case("Bearer fixture.alice")]
    #[case("bearer   fixture.alice")]
    fn bearer_tokens_are_parsed(#[case] raw: &str) {
        let token = bearer_token(&headers(raw)).expect("parsed").expect("present");
        assert_eq!(token.expose(), "fixture.alice");
    }

    #[rstest]
    #[case("Basic YWRtaW46cGFzc3dvcmQ=")]
    #[case("Bearer")]
    #[case("Bearer    ")]
    fn malformed_authorization_is_unauthorised(#[case] raw: &str) {
        let error = bearer_token(&headers(raw)).expect_err("rejected");
        assert_eq!(error.code(), crate::domain::ErrorCode::Unauthorized);
    }

    #[rstest]
    fn absent_header_is_anonymous() {
        assert!(bearer_token(&HeaderMap::new()).expect("ok").is_none());
    }

    async fn whoami(caller: Authenticated) -> HttpResponse {
        HttpResponse::Ok().body(caller.principal().sub().to_string())
    }

    async fn maybe(caller: MaybeAuthenticated) -> HttpResponse {
        let body = caller
            .principal()
            .map_or_else(|| "anonymous".to_owned(), |p| p.sub().to_string());
        HttpResponse::Ok().body(body)
    }

    #[actix_web::test]
    async fn bearer_principals_are_verified() {
        let app = actix_test::init_service(
            App::new()
                .app_data(memory_state())
                .wrap(test_session_middleware())
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let ok = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/whoami")
                .insert_header((AUTHORIZATION, "Bearer fixture.alice"))
                .to_request(),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(ok).await, "alice");

        let forged = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/whoami")
                .insert_header((AUTHORIZATION, "Bearer forged"))
                .to_request(),
        )
        .await;
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn anonymous_callers_are_rejected_or_passed_through() {
        let app = actix_test::init_service(
            App::new()
                .app_data(memory_state())
                .wrap(test_session_middleware())
                .route("/whoami", web::get().to(whoami))
                .route("/maybe", web::get().to(maybe)),
        )
        .await;

        let required =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/whoami").to_request()).await;
        assert_eq!(required.status(), StatusCode::UNAUTHORIZED);

        let optional =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/maybe").to_request()).await;
        assert_eq!(optional.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(optional).await, "anonymous");
    }
}
