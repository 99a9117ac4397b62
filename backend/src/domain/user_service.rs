//! Login, onboarding and user queries.
//!
//! Users are created on their first successful login and never change
//! afterwards. Bearer-authenticated requests only verify the token.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    IdentityError, IdentityVerifier, LoginService, RecordStoreError, UserRepository, UsersQuery,
};
use crate::domain::{
    Error, IdToken, IdentityClaims, NewUser, PageRequest, Principal, RecordPage, StoreCallPolicy,
    User,
};

/// User service implementing login and the user queries.
pub struct UserService<U> {
    users: Arc<U>,
    verifier: Arc<dyn IdentityVerifier>,
    clock: Arc<dyn Clock>,
    policy: StoreCallPolicy,
}

impl<U> Clone for UserService<U> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            verifier: Arc::clone(&self.verifier),
            clock: Arc::clone(&self.clock),
            policy: self.policy.clone(),
        }
    }
}

impl<U> UserService<U> {
    /// Create the service.
    pub fn new(
        users: Arc<U>,
        verifier: Arc<dyn IdentityVerifier>,
        clock: Arc<dyn Clock>,
        policy: StoreCallPolicy,
    ) -> Self {
        Self {
            users,
            verifier,
            clock,
            policy,
        }
    }
}

impl<U: UserRepository> UserService<U> {
    async fn verify(&self, token: &IdToken) -> Result<IdentityClaims, Error> {
        self.verifier.verify(token).await.map_err(|error| {
            match &error {
                IdentityError::Rejected { reason } => {
                    warn!(token = %token.fingerprint(), %reason, "identity token rejected");
                }
                IdentityError::Unavailable { message } => {
                    warn!(%message, "identity provider unavailable");
                }
            }
            Error::from(error)
        })
    }

    async fn find(&self, claims: &IdentityClaims) -> Result<Option<User>, RecordStoreError> {
        self.policy
            .read("users.find_by_sub", || self.users.find_by_sub(&claims.sub))
            .await
    }

    async fn onboard(&self, claims: IdentityClaims) -> Result<User, Error> {
        if let Some(existing) = self.find(&claims).await? {
            return Ok(existing);
        }
        let new_user = NewUser {
            sub: claims.sub.clone(),
            first_name: claims.given_name.clone(),
            last_name: claims.family_name.clone(),
            account_created: self.clock.utc().date_naive(),
        };
        match self
            .policy
            .write("users.insert", || self.users.insert(new_user.clone()))
            .await
        {
            Ok(user) => {
                info!(user_id = %user.id, sub = %user.sub, "user registered");
                Ok(user)
            }
            Err(RecordStoreError::Duplicate { .. }) => self
                .find(&claims)
                .await?
                .ok_or_else(|| Error::internal("user vanished after duplicate insert")),
            Err(other) => Err(other.into()),
        }
    }
}

#[async_trait]
impl<U: UserRepository> LoginService for UserService<U> {
    async fn login(&self, token: &IdToken) -> Result<User, Error> {
        let claims = self.verify(token).await?;
        self.onboard(claims).await
    }

    async fn authenticate(&self, token: &IdToken) -> Result<Principal, Error> {
        Ok(self.verify(token).await?.into())
    }
}

#[async_trait]
impl<U: UserRepository> UsersQuery for UserService<U> {
    async fn list(&self, page: PageRequest) -> Result<RecordPage<User>, Error> {
        Ok(self
            .policy
            .read("users.list", || self.users.list(page))
            .await?)
    }

    async fn current(&self, principal: &Principal) -> Result<User, Error> {
        self.policy
            .read("users.find_by_sub", || self.users.find_by_sub(principal.sub()))
            .await?
            .ok_or_else(|| Error::not_found("user has not logged in yet"))
    }
}
