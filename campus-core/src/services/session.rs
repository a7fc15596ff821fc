//! Session issuing, validation and revocation.
//!
//! Every minted token embeds the user's token version at mint time, so a
//! single counter increment kills every outstanding token for that user
//! without any denylist. Refresh tokens additionally rotate through a
//! single current-slot per user; presenting a superseded refresh token is
//! treated as revoked.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    models::{AuthContext, Role},
    services::{JwtService, ServiceError, TokenResponse},
    store::CredentialStore,
};

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    jwt: JwtService,
}

impl SessionService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Mint an access/refresh pair for a user and install the refresh jti
    /// as the user's current slot.
    pub async fn issue(&self, user_id: Uuid) -> Result<TokenResponse, ServiceError> {
        // 1. Snapshot the live token version; both tokens embed it
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let refresh_jti = Uuid::new_v4();
        let response = self.mint(user.id, user.role, user.token_version, refresh_jti)?;

        // 2. Make this refresh token the one the user can rotate from
        if !self.store.set_current_refresh(user.id, refresh_jti).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "Session issued");

        Ok(response)
    }

    /// Validate an access token and produce the caller identity.
    pub async fn validate_access(&self, token: &str) -> Result<AuthContext, ServiceError> {
        // 1. Signature, expiry and token type
        let claims = self.jwt.validate_access_token(token)?;

        // 2. The embedded version must still equal the live counter. A
        //    deleted account has no live counter and fails the same way.
        let live = self
            .store
            .token_version(claims.sub)
            .await?
            .ok_or(ServiceError::TokenRevoked)?;

        if claims.tv != live {
            return Err(ServiceError::TokenRevoked);
        }

        Ok(AuthContext {
            user_id: claims.sub,
            role: claims.role,
        })
    }

    /// Invalidate every outstanding token for a user at once by bumping
    /// the token version. There is no grace window.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let new_version = self
            .store
            .increment_token_version(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        tracing::info!(user_id = %user_id, token_version = new_version, "All sessions revoked");

        Ok(())
    }

    /// Rotate a refresh token: retire the presented one and mint a fresh
    /// pair. Exactly one concurrent caller can rotate a given token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        // 1. Signature, expiry and token type
        let claims = self.jwt.validate_refresh_token(refresh_token)?;

        // 2. Version gate, same as access validation
        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or(ServiceError::TokenRevoked)?;

        if claims.tv != user.token_version {
            return Err(ServiceError::TokenRevoked);
        }

        // 3. Rotate. The compare-and-swap fails if this jti was already
        //    rotated away or superseded by a newer login.
        let next_jti = Uuid::new_v4();
        if !self
            .store
            .swap_current_refresh(claims.sub, claims.jti, next_jti)
            .await?
        {
            tracing::warn!(user_id = %claims.sub, "Stale refresh token presented");
            return Err(ServiceError::TokenRevoked);
        }

        tracing::info!(user_id = %claims.sub, "Refresh token rotated");

        // 4. Mint with the version validated above rather than a re-read,
        //    so a racing revoke_all leaves these tokens dead on arrival.
        self.mint(user.id, user.role, user.token_version, next_jti)
    }

    fn mint(
        &self,
        user_id: Uuid,
        role: Role,
        token_version: i64,
        refresh_jti: Uuid,
    ) -> Result<TokenResponse, ServiceError> {
        let access_token = self
            .jwt
            .generate_access_token(user_id, role, token_version)
            .map_err(ServiceError::Internal)?;

        let refresh_token = self
            .jwt
            .generate_refresh_token(user_id, refresh_jti, token_version)
            .map_err(ServiceError::Internal)?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry_seconds(),
        })
    }
}
