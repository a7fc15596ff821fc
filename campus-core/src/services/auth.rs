//! Two-step challenge login.
//!
//! Step one trades a correct password for a short-lived opaque challenge.
//! Step two trades that challenge plus a one-time code for a session. The
//! challenge is single-use and only its hash is ever stored.

use std::sync::Arc;

use validator::Validate;

use crate::{
    config::ChallengeConfig,
    models::{BeginLoginRequest, ChallengeToken, CompleteLoginRequest, IssuedChallenge},
    services::{ServiceError, SessionService, TokenResponse},
    store::CredentialStore,
    utils::{generate_opaque_token, Password},
};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    sessions: SessionService,
    challenge_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        sessions: SessionService,
        config: &ChallengeConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            challenge_ttl_minutes: config.ttl_minutes,
        }
    }

    /// First login step: check the password and hand out a challenge.
    ///
    /// Every failure is `InvalidCredentials`. The store burns a dummy
    /// verification for unknown emails, so the answer is uniform in timing
    /// as well as shape.
    pub async fn begin_login(
        &self,
        req: BeginLoginRequest,
    ) -> Result<IssuedChallenge, ServiceError> {
        req.validate()?;

        // 1. Verify password
        let user = self
            .store
            .verify_password(&req.email, &Password::new(req.password.clone()))
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        // 2. Two-step login is mandatory; an account without an enrolled
        //    second factor gets the same uniform rejection
        if !user.requires_challenge() {
            tracing::warn!(user_id = %user.id, "Login rejected, no second factor enrolled");
            return Err(ServiceError::InvalidCredentials);
        }

        // 3. Mint the opaque challenge; only its hash is persisted
        let token = generate_opaque_token();
        let challenge = ChallengeToken::new(user.id, &token, self.challenge_ttl_minutes);
        let expires_at = challenge.expires_at;

        self.store.insert_challenge(challenge).await?;

        tracing::info!(user_id = %user.id, "Login challenge issued");

        Ok(IssuedChallenge {
            challenge_token: token,
            expires_at,
        })
    }

    /// Second login step: redeem the challenge with the one-time code.
    pub async fn complete_login(
        &self,
        req: CompleteLoginRequest,
    ) -> Result<TokenResponse, ServiceError> {
        req.validate()?;

        // 1. Look up by hash. A never-issued token and an evicted expired
        //    one are indistinguishable here
        let token_hash = ChallengeToken::hash_token(&req.challenge_token);
        let challenge = self
            .store
            .find_challenge(&token_hash)
            .await?
            .ok_or(ServiceError::ChallengeExpired)?;

        if challenge.is_expired() {
            return Err(ServiceError::ChallengeExpired);
        }
        if challenge.consumed {
            return Err(ServiceError::ChallengeAlreadyUsed);
        }

        // 2. Check the one-time code. Failure leaves the challenge open so
        //    the user may retry until the TTL runs out
        if !self
            .store
            .verify_two_factor_code(challenge.user_id, &req.code)
            .await?
        {
            tracing::warn!(user_id = %challenge.user_id, "One-time code rejected");
            return Err(ServiceError::InvalidCode);
        }

        // 3. Consume. Compare-and-set, so of any concurrent redeemers of
        //    this token exactly one proceeds
        if !self.store.consume_challenge(&token_hash).await? {
            return Err(ServiceError::ChallengeAlreadyUsed);
        }

        tracing::info!(user_id = %challenge.user_id, "Login challenge completed");

        // 4. The winner gets a session
        self.sessions.issue(challenge.user_id).await
    }
}
