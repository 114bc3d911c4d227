use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::accounts::dto::{AuthResponse, RegisterRequest, UpdateAccountRequest};
use crate::accounts::model::{Account, OwnerAccount, Preferences, Profile};
use crate::accounts::repo::AccountStore;
use crate::auth::jwt::TokenKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::IdentityError;

/// Orchestrates the account lifecycle over an injected store and the
/// token keys. Holds no cached account state across calls.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn AccountStore>,
    keys: TokenKeys,
}

impl IdentityService {
    pub fn new(store: Arc<dyn AccountStore>, keys: TokenKeys) -> Self {
        Self { store, keys }
    }

    pub fn verify_access(&self, token: &str) -> Result<Uuid, IdentityError> {
        self.keys.verify_access(token)
    }

    fn session(&self, account: &Account) -> Result<AuthResponse, IdentityError> {
        let pair = self
            .keys
            .issue_pair(account.id)
            .map_err(IdentityError::Storage)?;
        Ok(AuthResponse {
            account: account.owner_view(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Uniqueness checks happen before the hash and the single create;
    /// the schema's unique indexes are the backstop for racing calls.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, IdentityError> {
        let email = req.email.trim().to_lowercase();
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail);
        }
        if self.store.find_by_username(&req.username).await?.is_some() {
            return Err(IdentityError::DuplicateUsername);
        }

        let credential_hash = hash_password(&req.password).map_err(IdentityError::Storage)?;

        let mut profile = Profile::default();
        if let Some(patch) = req.profile {
            patch.apply(&mut profile);
        }
        let mut preferences = Preferences::default();
        if let Some(patch) = req.preferences {
            patch.apply(&mut preferences);
        }

        let now = OffsetDateTime::now_utc();
        let account = Account {
            id: Uuid::new_v4(),
            email,
            username: req.username,
            credential_hash,
            profile,
            preferences,
            streaming_subscriptions: vec![],
            created_at: now,
            updated_at: now,
        };

        let account = self.store.create(&account).await?;
        info!(account_id = %account.id, username = %account.username, "account registered");
        self.session(&account)
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, IdentityError> {
        let email = email.trim().to_lowercase();
        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let ok = verify_password(password, &account.credential_hash)
            .map_err(IdentityError::Storage)?;
        if !ok {
            return Err(IdentityError::InvalidCredentials);
        }

        info!(account_id = %account.id, "account logged in");
        self.session(&account)
    }

    /// Pure passthrough; also backs token-subject resolution.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, IdentityError> {
        self.store.find_by_id(id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateAccountRequest,
    ) -> Result<OwnerAccount, IdentityError> {
        let mut account = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound)?;

        if let Some(patch) = req.profile {
            patch.apply(&mut account.profile);
        }
        if let Some(patch) = req.preferences {
            patch.apply(&mut account.preferences);
        }
        if let Some(subscriptions) = req.streaming_subscriptions {
            account.streaming_subscriptions = subscriptions;
        }

        // Strictly increasing even if the clock has not advanced.
        let now = OffsetDateTime::now_utc();
        account.updated_at = if now > account.updated_at {
            now
        } else {
            account.updated_at + Duration::microseconds(1)
        };

        let account = self.store.replace(id, &account).await?;
        info!(account_id = %account.id, "account updated");
        Ok(account.owner_view())
    }

    /// Existence is confirmed first so a missing account reports
    /// `NotFound` instead of silently succeeding.
    pub async fn remove(&self, id: Uuid) -> Result<(), IdentityError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound)?;
        self.store.remove(id).await?;
        info!(account_id = %id, "account removed");
        Ok(())
    }

    /// Rotation without revocation: the presented refresh token stays
    /// structurally valid until its expiry, it just is not returned again.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, IdentityError> {
        let account_id = self.keys.verify_refresh(refresh_token)?;
        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or(IdentityError::NotFound)?;
        self.session(&account)
    }
}
