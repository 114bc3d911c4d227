use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::model::{Account, Preferences, Profile, StreamingSubscription};
use crate::error::IdentityError;

/// Persistence contract the lifecycle depends on. The store is a plain
/// keyed collection; absence is `Ok(None)`, not an error.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, IdentityError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, IdentityError>;
    async fn create(&self, account: &Account) -> Result<Account, IdentityError>;
    async fn replace(&self, id: Uuid, account: &Account) -> Result<Account, IdentityError>;
    async fn remove(&self, id: Uuid) -> Result<(), IdentityError>;
}

/// Postgres-backed store. Nested records live in JSONB columns; unique
/// indexes on email and username make a racing insert fail atomically,
/// and that violation is classified back into the duplicate errors.
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    username: String,
    credential_hash: String,
    profile: Json<Profile>,
    preferences: Json<Preferences>,
    streaming_subscriptions: Json<Vec<StreamingSubscription>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            email: row.email,
            username: row.username,
            credential_hash: row.credential_hash,
            profile: row.profile.0,
            preferences: row.preferences.0,
            streaming_subscriptions: row.streaming_subscriptions.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, email, username, credential_hash, profile, preferences, \
                       streaming_subscriptions, created_at, updated_at";

fn classify(err: sqlx::Error) -> IdentityError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("accounts_email_key") => return IdentityError::DuplicateEmail,
                Some("accounts_username_key") => return IdentityError::DuplicateUsername,
                _ => {}
            }
        }
    }
    IdentityError::Storage(err.into())
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;
        Ok(row.map(Account::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;
        Ok(row.map(Account::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;
        Ok(row.map(Account::from))
    }

    async fn create(&self, account: &Account) -> Result<Account, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        ))
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.credential_hash)
        .bind(Json(&account.profile))
        .bind(Json(&account.preferences))
        .bind(Json(&account.streaming_subscriptions))
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }

    async fn replace(&self, id: Uuid, account: &Account) -> Result<Account, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts \
             SET email = $2, username = $3, credential_hash = $4, profile = $5, \
                 preferences = $6, streaming_subscriptions = $7, updated_at = $8 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.credential_hash)
        .bind(Json(&account.profile))
        .bind(Json(&account.preferences))
        .bind(Json(&account.streaming_subscriptions))
        .bind(account.updated_at)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;
        row.map(Account::from).ok_or(IdentityError::NotFound)
    }

    async fn remove(&self, id: Uuid) -> Result<(), IdentityError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound);
        }
        Ok(())
    }
}

/// In-memory store for lifecycle tests; mimics the schema's unique
/// indexes so the race-window classification is exercised too.
#[cfg(test)]
pub(crate) struct MemoryStore {
    accounts: std::sync::Mutex<std::collections::HashMap<Uuid, Account>>,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            accounts: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(&id).cloned())
    }

    async fn create(&self, account: &Account) -> Result<Account, IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == account.email) {
            return Err(IdentityError::DuplicateEmail);
        }
        if accounts.values().any(|a| a.username == account.username) {
            return Err(IdentityError::DuplicateUsername);
        }
        accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn replace(&self, id: Uuid, account: &Account) -> Result<Account, IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        if !accounts.contains_key(&id) {
            return Err(IdentityError::NotFound);
        }
        accounts.insert(id, account.clone());
        Ok(account.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        accounts.remove(&id).ok_or(IdentityError::NotFound)?;
        Ok(())
    }
}
