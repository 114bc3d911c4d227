use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::JwtConfig, error::IdentityError};

/// Token type tag embedded in every claim set.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload: subject account id plus the kind tag.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub kind: TokenKind,
}

/// Access and refresh tokens are signed with distinct secrets, so a token
/// of one kind never validates against the other kind's key even before
/// the kind tag is checked.
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// Fresh session handed out on register, login, and refresh.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(cfg.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(cfg.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            access_ttl: Duration::minutes(cfg.access_ttl_minutes),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes),
        }
    }

    fn sign_with_kind(&self, account_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let (key, ttl) = match kind {
            TokenKind::Access => (&self.access_encoding, self.access_ttl),
            TokenKind::Refresh => (&self.refresh_encoding, self.refresh_ttl),
        };
        let claims = Claims {
            sub: account_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
            kind,
        };
        let token = encode(&Header::default(), &claims, key)?;
        debug!(account_id = %account_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, account_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(account_id, TokenKind::Access)
    }

    pub fn sign_refresh(&self, account_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(account_id, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, account_id: Uuid) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign_access(account_id)?,
            refresh_token: self.sign_refresh(account_id)?,
        })
    }

    /// Signature, expiry (zero leeway), and kind tag must all check out;
    /// every failure collapses to the same `InvalidToken`.
    fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Uuid, IdentityError> {
        let key = match expected {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, key, &validation).map_err(|e| {
            warn!(error = %e, kind = ?expected, "jwt verification failed");
            IdentityError::InvalidToken
        })?;
        if data.claims.kind != expected {
            warn!(kind = ?data.claims.kind, expected = ?expected, "jwt kind mismatch");
            return Err(IdentityError::InvalidToken);
        }
        debug!(account_id = %data.claims.sub, kind = ?expected, "jwt verified");
        Ok(data.claims.sub)
    }

    pub fn verify_access(&self, token: &str) -> Result<Uuid, IdentityError> {
        self.verify_kind(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, IdentityError> {
        self.verify_kind(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn make_keys() -> TokenKeys {
        TokenKeys::from_config(&JwtConfig {
            access_secret: "access-test-secret".into(),
            refresh_secret: "refresh-test-secret".into(),
            access_ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let account_id = Uuid::new_v4();
        let token = keys.sign_access(account_id).expect("sign access");
        let subject = keys.verify_access(&token).expect("verify access");
        assert_eq!(subject, account_id);
    }

    #[test]
    fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let account_id = Uuid::new_v4();
        let token = keys.sign_refresh(account_id).expect("sign refresh");
        let subject = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(subject, account_id);
    }

    #[test]
    fn verify_access_rejects_refresh_token() {
        let keys = make_keys();
        let token = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        assert!(matches!(
            keys.verify_access(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4()).expect("sign access");
        assert!(matches!(
            keys.verify_refresh(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn verify_rejects_token_signed_with_other_secret() {
        let keys = make_keys();
        let other = TokenKeys::from_config(&JwtConfig {
            access_secret: "completely-different".into(),
            refresh_secret: "also-different".into(),
            access_ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        });
        let token = other.sign_access(Uuid::new_v4()).expect("sign access");
        assert!(matches!(
            keys.verify_access(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_fails_immediately() {
        let keys = TokenKeys::from_config(&JwtConfig {
            access_secret: "access-test-secret".into(),
            refresh_secret: "refresh-test-secret".into(),
            access_ttl_minutes: -1,
            refresh_ttl_minutes: -1,
        });
        let access = keys.sign_access(Uuid::new_v4()).expect("sign access");
        let refresh = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        assert!(matches!(
            keys.verify_access(&access),
            Err(IdentityError::InvalidToken)
        ));
        assert!(matches!(
            keys.verify_refresh(&refresh),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(matches!(
            keys.verify_access("not.a.jwt"),
            Err(IdentityError::InvalidToken)
        ));
    }
}
