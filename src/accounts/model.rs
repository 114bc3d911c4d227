use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Persisted identity record. The credential hash lives only here; the
/// serializable projections below have no field for it.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub credential_hash: String,
    pub profile: Profile,
    pub preferences: Preferences,
    pub streaming_subscriptions: Vec<StreamingSubscription>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub favorite_genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub language: String,
    pub region: String,
    pub adult_content: bool,
    pub notifications: Notifications,
    pub privacy: Privacy,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "en".into(),
            region: "US".into(),
            adult_content: false,
            notifications: Notifications::default(),
            privacy: Privacy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notifications {
    pub new_recommendations: bool,
    pub group_invites: bool,
    pub movie_updates: bool,
    pub email: bool,
    pub push: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            new_recommendations: true,
            group_invites: true,
            movie_updates: true,
            email: true,
            push: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Privacy {
    pub profile_visibility: Visibility,
    pub ratings_visibility: Visibility,
    pub allow_group_invites: bool,
}

impl Default for Privacy {
    fn default() -> Self {
        Self {
            profile_visibility: Visibility::Public,
            ratings_visibility: Visibility::Public,
            allow_group_invites: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Private,
}

/// Replaced wholesale on update when the request carries the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingSubscription {
    pub service_id: String,
    pub service_name: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

/// Projection returned to the account owner: everything but the hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerAccount {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub profile: Profile,
    pub preferences: Preferences,
    pub streaming_subscriptions: Vec<StreamingSubscription>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Projection shown when viewing another account by id: additionally
/// omits the email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: Uuid,
    pub username: String,
    pub profile: Profile,
    pub preferences: Preferences,
    pub streaming_subscriptions: Vec<StreamingSubscription>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Account {
    pub fn owner_view(&self) -> OwnerAccount {
        OwnerAccount {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            profile: self.profile.clone(),
            preferences: self.preferences.clone(),
            streaming_subscriptions: self.streaming_subscriptions.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn public_view(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            username: self.username.clone(),
            profile: self.profile.clone(),
            preferences: self.preferences.clone(),
            streaming_subscriptions: self.streaming_subscriptions.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        let now = OffsetDateTime::now_utc();
        Account {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            username: "alice".into(),
            credential_hash: "$argon2id$fake".into(),
            profile: Profile::default(),
            preferences: Preferences::default(),
            streaming_subscriptions: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn preference_defaults_match_documented_values() {
        let prefs = Preferences::default();
        assert_eq!(prefs.language, "en");
        assert_eq!(prefs.region, "US");
        assert!(!prefs.adult_content);
        assert!(prefs.notifications.new_recommendations);
        assert!(prefs.notifications.email);
        assert!(!prefs.notifications.push);
        assert_eq!(prefs.privacy.profile_visibility, Visibility::Public);
        assert!(prefs.privacy.allow_group_invites);
    }

    #[test]
    fn profile_defaults_to_empty_genres() {
        let profile = Profile::default();
        assert!(profile.favorite_genres.is_empty());
        assert!(profile.first_name.is_none());
    }

    #[test]
    fn partial_preferences_deserialize_with_defaults_filled() {
        let prefs: Preferences = serde_json::from_str(r#"{"adultContent": true}"#).unwrap();
        assert!(prefs.adult_content);
        assert_eq!(prefs.language, "en");
        assert!(prefs.notifications.group_invites);
    }

    #[test]
    fn owner_view_never_serializes_the_hash() {
        let account = sample_account();
        let json = serde_json::to_string(&account.owner_view()).unwrap();
        assert!(!json.contains("credentialHash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("a@b.com"));
    }

    #[test]
    fn public_view_also_omits_email() {
        let account = sample_account();
        let json = serde_json::to_string(&account.public_view()).unwrap();
        assert!(!json.contains("credentialHash"));
        assert!(!json.contains("a@b.com"));
        assert!(json.contains("alice"));
    }

    #[test]
    fn visibility_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Visibility::Friends).unwrap(),
            "\"friends\""
        );
    }
}
