use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::accounts::model::{
    Notifications, OwnerAccount, Preferences, Privacy, Profile, StreamingSubscription, Visibility,
};
use crate::error::IdentityError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9]{3,30}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Request body for account registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub profile: Option<ProfilePatch>,
    #[serde(default)]
    pub preferences: Option<PreferencesPatch>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), IdentityError> {
        if !is_valid_email(self.email.trim()) {
            return Err(IdentityError::Validation("Invalid email".into()));
        }
        if !USERNAME_RE.is_match(&self.username) {
            return Err(IdentityError::Validation(
                "Username must be 3-30 alphanumeric characters".into(),
            ));
        }
        if self.password.len() < 8 {
            return Err(IdentityError::Validation(
                "Password must be at least 8 characters".into(),
            ));
        }
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        if let Some(preferences) = &self.preferences {
            preferences.validate()?;
        }
        Ok(())
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), IdentityError> {
        if !is_valid_email(self.email.trim()) {
            return Err(IdentityError::Validation("Invalid email".into()));
        }
        Ok(())
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Partial profile update; present fields overwrite, absent fields keep
/// their prior value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub date_of_birth: Option<String>,
    pub bio: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
}

impl ProfilePatch {
    pub fn validate(&self) -> Result<(), IdentityError> {
        if let Some(bio) = &self.bio {
            if bio.len() > 500 {
                return Err(IdentityError::Validation(
                    "Bio must be at most 500 characters".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn apply(self, profile: &mut Profile) {
        if let Some(v) = self.first_name {
            profile.first_name = Some(v);
        }
        if let Some(v) = self.last_name {
            profile.last_name = Some(v);
        }
        if let Some(v) = self.avatar {
            profile.avatar = Some(v);
        }
        if let Some(v) = self.date_of_birth {
            profile.date_of_birth = Some(v);
        }
        if let Some(v) = self.bio {
            profile.bio = Some(v);
        }
        if let Some(v) = self.favorite_genres {
            profile.favorite_genres = v;
        }
    }
}

/// Partial preferences update, merged leaf-by-leaf into the nested
/// records rather than replacing whole sub-objects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    pub language: Option<String>,
    pub region: Option<String>,
    pub adult_content: Option<bool>,
    pub notifications: Option<NotificationsPatch>,
    pub privacy: Option<PrivacyPatch>,
}

impl PreferencesPatch {
    pub fn validate(&self) -> Result<(), IdentityError> {
        if let Some(language) = &self.language {
            if language.len() != 2 {
                return Err(IdentityError::Validation(
                    "Language must be a 2-letter code".into(),
                ));
            }
        }
        if let Some(region) = &self.region {
            if region.len() != 2 {
                return Err(IdentityError::Validation(
                    "Region must be a 2-letter code".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn apply(self, preferences: &mut Preferences) {
        if let Some(v) = self.language {
            preferences.language = v;
        }
        if let Some(v) = self.region {
            preferences.region = v;
        }
        if let Some(v) = self.adult_content {
            preferences.adult_content = v;
        }
        if let Some(patch) = self.notifications {
            patch.apply(&mut preferences.notifications);
        }
        if let Some(patch) = self.privacy {
            patch.apply(&mut preferences.privacy);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationsPatch {
    pub new_recommendations: Option<bool>,
    pub group_invites: Option<bool>,
    pub movie_updates: Option<bool>,
    pub email: Option<bool>,
    pub push: Option<bool>,
}

impl NotificationsPatch {
    pub fn apply(self, notifications: &mut Notifications) {
        if let Some(v) = self.new_recommendations {
            notifications.new_recommendations = v;
        }
        if let Some(v) = self.group_invites {
            notifications.group_invites = v;
        }
        if let Some(v) = self.movie_updates {
            notifications.movie_updates = v;
        }
        if let Some(v) = self.email {
            notifications.email = v;
        }
        if let Some(v) = self.push {
            notifications.push = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacyPatch {
    pub profile_visibility: Option<Visibility>,
    pub ratings_visibility: Option<Visibility>,
    pub allow_group_invites: Option<bool>,
}

impl PrivacyPatch {
    pub fn apply(self, privacy: &mut Privacy) {
        if let Some(v) = self.profile_visibility {
            privacy.profile_visibility = v;
        }
        if let Some(v) = self.ratings_visibility {
            privacy.ratings_visibility = v;
        }
        if let Some(v) = self.allow_group_invites {
            privacy.allow_group_invites = v;
        }
    }
}

/// Request body for profile update. Email and username are not mutable
/// through this path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAccountRequest {
    pub profile: Option<ProfilePatch>,
    pub preferences: Option<PreferencesPatch>,
    pub streaming_subscriptions: Option<Vec<StreamingSubscription>>,
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> Result<(), IdentityError> {
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        if let Some(preferences) = &self.preferences {
            preferences.validate()?;
        }
        Ok(())
    }
}

/// Response for register, login, and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub account: OwnerAccount,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_patch_touches_only_named_leaves() {
        let mut prefs = Preferences::default();
        let patch: PreferencesPatch = serde_json::from_str(
            r#"{"adultContent": true, "notifications": {"push": true}}"#,
        )
        .unwrap();
        patch.apply(&mut prefs);

        assert!(prefs.adult_content);
        assert!(prefs.notifications.push);
        // Untouched siblings keep their values.
        assert_eq!(prefs.language, "en");
        assert!(prefs.notifications.email);
        assert!(prefs.notifications.group_invites);
        assert_eq!(prefs.privacy.profile_visibility, Visibility::Public);
    }

    #[test]
    fn profile_patch_keeps_absent_fields() {
        let mut profile = Profile {
            first_name: Some("Alice".into()),
            bio: Some("hello".into()),
            ..Profile::default()
        };
        let patch = ProfilePatch {
            bio: Some("new bio".into()),
            ..ProfilePatch::default()
        };
        patch.apply(&mut profile);
        assert_eq!(profile.first_name.as_deref(), Some("Alice"));
        assert_eq!(profile.bio.as_deref(), Some("new bio"));
    }

    #[test]
    fn register_rejects_bad_email_and_short_password() {
        let bad_email = RegisterRequest {
            email: "not-an-email".into(),
            username: "alice".into(),
            password: "hunter2pass".into(),
            profile: None,
            preferences: None,
        };
        assert!(matches!(
            bad_email.validate(),
            Err(IdentityError::Validation(_))
        ));

        let short_password = RegisterRequest {
            email: "a@b.com".into(),
            username: "alice".into(),
            password: "short".into(),
            profile: None,
            preferences: None,
        };
        assert!(matches!(
            short_password.validate(),
            Err(IdentityError::Validation(_))
        ));
    }

    #[test]
    fn register_rejects_bad_usernames() {
        let too_long = "x".repeat(31);
        for username in ["ab", "has space", "not-alnum!", too_long.as_str()] {
            let req = RegisterRequest {
                email: "a@b.com".into(),
                username: username.to_string(),
                password: "hunter2pass".into(),
                profile: None,
                preferences: None,
            };
            assert!(req.validate().is_err(), "username {username:?} accepted");
        }
    }

    #[test]
    fn bio_over_500_chars_is_rejected() {
        let patch = ProfilePatch {
            bio: Some("x".repeat(501)),
            ..ProfilePatch::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(IdentityError::Validation(_))
        ));
    }
}
