//! User record and profile data models.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::fields::ProfileAttribute;

/// Profile attributes collected by steps 2 and 3. Each is unset until filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
}

impl ProfileFields {
    pub fn get(&self, attr: ProfileAttribute) -> Option<&str> {
        let slot = match attr {
            ProfileAttribute::AboutMe => &self.about_me,
            ProfileAttribute::StreetAddress => &self.street_address,
            ProfileAttribute::City => &self.city,
            ProfileAttribute::State => &self.state,
            ProfileAttribute::Zip => &self.zip,
            ProfileAttribute::Birthdate => &self.birthdate,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, attr: ProfileAttribute, value: impl Into<String>) {
        let slot = match attr {
            ProfileAttribute::AboutMe => &mut self.about_me,
            ProfileAttribute::StreetAddress => &mut self.street_address,
            ProfileAttribute::City => &mut self.city,
            ProfileAttribute::State => &mut self.state,
            ProfileAttribute::Zip => &mut self.zip,
            ProfileAttribute::Birthdate => &mut self.birthdate,
        };
        *slot = Some(value.into());
    }

    /// Whether the attribute holds something other than whitespace.
    pub fn is_filled(&self, attr: ProfileAttribute) -> bool {
        self.get(attr).is_some_and(|v| !v.trim().is_empty())
    }
}

/// Email and password as typed on step 1.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Wire body for login and registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsPayload {
    pub email: String,
    pub password: String,
}

impl From<&Credentials> for CredentialsPayload {
    fn from(c: &Credentials) -> Self {
        Self {
            email: c.email.clone(),
            password: c.password.expose_secret().to_string(),
        }
    }
}

/// A user being onboarded: credentials plus the profile gathered so far.
#[derive(Debug)]
pub struct UserRecord {
    pub credentials: Credentials,
    pub profile: ProfileFields,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            credentials: Credentials::new("", ""),
            profile: ProfileFields::default(),
        }
    }
}

impl UserRecord {
    pub fn email(&self) -> &str {
        &self.credentials.email
    }

    pub fn password(&self) -> &str {
        self.credentials.password.expose_secret()
    }
}

/// Where a user stands, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current_step: u8,
    #[serde(default, rename = "user_data")]
    pub profile: ProfileFields,
}

/// Body of a profile save: the email-scoped record plus the step to resume at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub email: String,
    pub current_step: u8,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

/// Read-only row of the user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub email: String,
    pub current_step: u8,
    #[serde(flatten)]
    pub profile: ProfileFields,
    /// When the account was registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When progress was last saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
