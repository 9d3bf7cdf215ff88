use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde::deserialize_patch;

/// Role of a local user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Surrogate id assigned by storage.
    pub id: i64,
    /// External identity, unique and immutable.
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

/// Partial user used for insert-or-update.
///
/// Nullable text fields are tri-state: `None` leaves the stored value
/// untouched, `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUser {
    pub open_id: String,
    #[serde(default, deserialize_with = "deserialize_patch")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch")]
    pub login_method: Option<Option<String>>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub last_signed_in: Option<DateTime<Utc>>,
}

impl UpsertUser {
    pub fn new(open_id: impl Into<String>) -> Self {
        Self {
            open_id: open_id.into(),
            ..Self::default()
        }
    }

    /// Refreshes only the activity timestamp.
    pub fn touch(open_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(open_id).with_last_signed_in(at)
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_login_method(mut self, login_method: Option<String>) -> Self {
        self.login_method = Some(login_method);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_last_signed_in(mut self, at: DateTime<Utc>) -> Self {
        self.last_signed_in = Some(at);
        self
    }
}

/// Resolved write for one upsert call.
///
/// Produced by [`plan_upsert`](super::plan_upsert); storage backends only
/// translate it, they make no decisions of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertPlan {
    pub open_id: String,
    pub name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub login_method: Option<Option<String>>,
    /// Role written when the row is created.
    pub insert_role: Role,
    /// Role written when the row already exists; `None` keeps the stored role.
    pub update_role: Option<Role>,
    pub last_signed_in: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

impl UpsertPlan {
    /// Value for the insert branch of a nullable text column.
    pub fn insert_value(field: &Option<Option<String>>) -> Option<&str> {
        field.as_ref().and_then(|v| v.as_deref())
    }
}
