use serde::{Deserialize, Serialize};

use super::{derive_login_method, is_non_empty, AuthError};

/// Verified contents of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub open_id: String,
    pub app_id: String,
    /// Display name; may be empty.
    pub name: String,
}

/// Response of the code-exchange endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Identity payload exactly as the provider sends it.
///
/// Every field is optional and `platforms` may hold non-string junk; nothing
/// past [`Identity::try_from`] sees this shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIdentity {
    #[serde(default)]
    pub open_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub platforms: Vec<serde_json::Value>,
}

/// Validated identity from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Canonical login method derived from the provider's platform tags.
    pub login_method: Option<String>,
}

impl TryFrom<RawIdentity> for Identity {
    type Error = AuthError;

    fn try_from(raw: RawIdentity) -> Result<Self, Self::Error> {
        let open_id = raw
            .open_id
            .filter(|id| is_non_empty(id))
            .ok_or(AuthError::MissingOpenId)?;

        let platforms: Vec<&str> = raw
            .platforms
            .iter()
            .filter_map(serde_json::Value::as_str)
            .collect();

        Ok(Self {
            open_id,
            name: raw.name.filter(|name| is_non_empty(name)),
            email: raw.email,
            login_method: derive_login_method(&platforms, raw.platform.as_deref()),
        })
    }
}
