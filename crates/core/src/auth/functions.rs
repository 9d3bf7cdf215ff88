use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
        DecodePaddingMode,
    },
    Engine,
};

use super::AuthError;

/// Platform tags in login-method priority order.
const PLATFORM_PRIORITY: &[(&str, &str)] = &[
    ("REGISTERED_PLATFORM_EMAIL", "email"),
    ("REGISTERED_PLATFORM_GOOGLE", "google"),
    ("REGISTERED_PLATFORM_APPLE", "apple"),
    ("REGISTERED_PLATFORM_MICROSOFT", "microsoft"),
    ("REGISTERED_PLATFORM_AZURE", "microsoft"),
    ("REGISTERED_PLATFORM_GITHUB", "github"),
];

/// Standard alphabet that accepts padded and unpadded input alike.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub fn is_non_empty(value: &str) -> bool {
    !value.is_empty()
}

/// Collapses provider platform tags into a single login method label.
///
/// A non-empty `fallback` wins. Otherwise the highest-priority known tag is
/// used, then the first listed tag lower-cased, then `None`.
pub fn derive_login_method(platforms: &[&str], fallback: Option<&str>) -> Option<String> {
    if let Some(fallback) = fallback.filter(|f| is_non_empty(f)) {
        return Some(fallback.to_string());
    }

    PLATFORM_PRIORITY
        .iter()
        .find(|(tag, _)| platforms.contains(tag))
        .map(|(_, label)| label.to_string())
        .or_else(|| platforms.first().map(|first| first.to_lowercase()))
}

/// Decodes the OAuth `state` parameter into the redirect URI it carries.
///
/// Padding is optional.
pub fn decode_state(state: &str) -> Result<String, AuthError> {
    let bytes = LENIENT
        .decode(state.trim())
        .map_err(|_| AuthError::InvalidState)?;
    String::from_utf8(bytes).map_err(|_| AuthError::InvalidState)
}

/// Encodes a redirect URI as an OAuth `state` parameter.
pub fn encode_state(redirect_uri: &str) -> String {
    STANDARD.encode(redirect_uri)
}
