//! `Authorization` header parsing: `<Scheme> <credential>`.

use identity_core::{IdentityError, IdentityResult};

/// Credential schemes accepted by the service.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CredentialScheme {
    Bearer,
    ApiKey,
}

impl CredentialScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialScheme::Bearer => "Bearer",
            CredentialScheme::ApiKey => "ApiKey",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Bearer" => Some(CredentialScheme::Bearer),
            "ApiKey" => Some(CredentialScheme::ApiKey),
            _ => None,
        }
    }
}

/// A credential split into scheme and value, not yet verified.
#[derive(Clone, PartialEq, Eq)]
pub struct RawCredential<'a> {
    pub scheme: CredentialScheme,
    pub value: &'a str,
}

impl core::fmt::Debug for RawCredential<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawCredential")
            .field("scheme", &self.scheme)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Split a raw header value into scheme and credential.
///
/// - absent or empty header: `MissingCredential`
/// - not exactly two space-separated components, an empty component, or an
///   unknown scheme: `MalformedCredential`
pub fn parse_authorization(header: Option<&str>) -> IdentityResult<RawCredential<'_>> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(IdentityError::MissingCredential),
    };

    let mut parts = header.split(' ');
    let (Some(scheme), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(IdentityError::MalformedCredential);
    };

    if value.is_empty() {
        return Err(IdentityError::MalformedCredential);
    }

    let scheme = CredentialScheme::parse(scheme).ok_or(IdentityError::MalformedCredential)?;
    Ok(RawCredential { scheme, value })
}
