//! Login credentials and one-time codes.

use crate::error::{MonarchError, MonarchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use totp_rs::{Algorithm, Secret, TOTP};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP_SECS: u64 = 30;

/// Email/password pair plus an optional TOTP seed.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub mfa_secret: Option<MfaSecret>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            mfa_secret: None,
        }
    }

    pub fn with_mfa_secret(mut self, secret: MfaSecret) -> Self {
        self.mfa_secret = Some(secret);
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("mfa_secret", &self.mfa_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A normalized base32 TOTP seed.
#[derive(Clone, PartialEq, Eq)]
pub struct MfaSecret(String);

impl MfaSecret {
    /// Normalize a user-supplied seed.
    ///
    /// Whitespace and `-` separators are removed and the result is
    /// upper-cased. Returns `None` for empty input, anything outside the
    /// base32 alphabet, or a seed that does not decode.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if cleaned.is_empty() {
            return None;
        }

        let valid = cleaned
            .chars()
            .all(|c| matches!(c, 'A'..='Z' | '2'..='7' | '='));
        if !valid {
            return None;
        }

        let secret = Self(cleaned);
        let key = secret.decode().ok()?;
        (!key.is_empty()).then_some(secret)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn decode(&self) -> MonarchResult<Vec<u8>> {
        let encoded = self.0.trim_end_matches('=').to_string();
        Secret::Encoded(encoded)
            .to_bytes()
            .map_err(|e| MonarchError::Totp(format!("{e:?}")))
    }

    fn totp(&self) -> MonarchResult<TOTP> {
        let bytes = self.decode()?;
        Ok(TOTP::new_unchecked(
            Algorithm::SHA1,
            TOTP_DIGITS,
            1,
            TOTP_STEP_SECS,
            bytes,
        ))
    }

    /// Code for the given unix timestamp.
    pub fn code_at(&self, unix_secs: u64) -> MonarchResult<String> {
        Ok(self.totp()?.generate(unix_secs))
    }

    /// Code for the current time.
    pub fn current_code(&self) -> MonarchResult<String> {
        self.totp()?
            .generate_current()
            .map_err(|e| MonarchError::Totp(e.to_string()))
    }
}

impl fmt::Debug for MfaSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MfaSecret(<redacted>)")
    }
}

/// Body of `POST /auth/login/`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub supports_mfa: bool,
    pub trusted_device: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp: Option<String>,
}

impl LoginRequest {
    pub fn new(credentials: &Credentials, totp: Option<String>) -> Self {
        Self {
            username: credentials.email.clone(),
            password: credentials.password.clone(),
            supports_mfa: true,
            trusted_device: false,
            totp,
        }
    }
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 SHA1 seed "12345678901234567890"
    const RFC_SEED: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_parse_normalizes_separators_and_case() {
        let secret = MfaSecret::parse(" gezd-gnbv gy3t-qojq ").unwrap();
        assert_eq!(secret.as_str(), "GEZDGNBVGY3TQOJQ");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(MfaSecret::parse("").is_none());
        assert!(MfaSecret::parse(" - ").is_none());
        assert!(MfaSecret::parse("ABC1").is_none());
        assert!(MfaSecret::parse("not base32!").is_none());
    }

    #[test]
    fn test_parse_rejects_undecodable_seed() {
        // Right alphabet, but padding in the middle
        assert!(MfaSecret::parse("AB=CD").is_none());
        assert!(MfaSecret::parse("====").is_none());

        let secret = MfaSecret::parse("jbsw-y3dp").unwrap();
        assert!(secret.current_code().is_ok());
    }

    #[test]
    fn test_rfc6238_codes() {
        let secret = MfaSecret::parse(RFC_SEED).unwrap();
        assert_eq!(secret.code_at(59).unwrap(), "287082");
        assert_eq!(secret.code_at(1_111_111_109).unwrap(), "081804");
    }

    #[test]
    fn test_padding_is_accepted() {
        let secret = MfaSecret::parse("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ====").unwrap();
        assert_eq!(secret.code_at(59).unwrap(), "287082");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("me@example.com", "hunter2")
            .with_mfa_secret(MfaSecret::parse(RFC_SEED).unwrap());
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("me@example.com"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains(RFC_SEED));
    }

    #[test]
    fn test_login_request_omits_missing_totp() {
        let creds = Credentials::new("me@example.com", "pw");
        let body = serde_json::to_value(LoginRequest::new(&creds, None)).unwrap();
        assert_eq!(body["username"], "me@example.com");
        assert_eq!(body["supports_mfa"], true);
        assert_eq!(body["trusted_device"], false);
        assert!(body.get("totp").is_none());
    }
}
