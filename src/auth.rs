use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;

/// Role
///
/// Coarse authorization tag carried in the session token's `role` claim.
/// Any other claim value is treated as "no role".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parses the exact claim spelling. Case matters: `admin` is not a role.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

/// TokenClaims
///
/// The fields the gateway reads from a token payload. Every field is optional and
/// read independently: a field with an unexpected type is dropped on its own
/// without affecting the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenClaims {
    /// `role`: only `ADMIN` and `USER` survive parsing.
    pub role: Option<Role>,
    /// `sub`: usually the user's login name or email.
    pub subject: Option<String>,
    /// `name`: display name, when the issuer includes one.
    pub name: Option<String>,
    /// `userId`: the account id, when it is a well-formed UUID.
    pub user_id: Option<Uuid>,
    /// `exp`: expiry in seconds since the epoch. Informational only.
    pub expires_at: Option<i64>,
}

impl TokenClaims {
    fn from_object(payload: &Map<String, Value>) -> Self {
        Self {
            role: payload.get("role").and_then(Value::as_str).and_then(Role::parse),
            subject: payload.get("sub").and_then(Value::as_str).map(str::to_string),
            name: payload
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            user_id: payload
                .get("userId")
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok()),
            expires_at: payload
                .get("exp")
                .and_then(|exp| exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))),
        }
    }
}

// Standard alphabet after the url-safe characters have been translated. Lenient about
// trailing bits and padding, matching what browsers accept for the same input.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// decode_segment
///
/// Base64url-decodes one token segment: `-` becomes `+`, `_` becomes `/`, and the
/// result is padded with `=` to a multiple of four before decoding.
pub fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let mut translated: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    while translated.len() % 4 != 0 {
        translated.push('=');
    }

    PAYLOAD_ENGINE.decode(translated.as_bytes()).ok()
}

/// decode_unverified
///
/// Reads the claims of a compact token WITHOUT checking its signature.
///
/// Returns `None` when the token has fewer than two segments, when the second
/// segment is not base64url, or when it does not decode to a JSON object.
/// The result may only drive UI redirection. Privileged operations must be
/// authorized wherever they are executed.
pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;

    let bytes = decode_segment(payload)?;
    let object: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;

    Some(TokenClaims::from_object(&object))
}

/// decode_verified
///
/// Reads the claims of an HS256 token after verifying its signature with `key`.
/// An `exp` claim, when present, must not have passed. No claim is mandatory.
pub fn decode_verified(token: &str, key: &DecodingKey) -> Option<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = true;

    match decode::<Map<String, Value>>(token, key, &validation) {
        Ok(data) => Some(TokenClaims::from_object(&data.claims)),
        Err(e) => {
            tracing::debug!(error = %e, "session token failed signature verification");
            None
        }
    }
}

/// extract_cookie
///
/// Finds the first non-empty value for `name` across all `Cookie` headers.
/// Surrounding double quotes are stripped.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
        })
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Session
///
/// What the gateway knows about the caller for one request: whether a token was
/// presented at all, and which claims could be read from it. A present token with
/// unreadable claims is still "present"; routing treats it as having no role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token_present: bool,
    pub claims: Option<TokenClaims>,
}

impl Session {
    /// A caller that presented no token.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<Role> {
        self.claims.as_ref().and_then(|claims| claims.role)
    }
}

/// TokenDecoder
///
/// Turns request headers into a `Session`. Built once from `AppConfig` and shared
/// through the application state.
#[derive(Clone)]
pub struct TokenDecoder {
    cookie_name: String,
    verification_key: Option<DecodingKey>,
}

impl TokenDecoder {
    /// A decoder that trusts the role claim as-is.
    pub fn unverified(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            verification_key: None,
        }
    }

    /// A decoder that only trusts claims carrying a valid HS256 signature.
    pub fn verified(cookie_name: impl Into<String>, secret: &str) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            verification_key: Some(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match (&config.jwt_secret, config.verify_signature) {
            (Some(secret), true) => Self::verified(&config.session_cookie, secret),
            _ => Self::unverified(&config.session_cookie),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn is_verifying(&self) -> bool {
        self.verification_key.is_some()
    }

    pub fn claims(&self, token: &str) -> Option<TokenClaims> {
        match &self.verification_key {
            Some(key) => decode_verified(token, key),
            None => decode_unverified(token),
        }
    }

    /// Never fails: a missing cookie is an anonymous session and an unreadable
    /// token is a session without claims.
    pub fn session(&self, headers: &HeaderMap) -> Session {
        match extract_cookie(headers, &self.cookie_name) {
            Some(token) => Session {
                token_present: true,
                claims: self.claims(&token),
            },
            None => Session::anonymous(),
        }
    }
}

/// Session Extractor
///
/// Handlers behind the route guard receive the `Session` the guard already decoded
/// (stored in the request extensions). Outside the guard the cookie is decoded on
/// the spot with the shared `TokenDecoder`. Extraction never rejects.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    TokenDecoder: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let decoder = TokenDecoder::from_ref(state);
        Ok(decoder.session(&parts.headers))
    }
}
