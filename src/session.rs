use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::Redirect,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::convert::Infallible;
use tracing::warn;

use crate::msg::{self, Msg};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const COOKIE_NAME: &str = "session";
/// Domain separator so the key cannot be reused to sign anything else.
const CONTEXT: &str = "lendery-session";
const MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Payload of the session cookie. The cookie is the only server-side session
/// state; the tokens inside it are re-validated by every downstream call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: String,
}

/// Tamper-evident cookie codec: URL-safe base64 JSON plus a keyed HMAC tag.
/// Not encrypted; the payload is readable but cannot be altered undetected.
#[derive(Clone)]
pub struct SessionCodec {
    secret: String,
}

impl FromRef<AppState> for SessionCodec {
    fn from_ref(state: &AppState) -> Self {
        Self {
            secret: state.config.session_secret.clone(),
        }
    }
}

impl SessionCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(CONTEXT.as_bytes());
        mac.update(b".");
        mac
    }

    pub fn encode(&self, session: &Session) -> String {
        let payload = serde_json::to_vec(session).expect("session serializes to JSON");
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{payload_b64}.{tag}")
    }

    /// Returns `None` on any verification failure. A tampered or
    /// wrong-format cookie is indistinguishable from no cookie at all.
    pub fn decode(&self, token: &str) -> Option<Session> {
        let (payload_b64, tag_b64) = token.split_once('.')?;
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;
        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&tag).ok()?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        serde_json::from_slice(&payload).ok()
    }
}

/// `Set-Cookie` value for a fresh session. HttpOnly and Lax always; the
/// Secure attribute is driven by config so local HTTP development works.
pub fn session_cookie(value: &str, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{COOKIE_NAME}={value}; Path=/; Max-Age={MAX_AGE_SECS}; HttpOnly; SameSite=Lax{secure}")
}

pub fn clear_cookie() -> String {
    format!("{COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

fn cookie_from_parts(parts: &Parts) -> Option<String> {
    let raw = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("session="))
        .map(str::to_string)
}

fn decode_from_parts(parts: &Parts, state: &AppState) -> Option<Session> {
    let raw = cookie_from_parts(parts)?;
    SessionCodec::from_ref(state).decode(&raw)
}

/// Extracts a verified session, redirecting to the login page when the
/// cookie is absent or fails verification. No error ever propagates from a
/// bad cookie.
pub struct SessionUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        decode_from_parts(parts, state)
            .map(SessionUser)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Like [`SessionUser`] but never rejects; pages that render for both
/// anonymous and signed-in visitors use this.
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(decode_from_parts(parts, state)))
    }
}

/// Admin gate on top of [`SessionUser`]: the session email must be on the
/// configured allow-list. Failing the check is a normal outcome, surfaced
/// as a redirect with the `not_admin` status code.
pub struct AdminUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session =
            decode_from_parts(parts, state).ok_or_else(|| Redirect::to("/login"))?;
        if !state.config.is_admin(&session.email) {
            warn!(email = %session.email, "non-admin reached admin route");
            return Err(msg::to_books(Msg::NotAdmin));
        }
        Ok(AdminUser(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        Session {
            access_token: "at-123".into(),
            refresh_token: "rt-456".into(),
            user_id: "6f1e7c1a-0b0e-4f6a-9a3e-2f9b1c1d2e3f".into(),
            email: "reader@example.com".into(),
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let codec = SessionCodec::new("test-secret");
        let session = sample_session();
        let token = codec.encode(&session);
        assert_eq!(codec.decode(&token), Some(session));
    }

    #[test]
    fn encode_is_deterministic() {
        let codec = SessionCodec::new("test-secret");
        let session = sample_session();
        assert_eq!(codec.encode(&session), codec.encode(&session));
    }

    #[test]
    fn decode_rejects_wrong_secret() {
        let token = SessionCodec::new("secret-a").encode(&sample_session());
        assert_eq!(SessionCodec::new("secret-b").decode(&token), None);
    }

    #[test]
    fn decode_rejects_corrupted_tag() {
        let codec = SessionCodec::new("test-secret");
        let mut token = codec.encode(&sample_session());
        let last = token.pop().expect("token is non-empty");
        token.push(if last == 'A' { 'B' } else { 'A' });
        assert_eq!(codec.decode(&token), None);
    }

    #[test]
    fn decode_rejects_tampered_payload() {
        let codec = SessionCodec::new("test-secret");
        let token = codec.encode(&sample_session());
        let (_, tag) = token.split_once('.').expect("token has a tag");
        let forged_payload =
            URL_SAFE_NO_PAD.encode(br#"{"access_token":"x","refresh_token":"x","user_id":"x","email":"admin@example.com"}"#);
        assert_eq!(codec.decode(&format!("{forged_payload}.{tag}")), None);
    }

    #[test]
    fn decode_never_panics_on_garbage() {
        let codec = SessionCodec::new("test-secret");
        for garbage in ["", ".", "..", "not-a-token", "a.b.c", "%%%.%%%"] {
            assert_eq!(codec.decode(garbage), None);
        }
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("abc", false);
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"));
        assert!(session_cookie("abc", true).contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert!(clear_cookie().contains("Max-Age=0"));
    }
}
