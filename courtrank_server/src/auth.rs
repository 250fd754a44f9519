//! Access tokens for players and the admin gate.
//!
//! Player tokens are deliberately simple: `{user_id}.{base64(hmac_sha256(user_id, CR_AUTH_SECRET))}`. The server mints
//! them on the admin-gated `/admin/token` endpoint, and every authenticated route extracts the caller's identity from
//! the `cr-auth-token` header via [`AuthenticatedPlayer`]. There is no expiry and no claims payload; revocation is
//! rotating the secret.
//!
//! Admin endpoints are gated by a shared secret in the `cr-admin-secret` header, checked by [`RequireAdmin`].

use std::future::{ready, Ready};

use actix_web::{web, FromRequest, HttpRequest};
use cr_common::Secret;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

type HmacSha256 = Hmac<Sha256>;

pub const AUTH_TOKEN_HEADER: &str = "cr-auth-token";
pub const ADMIN_SECRET_HEADER: &str = "cr-admin-secret";

fn new_mac(key: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length")
}

//----------------------------------------------   TokenIssuer  --------------------------------------------------------

/// Mints and verifies player access tokens against the configured signing secret.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    auth_secret: Secret<String>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { auth_secret: config.auth_secret.clone() }
    }

    fn signature(&self, user_id: &str) -> Vec<u8> {
        let mut mac = new_mac(self.auth_secret.reveal().as_bytes());
        mac.update(user_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    pub fn issue_token(&self, user_id: &str) -> String {
        format!("{user_id}.{}", base64::encode(self.signature(user_id)))
    }

    /// Checks a token and returns the user id it was issued for.
    pub fn check_token(&self, token: &str) -> Result<String, AuthError> {
        // The base64 alphabet never contains '.', so the last dot always separates id from signature
        let (user_id, sig) = token
            .rsplit_once('.')
            .ok_or_else(|| AuthError::PoorlyFormattedToken("expected {user_id}.{signature}".to_string()))?;
        if user_id.is_empty() {
            return Err(AuthError::PoorlyFormattedToken("empty user id".to_string()));
        }
        let sig = base64::decode(sig).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let mut mac = new_mac(self.auth_secret.reveal().as_bytes());
        mac.update(user_id.as_bytes());
        mac.verify_slice(&sig).map_err(|_| AuthError::ValidationError("signature mismatch".to_string()))?;
        Ok(user_id.to_string())
    }
}

//----------------------------------------------   Extractors  ---------------------------------------------------------

/// The identity of the calling player, extracted from the `cr-auth-token` header.
#[derive(Clone, Debug)]
pub struct AuthenticatedPlayer {
    pub user_id: String,
}

impl FromRequest for AuthenticatedPlayer {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedPlayer, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("TokenIssuer is not configured".to_string()))?;
    let token = req
        .headers()
        .get(AUTH_TOKEN_HEADER)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let user_id = issuer.check_token(token)?;
    Ok(AuthenticatedPlayer { user_id })
}

/// Holds the admin shared secret as app data for [`RequireAdmin`].
#[derive(Clone, Debug)]
pub struct AdminGate {
    admin_secret: Secret<String>,
}

impl AdminGate {
    pub fn new(config: &AuthConfig) -> Self {
        Self { admin_secret: config.admin_secret.clone() }
    }

    pub fn check(&self, supplied: &str) -> bool {
        // Compare MACs rather than the raw strings so the comparison is constant time
        let key = self.admin_secret.reveal().as_bytes();
        let mut supplied_tag = new_mac(key);
        supplied_tag.update(supplied.as_bytes());
        let supplied_tag = supplied_tag.finalize().into_bytes();
        let mut mac = new_mac(key);
        mac.update(key);
        mac.verify_slice(&supplied_tag).is_ok()
    }
}

/// Marker extractor for the admin endpoints. Fails with 403 unless the `cr-admin-secret` header matches.
#[derive(Clone, Copy, Debug)]
pub struct RequireAdmin;

impl FromRequest for RequireAdmin {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(require_admin(req))
    }
}

fn require_admin(req: &HttpRequest) -> Result<RequireAdmin, ServerError> {
    let gate = req
        .app_data::<web::Data<AdminGate>>()
        .ok_or_else(|| ServerError::InitializeError("AdminGate is not configured".to_string()))?;
    let supplied = req
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::ForbiddenAdmin)?;
    if gate.check(supplied) {
        Ok(RequireAdmin)
    } else {
        Err(AuthError::ForbiddenAdmin.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            auth_secret: Secret::new("an-extremely-secret-string".to_string()),
            admin_secret: Secret::new("admin-secret".to_string()),
        }
    }

    #[test]
    fn tokens_round_trip() {
        let issuer = TokenIssuer::new(&test_config());
        let token = issuer.issue_token("alice");
        let user_id = issuer.check_token(&token).unwrap();
        assert_eq!(user_id, "alice");
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&test_config());
        let token = issuer.issue_token("alice");
        // Swapping the user id invalidates the signature
        let forged = token.replacen("alice", "bob", 1);
        let err = issuer.check_token(&forged).unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
        // As does mangling the signature
        let err = issuer.check_token("alice.bm90LWEtc2ln").unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&test_config());
        assert!(matches!(issuer.check_token("no-dot-here").unwrap_err(), AuthError::PoorlyFormattedToken(_)));
        assert!(matches!(issuer.check_token(".c2ln").unwrap_err(), AuthError::PoorlyFormattedToken(_)));
        assert!(matches!(issuer.check_token("alice.!!!").unwrap_err(), AuthError::PoorlyFormattedToken(_)));
    }

    #[test]
    fn user_ids_with_dots_still_verify() {
        let issuer = TokenIssuer::new(&test_config());
        let token = issuer.issue_token("alice.b");
        assert_eq!(issuer.check_token(&token).unwrap(), "alice.b");
    }

    #[test]
    fn admin_gate_matches_the_configured_secret() {
        let gate = AdminGate::new(&test_config());
        assert!(gate.check("admin-secret"));
        assert!(!gate.check("not-the-secret"));
        assert!(!gate.check(""));
    }
}
