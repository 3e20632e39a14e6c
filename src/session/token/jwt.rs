use anyhow::{ensure, Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::now::current_timestamp;

use super::{TokenClaims, TokenGenerator, TokenValidator};

/// Why a token was refused. Every variant leaves the caller anonymous.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("bad signature, issuer or encoding: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),

    #[error("token carries no {0}")]
    NoIdentity(&'static str),

    #[error("token expired at {0}")]
    Expired(u64),

    #[error("token is not valid before {0}")]
    NotYetValid(u64),
}

/// Payload of a session token. `sub` is the user id, `email` and `role` are written
/// by the sign-in provider. `iat` and `nbf` are optional on the way in.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iss: String,
    exp: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<u64>,

    #[serde(default)]
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

/// Issues signed session tokens. The server only verifies tokens, this side exists
/// for tests and for tooling that mints tokens against the same key.
pub struct JwtTokenGenerator {
    algorithm: Algorithm,
    key: EncodingKey,
    issuer: String,
    ttl_secs: u64,
}

impl JwtTokenGenerator {
    pub fn new_hs256(secret: &[u8], issuer: &str, ttl_secs: u64) -> Result<Self> {
        ensure!(!secret.is_empty(), "jwt signing secret is empty");
        Ok(Self {
            algorithm: Algorithm::HS256,
            key: EncodingKey::from_secret(secret),
            issuer: issuer.to_string(),
            ttl_secs,
        })
    }

    /// `private_key` is a PEM encoded RSA key.
    pub fn new_rs256(private_key: &[u8], issuer: &str, ttl_secs: u64) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(private_key).context("parse jwt signing key")?;
        Ok(Self {
            algorithm: Algorithm::RS256,
            key,
            issuer: issuer.to_string(),
            ttl_secs,
        })
    }
}

impl TokenGenerator for JwtTokenGenerator {
    fn generate_token(&self, claims: &TokenClaims) -> Result<String> {
        if claims.user_id.is_empty() {
            return Err(TokenError::NoIdentity("user id").into());
        }
        if claims.email.is_empty() {
            return Err(TokenError::NoIdentity("email").into());
        }

        let issued_at = current_timestamp();
        let payload = SessionClaims {
            sub: claims.user_id.clone(),
            iss: self.issuer.clone(),
            exp: issued_at + self.ttl_secs,
            iat: Some(issued_at),
            nbf: Some(issued_at),
            email: claims.email.clone(),
            role: claims.role.clone(),
        };
        let token = encode(&Header::new(self.algorithm), &payload, &self.key)
            .map_err(TokenError::from)?;
        Ok(token)
    }
}

/// Verifies session tokens: signature, algorithm, issuer, validity window and the
/// presence of a user id and email.
pub struct JwtTokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenValidator {
    pub fn new_hs256(secret: &[u8], issuer: &str) -> Result<Self> {
        ensure!(!secret.is_empty(), "jwt verification secret is empty");
        Ok(Self::with_key(
            DecodingKey::from_secret(secret),
            Algorithm::HS256,
            issuer,
        ))
    }

    /// `public_key` is a PEM encoded RSA key.
    pub fn new_rs256(public_key: &[u8], issuer: &str) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(public_key).context("parse jwt verification key")?;
        Ok(Self::with_key(key, Algorithm::RS256, issuer))
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm, issuer: &str) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // The validity window is checked against our own clock below.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        Self { key, validation }
    }

    fn check(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let payload = decode::<SessionClaims>(token, &self.key, &self.validation)?.claims;

        let now = current_timestamp();
        if now >= payload.exp {
            return Err(TokenError::Expired(payload.exp));
        }
        if let Some(nbf) = payload.nbf.filter(|nbf| now < *nbf) {
            return Err(TokenError::NotYetValid(nbf));
        }

        if payload.sub.is_empty() {
            return Err(TokenError::NoIdentity("subject"));
        }
        if payload.email.is_empty() {
            return Err(TokenError::NoIdentity("email"));
        }

        Ok(TokenClaims {
            user_id: payload.sub,
            email: payload.email,
            role: payload.role,
        })
    }
}

impl TokenValidator for JwtTokenValidator {
    fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        Ok(self.check(token)?)
    }
}
