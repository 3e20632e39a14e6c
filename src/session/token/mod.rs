pub mod config;
pub mod jwt;

#[cfg(test)]
pub mod simple;

use anyhow::Result;

/// What a verified token says about its holder. The role claim is kept raw, it is
/// normalized by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub role: Option<String>,
}

pub trait TokenGenerator {
    fn generate_token(&self, claims: &TokenClaims) -> Result<String>;
}

pub trait TokenValidator {
    fn validate_token(&self, token: &str) -> Result<TokenClaims>;
}
