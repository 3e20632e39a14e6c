use anyhow::{bail, Result};

use super::{TokenClaims, TokenGenerator, TokenValidator};

/// Unsigned token for tests: `simple-token:<email>:<role>`, the role part may be
/// empty.
#[derive(Debug, Clone)]
pub struct SimpleToken;

impl SimpleToken {
    pub fn new() -> Self {
        Self
    }
}

impl TokenGenerator for SimpleToken {
    fn generate_token(&self, claims: &TokenClaims) -> Result<String> {
        if claims.email.is_empty() {
            bail!("empty user");
        }
        let role = claims.role.as_deref().unwrap_or_default();
        Ok(format!("simple-token:{}:{role}", claims.email))
    }
}

impl TokenValidator for SimpleToken {
    fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        let rest = match token.strip_prefix("simple-token:") {
            Some(rest) => rest,
            None => bail!("invalid simple token"),
        };
        let (email, role) = match rest.split_once(':') {
            Some(parts) => parts,
            None => bail!("invalid simple token"),
        };
        if email.is_empty() {
            bail!("invalid simple token: empty email");
        }

        Ok(TokenClaims {
            user_id: format!("id-{email}"),
            email: email.to_string(),
            role: if role.is_empty() {
                None
            } else {
                Some(role.to_string())
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::session::token::tests::run_token_tests;

    use super::*;

    #[test]
    fn test_simple() {
        let token = SimpleToken::new();
        run_token_tests(&token, &token);
    }
}
