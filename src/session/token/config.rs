use std::fs;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};

use super::jwt::JwtTokenValidator;

/// Session token configuration. Tokens are issued by the sign-in provider, only their
/// verification happens here.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenConfig {
    /// Signature algorithm of the provider's tokens.
    /// Default: hs256
    #[serde(default = "TokenConfig::default_algorithm")]
    pub algorithm: TokenAlgorithm,

    /// Shared secret for hs256, supports env expansion such as `${SESSION_SECRET}`.
    /// Required for hs256.
    #[serde(default)]
    pub secret: String,

    /// Path to the provider's RSA public key (PEM format). Required for rs256.
    #[serde(default)]
    pub public_key_path: String,

    /// Expected `iss` claim.
    /// Default: "rolegate"
    #[serde(default = "TokenConfig::default_issuer")]
    pub issuer: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenAlgorithm {
    #[serde(rename = "hs256")]
    Hs256,
    #[serde(rename = "rs256")]
    Rs256,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            algorithm: Self::default_algorithm(),
            secret: String::new(),
            public_key_path: String::new(),
            issuer: Self::default_issuer(),
        }
    }
}

impl CommonConfig for TokenConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.issuer.is_empty() {
            bail!("issuer is required");
        }

        match self.algorithm {
            TokenAlgorithm::Hs256 => {
                self.secret = expandenv("secret", &self.secret)?;
                if self.secret.is_empty() {
                    bail!("secret is required for hs256 tokens");
                }
            }
            TokenAlgorithm::Rs256 => {
                self.public_key_path = expandenv("public_key_path", &self.public_key_path)?;
                if self.public_key_path.is_empty() {
                    let path = ps.config_path.join("token_public.pem");
                    self.public_key_path = format!("{}", path.display());
                }
            }
        }

        Ok(())
    }
}

impl TokenConfig {
    pub fn build_validator(&self) -> Result<JwtTokenValidator> {
        match self.algorithm {
            TokenAlgorithm::Hs256 => JwtTokenValidator::new_hs256(self.secret.as_bytes(), &self.issuer),
            TokenAlgorithm::Rs256 => {
                let public_key = fs::read(&self.public_key_path).with_context(|| {
                    format!("read token public key: {}", self.public_key_path)
                })?;
                JwtTokenValidator::new_rs256(&public_key, &self.issuer)
            }
        }
    }

    pub fn default_algorithm() -> TokenAlgorithm {
        TokenAlgorithm::Hs256
    }

    pub fn default_issuer() -> String {
        String::from("rolegate")
    }
}
