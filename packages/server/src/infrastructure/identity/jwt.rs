//! JWT-backed Identity Verifier.
//!
//! Validates HS256 tokens issued by the account service. Claims carry the
//! user id under `id`, an optional `email`, and the mandatory `exp`.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::domain::{Credential, Identity, IdentityVerifier, UserId, VerifyError};

/// JWT claims of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id)
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        // HS256 only; tokens signed with any other algorithm are rejected
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &Credential) -> Result<Identity, VerifyError> {
        let data = decode::<TokenClaims>(credential.expose(), &self.decoding_key, &self.validation)
            .map_err(|e| VerifyError::InvalidCredential(e.to_string()))?;

        let user_id = UserId::new(data.claims.id)
            .map_err(|e| VerifyError::InvalidCredential(e.to_string()))?;
        Ok(Identity::new(user_id, data.claims.email))
    }
}
