//! Bearer token issuing and validation.
//!
//! Tokens are HS256 JWTs signed with the configured symmetric secret and
//! bound to the configured issuer and audience.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::domain::User;

use super::auth_service::AuthError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username at issue time
    pub name: String,
    /// Role at issue time
    pub role: String,
    pub iss: String,
    pub aud: String,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Signs and verifies bearer tokens.
pub struct TokenCodec {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(settings: JwtSettings) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            settings,
        }
    }

    /// Issue an access token whose subject is `user.id`.
    pub fn issue(&self, user: &User) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.settings.access_token_expiry_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            role: user.role.clone(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AccessToken {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.settings.access_token_expiry_minutes * 60,
        })
    }

    /// Verify signature, issuer, audience and expiry, returning the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Authentication("Token expired".into()),
                ErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::Authentication(format!("Token is missing the '{}' claim", claim))
                }
                _ => AuthError::Authentication("Invalid token".into()),
            })
    }

    /// Extract the user id carried in the subject claim.
    pub fn subject(claims: &Claims) -> Result<i64, AuthError> {
        claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::Authentication("Invalid token subject".into()))
    }
}
