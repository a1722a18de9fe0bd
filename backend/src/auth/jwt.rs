use super::models::{AuthUser, Claims};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Eight days, matching the token lifetime the web app expects.
const TOKEN_TTL_MINUTES: i64 = 60 * 24 * 8;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("JWT decoding error: {0}")]
    Decoding(String),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn generate_token(&self, user: &AuthUser) -> Result<String, JwtError> {
        self.generate_token_with_ttl(user, Duration::minutes(TOKEN_TTL_MINUTES))
    }

    fn generate_token_with_ttl(&self, user: &AuthUser, ttl: Duration) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + ttl;

        let claims = Claims {
            sub: user.email.clone(),
            name: user.name.clone(),
            exp: expiration.timestamp().max(0) as usize,
            iat: now.timestamp() as usize,
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key).map_err(JwtError::Encoding)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        if token.is_empty() {
            return Err(JwtError::InvalidToken);
        }

        if token.split('.').count() != 3 {
            return Err(JwtError::InvalidToken);
        }

        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                log::debug!(
                    "JWT token decoded successfully. User: {}, Exp: {}",
                    token_data.claims.sub,
                    token_data.claims.exp
                );
                Ok(token_data.claims)
            }
            Err(err) => {
                log::warn!("JWT token decode error: {:?}", err);
                match err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        Err(JwtError::TokenExpired)
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken
                    | jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        Err(JwtError::InvalidToken)
                    }
                    _ => Err(JwtError::Decoding(err.to_string())),
                }
            }
        }
    }
}
