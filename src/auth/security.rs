use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User email
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

/// Hash a password using Argon2id with a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Signs and verifies bearer tokens with a shared HMAC secret.
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl TokenManager {
    pub fn new(secret: &str, algorithm: Algorithm, default_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            default_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let algorithm: Algorithm = config.jwt_algorithm.parse().map_err(|_| {
            AppError::ConfigError(format!("Unknown JWT algorithm: {}", config.jwt_algorithm))
        })?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AppError::ConfigError(format!(
                "JWT algorithm {} requires a key pair, only HMAC algorithms are supported",
                config.jwt_algorithm
            )));
        }

        if config.token_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(
                "auth.token_expiry_minutes must be positive".into(),
            ));
        }

        Ok(Self::new(
            &config.jwt_secret,
            algorithm,
            Duration::minutes(config.token_expiry_minutes),
        ))
    }

    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String> {
        let now = Utc::now();
        let expires_at = now + ttl.unwrap_or(self.default_ttl);

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        Ok(token)
    }

    /// `None` for any token that is malformed, forged, signed with another
    /// algorithm or expired.
    pub fn decode(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "rejected bearer token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TokenManager {
        TokenManager::new("test_secret", Algorithm::HS256, Duration::minutes(30))
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("samepassword").unwrap();
        let second = hash_password("samepassword").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("samepassword", &first));
        assert!(verify_password("samepassword", &second));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_token_round_trip() {
        let tokens = manager();
        let token = tokens.issue("a@x.com", None).unwrap();
        let claims = tokens.decode(&token).unwrap();

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = manager();
        let token = tokens.issue("a@x.com", Some(Duration::seconds(-5))).unwrap();
        assert!(tokens.decode(&token).is_none());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = TokenManager::new("other_secret", Algorithm::HS256, Duration::minutes(30));
        let token = other.issue("a@x.com", None).unwrap();
        assert!(manager().decode(&token).is_none());
        assert!(manager().decode("not.a.token").is_none());
    }

    #[test]
    fn test_token_with_other_algorithm_is_rejected() {
        let hs512 = TokenManager::new("test_secret", Algorithm::HS512, Duration::minutes(30));
        let token = hs512.issue("a@x.com", None).unwrap();
        assert!(manager().decode(&token).is_none());
    }

    #[test]
    fn test_from_config_rejects_asymmetric_algorithms() {
        let mut config = crate::Settings::new_for_test().unwrap().auth;
        assert!(TokenManager::from_config(&config).is_ok());

        config.jwt_algorithm = "RS256".into();
        assert!(matches!(
            TokenManager::from_config(&config),
            Err(AppError::ConfigError(_))
        ));

        config.jwt_algorithm = "nonsense".into();
        assert!(TokenManager::from_config(&config).is_err());
    }
}
