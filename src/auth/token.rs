// JWT token generation and validation service

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::{Role, User};

/// Fixed access token lifetime: 24 hours
pub const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user_id
    pub email: String,
    pub role: Role,
    pub iat: i64, // issued at timestamp
    pub exp: i64, // expiration timestamp
    pub jti: Uuid,
}

impl Claims {
    /// Expiry as a timestamp; falls back to the epoch for out-of-range values
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Token service for JWT operations
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a new TokenService with secret key
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(TOKEN_TTL_SECONDS),
        }
    }

    /// Issue an access token for a user, valid for 24 hours from now
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue an access token as if the current time were `now`
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat,
            exp: iat + self.ttl.num_seconds(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify signature and expiry against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature and expiry against `now`
    ///
    /// Every failure (malformed, bad signature, expired) is reported as `InvalidToken`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => debug!("Token rejected: bad signature"),
                    kind => debug!("Token rejected: malformed ({:?})", kind),
                }
                AuthError::InvalidToken
            })?;

        if now.timestamp() >= claims.exp {
            debug!("Token rejected: expired for user_id={}", claims.sub);
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    /// Subject of a valid token, or None if verification fails
    pub fn extract_subject(&self, token: &str) -> Option<Uuid> {
        self.verify(token).ok().map(|claims| claims.sub)
    }
}

#[cfg(test)]
pub(crate) fn test_token_service() -> TokenService {
    TokenService::new("test_secret_key_for_testing_purposes")
}

#[cfg(test)]
pub(crate) fn test_user(email: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: "Test User".to_string(),
        password_hash: "unused".to_string(),
        role,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_token_expiration_is_24_hours() {
        let service = test_token_service();
        let user = test_user("test@example.com", Role::TeamMember);
        let token = service.issue(&user).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn test_token_claims_contain_user_identity() {
        let service = test_token_service();
        let user = test_user("lead@example.com", Role::TechLead);
        let token = service.issue(&user).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::TechLead);
    }

    #[test]
    fn test_token_valid_until_24_hours_elapse() {
        let service = test_token_service();
        let user = test_user("test@example.com", Role::TeamMember);
        let issued = Utc::now();
        let token = service.issue_at(&user, issued).unwrap();

        let almost = issued + Duration::seconds(TOKEN_TTL_SECONDS - 1);
        assert_eq!(service.verify_at(&token, almost).unwrap().sub, user.id);

        let expired = issued + Duration::seconds(TOKEN_TTL_SECONDS);
        assert!(matches!(service.verify_at(&token, expired), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected_by_wall_clock() {
        let service = test_token_service();
        let user = test_user("test@example.com", Role::TeamMember);
        let token = service
            .issue_at(&user, Utc::now() - Duration::hours(25))
            .unwrap();

        assert!(matches!(service.verify(&token), Err(AuthError::InvalidToken)));
        assert_eq!(service.extract_subject(&token), None);
    }

    #[test]
    fn test_tokens_for_same_user_are_distinct() {
        let service = test_token_service();
        let user = test_user("test@example.com", Role::TeamMember);
        let now = Utc::now();

        assert_ne!(service.issue_at(&user, now).unwrap(), service.issue_at(&user, now).unwrap());
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        for token in [
            "",
            "not.a.token",
            "invalid_token_format",
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature",
        ] {
            assert!(matches!(service.verify(token), Err(AuthError::InvalidToken)));
        }
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new("secret1");
        let service2 = TokenService::new("secret2");
        let user = test_user("test@example.com", Role::Admin);

        let token = service1.issue(&user).unwrap();

        assert!(service1.verify(&token).is_ok());
        assert!(matches!(service2.verify(&token), Err(AuthError::InvalidToken)));
        assert_eq!(service2.extract_subject(&token), None);
        assert_eq!(service1.extract_subject(&token), Some(user.id));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = test_token_service();
        let user = test_user("test@example.com", Role::TeamMember);
        let token = service.issue(&user).unwrap();

        let admin = test_user("test@example.com", Role::Admin);
        let forged = service.issue(&admin).unwrap();

        // Splice the admin payload onto the original signature
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(service.verify(&spliced), Err(AuthError::InvalidToken)));
    }

    proptest! {
        #[test]
        fn prop_token_round_trip(
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)",
            offset in 0i64..TOKEN_TTL_SECONDS
        ) {
            let service = test_token_service();
            let user = test_user(&email, Role::TeamMember);
            let issued = Utc::now();
            let token = service.issue_at(&user, issued)?;

            let claims = service.verify_at(&token, issued + Duration::seconds(offset))?;
            prop_assert_eq!(claims.sub, user.id);
            prop_assert_eq!(claims.email, email);
        }

        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_token_service();
            prop_assert!(service.verify(&malformed).is_err());
        }
    }
}
