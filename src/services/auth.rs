// src/services/auth.rs

use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{common::error::AppError, models::auth::Claims};

/// Valida os tokens emitidos pela camada de identidade. Não emite tokens.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Token rejeitado: {}", e);
            AppError::InvalidToken
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    fn token(secret: &str, user: Uuid, expires_in: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user,
            iat: now.timestamp() as usize,
            exp: (now + expires_in).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[test]
    fn valid_token_yields_the_user() {
        let user = Uuid::new_v4();
        let service = AuthService::new("segredo".into());

        let claims = service.validate_token(&token("segredo", user, Duration::hours(1))).unwrap();
        assert_eq!(claims.sub, user);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let service = AuthService::new("segredo".into());
        let result = service.validate_token(&token("outro", Uuid::new_v4(), Duration::hours(1)));
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = AuthService::new("segredo".into());
        let result = service.validate_token(&token("segredo", Uuid::new_v4(), Duration::hours(-2)));
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let service = AuthService::new("segredo".into());
        assert!(matches!(service.validate_token("não-é-jwt"), Err(AppError::InvalidToken)));
    }
}
