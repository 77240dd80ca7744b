use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Tokens are minted by the identity service; tests mint their own.
#[cfg(test)]
pub fn generate_access_token(
    user_id: u64,
    username: String,
    role: u8,
    secret: &str,
    ttl: usize,
) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as usize;
    let claims = Claims {
        user_id,
        sub: username,
        role,
        exp: now + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_token_verifies_with_same_secret() {
        let token = generate_access_token(30, "rector".to_string(), 3, "s3cret", 60);
        let claims = verify_token(&token, "s3cret").expect("valid token");
        assert_eq!(claims.user_id, 30);
        assert_eq!(claims.role, 3);
        assert_eq!(claims.sub, "rector");
    }

    #[test]
    fn token_signed_elsewhere_is_rejected() {
        let token = generate_access_token(30, "rector".to_string(), 3, "s3cret", 60);
        assert!(verify_token(&token, "other").is_err());
    }
}
