use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Verifies an HS256 token signed with the provider's shared secret.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::coach::StaffRole;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn token(secret: &str, exp_offset: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        // Provider tokens carry extra claims such as the email.
        let claims = json!({
            "sub": "3f1c2a9e-5b7d-4e0a-9c61-2d8f4b7a1e33",
            "email": "maya@academy.test",
            "role": "head_coach",
            "exp": now + exp_offset,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_token_signed_with_shared_secret() {
        let claims = verify_token(&token("s3cret", 600), "s3cret").unwrap();
        assert_eq!(claims.role, StaffRole::HeadCoach);
        assert_eq!(claims.sub, "3f1c2a9e-5b7d-4e0a-9c61-2d8f4b7a1e33");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        assert!(verify_token(&token("s3cret", 600), "other").is_err());
        assert!(verify_token(&token("s3cret", -3600), "s3cret").is_err());
    }
}
