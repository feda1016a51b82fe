use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Verifies signature and expiry, and that the token is an access token.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("not an access token".to_string());
    }

    Ok(claims)
}
