use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    types::{OrganizationId, UserId},
    utils::password::{hash_password, verify_password},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub org: String, // organization_id
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(
        user_id: UserId,
        organization_id: OrganizationId,
        role: &str,
        expiration_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: user_id.to_string(),
            org: organization_id.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

/// A refresh token as persisted: the secret half is only ever stored hashed.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: String,
    pub user_id: UserId,
    pub secret: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Value handed to the client: `<id>.<secret>`, url-safe base64 encoded.
    pub fn encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}.{}", self.id, self.secret))
    }
}

pub fn create_access_token(
    user_id: UserId,
    organization_id: OrganizationId,
    role: &str,
    secret: &str,
    expiration_hours: u64,
) -> anyhow::Result<(String, Claims)> {
    let claims = Claims::new(user_id, organization_id, role, expiration_hours);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok((token, claims))
}

pub fn verify_access_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let validation = Validation::default();
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

pub fn create_refresh_token(user_id: UserId, expiration_days: u64) -> anyhow::Result<RefreshToken> {
    let secret = Uuid::new_v4().simple().to_string();
    let token_hash = hash_password(&secret)?;

    Ok(RefreshToken {
        id: Uuid::new_v4().to_string(),
        user_id,
        secret,
        token_hash,
        expires_at: Utc::now() + Duration::days(expiration_days as i64),
    })
}

/// Splits an encoded refresh token into `(id, secret)`.
pub fn decode_refresh_token(encoded: &str) -> anyhow::Result<(String, String)> {
    let raw = URL_SAFE_NO_PAD
        .decode(encoded.trim())
        .map_err(|e| anyhow::anyhow!("Malformed refresh token: {}", e))?;
    let raw = String::from_utf8(raw)?;
    let (id, secret) = raw
        .split_once('.')
        .ok_or_else(|| anyhow::anyhow!("Malformed refresh token"))?;
    if id.is_empty() || secret.is_empty() {
        anyhow::bail!("Malformed refresh token");
    }
    Ok((id.to_string(), secret.to_string()))
}

pub fn verify_refresh_token(secret: &str, hash: &str) -> anyhow::Result<bool> {
    verify_password(secret, hash)
}
