//! Credential issuance (spec.md §1/§6, SPEC_FULL.md §4.7): registration,
//! login, and JWT issuance/verification (`argon2` password hashing,
//! `jsonwebtoken` HS256 claims), with a `role` claim and a revocation
//! check against `token_blacklist` on every verify.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::auth::blacklist::TokenBlacklist;
use crate::auth::error::AuthError;
use crate::auth::model::{Claims, Role};

pub struct RegisterRequest {
    pub role: Role,
    pub actor_id: i64,
    pub username: String,
    pub password: String,
}

pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub struct AuthService {
    pool: PgPool,
    blacklist: Arc<dyn TokenBlacklist>,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(pool: PgPool, blacklist: Arc<dyn TokenBlacklist>, jwt_secret: String) -> Self {
        Self {
            pool,
            blacklist,
            jwt_secret,
            token_ttl: Duration::hours(24),
        }
    }

    /// Registration is deliberately thin: it creates a login credential
    /// bound to an `actor_id` that already exists in the role's own table
    /// (`users`/`shops`/`riders`). Onboarding those rows themselves is a
    /// Non-goal (spec.md §1).
    pub async fn register(&self, req: RegisterRequest) -> Result<i64, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| AuthError::Storage(format!("password hash failed: {e}")))?
            .to_string();

        let row = sqlx::query(
            "INSERT INTO accounts (role, actor_id, username, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(req.role.as_str())
        .bind(req.actor_id)
        .bind(&req.username)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateAccount;
                }
            }
            AuthError::from(err)
        })?;

        Ok(row.try_get("id")?)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<String, AuthError> {
        let row = sqlx::query(
            "SELECT actor_id, role, password_hash FROM accounts WHERE username = $1",
        )
        .bind(&req.username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let password_hash: String = row.try_get("password_hash")?;
        let parsed = PasswordHash::new(&password_hash)
            .map_err(|_| AuthError::Storage("corrupt password hash".into()))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let actor_id: i64 = row.try_get("actor_id")?;
        let role_str: String = row.try_get("role")?;
        let role = Role::from_str(&role_str).ok_or_else(|| AuthError::Storage("unknown role".into()))?;

        self.issue_token(actor_id, role)
    }

    pub fn issue_token(&self, actor_id: i64, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor_id,
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.token_ttl).timestamp() as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Storage(format!("token encode failed: {e}")))
    }

    /// Verify signature, expiry, and revocation (in that order — revocation
    /// is checked last since it requires a store round trip).
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        if self.blacklist.is_revoked(&data.claims.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }

    /// Logout: revoke the token's `jti` until its natural expiry.
    pub async fn revoke(&self, claims: &Claims) -> Result<(), AuthError> {
        let expires_at = chrono::DateTime::from_timestamp(claims.exp as i64, 0)
            .unwrap_or_else(Utc::now);
        self.blacklist.revoke(&claims.jti, expires_at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::blacklist::FakeTokenBlacklist;

    fn service() -> (AuthService, Arc<FakeTokenBlacklist>) {
        // These tests exercise only the pool-free token paths (issue/verify/
        // revoke); `register`/`login` need a live Postgres and are covered
        // by the scheduled integration suite instead.
        let blacklist = Arc::new(FakeTokenBlacklist::new());
        let pool = PgPool::connect_lazy("postgres://unused/unused").expect("lazy pool");
        (
            AuthService::new(pool, blacklist.clone(), "test-secret".to_string()),
            blacklist,
        )
    }

    #[tokio::test]
    async fn issued_token_round_trips() {
        let (svc, _) = service();
        let token = svc.issue_token(42, Role::Rider).unwrap();
        let claims = svc.verify(&token).await.unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Rider);
    }

    #[tokio::test]
    async fn revoked_token_fails_verification() {
        let (svc, _) = service();
        let token = svc.issue_token(7, Role::User).unwrap();
        let claims = svc.verify(&token).await.unwrap();
        svc.revoke(&claims).await.unwrap();
        assert!(svc.verify(&token).await.is_err());
    }
}
