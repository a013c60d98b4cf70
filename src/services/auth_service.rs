use std::fmt;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;

use crate::{
    config::AuthConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, UserInfo},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

pub const ADMIN_ROLE: &str = "admin";

enum PasswordCheck {
    Hash(String),
    Plain(String),
    Missing,
}

/// Authenticates the single administrator and issues/verifies bearer tokens.
///
/// Built once at startup from [`AuthConfig`] and shared read-only.
pub struct AccessGate {
    admin_email: String,
    password: PasswordCheck,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expire_minutes: i64,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("admin_email", &self.admin_email)
            .field("algorithm", &self.algorithm)
            .field("expire_minutes", &self.expire_minutes)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    /// A precomputed hash wins over a plaintext password. A plaintext password
    /// is hashed here; if hashing fails the gate keeps comparing plaintext.
    pub fn new(config: &AuthConfig) -> Self {
        let password = match (&config.admin_password_hash, &config.admin_password) {
            (Some(hash), _) => PasswordCheck::Hash(hash.clone()),
            (None, Some(plain)) => match hash_password(plain) {
                Ok(hash) => {
                    tracing::info!("admin password hashed with argon2");
                    PasswordCheck::Hash(hash)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "could not hash admin password, using plain comparison");
                    PasswordCheck::Plain(plain.clone())
                }
            },
            (None, None) => {
                tracing::warn!("no admin password configured, logins will be rejected");
                PasswordCheck::Missing
            }
        };

        Self {
            admin_email: config.admin_email.clone(),
            password,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            algorithm: config.jwt_algorithm,
            expire_minutes: config.access_token_expire_minutes,
        }
    }

    pub fn expire_minutes(&self) -> i64 {
        self.expire_minutes
    }

    pub fn login(&self, payload: LoginRequest) -> AppResult<LoginResponse> {
        let LoginRequest { email, password } = payload;

        let valid = email == self.admin_email
            && match &self.password {
                PasswordCheck::Hash(hash) => verify_password(&password, hash),
                PasswordCheck::Plain(plain) => &password == plain,
                PasswordCheck::Missing => false,
            };
        if !valid {
            tracing::info!(email = %email, "rejected login");
            return Err(AppError::Unauthorized("Incorrect email or password".into()));
        }

        let access_token = self.issue_token(&self.admin_email, ADMIN_ROLE)?;
        tracing::info!(email = %email, "admin logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: UserInfo {
                email,
                role: ADMIN_ROLE.to_string(),
            },
        })
    }

    /// Sign a token for `email` with `role`, expiring after the configured
    /// number of minutes.
    pub fn issue_token(&self, email: &str, role: &str) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::minutes(self.expire_minutes))
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Verify signature, expiry and subject of a bearer token.
    pub fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::unauthorized())?;
        if decoded.claims.sub != self.admin_email {
            return Err(AppError::unauthorized());
        }

        Ok(AuthUser {
            email: decoded.claims.sub,
            role: decoded.claims.role,
        })
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored admin password hash is not a valid PHC string");
            false
        }
    }
}
