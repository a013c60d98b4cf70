use std::{env, path::PathBuf, str::FromStr};

use anyhow::{Context, anyhow, bail};
use jsonwebtoken::Algorithm;

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5500",
    "http://localhost:5000",
    "http://127.0.0.1:5500",
    "https://loquieroya-cm.web.app",
    "https://loquieroya-cm.firebaseapp.com",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_body_mb: usize,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

/// Token signing settings and the single administrator identity.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub admin_email: String,
    pub admin_password: Option<String>,
    pub admin_password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub max_image_size_mb: u64,
    pub allowed_extensions: Vec<String>,
    pub max_image_width: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./media"),
            max_image_size_mb: 5,
            allowed_extensions: ["jpg", "jpeg", "png", "webp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_image_width: 1200,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests do not
    /// have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "APP_PORT", 3000)?;

        let mut allowed_origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|origin| origin.to_string())
            .collect();
        for origin in split_list(lookup("ALLOWED_ORIGINS")) {
            if !allowed_origins.contains(&origin) {
                allowed_origins.push(origin);
            }
        }

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        let jwt_algorithm = parse_hmac_algorithm(
            lookup("JWT_ALGORITHM").as_deref().unwrap_or("HS256"),
        )?;
        let access_token_expire_minutes = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        if access_token_expire_minutes <= 0 {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }

        let admin_email = lookup("ADMIN_EMAIL").context("ADMIN_EMAIL is not set")?;
        let admin_password = lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty());
        let admin_password_hash = lookup("ADMIN_PASSWORD_HASH").filter(|h| !h.is_empty());
        if admin_password.is_none() && admin_password_hash.is_none() {
            bail!("either ADMIN_PASSWORD or ADMIN_PASSWORD_HASH must be set");
        }

        let defaults = MediaConfig::default();
        let allowed_extensions = match lookup("ALLOWED_IMAGE_EXTENSIONS") {
            Some(raw) => split_list(Some(raw))
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            None => defaults.allowed_extensions,
        };
        let media = MediaConfig {
            root: lookup("MEDIA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.root),
            max_image_size_mb: parse_or(&lookup, "MAX_IMAGE_SIZE_MB", defaults.max_image_size_mb)?,
            allowed_extensions,
            max_image_width: parse_or(&lookup, "MAX_IMAGE_WIDTH", defaults.max_image_width)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins,
            max_body_mb: parse_or(&lookup, "MAX_BODY_MB", 50)?,
            auth: AuthConfig {
                jwt_secret,
                jwt_algorithm,
                access_token_expire_minutes,
                admin_email,
                admin_password,
                admin_password_hash,
            },
            media,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_hmac_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let algorithm = Algorithm::from_str(raw.trim())
        .map_err(|_| anyhow!("JWT_ALGORITHM is not a known algorithm: {raw}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!("JWT_ALGORITHM must be an HMAC algorithm, got {other:?}"),
    }
}
