use anyhow::{Context, Result};
use chrono::FixedOffset;

use crate::submission::{UploadLimits, DEFAULT_CV_MAX_BYTES, DEFAULT_PHOTO_MAX_BYTES};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Base URL under which uploaded objects are publicly readable.
    pub storage_public_url: String,
    pub auth_url: String,
    pub auth_anon_key: String,
    /// Built frontend bundle served for every non-API path.
    pub static_dir: String,
    pub upload_limits: UploadLimits,
    /// Offset of the applicants' local time; "today" for age checks is taken here.
    pub local_offset: FixedOffset,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            s3_bucket: env_or("S3_BUCKET", "applicant-documents"),
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: env_or("S3_REGION", "us-east-1"),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            storage_public_url: require_env("STORAGE_PUBLIC_URL")?,
            auth_url: require_env("AUTH_URL")?,
            auth_anon_key: require_env("AUTH_ANON_KEY")?,
            static_dir: env_or("STATIC_DIR", "frontend/dist"),
            upload_limits: UploadLimits {
                photo_max_bytes: parse_env("PHOTO_MAX_BYTES", DEFAULT_PHOTO_MAX_BYTES)?,
                cv_max_bytes: parse_env("CV_MAX_BYTES", DEFAULT_CV_MAX_BYTES)?,
            },
            local_offset: utc_offset(parse_env(
                "LOCAL_UTC_OFFSET_HOURS",
                DEFAULT_UTC_OFFSET_HOURS,
            )?)?,
            port: parse_env("PORT", 3000)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

/// Western Indonesia Time (WIB).
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

fn utc_offset(hours: i32) -> Result<FixedOffset> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("LOCAL_UTC_OFFSET_HOURS={hours} is not a valid UTC offset"))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        assert_eq!(parse_env("INTAKE_TEST_UNSET_LIMIT", 42usize).unwrap(), 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("INTAKE_TEST_BAD_PORT", "eighty");
        let err = parse_env::<u16>("INTAKE_TEST_BAD_PORT", 3000).unwrap_err();
        assert!(err.to_string().contains("INTAKE_TEST_BAD_PORT"));
    }

    #[test]
    fn test_utc_offset_accepts_wib_and_rejects_out_of_range() {
        assert_eq!(utc_offset(7).unwrap().local_minus_utc(), 7 * 3600);
        assert_eq!(utc_offset(-3).unwrap().local_minus_utc(), -3 * 3600);
        assert!(utc_offset(30).is_err());
    }
}
