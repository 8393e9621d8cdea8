use std::path::PathBuf;

use anyhow::{bail, Context, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_force_path_style: bool,
    pub presign_expires_secs: u64,

    pub bind_addr: String,
    pub data_path: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let s3_endpoint = get("S3_ENDPOINT")?;
        let s3_region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_bucket = get("S3_BUCKET")?;
        let s3_access_key = get("S3_ACCESS_KEY")?;
        let s3_secret_key = get("S3_SECRET_KEY")?;
        let s3_force_path_style = std::env::var("S3_FORCE_PATH_STYLE")
            .ok()
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(true);
        let presign_expires_secs = parse_or("PRESIGN_EXPIRES_SECS", 300)?;

        let bind_addr = std::env::var("VALIDATIO_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let data_path = std::env::var("VALIDATIO_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("validatio_store.json"));
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", 64 * 1024 * 1024)?;

        // fail fast, fail loud
        if !s3_endpoint.starts_with("http://") && !s3_endpoint.starts_with("https://") {
            bail!("S3_ENDPOINT must start with http:// or https://");
        }
        if presign_expires_secs == 0 || presign_expires_secs > 604_800 {
            bail!("PRESIGN_EXPIRES_SECS must be between 1 and 604800");
        }

        Ok(Self {
            s3_endpoint,
            s3_region,
            s3_bucket,
            s3_access_key,
            s3_secret_key,
            s3_force_path_style,
            presign_expires_secs,
            bind_addr,
            data_path,
            max_upload_bytes,
        })
    }
}

fn get(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Missing required env var: {key}"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}
