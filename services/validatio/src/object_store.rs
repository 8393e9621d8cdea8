use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::config::AppConfig;

pub const OCTET_STREAM: &str = "application/octet-stream";

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;

    /// URL a client can `PUT` the object to without credentials. The upload
    /// must send the same `Content-Type`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires: Duration,
    ) -> anyhow::Result<String>;

    fn bucket(&self) -> &str;
}

/// S3-compatible bucket (MinIO, Selectel, AWS).
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let credentials = Credentials::new(
            cfg.s3_access_key.clone(),
            cfg.s3_secret_key.clone(),
            None,
            None,
            "validatio-env",
        );
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(cfg.s3_region.clone()))
            .endpoint_url(&cfg.s3_endpoint)
            .credentials_provider(credentials)
            .force_path_style(cfg.s3_force_path_style)
            .build();
        Self {
            client: Client::from_conf(conf),
            bucket: cfg.s3_bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| anyhow!("S3 PUT {key} failed: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires: Duration,
    ) -> anyhow::Result<String> {
        let presigning = PresigningConfig::expires_in(expires).context("Invalid presign expiry")?;
        let req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| anyhow!("presign {key} failed: {}", DisplayErrorContext(&e)))?;
        Ok(req.uri().to_string())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
