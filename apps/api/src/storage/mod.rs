//! Object storage capability: upload bytes under a key and hand out a durable
//! public URL for them.

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<()>;

    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// S3-compatible bucket storage. Public URLs are built from a configured
/// base, e.g. `https://<project>.supabase.co/storage/v1/object/public`.
#[derive(Clone)]
pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    public_base_url: String,
}

impl S3ObjectStorage {
    pub fn new(client: aws_sdk_s3::Client, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<()> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .set_content_type(content_type.map(str::to_string))
            .cache_control("max-age=3600")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded {size} bytes to s3://{bucket}/{key}");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        public_object_url(&self.public_base_url, bucket, key)
    }
}

fn public_object_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
}

/// Object key of the form `<folder>/<unix millis>-<unique>-<file name>`.
/// The file name is reduced to URL-safe characters. Pass a fresh `unique` per
/// upload so one applicant's file never replaces another's.
pub fn object_key(folder: &str, file_name: &str, timestamp_millis: i64, unique: Uuid) -> String {
    let base_name = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    let safe: String = base_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.is_empty() { "file".to_string() } else { safe };
    format!("{folder}/{timestamp_millis}-{}-{safe}", unique.simple())
}
