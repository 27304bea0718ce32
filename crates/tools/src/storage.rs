//! Object-storage upload/download adapters.
//!
//! Bucket resolution fallback chain, in order: explicit argument →
//! configured default (`DECKHAND_OUTPUT_BUCKET` or `storage.output_bucket`)
//! → scan of available buckets for the configured name prefix → error
//! result. Resolution failures, missing files, and storage errors all come
//! back as textual results.

use std::path::{Path, PathBuf};

use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use deckhand_core::config::StorageConfig;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::tool::{Tool, ToolParameter, ToolResult};

/// Logical folder uploaded objects land under when no key is supplied.
const OUTPUT_FOLDER: &str = "presentations";

/// Build the storage client from the ambient credential chain plus the
/// configured region hint.
async fn build_client(config: &StorageConfig) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = config.resolved_region() {
        loader = loader.region(aws_config::Region::new(region));
    }
    Client::new(&loader.load().await)
}

/// First two steps of the bucket chain: explicit argument, then the
/// configured default.
fn bucket_hint(explicit: Option<&str>, config: &StorageConfig) -> Option<String> {
    explicit
        .filter(|b| !b.is_empty())
        .map(String::from)
        .or_else(|| config.resolved_bucket())
}

/// Full bucket resolution, falling back to a prefix scan of available
/// buckets as the last step.
async fn resolve_bucket(
    client: &Client, config: &StorageConfig, explicit: Option<&str>,
) -> Result<String, String> {
    if let Some(bucket) = bucket_hint(explicit, config) {
        return Ok(bucket);
    }

    let listing = client.list_buckets().send().await.map_err(|e| {
        format!("No valid bucket found: listing buckets failed: {}", DisplayErrorContext(&e))
    })?;

    let mut candidates: Vec<String> = listing
        .buckets()
        .iter()
        .filter_map(|b| b.name())
        .filter(|name| name.starts_with(&config.bucket_prefix))
        .map(String::from)
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        format!(
            "No valid bucket found: pass a 'bucket' argument, set DECKHAND_OUTPUT_BUCKET, \
             or create a bucket named '{}…'",
            config.bucket_prefix
        )
    })
}

/// Default key for an upload: timestamp-prefixed file name under the
/// output folder.
fn default_object_key(path: &Path, now: DateTime<Utc>) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());
    format!("{}/{}-{}", OUTPUT_FOLDER, now.format("%Y%m%d-%H%M%S"), file_name)
}

/// Default local path for a download: the object key mirrored under the
/// scratch directory.
fn default_download_path(scratch_dir: &Path, key: &str) -> PathBuf {
    let mut path = scratch_dir.join("downloads");
    for segment in key.split('/').filter(|s| !s.is_empty() && *s != "..") {
        path.push(segment);
    }
    path
}

/// Uploads a local file to object storage.
#[derive(Debug)]
pub struct StorageUploadTool {
    config: StorageConfig,
    client: OnceCell<Client>,
}

impl StorageUploadTool {
    pub fn new(config: StorageConfig) -> Self {
        Self { config, client: OnceCell::new() }
    }

    async fn client(&self) -> &Client {
        self.client.get_or_init(|| build_client(&self.config)).await
    }
}

#[async_trait::async_trait]
impl Tool for StorageUploadTool {
    fn name(&self) -> &str {
        "upload_to_s3"
    }

    fn description(&self) -> &str {
        "Upload a local file to S3. Resolves the bucket from the argument, the configured default, \
         or a scan for the output-bucket prefix; the key defaults to a timestamped path under \
         'presentations/'."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![
            ("path".to_string(), ToolParameter::new_string("Local file to upload")),
            ("bucket".to_string(), ToolParameter::new_string("Target bucket (optional)")),
            ("key".to_string(), ToolParameter::new_string("Object key (optional)")),
        ])
        .with_required(vec!["path"])
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(path_arg) = arguments.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'path' parameter");
        };

        let path = Path::new(path_arg);
        if !path.is_file() {
            return ToolResult::error(format!("Local file not found: {}", path.display()));
        }

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => return ToolResult::error(format!("Cannot stat {}: {}", path.display(), e)),
        };

        let explicit = arguments.get("bucket").and_then(|v| v.as_str());
        let key = arguments
            .get("key")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| default_object_key(path, Utc::now()));

        let client = self.client().await;
        let bucket = match resolve_bucket(client, &self.config, explicit).await {
            Ok(bucket) => bucket,
            Err(message) => return ToolResult::error(message),
        };

        let body = match ByteStream::from_path(path).await {
            Ok(body) => body,
            Err(e) => return ToolResult::error(format!("Cannot read {}: {}", path.display(), e)),
        };

        match client.put_object().bucket(&bucket).key(&key).body(body).send().await {
            Ok(_) => {
                tracing::debug!(%bucket, %key, size, "uploaded object");
                ToolResult::success(format!(
                    "Uploaded {} to s3://{}/{} ({} bytes)",
                    path.display(),
                    bucket,
                    key,
                    size
                ))
            }
            Err(e) => ToolResult::error(format!(
                "Upload failed for s3://{}/{}: {}",
                bucket,
                key,
                DisplayErrorContext(&e)
            )),
        }
    }
}

/// Downloads an object from storage to a local path.
#[derive(Debug)]
pub struct StorageDownloadTool {
    config: StorageConfig,
    client: OnceCell<Client>,
}

impl StorageDownloadTool {
    pub fn new(config: StorageConfig) -> Self {
        Self { config, client: OnceCell::new() }
    }

    async fn client(&self) -> &Client {
        self.client.get_or_init(|| build_client(&self.config)).await
    }
}

#[async_trait::async_trait]
impl Tool for StorageDownloadTool {
    fn name(&self) -> &str {
        "download_from_s3"
    }

    fn description(&self) -> &str {
        "Download an object from S3 to a local path. The bucket resolves the same way as for \
         uploads; the local path defaults to the object key under the scratch directory."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![
            ("key".to_string(), ToolParameter::new_string("Object key to download")),
            ("bucket".to_string(), ToolParameter::new_string("Source bucket (optional)")),
            ("path".to_string(), ToolParameter::new_string("Local destination path (optional)")),
        ])
        .with_required(vec!["key"])
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(key) = arguments.get("key").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'key' parameter");
        };

        let local_path = arguments
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_download_path(&self.config.scratch_dir, key));

        let explicit = arguments.get("bucket").and_then(|v| v.as_str());

        let client = self.client().await;
        let bucket = match resolve_bucket(client, &self.config, explicit).await {
            Ok(bucket) => bucket,
            Err(message) => return ToolResult::error(message),
        };

        let object = match client.get_object().bucket(&bucket).key(key).send().await {
            Ok(object) => object,
            Err(e) => {
                return ToolResult::error(format!(
                    "Download failed for s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ));
            }
        };

        // Collect the body before touching the filesystem so a failed
        // download never leaves a local file behind.
        let bytes = match object.body.collect().await {
            Ok(aggregated) => aggregated.into_bytes(),
            Err(e) => {
                return ToolResult::error(format!("Download failed for s3://{}/{}: {}", bucket, key, e));
            }
        };

        if let Some(parent) = local_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::error(format!("Cannot create {}: {}", parent.display(), e));
            }
        }

        if let Err(e) = tokio::fs::write(&local_path, &bytes).await {
            return ToolResult::error(format!("Cannot write {}: {}", local_path.display(), e));
        }

        tracing::debug!(%bucket, %key, size = bytes.len(), "downloaded object");
        ToolResult::success(format!(
            "Downloaded s3://{}/{} to {} ({} bytes)",
            bucket,
            key,
            local_path.display(),
            bytes.len()
        ))
    }
}
