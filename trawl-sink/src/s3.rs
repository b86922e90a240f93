//! Object-storage upload for saved files.
//!
//! Credentials and region come from the standard AWS provider chain; a
//! custom endpoint switches the client to path-style addressing so
//! S3-compatible stores work too. Uploads are verified with `head_object`
//! before the local copy is ever considered for deletion.

use crate::record::RunMeta;
use crate::writer::SavedFile;
use anyhow::{Context, anyhow};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{SecondsFormat, Utc};
use std::path::Path;
use trawl_common::OutputFormat;

pub struct S3Sink {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Sink {
    /// Build a client against the configured bucket.
    ///
    /// Nothing talks to the network here; bad credentials or a missing
    /// bucket only surface on the first operation.
    pub async fn connect(
        bucket: String,
        prefix: String,
        endpoint: Option<&str>,
        region: Option<&str>,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        // Virtual-host addressing breaks on most S3-compatible stores.
        let client = if endpoint.is_some() {
            let conf = aws_sdk_s3::config::Builder::from(&shared)
                .force_path_style(true)
                .build();
            Client::from_conf(conf)
        } else {
            Client::new(&shared)
        };

        tracing::debug!(
            bucket=%bucket,
            prefix=%prefix,
            custom_endpoint = endpoint.is_some(),
            "s3.client_ready"
        );
        Self {
            client,
            bucket,
            prefix,
        }
    }

    /// Upload one saved file, verify it landed, optionally drop the local copy.
    ///
    /// Returns the object key. `delete_local` only ever runs after the
    /// `head_object` verification succeeded.
    pub async fn upload_file(
        &self,
        saved: &SavedFile,
        meta: &RunMeta,
        format: OutputFormat,
        delete_local: bool,
    ) -> anyhow::Result<String> {
        let file_name = saved
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("output path has no file name: {}", saved.path.display()))?;
        let key = object_key(&self.prefix, file_name);

        let body = ByteStream::from_path(&saved.path)
            .await
            .with_context(|| format!("failed to read {}", saved.path.display()))?;
        let upload_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type(format.content_type())
            .metadata("uploaded_by", "trawl")
            .metadata("upload_time", &upload_time)
            .metadata("search_type", meta.search_type.as_str())
            .metadata("format", format.extension())
            .send()
            .await
            .map_err(|err| hint_for(&format!("{}", DisplayErrorContext(&err)), &self.bucket))?;

        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "upload verification failed for s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&err)
                )
            })?;

        tracing::info!(
            bucket=%self.bucket,
            key=%key,
            size_mb = format!("{:.2}", saved.size_mb()),
            "s3.uploaded"
        );

        if delete_local {
            std::fs::remove_file(&saved.path)
                .with_context(|| format!("failed to remove {}", saved.path.display()))?;
            tracing::info!(path=%saved.path.display(), "s3.local_copy_removed");
        }
        Ok(key)
    }

    /// Keys under `prefix`, defaulting to the sink's configured prefix.
    pub async fn list(&self, prefix: Option<&str>) -> anyhow::Result<Vec<String>> {
        let prefix = prefix.unwrap_or(&self.prefix);
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|err| hint_for(&format!("{}", DisplayErrorContext(&err)), &self.bucket))?;
        Ok(resp
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect())
    }

    /// Fetch one object to a local path.
    pub async fn download(&self, key: &str, dest: &Path) -> anyhow::Result<()> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| hint_for(&format!("{}", DisplayErrorContext(&err)), &self.bucket))?;
        let bytes = resp
            .body
            .collect()
            .await
            .with_context(|| format!("failed to read body of s3://{}/{key}", self.bucket))?
            .into_bytes();
        std::fs::write(dest, &bytes)
            .with_context(|| format!("failed to write {}", dest.display()))?;
        tracing::info!(key, dest=%dest.display(), bytes = bytes.len(), "s3.downloaded");
        Ok(())
    }
}

fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{prefix}/{file_name}")
    }
}

/// Map the SDK's error soup to something actionable.
fn hint_for(rendered: &str, bucket: &str) -> anyhow::Error {
    if rendered.contains("NoSuchBucket") {
        anyhow!("bucket `{bucket}` does not exist; create it or fix --s3-bucket")
    } else if rendered.contains("AccessDenied") || rendered.contains("Forbidden") {
        anyhow!("access denied to bucket `{bucket}`; the IAM policy needs put/get/head access")
    } else if rendered.contains("credentials") || rendered.contains("CredentialsNotLoaded") {
        anyhow!(
            "no AWS credentials found; set AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY or configure a profile"
        )
    } else {
        anyhow!("S3 request failed: {rendered}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_join_prefix_and_name() {
        assert_eq!(object_key("", "run_#1.jsonl"), "run_#1.jsonl");
        assert_eq!(object_key("raw", "run_#1.jsonl"), "raw/run_#1.jsonl");
        assert_eq!(object_key("raw/2025/", "run_#1.jsonl"), "raw/2025/run_#1.jsonl");
        assert_eq!(object_key("/", "run_#1.jsonl"), "run_#1.jsonl");
    }

    #[test]
    fn hints_name_the_failure() {
        let err = hint_for("service error: NoSuchBucket: the bucket is gone", "b");
        assert!(err.to_string().contains("does not exist"));

        let err = hint_for("AccessDenied: nope", "b");
        assert!(err.to_string().contains("IAM policy"));

        let err = hint_for("dispatch failure: failed to load credentials", "b");
        assert!(err.to_string().contains("AWS_ACCESS_KEY_ID"));

        let err = hint_for("timeout talking to host", "b");
        assert!(err.to_string().contains("S3 request failed"));
    }
}
