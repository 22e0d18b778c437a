//! Object storage API client.
//!
//! Targets a Supabase-style storage HTTP API: objects are written under a
//! bucket with `POST /object/{bucket}/{key}` and become readable at the
//! public URL `/object/public/{bucket}/{key}`. Keys are account-prefixed and
//! timestamp-disambiguated by the upload coordinator.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use log::*;
use serde::Deserialize;

/// Bucket metadata returned by the storage API
#[derive(Debug, Clone, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

/// Object storage client
pub struct ObjectStoreClient {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl ObjectStoreClient {
    /// Create a new object storage client for one bucket
    pub fn new(api_key: &str, base_url: &str, bucket: &str) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();

        let mut header_value =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(
                |e| {
                    warn!("Failed to create auth header: {:?}", e);
                    Error::internal("Invalid object store API key format")
                },
            )?;
        header_value.set_sensitive(true);
        headers.insert("authorization", header_value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        })
    }

    /// The public URL an uploaded object is readable at.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, key)
    }

    /// Upload one object and return its public URL.
    pub async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, key);

        debug!("Uploading {} bytes to {}/{}", bytes.len(), self.bucket, key);

        let response = self
            .client
            .post(&url)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(self.public_url(key))
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Object store API {status}: {error_text}");
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                    "Object upload failed: {status}"
                ))),
            })
        }
    }

    /// Remove one object from the bucket.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, key);

        debug!("Deleting {}/{}", self.bucket, key);

        let response = self.client.delete(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                    "Object deletion failed: {}",
                    response.status()
                ))),
            })
        }
    }

    /// List all buckets visible to the configured credentials.
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>, Error> {
        let url = format!("{}/bucket", self.base_url);

        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            let buckets: Vec<Bucket> = response.json().await.map_err(|e| {
                warn!("Failed to parse bucket list: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid bucket list response".to_string(),
                    )),
                }
            })?;
            Ok(buckets)
        } else {
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                    "Bucket listing failed: {}",
                    response.status()
                ))),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_returns_public_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/object/call-audio/acme/123_demo.mp3")
            .with_status(200)
            .with_body(r#"{"Key":"call-audio/acme/123_demo.mp3"}"#)
            .create_async()
            .await;

        let client = ObjectStoreClient::new("key", &server.url(), "call-audio").unwrap();
        let url = client
            .put("acme/123_demo.mp3", vec![1, 2, 3], "audio/mpeg")
            .await
            .unwrap();

        assert!(url.ends_with("/object/public/call-audio/acme/123_demo.mp3"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_buckets_parses_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/bucket")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"call-audio","name":"call-audio","public":true}]"#)
            .create_async()
            .await;

        let client = ObjectStoreClient::new("key", &server.url(), "call-audio").unwrap();
        let buckets = client.list_buckets().await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].name, "call-audio");
    }
}
