//! S3-compatible object storage used to keep off-site copies of backups.
//!
//! Requests are path-style (`{endpoint}/{bucket}/{key}`) and signed with AWS
//! Signature Version 4, which the Oracle Cloud compatibility endpoint accepts.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::ObjectStorageConfig;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object storage request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("object storage answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid object storage endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("request signing failed")]
    Signing,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Off-site store for backup files, keyed by file name.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, source: &Path, acl: Option<&str>) -> Result<(), StorageError>;

    async fn download(&self, key: &str, destination: &Path) -> Result<(), StorageError>;
}

pub struct S3Client {
    client: reqwest::Client,
    endpoint: Url,
    region: String,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl S3Client {
    pub fn new(config: &ObjectStorageConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        let endpoint = config.endpoint();
        Ok(Self {
            client,
            endpoint: Url::parse(&endpoint).map_err(|_| StorageError::InvalidEndpoint(endpoint))?,
            region: config.region.clone(),
            bucket: config.bucket.clone(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, StorageError> {
        self.endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|_| StorageError::InvalidEndpoint(endpoint.to_string()))?;
        Ok(self)
    }

    fn object_path(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.path().trim_end_matches('/'),
            uri_encode(&self.bucket, false),
            uri_encode(key.trim_start_matches('/'), true)
        )
    }

    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}://{}{}",
            self.endpoint.scheme(),
            self.host(),
            path
        )
    }

    /// Headers for a signed request, including `Authorization`.
    fn signed_headers(
        &self,
        method: &str,
        path: &str,
        payload: &[u8],
        acl: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, StorageError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let mut headers = vec![
            ("host".to_string(), self.host()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(acl) = acl {
            headers.push(("x-amz-acl".to_string(), acl.to_string()));
        }
        headers.sort();

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{}\n", value.trim()))
            .collect();
        let signed_names = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_request =
            format!("{method}\n{path}\n\n{canonical_headers}\n{signed_names}\n{payload_hash}");

        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.region);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        let key = signing_key(&self.secret_key, &date, &self.region, SERVICE)?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        headers.retain(|(name, _)| name != "host");
        headers.push((
            "authorization".to_string(),
            format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_names}, Signature={signature}",
                self.access_key
            ),
        ));
        Ok(headers)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        key: &str,
        body: Vec<u8>,
        acl: Option<&str>,
    ) -> Result<reqwest::Response, StorageError> {
        let path = self.object_path(key);
        let headers = self.signed_headers(method.as_str(), &path, &body, acl, Utc::now())?;
        let mut request = self.client.request(method, self.object_url(&path));
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ObjectStorage for S3Client {
    async fn upload(&self, key: &str, source: &Path, acl: Option<&str>) -> Result<(), StorageError> {
        let body = tokio::fs::read(source).await?;
        self.send(reqwest::Method::PUT, key, body, acl).await?;
        Ok(())
    }

    async fn download(&self, key: &str, destination: &Path) -> Result<(), StorageError> {
        let response = self.send(reqwest::Method::GET, key, Vec::new(), None).await?;
        let bytes = response.bytes().await?;
        tokio::fs::write(destination, &bytes).await?;
        Ok(())
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, StorageError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| StorageError::Signing)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, StorageError> {
    let date_key = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let region_key = hmac(&date_key, region.as_bytes())?;
    let service_key = hmac(&region_key, service.as_bytes())?;
    hmac(&service_key, b"aws4_request")
}

/// Percent-encodes everything outside the unreserved set, optionally keeping `/`.
pub(crate) fn uri_encode(value: &str, keep_slash: bool) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if keep_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
