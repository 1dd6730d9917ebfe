//! Объектное хранилище: Google Cloud Storage и локальный каталог

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const GCS_BASE_URL: &str = "https://storage.googleapis.com";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object {object} not found in bucket {bucket}")]
    NotFound { bucket: String, object: String },

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Скачивает объект в локальный файл, возвращает число записанных байт
    async fn download(
        &self,
        bucket: &str,
        object: &str,
        destination: &Path,
    ) -> Result<u64, StorageError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// JSON API Google Cloud Storage
pub struct GcsStore {
    client: reqwest::Client,
    base_url: String,
    authenticate: bool,
}

impl GcsStore {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GCS_BASE_URL.to_string(),
            authenticate: true,
        }
    }

    /// Учитывает STORAGE_EMULATOR_HOST: эмулятор работает без авторизации
    pub fn from_env() -> Self {
        match std::env::var("STORAGE_EMULATOR_HOST") {
            Ok(host) if !host.trim().is_empty() => {
                let host = host.trim();
                let base_url = if host.contains("://") {
                    host.to_string()
                } else {
                    format!("http://{}", host)
                };
                Self::new().with_base_url(base_url).without_auth()
            }
            _ => Self::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn without_auth(mut self) -> Self {
        self.authenticate = false;
        self
    }

    pub fn object_url(&self, bucket: &str, object: &str) -> Result<reqwest::Url, StorageError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| StorageError::Url(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", object]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, StorageError> {
        if let Ok(token) = std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| StorageError::Auth(format!("metadata server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(StorageError::Auth(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| StorageError::Auth(format!("malformed token response: {}", e)))?;
        Ok(token.access_token)
    }
}

impl Default for GcsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn download(
        &self,
        bucket: &str,
        object: &str,
        destination: &Path,
    ) -> Result<u64, StorageError> {
        let url = self.object_url(bucket, object)?;
        let mut request = self.client.get(url.clone());
        if self.authenticate {
            request = request.bearer_auth(self.access_token().await?);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StorageError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(destination, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

/// Бакеты как подкаталоги root: <root>/<bucket>/<object>
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn download(
        &self,
        bucket: &str,
        object: &str,
        destination: &Path,
    ) -> Result<u64, StorageError> {
        let source = self.root.join(bucket).join(object);
        if !tokio::fs::try_exists(&source).await? {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            });
        }
        Ok(tokio::fs::copy(&source, destination).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Отвечает на один запрос заданным статусом и телом, возвращает текст запроса
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_ascii_lowercase()
        });

        (base_url, handle)
    }

    fn local_gcs(base_url: &str) -> GcsStore {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        GcsStore::new().with_client(client).with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_gcs_download_writes_body() {
        let (base_url, server) = serve_once("200 OK", "Booking_ID,lead_time\nINN1,10\n").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("raw.csv");

        let written = local_gcs(&base_url)
            .without_auth()
            .download("bookings", "Hotel_Reservations.csv", &dest)
            .await
            .unwrap();

        assert_eq!(written, 29);
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "Booking_ID,lead_time\nINN1,10\n"
        );
        let request = server.await.unwrap();
        assert!(request.starts_with("get /storage/v1/b/bookings/o/hotel_reservations.csv?alt=media "));
        assert!(!request.contains("authorization"), "request = {}", request);
    }

    #[tokio::test]
    async fn test_gcs_download_sends_bearer_token() {
        std::env::set_var("GOOGLE_OAUTH_ACCESS_TOKEN", "test-token");
        let (base_url, server) = serve_once("200 OK", "a\n1\n").await;
        let dir = tempfile::tempdir().unwrap();

        local_gcs(&base_url)
            .download("bookings", "data.csv", &dir.path().join("data.csv"))
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.contains("authorization: bearer test-token"), "request = {}", request);
    }

    #[tokio::test]
    async fn test_gcs_missing_object() {
        let (base_url, server) = serve_once("404 Not Found", "No such object").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("raw.csv");

        let err = local_gcs(&base_url)
            .without_auth()
            .download("bookings", "missing.csv", &dest)
            .await
            .unwrap_err();

        server.await.unwrap();
        assert!(
            matches!(&err, StorageError::NotFound { bucket, object } if bucket == "bookings" && object == "missing.csv"),
            "err = {:?}",
            err
        );
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_gcs_server_error_status() {
        let (base_url, server) = serve_once("500 Internal Server Error", "boom").await;
        let dir = tempfile::tempdir().unwrap();

        let err = local_gcs(&base_url)
            .without_auth()
            .download("bookings", "data.csv", &dir.path().join("data.csv"))
            .await
            .unwrap_err();

        server.await.unwrap();
        assert!(matches!(err, StorageError::Status { status: 500, .. }), "err = {:?}", err);
    }

    #[tokio::test]
    async fn test_gcs_unwritable_destination() {
        let (base_url, server) = serve_once("200 OK", "a\n1\n").await;
        let dir = tempfile::tempdir().unwrap();

        // Каталог на месте файла назначения
        let err = local_gcs(&base_url)
            .without_auth()
            .download("bookings", "data.csv", dir.path())
            .await
            .unwrap_err();

        server.await.unwrap();
        assert!(matches!(err, StorageError::Io(_)), "err = {:?}", err);
    }

    #[test]
    fn test_object_url_encodes_object_name() {
        let store = GcsStore::new();
        let url = store.object_url("hotel-bookings", "raw/Hotel Reservations.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/hotel-bookings/o/raw%2FHotel%20Reservations.csv?alt=media"
        );
    }

    #[test]
    fn test_object_url_with_emulator_base() {
        let store = GcsStore::new().with_base_url("http://localhost:4443/").without_auth();
        let url = store.object_url("bucket", "data.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4443/storage/v1/b/bucket/o/data.csv?alt=media"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let store = GcsStore::new().with_base_url("not a url");
        assert!(matches!(store.object_url("b", "o"), Err(StorageError::Url(_))));
    }

    #[tokio::test]
    async fn test_local_store_copies_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bucket")).unwrap();
        std::fs::write(dir.path().join("bucket").join("data.csv"), "a,b\n1,2\n").unwrap();

        let store = LocalStore::new(dir.path());
        let dest = dir.path().join("copy.csv");
        let written = store.download("bucket", "data.csv", &dest).await.unwrap();

        assert_eq!(written, 8);
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_local_store_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store
            .download("bucket", "missing.csv", &dir.path().join("out.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
