//! Image blobs and the HTTP client that pushes them to the image host.
//!
//! The host accepts a multipart `POST` at `{host}/@{username}/uploads` with
//! the image in a `files` field, and answers with JSON carrying the public
//! `secure_url`.

use std::future::Future;

use bytes::Bytes;
use miette::Diagnostic;
use mime_sniffer::MimeTypeSniffer;
use serde::Deserialize;

use crate::config::UploadConfig;

/// An image picked, pasted or dropped by the user, not yet uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBlob {
    /// Original filename, if the ingress path had one. Clipboard images usually don't.
    pub name: Option<String>,
    /// MIME type as reported by the platform, or sniffed from the bytes.
    pub mime_type: String,
    pub data: Bytes,
}

impl ImageBlob {
    pub fn new(name: Option<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name,
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Build a blob whose type is sniffed from its content.
    pub fn sniffed(name: Option<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let mime_type = data
            .sniff_mime_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            name,
            mime_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Alt text used when the image is inserted into the body.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "image",
        }
    }
}

/// Whether a blob may be uploaded: an `image/*` type no larger than `max_size`.
pub fn is_valid_image(blob: &ImageBlob, max_size: u64) -> bool {
    blob.mime_type.starts_with("image/") && blob.size() <= max_size
}

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum UploadError {
    /// Refused before any network call
    #[error("{name} is not an image of at most {max_size} bytes ({mime_type}, {size} bytes)")]
    #[diagnostic(
        code(quill::upload::invalid),
        help("only image files up to the configured maximum size are supported")
    )]
    InvalidImage {
        name: String,
        mime_type: String,
        size: u64,
        max_size: u64,
    },

    #[error("image upload request failed: {0}")]
    #[diagnostic(code(quill::upload::http))]
    Http(#[from] reqwest::Error),

    #[error("image host answered with status {0}")]
    #[diagnostic(code(quill::upload::status))]
    Status(u16),

    #[error("image host returned an unreadable response: {0}")]
    #[diagnostic(code(quill::upload::json))]
    Json(#[from] serde_json::Error),

    #[error("image host response did not include a secure_url")]
    #[diagnostic(code(quill::upload::missing_url))]
    MissingUrl,

    #[error("invalid image host url: {0}")]
    #[diagnostic(code(quill::upload::host))]
    Host(#[from] url::ParseError),
}

/// Something that turns an image blob into a public URL.
///
/// Exactly one remote call is made per `upload` invocation; retries are the
/// caller's business.
pub trait ImageUploader {
    fn upload(&self, blob: &ImageBlob) -> impl Future<Output = Result<String, UploadError>>;
}

impl<T: ImageUploader> ImageUploader for &T {
    fn upload(&self, blob: &ImageBlob) -> impl Future<Output = Result<String, UploadError>> {
        (*self).upload(blob)
    }
}

#[derive(Deserialize, Debug)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Uploads images to the configured image host over HTTP.
#[derive(Clone, Debug)]
pub struct HttpImageUploader {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpImageUploader {
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &UploadConfig) -> Result<Self, UploadError> {
        Ok(Self {
            client,
            endpoint: upload_endpoint(&config.host, &config.username)?,
        })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

/// `{host}/@{username}/uploads`, with the username escaped as one path segment.
pub fn upload_endpoint(host: &str, username: &str) -> Result<url::Url, url::ParseError> {
    let mut url = url::Url::parse(host)?;
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .clear()
        .push(&format!("@{}", username))
        .push("uploads");
    Ok(url)
}

fn parse_upload_response(body: &[u8]) -> Result<String, UploadError> {
    let response: UploadResponse = serde_json::from_slice(body)?;
    response
        .secure_url
        .filter(|url| !url.is_empty())
        .ok_or(UploadError::MissingUrl)
}

impl ImageUploader for HttpImageUploader {
    async fn upload(&self, blob: &ImageBlob) -> Result<String, UploadError> {
        let part = reqwest::multipart::Part::bytes(blob.data.to_vec())
            .file_name(blob.display_name().to_string())
            .mime_str(&blob.mime_type)?;
        let form = reqwest::multipart::Form::new().part("files", part);

        tracing::debug!(
            endpoint = %self.endpoint,
            name = blob.display_name(),
            size = blob.size(),
            "uploading image"
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "image host rejected upload");
            return Err(UploadError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let url = parse_upload_response(&body)?;
        tracing::info!(url = %url, "image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid PNG header, enough for sniffing
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_is_valid_image() {
        let png = ImageBlob::new(Some("a.png".into()), "image/png", vec![0u8; 10]);
        assert!(is_valid_image(&png, 10));
        assert!(!is_valid_image(&png, 9));

        let text = ImageBlob::new(Some("a.txt".into()), "text/plain", vec![0u8; 10]);
        assert!(!is_valid_image(&text, 1024));
    }

    #[test]
    fn test_sniffed_blob() {
        let blob = ImageBlob::sniffed(None, PNG_MAGIC.to_vec());
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.display_name(), "image");

        let blob = ImageBlob::sniffed(Some("notes".into()), b"just words".to_vec());
        assert!(!blob.mime_type.starts_with("image/"));
    }

    #[test]
    fn test_display_name_falls_back() {
        let blob = ImageBlob::new(Some(String::new()), "image/png", Vec::new());
        assert_eq!(blob.display_name(), "image");
        let blob = ImageBlob::new(Some("cat.jpg".into()), "image/jpeg", Vec::new());
        assert_eq!(blob.display_name(), "cat.jpg");
    }

    #[test]
    fn test_upload_endpoint() {
        let url = upload_endpoint("https://img.example.com", "alice").unwrap();
        assert_eq!(url.as_str(), "https://img.example.com/@alice/uploads");
        let url = upload_endpoint("https://img.example.com/old/path/", "alice").unwrap();
        assert_eq!(url.as_str(), "https://img.example.com/@alice/uploads");
        assert!(upload_endpoint("not a url", "alice").is_err());
        assert!(upload_endpoint("mailto:someone@example.com", "alice").is_err());
    }

    #[test]
    fn test_upload_endpoint_escapes_username() {
        let url = upload_endpoint("https://img.example.com", "a?b#c/d").unwrap();
        assert_eq!(url.as_str(), "https://img.example.com/@a%3Fb%23c%2Fd/uploads");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_parse_upload_response() {
        let url = parse_upload_response(br#"{"secure_url":"https://cdn/x.png"}"#).unwrap();
        assert_eq!(url, "https://cdn/x.png");

        assert!(matches!(
            parse_upload_response(br#"{"url":"https://cdn/x.png"}"#),
            Err(UploadError::MissingUrl)
        ));
        assert!(matches!(
            parse_upload_response(b"<html>502</html>"),
            Err(UploadError::Json(_))
        ));
    }

    mod http {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        use super::*;

        /// Answer one request with `status` and `body`; the handle yields the raw request.
        async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let host = format!("http://{}", listener.local_addr().unwrap());
            let handle = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
                request
            });
            (host, handle)
        }

        async fn read_request(socket: &mut TcpStream) -> String {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok());
                let done = match length {
                    Some(len) => buf.len() >= end + 4 + len,
                    None => buf.ends_with(b"0\r\n\r\n"),
                };
                if done {
                    break;
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        }

        fn uploader(host: String) -> HttpImageUploader {
            let config = UploadConfig {
                host,
                username: "alice".into(),
                ..Default::default()
            };
            HttpImageUploader::new(&config).unwrap()
        }

        fn cat() -> ImageBlob {
            ImageBlob::new(Some("cat.png".into()), "image/png", &b"not really a png"[..])
        }

        #[tokio::test]
        async fn test_posts_multipart_files_field() {
            let (host, server) = serve_once("200 OK", r#"{"secure_url":"https://cdn.example/cat.png"}"#).await;

            let url = uploader(host).upload(&cat()).await.unwrap();
            assert_eq!(url, "https://cdn.example/cat.png");

            let request = server.await.unwrap();
            assert!(request.starts_with("POST /@alice/uploads HTTP/1.1\r\n"), "{request}");
            assert!(request.contains(r#"name="files"; filename="cat.png""#), "{request}");
            assert!(request.to_ascii_lowercase().contains("content-type: image/png"));
            assert!(request.contains("not really a png"));
        }

        #[tokio::test]
        async fn test_error_status_is_an_error() {
            let (host, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;

            let err = uploader(host).upload(&cat()).await.unwrap_err();
            assert!(matches!(err, UploadError::Status(500)), "{err}");
            server.await.unwrap();
        }

        #[tokio::test]
        async fn test_response_without_secure_url() {
            let (host, server) = serve_once("200 OK", r#"{"url":"https://cdn.example/cat.png"}"#).await;

            let err = uploader(host).upload(&cat()).await.unwrap_err();
            assert!(matches!(err, UploadError::MissingUrl), "{err}");
            server.await.unwrap();
        }
    }
}
