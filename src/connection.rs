use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ConsoleError, ConsoleResult};
use crate::executor::{Connector, Executor};
use crate::options::{FrameOptions, IndexOptions};
use crate::schema::Schema;

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 10101;

const SCHEMES: &[&str] = &["http", "https"];

/// Server address in `[scheme://][host][:port]` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    host: String,
    port: u16,
}

impl Uri {
    pub fn from_address(address: &str) -> ConsoleResult<Self> {
        let invalid = || ConsoleError::InvalidArgument(format!("Invalid address: {}", address));

        let (scheme, rest) = match address.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => (DEFAULT_SCHEME.to_string(), address),
        };
        if !SCHEMES.contains(&scheme.as_str()) {
            return Err(invalid());
        }

        let (host, port) = if rest.starts_with('[') {
            let end = rest.find(']').ok_or_else(invalid)?;
            let host = &rest[..=end];
            if !host[1..end].chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
                return Err(invalid());
            }
            match &rest[end + 1..] {
                "" => (host, None),
                tail => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match rest.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            }
        };

        if !host.starts_with('[')
            && !host.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };
        let host = if host.is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            host.to_ascii_lowercase()
        };

        Ok(Self { scheme, host, port })
    }

    /// `host:port`, as shown in the prompt.
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `scheme://host:port`, the base of every request.
    pub fn normalize(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalize())
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(100),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: ConnectionConfig,
}

impl HttpConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    type Client = HttpClient;

    fn connect(&self, uri: &Uri) -> ConsoleResult<HttpClient> {
        info!("Connecting to {}", uri);
        let http = Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .build()?;
        Ok(HttpClient {
            base: uri.normalize(),
            http,
        })
    }
}

#[derive(Serialize)]
struct CreateRequest<'a, T> {
    options: &'a T,
}

pub struct HttpClient {
    base: String,
    http: Client,
}

impl HttpClient {
    async fn send(&self, method: Method, path: &str, body: Option<String>) -> ConsoleResult<(StatusCode, String)> {
        let url = format!("{}{}", self.base, path);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.body(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{} returned {}", url, status);
        Ok((status, text))
    }

    async fn request(&self, method: Method, path: &str, body: Option<String>) -> ConsoleResult<String> {
        let (status, text) = self.send(method, path, body).await?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(status_error(status, &text))
        }
    }

    /// Like [`request`](Self::request), but an existing object is not an error.
    async fn request_idempotent(&self, method: Method, path: &str, body: Option<String>) -> ConsoleResult<()> {
        let (status, text) = self.send(method, path, body).await?;
        if status.is_success() || status == StatusCode::CONFLICT {
            Ok(())
        } else {
            Err(status_error(status, &text))
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> ConsoleError {
    ConsoleError::Transport(format!("{}: {}", status, body.trim()))
}

fn options_body<T: Serialize>(options: &T) -> ConsoleResult<String> {
    serde_json::to_string(&CreateRequest { options })
        .map_err(|e| ConsoleError::InvalidOption(format!("Cannot encode options: {}", e)))
}

fn index_path(index: &str) -> String {
    format!("/index/{}", index)
}

fn frame_path(index: &str, frame: &str) -> String {
    format!("/index/{}/frame/{}", index, frame)
}

impl Executor for HttpClient {
    async fn schema(&self) -> ConsoleResult<Schema> {
        let body = self.request(Method::GET, "/schema", None).await?;
        serde_json::from_str(&body)
            .map_err(|e| ConsoleError::Transport(format!("Invalid schema response: {}", e)))
    }

    async fn create_index(&self, index: &str, options: &IndexOptions) -> ConsoleResult<()> {
        let body = options_body(options)?;
        self.request(Method::POST, &index_path(index), Some(body)).await?;
        Ok(())
    }

    async fn ensure_index(&self, index: &str, options: &IndexOptions) -> ConsoleResult<()> {
        let body = options_body(options)?;
        self.request_idempotent(Method::POST, &index_path(index), Some(body)).await
    }

    async fn delete_index(&self, index: &str) -> ConsoleResult<()> {
        self.request(Method::DELETE, &index_path(index), None).await?;
        Ok(())
    }

    async fn create_frame(&self, index: &str, frame: &str, options: &FrameOptions) -> ConsoleResult<()> {
        let body = options_body(options)?;
        self.request(Method::POST, &frame_path(index, frame), Some(body)).await?;
        Ok(())
    }

    async fn ensure_frame(&self, index: &str, frame: &str, options: &FrameOptions) -> ConsoleResult<()> {
        let body = options_body(options)?;
        self.request_idempotent(Method::POST, &frame_path(index, frame), Some(body)).await
    }

    async fn delete_frame(&self, index: &str, frame: &str) -> ConsoleResult<()> {
        self.request(Method::DELETE, &frame_path(index, frame), None).await?;
        Ok(())
    }

    async fn query(&self, index: &str, query: &str) -> ConsoleResult<String> {
        let path = format!("{}/query", index_path(index));
        self.request(Method::POST, &path, Some(query.to_string())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_port_defaults_scheme() {
        let uri = Uri::from_address("127.0.0.1:10101").unwrap();
        assert_eq!(uri.normalize(), "http://127.0.0.1:10101");
        assert_eq!(uri.host_port(), "127.0.0.1:10101");
    }

    #[test]
    fn missing_parts_fall_back_to_defaults() {
        assert_eq!(Uri::from_address("").unwrap().normalize(), "http://localhost:10101");
        assert_eq!(Uri::from_address(":9000").unwrap().normalize(), "http://localhost:9000");
        assert_eq!(Uri::from_address("Index.Example").unwrap().normalize(), "http://index.example:10101");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let uri = Uri::from_address("https://db.local:443").unwrap();
        assert_eq!(uri.to_string(), "https://db.local:443");
    }

    #[test]
    fn ipv6_host() {
        let uri = Uri::from_address("[::1]:10102").unwrap();
        assert_eq!(uri.host_port(), "[::1]:10102");
        assert_eq!(Uri::from_address("[::1]").unwrap().host_port(), "[::1]:10101");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for address in ["ftp://host", "host:port", "host:99999", "bad host", "[::1", "[::1]x"] {
            let err = Uri::from_address(address).unwrap_err();
            assert!(matches!(err, ConsoleError::InvalidArgument(_)), "{}", address);
        }
    }

    #[test]
    fn create_body_wraps_options() {
        let options = IndexOptions {
            column_label: Some("user".to_string()),
            time_quantum: None,
        };
        assert_eq!(options_body(&options).unwrap(), r#"{"options":{"columnLabel":"user"}}"#);
    }
}
