use crate::block::RequestBlock;
use crate::decoder::{decode_text, decompress, ContentEncoding};
use crate::error::{Error, Result};
use crate::url;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE},
    Certificate, Client, Method, StatusCode, Version,
};
use std::collections::HashMap;
use std::fmt::Debug;

pub trait HttpConnectionProfile {
    fn host(&self) -> Option<&String>;
    fn user(&self) -> Option<&String>;
    fn password(&self) -> Option<&String>;
    fn insecure(&self) -> bool;
    fn ca_cert(&self) -> Option<&String>;
    fn headers(&self) -> &HashMap<String, String>;
}

#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, version: Version, headers: HeaderMap, body: String) -> Self {
        HttpResponse {
            status,
            version,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

pub struct HttpClient {
    client: Client,
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

impl Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("client", &"Client")
            .field("host", &self.host)
            .finish()
    }
}

fn to_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    headers
        .iter()
        .map(|(key, value)| {
            let invalid = |reason: String| Error::InvalidHeader {
                name: key.to_string(),
                reason,
            };
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            Ok((name, value))
        })
        .collect()
}

/// Headers sent with `block`, with `extra_headers` replacing same-named
/// block headers. Profile defaults are applied by the client underneath.
pub fn request_headers(
    block: &RequestBlock,
    extra_headers: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut headers = block.headers().clone();
    headers.extend(extra_headers.iter().map(|(k, v)| (k.clone(), v.clone())));
    headers
}

impl HttpClient {
    pub fn new(profile: &impl HttpConnectionProfile) -> Result<Self> {
        Ok(HttpClient {
            client: Self::build_client(profile)?,
            host: profile.host().cloned(),
            user: profile.user().cloned(),
            password: profile.password().cloned(),
        })
    }

    /// The URL a block is sent to, after joining relative paths with the
    /// profile host.
    pub fn target_url(&self, block: &RequestBlock) -> String {
        url::with_host(block.url(), self.host.as_deref())
    }

    /// Sends `block`. `extra_headers` (from the command line) override the
    /// block's own headers, which override the profile defaults.
    pub async fn execute(
        &self,
        block: &RequestBlock,
        extra_headers: &HashMap<String, String>,
    ) -> Result<HttpResponse> {
        let method = Method::from_bytes(block.method().as_str().as_bytes()).map_err(|_| {
            Error::InvalidArgument(format!("unsupported method '{}'", block.method()))
        })?;

        let headers = to_header_map(&request_headers(block, extra_headers))?;

        let mut req_builder = self
            .client
            .request(method, self.target_url(block))
            .headers(headers);

        if let Some(body) = block.body() {
            req_builder = req_builder.body(body.read()?);
        }

        if let Some(user) = &self.user {
            req_builder = req_builder.basic_auth(user, self.password.clone());
        }

        let req = req_builder.build()?;
        tracing::debug!(method = %req.method(), url = %req.url(), "sending request");

        let res = self.client.execute(req).await?;
        let status = res.status();
        let version = res.version();
        let headers = res.headers().clone();
        let body_bytes = res.bytes().await?;

        let encoding = ContentEncoding::from_header(
            headers.get(CONTENT_ENCODING).and_then(|v| v.to_str().ok()),
        );
        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let body = decode_text(&decompress(body_bytes, encoding)?, content_type);

        tracing::debug!(%status, bytes = body.len(), "received response");

        Ok(HttpResponse::new(status, version, headers, body))
    }

    fn build_client(profile: &impl HttpConnectionProfile) -> Result<Client> {
        let insecure_access = profile.insecure();
        let mut cli_builder = Client::builder()
            .danger_accept_invalid_certs(insecure_access)
            .danger_accept_invalid_hostnames(insecure_access);

        if let Some(ca_cert) = profile.ca_cert() {
            let ca_cert = shellexpand::tilde(ca_cert).to_string();
            let cert = Certificate::from_pem(&std::fs::read(&ca_cert)?).map_err(|e| {
                Error::InvalidArgument(format!("invalid CA certificate {ca_cert}: {e}"))
            })?;
            cli_builder = cli_builder.use_rustls_tls().add_root_certificate(cert);
        }

        if !profile.headers().is_empty() {
            cli_builder = cli_builder.default_headers(to_header_map(profile.headers())?);
        }

        Ok(cli_builder.build()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::RequestBlockParser;
    use crate::vars::Variables;

    #[derive(Default)]
    struct TestProfile {
        host: Option<String>,
        headers: HashMap<String, String>,
    }

    impl HttpConnectionProfile for TestProfile {
        fn host(&self) -> Option<&String> {
            self.host.as_ref()
        }

        fn user(&self) -> Option<&String> {
            None
        }

        fn password(&self) -> Option<&String> {
            None
        }

        fn insecure(&self) -> bool {
            false
        }

        fn ca_cert(&self) -> Option<&String> {
            None
        }

        fn headers(&self) -> &HashMap<String, String> {
            &self.headers
        }
    }

    fn closed_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn block(lines: &[&str]) -> RequestBlock {
        let vars = Variables::isolated();
        RequestBlockParser::new(&vars, "/")
            .parse(lines, 1)
            .unwrap()
            .block
    }

    #[test]
    fn target_url_should_join_profile_host() {
        let profile = TestProfile {
            host: Some("http://localhost:9200/".to_string()),
            ..Default::default()
        };
        let client = HttpClient::new(&profile).unwrap();
        assert_eq!(
            client.target_url(&block(&["GET /_cat/indices"])),
            "http://localhost:9200/_cat/indices"
        );
        assert_eq!(
            client.target_url(&block(&["GET https://example.com/x"])),
            "https://example.com/x"
        );
    }

    #[test]
    fn new_should_reject_invalid_default_headers() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let profile = TestProfile {
            headers,
            ..Default::default()
        };
        assert!(matches!(
            HttpClient::new(&profile),
            Err(Error::InvalidHeader { .. })
        ));
    }

    #[test]
    fn request_headers_should_let_extras_override_block() {
        let block = block(&["GET /", "x-id: 1", "accept: */*"]);
        let mut extra = HashMap::new();
        extra.insert("x-id".to_string(), "2".to_string());

        let headers = request_headers(&block, &extra);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-id"], "2");
        assert_eq!(headers["accept"], "*/*");
    }

    #[tokio::test]
    async fn execute_should_fail_for_missing_import() {
        let client = HttpClient::new(&TestProfile::default()).unwrap();
        let request_line = format!("POST http://127.0.0.1:{}/upload", closed_port());
        let block = block(&[&request_line, "", "</no/such/body.json"]);
        let result = client.execute(&block, &HashMap::new()).await;
        assert!(matches!(result, Err(Error::ImportFileNotFound(_))));
    }

    #[tokio::test]
    async fn execute_should_wrap_transport_errors() {
        let client = HttpClient::new(&TestProfile::default()).unwrap();
        let request_line = format!("GET http://127.0.0.1:{}/", closed_port());
        let block = block(&[&request_line]);
        let result = client.execute(&block, &HashMap::new()).await;
        assert!(matches!(result, Err(Error::RequestExecutionFailed(_))));
    }
}
