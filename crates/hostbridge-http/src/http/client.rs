//! The reqwest-backed client. One instance is built per bridge and shared
//! by every call; reqwest pools connections underneath.

use crate::http::error::{HttpError, HttpResult};
use crate::http::headers::parse_header_block;
use crate::http::types::{HttpConfig, HttpMethod, HttpResponse};
use log::{debug, info};
use reqwest::{Client, Url};

pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> HttpResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| HttpError::client_build(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Send one request. `headers` is a header block (see
    /// [`parse_header_block`]); an empty `body` sends none.
    pub async fn request(&self, method: HttpMethod, url: &str, headers: &str, body: &str) -> HttpResult<HttpResponse> {
        let url = parse_url(url)?;
        let headers = parse_header_block(headers)?;

        debug!("HTTP {method} {url} ({} header(s), {} body bytes)", headers.len(), body.len());
        let mut builder = self.client.request(method.to_reqwest(), url.clone()).headers(headers);
        if !body.is_empty() {
            builder = builder.body(body.to_string());
        }
        let mut resp = builder.send().await?;

        let status = resp.status().as_u16();
        let response_headers = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();

        let limit = self.config.max_response_bytes;
        let mut buf = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if (buf.len() + chunk.len()) as u64 > limit {
                return Err(HttpError::too_large(limit));
            }
            buf.extend_from_slice(&chunk);
        }

        info!("HTTP {method} {url} -> {status} ({} bytes)", buf.len());
        Ok(HttpResponse { status, headers: response_headers, body: String::from_utf8_lossy(&buf).into_owned() })
    }
}

/// Absolute `http`/`https` URLs only.
fn parse_url(url: &str) -> HttpResult<Url> {
    let url = url.trim();
    if url.is_empty() {
        return Err(HttpError::empty_url());
    }
    let parsed = Url::parse(url).map_err(|e| HttpError::invalid_url(format!("'{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(HttpError::invalid_url(format!("unsupported scheme '{other}'"))),
    }
}
