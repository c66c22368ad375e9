//! # Domoticz HTTP Client
//!
//! Domoticz is driven through plain `GET` requests on its `json.htm` endpoint.
//! The client speaks just enough HTTP/1.0 over a tokio `TcpStream` for that:
//! one request per connection, status line checked, body returned.

use crate::constants::PARAM_STRING_DEVICE_STATUS;
use crate::domoticz::sink::PushSink;
use crate::error::TeleinfoError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// State of a Domoticz device, as reported by `type=devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    Switch(bool),
    Selector(i64),
    Other,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    result: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    #[serde(rename = "SubType", default)]
    sub_type: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Level", default)]
    level: i64,
}

/// HTTP access to one Domoticz instance.
#[derive(Debug, Clone)]
pub struct DomoticzClient {
    host: String,
    port: u16,
    path: String,
    timeout: Duration,
}

impl DomoticzClient {
    /// Parses `http://host[:port]/path`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TeleinfoError> {
        let rest = base_url
            .strip_prefix("http://")
            .ok_or_else(|| TeleinfoError::InvalidUrl(base_url.to_string()))?;
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>()
                    .map_err(|_| TeleinfoError::InvalidUrl(base_url.to_string()))?,
            ),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(TeleinfoError::InvalidUrl(base_url.to_string()));
        }
        Ok(DomoticzClient {
            host: host.to_string(),
            port,
            path: path.to_string(),
            timeout,
        })
    }

    /// The request target for a query string such as `?type=devices&rid=1`.
    pub fn request_target(&self, query: &str) -> String {
        format!("{}{}", self.path, encode_query(query))
    }

    /// Issues a GET and returns the response body of a 2xx answer.
    pub async fn get(&self, query: &str) -> Result<String, TeleinfoError> {
        timeout(self.timeout, self.exchange(query))
            .await
            .map_err(|_| TeleinfoError::HttpError(format!("timeout after {:?}", self.timeout)))?
    }

    async fn exchange(&self, query: &str) -> Result<String, TeleinfoError> {
        let http_err = |e: std::io::Error| TeleinfoError::HttpError(e.to_string());

        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(http_err)?;
        let request = format!(
            "GET {} HTTP/1.0\r\nHost: {}:{}\r\nConnection: close\r\n\r\n",
            self.request_target(query),
            self.host,
            self.port
        );
        stream.write_all(request.as_bytes()).await.map_err(http_err)?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.map_err(http_err)?;
        parse_response(&response)
    }

    /// Reads the state of device `idx`.
    pub async fn device_status(&self, idx: u32) -> Result<DeviceStatus, TeleinfoError> {
        let body = self.get(&format!("{PARAM_STRING_DEVICE_STATUS}{idx}")).await?;
        parse_device_status(&body)
    }
}

#[async_trait]
impl PushSink for DomoticzClient {
    async fn push(&self, payload: &str) -> Result<(), TeleinfoError> {
        self.get(payload).await.map(|_| ())
    }
}

/// Splits a raw HTTP response; fails unless the status is 2xx.
fn parse_response(response: &[u8]) -> Result<String, TeleinfoError> {
    let text = String::from_utf8_lossy(response);
    let (head, body) = text.split_once("\r\n\r\n").unwrap_or((&text[..], ""));
    let status_line = head.lines().next().unwrap_or_default();
    let code = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| TeleinfoError::HttpError(format!("bad status line {status_line:?}")))?;
    if !(200..300).contains(&code) {
        return Err(TeleinfoError::HttpError(format!("status {code}")));
    }
    Ok(body.to_string())
}

pub fn parse_device_status(body: &str) -> Result<DeviceStatus, TeleinfoError> {
    let response: DevicesResponse =
        serde_json::from_str(body).map_err(|e| TeleinfoError::InvalidResponse(e.to_string()))?;
    let device = response
        .result
        .first()
        .ok_or_else(|| TeleinfoError::InvalidResponse("no device in result".into()))?;
    Ok(match device.sub_type.as_str() {
        "Switch" => DeviceStatus::Switch(device.status == "On"),
        "Selector Switch" => DeviceStatus::Selector(device.level),
        _ => DeviceStatus::Other,
    })
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~')
}

/// Percent-encodes a query string, keeping its `?`, `&`, `=` structure.
///
/// Existing escapes are left alone, so components can be pre-encoded with
/// [`encode_component`].
pub fn encode_query(query: &str) -> String {
    encode_with(query, |b| {
        is_unreserved(b) || matches!(b, b'?' | b'&' | b'=' | b';' | b'/' | b':' | b',' | b'%')
    })
}

/// Percent-encodes a single query component (a log message, a text value).
pub fn encode_component(value: &str) -> String {
    encode_with(value, is_unreserved)
}

fn encode_with(input: &str, keep: impl Fn(u8) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        if keep(b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
