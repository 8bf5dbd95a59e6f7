//! Zabbix sender protocol over TCP.
//!
//! A request is a `ZBXD\x01` header, the body length as little-endian `u64`
//! and a JSON body `{"request":"sender data","data":[{host,key,value},...]}`.
//! The server answers with the same framing and
//! `{"response":"success","info":"processed: 2; failed: 0; total: 2; ..."}`.

use std::future::Future;
use std::time::Duration;

use dellhw_collector::SinkError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use super::payload::Payload;

/// Protocol signature followed by the protocol version flag.
pub const HEADER: &[u8; 5] = b"ZBXD\x01";

const HEADER_LEN: usize = HEADER.len() + 8;
const MAX_RESPONSE_LEN: u64 = 16 * 1024 * 1024;

/// Item counts reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendSummary {
    pub processed: u64,
    pub failed: u64,
    pub total: u64,
}

impl SendSummary {
    /// Parse the server's `info` string.
    pub fn parse(info: &str) -> Option<Self> {
        let mut summary = SendSummary::default();
        let mut seen = false;
        for part in info.split(';') {
            let Some((key, value)) = part.split_once(':') else {
                continue;
            };
            let slot = match key.trim() {
                "processed" => &mut summary.processed,
                "failed" => &mut summary.failed,
                "total" => &mut summary.total,
                _ => continue,
            };
            *slot = value.trim().parse().ok()?;
            seen = true;
        }
        seen.then_some(summary)
    }
}

/// Delivers a payload to the monitoring server.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        host: &str,
        payload: &Payload,
    ) -> impl Future<Output = Result<SendSummary, SinkError>> + Send;
}

#[derive(Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: Vec<SenderItem<'a>>,
}

#[derive(Serialize)]
struct SenderItem<'a> {
    host: &'a str,
    key: &'a str,
    value: String,
}

#[derive(Deserialize)]
struct SenderResponse {
    response: String,
    #[serde(default)]
    info: String,
}

/// Prefix `body` with the protocol header and length.
pub fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(HEADER);
    out.extend_from_slice(&(body.len() as u64).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Encode a payload as one framed `sender data` request.
pub fn encode_request(host: &str, payload: &Payload) -> Result<Vec<u8>, SinkError> {
    let request = SenderRequest {
        request: "sender data",
        data: payload
            .iter()
            .map(|(key, value)| SenderItem {
                host,
                key,
                value: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
            .collect(),
    };
    Ok(frame(&serde_json::to_vec(&request)?))
}

/// Check the server's answer body.
pub fn decode_response(body: &[u8]) -> Result<SendSummary, SinkError> {
    let response: SenderResponse = serde_json::from_slice(body)
        .map_err(|e| SinkError::Transport(format!("malformed server response: {}", e)))?;

    if response.response != "success" {
        return Err(SinkError::Transport(format!(
            "server rejected payload: {} {}",
            response.response, response.info
        )));
    }

    Ok(SendSummary::parse(&response.info).unwrap_or_default())
}

/// TCP client for a Zabbix server or proxy trapper port.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    address: String,
    timeout: Duration,
}

impl ZabbixSender {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Transport for ZabbixSender {
    fn send(
        &self,
        host: &str,
        payload: &Payload,
    ) -> impl Future<Output = Result<SendSummary, SinkError>> + Send {
        let request = encode_request(host, payload);
        let address = self.address.clone();
        let timeout = self.timeout;
        let items = payload.len();

        async move {
            let request = request?;
            debug!(address = %address, items, bytes = request.len(), "Sending to Zabbix");

            tokio::time::timeout(timeout, exchange(&address, &request))
                .await
                .map_err(|_| {
                    SinkError::Transport(format!(
                        "{} did not answer within {}s",
                        address,
                        timeout.as_secs()
                    ))
                })?
        }
    }
}

async fn exchange(address: &str, request: &[u8]) -> Result<SendSummary, SinkError> {
    let io_error = |e: std::io::Error| SinkError::Transport(format!("{}: {}", address, e));

    let mut stream = TcpStream::connect(address).await.map_err(io_error)?;
    stream.write_all(request).await.map_err(io_error)?;
    stream.flush().await.map_err(io_error)?;

    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header).await.map_err(io_error)?;
    if &header[..4] != b"ZBXD" {
        return Err(SinkError::Transport(format!(
            "{}: invalid response header",
            address
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&header[HEADER.len()..]);
    let len = u64::from_le_bytes(len_bytes);
    if len > MAX_RESPONSE_LEN {
        return Err(SinkError::Transport(format!(
            "{}: response of {} bytes exceeds limit",
            address, len
        )));
    }

    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await.map_err(io_error)?;
    trace!(address, body = %String::from_utf8_lossy(&body), "Zabbix response");

    decode_response(&body)
}
