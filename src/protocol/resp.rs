use std::io;
use std::time::Duration;

use async_recursion::async_recursion;
use async_trait::async_trait;
use log::warn;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use crate::core::error::{Result, SentinelError};
use crate::core::types::{Endpoint, Member};
use crate::protocol::SentinelClient;

/// One reply frame of the monitoring wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    Simple(String),
    Error(String),
    Integer(i64),
    /// `None` is the protocol's nil bulk string.
    Bulk(Option<String>),
    /// `None` is the protocol's nil array.
    Array(Option<Vec<RespValue>>),
}

/// Writes one command as an array of bulk strings.
pub async fn write_command<W>(writer: &mut W, args: &[&str]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(16 * args.len());
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    writer.write_all(&buf).await?;
    writer.flush().await
}

/// Reads one reply frame, including nested arrays.
#[async_recursion]
pub async fn read_value<R>(reader: &mut R) -> io::Result<RespValue>
where
    R: AsyncBufRead + Unpin + Send,
{
    let line = read_line(reader).await?;
    let mut chars = line.chars();
    let prefix = chars.next().unwrap_or(' ');
    let rest = chars.as_str();

    match prefix {
        '+' => Ok(RespValue::Simple(rest.to_string())),
        '-' => Ok(RespValue::Error(rest.to_string())),
        ':' => {
            let value = rest
                .parse::<i64>()
                .map_err(|_| malformed(format!("invalid integer reply '{}'", rest)))?;
            Ok(RespValue::Integer(value))
        }
        '$' => {
            let len = rest
                .parse::<i64>()
                .map_err(|_| malformed(format!("invalid bulk length '{}'", rest)))?;
            if len < 0 {
                return Ok(RespValue::Bulk(None));
            }
            // Payload plus the trailing CRLF.
            let mut data = vec![0u8; len as usize + 2];
            reader.read_exact(&mut data).await?;
            data.truncate(len as usize);
            Ok(RespValue::Bulk(Some(
                String::from_utf8_lossy(&data).into_owned(),
            )))
        }
        '*' => {
            let len = rest
                .parse::<i64>()
                .map_err(|_| malformed(format!("invalid array length '{}'", rest)))?;
            if len < 0 {
                return Ok(RespValue::Array(None));
            }
            let mut items = Vec::with_capacity(len as usize);
            for _ in 0..len {
                items.push(read_value(reader).await?);
            }
            Ok(RespValue::Array(Some(items)))
        }
        other => Err(malformed(format!("unknown reply prefix '{}'", other))),
    }
}

async fn read_line<R>(reader: &mut R) -> io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = reader.read_line(&mut line).await?;
    if read == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed mid-reply",
        ));
    }
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        return Err(malformed("empty reply line".to_string()));
    }
    Ok(line)
}

fn malformed(reason: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, reason)
}

/// TCP-backed client speaking the sentinel command protocol.
///
/// One instance wraps one connection; the keyed pool owns idle instances
/// and hands them out one caller at a time.
#[derive(Debug)]
pub struct RespSentinelClient {
    endpoint: Endpoint,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Set while a command is on the wire; stays set if the command is
    /// cancelled or errors before the full reply was consumed.
    dirty: bool,
}

impl RespSentinelClient {
    /// Opens a connection to `endpoint`, bounded by `connect_timeout`.
    pub async fn connect(endpoint: &Endpoint, connect_timeout: Duration) -> Result<Self> {
        let addr = (endpoint.host.as_str(), endpoint.port);
        let stream = match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                return Err(SentinelError::ConnectionUnavailable {
                    endpoint: endpoint.to_string(),
                    reason: err.to_string(),
                });
            }
            Err(_) => {
                return Err(SentinelError::ConnectionUnavailable {
                    endpoint: endpoint.to_string(),
                    reason: format!("connect timed out after {}ms", connect_timeout.as_millis()),
                });
            }
        };

        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            endpoint: endpoint.clone(),
            reader: BufReader::new(read_half),
            writer: write_half,
            dirty: false,
        })
    }

    async fn command(&mut self, args: &[&str]) -> Result<RespValue> {
        self.dirty = true;
        write_command(&mut self.writer, args)
            .await
            .map_err(|err| self.classify_io(err))?;
        let reply = read_value(&mut self.reader)
            .await
            .map_err(|err| self.classify_io(err))?;
        self.dirty = false;
        Ok(reply)
    }

    /// A malformed frame is the endpoint talking nonsense; everything else
    /// is the transport going away.
    fn classify_io(&self, err: io::Error) -> SentinelError {
        if err.kind() == io::ErrorKind::InvalidData {
            SentinelError::Protocol {
                endpoint: self.endpoint.to_string(),
                reason: err.to_string(),
            }
        } else {
            SentinelError::ConnectionUnavailable {
                endpoint: self.endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }

    fn protocol_error(&self, reason: String) -> SentinelError {
        SentinelError::Protocol {
            endpoint: self.endpoint.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl SentinelClient for RespSentinelClient {
    async fn sentinels(&mut self, group: &str) -> Result<Vec<Member>> {
        let reply = self.command(&["SENTINEL", "sentinels", group]).await?;
        match reply {
            RespValue::Array(Some(entries)) => Ok(parse_members(&self.endpoint, entries)),
            RespValue::Array(None) => Ok(Vec::new()),
            // An endpoint that never monitored the group rejects the query;
            // that is "reachable but uninformed", not a failure.
            RespValue::Error(msg) if is_unknown_group(&msg) => Ok(Vec::new()),
            RespValue::Error(msg) => Err(self.protocol_error(msg)),
            other => Err(self.protocol_error(format!(
                "unexpected reply to SENTINEL sentinels: {:?}",
                other
            ))),
        }
    }

    async fn remove(&mut self, group: &str) -> Result<String> {
        let reply = self.command(&["SENTINEL", "remove", group]).await?;
        match reply {
            RespValue::Simple(status) => Ok(status),
            RespValue::Bulk(Some(status)) => Ok(status),
            RespValue::Error(msg) if is_unknown_group(&msg) => {
                Ok(format!("already removed: {}", msg))
            }
            RespValue::Error(msg) => Err(self.protocol_error(msg)),
            other => Err(self.protocol_error(format!(
                "unexpected reply to SENTINEL remove: {:?}",
                other
            ))),
        }
    }

    fn reusable(&self) -> bool {
        !self.dirty
    }
}

fn is_unknown_group(message: &str) -> bool {
    message.contains("No such master")
}

fn parse_members(endpoint: &Endpoint, entries: Vec<RespValue>) -> Vec<Member> {
    let mut members = Vec::with_capacity(entries.len());
    for entry in entries {
        match member_from_entry(entry) {
            Some(member) => members.push(member),
            None => warn!("Discarding malformed member entry reported by {}", endpoint),
        }
    }
    members
}

/// A member entry is a flat array of field/value pairs; only `name`, `ip`
/// and `port` matter here.
fn member_from_entry(entry: RespValue) -> Option<Member> {
    let RespValue::Array(Some(fields)) = entry else {
        return None;
    };

    let mut name = None;
    let mut ip = None;
    let mut port = None;

    let mut iter = fields.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let (Some(key), Some(value)) = (as_text(key), as_text(value)) else {
            continue;
        };
        match key.as_str() {
            "name" => name = Some(value),
            "ip" => ip = Some(value),
            "port" => port = value.parse::<u16>().ok(),
            _ => {}
        }
    }

    let endpoint = Endpoint::new(ip?, port?);
    let name = name.unwrap_or_else(|| endpoint.to_string());
    Some(Member::new(endpoint, name))
}

fn as_text(value: RespValue) -> Option<String> {
    match value {
        RespValue::Bulk(text) => text,
        RespValue::Simple(text) => Some(text),
        _ => None,
    }
}
