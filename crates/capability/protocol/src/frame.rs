//! STOMP 帧编解码

use crate::error::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 帧命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Message,
    Error,
    Disconnect,
    /// 未识别的命令（包括缺失命令时的空串），分发时忽略
    Other(String),
}

impl Command {
    pub fn parse(value: &str) -> Self {
        match value {
            "CONNECT" => Command::Connect,
            "CONNECTED" => Command::Connected,
            "SUBSCRIBE" => Command::Subscribe,
            "MESSAGE" => Command::Message,
            "ERROR" => Command::Error,
            "DISCONNECT" => Command::Disconnect,
            other => Command::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Message => "MESSAGE",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
            Command::Other(value) => value,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 心跳协商值（`heart-beat` 头部，单位毫秒，0 表示不发送/不要求）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartBeat {
    pub outgoing_ms: u64,
    pub incoming_ms: u64,
}

impl HeartBeat {
    pub fn new(outgoing_ms: u64, incoming_ms: u64) -> Self {
        Self {
            outgoing_ms,
            incoming_ms,
        }
    }

    /// 协商客户端发送心跳的间隔：任一方为 0 表示不发送，否则取两者较大值。
    ///
    /// `self` 为客户端在 CONNECT 中声明的值，`server` 为 CONNECTED 帧的值。
    pub fn outgoing_interval(&self, server: &HeartBeat) -> Option<u64> {
        if self.outgoing_ms == 0 || server.incoming_ms == 0 {
            return None;
        }
        Some(self.outgoing_ms.max(server.incoming_ms))
    }
}

impl fmt::Display for HeartBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.outgoing_ms, self.incoming_ms)
    }
}

impl FromStr for HeartBeat {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidHeader("heart-beat", value.to_string());
        let (outgoing, incoming) = value.split_once(',').ok_or_else(invalid)?;
        let outgoing_ms = outgoing.trim().parse::<u64>().map_err(|_| invalid())?;
        let incoming_ms = incoming.trim().parse::<u64>().map_err(|_| invalid())?;
        Ok(Self::new(outgoing_ms, incoming_ms))
    }
}

/// 协议帧
///
/// 构造后不可变；头部名在帧内唯一，保留插入顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    headers: Vec<(String, String)>,
    body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// 追加头部；同名头部替换原值（保持原位置）。
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// 握手帧。
    pub fn connect(accept_version: &str, heart_beat: HeartBeat) -> Self {
        Self::new(Command::Connect)
            .with_header("accept-version", accept_version)
            .with_header("heart-beat", heart_beat.to_string())
    }

    /// 订阅帧（自动确认）。
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(Command::Subscribe)
            .with_header("id", id)
            .with_header("destination", destination)
            .with_header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        Self::new(Command::Disconnect)
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 编码为线上文本（以 NUL 结尾）。
    pub fn encode(&self) -> String {
        let body = (!self.body.is_empty()).then_some(self.body.as_str());
        encode(&self.command, &self.headers, body)
    }
}

/// 编码一帧：`<command>\n<k>:<v>\n...\n\n<body>\0`。
///
/// 头部取值中不能出现换行（由调用方保证，不做校验）。
pub fn encode(command: &Command, headers: &[(String, String)], body: Option<&str>) -> String {
    let body = body.unwrap_or_default();
    let headers_len: usize = headers
        .iter()
        .map(|(key, value)| key.len() + value.len() + 2)
        .sum();
    let mut out = String::with_capacity(command.as_str().len() + headers_len + body.len() + 3);
    out.push_str(command.as_str());
    out.push('\n');
    for (key, value) in headers {
        out.push_str(key);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(body);
    out.push('\0');
    out
}

/// 解码一帧。
///
/// 从第一个 NUL 起的内容全部丢弃；首行为命令，随后到空行为止是头部，空行之后是 body。
/// 没有空行时 body 为空。重复的头部名以第一次出现为准，没有冒号的头部行被跳过。
pub fn decode(chunk: &str) -> Frame {
    let raw = match chunk.find('\0') {
        Some(end) => &chunk[..end],
        None => chunk,
    };

    let mut rest = raw;
    let command = Command::parse(next_line(&mut rest).trim());
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body = "";

    while !rest.is_empty() {
        let line = next_line(&mut rest);
        if line.is_empty() {
            body = rest;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if headers.iter().all(|(existing, _)| existing != key) {
            headers.push((key.to_string(), value.to_string()));
        }
    }

    Frame {
        command,
        headers,
        body: body.to_string(),
    }
}

/// 把可能包含多帧的数据块按 NUL 切分，丢弃心跳换行。
pub fn split_frames(chunk: &str) -> Vec<&str> {
    chunk
        .split('\0')
        .map(|frame| frame.trim_start_matches(['\r', '\n']))
        .filter(|frame| !frame.trim().is_empty())
        .collect()
}

/// 取出下一行（去掉行尾 `\r`），并推进剩余文本。
fn next_line<'a>(rest: &mut &'a str) -> &'a str {
    let (line, remaining) = match rest.find('\n') {
        Some(index) => (&rest[..index], &rest[index + 1..]),
        None => (*rest, ""),
    };
    *rest = remaining;
    line.strip_suffix('\r').unwrap_or(line)
}
