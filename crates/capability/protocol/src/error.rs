//! 协议错误类型定义

/// 协议层错误
///
/// 帧解码本身从不失败；只有对具体头部取值的解析会产生错误。
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 头部取值非法
    #[error("invalid header {0}: {1}")]
    InvalidHeader(&'static str, String),
}
