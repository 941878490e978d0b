//! # 推送协议能力模块
//!
//! 后端推送通道使用 STOMP 文本帧（承载于 WebSocket）。本模块只负责帧与文本之间的转换，
//! 不涉及连接与重连。
//!
//! ## 帧格式
//!
//! ```text
//! COMMAND\n
//! key1:value1\n
//! key2:value2\n
//! \n
//! body\0
//! ```
//!
//! - 头部按第一个冒号切分，取值可以包含冒号
//! - 一个数据块可能包含多个以 NUL 分隔的帧，先用 [`split_frames`] 切分再逐帧 [`decode`]
//! - 单独的换行是心跳，切分时丢弃

mod error;
mod frame;

pub use error::ProtocolError;
pub use frame::{Command, Frame, HeartBeat, decode, encode, split_frames};

/// 客户端声明支持的协议版本。
pub const ACCEPT_VERSION: &str = "1.2,1.1,1.0";
