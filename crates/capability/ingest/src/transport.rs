//! 传输层抽象
//!
//! 连接管理器只依赖这里的 trait；生产实现见 `ws` 模块，测试使用内存假实现。

use crate::error::TransportError;
use crate::manager::ManagerEvent;
use tokio::sync::mpsc;

/// 传输层上报的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// 底层连接已建立，可以发送握手帧
    Opened,
    /// 收到一段文本（可能包含多帧）
    Text(String),
    Closed,
    Error(String),
}

/// 绑定到某一次会话的事件出口。
#[derive(Debug, Clone)]
pub struct TransportEvents {
    generation: u64,
    sender: mpsc::UnboundedSender<ManagerEvent>,
}

impl TransportEvents {
    /// 绑定会话 generation 与管理器事件通道。
    pub fn new(generation: u64, sender: mpsc::UnboundedSender<ManagerEvent>) -> Self {
        Self { generation, sender }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 投递事件；事件循环已结束时返回 false。
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.sender
            .send(ManagerEvent::Transport {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// 已打开（或正在打开）的传输层句柄，由连接管理器独占。
pub trait TransportHandle: Send {
    /// 发送一帧文本，不等待对端确认。
    fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// 请求关闭；关闭在后台完成，之后的事件由 generation 过滤。
    fn close(&mut self);
}

/// 传输层工厂：每次会话打开一个新的传输。
pub trait Connector: Send + Sync {
    fn open(
        &self,
        url: &str,
        events: TransportEvents,
    ) -> Result<Box<dyn TransportHandle>, TransportError>;
}
