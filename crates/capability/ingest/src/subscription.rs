//! 订阅登记
//!
//! 每次握手完成后都从头计算完整订阅集合并全部重发：后端不在重连之间保留订阅。

use std::collections::BTreeSet;
use uav_protocol::Frame;

/// 订阅 id 前缀，按枚举顺序追加序号。
pub const SUBSCRIPTION_ID_PREFIX: &str = "sub-";

/// 一条订阅（本地 id + 目标主题）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: String,
    pub destination: String,
}

/// 设备主题：`{base}/{uavCode}`。
pub fn device_topic(base_topic: &str, device_code: &str) -> String {
    format!("{}/{}", base_topic.trim_end_matches('/'), device_code)
}

/// 计算订阅集合（纯函数）。
///
/// 机队主题总在第一位；设备主题按编码排序，空编码跳过，重复目标只保留一条。
pub fn plan_subscriptions<I, S>(base_topic: &str, device_codes: I) -> Vec<Subscription>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let codes: BTreeSet<String> = device_codes
        .into_iter()
        .map(|code| code.as_ref().trim().to_string())
        .filter(|code| !code.is_empty())
        .collect();

    let mut destinations: Vec<String> = Vec::with_capacity(codes.len() + 1);
    destinations.push(base_topic.to_string());
    for code in &codes {
        let topic = device_topic(base_topic, code);
        if !destinations.contains(&topic) {
            destinations.push(topic);
        }
    }

    destinations
        .into_iter()
        .enumerate()
        .map(|(index, destination)| Subscription {
            id: format!("{SUBSCRIPTION_ID_PREFIX}{index}"),
            destination,
        })
        .collect()
}

/// 订阅登记：机队主题 + 当前设备编码集合。
#[derive(Debug, Clone)]
pub struct SubscriptionRegistry {
    base_topic: String,
    device_codes: BTreeSet<String>,
}

impl SubscriptionRegistry {
    pub fn new<I, S>(base_topic: impl Into<String>, device_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self {
            base_topic: base_topic.into(),
            device_codes: BTreeSet::new(),
        };
        registry.set_device_codes(device_codes);
        registry
    }

    pub fn base_topic(&self) -> &str {
        &self.base_topic
    }

    pub fn device_codes(&self) -> impl Iterator<Item = &str> {
        self.device_codes.iter().map(String::as_str)
    }

    /// 替换设备编码集合；下一次握手时生效。
    pub fn set_device_codes<I, S>(&mut self, device_codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device_codes = device_codes
            .into_iter()
            .map(Into::into)
            .map(|code: String| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        plan_subscriptions(&self.base_topic, &self.device_codes)
    }

    /// 每条订阅对应一个 SUBSCRIBE 帧。
    pub fn subscribe_frames(&self) -> Vec<Frame> {
        self.subscriptions()
            .iter()
            .map(|subscription| Frame::subscribe(&subscription.id, &subscription.destination))
            .collect()
    }
}
