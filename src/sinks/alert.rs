//! 告警发送 (Alert Sender)
//!
//! 凭据与接收方全部来自配置或环境变量, 不写死在代码里。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SendError;

/// 告警发送接口
pub trait AlertSender: Send {
    fn send(&mut self, message: &str, fall_count: u32) -> Result<(), SendError>;
}

// ========== 日志告警 ==========

/// 只写日志的告警 (无外部通道时的默认实现)
#[derive(Debug, Default)]
pub struct LogAlertSender;

impl AlertSender for LogAlertSender {
    fn send(&mut self, message: &str, fall_count: u32) -> Result<(), SendError> {
        warn!("🚨 {} (跌倒人数: {})", message, fall_count);
        Ok(())
    }
}

// ========== Webhook 告警 ==========

/// Webhook 配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// 存放 Bearer token 的环境变量名
    #[serde(default)]
    pub auth_token_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Serialize)]
struct AlertPayload<'a> {
    message: &'a str,
    fall_count: u32,
    timestamp: String,
}

/// 以 JSON POST 推送告警
pub struct WebhookAlertSender {
    url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl WebhookAlertSender {
    pub fn new(config: &WebhookConfig) -> Result<Self, SendError> {
        if config.url.trim().is_empty() {
            return Err(SendError::NotConfigured("webhook url is empty".into()));
        }

        let token = match &config.auth_token_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                SendError::NotConfigured(format!("environment variable {} is not set", var))
            })?),
            None => None,
        };

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        Ok(Self {
            url: config.url.clone(),
            token,
            agent,
        })
    }
}

impl AlertSender for WebhookAlertSender {
    fn send(&mut self, message: &str, fall_count: u32) -> Result<(), SendError> {
        let payload = AlertPayload {
            message,
            fall_count,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        let body =
            serde_json::to_string(&payload).map_err(|e| SendError::Transport(e.to_string()))?;

        let mut request = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        match request.send_string(&body) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, _)) => Err(SendError::Rejected { status }),
            Err(e) => Err(SendError::Transport(e.to_string())),
        }
    }
}

// ========== 内存告警 ==========

/// 记录每次告警, Clone 后共享; 可切换为失败以模拟通道故障
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertSender {
    sent: Arc<Mutex<Vec<(String, u32)>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryAlertSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }

    pub fn sent(&self) -> Vec<(String, u32)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl AlertSender for MemoryAlertSender {
    fn send(&mut self, message: &str, fall_count: u32) -> Result<(), SendError> {
        if self.failing.lock().map(|f| *f).unwrap_or(true) {
            return Err(SendError::Transport("memory sender switched off".into()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| SendError::Transport("memory sender poisoned".into()))?;
        sent.push((message.to_string(), fall_count));
        Ok(())
    }
}
