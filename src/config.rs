//! 引擎配置 - 通过JSON文件调整参数

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::detection::EntityFilter;
use crate::error::ConfigError;
use crate::sinks::WebhookConfig;
use crate::utils::Zone;

/// 引擎参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    // === 目标过滤 ===
    pub target_class: String, // 目标类别
    pub min_confidence: f32,  // 最低置信度
    pub frame_stride: u64,    // 每N帧处理一帧

    // === 区域 ===
    pub outer_zone: Vec<[i32; 2]>, // 外区顶点
    pub inner_zone: Vec<[i32; 2]>, // 内区顶点
    pub track_idle_frames: Option<u64>, // 跟踪ID空闲淘汰帧数, null 表示不淘汰

    // === 聚合与告警 ===
    pub flush_interval_secs: u64, // 写库间隔(秒)
    pub alert_threshold: u32,     // 单帧跌倒数 > 阈值 时告警
    pub alert_message: String,
    pub alert_webhook: Option<WebhookConfig>,

    // === 存储 ===
    pub store_path: PathBuf,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            target_class: "person".to_string(),
            min_confidence: 0.0,
            frame_stride: 1,

            outer_zone: vec![[201, 449], [177, 453], [420, 581], [457, 577]],
            inner_zone: vec![[250, 444], [211, 444], [473, 575], [514, 566]],
            track_idle_frames: Some(900),

            flush_interval_secs: 20,
            alert_threshold: 0,
            alert_message: "Alert: A fall has been detected. Please check the patient's condition."
                .to_string(),
            alert_webhook: None,

            store_path: PathBuf::from("fall_records.jsonl"),
        }
    }
}

impl GuardianConfig {
    /// 从JSON文件加载配置, 文件不存在时写出默认配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("📝 配置文件不存在, 创建默认配置: {}", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!("💾 配置已保存到 {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_class.trim().is_empty() {
            return Err(ConfigError::Invalid("target_class is empty".into()));
        }
        if self.outer_zone.len() < 3 || self.inner_zone.len() < 3 {
            return Err(ConfigError::Invalid(
                "zones need at least 3 vertices".into(),
            ));
        }
        if self.flush_interval_secs == 0 {
            return Err(ConfigError::Invalid("flush_interval_secs must be > 0".into()));
        }
        if self.frame_stride == 0 {
            return Err(ConfigError::Invalid("frame_stride must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(
                "min_confidence must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn outer(&self) -> Zone {
        Zone::new("outer", self.outer_zone.as_slice())
    }

    pub fn inner(&self) -> Zone {
        Zone::new("inner", self.inner_zone.as_slice())
    }

    pub fn entity_filter(&self) -> EntityFilter {
        EntityFilter::new(self.target_class.clone(), self.min_confidence)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️  当前配置:");
        info!("  目标类别: {} (置信度 >= {:.2})", self.target_class, self.min_confidence);
        info!("  外区顶点: {:?}", self.outer_zone);
        info!("  内区顶点: {:?}", self.inner_zone);
        info!("  写库间隔: {}s", self.flush_interval_secs);
        info!("  帧间隔: {}", self.frame_stride);
        match self.track_idle_frames {
            Some(n) => info!("  空闲淘汰: {} 帧", n),
            None => info!("  空闲淘汰: 关闭"),
        }
        match &self.alert_webhook {
            Some(webhook) => info!("  告警通道: {}", webhook.url),
            None => info!("  告警通道: 日志"),
        }
    }
}
