//! 聚合与告警调度 (Aggregation & Alert Scheduler)
//!
//! 每处理一帧检查两个互不相关的触发条件:
//! - 告警: 本帧跌倒数 > 阈值, 每帧最多发送一次, 持续跌倒不做抑制
//! - 写库: 距上次写库 >= 间隔, 写出累计窗口后清零
//!
//! 写库失败只记录日志, 窗口和计时器照常重置 (该区间的数据丢弃),
//! 避免存储不可用时每帧重试。

use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{error, info};

use crate::events::PostureEngine;
use crate::sinks::{AggregateRecord, AlertSender, RecordStore};

/// 单帧调度结果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScheduleOutcome {
    pub alert_sent: bool,
    pub alert_failed: bool,
    /// 本帧写出的记录 (写库失败时同样给出被丢弃的内容)
    pub flushed: Option<AggregateRecord>,
    pub flush_failed: bool,
}

/// 累计统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub alerts_sent: u64,
    pub alert_failures: u64,
    pub flushes: u64,
    pub flush_failures: u64,
}

pub struct AggregationScheduler {
    store: Box<dyn RecordStore>,
    alert: Box<dyn AlertSender>,
    flush_interval: Duration,
    alert_threshold: u32,
    alert_message: String,
    last_flush: Instant,
    stats: SchedulerStats,
}

impl AggregationScheduler {
    pub fn new(
        store: Box<dyn RecordStore>,
        alert: Box<dyn AlertSender>,
        flush_interval: Duration,
        alert_threshold: u32,
        alert_message: impl Into<String>,
        now: Instant,
    ) -> Self {
        Self {
            store,
            alert,
            flush_interval,
            alert_threshold,
            alert_message: alert_message.into(),
            last_flush: now,
            stats: SchedulerStats::default(),
        }
    }

    /// 在一帧处理完姿态分类之后调用
    pub fn on_frame(
        &mut self,
        frame_falls: u32,
        posture: &mut PostureEngine,
        now: Instant,
    ) -> ScheduleOutcome {
        let mut outcome = ScheduleOutcome::default();

        if frame_falls > self.alert_threshold {
            match self.alert.send(&self.alert_message, frame_falls) {
                Ok(()) => {
                    self.stats.alerts_sent += 1;
                    outcome.alert_sent = true;
                    info!("📨 告警已发送: {} 人跌倒", frame_falls);
                }
                Err(e) => {
                    self.stats.alert_failures += 1;
                    outcome.alert_failed = true;
                    error!("❌ 告警发送失败: {}", e);
                }
            }
        }

        if now.saturating_duration_since(self.last_flush) >= self.flush_interval {
            let (record, ok) = self.flush(posture, now);
            outcome.flush_failed = !ok;
            outcome.flushed = Some(record);
        }

        outcome
    }

    /// 立即写出当前窗口 (输入结束时使用), 窗口为空时不写
    pub fn flush_now(&mut self, posture: &mut PostureEngine, now: Instant) -> Option<AggregateRecord> {
        if posture.window().is_empty() {
            return None;
        }
        let (record, _) = self.flush(posture, now);
        Some(record)
    }

    fn flush(&mut self, posture: &mut PostureEngine, now: Instant) -> (AggregateRecord, bool) {
        let window = posture.take_window(now);
        self.last_flush = now;

        let record = AggregateRecord {
            fall_count: window.fall_count,
            normal_count: window.normal_count,
            timestamp: Local::now(),
        };

        match self.store.append(&record) {
            Ok(()) => {
                self.stats.flushes += 1;
                info!(
                    "💾 记录已写入: {} 跌倒, {} 正常 @ {}",
                    record.fall_count,
                    record.normal_count,
                    record.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
                (record, true)
            }
            Err(e) => {
                self.stats.flush_failures += 1;
                error!(
                    "❌ 写库失败, 丢弃本区间数据 ({} 跌倒, {} 正常): {}",
                    record.fall_count, record.normal_count, e
                );
                (record, false)
            }
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }
}
