/// 外部输出 (Sinks)
///
/// - RecordStore: 聚合记录持久化 (JSON Lines 文件 / 内存)
/// - AlertSender: 跌倒告警推送 (日志 / Webhook / 内存)
pub mod alert;
pub mod record_store;

pub use alert::{AlertSender, LogAlertSender, MemoryAlertSender, WebhookAlertSender, WebhookConfig};
pub use record_store::{AggregateRecord, JsonlRecordStore, MemoryRecordStore, RecordStore};
