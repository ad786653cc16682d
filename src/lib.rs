// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 引擎配置参数
pub mod detection; // 跟踪结果数据
pub mod error; // 错误类型
pub mod events; // 区域穿越与姿态引擎
pub mod input; // 跟踪数据输入
pub mod pipeline; // 帧循环与调度
pub mod sinks; // 记录存储与告警
pub mod utils; // 几何工具

pub use crate::config::GuardianConfig;
pub use crate::detection::{BBox, TrackFrame, TrackedEntity};
pub use crate::events::{Event, EventKind, PauseSignal, Posture};
pub use crate::pipeline::{FramePump, FrameReport, Sentinel, SystemControl};
pub use crate::sinks::{AggregateRecord, AlertSender, RecordStore};

/// 当前本地时间字符串, 用于日志和报表
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
