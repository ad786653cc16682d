/// 事件处理流水线 (Event Processing Pipeline)
///
/// 单一帧循环, 一帧处理完毕后才取下一帧:
/// - Sentinel:  区域穿越 + 姿态分类 + 告警/写库调度
/// - FramePump: 按序取帧, 遵守暂停请求 (独立线程)
/// - 输入线程:  读取跟踪器输出, 通过通道送入 FramePump
pub mod pump;
pub mod scheduler;
pub mod sentinel;

pub use pump::{FrameObserver, FramePump, LogObserver, NullObserver, PumpStats};
pub use scheduler::{AggregationScheduler, ScheduleOutcome, SchedulerStats};
pub use sentinel::{FrameReport, Sentinel};

// ========== 通道消息类型定义 ==========

/// 系统控制 (外部 → 帧泵)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemControl {
    /// 确认暂停, 继续取帧
    Resume,
    Shutdown,
}
