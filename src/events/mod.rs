/// 事件引擎 (Event Engines)
///
/// 把逐帧的跟踪结果变成稳定的一次性事件和时间窗口统计:
/// - TrackStateStore:      每个跟踪ID的区域记忆与事件标记
/// - ZoneTransitionEngine: 外区 → 内区 = 进入, 内区 → 外区 = 离开
/// - PostureEngine:        检测框宽高比判定 跌倒 / 正常
pub mod posture;
pub mod track_state;
pub mod zone_transition;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::utils::Point2;

pub use posture::{Posture, PostureEngine, PostureWindow};
pub use track_state::{TrackState, TrackStateStore, ZoneRole};
pub use zone_transition::ZoneTransitionEngine;

// ========== 事件 ==========

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Entered,
    Exited,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Entered => "entered",
            EventKind::Exited => "exited",
        }
    }
}

/// 一次性事件, 每个 (跟踪ID, 事件类型) 在整个流中最多出现一次
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub track_id: u32,
    /// 触发时的锚点位置
    pub position: Point2,
    pub frame_id: u64,
    pub timestamp: DateTime<Local>,
}

// ========== 暂停信号 ==========

/// 暂停请求标志
///
/// 引擎只负责置位; 清除由帧泵在外部确认 (恢复) 后完成。
/// Clone 后共享同一个标志。
#[derive(Debug, Clone, Default)]
pub struct PauseSignal {
    flag: Arc<AtomicBool>,
}

impl PauseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
