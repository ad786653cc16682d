//! 姿态分类引擎 (Posture Classification Engine)
//!
//! 检测框宽度不小于高度即判为跌倒 (高 - 宽 <= 0)。
//! 不做跨帧去重: 同一个倒地的人在每一帧都会被计数, 表示"当前处于跌倒状态"。
//! 没有跟踪ID的检测框视为畸形, 不参与计数。

use std::time::Instant;

use tracing::debug;

use crate::detection::{Admission, BBox, EntityFilter, TrackFrame};

/// 姿态类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    Fall,
    Normal,
}

impl Posture {
    /// delta = height - width, delta <= 0 判为跌倒
    pub fn classify(bbox: &BBox) -> Self {
        let delta = bbox.height() - bbox.width();
        if delta <= 0.0 {
            Posture::Fall
        } else {
            Posture::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Posture::Fall => "Fall",
            Posture::Normal => "Normal",
        }
    }
}

/// 单帧计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostureCounts {
    pub fall: u32,
    pub normal: u32,
    /// 畸形或无ID的检测框数
    pub skipped: u32,
}

/// 两次写库之间的累计窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostureWindow {
    pub fall_count: u64,
    pub normal_count: u64,
    pub window_start: Instant,
}

impl PostureWindow {
    pub fn new(window_start: Instant) -> Self {
        Self {
            fall_count: 0,
            normal_count: 0,
            window_start,
        }
    }

    pub fn add(&mut self, counts: &PostureCounts) {
        self.fall_count += u64::from(counts.fall);
        self.normal_count += u64::from(counts.normal);
    }

    pub fn is_empty(&self) -> bool {
        self.fall_count == 0 && self.normal_count == 0
    }

    /// 清零并开始新窗口
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }
}

pub struct PostureEngine {
    filter: EntityFilter,
    window: PostureWindow,
}

impl PostureEngine {
    pub fn new(filter: EntityFilter, now: Instant) -> Self {
        Self {
            filter,
            window: PostureWindow::new(now),
        }
    }

    /// 对本帧所有目标类别对象分类, 并累加到窗口
    pub fn process(&mut self, frame: &TrackFrame) -> PostureCounts {
        let mut counts = PostureCounts::default();

        for entity in &frame.entities {
            match self.filter.admit(entity) {
                Admission::Accepted => {}
                Admission::Ignored => continue,
                Admission::Malformed => {
                    counts.skipped += 1;
                    continue;
                }
            }

            // 跟踪器未分配ID的检测框不可靠, 与区域引擎一致跳过
            if entity.id.is_none() {
                counts.skipped += 1;
                continue;
            }

            match Posture::classify(&entity.bbox) {
                Posture::Fall => counts.fall += 1,
                Posture::Normal => counts.normal += 1,
            }
        }

        if counts.fall > 0 {
            debug!("🤕 帧 {} 跌倒 {} 人, 正常 {} 人", frame.frame_id, counts.fall, counts.normal);
        }

        self.window.add(&counts);
        counts
    }

    pub fn window(&self) -> &PostureWindow {
        &self.window
    }

    /// 取出当前窗口并重置
    pub fn take_window(&mut self, now: Instant) -> PostureWindow {
        let snapshot = self.window;
        self.window.reset(now);
        snapshot
    }
}
