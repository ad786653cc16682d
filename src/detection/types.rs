/// 跟踪结果数据结构定义
/// Data structures for tracker output
use serde::{Deserialize, Serialize};

use crate::utils::Point2;

// ========== 数据结构 ==========

/// 检测框 (像素坐标, x1<x2, y1<y2)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// 锚点: 左下角 (x1, y2), 近似脚底着地点
    pub fn anchor(&self) -> Point2 {
        Point2::new(self.x1, self.y2)
    }

    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 < self.x2
            && self.y1 < self.y2
    }
}

/// 跟踪对象 (单帧有效)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// 跟踪ID, 跟踪器未分配时为空
    #[serde(default)]
    pub id: Option<u32>,

    /// 类别标签
    #[serde(rename = "class")]
    pub class_name: String,

    pub bbox: BBox,

    /// 置信度 [0, 1]
    pub confidence: f32,
}

impl TrackedEntity {
    pub fn new(id: Option<u32>, class_name: impl Into<String>, bbox: BBox, confidence: f32) -> Self {
        Self {
            id,
            class_name: class_name.into(),
            bbox,
            confidence,
        }
    }

    /// 检测框和置信度是否合法
    pub fn is_well_formed(&self) -> bool {
        self.bbox.is_valid() && (0.0..=1.0).contains(&self.confidence)
    }
}

/// 单帧跟踪结果 (跟踪器 → 事件引擎)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFrame {
    pub frame_id: u64,
    #[serde(default)]
    pub entities: Vec<TrackedEntity>,
}

impl TrackFrame {
    pub fn new(frame_id: u64, entities: Vec<TrackedEntity>) -> Self {
        Self { frame_id, entities }
    }
}

/// 实体过滤条件: 目标类别 + 最低置信度
#[derive(Clone, Debug)]
pub struct EntityFilter {
    pub target_class: String,
    pub min_confidence: f32,
}

/// 过滤结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// 非目标类别或置信度不足, 静默忽略
    Ignored,
    /// 检测框非法, 计入畸形数
    Malformed,
}

impl EntityFilter {
    pub fn new(target_class: impl Into<String>, min_confidence: f32) -> Self {
        Self {
            target_class: target_class.into(),
            min_confidence,
        }
    }

    pub fn admit(&self, entity: &TrackedEntity) -> Admission {
        if entity.class_name != self.target_class {
            return Admission::Ignored;
        }
        if !entity.is_well_formed() {
            return Admission::Malformed;
        }
        if entity.confidence < self.min_confidence {
            return Admission::Ignored;
        }
        Admission::Accepted
    }
}
