/// 检测数据 (Detection Data)
///
/// 外部检测器/跟踪器的逐帧输出, 事件引擎只消费这些数据:
/// - TrackedEntity: 单个跟踪对象 (ID + 类别 + 检测框 + 置信度)
/// - TrackFrame:    一帧内的全部跟踪对象
pub mod types;

pub use types::{Admission, BBox, EntityFilter, TrackFrame, TrackedEntity};
