/// 跟踪数据输入 (Track Input)
///
/// 独立工作线程, 负责读取外部检测/跟踪器的逐帧输出:
/// - FrameReader: JSON Lines 解析
/// - pump_frames: 顺序检查后送入帧泵通道
pub mod jsonl;

pub use jsonl::{pump_frames, FrameReader, ReaderStats};
