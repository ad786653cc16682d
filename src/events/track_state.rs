//! 跟踪状态存储 (Track State Store)
//!
//! 每个跟踪ID一条记录: 最后所在区域 + 两个一次性事件标记。
//! 事件标记只会被置位, 不会被清除; 只有空闲淘汰会整体删除一条记录,
//! 用于应对跟踪器长时间后复用同一个数字ID。

use std::collections::HashMap;

/// 区域角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneRole {
    Outer,
    Inner,
}

/// 单个跟踪ID的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackState {
    /// 最后一次出现在哪个区域, 从未进入任何区域时为空
    pub last_seen_zone: Option<ZoneRole>,
    pub has_entered_event: bool,
    pub has_exited_event: bool,
}

#[derive(Debug, Clone)]
struct StoredTrack {
    state: TrackState,
    /// 最后一次被访问时的帧序号 (已处理帧计数)
    last_frame: u64,
}

/// 跟踪状态存储, 由单一帧循环独占
#[derive(Debug, Default)]
pub struct TrackStateStore {
    tracks: HashMap<u32, StoredTrack>,
    current_frame: u64,
}

impl TrackStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进入新的一帧, 之后的 get/set 都记为在该帧被观察到
    pub fn advance(&mut self, frame_index: u64) {
        self.current_frame = frame_index;
    }

    /// 获取状态, 首次出现的ID会创建默认状态
    pub fn get(&mut self, track_id: u32) -> TrackState {
        let current_frame = self.current_frame;
        let entry = self.tracks.entry(track_id).or_insert_with(|| StoredTrack {
            state: TrackState::default(),
            last_frame: current_frame,
        });
        entry.last_frame = current_frame;
        entry.state
    }

    pub fn set(&mut self, track_id: u32, state: TrackState) {
        let current_frame = self.current_frame;
        self.tracks
            .entry(track_id)
            .and_modify(|t| {
                t.state = state;
                t.last_frame = current_frame;
            })
            .or_insert(StoredTrack {
                state,
                last_frame: current_frame,
            });
    }

    /// 只读查看, 不创建记录
    pub fn peek(&self, track_id: u32) -> Option<&TrackState> {
        self.tracks.get(&track_id).map(|t| &t.state)
    }

    /// 淘汰超过 `max_idle_frames` 帧未出现的ID, 返回淘汰数量
    pub fn evict_idle(&mut self, max_idle_frames: u64) -> usize {
        let current_frame = self.current_frame;
        let before = self.tracks.len();
        self.tracks
            .retain(|_, t| current_frame.saturating_sub(t.last_frame) <= max_idle_frames);
        before - self.tracks.len()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
