//! 区域穿越引擎 (Zone-Transition Engine)
//!
//! 两个有序区域: 外区 (outer) 与 内区 (inner)。
//! - 进入: 上一次记忆在外区, 本帧锚点落在内区
//! - 离开: 上一次记忆在内区, 本帧锚点落在外区
//!
//! 锚点先归入一个区域 (重叠处以内区为准), 与本帧之前的区域记忆比较后
//! 再更新记忆。停留在重叠处视为在内区, 不会触发离开。锚点不在任何区域时
//! 记忆保持不变, 短暂遮挡或漏检不会打断一次穿越。

use chrono::Local;
use tracing::{debug, info};

use super::track_state::{TrackStateStore, ZoneRole};
use super::{Event, EventKind, PauseSignal};
use crate::detection::{Admission, EntityFilter, TrackFrame};
use crate::utils::Zone;

/// 单帧处理结果
#[derive(Debug, Default)]
pub struct ZoneFrameOutcome {
    pub events: Vec<Event>,
    /// 畸形或缺少ID而被跳过的对象数
    pub skipped: usize,
    /// 本帧空闲淘汰的ID数
    pub evicted: usize,
}

pub struct ZoneTransitionEngine {
    outer: Zone,
    inner: Zone,
    filter: EntityFilter,
    store: TrackStateStore,
    pause: PauseSignal,

    /// 空闲淘汰阈值 (帧), None 表示永不淘汰
    max_idle_frames: Option<u64>,
    frames_processed: u64,

    // 统计
    entered_count: usize,
    exited_count: usize,
}

impl ZoneTransitionEngine {
    pub fn new(
        outer: Zone,
        inner: Zone,
        filter: EntityFilter,
        pause: PauseSignal,
        max_idle_frames: Option<u64>,
    ) -> Self {
        Self {
            outer,
            inner,
            filter,
            store: TrackStateStore::new(),
            pause,
            max_idle_frames,
            frames_processed: 0,
            entered_count: 0,
            exited_count: 0,
        }
    }

    /// 处理一帧: 更新每个ID的状态, 返回本帧产生的事件
    pub fn process(&mut self, frame: &TrackFrame) -> ZoneFrameOutcome {
        let mut outcome = ZoneFrameOutcome::default();

        self.frames_processed += 1;
        self.store.advance(self.frames_processed);

        for entity in &frame.entities {
            match self.filter.admit(entity) {
                Admission::Accepted => {}
                Admission::Ignored => continue,
                Admission::Malformed => {
                    debug!("⚠️  帧 {} 跳过畸形检测框: {:?}", frame.frame_id, entity.bbox);
                    outcome.skipped += 1;
                    continue;
                }
            }

            // 无ID的对象无法跨帧关联, 不更新任何状态
            let Some(track_id) = entity.id else {
                outcome.skipped += 1;
                continue;
            };

            let anchor = entity.bbox.anchor();
            let current = if self.inner.contains(&anchor) {
                Some(ZoneRole::Inner)
            } else if self.outer.contains(&anchor) {
                Some(ZoneRole::Outer)
            } else {
                None
            };

            let mut state = self.store.get(track_id);
            let previous = state.last_seen_zone;

            if previous == Some(ZoneRole::Outer)
                && current == Some(ZoneRole::Inner)
                && !state.has_entered_event
            {
                state.has_entered_event = true;
                self.entered_count += 1;
                info!(
                    "🚪 ID {} 进入区域 ({:.0}, {:.0}) [帧 {}]",
                    track_id,
                    anchor.x(),
                    anchor.y(),
                    frame.frame_id
                );
                outcome.events.push(Event {
                    kind: EventKind::Entered,
                    track_id,
                    position: anchor,
                    frame_id: frame.frame_id,
                    timestamp: Local::now(),
                });
                self.pause.raise();
            }

            if previous == Some(ZoneRole::Inner)
                && current == Some(ZoneRole::Outer)
                && !state.has_exited_event
            {
                state.has_exited_event = true;
                self.exited_count += 1;
                info!(
                    "🚶 ID {} 离开区域 ({:.0}, {:.0}) [帧 {}]",
                    track_id,
                    anchor.x(),
                    anchor.y(),
                    frame.frame_id
                );
                outcome.events.push(Event {
                    kind: EventKind::Exited,
                    track_id,
                    position: anchor,
                    frame_id: frame.frame_id,
                    timestamp: Local::now(),
                });
                self.pause.raise();
            }

            if current.is_some() {
                state.last_seen_zone = current;
            }

            self.store.set(track_id, state);
        }

        if let Some(max_idle) = self.max_idle_frames {
            outcome.evicted = self.store.evict_idle(max_idle);
            if outcome.evicted > 0 {
                debug!("🧹 淘汰 {} 个空闲跟踪ID", outcome.evicted);
            }
        }

        outcome
    }

    pub fn entered_count(&self) -> usize {
        self.entered_count
    }

    pub fn exited_count(&self) -> usize {
        self.exited_count
    }

    pub fn track_count(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &TrackStateStore {
        &self.store
    }

    pub fn outer(&self) -> &Zone {
        &self.outer
    }

    pub fn inner(&self) -> &Zone {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BBox, TrackedEntity};

    // 外区: x 440..479, 内区: x 481..520, 互不重叠
    fn engine(max_idle: Option<u64>) -> (ZoneTransitionEngine, PauseSignal) {
        let pause = PauseSignal::new();
        let outer = Zone::new("outer", &[(440, 550), (479, 550), (479, 590), (440, 590)]);
        let inner = Zone::new("inner", &[(481, 550), (520, 550), (520, 590), (481, 590)]);
        let engine = ZoneTransitionEngine::new(
            outer,
            inner,
            EntityFilter::new("person", 0.0),
            pause.clone(),
            max_idle,
        );
        (engine, pause)
    }

    /// 构造锚点位于 (x, y) 的行人
    fn person(id: Option<u32>, x: f32, y: f32) -> TrackedEntity {
        TrackedEntity::new(id, "person", BBox::new(x, y - 100.0, x + 40.0, y), 0.9)
    }

    fn frame(frame_id: u64, entities: Vec<TrackedEntity>) -> TrackFrame {
        TrackFrame::new(frame_id, entities)
    }

    #[test]
    fn test_enter_scenario() {
        let (mut engine, pause) = engine(None);

        let out = engine.process(&frame(0, vec![person(Some(7), 460.0, 570.0)]));
        assert!(out.events.is_empty());
        assert!(!pause.is_raised());

        let out = engine.process(&frame(1, vec![person(Some(7), 490.0, 570.0)]));
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, EventKind::Entered);
        assert_eq!(out.events[0].track_id, 7);
        assert!(pause.is_raised());

        // 再次出现在内区, 不再产生事件
        pause.clear();
        let out = engine.process(&frame(2, vec![person(Some(7), 495.0, 570.0)]));
        assert!(out.events.is_empty());
        assert!(!pause.is_raised());
        assert_eq!(engine.entered_count(), 1);
    }

    #[test]
    fn test_enter_requires_prior_outer() {
        let (mut engine, pause) = engine(None);

        // 直接出现在内区
        let out = engine.process(&frame(0, vec![person(Some(1), 490.0, 570.0)]));
        assert!(out.events.is_empty());
        let out = engine.process(&frame(1, vec![person(Some(1), 500.0, 570.0)]));
        assert!(out.events.is_empty());
        assert!(!pause.is_raised());
    }

    // 外区 x 440..500 与内区 x 480..520 在 x 480..500 重叠
    fn overlapping_engine() -> (ZoneTransitionEngine, PauseSignal) {
        let pause = PauseSignal::new();
        let outer = Zone::new("outer", &[(440, 550), (500, 550), (500, 590), (440, 590)]);
        let inner = Zone::new("inner", &[(480, 550), (520, 550), (520, 590), (480, 590)]);
        let engine = ZoneTransitionEngine::new(
            outer,
            inner,
            EntityFilter::new("person", 0.0),
            pause.clone(),
            None,
        );
        (engine, pause)
    }

    #[test]
    fn test_first_sighting_in_overlap_is_silent() {
        let (mut engine, pause) = overlapping_engine();

        let out = engine.process(&frame(0, vec![person(Some(3), 490.0, 570.0)]));
        assert!(out.events.is_empty());
        assert!(!pause.is_raised());
        assert_eq!(
            engine.store().peek(3).map(|s| s.last_seen_zone),
            Some(Some(ZoneRole::Inner))
        );
    }

    #[test]
    fn test_overlap_counts_as_inner() {
        let (mut engine, _pause) = overlapping_engine();

        engine.process(&frame(0, vec![person(Some(4), 460.0, 570.0)]));

        // 外区 → 重叠处: 只有一次进入
        let out = engine.process(&frame(1, vec![person(Some(4), 490.0, 570.0)]));
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, EventKind::Entered);

        // 停留在重叠处或进入纯内区都不触发离开
        for (i, x) in [(2, 490.0), (3, 510.0), (4, 495.0)] {
            let out = engine.process(&frame(i, vec![person(Some(4), x, 570.0)]));
            assert!(out.events.is_empty(), "frame {} emitted {:?}", i, out.events);
        }

        // 只有回到纯外区才算离开
        let out = engine.process(&frame(5, vec![person(Some(4), 460.0, 570.0)]));
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, EventKind::Exited);
        assert_eq!(engine.entered_count(), 1);
        assert_eq!(engine.exited_count(), 1);
    }

    #[test]
    fn test_exit_after_enter() {
        let (mut engine, _pause) = engine(None);

        engine.process(&frame(0, vec![person(Some(2), 460.0, 570.0)]));
        engine.process(&frame(1, vec![person(Some(2), 490.0, 570.0)]));
        let out = engine.process(&frame(2, vec![person(Some(2), 460.0, 570.0)]));

        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, EventKind::Exited);
        assert_eq!(engine.exited_count(), 1);
    }

    #[test]
    fn test_one_shot_under_oscillation() {
        let (mut engine, _pause) = engine(None);
        let mut entered = 0;
        let mut exited = 0;

        for i in 0..20u64 {
            let x = if i % 2 == 0 { 460.0 } else { 490.0 };
            let out = engine.process(&frame(i, vec![person(Some(9), x, 570.0)]));
            for event in out.events {
                match event.kind {
                    EventKind::Entered => entered += 1,
                    EventKind::Exited => exited += 1,
                }
            }
        }

        assert_eq!(entered, 1);
        assert_eq!(exited, 1);
    }

    #[test]
    fn test_gap_frames_keep_memory() {
        let (mut engine, _pause) = engine(None);

        engine.process(&frame(0, vec![person(Some(4), 460.0, 570.0)]));
        // 锚点在区域外 + 空帧
        engine.process(&frame(1, vec![person(Some(4), 300.0, 300.0)]));
        engine.process(&frame(2, vec![]));
        let out = engine.process(&frame(3, vec![person(Some(4), 490.0, 570.0)]));

        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, EventKind::Entered);
    }

    #[test]
    fn test_entities_without_id_are_skipped() {
        let (mut engine, _pause) = engine(None);

        let out = engine.process(&frame(0, vec![person(None, 460.0, 570.0)]));
        assert_eq!(out.skipped, 1);
        assert_eq!(engine.track_count(), 0);

        let out = engine.process(&frame(1, vec![person(None, 490.0, 570.0)]));
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_other_classes_ignored() {
        let (mut engine, _pause) = engine(None);
        let car = |x| TrackedEntity::new(Some(5), "car", BBox::new(x, 470.0, x + 40.0, 570.0), 0.9);

        engine.process(&frame(0, vec![car(460.0)]));
        let out = engine.process(&frame(1, vec![car(490.0)]));
        assert!(out.events.is_empty());
        assert_eq!(out.skipped, 0);
        assert_eq!(engine.track_count(), 0);
    }

    #[test]
    fn test_recycled_id_after_eviction() {
        let (mut engine, _pause) = engine(Some(3));

        engine.process(&frame(0, vec![person(Some(8), 460.0, 570.0)]));
        let out = engine.process(&frame(1, vec![person(Some(8), 490.0, 570.0)]));
        assert_eq!(out.events.len(), 1);

        // ID 8 消失足够久被淘汰
        for i in 2..7u64 {
            engine.process(&frame(i, vec![]));
        }
        assert!(engine.store().peek(8).is_none());

        // 新的实体复用 ID 8, 重新完成一次进入
        engine.process(&frame(7, vec![person(Some(8), 460.0, 570.0)]));
        let out = engine.process(&frame(8, vec![person(Some(8), 490.0, 570.0)]));
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, EventKind::Entered);
    }
}
