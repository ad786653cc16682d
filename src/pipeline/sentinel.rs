//! 数字卫兵 (Sentinel)
//! 职责: 接收 TrackFrame → 区域穿越 + 姿态分类 → 告警/写库检查 → FrameReport

use std::time::Instant;

use tracing::{debug, info};

use crate::config::GuardianConfig;
use crate::detection::TrackFrame;
use crate::events::posture::PostureCounts;
use crate::events::{Event, PauseSignal, PostureEngine, ZoneTransitionEngine};
use crate::pipeline::scheduler::{AggregationScheduler, ScheduleOutcome, SchedulerStats};
use crate::sinks::{AggregateRecord, AlertSender, RecordStore};

/// 单帧处理报告 (事件引擎 → 帧泵/观察者)
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_id: u64,
    pub events: Vec<Event>,
    pub posture: PostureCounts,
    /// 区域引擎跳过的对象数 (畸形或无ID)
    pub skipped: usize,
    pub schedule: ScheduleOutcome,
    /// 本帧是否产生了新的暂停请求
    pub pause_requested: bool,
}

pub struct Sentinel {
    zones: ZoneTransitionEngine,
    posture: PostureEngine,
    scheduler: AggregationScheduler,
    pause: PauseSignal,

    frame_stride: u64,
    frames_seen: u64,
    frames_processed: u64,
}

impl Sentinel {
    pub fn new(
        config: &GuardianConfig,
        store: Box<dyn RecordStore>,
        alert: Box<dyn AlertSender>,
    ) -> Self {
        Self::with_start(config, store, alert, Instant::now())
    }

    /// 指定计时起点 (写库计时器从此刻开始)
    pub fn with_start(
        config: &GuardianConfig,
        store: Box<dyn RecordStore>,
        alert: Box<dyn AlertSender>,
        now: Instant,
    ) -> Self {
        let pause = PauseSignal::new();
        let zones = ZoneTransitionEngine::new(
            config.outer(),
            config.inner(),
            config.entity_filter(),
            pause.clone(),
            config.track_idle_frames,
        );
        let posture = PostureEngine::new(config.entity_filter(), now);
        let scheduler = AggregationScheduler::new(
            store,
            alert,
            config.flush_interval(),
            config.alert_threshold,
            config.alert_message.clone(),
            now,
        );

        Self {
            zones,
            posture,
            scheduler,
            pause,
            frame_stride: config.frame_stride.max(1),
            frames_seen: 0,
            frames_processed: 0,
        }
    }

    pub fn process_frame(&mut self, frame: &TrackFrame) -> Option<FrameReport> {
        self.process_frame_at(frame, Instant::now())
    }

    /// 处理一帧; 被帧间隔跳过时返回 None
    pub fn process_frame_at(&mut self, frame: &TrackFrame, now: Instant) -> Option<FrameReport> {
        self.frames_seen += 1;
        if self.frames_seen % self.frame_stride != 0 {
            return None;
        }
        self.frames_processed += 1;

        // 两个引擎消费同一帧
        let zone_outcome = self.zones.process(frame);
        let posture = self.posture.process(frame);
        let schedule = self.scheduler.on_frame(posture.fall, &mut self.posture, now);

        let pause_requested = !zone_outcome.events.is_empty();
        if pause_requested {
            info!("⏸️  检测暂停, 等待确认后继续...");
        }
        if zone_outcome.skipped > 0 {
            debug!("帧 {} 跳过 {} 个对象", frame.frame_id, zone_outcome.skipped);
        }

        Some(FrameReport {
            frame_id: frame.frame_id,
            events: zone_outcome.events,
            posture,
            skipped: zone_outcome.skipped,
            schedule,
            pause_requested,
        })
    }

    /// 输入结束: 写出未满一个间隔的剩余窗口
    pub fn finish(&mut self, now: Instant) -> Option<AggregateRecord> {
        self.scheduler.flush_now(&mut self.posture, now)
    }

    pub fn pause_signal(&self) -> PauseSignal {
        self.pause.clone()
    }

    pub fn entered_count(&self) -> usize {
        self.zones.entered_count()
    }

    pub fn exited_count(&self) -> usize {
        self.zones.exited_count()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    pub fn posture(&self) -> &PostureEngine {
        &self.posture
    }
}
