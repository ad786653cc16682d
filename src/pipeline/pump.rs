//! 帧泵 (Frame Pump)
//! 职责: 从通道按顺序取帧 → Sentinel 处理 → 遵守暂停请求, 等待外部确认
//!
//! 暂停期间不再取新帧, 只按固定节奏调用观察者的 redraw (重绘当前帧)。

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{info, warn};

use super::sentinel::{FrameReport, Sentinel};
use super::SystemControl;
use crate::detection::TrackFrame;
use crate::sinks::AggregateRecord;

/// 帧处理观察者 (显示/界面等外部协作者)
pub trait FrameObserver {
    fn on_report(&mut self, _report: &FrameReport) {}

    /// 暂停期间定时调用
    fn redraw(&mut self, _last: Option<&FrameReport>) {}
}

/// 空观察者
pub struct NullObserver;

impl FrameObserver for NullObserver {}

/// 日志观察者: 暂停时周期性提示
#[derive(Default)]
pub struct LogObserver {
    redraws: u64,
}

impl FrameObserver for LogObserver {
    fn on_report(&mut self, report: &FrameReport) {
        self.redraws = 0;
        if report.posture.fall > 0 {
            info!(
                "📊 帧 {}: 跌倒 {} / 正常 {}",
                report.frame_id, report.posture.fall, report.posture.normal
            );
        }
    }

    fn redraw(&mut self, last: Option<&FrameReport>) {
        // 约每 5 秒提示一次 (默认重绘间隔 100ms)
        if self.redraws % 50 == 0 {
            let frame_id = last.map(|r| r.frame_id).unwrap_or_default();
            info!("⏸️  检测已暂停 (帧 {}), 输入 g 继续, q 退出", frame_id);
        }
        self.redraws += 1;
    }
}

/// 帧泵运行统计
#[derive(Debug, Default, Clone)]
pub struct PumpStats {
    pub frames_received: u64,
    pub frames_processed: u64,
    pub events: u64,
    pub pauses: u64,
    pub entered: usize,
    pub exited: usize,
    pub alerts_sent: u64,
    pub flushes: u64,
    pub flush_failures: u64,
    /// 输入结束时写出的剩余窗口
    pub final_flush: Option<AggregateRecord>,
}

enum PauseOutcome {
    Resumed,
    Shutdown,
}

pub struct FramePump {
    sentinel: Sentinel,
    frames: Receiver<TrackFrame>,
    control: Option<Receiver<SystemControl>>,
    redraw_interval: Duration,
    auto_resume: bool,
}

impl FramePump {
    pub fn new(
        sentinel: Sentinel,
        frames: Receiver<TrackFrame>,
        control: Receiver<SystemControl>,
    ) -> Self {
        Self {
            sentinel,
            frames,
            control: Some(control),
            redraw_interval: Duration::from_millis(100),
            auto_resume: false,
        }
    }

    /// 无人值守模式: 暂停请求立即清除
    pub fn with_auto_resume(mut self, auto_resume: bool) -> Self {
        self.auto_resume = auto_resume;
        self
    }

    pub fn with_redraw_interval(mut self, interval: Duration) -> Self {
        self.redraw_interval = interval;
        self
    }

    /// 运行直到输入结束或收到 Shutdown
    pub fn run<O: FrameObserver>(mut self, observer: &mut O) -> PumpStats {
        info!("🔍 帧泵启动, 等待跟踪数据...");

        let pause = self.sentinel.pause_signal();
        let mut stats = PumpStats::default();
        let mut last_report: Option<FrameReport> = None;

        loop {
            if pause.is_raised() {
                stats.pauses += 1;
                if self.auto_resume {
                    pause.clear();
                } else {
                    match self.wait_for_resume(observer, last_report.as_ref()) {
                        PauseOutcome::Resumed => info!("▶️  继续检测"),
                        PauseOutcome::Shutdown => break,
                    }
                }
            }

            let frame = match self.next_frame() {
                Some(Ok(frame)) => frame,
                Some(Err(())) => break,
                None => {
                    info!("📭 输入流结束");
                    break;
                }
            };

            stats.frames_received += 1;
            if let Some(report) = self.sentinel.process_frame(&frame) {
                stats.events += report.events.len() as u64;
                observer.on_report(&report);
                last_report = Some(report);
            }
        }

        stats.final_flush = self.sentinel.finish(Instant::now());
        stats.frames_processed = self.sentinel.frames_processed();
        stats.entered = self.sentinel.entered_count();
        stats.exited = self.sentinel.exited_count();
        let scheduler = self.sentinel.scheduler_stats();
        stats.alerts_sent = scheduler.alerts_sent;
        stats.flushes = scheduler.flushes;
        stats.flush_failures = scheduler.flush_failures;

        info!(
            "🛑 帧泵退出: 接收 {} 帧, 处理 {} 帧, 进入 {}, 离开 {}",
            stats.frames_received, stats.frames_processed, stats.entered, stats.exited
        );
        stats
    }

    /// 取下一帧, 同时响应控制消息。
    /// Some(Err) 表示收到 Shutdown, None 表示输入结束
    fn next_frame(&mut self) -> Option<Result<TrackFrame, ()>> {
        loop {
            let Some(control) = self.control.clone() else {
                return self.frames.recv().ok().map(Ok);
            };

            crossbeam_channel::select! {
                recv(self.frames) -> msg => return msg.ok().map(Ok),
                recv(control) -> msg => match msg {
                    Ok(SystemControl::Shutdown) => {
                        info!("🛑 收到退出指令");
                        return Some(Err(()));
                    }
                    // 未暂停时的恢复指令无意义
                    Ok(SystemControl::Resume) => {}
                    Err(_) => self.control = None,
                },
            }
        }
    }

    fn wait_for_resume<O: FrameObserver>(
        &mut self,
        observer: &mut O,
        last: Option<&FrameReport>,
    ) -> PauseOutcome {
        let pause = self.sentinel.pause_signal();
        let Some(control) = self.control.clone() else {
            warn!("⚠️  控制通道已关闭, 无法恢复暂停, 退出");
            return PauseOutcome::Shutdown;
        };

        loop {
            match control.recv_timeout(self.redraw_interval) {
                Ok(SystemControl::Resume) => {
                    pause.clear();
                    return PauseOutcome::Resumed;
                }
                Ok(SystemControl::Shutdown) => {
                    info!("🛑 暂停期间收到退出指令");
                    return PauseOutcome::Shutdown;
                }
                Err(RecvTimeoutError::Timeout) => observer.redraw(last),
                Err(RecvTimeoutError::Disconnected) => {
                    self.control = None;
                    warn!("⚠️  控制通道已关闭, 无法恢复暂停, 退出");
                    return PauseOutcome::Shutdown;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardianConfig;
    use crate::detection::{BBox, TrackedEntity};
    use crate::sinks::{MemoryAlertSender, MemoryRecordStore};

    fn sentinel(store: &MemoryRecordStore) -> Sentinel {
        let config = GuardianConfig {
            outer_zone: vec![[440, 550], [479, 550], [479, 590], [440, 590]],
            inner_zone: vec![[481, 550], [520, 550], [520, 590], [481, 590]],
            ..GuardianConfig::default()
        };
        Sentinel::new(&config, Box::new(store.clone()), Box::new(MemoryAlertSender::new()))
    }

    fn walker(frame_id: u64, id: u32, x: f32) -> TrackFrame {
        TrackFrame::new(
            frame_id,
            vec![TrackedEntity::new(Some(id), "person", BBox::new(x, 470.0, x + 40.0, 570.0), 0.9)],
        )
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<u64>,
        redraws: usize,
        /// 第一次重绘时通知, 表示帧泵已进入暂停等待
        paused: Option<crossbeam_channel::Sender<u64>>,
    }

    impl FrameObserver for Recorder {
        fn on_report(&mut self, report: &FrameReport) {
            self.frames.push(report.frame_id);
        }

        fn redraw(&mut self, last: Option<&FrameReport>) {
            self.redraws += 1;
            if let Some(tx) = self.paused.take() {
                let _ = tx.send(last.map(|r| r.frame_id).unwrap_or_default());
            }
        }
    }

    #[test]
    fn test_runs_until_input_ends() {
        let store = MemoryRecordStore::new();
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (_control_tx, control_rx) = crossbeam_channel::unbounded();

        for i in 0..4 {
            frame_tx.send(walker(i, 1, 100.0)).unwrap();
        }
        drop(frame_tx);

        let mut recorder = Recorder::default();
        let stats = FramePump::new(sentinel(&store), frame_rx, control_rx).run(&mut recorder);

        assert_eq!(recorder.frames, vec![0, 1, 2, 3]);
        assert_eq!(stats.frames_processed, 4);
        // 剩余窗口在结束时写出
        assert_eq!(stats.final_flush.map(|r| r.normal_count), Some(4));
        assert_eq!(store.records().len(), 1);
    }

    #[test]
    fn test_pause_blocks_until_resume() {
        let store = MemoryRecordStore::new();
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (control_tx, control_rx) = crossbeam_channel::unbounded();

        frame_tx.send(walker(0, 7, 460.0)).unwrap();
        frame_tx.send(walker(1, 7, 490.0)).unwrap();
        frame_tx.send(walker(2, 7, 495.0)).unwrap();
        drop(frame_tx);

        let (paused_tx, paused_rx) = crossbeam_channel::bounded(1);
        let handle = std::thread::spawn(move || {
            let mut recorder = Recorder {
                paused: Some(paused_tx),
                ..Recorder::default()
            };
            let stats = FramePump::new(sentinel(&store), frame_rx, control_rx)
                .with_redraw_interval(Duration::from_millis(5))
                .run(&mut recorder);
            (stats, recorder)
        });

        // 暂停发生在第二帧之后
        assert_eq!(paused_rx.recv().unwrap(), 1);
        control_tx.send(SystemControl::Resume).unwrap();

        let (stats, recorder) = handle.join().unwrap();
        assert_eq!(recorder.frames, vec![0, 1, 2]);
        assert!(recorder.redraws > 0);
        assert_eq!(stats.pauses, 1);
        assert_eq!(stats.entered, 1);
    }

    #[test]
    fn test_shutdown_while_paused() {
        let store = MemoryRecordStore::new();
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (control_tx, control_rx) = crossbeam_channel::unbounded();

        frame_tx.send(walker(0, 7, 460.0)).unwrap();
        frame_tx.send(walker(1, 7, 490.0)).unwrap();
        frame_tx.send(walker(2, 7, 495.0)).unwrap();

        let (paused_tx, paused_rx) = crossbeam_channel::bounded(1);
        let handle = std::thread::spawn(move || {
            let mut recorder = Recorder {
                paused: Some(paused_tx),
                ..Recorder::default()
            };
            let stats = FramePump::new(sentinel(&store), frame_rx, control_rx)
                .with_redraw_interval(Duration::from_millis(5))
                .run(&mut recorder);
            (stats, recorder)
        });

        assert_eq!(paused_rx.recv().unwrap(), 1);
        control_tx.send(SystemControl::Shutdown).unwrap();
        let (stats, recorder) = handle.join().unwrap();

        // 第二帧触发暂停后直接退出, 第三帧未处理
        assert_eq!(recorder.frames, vec![0, 1]);
        assert_eq!(stats.frames_received, 2);
    }

    #[test]
    fn test_auto_resume() {
        let store = MemoryRecordStore::new();
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (_control_tx, control_rx) = crossbeam_channel::unbounded();

        frame_tx.send(walker(0, 7, 460.0)).unwrap();
        frame_tx.send(walker(1, 7, 490.0)).unwrap();
        frame_tx.send(walker(2, 7, 460.0)).unwrap();
        drop(frame_tx);

        let mut recorder = Recorder::default();
        let stats = FramePump::new(sentinel(&store), frame_rx, control_rx)
            .with_auto_resume(true)
            .run(&mut recorder);

        assert_eq!(stats.entered, 1);
        assert_eq!(stats.exited, 1);
        assert_eq!(stats.pauses, 2);
        assert_eq!(recorder.redraws, 0);
    }
}
