/// 数字卫兵 (Digital Sentinel)
///
/// 跟踪结果事件检测程序
///
/// 系统架构:
/// 1. 输入线程: 读取跟踪器输出 (JSON Lines, 文件或标准输入)
/// 2. 控制线程: 键盘确认 (g 继续, q 退出)
/// 3. 主线程:   帧泵 + 事件引擎
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use guardian_rs::config::GuardianConfig;
use guardian_rs::input::pump_frames;
use guardian_rs::pipeline::{FramePump, LogObserver, Sentinel, SystemControl};
use guardian_rs::sinks::{AlertSender, JsonlRecordStore, LogAlertSender, WebhookAlertSender};
use guardian_rs::TrackFrame;
use tracing::{error, info, warn};

/// 数字卫兵参数
#[derive(Parser, Debug)]
#[command(author, version, about = "数字卫兵 - 跟踪事件检测", long_about = None)]
struct Args {
    /// 跟踪结果文件 (JSON Lines), "-" 表示标准输入
    #[arg(short, long, default_value = "-")]
    frames: String,

    /// 配置文件路径
    #[arg(short, long, default_value = "guardian.json")]
    config: PathBuf,

    /// 覆盖记录文件路径
    #[arg(long)]
    store: Option<PathBuf>,

    /// 覆盖写库间隔(秒)
    #[arg(long)]
    flush_interval: Option<u64>,

    /// 暂停后自动继续 (无人值守)
    #[arg(long, default_value_t = false)]
    auto_resume: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// 无法从键盘确认暂停时强制自动继续, 否则第一次暂停就会结束处理
fn resolve_auto_resume(requested: bool, from_stdin: bool, stdin_is_terminal: bool) -> bool {
    if requested {
        return true;
    }
    if from_stdin {
        warn!("⚠️  跟踪数据来自标准输入, 无法键盘确认, 启用自动继续");
        return true;
    }
    if !stdin_is_terminal {
        warn!("⚠️  标准输入不是终端, 无法键盘确认, 启用自动继续");
        return true;
    }
    false
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level_filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(log_level_filter)
        .with_target(false)
        .init();

    info!("🚀 数字卫兵系统启动");

    // ========== 配置 ==========
    let mut config = GuardianConfig::load(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;
    if let Some(store) = args.store {
        config.store_path = store;
    }
    if let Some(secs) = args.flush_interval {
        config.flush_interval_secs = secs;
    }
    config.validate().context("配置校验失败")?;
    config.print_summary();

    // ========== 外部协作者 ==========
    let store = JsonlRecordStore::new(config.store_path.clone());
    info!("💾 记录文件: {}", store.path().display());

    let alert: Box<dyn AlertSender> = match &config.alert_webhook {
        Some(webhook) => Box::new(
            WebhookAlertSender::new(webhook).context("告警通道初始化失败")?,
        ),
        None => Box::new(LogAlertSender),
    };

    let sentinel = Sentinel::new(&config, Box::new(store), alert);

    // ========== 通道 ==========
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<TrackFrame>(120);
    let (control_tx, control_rx) = crossbeam_channel::unbounded::<SystemControl>();

    let from_stdin = args.frames == "-";
    let auto_resume = resolve_auto_resume(args.auto_resume, from_stdin, io::stdin().is_terminal());

    // ========== 启动输入线程 ==========
    let reader: Box<dyn BufRead + Send> = if from_stdin {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.frames)
            .with_context(|| format!("无法打开跟踪文件: {}", args.frames))?;
        Box::new(BufReader::new(file))
    };
    let input = std::thread::spawn(move || pump_frames(reader, frame_tx));

    // ========== 启动控制线程 ==========
    if !auto_resume {
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let msg = match line.trim() {
                    "g" => SystemControl::Resume,
                    "q" => SystemControl::Shutdown,
                    _ => continue,
                };
                if control_tx.send(msg).is_err() || msg == SystemControl::Shutdown {
                    break;
                }
            }
        });
    }

    // ========== 主线程: 帧泵 ==========
    let mut observer = LogObserver::default();
    let stats = FramePump::new(sentinel, frame_rx, control_rx)
        .with_auto_resume(auto_resume)
        .run(&mut observer);

    match input.join() {
        Ok(Ok(reader_stats)) => {
            if reader_stats.malformed_lines > 0 || reader_stats.out_of_order > 0 {
                warn!(
                    "⚠️  输入中丢弃 {} 行损坏数据, {} 个乱序帧",
                    reader_stats.malformed_lines, reader_stats.out_of_order
                );
            }
        }
        Ok(Err(e)) => error!("❌ 跟踪数据读取失败: {}", e),
        Err(_) => return Err(anyhow!("输入线程异常退出")),
    }

    info!(
        "📊 进入 {} 人, 离开 {} 人, 告警 {} 次, 写库 {} 次 (失败 {})",
        stats.entered, stats.exited, stats.alerts_sent, stats.flushes, stats.flush_failures
    );
    if let Some(record) = stats.final_flush {
        info!(
            "💾 剩余窗口已写入: {} 跌倒, {} 正常",
            record.fall_count, record.normal_count
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resume_without_keyboard() {
        assert!(!resolve_auto_resume(false, false, true));
        assert!(resolve_auto_resume(true, false, true));
        assert!(resolve_auto_resume(false, true, true));
        // 文件输入但标准输入已关闭 (服务方式运行)
        assert!(resolve_auto_resume(false, false, false));
    }
}
